pub mod engine;
pub mod error;
pub mod event;
pub mod inputs;
pub mod phase;
pub mod resume;
pub mod standalone;
pub mod tracking;
pub mod transitions;

pub use engine::DeploymentMachine;
pub use error::CoreError;
pub use event::Event;
pub use inputs::{DeploymentInputs, Rebooter, SystemReboot};
pub use phase::Phase;
pub use resume::resume_phase;
pub use standalone::StandaloneCommand;
pub use tracking::TrackingState;
pub use transitions::next_phase;
