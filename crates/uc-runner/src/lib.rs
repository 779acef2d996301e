//! Component D: the update-module runner. Spawns a helper program per
//! lifecycle step and implements the FIFO-based streaming download
//! sub-protocol against it.

pub mod error;
pub mod fifo;
pub mod process;
pub mod runner;
pub mod subcommand;
pub mod workdir;

pub use error::ModuleError;
pub use fifo::{PayloadSpec, PayloadWriter};
pub use runner::ModuleRunner;
pub use subcommand::SubCommand;
pub use workdir::WorkDir;
