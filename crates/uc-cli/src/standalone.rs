use std::path::Path;

use uc_core::{Phase, StandaloneCommand, TrackingState};

use crate::bootstrap::App;

/// The result of driving a standalone command to its stop phase, carrying
/// enough state for the caller to pick an exit code and status line
/// without the transition table's internals leaking any further up.
pub enum Outcome {
    /// `entry_phase` returned `None` -- there was nothing on disk for this
    /// command to act on.
    NothingToDo,
    /// The machine ran until one of its stop phases and halted there.
    Reached { phase: Phase, tracking: TrackingState },
}

/// Drives one standalone command to its auto-stop phase (or all the way to
/// `EndOfDeployment` if it has none) against whatever deployment is already
/// installed or in flight, without any network access.
///
/// `install` would need a concrete [`uc_core::DeploymentInputs`] for the
/// artifact at `artifact_dir`; building one from an already-unpacked
/// artifact on disk needs the same header/type-info parsing the daemon path
/// defers to the artifact format itself, so this reports that rather than
/// silently no-op'ing.
pub async fn run(
    app: &App,
    command: StandaloneCommand,
    artifact_dir: Option<&Path>,
    reboot_exit_code: bool,
) -> anyhow::Result<Outcome> {
    let mut machine = app.deployment_machine()?;
    let persisted = {
        let kv = app.open_store()?;
        uc_store::StateStore::new(kv, app.config.state_data_store_count_cap).load()?
    };

    let Some(entry_phase) = command.entry_phase(persisted.as_ref().map(|d| d.name)) else {
        log::info!("nothing to do for {command:?} given the current on-disk state");
        return Ok(Outcome::NothingToDo);
    };

    if command == StandaloneCommand::Install {
        let dir = artifact_dir.ok_or_else(|| anyhow::anyhow!("install requires --artifact-dir"))?;
        anyhow::bail!(
            "installing from an already-unpacked artifact at {} requires header/type-info parsing, \
             which is out of scope here -- use the daemon path instead",
            dir.display()
        );
    }

    let update_info = persisted
        .map(|d| d.update_info)
        .ok_or_else(|| anyhow::anyhow!("no persisted deployment state to resume {command:?} from"))?;
    let device_type = std::env::var("UC_DEVICE_TYPE").unwrap_or_else(|_| "generic-armv7".to_string());
    let mut inputs = crate::inputs::ResumedInputs::new(update_info, device_type);

    machine.set_phase(entry_phase);
    let stop_at = command.auto_stop_phases(reboot_exit_code);
    machine.run_until(&mut inputs, &stop_at).await?;
    Ok(Outcome::Reached { phase: machine.phase(), tracking: machine.tracking() })
}

/// Maps a finished standalone run to the process exit code and the single
/// status line the CLI prints, per the documented sub-command exit codes:
/// `install` (0 committed-pending/1 rolled-back/2 no-op/4 reboot-needed),
/// `commit` (0/2), `rollback` (0/1/2). `resume` isn't itself one of the
/// documented exit-code rows; it is mapped onto whichever of `install` or
/// `commit`/`rollback`'s codes matches the phase it actually resumed into,
/// which is the only sense in which "resume" has a well-defined exit status.
pub fn exit_status(command: StandaloneCommand, outcome: &Outcome) -> (i32, &'static str) {
    match outcome {
        Outcome::NothingToDo => (2, "No update in progress."),
        Outcome::Reached { phase, tracking } => {
            if tracking.rollback_failed() {
                return (1, "Rollback failed. System may be in an inconsistent state.");
            }
            match command {
                StandaloneCommand::Install if *phase == Phase::Reboot => {
                    (4, "Installed, but not committed. Reboot needed.")
                }
                StandaloneCommand::Install if tracking.failed() => (1, "Rolled back."),
                StandaloneCommand::Install => (0, "Installed, but not committed."),
                StandaloneCommand::Commit => (0, "Installed and committed."),
                StandaloneCommand::Rollback => (0, "Rolled back."),
                StandaloneCommand::Resume if tracking.failed() => (1, "Rolled back."),
                StandaloneCommand::Resume => (0, "Installed and committed."),
            }
        }
    }
}
