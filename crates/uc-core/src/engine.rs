use std::path::PathBuf;
use std::sync::Arc;

use uc_model::state_data::StateData;
use uc_model::update_info::{RebootAction, RollbackSupport};
use uc_runner::{ModuleRunner, WorkDir};
use uc_scripts::{ScriptEdge, ScriptRunner};
use uc_store::{ProvidesStore, SledStore, StateStore};

use crate::error::CoreError;
use crate::event::Event;
use crate::inputs::{DeploymentInputs, Rebooter};
use crate::phase::Phase;
use crate::tracking::TrackingState;
use crate::transitions::next_phase;

/// Component F: the deployment state machine. Owns nothing about transport
/// or the wire protocol -- it drives phases by calling its collaborators
/// and feeding their outcome back through the transition table.
pub struct DeploymentMachine {
    store: StateStore<SledStore>,
    provides: ProvidesStore<SledStore>,
    runner: ModuleRunner,
    scripts: ScriptRunner,
    rebooter: Arc<dyn Rebooter>,
    work_root: PathBuf,
    phase: Phase,
    tracking: TrackingState,
    phase_tx: Option<tokio::sync::mpsc::UnboundedSender<Phase>>,
}

impl DeploymentMachine {
    pub fn new(
        store: StateStore<SledStore>,
        provides: ProvidesStore<SledStore>,
        runner: ModuleRunner,
        scripts: ScriptRunner,
        rebooter: Arc<dyn Rebooter>,
        work_root: PathBuf,
    ) -> Self {
        Self {
            store,
            provides,
            runner,
            scripts,
            rebooter,
            work_root,
            phase: Phase::Idle,
            tracking: TrackingState::Idle,
            phase_tx: None,
        }
    }

    /// Subscribes to every phase entered by the next [`Self::run_until`] /
    /// [`Self::run_to_completion`] call, most recent call wins. The
    /// standalone CLI's status-push and `BeforeCommit` token-invalidation
    /// policy live outside this crate (see `uc-cli/src/daemon.rs`); this is
    /// just the narrow channel that lets them observe phase entry without
    /// the machine itself knowing anything about a server or a token.
    pub fn observe_phases(&mut self) -> tokio::sync::mpsc::UnboundedReceiver<Phase> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        self.phase_tx = Some(tx);
        rx
    }

    /// Loads any persisted `StateData` and dispatches to the resume phase
    /// for it, or `Idle` if there is none. Called once at daemon startup.
    pub fn recover(&mut self) -> Result<(), CoreError> {
        match self.store.load()? {
            Some(data) => {
                self.phase = crate::resume::resume_phase(data.name);
                self.tracking = TrackingState::NoFailures;
                Ok(())
            }
            None => {
                self.phase = Phase::Idle;
                Ok(())
            }
        }
    }

    fn work_dir_for(&self, inputs: &dyn DeploymentInputs) -> Result<WorkDir, CoreError> {
        let record = self.provides.load()?;
        WorkDir::prepare(
            &self.work_root,
            &record.artifact_name,
            &record.artifact_group,
            inputs.device_type(),
            inputs.header_files(),
        )
        .map_err(CoreError::from)
    }

    /// A state-script's absence is not a failure -- only a script that
    /// exists and exits non-zero stops the lifecycle step it guards.
    async fn run_script_edge(&self, edge: ScriptEdge) -> Event {
        match self.scripts.run_edge(edge).await {
            Ok(()) | Err(uc_scripts::ScriptError::NothingToDo) => Event::Success,
            Err(_) => Event::Failure,
        }
    }

    /// Drives the machine from its current phase until it reaches `Idle`
    /// again (a full deployment attempt), persisting state at every save
    /// point and updating the tracking machine alongside it.
    pub async fn run_to_completion(&mut self, inputs: &mut dyn DeploymentInputs) -> Result<(), CoreError> {
        self.run_until(inputs, &[]).await
    }

    /// As [`DeploymentMachine::run_to_completion`], but returns early once
    /// `self.phase()` matches one of `stop_at` rather than continuing on to
    /// `EndOfDeployment` -- used by standalone `install`, which deliberately
    /// leaves the artifact installed-but-uncommitted for inspection, and
    /// which may stop even earlier at `Reboot` when the caller asked to be
    /// told about a pending reboot instead of having one performed for it.
    pub async fn run_until(
        &mut self,
        inputs: &mut dyn DeploymentInputs,
        stop_at: &[Phase],
    ) -> Result<(), CoreError> {
        // Each call represents one fresh deployment attempt; start tracking
        // clean rather than inheriting whatever a previous attempt on this
        // same machine instance left behind.
        self.tracking = TrackingState::Idle.apply(Event::DeploymentStarted);
        let mut first_save = true;

        loop {
            if let Some(tx) = &self.phase_tx {
                let _ = tx.send(self.phase);
            }
            if stop_at.contains(&self.phase) {
                self.phase_tx = None;
                return Ok(());
            }
            if let Some(token) = self.phase.save_token() {
                let data = StateData::new(token, inputs.update_info().clone());
                let result = if first_save { self.store.begin_deployment(&data) } else { self.store.save(&data) };
                match result {
                    Ok(()) => first_save = false,
                    Err(uc_store::StoreError::StateDataStoreCountExceeded { .. }) => {
                        self.phase = Phase::StateLoop;
                        continue;
                    }
                    Err(e) => {
                        self.phase_tx = None;
                        return Err(e.into());
                    }
                }
            }

            let event = self.run_phase_action(inputs).await;

            if self.phase == Phase::EndOfDeployment {
                // Deliberately leave `self.tracking` at its final value
                // (NoFailures/Failure/RollbackFailed) rather than folding in
                // `DeploymentEnded` here -- callers read `tracking()` right
                // after this returns to decide what to report, and a reset
                // to `Idle` at this point would erase exactly the signal
                // they're reading it for. The next call resets it instead.
                self.phase = next_phase(self.phase, Event::DeploymentEnded);
                self.phase_tx = None;
                return Ok(());
            }

            // A failure entering `AfterCommit` reaches `CommitErrorSaveProvides`,
            // not a rollback branch -- the module's `ArtifactCommit` already
            // succeeded, so this was never a deployment failure in the
            // tracking machine's sense and must not flip it to `Failure`.
            if event == Event::Failure && self.phase != Phase::AfterCommit {
                self.tracking = self.tracking.apply(Event::Failure);
            }
            if self.phase == Phase::CheckRollback && event == Event::Success {
                self.tracking = self.tracking.apply(Event::RollbackStarted);
            }

            self.phase = next_phase(self.phase, event);
        }
    }

    async fn run_phase_action(&mut self, inputs: &mut dyn DeploymentInputs) -> Event {
        match self.phase {
            Phase::Idle | Phase::PollForDeployment => Event::NothingToDo,

            Phase::Download => self.do_download(inputs).await,
            Phase::ArtifactInstall => self.do_lifecycle_with_scripts(inputs, ScriptEdge::ArtifactInstallEnter, uc_runner::SubCommand::ArtifactInstall, ScriptEdge::ArtifactInstallLeave).await,
            Phase::CheckReboot => self.do_check_reboot(inputs).await,
            Phase::Reboot => self.do_reboot(inputs).await,
            Phase::VerifyReboot => self.do_module_step(inputs, uc_runner::SubCommand::ArtifactVerifyReboot).await,
            Phase::BeforeCommit => Event::Started,
            Phase::Commit => self.do_lifecycle_with_scripts(inputs, ScriptEdge::ArtifactCommitEnter, uc_runner::SubCommand::ArtifactCommit, ScriptEdge::ArtifactCommitLeave).await,
            Phase::AfterCommit => self.run_script_edge(ScriptEdge::ArtifactCommitLeave).await,
            Phase::CommitErrorSaveProvides => self.do_save_provides_after_commit_error(inputs).await,
            Phase::CheckRollback => self.do_check_rollback(inputs).await,
            Phase::Rollback => self.do_module_step(inputs, uc_runner::SubCommand::ArtifactRollback).await,
            Phase::RollbackReboot => self.do_reboot(inputs).await,
            Phase::VerifyRollbackReboot => self.do_module_step(inputs, uc_runner::SubCommand::ArtifactVerifyRollbackReboot).await,
            Phase::Failure => self.do_failure(inputs).await,
            Phase::SaveProvides => self.do_save_provides(inputs).await,
            Phase::Cleanup => self.do_module_step(inputs, uc_runner::SubCommand::Cleanup).await,
            Phase::StateLoop => {
                let _ = self.provides.commit_inconsistent();
                Event::Started
            }
            Phase::SendFinalStatus => Event::Started,
            Phase::ClearArtifactData => {
                let _ = self.store.clear();
                Event::Started
            }
            Phase::EndOfDeployment => Event::DeploymentEnded,
        }
    }

    async fn do_download(&mut self, inputs: &mut dyn DeploymentInputs) -> Event {
        if self.scripts.clear().is_err() {
            return Event::Failure;
        }
        let module = match self.runner.resolve(inputs.update_info().payload_types[0].as_str()) {
            Ok(m) => m,
            Err(_) => return Event::Failure,
        };
        let work_dir = match self.work_dir_for(inputs) {
            Ok(w) => w,
            Err(_) => return Event::Failure,
        };
        let with_file_sizes = self.runner.supports_file_sizes(&module, &work_dir).await.unwrap_or(false);
        let payloads: Vec<_> =
            inputs.payloads().iter().map(|p| uc_runner::PayloadSpec { name: p.name.clone(), size: p.size }).collect();
        // The legacy rootfs-image module expects its payload present at
        // `files/<name>` on a later verify-reboot invocation even if it
        // consumed the FIFO normally here -- that invocation may run in a
        // fresh process after a spontaneous reboot with no runner left
        // alive to feed a pipe.
        let is_rootfs_image = inputs.update_info().payload_types.first().map(String::as_str) == Some("rootfs-image");
        match self
            .runner
            .download(&module, &work_dir, with_file_sizes, &payloads, inputs.payload_writer(), is_rootfs_image)
            .await
        {
            Ok(()) => Event::Success,
            Err(_) => Event::Failure,
        }
    }

    async fn do_module_step(&self, inputs: &dyn DeploymentInputs, sub_command: uc_runner::SubCommand) -> Event {
        let module = match self.runner.resolve(inputs.update_info().payload_types[0].as_str()) {
            Ok(m) => m,
            Err(_) => return Event::Failure,
        };
        let work_dir = match self.work_dir_for(inputs) {
            Ok(w) => w,
            Err(_) => return Event::Failure,
        };
        match self.runner.run_lifecycle_step(&module, sub_command, &work_dir).await {
            Ok(()) => Event::Success,
            Err(_) => Event::Failure,
        }
    }

    async fn do_lifecycle_with_scripts(
        &self,
        inputs: &dyn DeploymentInputs,
        enter: ScriptEdge,
        sub_command: uc_runner::SubCommand,
        leave: ScriptEdge,
    ) -> Event {
        if self.run_script_edge(enter).await == Event::Failure {
            return Event::Failure;
        }
        let outcome = self.do_module_step(inputs, sub_command).await;
        if outcome != Event::Success {
            return outcome;
        }
        self.run_script_edge(leave).await
    }

    async fn do_check_reboot(&self, inputs: &dyn DeploymentInputs) -> Event {
        let module = match self.runner.resolve(inputs.update_info().payload_types[0].as_str()) {
            Ok(m) => m,
            Err(_) => return Event::Failure,
        };
        let work_dir = match self.work_dir_for(inputs) {
            Ok(w) => w,
            Err(_) => return Event::Failure,
        };
        match self.runner.needs_artifact_reboot(&module, &work_dir).await {
            Ok(RebootAction::No) => Event::NothingToDo,
            Ok(_) => Event::Success,
            Err(_) => Event::Failure,
        }
    }

    async fn do_reboot(&self, _inputs: &dyn DeploymentInputs) -> Event {
        match self.rebooter.reboot().await {
            Ok(()) => Event::Success,
            Err(_) => Event::Failure,
        }
    }

    async fn do_check_rollback(&self, inputs: &dyn DeploymentInputs) -> Event {
        let module = match self.runner.resolve(inputs.update_info().payload_types[0].as_str()) {
            Ok(m) => m,
            Err(_) => return Event::Failure,
        };
        let work_dir = match self.work_dir_for(inputs) {
            Ok(w) => w,
            Err(_) => return Event::Failure,
        };
        match self.runner.supports_rollback(&module, &work_dir).await {
            Ok(RollbackSupport::Yes) => Event::Success,
            _ => Event::NothingToDo,
        }
    }

    async fn do_failure(&self, inputs: &dyn DeploymentInputs) -> Event {
        self.do_module_step(inputs, uc_runner::SubCommand::ArtifactFailure).await;
        Event::Success
    }

    /// Reached only from `AfterCommit`'s `Failure` branch: the module's
    /// `ArtifactCommit` already succeeded, so the new artifact is already
    /// running and there is no rollback to fall back to. A failing
    /// commit-leave script still has to leave the Provides DB agreeing with
    /// what is actually installed, so this always commits the new provides
    /// rather than consulting `self.tracking` the way [`Self::do_save_provides`]
    /// does for pre-commit failures.
    async fn do_save_provides_after_commit_error(&mut self, inputs: &dyn DeploymentInputs) -> Event {
        let _ = self.provides.commit_success(inputs.update_info());
        Event::Started
    }

    async fn do_save_provides(&mut self, inputs: &dyn DeploymentInputs) -> Event {
        let result = if !self.tracking.failed() {
            self.provides.commit_success(inputs.update_info())
        } else if self.tracking.rollback_failed() {
            self.provides.commit_inconsistent()
        } else {
            self.provides.commit_rolled_back()
        };
        match result {
            Ok(()) => Event::Started,
            Err(_) => Event::Started,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// The deployment-tracking machine's current state, read by callers
    /// after a run to decide what exit status or user-facing message to
    /// report (success / rolled back / rollback failed).
    pub fn tracking(&self) -> TrackingState {
        self.tracking
    }
}
