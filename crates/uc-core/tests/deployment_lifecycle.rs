use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use uc_core::{CoreError, DeploymentInputs, DeploymentMachine, Phase, Rebooter, TrackingState};
use uc_model::update_info::{ArtifactSource, RebootAction, RollbackSupport, UpdateInfo};
use uc_runner::{ModuleRunner, PayloadSpec, PayloadWriter};
use uc_scripts::ScriptRunner;
use uc_store::{ProvidesStore, SledStore, StateStore};

struct FixedPayload(&'static [u8]);

#[async_trait]
impl PayloadWriter for FixedPayload {
    async fn write_payload(
        &mut self,
        _name: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), uc_runner::ModuleError> {
        sink.write_all(self.0).await?;
        Ok(())
    }
}

struct FakeInputs {
    update_info: UpdateInfo,
    payloads: Vec<PayloadSpec>,
    writer: FixedPayload,
}

impl DeploymentInputs for FakeInputs {
    fn update_info(&self) -> &UpdateInfo {
        &self.update_info
    }
    fn device_type(&self) -> &str {
        "qemux86"
    }
    fn header_files(&self) -> &BTreeMap<String, Vec<u8>> {
        static EMPTY: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        &EMPTY
    }
    fn payloads(&self) -> &[PayloadSpec] {
        &self.payloads
    }
    fn payload_writer(&mut self) -> &mut dyn PayloadWriter {
        &mut self.writer
    }
}

fn update_info_for(payload_type: &str) -> UpdateInfo {
    UpdateInfo {
        id: "dep-1".to_string(),
        artifact_name: "release-42".to_string(),
        source: ArtifactSource { uri: "https://example.test/artifact".to_string(), expire: None },
        payload_types: vec![payload_type.to_string()],
        type_info_provides: BTreeMap::new(),
        clears_artifact_provides: vec![],
        reboot_requested: vec![RebootAction::No],
        supports_rollback: RollbackSupport::Unknown,
        all_rollbacks_successful: false,
        has_db_schema_update: false,
    }
}

struct NoopRebooter;

#[async_trait]
impl Rebooter for NoopRebooter {
    async fn reboot(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// A module that always reports "no reboot needed" and whose streaming
/// download drains whatever the harness feeds it, so every scenario below
/// only has to vary install/rollback exit codes.
fn write_module(dir: &std::path::Path, name: &str, install_exit: i32, rollback_exit: i32) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        format!(
            r#"#!/bin/sh
case "$1" in
  Download)
    work=$2
    stream_name=$(cat "$work/stream-next")
    cat "$work/streams/$stream_name" > /dev/null
    cat "$work/stream-next" > /dev/null
    exit 0
    ;;
  NeedsArtifactReboot) echo No; exit 0 ;;
  SupportsRollback) echo Yes; exit 0 ;;
  ArtifactInstall) exit {install_exit} ;;
  ArtifactRollback) exit {rollback_exit} ;;
  *) exit 0 ;;
esac
"#
        ),
    )
    .unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn machine_for(data_dir: &std::path::Path) -> (DeploymentMachine, SledStore) {
    let kv = SledStore::open_temporary().unwrap();
    let store = StateStore::new(kv.clone(), 30);
    let provides = ProvidesStore::new(kv.clone());
    let runner = ModuleRunner::new(data_dir, Duration::from_secs(5));
    let scripts = ScriptRunner::new(data_dir, Duration::from_secs(5), Duration::from_millis(10), Duration::from_millis(50));
    let mut machine =
        DeploymentMachine::new(store, provides, runner, scripts, Arc::new(NoopRebooter), data_dir.join("work"));
    machine.recover().unwrap();
    (machine, kv)
}

#[tokio::test]
async fn successful_install_commits_and_leaves_tracking_clean() {
    let dir = tempdir();
    std::fs::create_dir_all(dir.path().join("modules").join("v3")).unwrap();
    write_module(&dir.path().join("modules").join("v3"), "rootfs-image", 0, 0);

    let (mut machine, kv) = machine_for(dir.path());
    let mut inputs = FakeInputs {
        update_info: update_info_for("rootfs-image"),
        payloads: vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }],
        writer: FixedPayload(b"data"),
    };

    machine.set_phase(Phase::Download);
    machine.run_to_completion(&mut inputs).await.unwrap();

    assert_eq!(machine.phase(), Phase::Idle);
    assert_eq!(machine.tracking(), TrackingState::NoFailures);

    let record = ProvidesStore::new(kv).load().unwrap();
    assert_eq!(record.artifact_name, "release-42");
}

#[tokio::test]
async fn failed_install_with_successful_rollback_reports_failed_but_not_rollback_failed() {
    let dir = tempdir();
    std::fs::create_dir_all(dir.path().join("modules").join("v3")).unwrap();
    write_module(&dir.path().join("modules").join("v3"), "rootfs-image", 1, 0);

    let (mut machine, _kv) = machine_for(dir.path());
    let mut inputs = FakeInputs {
        update_info: update_info_for("rootfs-image"),
        payloads: vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }],
        writer: FixedPayload(b"data"),
    };

    machine.set_phase(Phase::Download);
    machine.run_to_completion(&mut inputs).await.unwrap();

    assert_eq!(machine.phase(), Phase::Idle);
    assert!(machine.tracking().failed());
    assert!(!machine.tracking().rollback_failed());
}

#[tokio::test]
async fn failed_install_with_failed_rollback_marks_state_inconsistent() {
    let dir = tempdir();
    std::fs::create_dir_all(dir.path().join("modules").join("v3")).unwrap();
    write_module(&dir.path().join("modules").join("v3"), "rootfs-image", 1, 1);

    let (mut machine, _kv) = machine_for(dir.path());
    let mut inputs = FakeInputs {
        update_info: update_info_for("rootfs-image"),
        payloads: vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }],
        writer: FixedPayload(b"data"),
    };

    machine.set_phase(Phase::Download);
    machine.run_to_completion(&mut inputs).await.unwrap();

    assert_eq!(machine.phase(), Phase::Idle);
    assert!(machine.tracking().rollback_failed());
}

#[tokio::test]
async fn tracking_resets_fresh_on_the_next_run_on_the_same_machine() {
    let dir = tempdir();
    std::fs::create_dir_all(dir.path().join("modules").join("v3")).unwrap();
    write_module(&dir.path().join("modules").join("v3"), "rootfs-image", 1, 0);

    let (mut machine, _kv) = machine_for(dir.path());
    let mut inputs = FakeInputs {
        update_info: update_info_for("rootfs-image"),
        payloads: vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }],
        writer: FixedPayload(b"data"),
    };
    machine.set_phase(Phase::Download);
    machine.run_to_completion(&mut inputs).await.unwrap();
    assert!(machine.tracking().failed());

    // A second attempt on the same machine instance must not inherit the
    // first attempt's failed tracking state.
    write_module(&dir.path().join("modules").join("v3"), "rootfs-image", 0, 0);
    let mut inputs = FakeInputs {
        update_info: update_info_for("rootfs-image"),
        payloads: vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }],
        writer: FixedPayload(b"data"),
    };
    machine.set_phase(Phase::Download);
    machine.run_to_completion(&mut inputs).await.unwrap();
    assert_eq!(machine.tracking(), TrackingState::NoFailures);
}

fn tempdir() -> tempdir_shim::TempDir {
    tempdir_shim::TempDir::new()
}

mod tempdir_shim {
    pub struct TempDir(std::path::PathBuf);

    impl TempDir {
        pub fn new() -> Self {
            let mut path = std::env::temp_dir();
            path.push(format!("uc-core-test-{}-{}", std::process::id(), uid()));
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        pub fn path(&self) -> &std::path::Path {
            &self.0
        }
    }

    fn uid() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
