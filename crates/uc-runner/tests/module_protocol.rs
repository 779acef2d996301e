use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use uc_runner::{ModuleError, ModuleRunner, PayloadSpec, PayloadWriter, SubCommand, WorkDir};

fn write_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

struct FixedPayload(&'static [u8]);

#[async_trait]
impl PayloadWriter for FixedPayload {
    async fn write_payload(
        &mut self,
        _name: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), ModuleError> {
        sink.write_all(self.0).await?;
        Ok(())
    }
}

#[tokio::test]
async fn supports_rollback_parses_strict_yes_no() {
    let dir = tempdir();
    let module = write_script(&dir, "rootfs-image", "echo Yes");
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let answer = runner.supports_rollback(&module, &work_dir).await.unwrap();
    assert_eq!(answer, uc_model::update_info::RollbackSupport::Yes);
}

#[tokio::test]
async fn protocol_error_on_malformed_stdout() {
    let dir = tempdir();
    let module = write_script(&dir, "rootfs-image", "echo maybe");
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let err = runner.supports_rollback(&module, &work_dir).await.unwrap_err();
    assert!(matches!(err, ModuleError::ProtocolError(_)));
}

#[tokio::test]
async fn nonzero_exit_propagates_as_exit_status_error() {
    let dir = tempdir();
    let module = write_script(&dir, "rootfs-image", "exit 3");
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let err = runner.run_lifecycle_step(&module, SubCommand::ArtifactInstall, &work_dir).await.unwrap_err();
    assert!(matches!(err, ModuleError::NonZeroExitStatus(3)));
}

#[tokio::test]
async fn download_protocol_streams_payload_through_fifo() {
    let dir = tempdir();
    // Reads the line from stream-next, then reads the named stream to EOF.
    let module = write_script(
        &dir,
        "rootfs-image",
        r#"
work=$2
name=$(cat "$work/stream-next")
cat "$work/streams/$name" > /dev/null
cat "$work/stream-next" > /dev/null
exit 0
"#,
    );
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let payloads = vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }];
    let mut writer = FixedPayload(b"data");
    runner.download(&module, &work_dir, false, &payloads, &mut writer, false).await.unwrap();
}

#[tokio::test]
async fn download_falls_back_to_files_when_module_never_opens_the_stream() {
    let dir = tempdir();
    // Reads only stream-next's name, never opens streams/<name>, exits 0.
    let module = write_script(
        &dir,
        "rootfs-image",
        r#"
work=$2
cat "$work/stream-next" > /dev/null
exit 0
"#,
    );
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let payloads = vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }];
    let mut writer = FixedPayload(b"data");
    runner.download(&module, &work_dir, false, &payloads, &mut writer, false).await.unwrap();

    let fallback = work_dir.fallback_file_path("rootfs");
    assert_eq!(std::fs::read(&fallback).unwrap(), b"data");
}

#[tokio::test]
async fn download_propagates_nonzero_exit_over_broken_pipe() {
    let dir = tempdir();
    let module = write_script(&dir, "rootfs-image", "exit 7");
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let payloads = vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }];
    let mut writer = FixedPayload(b"data");
    let err = runner.download(&module, &work_dir, false, &payloads, &mut writer, false).await.unwrap_err();
    assert!(matches!(err, ModuleError::NonZeroExitStatus(7)));
}

#[tokio::test]
async fn download_persists_to_disk_even_when_module_consumes_the_fifo_for_rootfs_image() {
    let dir = tempdir();
    // Reads and fully drains the named stream through the FIFO, same as
    // `download_protocol_streams_payload_through_fifo`.
    let module = write_script(
        &dir,
        "rootfs-image",
        r#"
work=$2
name=$(cat "$work/stream-next")
cat "$work/streams/$name" > /dev/null
cat "$work/stream-next" > /dev/null
exit 0
"#,
    );
    let runner = ModuleRunner::new(dir.path(), Duration::from_secs(5));
    let work_dir = WorkDir::prepare(&dir.path().join("wd"), "old", "", "qemux86", &BTreeMap::new()).unwrap();
    let payloads = vec![PayloadSpec { name: "rootfs".into(), size: Some(4) }];
    let mut writer = FixedPayload(b"data");
    runner.download(&module, &work_dir, false, &payloads, &mut writer, true).await.unwrap();

    // Even though the module consumed the payload over the FIFO, the
    // rootfs-image special case must still leave a copy on disk for a
    // later verify-reboot invocation to find.
    let fallback = work_dir.fallback_file_path("rootfs");
    assert_eq!(std::fs::read(&fallback).unwrap(), b"data");
}

fn tempdir() -> tempdir_shim::TempDir {
    tempdir_shim::TempDir::new()
}

/// Minimal temp-dir helper so this test file doesn't need an extra
/// dev-dependency just for directory cleanup.
mod tempdir_shim {
    pub struct TempDir(std::path::PathBuf);

    impl TempDir {
        pub fn new() -> Self {
            let mut path = std::env::temp_dir();
            path.push(format!("uc-runner-test-{}-{}", std::process::id(), uid()));
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
