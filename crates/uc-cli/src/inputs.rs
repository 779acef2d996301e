use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use uc_core::DeploymentInputs;
use uc_model::update_info::UpdateInfo;
use uc_runner::{ModuleError, PayloadSpec, PayloadWriter};
use uc_transport::{HttpTransport, ResumeConfig, Resumer, TransportError};

/// The artifact-format parsing (tar layout, header-info/type-info, signature
/// verification) this would normally come from is out of scope here -- the
/// single payload this carries is the artifact body itself, named after its
/// one declared payload type. Real deployments with more than one payload
/// or a non-trivial header never reach this; `update_info.single_payload_type`
/// is checked before this is constructed.
pub struct HttpArtifactInputs {
    update_info: UpdateInfo,
    device_type: String,
    header_files: BTreeMap<String, Vec<u8>>,
    payloads: Vec<PayloadSpec>,
    artifact_url: String,
    transport: Arc<HttpTransport>,
    resume_cfg: ResumeConfig,
}

impl HttpArtifactInputs {
    pub fn new(
        update_info: UpdateInfo,
        device_type: String,
        artifact_url: String,
        transport: Arc<HttpTransport>,
    ) -> Self {
        let payload_name = update_info.payload_types.first().cloned().unwrap_or_default();
        Self {
            payloads: vec![PayloadSpec { name: payload_name, size: None }],
            update_info,
            device_type,
            header_files: BTreeMap::new(),
            artifact_url,
            transport,
            resume_cfg: ResumeConfig::default(),
        }
    }
}

impl DeploymentInputs for HttpArtifactInputs {
    fn update_info(&self) -> &UpdateInfo {
        &self.update_info
    }

    fn device_type(&self) -> &str {
        &self.device_type
    }

    fn header_files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.header_files
    }

    fn payloads(&self) -> &[PayloadSpec] {
        &self.payloads
    }

    fn payload_writer(&mut self) -> &mut dyn PayloadWriter {
        self
    }
}

#[async_trait]
impl PayloadWriter for HttpArtifactInputs {
    /// Bridges the resumable downloader's synchronous `on_chunk` callback to
    /// the async FIFO sink the update module reads from: chunks are handed
    /// off over an unbounded channel and written out as they arrive, with
    /// the download and the write loop driven concurrently so neither has to
    /// buffer the whole artifact in memory.
    async fn write_payload(
        &mut self,
        _name: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), ModuleError> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();
        let resumer = Resumer::new(&self.transport, self.resume_cfg);

        let download = resumer.download(&self.artifact_url, move |chunk| {
            tx.send(chunk.to_vec()).map_err(|_| TransportError::Io("payload receiver dropped".into()))
        });

        let write_loop = async {
            while let Some(chunk) = rx.recv().await {
                sink.write_all(&chunk).await.map_err(|e| ModuleError::Io(e.to_string()))?;
            }
            Ok::<(), ModuleError>(())
        };

        let (download_result, write_result) = tokio::join!(download, write_loop);
        download_result.map_err(|e| ModuleError::Io(e.to_string()))?;
        write_result
    }
}

/// Carries a previously-persisted [`UpdateInfo`] back into the machine for a
/// resumed (commit/rollback/resume) standalone run, none of which ever
/// re-enter the download phase -- there is nothing for `payload_writer` to
/// stream.
pub struct ResumedInputs {
    update_info: UpdateInfo,
    device_type: String,
    header_files: BTreeMap<String, Vec<u8>>,
}

impl ResumedInputs {
    pub fn new(update_info: UpdateInfo, device_type: String) -> Self {
        Self { update_info, device_type, header_files: BTreeMap::new() }
    }
}

impl DeploymentInputs for ResumedInputs {
    fn update_info(&self) -> &UpdateInfo {
        &self.update_info
    }

    fn device_type(&self) -> &str {
        &self.device_type
    }

    fn header_files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.header_files
    }

    fn payloads(&self) -> &[PayloadSpec] {
        &[]
    }

    fn payload_writer(&mut self) -> &mut dyn PayloadWriter {
        self
    }
}

#[async_trait]
impl PayloadWriter for ResumedInputs {
    async fn write_payload(
        &mut self,
        _name: &str,
        _sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<(), ModuleError> {
        Err(ModuleError::ProtocolError("download requested by a resumed standalone run".into()))
    }
}
