use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::SignalKind;

use uc_apiclient::wire::{DeploymentStatus, InventoryAttribute, NextDeploymentRequest, StatusReport};
use uc_apiclient::{call_with_backoff, ApiClient};
use uc_model::update_info::{ArtifactSource, RebootAction, RollbackSupport, UpdateInfo};
use uc_runtime::signal::SignalHandler;
use uc_runtime::{EventLoop, Timer};

use crate::bootstrap::App;
use crate::inputs::HttpArtifactInputs;

struct DaemonContext {
    app: App,
    server_url: String,
    device_type: String,
}

/// Component J's daemon mode: the poll/install/report cycle and the
/// inventory-push cycle both run as self-rescheduling tasks on Component
/// G's cooperative event loop, so a single `SIGTERM`/`SIGINT` handler can
/// stop the whole daemon cleanly between cycles rather than needing to
/// interrupt a blocking sleep.
pub async fn run(app: App) -> anyhow::Result<()> {
    let server_url = app.config.require_server_url()?.to_string();
    let device_type = std::env::var("UC_DEVICE_TYPE").unwrap_or_else(|_| "generic-armv7".to_string());
    let ctx = Rc::new(DaemonContext { app, server_url, device_type });

    let event_loop = Rc::new(EventLoop::new());

    let stop_loop = event_loop.clone();
    SignalHandler::register(&event_loop, &[SignalKind::terminate(), SignalKind::interrupt()], move |kind| {
        log::info!("received {kind:?}, stopping after the current cycle");
        stop_loop.stop();
    });

    schedule_update_cycle(ctx.clone(), event_loop.clone());
    schedule_inventory_cycle(ctx, event_loop.clone());
    event_loop.run().await;
    Ok(())
}

fn schedule_update_cycle(ctx: Rc<DaemonContext>, event_loop: Rc<EventLoop>) {
    let el = event_loop.clone();
    event_loop.post(async move {
        if let Err(e) = poll_once(&ctx).await {
            log::warn!("update poll cycle failed: {e}");
        }
        let interval = Duration::from_secs(ctx.app.config.update_poll_interval_seconds);
        let next_ctx = ctx.clone();
        let next_el = el.clone();
        Timer::async_wait(&el, interval, move |result| {
            if result.is_ok() {
                schedule_update_cycle(next_ctx, next_el);
            }
        });
    });
}

fn schedule_inventory_cycle(ctx: Rc<DaemonContext>, event_loop: Rc<EventLoop>) {
    let el = event_loop.clone();
    event_loop.post(async move {
        if let Err(e) = push_inventory(&ctx).await {
            log::warn!("inventory push failed: {e}");
        }
        let interval = Duration::from_secs(ctx.app.config.inventory_poll_interval_seconds);
        let next_ctx = ctx.clone();
        let next_el = el.clone();
        Timer::async_wait(&el, interval, move |result| {
            if result.is_ok() {
                schedule_inventory_cycle(next_ctx, next_el);
            }
        });
    });
}

async fn poll_once(ctx: &DaemonContext) -> anyhow::Result<()> {
    let app = &ctx.app;
    let api = ApiClient::new(&app.transport, ctx.server_url.as_str());
    let mut machine = app.deployment_machine()?;

    let current = {
        let kv = app.open_store()?;
        uc_store::ProvidesStore::new(kv).load()?
    };

    let request = NextDeploymentRequest {
        device_type: ctx.device_type.clone(),
        artifact_name: current.artifact_name.clone(),
        provides: current.provides.clone(),
    };

    let response = call_with_backoff(&app.config, app.config.retry_poll_interval_seconds, || {
        api.poll_next_deployment(&request)
    })
    .await?;

    let Some(deployment) = response else {
        return Ok(());
    };

    log::info!("deployment {} available: {}", deployment.id, deployment.artifact.artifact_name);

    // Real payload typing and provides come from the artifact's own
    // header-info/type-info, which parsing the tar format would supply;
    // that parsing is out of scope here, so a single rootfs-image payload
    // is assumed -- the common case for this update module protocol.
    let update_info = UpdateInfo {
        id: deployment.id.clone(),
        artifact_name: deployment.artifact.artifact_name.clone(),
        source: ArtifactSource { uri: deployment.artifact.source.uri.clone(), expire: None },
        payload_types: vec!["rootfs-image".to_string()],
        type_info_provides: BTreeMap::new(),
        clears_artifact_provides: vec!["artifact_group".to_string(), "rootfs-image.*".to_string()],
        reboot_requested: vec![RebootAction::Yes],
        supports_rollback: RollbackSupport::Unknown,
        all_rollbacks_successful: false,
        has_db_schema_update: false,
    };

    let mut inputs = HttpArtifactInputs::new(
        update_info,
        ctx.device_type.clone(),
        deployment.artifact.source.uri.clone(),
        Arc::clone(&app.transport),
    );

    let mut phase_rx = machine.observe_phases();
    let push_phase_statuses = async {
        let mut last_status = None;
        while let Some(phase) = phase_rx.recv().await {
            if phase == uc_core::Phase::BeforeCommit {
                app.transport.invalidate_token().await;
            }
            let Some(status) = status_for_phase(phase) else { continue };
            if last_status != Some(status) {
                let _ = api.push_status(&deployment.id, &StatusReport { status, substate: None }).await;
                last_status = Some(status);
            }
        }
    };

    machine.set_phase(uc_core::Phase::Download);
    let (outcome, ()) = tokio::join!(machine.run_to_completion(&mut inputs), push_phase_statuses);

    let status = match &outcome {
        Ok(()) => DeploymentStatus::Success,
        Err(e) => {
            log::warn!("deployment {} failed: {}", deployment.id, e);
            DeploymentStatus::Failure
        }
    };
    let _ = api.push_status(&deployment.id, &StatusReport { status, substate: None }).await;

    outcome.map_err(anyhow::Error::from)
}

/// Maps a lifecycle phase onto the wire status it corresponds to, for the
/// phases the server's status enum distinguishes; most phases (save-state
/// housekeeping, script edges, rollback) report no intermediate status of
/// their own and are left to the final success/failure push.
fn status_for_phase(phase: uc_core::Phase) -> Option<DeploymentStatus> {
    use uc_core::Phase::*;
    match phase {
        Download => Some(DeploymentStatus::Downloading),
        ArtifactInstall | CheckReboot | VerifyReboot | Commit | AfterCommit => Some(DeploymentStatus::Installing),
        Reboot | RollbackReboot => Some(DeploymentStatus::Rebooting),
        _ => None,
    }
}

async fn push_inventory(ctx: &DaemonContext) -> anyhow::Result<()> {
    let app = &ctx.app;
    let api = ApiClient::new(&app.transport, ctx.server_url.as_str());
    let attributes =
        vec![InventoryAttribute { name: "update-client".to_string(), value: env!("CARGO_PKG_VERSION").to_string() }];
    call_with_backoff(&app.config, app.config.inventory_poll_interval_seconds, || {
        api.push_inventory(&attributes)
    })
    .await?;
    Ok(())
}
