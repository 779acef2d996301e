use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use uc_core::{DeploymentMachine, SystemReboot};
use uc_model::Config;
use uc_runner::ModuleRunner;
use uc_scripts::ScriptRunner;
use uc_store::{ProvidesStore, SledStore, StateStore};
use uc_transport::{HttpTransport, NoAuth, TokenProvider};

/// Everything the daemon and the standalone subcommands are built from.
/// Constructed once per invocation from `--data-dir`/`--config`.
pub struct App {
    pub config: Config,
    pub data_dir: PathBuf,
    pub transport: Arc<HttpTransport>,
}

impl App {
    pub fn load(data_dir: &Path, config_path: &Path) -> anyhow::Result<Self> {
        let config = Config::load(config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?;
        bootstrap_data_dir(data_dir)?;

        let token: Arc<dyn TokenProvider> = Arc::new(NoAuth);
        let transport = Arc::new(
            HttpTransport::new(&config, token).context("constructing HTTP transport")?,
        );

        Ok(Self { config, data_dir: data_dir.to_path_buf(), transport })
    }

    pub fn open_store(&self) -> anyhow::Result<SledStore> {
        SledStore::open(&self.data_dir).context("opening state store")
    }

    pub fn module_runner(&self) -> ModuleRunner {
        ModuleRunner::new(&self.data_dir, Duration::from_secs(self.config.module_timeout_seconds))
    }

    pub fn script_runner(&self) -> ScriptRunner {
        ScriptRunner::new(
            &self.data_dir,
            Duration::from_secs(self.config.state_script_timeout_seconds),
            Duration::from_secs(self.config.state_script_retry_interval_seconds),
            Duration::from_secs(self.config.state_script_retry_timeout_seconds),
        )
    }

    pub fn work_root(&self) -> PathBuf {
        self.data_dir.join("work")
    }

    pub fn deployment_machine(&self) -> anyhow::Result<DeploymentMachine> {
        let kv = self.open_store()?;
        let store = StateStore::new(kv.clone(), self.config.state_data_store_count_cap);
        let provides = ProvidesStore::new(kv);
        let runner = self.module_runner();
        let scripts = self.script_runner();
        let mut machine =
            DeploymentMachine::new(store, provides, runner, scripts, Arc::new(SystemReboot), self.work_root());
        machine.recover()?;
        Ok(machine)
    }
}

fn bootstrap_data_dir(data_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;
    std::fs::create_dir_all(data_dir.join("modules").join("v3"))?;
    std::fs::create_dir_all(data_dir.join("scripts"))?;
    std::fs::create_dir_all(data_dir.join("work"))?;
    Ok(())
}
