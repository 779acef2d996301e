use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "update-client", about = "Device-side OTA update client")]
pub struct Cli {
    /// Directory holding the config file, state store, and update modules.
    #[arg(long, env = "UC_DATA_DIR", default_value = "/var/lib/update-client")]
    pub data_dir: PathBuf,

    /// Path to the TOML config file; missing is not an error.
    #[arg(long, env = "UC_CONFIG", default_value = "/etc/update-client/update-client.conf")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the long-lived polling daemon (the default when no subcommand is given).
    Daemon,
    /// Install an artifact already unpacked at `artifact_dir`, stopping before commit.
    Install {
        artifact_dir: PathBuf,
        /// Stop and exit 4 when a reboot is needed instead of performing it,
        /// leaving the actual reboot to external orchestration.
        #[arg(long)]
        reboot_exit_code: bool,
    },
    /// Commit a previously installed, not-yet-committed artifact.
    Commit,
    /// Roll back a previously installed artifact.
    Rollback,
    /// Resume whatever deployment was interrupted, using the daemon's crash-recovery table.
    Resume,
    /// Print the currently installed artifact name (or `Unknown`).
    ShowArtifact,
    /// Print the provides map and the name/group as `k=v` lines.
    ShowProvides,
}
