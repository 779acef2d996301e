pub mod bootstrap;
pub mod cli;
pub mod daemon;
pub mod inputs;
pub mod standalone;

use clap::Parser;
use uc_core::StandaloneCommand;

pub use bootstrap::App;
pub use cli::{Cli, Command};

/// Entry point shared by the root binary: parse arguments, load
/// configuration and the on-disk state store, dispatch, and return the
/// process exit code documented for each sub-command. `daemon` runs until
/// signalled to stop and always exits 0; the standalone sub-commands map
/// their outcome through [`standalone::exit_status`].
pub async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = App::load(&cli.data_dir, &cli.config)?;

    match cli.command {
        Command::Daemon => {
            daemon::run(app).await?;
            Ok(0)
        }
        Command::Install { artifact_dir, reboot_exit_code } => {
            let outcome =
                standalone::run(&app, StandaloneCommand::Install, Some(&artifact_dir), reboot_exit_code).await?;
            Ok(report(StandaloneCommand::Install, &outcome))
        }
        Command::Commit => {
            let outcome = standalone::run(&app, StandaloneCommand::Commit, None, false).await?;
            Ok(report(StandaloneCommand::Commit, &outcome))
        }
        Command::Rollback => {
            let outcome = standalone::run(&app, StandaloneCommand::Rollback, None, false).await?;
            Ok(report(StandaloneCommand::Rollback, &outcome))
        }
        Command::Resume => {
            let outcome = standalone::run(&app, StandaloneCommand::Resume, None, false).await?;
            Ok(report(StandaloneCommand::Resume, &outcome))
        }
        Command::ShowArtifact => {
            show_artifact(&app)?;
            Ok(0)
        }
        Command::ShowProvides => {
            show_provides(&app)?;
            Ok(0)
        }
    }
}

/// Prints the single documented status line for a finished standalone
/// command and returns its exit code.
fn report(command: StandaloneCommand, outcome: &standalone::Outcome) -> i32 {
    let (code, message) = standalone::exit_status(command, outcome);
    println!("{message}");
    code
}

fn show_artifact(app: &App) -> anyhow::Result<()> {
    let kv = app.open_store()?;
    let record = uc_store::ProvidesStore::new(kv).load()?;
    let name = if record.artifact_name.is_empty() { "Unknown" } else { &record.artifact_name };
    println!("{name}");
    Ok(())
}

fn show_provides(app: &App) -> anyhow::Result<()> {
    let kv = app.open_store()?;
    let record = uc_store::ProvidesStore::new(kv).load()?;
    println!("artifact_name={}", record.artifact_name);
    println!("artifact_group={}", record.artifact_group);
    for (k, v) in &record.provides {
        println!("{k}={v}");
    }
    Ok(())
}
