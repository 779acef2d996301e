use clap::Parser;
use uc_cli::{Cli, Command};

#[test]
fn daemon_is_parsed_with_default_paths() {
    let cli = Cli::parse_from(["update-client", "daemon"]);
    assert!(matches!(cli.command, Command::Daemon));
    assert_eq!(cli.data_dir.to_str().unwrap(), "/var/lib/update-client");
}

#[test]
fn install_requires_an_artifact_dir() {
    let cli = Cli::parse_from(["update-client", "install", "/tmp/artifact"]);
    match cli.command {
        Command::Install { artifact_dir, reboot_exit_code } => {
            assert_eq!(artifact_dir.to_str().unwrap(), "/tmp/artifact");
            assert!(!reboot_exit_code);
        }
        other => panic!("expected Install, got {other:?}"),
    }
}

#[test]
fn install_reboot_exit_code_flag_is_parsed() {
    let cli = Cli::parse_from(["update-client", "install", "/tmp/artifact", "--reboot-exit-code"]);
    match cli.command {
        Command::Install { reboot_exit_code, .. } => assert!(reboot_exit_code),
        other => panic!("expected Install, got {other:?}"),
    }
}

#[test]
fn data_dir_flag_overrides_the_default() {
    let cli = Cli::parse_from(["update-client", "--data-dir", "/custom", "commit"]);
    assert_eq!(cli.data_dir.to_str().unwrap(), "/custom");
    assert!(matches!(cli.command, Command::Commit));
}
