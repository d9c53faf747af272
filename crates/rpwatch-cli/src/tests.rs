use std::path::PathBuf;

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["rpwatch"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_and_once() {
    let cli = Cli::try_parse_from(["rpwatch", "run"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Run)));

    let cli = Cli::try_parse_from(["rpwatch", "once"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Once)));
}

#[test]
fn parses_state_show_with_explicit_path() {
    let cli = Cli::try_parse_from(["rpwatch", "state", "show", "--path", "/tmp/s.json"])
        .expect("expected valid cli args");
    let Some(Commands::State { path, command }) = cli.command else {
        panic!("expected state command");
    };
    assert_eq!(path, PathBuf::from("/tmp/s.json"));
    assert!(matches!(command, StateCommands::Show));
}

#[test]
fn parses_state_reset() {
    let cli = Cli::try_parse_from(["rpwatch", "state", "--path", "x.json", "reset"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::State {
            command: StateCommands::Reset,
            ..
        })
    ));
}

#[test]
fn state_requires_subcommand() {
    assert!(Cli::try_parse_from(["rpwatch", "state"]).is_err());
}

#[test]
fn unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["rpwatch", "scrape"]).is_err());
}
