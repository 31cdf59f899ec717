//! Operator controls for a running download: typed commands on stdin and
//! Ctrl+C.
//!
//! Both only flip signals on the [`ControlHandle`]; the worker picks them up
//! at the next link boundary.

use std::io::{self, BufRead};

use tracing::{debug, warn};
use vortexflow_core::ControlHandle;

/// Hint shown once a run starts.
pub(crate) const CONTROL_HINT: &str =
    "Controls: [p]ause, [r]esume, [s]top, Enter to confirm a manual step";

/// A command typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlCommand {
    Pause,
    Resume,
    Stop,
    Confirm,
    Unknown(String),
}

pub(crate) fn parse_control_line(line: &str) -> ControlCommand {
    let token = line.trim().to_ascii_lowercase();
    match token.as_str() {
        "p" | "pause" => ControlCommand::Pause,
        "r" | "resume" => ControlCommand::Resume,
        "s" | "stop" | "q" | "quit" => ControlCommand::Stop,
        "" | "c" | "ok" | "confirm" | "done" => ControlCommand::Confirm,
        _ => ControlCommand::Unknown(token),
    }
}

pub(crate) fn apply_control_command(control: &ControlHandle, command: &ControlCommand) {
    match command {
        ControlCommand::Pause => {
            control.pause();
            warn!("Pause requested, the run pauses before the next link");
        }
        ControlCommand::Resume => control.resume(),
        ControlCommand::Stop => {
            control.stop();
            warn!("Stop requested, progress is saved after the current link");
        }
        ControlCommand::Confirm => control.confirm_manual_step(),
        ControlCommand::Unknown(token) => {
            warn!(command = %token, "Unknown control command\n  Suggestion: {CONTROL_HINT}");
        }
    }
}

/// Reads control commands from stdin on a plain thread.
///
/// The thread is never joined; it ends at EOF or with the process.
pub(crate) fn spawn_stdin_reader(control: ControlHandle) {
    let spawned = std::thread::Builder::new()
        .name("vortexflow-control".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let command = parse_control_line(&line);
                debug!(?command, "control input");
                apply_control_command(&control, &command);
            }
            debug!("control input closed");
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start control input reader");
    }
}

/// First Ctrl+C requests a graceful stop; a second one exits immediately.
pub(crate) fn spawn_interrupt_handler(control: ControlHandle) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if control.is_stop_requested() {
                warn!("Second interrupt, exiting without waiting for the current link");
                std::process::exit(130);
            }
            warn!("Interrupted. Stopping after the current link; run `vortexflow resume` to continue.");
            control.stop();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control_line_accepts_short_and_long_forms() {
        assert_eq!(parse_control_line("p"), ControlCommand::Pause);
        assert_eq!(parse_control_line(" PAUSE \n"), ControlCommand::Pause);
        assert_eq!(parse_control_line("resume"), ControlCommand::Resume);
        assert_eq!(parse_control_line("s"), ControlCommand::Stop);
        assert_eq!(parse_control_line("quit"), ControlCommand::Stop);
    }

    #[test]
    fn test_parse_control_line_empty_line_confirms() {
        assert_eq!(parse_control_line(""), ControlCommand::Confirm);
        assert_eq!(parse_control_line("done"), ControlCommand::Confirm);
    }

    #[test]
    fn test_parse_control_line_unknown() {
        assert_eq!(
            parse_control_line("Jump"),
            ControlCommand::Unknown("jump".to_string())
        );
    }

    #[test]
    fn test_apply_control_command_flips_signals() {
        let control = ControlHandle::new();
        apply_control_command(&control, &ControlCommand::Pause);
        assert!(control.is_paused());
        apply_control_command(&control, &ControlCommand::Resume);
        assert!(!control.is_paused());
        apply_control_command(&control, &ControlCommand::Confirm);
        assert_eq!(control.signals().confirmations, 1);
        apply_control_command(&control, &ControlCommand::Unknown("x".to_string()));
        assert!(!control.is_stop_requested());
        apply_control_command(&control, &ControlCommand::Stop);
        assert!(control.is_stop_requested());
    }
}
