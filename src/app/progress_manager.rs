//! Renders orchestrator events: a progress bar on interactive terminals,
//! plain log lines otherwise.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vortexflow_core::{OrchestratorEvent, RunState};

use crate::output::{terminal_width, truncate_to_width};

/// Operator-facing text for an event, or None when the event is not shown.
pub(crate) fn describe_event(event: &OrchestratorEvent) -> Option<String> {
    match event {
        OrchestratorEvent::StateChanged(RunState::Paused) => {
            Some("Paused. Type `r` + Enter to resume, `s` + Enter to stop.".to_string())
        }
        OrchestratorEvent::StateChanged(RunState::Stopping) => {
            Some("Stopping, saving progress...".to_string())
        }
        OrchestratorEvent::ManualActionRequired { link, position, of } => Some(format!(
            "[manual {position}/{of}] Download {link} by hand into the download folder, then press Enter."
        )),
        OrchestratorEvent::LinkFailed(record) => Some(format!(
            "Failed: {} ({})",
            record.link(),
            record.job().folder_name()
        )),
        OrchestratorEvent::Progress {
            current,
            total,
            message,
        } => Some(format!("[{current}/{total}] {message}")),
        _ => None,
    }
}

/// Consumes events until the orchestrator drops its sender.
pub(crate) fn spawn_event_renderer(
    use_progress_bar: bool,
    mut events: mpsc::UnboundedReceiver<OrchestratorEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bar = use_progress_bar.then(new_spinner);
        let width = terminal_width();

        while let Some(event) = events.recv().await {
            debug!(?event, "orchestrator event");
            let Some(text) = describe_event(&event) else {
                continue;
            };
            let text = truncate_to_width(&text, width);
            match (&bar, &event) {
                (Some(bar), OrchestratorEvent::Progress { .. }) => bar.set_message(text),
                (Some(bar), _) => bar.println(text),
                (None, OrchestratorEvent::LinkFailed(_)) => warn!("{text}"),
                (None, OrchestratorEvent::ManualActionRequired { .. }) => eprintln!("{text}"),
                (None, _) => info!("{text}"),
            }
        }

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    })
}

fn new_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
