//! Exit code logic for the vortexflow process.
//!
//! Single responsibility: map a run summary to the process exit outcome.

use vortexflow_core::RunSummary;

use crate::ProcessExit;

/// Links left undone count against the run: failed records and links
/// saved in a session for a later resume.
pub(crate) fn determine_exit_outcome(summary: &RunSummary) -> ProcessExit {
    let done = summary.succeeded + summary.manual + summary.recovered;
    let undone = summary.failed.len() + summary.remaining_links;
    if undone == 0 {
        ProcessExit::Success
    } else if done > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}
