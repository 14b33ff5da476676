use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use mg_core::MapGenError;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::render::RenderSession;
use crate::{emit_error, map_cli_input_read, map_cli_watch};

/// Events arriving this soon after a change are folded into one render.
pub(crate) const WATCH_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WatchSummary {
    pub(crate) renders: usize,
    pub(crate) failures: usize,
}

pub(crate) fn is_change_of(event: &Event, input: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| path == input)
}

/// Watches the input's directory, since editors may replace the file on
/// save, and renders again on every change until the watcher stops.
pub(crate) fn watch_input(session: &mut RenderSession) -> Result<WatchSummary, MapGenError> {
    let input = session
        .input()
        .canonicalize()
        .map_err(map_cli_input_read)?;
    let directory = input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (sender, receiver) = channel();
    let mut watcher = notify::recommended_watcher(sender).map_err(map_cli_watch)?;
    watcher
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(map_cli_watch)?;
    println!("WATCH:READY");
    Ok(watch_loop(session, &input, &receiver))
}

pub(crate) fn watch_loop(
    session: &mut RenderSession,
    input: &Path,
    events: &Receiver<notify::Result<Event>>,
) -> WatchSummary {
    let mut summary = WatchSummary::default();
    while let Ok(event) = events.recv() {
        match event {
            Ok(event) if is_change_of(&event, input) => {}
            Ok(_) => continue,
            Err(error) => {
                warn!(%error, "file watcher error");
                continue;
            }
        }
        while events.recv_timeout(WATCH_DEBOUNCE).is_ok() {}

        summary.renders += 1;
        debug!(input = %input.display(), "input changed");
        println!("WATCH:CHANGED");
        match session.render() {
            Ok(map) => session.print_success(&map),
            Err(error) => {
                summary.failures += 1;
                emit_error(error);
            }
        }
    }
    summary
}
