//! Live console viewer.
//!
//! The presentation surface is owned by a single task. Request handlers
//! enqueue display updates onto a bounded channel and never block on
//! rendering; queue order is submission order. On startup the task replays
//! today's log file so the view matches what was already received.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::message;

/// Depth of the display queue. Updates beyond this are dropped, not queued
/// unbounded and not awaited.
const QUEUE_DEPTH: usize = 256;

/// A single display update.
#[derive(Debug, Clone)]
pub struct ViewerUpdate {
    pub text: String,
    pub sender_label: String,
    pub timestamp: DateTime<Local>,
}

/// Cloneable handle for submitting display updates to the viewer task.
#[derive(Clone)]
pub struct ViewerHandle {
    tx: mpsc::Sender<ViewerUpdate>,
}

impl ViewerHandle {
    /// Enqueue a display update without blocking.
    ///
    /// Best-effort: if the viewer task is gone or the queue is full the
    /// update is dropped with a warning and the caller proceeds.
    pub fn show(&self, text: String, sender_label: String, timestamp: DateTime<Local>) {
        let update = ViewerUpdate {
            text,
            sender_label,
            timestamp,
        };
        if let Err(e) = self.tx.try_send(update) {
            tracing::warn!(error = %e, "Dropped viewer update");
        }
    }
}

/// Spawn the presentation-owning task.
///
/// Returns a submission handle and the task's join handle. The task exits
/// once every `ViewerHandle` is dropped and the queue drains.
pub fn spawn_viewer(replay: Option<PathBuf>) -> (ViewerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let task = tokio::spawn(viewer_loop(rx, replay));
    (ViewerHandle { tx }, task)
}

async fn viewer_loop(mut rx: mpsc::Receiver<ViewerUpdate>, replay: Option<PathBuf>) {
    let mut count: u64 = 0;
    let mut left = true;

    if let Some(path) = replay {
        for update in replay_log(&path) {
            render(&update, left);
            left = !left;
            count += 1;
        }
        if count > 0 {
            tracing::info!(count, "Replayed today's log");
        }
    }

    while let Some(update) = rx.recv().await {
        render(&update, left);
        left = !left;
        count += 1;
        tracing::debug!(count, "Viewer message rendered");
    }
}

/// Render one chat-style line. Messages alternate sides like the bubbles
/// in the original viewer.
fn render(update: &ViewerUpdate, left: bool) {
    let marker = if left { "<" } else { ">" };
    println!(
        "[{}] {} {}: {}",
        update.timestamp.format("%H:%M:%S"),
        marker,
        update.sender_label,
        update.text
    );
}

/// Parse a per-day log file into display updates for startup replay.
///
/// Best-effort: lines that do not match `[YYYY-MM-DD HH:MM:SS] <text>` are
/// skipped. The stored text is the original encoding, so one unwrap layer
/// is applied for display, same as the live path.
pub fn replay_log(path: &Path) -> Vec<ViewerUpdate> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "No log to replay");
            return Vec::new();
        }
    };

    contents.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ViewerUpdate> {
    let rest = line.strip_prefix('[')?;
    let (stamp, text) = rest.split_once("] ")?;
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok()?;
    let timestamp = Local.from_local_datetime(&naive).single()?;

    let raw = serde_json::from_str(text).unwrap_or(serde_json::Value::String(text.to_string()));
    Some(ViewerUpdate {
        text: message::display_text(&raw),
        sender_label: message::DEFAULT_SENDER.to_string(),
        timestamp,
    })
}
