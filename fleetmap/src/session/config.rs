//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::geo::Viewport;
use crate::selection::{MarkerHitBox, SelectionMode};

/// Default refresh interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Shortest refresh interval accepted; smaller values are raised to this.
pub const MIN_POLL_INTERVAL_MS: u64 = 500;

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Configuration for a [`MapSession`](super::MapSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time between refresh ticks.
    pub poll_interval: Duration,
    /// Whether polling starts immediately.
    pub start_visible: bool,
    /// Initial camera.
    pub viewport: Viewport,
    pub selection_mode: SelectionMode,
    pub hit_box: MarkerHitBox,
    /// Bundled snapshot drawn before the first fetch.
    pub snapshot_path: Option<PathBuf>,
    pub command_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            start_visible: true,
            viewport: Viewport::default(),
            selection_mode: SelectionMode::default(),
            hit_box: MarkerHitBox::default(),
            snapshot_path: None,
            command_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refresh interval, raising it to the minimum if needed.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let min = Duration::from_millis(MIN_POLL_INTERVAL_MS);
        if interval < min {
            warn!(
                requested_ms = interval.as_millis() as u64,
                min_ms = MIN_POLL_INTERVAL_MS,
                "Poll interval below minimum, clamping"
            );
            self.poll_interval = min;
        } else {
            self.poll_interval = interval;
        }
        self
    }

    pub fn with_start_visible(mut self, visible: bool) -> Self {
        self.start_visible = visible;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_hit_box(mut self, hit_box: MarkerHitBox) -> Self {
        self.hit_box = hit_box;
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn with_command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }
}
