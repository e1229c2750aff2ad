//! Map renderer abstraction.
//!
//! Drawing is owned by an external map SDK. The session only tells the
//! renderer *when* to redraw and *what* the store holds; markers are drawn
//! for every entity and a callout for every selected one.
//!
//! # Implementors
//!
//! - `RecordingRenderer` - keeps every frame for inspection (tests, tools)
//! - CLI console renderer - prints frames to the terminal

use std::sync::Arc;

use parking_lot::Mutex;

use crate::geo::Viewport;
use crate::store::TrackedEntity;

/// Why a frame was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawReason {
    /// First frame, from the bundled snapshot.
    Initial,
    /// A fetch was merged.
    Refresh,
    /// A tap toggled a selection.
    Selection,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    /// Entities in draw order; later entries are drawn on top.
    pub entities: &'a [TrackedEntity],
    pub viewport: &'a Viewport,
    pub reason: RedrawReason,
}

impl RenderFrame<'_> {
    /// Entities whose callout is visible.
    pub fn callouts(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter().filter(|e| e.selected)
    }
}

/// Receives redraw requests from the session.
///
/// Called on the session task; implementations should hand the frame off
/// quickly rather than block.
pub trait MapRenderer: Send + 'static {
    fn redraw(&mut self, frame: &RenderFrame<'_>);
}

impl<R: MapRenderer + ?Sized> MapRenderer for Box<R> {
    fn redraw(&mut self, frame: &RenderFrame<'_>) {
        (**self).redraw(frame)
    }
}

/// A frame captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub entities: Vec<TrackedEntity>,
    pub reason: RedrawReason,
}

/// Renderer that records every frame.
///
/// Clones share the same frame log, so a test can keep one clone while the
/// session owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    frames: Arc<Mutex<Vec<RecordedFrame>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn last_frame(&self) -> Option<RecordedFrame> {
        self.frames.lock().last().cloned()
    }

    pub fn frames(&self) -> Vec<RecordedFrame> {
        self.frames.lock().clone()
    }
}

impl MapRenderer for RecordingRenderer {
    fn redraw(&mut self, frame: &RenderFrame<'_>) {
        self.frames.lock().push(RecordedFrame {
            entities: frame.entities.to_vec(),
            reason: frame.reason,
        });
    }
}
