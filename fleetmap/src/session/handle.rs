//! Command channel into a running session.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::SessionError;
use crate::geo::{LatLon, ScreenPoint, Viewport};
use crate::selection::TapOutcome;
use crate::store::TrackedEntity;
use crate::telemetry::{MetricsSnapshot, SessionMetrics};

/// Requests processed by the session task, in the order they were sent.
#[derive(Debug)]
pub enum SessionCommand {
    /// Tap at a screen point.
    Tap {
        point: ScreenPoint,
        respond: oneshot::Sender<TapOutcome>,
    },
    /// Tap at a geographic position, projected with the current viewport.
    TapAt {
        position: LatLon,
        respond: oneshot::Sender<TapOutcome>,
    },
    /// The view became visible.
    Show,
    /// The view was hidden.
    Hide,
    /// Move the camera.
    SetViewport(Viewport),
    /// Read the current store and schedule state.
    Snapshot {
        respond: oneshot::Sender<SessionSnapshot>,
    },
}

/// Point-in-time view of a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub entities: Vec<TrackedEntity>,
    pub viewport: Viewport,
    pub visible: bool,
    pub in_flight: bool,
}

impl SessionSnapshot {
    pub fn selected(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter().filter(|e| e.selected)
    }
}

/// Cloneable handle to a running [`MapSession`](super::MapSession).
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    metrics: Arc<SessionMetrics>,
}

impl SessionHandle {
    pub(super) fn new(tx: mpsc::Sender<SessionCommand>, metrics: Arc<SessionMetrics>) -> Self {
        Self { tx, metrics }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    /// Tap at a screen point and wait for the outcome.
    pub async fn tap(&self, point: ScreenPoint) -> Result<TapOutcome, SessionError> {
        let (respond, rx) = oneshot::channel();
        self.send(SessionCommand::Tap { point, respond }).await?;
        rx.await.map_err(|_| SessionError::NoReply("tap"))
    }

    /// Tap where `position` currently appears on screen.
    pub async fn tap_at(&self, position: LatLon) -> Result<TapOutcome, SessionError> {
        let (respond, rx) = oneshot::channel();
        self.send(SessionCommand::TapAt { position, respond })
            .await?;
        rx.await.map_err(|_| SessionError::NoReply("tap"))
    }

    pub async fn show(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Show).await
    }

    pub async fn hide(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Hide).await
    }

    /// Move the camera used for hit testing. The viewport is validated
    /// first; an invalid one is rejected and the session keeps its current
    /// camera.
    pub async fn set_viewport(&self, viewport: Viewport) -> Result<(), SessionError> {
        let viewport = viewport.validated()?;
        self.send(SessionCommand::SetViewport(viewport)).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (respond, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { respond }).await?;
        rx.await.map_err(|_| SessionError::NoReply("snapshot"))
    }

    /// Counters, read without a round trip through the session task.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Whether the session task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
