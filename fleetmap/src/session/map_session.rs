//! The session event loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::handle::{SessionCommand, SessionHandle, SessionSnapshot};
use super::poller::{PollSchedule, TickAction};
use super::SessionConfig;
use crate::export::ExportQueue;
use crate::geo::{ScreenPoint, Viewport};
use crate::geojson;
use crate::render::{MapRenderer, RedrawReason, RenderFrame};
use crate::selection::{SelectionController, TapOutcome};
use crate::source::{PositionSource, SourceError};
use crate::store::{FeatureStore, PositionRecord};
use crate::telemetry::SessionMetrics;

/// Result of one fetch, sent back to the session task.
struct FetchOutcome {
    result: Result<Vec<PositionRecord>, SourceError>,
    elapsed: Duration,
}

/// State mutated only on the session task.
struct SessionState<R> {
    store: FeatureStore,
    viewport: Viewport,
    selection: SelectionController,
    renderer: R,
    source: Arc<dyn PositionSource>,
    export: Option<ExportQueue>,
    metrics: Arc<SessionMetrics>,
}

/// Long-running map session.
///
/// Create with [`MapSession::new`], then spawn [`MapSession::run`]. All
/// interaction afterwards goes through the returned [`SessionHandle`].
pub struct MapSession<R: MapRenderer> {
    config: SessionConfig,
    state: SessionState<R>,
    command_rx: mpsc::Receiver<SessionCommand>,
}

impl<R: MapRenderer> MapSession<R> {
    /// Creates a session and its handle.
    ///
    /// If the config names a snapshot file it is loaded here; a missing or
    /// unreadable snapshot is logged and the session starts empty.
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn PositionSource>,
        renderer: R,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let metrics = Arc::new(SessionMetrics::new());

        let store = match &config.snapshot_path {
            Some(path) => load_seed(path),
            None => FeatureStore::new(),
        };

        let state = SessionState {
            store,
            viewport: config.viewport,
            selection: SelectionController::new(config.selection_mode, config.hit_box),
            renderer,
            source,
            export: None,
            metrics: Arc::clone(&metrics),
        };

        let session = Self {
            config,
            state,
            command_rx,
        };
        (session, SessionHandle::new(command_tx, metrics))
    }

    /// Replace the initial store.
    pub fn with_store(mut self, store: FeatureStore) -> Self {
        self.state.store = store;
        self
    }

    /// Submit every successful fetch to an export worker.
    pub fn with_export(mut self, queue: ExportQueue) -> Self {
        self.state.export = Some(queue);
        self
    }

    /// Counters shared with the handle; pass these to the export worker.
    pub fn metrics(&self) -> Arc<SessionMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Runs the session until `shutdown` is cancelled.
    ///
    /// Draws the initial frame, then services ticks, fetch results and
    /// commands. A fetch still in flight when the session ends completes on
    /// its own task and its result is discarded.
    pub async fn run(self, shutdown: CancellationToken) {
        let MapSession {
            config,
            mut state,
            mut command_rx,
        } = self;

        // Cancelled when this future returns or is dropped; in-flight
        // fetches check it before delivering.
        let liveness = shutdown.child_token();
        let _liveness_guard = liveness.clone().drop_guard();

        info!(
            source = %state.source.describe(),
            interval_ms = config.poll_interval.as_millis() as u64,
            entities = state.store.len(),
            visible = config.start_visible,
            "Map session starting"
        );

        state.metrics.set_entities(state.store.len());
        state.redraw(RedrawReason::Initial);

        let (result_tx, mut result_rx) = mpsc::channel::<FetchOutcome>(1);
        let mut schedule =
            PollSchedule::new(config.poll_interval, config.start_visible, Instant::now());

        loop {
            let deadline = schedule.next_tick();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Map session shutting down");
                    break;
                }

                Some(outcome) = result_rx.recv() => {
                    schedule.on_complete(Instant::now());
                    state.apply_fetch(outcome);
                }

                Some(command) = command_rx.recv() => {
                    state.handle_command(command, &mut schedule);
                }

                _ = sleep_until_deadline(deadline) => {
                    match schedule.on_tick(Instant::now()) {
                        TickAction::Dispatch => {
                            state.dispatch_fetch(&result_tx, liveness.child_token());
                        }
                        TickAction::SkipInFlight => {
                            debug!("Previous fetch still in flight, skipping tick");
                            state.metrics.poll_skipped();
                        }
                    }
                }
            }
        }

        info!("Map session stopped");
    }
}

impl<R: MapRenderer> SessionState<R> {
    fn redraw(&mut self, reason: RedrawReason) {
        self.renderer.redraw(&RenderFrame {
            entities: self.store.entities(),
            viewport: &self.viewport,
            reason,
        });
        self.metrics.redraw();
    }

    fn dispatch_fetch(&self, result_tx: &mpsc::Sender<FetchOutcome>, liveness: CancellationToken) {
        self.metrics.poll_dispatched();

        let source = Arc::clone(&self.source);
        let metrics = Arc::clone(&self.metrics);
        let result_tx = result_tx.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let result = source.fetch().await;
            let outcome = FetchOutcome {
                result,
                elapsed: started.elapsed(),
            };

            if liveness.is_cancelled() || result_tx.send(outcome).await.is_err() {
                debug!("Session gone, discarding fetch result");
                metrics.result_discarded();
            }
        });
    }

    fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;

        match outcome.result {
            Ok(records) => {
                let summary = self.store.merge(&records);
                debug!(
                    entities = self.store.len(),
                    changes = %summary,
                    elapsed_ms,
                    "Positions refreshed"
                );

                self.metrics.fetch_succeeded(self.store.len());
                self.redraw(RedrawReason::Refresh);

                if let Some(queue) = &self.export {
                    queue.submit(geojson::from_records(&records));
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    kind = e.kind(),
                    elapsed_ms,
                    "Position fetch failed, keeping previous positions"
                );
                self.metrics.fetch_failed();
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand, schedule: &mut PollSchedule) {
        match command {
            SessionCommand::Tap { point, respond } => {
                let outcome = self.tap(point);
                let _ = respond.send(outcome);
            }
            SessionCommand::TapAt { position, respond } => {
                let outcome = self.tap(self.viewport.project(position));
                let _ = respond.send(outcome);
            }
            SessionCommand::Show => {
                if schedule.show(Instant::now()) {
                    info!("Map visible, polling resumed");
                }
            }
            SessionCommand::Hide => {
                if schedule.hide() {
                    info!("Map hidden, polling paused");
                }
            }
            SessionCommand::SetViewport(viewport) => {
                debug!(center = %viewport.center, zoom = viewport.zoom, "Viewport changed");
                self.viewport = viewport;
            }
            SessionCommand::Snapshot { respond } => {
                let _ = respond.send(SessionSnapshot {
                    entities: self.store.entities().to_vec(),
                    viewport: self.viewport,
                    visible: schedule.is_visible(),
                    in_flight: schedule.is_in_flight(),
                });
            }
        }
    }

    fn tap(&mut self, point: ScreenPoint) -> TapOutcome {
        if !self.viewport.contains(point) {
            debug!(x = point.x, y = point.y, "Tap outside the view ignored");
            self.metrics.tap(false);
            return TapOutcome::Miss;
        }

        let outcome = self.selection.tap(&mut self.store, &self.viewport, point);
        self.metrics.tap(outcome.is_hit());

        match &outcome {
            TapOutcome::Hit { id, selected } => {
                debug!(id = %id, selected, "Marker toggled");
                self.redraw(RedrawReason::Selection);
            }
            TapOutcome::Miss => {
                debug!(at = %self.viewport.unproject(point), "Tap missed");
            }
        }
        outcome
    }
}

fn load_seed(path: &Path) -> FeatureStore {
    match geojson::load_snapshot(path) {
        Ok(store) => {
            info!(path = %path.display(), entities = store.len(), "Loaded snapshot");
            store
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load snapshot, starting empty");
            FeatureStore::new()
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
