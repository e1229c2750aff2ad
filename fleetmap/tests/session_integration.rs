//! Integration tests for the map session.
//!
//! These tests drive a complete [`MapSession`] with a scripted position
//! source and a recording renderer:
//! - fetch → merge → redraw, with selection surviving refreshes
//! - poll cadence, skipped ticks and visibility changes
//! - failure handling and teardown while a fetch is in flight
//! - seeding from a snapshot file and exporting each refresh
//!
//! Most tests run with a paused clock so cadence is deterministic.
//!
//! Run with: `cargo test --test session_integration`

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fleetmap::export::{ExportWorker, GeoJsonExporter};
use fleetmap::geo::{LatLon, ScreenPoint, Viewport};
use fleetmap::geojson::{parse_collection, Geometry};
use fleetmap::render::{RedrawReason, RecordingRenderer};
use fleetmap::selection::{SelectionMode, TapOutcome};
use fleetmap::session::{MapSession, SessionConfig, SessionError, SessionHandle};
use fleetmap::source::{BoxFuture, PositionSource, SourceError};
use fleetmap::store::{EntityId, PositionRecord};

// ============================================================================
// Helpers
// ============================================================================

type FetchResult = Result<Vec<PositionRecord>, SourceError>;

/// Position source that replays a fixed script, then fails.
struct ScriptedSource {
    script: Mutex<VecDeque<FetchResult>>,
    delay: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedSource {
    fn new(script: Vec<FetchResult>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every fetch takes `delay` to answer.
    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }
}

impl PositionSource for ScriptedSource {
    fn fetch(&self) -> BoxFuture<'_, FetchResult> {
        Box::pin(async move {
            self.calls.lock().push(Instant::now());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(SourceError::Http("script exhausted".to_string())))
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

struct Harness {
    handle: SessionHandle,
    renderer: RecordingRenderer,
    source: Arc<ScriptedSource>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl Harness {
    fn start(config: SessionConfig, source: ScriptedSource) -> Self {
        let renderer = RecordingRenderer::new();
        let source = Arc::new(source);
        let (session, handle) = MapSession::new(config, source.clone(), renderer.clone());

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(session.run(shutdown.clone()));

        Self {
            handle,
            renderer,
            source,
            shutdown,
            task,
        }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.task.await.unwrap();
    }
}

const INTERVAL: Duration = Duration::from_millis(2000);

/// Camera centered on the test fleet.
fn test_viewport() -> Viewport {
    Viewport::new(LatLon::new(40.1, -73.9), 14.0, 1080.0, 1920.0).unwrap()
}

fn test_config() -> SessionConfig {
    SessionConfig::new()
        .with_poll_interval(INTERVAL)
        .with_viewport(test_viewport())
}

/// Let spawned work run without crossing a tick boundary.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Advance past the next tick and let its fetch land.
async fn next_cycle() {
    tokio::time::sleep(INTERVAL + Duration::from_millis(100)).await;
}

fn ok(records: &[(&str, f64, f64)]) -> FetchResult {
    Ok(records
        .iter()
        .map(|(id, lat, lon)| PositionRecord::new(*id, *lat, *lon))
        .collect())
}

// ============================================================================
// Refresh and Selection
// ============================================================================

/// One truck arrives, is tapped, and its callout appears.
#[tokio::test(start_paused = true)]
async fn test_fetch_then_tap_selects_marker() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("t1", 40.1, -73.9)])]),
    );
    settle().await;

    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.entities[0].id.as_str(), "t1");
    assert!(!snapshot.entities[0].selected);
    assert_eq!(harness.renderer.frame_count(), 2);

    let outcome = harness.handle.tap_at(LatLon::new(40.1, -73.9)).await.unwrap();
    assert_eq!(
        outcome,
        TapOutcome::Hit {
            id: EntityId::new("t1"),
            selected: true
        }
    );

    // Exactly one extra redraw, showing the callout
    assert_eq!(harness.renderer.frame_count(), 3);
    let frame = harness.renderer.last_frame().unwrap();
    assert_eq!(frame.reason, RedrawReason::Selection);
    assert!(frame.entities[0].selected);

    let metrics = harness.handle.metrics();
    assert_eq!(metrics.taps_hit, 1);
    assert_eq!(metrics.redraws, 3);

    harness.stop().await;
}

/// Selected entities keep their selection across refreshes by id.
#[tokio::test(start_paused = true)]
async fn test_selection_survives_refresh() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![
            ok(&[("a", 40.1, -73.9), ("b", 40.11, -73.89)]),
            ok(&[("a", 40.102, -73.898), ("c", 40.12, -73.88)]),
        ]),
    );
    settle().await;

    let outcome = harness.handle.tap_at(LatLon::new(40.1, -73.9)).await.unwrap();
    assert!(outcome.is_hit());

    next_cycle().await;

    let snapshot = harness.handle.snapshot().await.unwrap();
    let ids: Vec<&str> = snapshot.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    assert!(snapshot.entities[0].selected);
    assert_eq!(snapshot.entities[0].position, LatLon::new(40.102, -73.898));
    assert!(!snapshot.entities[1].selected);

    let reasons: Vec<RedrawReason> = harness
        .renderer
        .frames()
        .iter()
        .map(|f| f.reason)
        .collect();
    assert_eq!(
        reasons,
        vec![
            RedrawReason::Initial,
            RedrawReason::Refresh,
            RedrawReason::Selection,
            RedrawReason::Refresh,
        ]
    );

    harness.stop().await;
}

/// A tap on empty map changes nothing and draws nothing.
#[tokio::test(start_paused = true)]
async fn test_tap_on_empty_map_is_ignored() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("t1", 40.1, -73.9)])]),
    );
    settle().await;
    let frames = harness.renderer.frame_count();

    let outcome = harness.handle.tap_at(LatLon::new(40.2, -73.7)).await.unwrap();
    assert_eq!(outcome, TapOutcome::Miss);
    assert_eq!(harness.renderer.frame_count(), frames);
    assert_eq!(harness.handle.metrics().taps_missed, 1);

    harness.stop().await;
}

/// Hit testing follows the camera.
#[tokio::test(start_paused = true)]
async fn test_viewport_change_moves_hit_targets() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("t1", 40.1, -73.9)])]),
    );
    settle().await;

    // Screen center is where t1 sits with the test camera
    let center = test_viewport().project(LatLon::new(40.1, -73.9));
    let tap = center.offset(0.0, -8.0);
    assert!(harness.handle.tap(tap).await.unwrap().is_hit());

    harness
        .handle
        .set_viewport(test_viewport().with_center(LatLon::new(41.0, -73.0)))
        .await
        .unwrap();
    assert_eq!(harness.handle.tap(tap).await.unwrap(), TapOutcome::Miss);

    harness.stop().await;
}

/// Taps outside the visible area never select anything.
#[tokio::test(start_paused = true)]
async fn test_tap_outside_view_is_ignored() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("t1", 40.1, -73.9)])]),
    );
    settle().await;
    let frames = harness.renderer.frame_count();

    let outcome = harness.handle.tap(ScreenPoint::new(-5.0, 960.0)).await.unwrap();
    assert_eq!(outcome, TapOutcome::Miss);
    let outcome = harness.handle.tap(ScreenPoint::new(540.0, 5000.0)).await.unwrap();
    assert_eq!(outcome, TapOutcome::Miss);

    assert_eq!(harness.renderer.frame_count(), frames);
    assert_eq!(harness.handle.metrics().taps_missed, 2);

    harness.stop().await;
}

/// A malformed camera is rejected and the previous one stays in use.
#[tokio::test(start_paused = true)]
async fn test_invalid_viewport_is_rejected() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("t1", 40.1, -73.9)])]),
    );
    settle().await;

    let mut broken = test_viewport();
    broken.zoom = f64::NAN;
    let err = harness.handle.set_viewport(broken).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidViewport(_)));

    let mut flat = test_viewport();
    flat.width = 0.0;
    assert!(harness.handle.set_viewport(flat).await.is_err());

    assert_eq!(harness.handle.snapshot().await.unwrap().viewport, test_viewport());
    let outcome = harness.handle.tap_at(LatLon::new(40.1, -73.9)).await.unwrap();
    assert!(outcome.is_hit());

    harness.stop().await;
}

/// Single-selection mode keeps at most one callout open.
#[tokio::test(start_paused = true)]
async fn test_single_selection_mode() {
    let harness = Harness::start(
        test_config().with_selection_mode(SelectionMode::Single),
        ScriptedSource::new(vec![ok(&[("a", 40.1, -73.9), ("b", 40.11, -73.89)])]),
    );
    settle().await;

    harness.handle.tap_at(LatLon::new(40.1, -73.9)).await.unwrap();
    harness.handle.tap_at(LatLon::new(40.11, -73.89)).await.unwrap();

    let snapshot = harness.handle.snapshot().await.unwrap();
    let selected: Vec<&str> = snapshot.selected().map(|e| e.id.as_str()).collect();
    assert_eq!(selected, vec!["b"]);

    harness.stop().await;
}

// ============================================================================
// Failure Handling
// ============================================================================

/// A failed fetch keeps the previous positions and draws nothing.
#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_previous_positions() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![
            ok(&[("a", 40.1, -73.9), ("b", 40.11, -73.89)]),
            Err(SourceError::Http("connection refused".to_string())),
        ]),
    );
    settle().await;
    assert_eq!(harness.renderer.frame_count(), 2);

    next_cycle().await;

    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.entities.len(), 2);
    assert_eq!(harness.renderer.frame_count(), 2);

    let metrics = harness.handle.metrics();
    assert_eq!(metrics.fetch_succeeded, 1);
    assert_eq!(metrics.fetch_failed, 1);
    assert_eq!(metrics.entities, 2);

    harness.stop().await;
}

/// Polling continues after failures.
#[tokio::test(start_paused = true)]
async fn test_polling_recovers_after_failure() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![
            Err(SourceError::Malformed("not json".to_string())),
            ok(&[("a", 40.1, -73.9)]),
        ]),
    );
    settle().await;
    assert_eq!(harness.handle.snapshot().await.unwrap().entities.len(), 0);

    next_cycle().await;
    assert_eq!(harness.handle.snapshot().await.unwrap().entities.len(), 1);

    harness.stop().await;
}

// ============================================================================
// Cadence and Visibility
// ============================================================================

/// Consecutive fetches start at least one interval apart.
#[tokio::test(start_paused = true)]
async fn test_poll_cadence() {
    let script = (0..10).map(|_| ok(&[("a", 40.1, -73.9)])).collect();
    let harness = Harness::start(test_config(), ScriptedSource::new(script));

    tokio::time::sleep(Duration::from_millis(10_100)).await;

    let calls = harness.source.calls();
    assert_eq!(calls.len(), 6);
    for pair in calls.windows(2) {
        assert!(pair[1] - pair[0] >= INTERVAL);
    }

    harness.stop().await;
}

/// A slow source never has two requests in flight.
#[tokio::test(start_paused = true)]
async fn test_slow_fetch_skips_ticks() {
    let delay = Duration::from_millis(5000);
    let script = (0..10).map(|_| ok(&[("a", 40.1, -73.9)])).collect();
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(script).with_delay(delay),
    );

    tokio::time::sleep(Duration::from_millis(12_500)).await;

    let calls = harness.source.calls();
    assert!(calls.len() >= 2);
    for pair in calls.windows(2) {
        assert!(pair[1] - pair[0] >= delay);
    }

    let metrics = harness.handle.metrics();
    assert!(metrics.polls_skipped >= 2);
    assert_eq!(metrics.polls_dispatched, calls.len() as u64);

    harness.stop().await;
}

/// Hiding the view pauses polling; showing it fetches immediately.
#[tokio::test(start_paused = true)]
async fn test_hide_and_show() {
    let script = (0..10).map(|_| ok(&[("a", 40.1, -73.9)])).collect();
    let harness = Harness::start(test_config(), ScriptedSource::new(script));
    settle().await;
    assert_eq!(harness.source.calls().len(), 1);

    harness.handle.hide().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.source.calls().len(), 1);
    assert!(!harness.handle.snapshot().await.unwrap().visible);

    harness.handle.show().await.unwrap();
    settle().await;
    assert_eq!(harness.source.calls().len(), 2);

    // Already visible: no extra fetch
    harness.handle.show().await.unwrap();
    settle().await;
    assert_eq!(harness.source.calls().len(), 2);

    harness.stop().await;
}

/// Showing the view while an older fetch is still running fires the
/// resume cycle as soon as that fetch lands, not one interval later.
#[tokio::test(start_paused = true)]
async fn test_show_during_fetch_resumes_when_it_lands() {
    let delay = Duration::from_millis(1500);
    let script = (0..10).map(|_| ok(&[("a", 40.1, -73.9)])).collect();
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(script).with_delay(delay),
    );
    settle().await;
    assert_eq!(harness.source.calls().len(), 1);

    tokio::time::sleep(Duration::from_millis(500)).await;
    harness.handle.hide().await.unwrap();
    harness.handle.show().await.unwrap();

    // The first fetch lands at 1500ms; the resume cycle follows at once
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let calls = harness.source.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1] - calls[0] >= delay);
    assert!(calls[1] - calls[0] < INTERVAL);
    assert_eq!(harness.handle.metrics().polls_skipped, 0);

    harness.stop().await;
}

/// A session that starts hidden draws its seed but does not poll.
#[tokio::test(start_paused = true)]
async fn test_start_hidden() {
    let harness = Harness::start(
        test_config().with_start_visible(false),
        ScriptedSource::new(vec![ok(&[("a", 40.1, -73.9)])]),
    );
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(harness.source.calls().is_empty());
    assert_eq!(harness.renderer.frame_count(), 1);

    harness.handle.show().await.unwrap();
    settle().await;
    assert_eq!(harness.source.calls().len(), 1);
    assert_eq!(harness.renderer.frame_count(), 2);

    harness.stop().await;
}

// ============================================================================
// Teardown
// ============================================================================

/// A fetch that completes after shutdown is discarded.
#[tokio::test(start_paused = true)]
async fn test_result_after_shutdown_is_discarded() {
    let harness = Harness::start(
        test_config(),
        ScriptedSource::new(vec![ok(&[("a", 40.1, -73.9)])])
            .with_delay(Duration::from_secs(3)),
    );
    settle().await;
    assert_eq!(harness.source.calls().len(), 1);

    let handle = harness.handle.clone();
    let renderer = harness.renderer.clone();
    harness.stop().await;

    tokio::time::sleep(Duration::from_secs(5)).await;

    let metrics = handle.metrics();
    assert_eq!(metrics.results_discarded, 1);
    assert_eq!(metrics.fetch_succeeded, 0);
    assert_eq!(renderer.frame_count(), 1);

    assert!(handle.is_closed());
    assert_eq!(handle.snapshot().await.unwrap_err(), SessionError::Closed);
}

// ============================================================================
// Snapshot Seeding and Export
// ============================================================================

const SEED: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-73.9, 40.1] },
      "properties": { "id": "t1", "name": "Truck 1", "selected": true }
    },
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [-73.89, 40.11] },
      "properties": { "id": "t2" }
    }
  ]
}"#;

/// The seed is drawn first, unselected, and names carry over refreshes.
#[tokio::test(start_paused = true)]
async fn test_seed_snapshot_drawn_first() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("trucks.geojson");
    std::fs::write(&seed, SEED).unwrap();

    let harness = Harness::start(
        test_config().with_snapshot_path(&seed),
        ScriptedSource::new(vec![ok(&[("t1", 40.105, -73.9)])]),
    );
    settle().await;

    let frames = harness.renderer.frames();
    assert_eq!(frames[0].reason, RedrawReason::Initial);
    assert_eq!(frames[0].entities.len(), 2);
    assert!(frames[0].entities.iter().all(|e| !e.selected));

    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.entities[0].name.as_deref(), Some("Truck 1"));

    harness.stop().await;
}

/// A missing seed file leaves the map empty until the first fetch.
#[tokio::test(start_paused = true)]
async fn test_missing_seed_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let harness = Harness::start(
        test_config()
            .with_snapshot_path(dir.path().join("absent.geojson"))
            .with_start_visible(false),
        ScriptedSource::new(Vec::new()),
    );
    settle().await;

    let frame = harness.renderer.last_frame().unwrap();
    assert_eq!(frame.reason, RedrawReason::Initial);
    assert!(frame.entities.is_empty());

    harness.stop().await;
}

/// Each successful fetch is exported as a FeatureCollection.
#[tokio::test]
async fn test_refresh_is_exported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trucks.geojson");

    let renderer = RecordingRenderer::new();
    let source = Arc::new(ScriptedSource::new(vec![ok(&[
        ("a", 40.1, -73.9),
        ("b", 40.11, -73.89),
    ])]));
    let (session, handle) = MapSession::new(test_config(), source, renderer);
    let (worker, queue) = ExportWorker::new(GeoJsonExporter::new(&path), session.metrics());
    let session = session.with_export(queue);

    let shutdown = CancellationToken::new();
    let worker_task = tokio::spawn(worker.run(shutdown.clone()));
    let session_task = tokio::spawn(session.run(shutdown.clone()));

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while handle.metrics().exports_written == 0 && std::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let document = parse_collection(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(document.len(), 2);

    let first = &document.features[0];
    assert_eq!(first.properties.id.as_str(), "a");
    assert_eq!(first.properties.selected, None);
    let Geometry::Point { coordinates } = &first.geometry;
    assert_eq!(*coordinates, [-73.9, 40.1]);

    shutdown.cancel();
    session_task.await.unwrap();
    worker_task.await.unwrap();
}
