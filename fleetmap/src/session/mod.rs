//! The map session: polling, merging, selection and redraws.
//!
//! A [`MapSession`] owns the [`FeatureStore`](crate::store::FeatureStore)
//! and is its only writer. Fetch results, taps and visibility changes all
//! arrive on the session task and are applied one at a time, so a merge and
//! a toggle never race.
//!
//! # Architecture
//!
//! ```text
//!  SessionHandle ──commands──►┌──────────────────────────┐
//!                             │        MapSession        │──redraw──► MapRenderer
//!  PollSchedule tick ────────►│  FeatureStore            │
//!                             │  SelectionController     │──submit──► ExportQueue
//!  fetch task ────results────►│  Viewport                │
//!       ▲                     └────────────┬─────────────┘
//!       └──────────── spawn (child token) ─┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fleetmap::session::{MapSession, SessionConfig};
//!
//! let (session, handle) = MapSession::new(SessionConfig::default(), source, renderer);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(session.run(shutdown.clone()));
//!
//! let outcome = handle.tap(ScreenPoint::new(540.0, 960.0)).await?;
//! ```

mod config;
mod error;
mod handle;
mod map_session;
mod poller;

pub use config::{
    SessionConfig, DEFAULT_COMMAND_CHANNEL_CAPACITY, DEFAULT_POLL_INTERVAL_MS,
    MIN_POLL_INTERVAL_MS,
};
pub use error::SessionError;
pub use handle::{SessionCommand, SessionHandle, SessionSnapshot};
pub use map_session::MapSession;
pub use poller::{PollSchedule, TickAction};
