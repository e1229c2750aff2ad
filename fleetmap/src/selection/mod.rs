//! Tap handling for marker selection.
//!
//! Each entity has two states, selected and unselected, and the only
//! transition is a tap that hits its marker. A tap that hits nothing
//! changes nothing.
//!
//! Hit testing projects each marker anchor with the current [`Viewport`]
//! and checks the tap against the marker's icon box. Markers later in draw
//! order sit on top, so they are tested first.

use std::fmt;
use std::str::FromStr;

use crate::geo::{ScreenPoint, Viewport};
use crate::store::{EntityId, FeatureStore, TrackedEntity};

/// How a hit changes the other selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Each marker toggles independently.
    #[default]
    Multiple,
    /// Selecting a marker deselects every other marker first.
    Single,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Multiple => "multiple",
            SelectionMode::Single => "single",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiple" | "multi" => Ok(SelectionMode::Multiple),
            "single" => Ok(SelectionMode::Single),
            other => Err(format!(
                "unknown selection mode '{}' (expected multiple or single)",
                other
            )),
        }
    }
}

/// Default marker icon width in pixels.
pub const DEFAULT_MARKER_WIDTH: f64 = 32.0;

/// Default marker icon height in pixels.
pub const DEFAULT_MARKER_HEIGHT: f64 = 32.0;

/// Default vertical icon offset: the pin is drawn 8px above its anchor.
pub const DEFAULT_MARKER_OFFSET_Y: f64 = -8.0;

/// Screen-space box of a marker icon relative to its projected anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerHitBox {
    pub width: f64,
    pub height: f64,
    /// Horizontal offset of the icon center from the anchor.
    pub offset_x: f64,
    /// Vertical offset of the icon center from the anchor.
    pub offset_y: f64,
}

impl Default for MarkerHitBox {
    fn default() -> Self {
        Self {
            width: DEFAULT_MARKER_WIDTH,
            height: DEFAULT_MARKER_HEIGHT,
            offset_x: 0.0,
            offset_y: DEFAULT_MARKER_OFFSET_Y,
        }
    }
}

impl MarkerHitBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset_x: f64, offset_y: f64) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    /// Whether `tap` falls inside the icon drawn at `anchor`.
    pub fn contains(&self, anchor: ScreenPoint, tap: ScreenPoint) -> bool {
        let center = anchor.offset(self.offset_x, self.offset_y);
        (tap.x - center.x).abs() <= self.width / 2.0
            && (tap.y - center.y).abs() <= self.height / 2.0
    }
}

/// Result of a tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// A marker was hit; `selected` is its state after the toggle.
    Hit { id: EntityId, selected: bool },
    /// No marker under the tap; nothing changed.
    Miss,
}

impl TapOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, TapOutcome::Hit { .. })
    }
}

/// Resolves taps to markers and toggles their selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionController {
    mode: SelectionMode,
    hit_box: MarkerHitBox,
}

impl SelectionController {
    pub fn new(mode: SelectionMode, hit_box: MarkerHitBox) -> Self {
        Self { mode, hit_box }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn hit_box(&self) -> &MarkerHitBox {
        &self.hit_box
    }

    /// Topmost marker under `point`, if any.
    pub fn hit_test<'a>(
        &self,
        store: &'a FeatureStore,
        viewport: &Viewport,
        point: ScreenPoint,
    ) -> Option<&'a TrackedEntity> {
        store
            .entities()
            .iter()
            .rev()
            .find(|entity| self.hit_box.contains(viewport.project(entity.position), point))
    }

    /// Apply a tap: toggle the hit marker, or do nothing on a miss.
    pub fn tap(
        &self,
        store: &mut FeatureStore,
        viewport: &Viewport,
        point: ScreenPoint,
    ) -> TapOutcome {
        let Some(id) = self
            .hit_test(store, viewport, point)
            .map(|entity| entity.id.clone())
        else {
            return TapOutcome::Miss;
        };

        let selected = match store.toggle(id.as_str()) {
            Some(selected) => selected,
            None => return TapOutcome::Miss,
        };

        if selected && self.mode == SelectionMode::Single {
            store.deselect_all_except(id.as_str());
        }

        TapOutcome::Hit { id, selected }
    }
}
