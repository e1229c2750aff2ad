//! Feature store: the live set of entities behind the map.
//!
//! The store is an ordered sequence (render order) keyed by [`EntityId`]
//! for merging. It is owned by a single session task, so it carries no
//! locking of its own.
//!
//! # Merge policy
//!
//! Each refresh reconciles by id:
//!
//! - known id: coordinates updated, `selected` and `name` carried over
//! - new id: inserted unselected
//! - id missing from the fetch: removed
//!
//! The resulting order is the order of the latest fetch.

mod entity;

pub use entity::{EntityId, PositionRecord, TrackedEntity};

use std::collections::HashMap;
use std::fmt;
use std::mem;

use tracing::warn;

/// Counts describing what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Entities that were not in the store before.
    pub added: usize,
    /// Entities that were already present (coordinates refreshed).
    pub updated: usize,
    /// Subset of `updated` whose coordinates actually changed.
    pub moved: usize,
    /// Entities dropped because the fetch no longer lists them.
    pub removed: usize,
    /// Records ignored because their id appeared earlier in the same fetch.
    pub duplicates: usize,
}

impl fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+{} ~{} ({} moved) -{}",
            self.added, self.updated, self.moved, self.removed
        )
    }
}

/// Ordered, id-keyed collection of tracked entities.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    entities: Vec<TrackedEntity>,
    index: HashMap<EntityId, usize>,
}

impl FeatureStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from entities in render order.
    ///
    /// The first entity for each id wins; `selected` is reset to false.
    pub fn from_entities(entities: impl IntoIterator<Item = TrackedEntity>) -> Self {
        let mut store = Self::new();
        for mut entity in entities {
            if store.index.contains_key(&entity.id) {
                warn!(id = %entity.id, "Duplicate entity id in snapshot, ignoring");
                continue;
            }
            entity.selected = false;
            store.index.insert(entity.id.clone(), store.entities.len());
            store.entities.push(entity);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in render order.
    pub fn entities(&self) -> &[TrackedEntity] {
        &self.entities
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter()
    }

    pub fn get(&self, id: &str) -> Option<&TrackedEntity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Ids of all selected entities, in render order.
    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| e.selected)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Reconcile freshly fetched records into the store.
    pub fn merge(&mut self, records: &[PositionRecord]) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let mut previous: Vec<Option<TrackedEntity>> =
            mem::take(&mut self.entities).into_iter().map(Some).collect();
        let previous_index = mem::take(&mut self.index);

        let mut next = Vec::with_capacity(records.len());
        let mut next_index = HashMap::with_capacity(records.len());

        for record in records {
            if next_index.contains_key(&record.id) {
                summary.duplicates += 1;
                continue;
            }

            let carried = previous_index
                .get(&record.id)
                .and_then(|&i| previous[i].take());

            let entity = match carried {
                Some(mut entity) => {
                    summary.updated += 1;
                    if entity.position != record.position {
                        summary.moved += 1;
                        entity.position = record.position;
                    }
                    entity
                }
                None => {
                    summary.added += 1;
                    TrackedEntity::new(record.id.clone(), record.position)
                }
            };

            next_index.insert(entity.id.clone(), next.len());
            next.push(entity);
        }

        summary.removed = previous.iter().filter(|slot| slot.is_some()).count();
        if summary.duplicates > 0 {
            warn!(
                duplicates = summary.duplicates,
                "Fetch contained duplicate ids, kept first occurrence"
            );
        }

        self.entities = next;
        self.index = next_index;
        summary
    }

    /// Flip an entity's selected flag. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let &i = self.index.get(id)?;
        let entity = &mut self.entities[i];
        entity.selected = !entity.selected;
        Some(entity.selected)
    }

    /// Deselect every entity except `keep`. Returns how many changed.
    pub fn deselect_all_except(&mut self, keep: &str) -> usize {
        let mut changed = 0;
        for entity in self.entities.iter_mut() {
            if entity.selected && entity.id.as_str() != keep {
                entity.selected = false;
                changed += 1;
            }
        }
        changed
    }
}
