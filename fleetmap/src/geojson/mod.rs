//! GeoJSON codec for marker data.
//!
//! Three documents share the same shape:
//!
//! - the bundled snapshot read once at startup to seed the store
//! - the export written after every successful fetch (`properties: {id}`)
//! - the render source handed to map SDKs (`id`, `name`, `selected`)
//!
//! # Example
//!
//! ```ignore
//! use fleetmap::geojson;
//!
//! let store = geojson::load_snapshot("assets/trucks.geojson")?;
//! let document = geojson::from_entities(store.entities());
//! ```

mod types;

pub use types::{
    CollectionType, Feature, FeatureCollection, FeatureProperties, FeatureType, Geometry,
};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geo::{GeoError, LatLon};
use crate::store::{EntityId, FeatureStore, PositionRecord, TrackedEntity};

/// Errors reading GeoJSON documents.
#[derive(Debug, Error)]
pub enum GeoJsonError {
    /// The document is not a valid point FeatureCollection.
    #[error("Invalid GeoJSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A feature carries coordinates outside the valid range.
    #[error("Feature {id} has invalid coordinates: {source}")]
    InvalidCoordinates { id: EntityId, source: GeoError },

    /// The document could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse a FeatureCollection from raw bytes.
pub fn parse_collection(bytes: &[u8]) -> Result<FeatureCollection, GeoJsonError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn point_feature(properties: FeatureProperties, position: LatLon) -> Feature {
    Feature {
        kind: FeatureType::Feature,
        geometry: Geometry::Point {
            coordinates: position.to_position(),
        },
        properties,
    }
}

/// Export document for a fetch: one point per record, `properties: {id}`.
pub fn from_records(records: &[PositionRecord]) -> FeatureCollection {
    let features = records
        .iter()
        .map(|record| {
            point_feature(
                FeatureProperties {
                    id: record.id.clone(),
                    name: None,
                    selected: None,
                },
                record.position,
            )
        })
        .collect();

    FeatureCollection::new(features)
}

/// Render source for the current store contents, including `selected`.
pub fn from_entities(entities: &[TrackedEntity]) -> FeatureCollection {
    let features = entities
        .iter()
        .map(|entity| {
            point_feature(
                FeatureProperties {
                    id: entity.id.clone(),
                    name: entity.name.clone(),
                    selected: Some(entity.selected),
                },
                entity.position,
            )
        })
        .collect();

    FeatureCollection::new(features)
}

/// Convert features into unselected entities, validating coordinates.
pub fn to_entities(collection: &FeatureCollection) -> Result<Vec<TrackedEntity>, GeoJsonError> {
    collection
        .features
        .iter()
        .map(|feature| {
            let Geometry::Point { coordinates } = feature.geometry;
            let id = feature.properties.id.clone();
            let position = LatLon::from_position(coordinates)
                .map_err(|source| GeoJsonError::InvalidCoordinates {
                    id: id.clone(),
                    source,
                })?;

            let mut entity = TrackedEntity::new(id, position);
            entity.name = feature.properties.name.clone();
            Ok(entity)
        })
        .collect()
}

/// Read the bundled snapshot and build the initial store.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<FeatureStore, GeoJsonError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| GeoJsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let collection = parse_collection(&bytes)?;
    Ok(FeatureStore::from_entities(to_entities(&collection)?))
}
