//! Turns a location search into the set of sensors to fetch.

use crate::api::source::{AirQualitySource, LocationQuery};
use crate::error::OpenAqError;
use crate::types::lat_lon::LatLon;
use crate::types::location::{Location, LocationId, SensorId};
use log::{info, warn};
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Metadata of the location a sensor belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMeta {
    pub location_id: Option<LocationId>,
    pub name: Option<String>,
    /// Country code, e.g. "TH".
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Haversine distance from the query origin. Absent without coordinates.
    pub distance_km: Option<f64>,
}

impl LocationMeta {
    fn from_location(location: &Location, origin: LatLon) -> Self {
        let latitude = location.coordinates.and_then(|c| c.latitude);
        let longitude = location.coordinates.and_then(|c| c.longitude);
        let distance_km = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(origin.distance_km(LatLon(lat, lon))),
            _ => None,
        };

        Self {
            location_id: location.id,
            name: location.name.clone(),
            country: location
                .country
                .as_ref()
                .and_then(|country| country.code.clone()),
            city: location.place_name().map(str::to_owned),
            latitude,
            longitude,
            distance_km,
        }
    }
}

/// Result of resolving a location search into sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorResolution {
    sensor_ids: Vec<SensorId>,
    locations: BTreeMap<SensorId, LocationMeta>,
    location_count: usize,
}

impl SensorResolution {
    /// Unique sensor ids in ascending order.
    pub fn sensor_ids(&self) -> &[SensorId] {
        &self.sensor_ids
    }

    /// Location metadata keyed by sensor id. Holds exactly the ids of
    /// [`SensorResolution::sensor_ids`].
    pub fn locations(&self) -> &BTreeMap<SensorId, LocationMeta> {
        &self.locations
    }

    /// Metadata of the location `sensor_id` was resolved from.
    pub fn location_of(&self, sensor_id: SensorId) -> Option<&LocationMeta> {
        self.locations.get(&sensor_id)
    }

    /// Whether `sensor_id` was resolved.
    pub fn contains(&self, sensor_id: SensorId) -> bool {
        self.locations.contains_key(&sensor_id)
    }

    /// Number of locations the search returned, with or without sensors.
    pub fn location_count(&self) -> usize {
        self.location_count
    }

    /// No sensor was resolved.
    pub fn is_empty(&self) -> bool {
        self.sensor_ids.is_empty()
    }
}

/// Collects every identified sensor of `locations`.
///
/// Sensor ids are deduplicated and sorted. A sensor listed under several
/// locations takes the metadata of the last one that lists it. Sensors without
/// an id are skipped.
pub fn resolve_locations(locations: &[Location], origin: LatLon) -> SensorResolution {
    let mut resolved: BTreeMap<SensorId, LocationMeta> = BTreeMap::new();

    for location in locations {
        let mut meta: Option<LocationMeta> = None;
        for sensor in &location.sensors {
            let Some(sensor_id) = sensor.id else {
                continue;
            };
            let meta = meta
                .get_or_insert_with(|| LocationMeta::from_location(location, origin))
                .clone();
            match resolved.entry(sensor_id) {
                Entry::Occupied(mut existing) => {
                    if existing.get().location_id != location.id {
                        warn!(
                            "Sensor {} listed under locations {:?} and {:?}; keeping the latter",
                            sensor_id,
                            existing.get().location_id,
                            location.id
                        );
                    }
                    existing.insert(meta);
                }
                Entry::Vacant(slot) => {
                    slot.insert(meta);
                }
            }
        }
    }

    SensorResolution {
        // BTreeMap keys are already unique and ascending.
        sensor_ids: resolved.keys().copied().collect(),
        locations: resolved,
        location_count: locations.len(),
    }
}

/// Runs the single location search for `query` and resolves its sensors.
///
/// # Errors
///
/// Any transport failure is fatal here and returned as [`OpenAqError::Resolve`].
pub async fn resolve_sensors<S: AirQualitySource>(
    source: &S,
    query: &LocationQuery,
) -> Result<SensorResolution, OpenAqError> {
    let locations = source
        .search_locations(query)
        .await
        .map_err(OpenAqError::Resolve)?;

    let resolution = resolve_locations(&locations, query.coordinates);
    if resolution.is_empty() {
        info!(
            "No sensor ids found in {} locations for parameter {}",
            resolution.location_count(),
            query.parameter_id
        );
    } else {
        info!(
            "Resolved {} sensors from {} locations: {:?}",
            resolution.sensor_ids().len(),
            resolution.location_count(),
            resolution.sensor_ids()
        );
    }
    Ok(resolution)
}
