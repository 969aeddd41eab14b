//! Typed projections of the OpenAQ `/locations` response.
//!
//! Only the fields the sensor resolution needs are modelled; everything else in
//! the upstream payload (owner, provider, instruments, bounds, ...) is ignored
//! during deserialization. Nearly every field is optional because the API omits
//! them freely for community-run monitors.

use crate::types::measurement::ParameterDescriptor;
use serde::{Deserialize, Serialize};

/// Upstream sensor identifier.
pub type SensorId = u64;

/// Upstream location identifier.
pub type LocationId = u64;

/// The `{ "meta": ..., "results": [...] }` envelope shared by every v3 endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A monitoring location returned by the location search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Option<LocationId>,
    pub name: Option<String>,
    /// Locality of the station.
    pub locality: Option<String>,
    /// Older payloads carry `city` instead of, or next to, `locality`.
    pub city: Option<String>,
    pub timezone: Option<String>,
    pub country: Option<Country>,
    pub coordinates: Option<Coordinates>,
    /// Distance in meters from the queried coordinate, when the search was radial.
    pub distance: Option<f64>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
}

/// Country block of a [`Location`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: Option<u64>,
    /// ISO 3166-1 alpha-2 code (e.g. "TH").
    pub code: Option<String>,
    pub name: Option<String>,
}

/// Coordinates block of a [`Location`]. Either component may be missing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A sensor attached to a [`Location`]. Sensors without an `id` cannot be
/// queried and are skipped by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    pub id: Option<SensorId>,
    pub name: Option<String>,
    pub parameter: Option<ParameterDescriptor>,
}

impl Location {
    /// `locality`, falling back to the legacy `city` field.
    pub fn place_name(&self) -> Option<&str> {
        self.locality.as_deref().or(self.city.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_location() -> Result<(), serde_json::Error> {
        let payload = json!({
            "meta": { "name": "openaq-api", "page": 1, "limit": 1, "found": 3 },
            "results": [{
                "id": 225589,
                "name": "Chiang Mai University",
                "locality": "Chiang Mai",
                "timezone": "Asia/Bangkok",
                "country": { "id": 111, "code": "TH", "name": "Thailand" },
                "owner": { "id": 4, "name": "Unknown Governmental Organization" },
                "isMobile": false,
                "sensors": [
                    { "id": 101, "name": "pm25 µg/m³",
                      "parameter": { "id": 2, "name": "pm25", "units": "µg/m³", "displayName": "PM2.5" } },
                    { "id": 102, "name": "pm10 µg/m³" }
                ],
                "coordinates": { "latitude": 18.80, "longitude": 98.95 },
                "distance": 812.4
            }]
        });

        let page: ApiPage<Location> = serde_json::from_value(payload)?;
        assert_eq!(page.results.len(), 1);
        let location = &page.results[0];
        assert_eq!(location.id, Some(225589));
        assert_eq!(location.place_name(), Some("Chiang Mai"));
        assert_eq!(
            location.country.as_ref().and_then(|c| c.code.as_deref()),
            Some("TH")
        );
        assert_eq!(location.sensors.len(), 2);
        assert_eq!(location.sensors[1].id, Some(102));
        assert!(location.sensors[1].parameter.is_none());
        Ok(())
    }

    #[test]
    fn test_deserialize_sparse_location() -> Result<(), serde_json::Error> {
        let location: Location = serde_json::from_value(json!({
            "id": 7,
            "city": "Lamphun",
            "coordinates": null
        }))?;

        assert_eq!(location.locality, None);
        assert_eq!(location.place_name(), Some("Lamphun"));
        assert!(location.coordinates.is_none());
        assert!(location.sensors.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_results_is_empty_page() -> Result<(), serde_json::Error> {
        let page: ApiPage<Location> = serde_json::from_value(json!({ "meta": {} }))?;
        assert!(page.results.is_empty());
        Ok(())
    }

    #[test]
    fn test_locality_and_city_together() -> Result<(), serde_json::Error> {
        let location: Location = serde_json::from_value(json!({
            "id": 8,
            "locality": "Mueang Chiang Mai",
            "city": "Chiang Mai",
            "sensors": [{ "id": 5 }]
        }))?;

        assert_eq!(location.place_name(), Some("Mueang Chiang Mai"));
        assert_eq!(location.city.as_deref(), Some("Chiang Mai"));
        assert_eq!(location.sensors.len(), 1);
        Ok(())
    }
}
