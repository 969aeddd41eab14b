use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64`.
///
/// # Examples
///
/// ```
/// use openaq::LatLon;
///
/// let chiang_mai_university = LatLon(18.808233, 98.954696);
/// assert_eq!(chiang_mai_university.0, 18.808233); // Latitude
/// assert_eq!(chiang_mai_university.to_string(), "18.808233,98.954696");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LatLonRepr")]
pub struct LatLon(pub f64, pub f64);

/// Accepted configuration forms: `"lat,lon"` or `[lat, lon]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LatLonRepr {
    Text(String),
    Pair(f64, f64),
}

impl TryFrom<LatLonRepr> for LatLon {
    type Error = String;

    fn try_from(repr: LatLonRepr) -> Result<Self, Self::Error> {
        match repr {
            LatLonRepr::Text(text) => text.parse(),
            LatLonRepr::Pair(lat, lon) => Ok(LatLon(lat, lon)),
        }
    }
}

impl FromStr for LatLon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'lat,lon', got '{s}'"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| format!("invalid latitude '{}': {e}", lat.trim()))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|e| format!("invalid longitude '{}': {e}", lon.trim()))?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(format!("coordinate out of range: {lat},{lon}"));
        }
        Ok(LatLon(lat, lon))
    }
}

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Great-circle distance to another coordinate in kilometers.
    pub fn distance_km(&self, other: LatLon) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.0,
                longitude: self.1,
            },
            haversine::Location {
                latitude: other.0,
                longitude: other.1,
            },
            haversine::Units::Kilometers,
        )
    }
}

/// Formats as the `lat,lon` pair the locations endpoint expects.
impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}
