pub mod flat_row;
pub mod lat_lon;
pub mod location;
pub mod measurement;
