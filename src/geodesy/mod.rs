mod coordinate;
mod error;

pub use coordinate::Coordinate;
pub use error::GeodesyError;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in metres between two coordinates (haversine).
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat_rad();
    let phi2 = b.lat_rad();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}
