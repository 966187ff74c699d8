// precland_core/src/frames.rs

//! Conversions between "metres from here" and absolute geodetic coordinates.
//!
//! These are small-angle approximations on a spherical Earth. They are accurate
//! to roughly 10 m within 1 km and degrade over longer distances and close to the
//! poles. Callers working beyond a few kilometres accept first-order error growth.

pub mod local;

use crate::error::FrameError;
use crate::types::{GeoPoint, LocalOffset};

/// Radius of the "spherical" Earth in metres.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Degrees of latitude/longitude to metres, used by the planar distance approximation.
pub const DEGREES_TO_METRES: f64 = 1.113195e5;

/// Returns the point `north` and `east` metres from `reference`.
///
/// The altitude and its reference are carried through verbatim; the conversion is 2D.
pub fn offset_to_geo_point(
    reference: &GeoPoint,
    north: f64,
    east: f64,
) -> Result<GeoPoint, FrameError> {
    let cos_lat = check_anchor(reference)?;

    // Coordinate offsets in radians
    let d_lat = north / EARTH_RADIUS_M;
    let d_lon = east / (EARTH_RADIUS_M * cos_lat);

    Ok(GeoPoint::new(
        reference.lat_deg() + d_lat.to_degrees(),
        reference.lon_deg() + d_lon.to_degrees(),
        reference.alt_m(),
        reference.reference(),
    ))
}

/// Inverse of [`offset_to_geo_point`]: the north/east offset of `point` from `origin`.
///
/// The east scale uses the origin's latitude, exactly like the forward transform.
pub fn geo_point_to_offset(origin: &GeoPoint, point: &GeoPoint) -> Result<LocalOffset, FrameError> {
    if origin.reference() != point.reference() {
        return Err(FrameError::ReferenceMismatch {
            expected: origin.reference(),
            found: point.reference(),
        });
    }
    let cos_lat = check_anchor(origin)?;
    if !point.is_finite() {
        return Err(FrameError::InvalidFrame(format!("non-finite point {point}")));
    }

    let d_lat = (point.lat_deg() - origin.lat_deg()).to_radians();
    let d_lon = (point.lon_deg() - origin.lon_deg()).to_radians();

    Ok(LocalOffset::new(
        d_lat * EARTH_RADIUS_M,
        d_lon * EARTH_RADIUS_M * cos_lat,
    ))
}

/// Ground distance in metres between two points, planar approximation.
///
/// Only valid for small separations.
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = b.lat_deg() - a.lat_deg();
    let d_lon = b.lon_deg() - a.lon_deg();
    d_lat.hypot(d_lon) * DEGREES_TO_METRES
}

/// Bearing from `a` to `b` in degrees clockwise from north, in `[0, 360)`.
///
/// For `a == b` the bearing is meaningless; the function still returns a finite
/// value (90.0, since `atan2(0, 0) == 0`) rather than NaN.
pub fn bearing_degrees(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let off_x = b.lon_deg() - a.lon_deg();
    let off_y = b.lat_deg() - a.lat_deg();
    let bearing = 90.0 + (-off_y).atan2(off_x).to_degrees();
    let normalized = bearing.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Validates that `reference` can anchor a tangent plane and returns `cos(lat)`.
fn check_anchor(reference: &GeoPoint) -> Result<f64, FrameError> {
    if !reference.is_finite() {
        return Err(FrameError::InvalidFrame(format!(
            "non-finite reference point {reference}"
        )));
    }
    let cos_lat = reference.lat_deg().to_radians().cos();
    if cos_lat.abs() < f64::EPSILON {
        return Err(FrameError::InvalidFrame(format!(
            "reference point {reference} is on a pole"
        )));
    }
    Ok(cos_lat)
}
