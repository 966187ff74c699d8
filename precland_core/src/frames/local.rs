// precland_core/src/frames/local.rs
use crate::error::FrameError;
use crate::frames::{geo_point_to_offset, offset_to_geo_point};
use crate::types::GeoPoint;
use nalgebra::Vector3;

/// A home-anchored local tangent plane.
///
/// Positions are `(north, east, up)` in metres, with `up` taken straight from
/// the point's altitude. This is the frame the simulator keeps vehicle and
/// target poses in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    home: GeoPoint,
}

impl LocalFrame {
    /// Anchors a frame at `home`. Fails if `home` cannot anchor a tangent plane.
    pub fn new(home: GeoPoint) -> Result<Self, FrameError> {
        // Check the forward transform once so a pole or NaN home fails here.
        offset_to_geo_point(&home, 0.0, 0.0)?;
        Ok(Self { home })
    }

    pub fn home(&self) -> &GeoPoint {
        &self.home
    }

    /// Geodetic point -> `(north, east, up)`.
    pub fn to_local(&self, point: &GeoPoint) -> Result<Vector3<f64>, FrameError> {
        let offset = geo_point_to_offset(&self.home, point)?;
        Ok(Vector3::new(offset.north_m, offset.east_m, point.alt_m()))
    }

    /// `(north, east, up)` -> geodetic point with the home's altitude reference.
    pub fn to_geo(&self, local: &Vector3<f64>) -> Result<GeoPoint, FrameError> {
        let p = offset_to_geo_point(&self.home, local.x, local.y)?;
        Ok(p.with_altitude(local.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_local_round_trip() {
        let frame = LocalFrame::new(GeoPoint::relative(-35.363261, 149.165230, 0.0)).unwrap();
        let v = Vector3::new(12.5, -3.25, 10.0);
        let geo = frame.to_geo(&v).unwrap();
        assert_eq!(geo.alt_m(), 10.0);
        let back = frame.to_local(&geo).unwrap();
        assert_abs_diff_eq!(back.x, v.x, epsilon = 1e-6);
        assert_abs_diff_eq!(back.y, v.y, epsilon = 1e-6);
        assert_abs_diff_eq!(back.z, v.z, epsilon = 1e-12);
    }

    #[test]
    fn test_pole_home_is_rejected() {
        assert!(LocalFrame::new(GeoPoint::relative(-90.0, 0.0, 0.0)).is_err());
    }
}
