// precland_core/src/controllers/search.rs

use crate::error::FrameError;
use crate::frames::{geo_point_to_offset, offset_to_geo_point};
use crate::types::GeoPoint;

/// A waypoint closer than this counts as visited.
pub const SEARCH_ARRIVAL_RADIUS_M: f64 = 1.0;

/// Square search pattern flown while no marker has been seen yet.
///
/// Four corners of a square with half-side `half_size_m` around `center`,
/// visited in the order (+N, -E), (+N, +E), (-N, +E), (-N, -E) and then looped.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareSearch {
    corners: [GeoPoint; 4],
    next: usize,
}

impl SquareSearch {
    pub fn new(center: &GeoPoint, half_size_m: f64) -> Result<Self, FrameError> {
        let s = half_size_m;
        let corners = [
            offset_to_geo_point(center, s, -s)?,
            offset_to_geo_point(center, s, s)?,
            offset_to_geo_point(center, -s, s)?,
            offset_to_geo_point(center, -s, -s)?,
        ];
        Ok(Self { corners, next: 0 })
    }

    pub fn corners(&self) -> &[GeoPoint; 4] {
        &self.corners
    }

    /// Index of the corner currently being flown to.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// The corner to fly to from `location`, at `location`'s altitude.
    /// Steps on to the following corner once the current one is reached.
    pub fn target(&mut self, location: &GeoPoint) -> Result<GeoPoint, FrameError> {
        let remaining = geo_point_to_offset(location, &self.corners[self.next])?;
        if remaining.norm() <= SEARCH_ARRIVAL_RADIUS_M {
            self.next = (self.next + 1) % self.corners.len();
        }
        Ok(self.corners[self.next].with_altitude(location.alt_m()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn center() -> GeoPoint {
        GeoPoint::relative(47.397742, 8.545594, 0.0)
    }

    #[test]
    fn test_corners_form_a_square() {
        let search = SquareSearch::new(&center(), 10.0).unwrap();
        let expected = [(10.0, -10.0), (10.0, 10.0), (-10.0, 10.0), (-10.0, -10.0)];
        for (corner, (north, east)) in search.corners().iter().zip(expected) {
            let offset = geo_point_to_offset(&center(), corner).unwrap();
            assert_abs_diff_eq!(offset.north_m, north, epsilon = 1e-3);
            assert_abs_diff_eq!(offset.east_m, east, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_target_advances_on_arrival_and_loops() {
        let mut search = SquareSearch::new(&center(), 10.0).unwrap();
        let here = center().with_altitude(15.0);
        let first = search.target(&here).unwrap();
        assert_eq!(search.next_index(), 0);
        assert_eq!(first.alt_m(), 15.0);

        for expected in [1, 2, 3, 0] {
            let at_corner = search.corners()[search.next_index()].with_altitude(15.0);
            search.target(&at_corner).unwrap();
            assert_eq!(search.next_index(), expected);
        }
    }
}
