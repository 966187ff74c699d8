// precland_sim/src/simulation/plugins/camera.rs

//! Synthetic down-looking camera frames.
//!
//! The target is a textured square lying on the ground. Its four corners go
//! through the shared projector, and the marker image is warped onto the
//! projected quadrilateral with a homography.

use crate::simulation::core::state::SimulatorState;
use crate::simulation::error::RenderError;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::rect::Rect;
use precland_core::models::camera::CameraModel;
use precland_core::types::{Attitude, Pose3};
use std::path::{Path, PathBuf};

/// Projected quadrilaterals smaller than this (in square pixels) cannot carry a homography.
const MIN_QUAD_AREA_PX: f64 = 1.0;

/// Side of the procedurally drawn marker image, pixels.
const MARKER_SIDE_PX: u32 = 240;

// --- Target Geometry ---

/// Ground corners of a square target centred on `center`, in marker-image order:
/// top-left, top-right, bottom-right, bottom-left with north up and east right.
pub fn target_corners(center: &Pose3, size_m: f64) -> [Pose3; 4] {
    let h = size_m / 2.0;
    let (n, e, u) = (center.x(), center.y(), center.z());
    [
        Pose3::new(n + h, e - h, u),
        Pose3::new(n + h, e + h, u),
        Pose3::new(n - h, e + h, u),
        Pose3::new(n - h, e - h, u),
    ]
}

/// `(north, east, up)` -> the projector's depth convention, where a down-looking
/// camera sees points below it at positive depth.
fn to_projector(pose: &Pose3) -> Pose3 {
    Pose3::new(pose.x(), pose.y(), -pose.z())
}

fn quad_area(points: &[(f64, f64); 4]) -> f64 {
    let mut twice_area = 0.0;
    for i in 0..4 {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % 4];
        twice_area += x0 * y1 - x1 * y0;
    }
    (twice_area / 2.0).abs()
}

// =========================================================================
// == Rendering ==
// =========================================================================

/// Renders the target, as seen from `camera_pose` with `attitude`, onto a
/// background-filled canvas the size of `camera`'s raster.
pub fn render_frame(
    camera: &CameraModel,
    corners: &[Pose3; 4],
    camera_pose: &Pose3,
    attitude: &Attitude,
    appearance: &RgbImage,
    background: Rgb<u8>,
) -> Result<RgbImage, RenderError> {
    let eye = to_projector(camera_pose);
    let mut projected = [(0.0, 0.0); 4];
    for (slot, corner) in projected.iter_mut().zip(corners.iter()) {
        *slot = camera.project_to_pixel(attitude, &to_projector(corner), &eye)?;
    }
    if quad_area(&projected) < MIN_QUAD_AREA_PX {
        return Err(RenderError::DegenerateHomography);
    }

    let (w, h) = (appearance.width() as f32, appearance.height() as f32);
    let from = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let to = projected.map(|(x, y)| (x as f32, y as f32));
    let projection =
        Projection::from_control_points(from, to).ok_or(RenderError::DegenerateHomography)?;

    let mut canvas = RgbImage::from_pixel(camera.width, camera.height, background);
    warp_into(appearance, &projection, Interpolation::Bilinear, background, &mut canvas);
    Ok(canvas)
}

/// Renders the current simulator state.
pub fn render_state(
    camera: &CameraModel,
    state: &SimulatorState,
    target_size_m: f64,
    appearance: &RgbImage,
    background: Rgb<u8>,
) -> Result<RgbImage, RenderError> {
    let corners = target_corners(&state.target, target_size_m);
    render_frame(
        camera,
        &corners,
        &state.vehicle,
        &state.attitude,
        appearance,
        background,
    )
}

// =========================================================================
// == Appearance ==
// =========================================================================

/// A simple fiducial: white field, black frame and a black centre square.
pub fn procedural_marker() -> RgbImage {
    let side = MARKER_SIDE_PX;
    let border = side / 8;
    let mut marker = RgbImage::from_pixel(side, side, Rgb([0, 0, 0]));
    draw_filled_rect_mut(
        &mut marker,
        Rect::at(border as i32, border as i32).of_size(side - 2 * border, side - 2 * border),
        Rgb([255, 255, 255]),
    );
    let inner = side / 3;
    draw_filled_rect_mut(
        &mut marker,
        Rect::at(inner as i32, inner as i32).of_size(side - 2 * inner, side - 2 * inner),
        Rgb([0, 0, 0]),
    );
    marker
}

/// The marker image at `path`, or the procedural marker when no path is given.
pub fn load_appearance(path: Option<&Path>) -> Result<RgbImage, RenderError> {
    match path {
        Some(path) => Ok(image::open(path)?.to_rgb8()),
        None => Ok(procedural_marker()),
    }
}

/// Writes `frame` as `frame_NNNNN.png` under `dir`.
pub fn save_frame(frame: &RgbImage, dir: &Path, index: usize) -> Result<PathBuf, RenderError> {
    let path = dir.join(format!("frame_{index:05}.png"));
    frame.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use precland_core::error::ProjectionError;

    const BACKGROUND: Rgb<u8> = Rgb([74, 88, 109]);

    #[test]
    fn test_overhead_frame_centres_the_marker() {
        let camera = CameraModel::default();
        let corners = target_corners(&Pose3::new(0.0, 0.0, 0.0), 4.0);
        let frame = render_frame(
            &camera,
            &corners,
            &Pose3::new(0.0, 0.0, 10.0),
            &Attitude::level(),
            &procedural_marker(),
            BACKGROUND,
        )
        .unwrap();

        assert_eq!(frame.dimensions(), (640, 480));
        assert_eq!(*frame.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*frame.get_pixel(639, 479), BACKGROUND);
        assert_eq!(*frame.get_pixel(320, 240), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_target_at_camera_height_fails_to_project() {
        let corners = target_corners(&Pose3::new(0.0, 0.0, 0.0), 1.5);
        let result = render_frame(
            &CameraModel::default(),
            &corners,
            &Pose3::new(0.0, 0.0, 0.0),
            &Attitude::level(),
            &procedural_marker(),
            BACKGROUND,
        );
        assert!(matches!(
            result,
            Err(RenderError::Projection(ProjectionError::BehindCamera { .. }))
        ));
    }

    #[test]
    fn test_zero_size_target_is_degenerate() {
        let corners = target_corners(&Pose3::new(0.0, 0.0, 0.0), 0.0);
        let result = render_frame(
            &CameraModel::default(),
            &corners,
            &Pose3::new(0.0, 0.0, 10.0),
            &Attitude::level(),
            &procedural_marker(),
            BACKGROUND,
        );
        assert!(matches!(result, Err(RenderError::DegenerateHomography)));
    }

    #[test]
    fn test_procedural_marker_layout() {
        let marker = procedural_marker();
        assert_eq!(*marker.get_pixel(2, 2), Rgb([0, 0, 0]));
        assert_eq!(*marker.get_pixel(50, 50), Rgb([255, 255, 255]));
        assert_eq!(*marker.get_pixel(120, 120), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_quad_area() {
        let square = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert_eq!(quad_area(&square), 4.0);
    }
}
