// precland_core/src/models/camera.rs

use crate::error::ProjectionError;
use crate::types::{Attitude, Pose3};
use serde::{Deserialize, Serialize};

/// The simulated camera: raster size, field of view and frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CameraModel {
    pub width: u32,
    pub height: u32,
    pub vfov_deg: f64,
    pub hfov_deg: f64,
    /// Frames per second delivered to the caller.
    pub frame_rate: f64,
}

impl Default for CameraModel {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            vfov_deg: 60.0,
            hfov_deg: 60.0,
            frame_rate: 30.0,
        }
    }
}

impl CameraModel {
    /// The single (diagonal) field of view the projector divides by.
    pub fn fov_deg(&self) -> f64 {
        self.vfov_deg.hypot(self.hfov_deg)
    }

    /// Projects `target` as seen from `camera` and recentres it onto the raster.
    pub fn project_to_pixel(
        &self,
        attitude: &Attitude,
        target: &Pose3,
        camera: &Pose3,
    ) -> Result<(f64, f64), ProjectionError> {
        let pt = project_point(
            attitude,
            target,
            camera,
            self.height as f64,
            self.width as f64,
            self.fov_deg(),
        )?;
        Ok(shift_to_image(pt, self.width as f64, self.height as f64))
    }

    /// Inverse of [`CameraModel::project_to_pixel`] for a level camera (roll = pitch = 0).
    ///
    /// Returns the `(x, y)` displacement of the imaged point from the camera in
    /// world axes, given the depth along the optical axis.
    pub fn unproject_level(
        &self,
        pixel: (f64, f64),
        depth: f64,
        yaw: f64,
    ) -> Result<(f64, f64), ProjectionError> {
        if !(depth > 0.0) {
            return Err(ProjectionError::BehindCamera { depth });
        }
        let (w, h) = (self.width as f64, self.height as f64);
        let e_z = focal_distance(self.fov_deg());

        let s_x = pixel.0 - w / 2.0;
        let s_y = h / 2.0 - pixel.1;
        let d_x = s_x / w * depth / e_z;
        let d_y = s_y / h * depth / e_z;

        // Undo the yaw-only rotation; the projector works on camera-minus-target.
        let (s, c) = (-yaw).sin_cos();
        let delta_x = c * d_x - s * d_y;
        let delta_y = s * d_x + c * d_y;
        Ok((-delta_x, -delta_y))
    }
}

/// Virtual focal distance for a field of view in degrees.
fn focal_distance(fov_deg: f64) -> f64 {
    1.0 / (fov_deg.to_radians() / 2.0).tan()
}

/// Maps `target` into image-plane coordinates for a camera at `camera`.
///
/// The rotation is this simulator's own composition (yaw, then roll, then pitch,
/// each negated to go from world to camera), with `θx = pitch`, `θy = roll`,
/// `θz = yaw`. Note the planar terms use camera-minus-target while the depth
/// term uses target-minus-camera. The result is centred on the optical axis;
/// see [`shift_to_image`] for raster coordinates.
///
/// Fails with [`ProjectionError::BehindCamera`] when the rotated depth is not
/// strictly positive.
pub fn project_point(
    attitude: &Attitude,
    target: &Pose3,
    camera: &Pose3,
    image_height: f64,
    image_width: f64,
    fov_deg: f64,
) -> Result<(f64, f64), ProjectionError> {
    let (tx, ty, tz) = (-attitude.pitch, -attitude.roll, -attitude.yaw);
    let (a_x, a_y, a_z) = (target.x(), target.y(), target.z());
    let (c_x, c_y, c_z) = (camera.x(), camera.y(), camera.z());

    let (sin_x, cos_x) = tx.sin_cos();
    let (sin_y, cos_y) = ty.sin_cos();
    let (sin_z, cos_z) = tz.sin_cos();

    // --- Rotate the camera->target vector into the camera frame ---
    let yaw_x = sin_z * (c_y - a_y) + cos_z * (c_x - a_x);
    let yaw_y = cos_z * (c_y - a_y) - sin_z * (c_x - a_x);
    let roll_z = cos_y * (a_z - c_z) + sin_y * yaw_x;

    let d_x = cos_y * yaw_x - sin_y * (a_z - c_z);
    let d_y = sin_x * roll_z + cos_x * yaw_y;
    let d_z = cos_x * roll_z - sin_x * yaw_y;

    if !(d_z > 0.0) || !d_z.is_finite() {
        return Err(ProjectionError::BehindCamera { depth: d_z });
    }

    // --- Perspective divide onto the virtual image plane at eZ ---
    let e_z = focal_distance(fov_deg);
    let b_x = d_x * (e_z / d_z);
    let b_y = d_y * (e_z / d_z);

    Ok((b_x * image_width, b_y * image_height))
}

/// Moves an optical-axis-centred point onto raster coordinates (origin top-left, y down).
pub fn shift_to_image(pt: (f64, f64), width: f64, height: f64) -> (f64, f64) {
    (pt.0 + width / 2.0, -pt.1 + height / 2.0)
}
