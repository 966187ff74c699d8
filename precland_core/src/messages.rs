// precland_core/src/messages.rs

//! Vehicle commands as MAVLink messages.
//!
//! The wire layout is owned by the `mavlink` crate's `common` dialect; this module
//! only picks frames, type masks and values. Target system and component are
//! always 0 and `time_boot_ms` is unused.

use crate::error::{CommandError, FrameError};
use crate::types::{AltitudeReference, GeoPoint};
use mavlink::common::{
    MavCmd, MavFrame, MavMessage, PositionTargetTypemask, COMMAND_LONG_DATA,
    SET_POSITION_TARGET_GLOBAL_INT_DATA, SET_POSITION_TARGET_LOCAL_NED_DATA,
};
use nalgebra::Vector3;
use std::time::Duration;

/// Type mask enabling only the position fields (0 = use, 1 = ignore).
pub const POSITION_ONLY_MASK: u16 = 0b0000_1111_1111_1000;
/// Type mask enabling only the velocity fields.
pub const VELOCITY_ONLY_MASK: u16 = 0b0000_1111_1100_0111;

/// Velocity messages are re-sent at this rate while a command is active.
pub const RESEND_INTERVAL: Duration = Duration::from_millis(100);

/// Servo channel and PWM that engage the electro-permanent magnet.
const EPM_SERVO_CHANNEL: f32 = 10.0;
const EPM_ENGAGE_PWM: f32 = 1100.0;

// --- Frame Selector ---

/// Which coordinate frame a position/velocity target is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFrame {
    /// Lat/lon in 1e7 degrees, altitude relative to home.
    GlobalRelativeAlt,
    /// North-east-down relative to the EKF origin.
    LocalNed,
    /// North-east-down rotated with the vehicle's heading and offset from it.
    BodyOffsetNed,
}

impl CommandFrame {
    #[allow(deprecated)]
    pub fn mav_frame(&self) -> MavFrame {
        match self {
            CommandFrame::GlobalRelativeAlt => MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT,
            CommandFrame::LocalNed => MavFrame::MAV_FRAME_LOCAL_NED,
            CommandFrame::BodyOffsetNed => MavFrame::MAV_FRAME_BODY_OFFSET_NED,
        }
    }
}

/// Altitude reference implied by a global MAVLink frame.
#[allow(deprecated)]
pub fn altitude_reference_of(frame: MavFrame) -> Result<AltitudeReference, FrameError> {
    match frame {
        MavFrame::MAV_FRAME_GLOBAL | MavFrame::MAV_FRAME_GLOBAL_INT => Ok(AltitudeReference::Global),
        MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT | MavFrame::MAV_FRAME_GLOBAL_RELATIVE_ALT_INT => {
            Ok(AltitudeReference::RelativeHome)
        }
        other => Err(FrameError::InvalidFrame(format!(
            "{other:?} is not a supported global frame"
        ))),
    }
}

fn mask(bits: u16) -> PositionTargetTypemask {
    PositionTargetTypemask::from_bits_truncate(bits)
}

fn to_e7(degrees: f64) -> i32 {
    (degrees * 1e7).round() as i32
}

// =========================================================================
// == Position / Velocity Targets ==
// =========================================================================

/// SET_POSITION_TARGET_GLOBAL_INT asking the vehicle to fly to `point`.
///
/// The point must use the home-relative altitude reference.
pub fn position_target_global(point: &GeoPoint) -> Result<MavMessage, CommandError> {
    if point.reference() != AltitudeReference::RelativeHome {
        return Err(FrameError::ReferenceMismatch {
            expected: AltitudeReference::RelativeHome,
            found: point.reference(),
        }
        .into());
    }
    Ok(global_int(
        to_e7(point.lat_deg()),
        to_e7(point.lon_deg()),
        point.alt_m() as f32,
        Vector3::zeros(),
        POSITION_ONLY_MASK,
    ))
}

/// SET_POSITION_TARGET_LOCAL_NED to `(north, east, down)` in `frame`.
///
/// Positive altitudes are negative `down` values.
pub fn position_target_local(north: f64, east: f64, down: f64, frame: CommandFrame) -> MavMessage {
    local_ned(frame, Vector3::new(north, east, down), Vector3::zeros(), POSITION_ONLY_MASK)
}

/// A velocity-only target in `frame`.
///
/// `velocity` is `(x, y, z)` in the frame's own axes: north/east/down for the
/// world frames, forward/right/down for [`CommandFrame::BodyOffsetNed`].
pub fn velocity_target(velocity: &Vector3<f64>, frame: CommandFrame) -> MavMessage {
    match frame {
        CommandFrame::GlobalRelativeAlt => global_int(0, 0, 0.0, *velocity, VELOCITY_ONLY_MASK),
        CommandFrame::LocalNed | CommandFrame::BodyOffsetNed => {
            local_ned(frame, Vector3::zeros(), *velocity, VELOCITY_ONLY_MASK)
        }
    }
}

/// MAVLink carries local positions as `f32`, which keeps centimetre resolution
/// out to about 100 km from the frame origin.
fn local_ned(
    frame: CommandFrame,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    type_mask: u16,
) -> MavMessage {
    MavMessage::SET_POSITION_TARGET_LOCAL_NED(SET_POSITION_TARGET_LOCAL_NED_DATA {
        time_boot_ms: 0,
        x: position.x as f32,
        y: position.y as f32,
        z: position.z as f32,
        vx: velocity.x as f32,
        vy: velocity.y as f32,
        vz: velocity.z as f32,
        afx: 0.0,
        afy: 0.0,
        afz: 0.0,
        yaw: 0.0,
        yaw_rate: 0.0,
        type_mask: mask(type_mask),
        target_system: 0,
        target_component: 0,
        coordinate_frame: frame.mav_frame(),
    })
}

fn global_int(
    lat_int: i32,
    lon_int: i32,
    alt: f32,
    velocity: Vector3<f64>,
    type_mask: u16,
) -> MavMessage {
    MavMessage::SET_POSITION_TARGET_GLOBAL_INT(SET_POSITION_TARGET_GLOBAL_INT_DATA {
        time_boot_ms: 0,
        lat_int,
        lon_int,
        alt,
        vx: velocity.x as f32,
        vy: velocity.y as f32,
        vz: velocity.z as f32,
        afx: 0.0,
        afy: 0.0,
        afz: 0.0,
        yaw: 0.0,
        yaw_rate: 0.0,
        type_mask: mask(type_mask),
        target_system: 0,
        target_component: 0,
        coordinate_frame: CommandFrame::GlobalRelativeAlt.mav_frame(),
    })
}

// =========================================================================
// == COMMAND_LONG helpers ==
// =========================================================================

fn command_long(command: MavCmd, params: [f32; 7]) -> MavMessage {
    MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
        param1: params[0],
        param2: params[1],
        param3: params[2],
        param4: params[3],
        param5: params[4],
        param6: params[5],
        param7: params[6],
        command,
        target_system: 0,
        target_component: 0,
        confirmation: 0,
    })
}

/// MAV_CMD_CONDITION_YAW to `heading_deg`, clockwise, absolute or relative to the current heading.
pub fn condition_yaw(heading_deg: f64, relative: bool) -> MavMessage {
    let is_relative = if relative { 1.0 } else { 0.0 };
    command_long(
        MavCmd::MAV_CMD_CONDITION_YAW,
        [heading_deg as f32, 0.0, 1.0, is_relative, 0.0, 0.0, 0.0],
    )
}

/// MAV_CMD_DO_SET_ROI pointing the gimbal (and possibly the vehicle) at `point`.
///
/// COMMAND_LONG params are `f32`, so the ROI is only good to about a metre.
#[allow(deprecated)]
pub fn set_roi(point: &GeoPoint) -> MavMessage {
    command_long(
        MavCmd::MAV_CMD_DO_SET_ROI,
        [
            0.0,
            0.0,
            0.0,
            0.0,
            point.lat_deg() as f32,
            point.lon_deg() as f32,
            point.alt_m() as f32,
        ],
    )
}

/// MAV_CMD_DO_SET_SERVO engaging the electro-permanent magnet.
pub fn engage_epm() -> MavMessage {
    command_long(
        MavCmd::MAV_CMD_DO_SET_SERVO,
        [EPM_SERVO_CHANNEL, EPM_ENGAGE_PWM, 0.0, 0.0, 0.0, 0.0, 0.0],
    )
}

/// MAV_CMD_NAV_LAND at the current position.
pub fn land() -> MavMessage {
    command_long(MavCmd::MAV_CMD_NAV_LAND, [0.0; 7])
}

// =========================================================================
// == Issuing ==
// =========================================================================

/// Anything that can take a vehicle command: a live link, a simulated vehicle, a recorder.
pub trait CommandSink {
    fn send(&mut self, message: &MavMessage) -> Result<(), CommandError>;
}

impl CommandSink for Vec<MavMessage> {
    fn send(&mut self, message: &MavMessage) -> Result<(), CommandError> {
        self.push(message.clone());
        Ok(())
    }
}

/// Number of sends needed to keep a velocity command alive for `duration` at 10 Hz.
pub fn resend_count(duration: Duration) -> usize {
    let ticks = duration.as_secs_f64() / RESEND_INTERVAL.as_secs_f64();
    (ticks.ceil() as usize).max(1)
}

/// Sends `message` repeatedly for `duration`, calling `pause` between sends.
///
/// Autopilots drop a velocity target after a few seconds without a refresh, so
/// velocity commands must be streamed. `pause` is where the caller sleeps or
/// advances a simulated clock. Returns how many messages were sent.
pub fn issue_for<S, P>(
    sink: &mut S,
    message: &MavMessage,
    duration: Duration,
    mut pause: P,
) -> Result<usize, CommandError>
where
    S: CommandSink + ?Sized,
    P: FnMut(Duration),
{
    let count = resend_count(duration);
    for _ in 0..count {
        sink.send(message)?;
        pause(RESEND_INTERVAL);
    }
    Ok(count)
}
