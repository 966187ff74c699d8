// precland_sim/src/simulation/plugins/vehicle.rs

//! A kinematic multirotor that obeys the command issuer's MAVLink messages.

use crate::simulation::config::structs::VehicleConfig;
use crate::simulation::core::prng::SimulationRng;
use mavlink::common::{
    MavCmd, MavFrame, MavMessage, COMMAND_LONG_DATA, SET_POSITION_TARGET_GLOBAL_INT_DATA,
    SET_POSITION_TARGET_LOCAL_NED_DATA,
};
use nalgebra::Vector3;
use precland_core::error::{CommandError, FrameError};
use precland_core::frames::local::LocalFrame;
use precland_core::messages::{
    altitude_reference_of, CommandSink, POSITION_ONLY_MASK, VELOCITY_ONLY_MASK,
};
use precland_core::types::{AltitudeReference, Attitude, GeoPoint, Telemetry};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info};

/// A velocity setpoint is dropped this long after its last refresh.
const VELOCITY_TIMEOUT_S: f64 = 1.0;

/// Distance at which a position target counts as reached.
const ARRIVAL_RADIUS_M: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightMode {
    Hold,
    /// Flying to a `(north, east, up)` point.
    Position(Vector3<f64>),
    /// Moving at a `(north, east, up)` velocity until `expires_s`.
    Velocity {
        velocity: Vector3<f64>,
        expires_s: f64,
    },
    Landing,
    Landed,
}

/// Point-mass vehicle in the home frame. Poses are `(north, east, up)`.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    home: LocalFrame,
    position: Vector3<f64>,
    yaw: f64,
    mode: FlightMode,
    max_speed_mps: f64,
    land_speed_mps: f64,
    gps_noise: Option<Normal<f64>>,
    clock_s: f64,
    epm_engaged: bool,
}

impl SimVehicle {
    pub fn new(home: LocalFrame, config: &VehicleConfig) -> Self {
        let gps_noise = if config.gps_noise_stddev_m > 0.0 {
            Normal::new(0.0, config.gps_noise_stddev_m).ok()
        } else {
            None
        };
        Self {
            home,
            position: Vector3::new(
                config.start_north_m,
                config.start_east_m,
                config.takeoff_altitude_m,
            ),
            yaw: config.start_yaw_deg.to_radians(),
            mode: FlightMode::Hold,
            max_speed_mps: config.max_speed_mps,
            land_speed_mps: config.land_speed_mps,
            gps_noise,
            clock_s: 0.0,
            epm_engaged: false,
        }
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    pub fn is_landed(&self) -> bool {
        self.mode == FlightMode::Landed
    }

    pub fn epm_engaged(&self) -> bool {
        self.epm_engaged
    }

    pub fn attitude(&self) -> Attitude {
        Attitude::new(0.0, 0.0, self.yaw)
    }

    /// The vehicle's true location.
    pub fn location(&self) -> Result<GeoPoint, FrameError> {
        self.home.to_geo(&self.position)
    }

    /// What the autopilot would report: the location with horizontal GPS error.
    pub fn telemetry(&self, rng: &mut SimulationRng) -> Result<Telemetry, FrameError> {
        let mut reported = self.position;
        if let Some(noise) = &self.gps_noise {
            reported.x += noise.sample(&mut rng.0);
            reported.y += noise.sample(&mut rng.0);
        }
        Ok(Telemetry {
            location: self.home.to_geo(&reported)?,
            attitude: self.attitude(),
            timestamp_s: self.clock_s,
        })
    }

    /// Integrates the active setpoint over `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.clock_s += dt;
        match self.mode {
            FlightMode::Hold | FlightMode::Landed => {}
            FlightMode::Position(target) => {
                let delta = target - self.position;
                let reach = self.max_speed_mps * dt;
                if delta.norm() <= reach.max(ARRIVAL_RADIUS_M) {
                    self.position = target;
                    self.mode = FlightMode::Hold;
                } else {
                    self.position += delta.normalize() * reach;
                }
            }
            FlightMode::Velocity {
                velocity,
                expires_s,
            } => {
                if self.clock_s > expires_s {
                    self.mode = FlightMode::Hold;
                } else {
                    self.position += velocity * dt;
                }
            }
            FlightMode::Landing => {
                self.position.z -= self.land_speed_mps * dt;
            }
        }

        if self.position.z <= 0.0 {
            self.position.z = 0.0;
            if self.mode != FlightMode::Landed {
                info!("Touchdown at ({:.2} N, {:.2} E)", self.position.x, self.position.y);
            }
            self.mode = FlightMode::Landed;
        }
    }

    // --- Message Handling ---

    fn apply_local(&mut self, data: &SET_POSITION_TARGET_LOCAL_NED_DATA) -> Result<(), CommandError> {
        let ned = Vector3::new(data.x as f64, data.y as f64, data.z as f64);
        let ned_velocity = Vector3::new(data.vx as f64, data.vy as f64, data.vz as f64);
        let (ned, ned_velocity) = match data.coordinate_frame {
            MavFrame::MAV_FRAME_LOCAL_NED => (ned, ned_velocity),
            MavFrame::MAV_FRAME_BODY_OFFSET_NED => {
                let rotate = |v: Vector3<f64>| {
                    let (s, c) = self.yaw.sin_cos();
                    Vector3::new(c * v.x - s * v.y, s * v.x + c * v.y, v.z)
                };
                (rotate(ned) + self.ned_position(), rotate(ned_velocity))
            }
            other => {
                return Err(FrameError::InvalidFrame(format!(
                    "{other:?} is not a supported local frame"
                ))
                .into())
            }
        };

        match data.type_mask.bits() {
            POSITION_ONLY_MASK => {
                self.set_position(Vector3::new(ned.x, ned.y, -ned.z));
                Ok(())
            }
            VELOCITY_ONLY_MASK => {
                self.set_velocity(ned_velocity);
                Ok(())
            }
            bits => Err(CommandError::Link(format!("unsupported type mask {bits:#018b}"))),
        }
    }

    fn apply_global(&mut self, data: &SET_POSITION_TARGET_GLOBAL_INT_DATA) -> Result<(), CommandError> {
        match data.type_mask.bits() {
            POSITION_ONLY_MASK => {
                let reference = altitude_reference_of(data.coordinate_frame)?;
                if reference != AltitudeReference::RelativeHome {
                    return Err(FrameError::ReferenceMismatch {
                        expected: AltitudeReference::RelativeHome,
                        found: reference,
                    }
                    .into());
                }
                let point = GeoPoint::relative(
                    data.lat_int as f64 / 1e7,
                    data.lon_int as f64 / 1e7,
                    data.alt as f64,
                );
                let local = self.home.to_local(&point)?;
                self.set_position(local);
                Ok(())
            }
            VELOCITY_ONLY_MASK => {
                self.set_velocity(Vector3::new(data.vx as f64, data.vy as f64, data.vz as f64));
                Ok(())
            }
            bits => Err(CommandError::Link(format!("unsupported type mask {bits:#018b}"))),
        }
    }

    fn apply_command(&mut self, data: &COMMAND_LONG_DATA) -> Result<(), CommandError> {
        match data.command {
            MavCmd::MAV_CMD_NAV_LAND => {
                if self.mode != FlightMode::Landed {
                    debug!("Landing from {:.2} m", self.position.z);
                    self.mode = FlightMode::Landing;
                }
            }
            MavCmd::MAV_CMD_CONDITION_YAW => {
                let heading = (data.param1 as f64).to_radians() * data.param3.signum() as f64;
                self.yaw = if data.param4 > 0.0 {
                    self.yaw + heading
                } else {
                    heading
                };
            }
            MavCmd::MAV_CMD_DO_SET_SERVO => {
                self.epm_engaged = true;
            }
            other => debug!("Ignoring {:?}", other),
        }
        Ok(())
    }

    fn ned_position(&self) -> Vector3<f64> {
        Vector3::new(self.position.x, self.position.y, -self.position.z)
    }

    /// Setpoints are ignored once the vehicle is landing, as in an autopilot's LAND mode.
    fn accepts_setpoints(&self) -> bool {
        !matches!(self.mode, FlightMode::Landing | FlightMode::Landed)
    }

    fn set_position(&mut self, target: Vector3<f64>) {
        if self.accepts_setpoints() {
            self.mode = FlightMode::Position(target);
        }
    }

    fn set_velocity(&mut self, ned_velocity: Vector3<f64>) {
        if self.accepts_setpoints() {
            self.mode = FlightMode::Velocity {
                velocity: Vector3::new(ned_velocity.x, ned_velocity.y, -ned_velocity.z),
                expires_s: self.clock_s + VELOCITY_TIMEOUT_S,
            };
        }
    }
}

impl CommandSink for SimVehicle {
    fn send(&mut self, message: &MavMessage) -> Result<(), CommandError> {
        match message {
            MavMessage::SET_POSITION_TARGET_LOCAL_NED(data) => self.apply_local(data),
            MavMessage::SET_POSITION_TARGET_GLOBAL_INT(data) => self.apply_global(data),
            MavMessage::COMMAND_LONG(data) => self.apply_command(data),
            other => Err(CommandError::Link(format!(
                "simulated vehicle cannot handle {other:?}"
            ))),
        }
    }
}
