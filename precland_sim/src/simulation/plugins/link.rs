// precland_sim/src/simulation/plugins/link.rs

use mavlink::common::MavMessage;
use mavlink::{MavConnection, MavHeader};
use precland_core::error::CommandError;
use precland_core::messages::CommandSink;
use tracing::info;

/// Ground-station system id used for outgoing commands.
const GCS_SYSTEM_ID: u8 = 255;

/// A live MAVLink connection, for mirroring simulated commands to an autopilot or SITL.
pub struct MavlinkLink {
    connection: Box<dyn MavConnection<MavMessage> + Send + Sync>,
    header: MavHeader,
}

impl MavlinkLink {
    /// Opens `address`, e.g. `udpout:127.0.0.1:14550` or `tcpout:127.0.0.1:5760`.
    pub fn connect(address: &str) -> Result<Self, CommandError> {
        let connection = mavlink::connect::<MavMessage>(address)
            .map_err(|e| CommandError::Link(format!("{address}: {e}")))?;
        info!("MAVLink link open on {}", address);
        Ok(Self {
            connection,
            header: MavHeader {
                system_id: GCS_SYSTEM_ID,
                component_id: 0,
                sequence: 0,
            },
        })
    }
}

impl CommandSink for MavlinkLink {
    fn send(&mut self, message: &MavMessage) -> Result<(), CommandError> {
        self.connection
            .send(&self.header, message)
            .map_err(|e| CommandError::Link(e.to_string()))?;
        self.header.sequence = self.header.sequence.wrapping_add(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_address_is_a_link_error() {
        assert!(matches!(
            MavlinkLink::connect("carrier-pigeon:nowhere"),
            Err(CommandError::Link(_))
        ));
    }
}
