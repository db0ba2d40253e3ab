// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stream settings shared by Vantage senders and receivers.

use serde::{Deserialize, Serialize};
use vantage_proto::{CoordinateFrame, ServerInfoMessage};

use crate::config::ConfigError;

/// Config key under which [`StreamSettings`] are stored.
pub const SETTINGS_KEY: &str = "stream";

/// Saved settings for recording and decoding streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreamSettings {
    /// Amortised mesh transfer limits.
    pub transfer: TransferSettings,
    /// Receive side switches.
    pub decode: DecodeSettings,
    /// Server info announced at the start of a recording.
    pub server: ServerSettings,
}

/// Limits applied while streaming mesh resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    /// Payload bytes per transfer call. Zero fills each packet.
    pub byte_limit: usize,
    /// Payload bytes spent on resource transfer per frame. Zero is unbounded.
    pub frame_byte_budget: usize,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            byte_limit: 0,
            frame_byte_budget: 64 * 1024,
        }
    }
}

/// Switches for the receive side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DecodeSettings {
    /// Skip transient shapes entirely.
    pub ignore_transient: bool,
}

/// Server info defaults in their stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Microseconds per time unit.
    pub time_unit: u64,
    /// Frame time in time units.
    pub default_frame_time: u32,
    /// Raw coordinate frame id.
    pub coordinate_frame: u8,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let info = ServerInfoMessage::default();
        Self {
            time_unit: info.time_unit,
            default_frame_time: info.default_frame_time,
            coordinate_frame: info.coordinate_frame.raw(),
        }
    }
}

impl ServerSettings {
    /// Validate and convert into the wire message.
    pub fn to_message(self) -> Result<ServerInfoMessage, ConfigError> {
        if self.time_unit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.time_unit",
                reason: "must be positive".into(),
            });
        }
        let coordinate_frame = CoordinateFrame::from_raw(self.coordinate_frame).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "server.coordinate_frame",
                reason: format!("unknown frame {}", self.coordinate_frame),
            }
        })?;
        Ok(ServerInfoMessage {
            time_unit: self.time_unit,
            default_frame_time: self.default_frame_time,
            coordinate_frame,
        })
    }
}

impl From<ServerInfoMessage> for ServerSettings {
    fn from(info: ServerInfoMessage) -> Self {
        Self {
            time_unit: info.time_unit,
            default_frame_time: info.default_frame_time,
            coordinate_frame: info.coordinate_frame.raw(),
        }
    }
}
