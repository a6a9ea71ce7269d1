//! Motion command payloads: grid rotation, cube placement, lift movement.

use crate::error::{Result, WireError};
use crate::protocol::PAYLOAD_LEN;

/// Normalize an angle into `(-180, 180]` so the controller always takes the
/// shorter rotation. An exact half turn stays `+180`.
pub fn normalize_degrees(degrees: i32) -> i16 {
    let mut deg = degrees.rem_euclid(360);
    if deg > 180 {
        deg -= 360;
    }
    deg as i16
}

/// Rotate the turntable by a signed number of degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotateGrid {
    /// Pre-normalized into `(-180, 180]`.
    pub degrees: i16,
}

impl RotateGrid {
    pub fn new(degrees: i32) -> Self {
        Self {
            degrees: normalize_degrees(degrees),
        }
    }

    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Ok(Self {
            degrees: i16::from_le_bytes([payload[0], payload[1]]),
        })
    }

    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..2].copy_from_slice(&self.degrees.to_le_bytes());
        payload
    }
}

/// Drop cubes into the sectors currently aligned with the loading bays.
///
/// Each count is 0 or 1; 2 only when a double (bottom + top of one sector)
/// is placed in a single motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaceCubes {
    pub red: u8,
    pub yellow: u8,
    pub blue: u8,
}

impl PlaceCubes {
    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Ok(Self {
            red: payload[0],
            yellow: payload[1],
            blue: payload[2],
        })
    }

    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = self.red;
        payload[1] = self.yellow;
        payload[2] = self.blue;
        payload
    }

    /// Total number of cubes dropped by this command.
    pub fn total(&self) -> u8 {
        self.red + self.yellow + self.blue
    }
}

/// Move the lift up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveLift {
    Up = 0,
    Down = 1,
}

impl MoveLift {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Up),
            1 => Ok(Self::Down),
            _ => Err(WireError::InvalidField {
                field: "move lift",
                value: b,
            }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Self::from_byte(payload[0])
    }

    pub fn encode(self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = self.as_byte();
        payload
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
