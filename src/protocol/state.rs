//! Status payloads reported by the electronics controller.

use crate::error::{Result, WireError};
use crate::protocol::{CommandId, PAYLOAD_LEN};

/// State of a physical push button, as debounced by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonState {
    Released = 0,
    Pressed = 1,
    ShortClicked = 2,
    LongClicked = 3,
}

impl ButtonState {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Released),
            1 => Ok(Self::Pressed),
            2 => Ok(Self::ShortClicked),
            3 => Ok(Self::LongClicked),
            _ => Err(WireError::InvalidField {
                field: "button state",
                value: b,
            }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// True once the controller reports a completed click of either length.
    pub fn clicked(self) -> bool {
        matches!(self, Self::ShortClicked | Self::LongClicked)
    }
}

/// Position of the lift axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LiftState {
    Unhomed = 0,
    Up = 1,
    Down = 2,
}

impl LiftState {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Unhomed),
            1 => Ok(Self::Up),
            2 => Ok(Self::Down),
            _ => Err(WireError::InvalidField {
                field: "lift state",
                value: b,
            }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Machine state reported by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WerniState {
    Preparing = 0,
    Ready = 1,
    Building = 2,
    BuildPaused = 3,
    BuildAborted = 4,
}

impl WerniState {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Preparing),
            1 => Ok(Self::Ready),
            2 => Ok(Self::Building),
            3 => Ok(Self::BuildPaused),
            4 => Ok(Self::BuildAborted),
            _ => Err(WireError::InvalidField {
                field: "werni state",
                value: b,
            }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Buzzer on/off payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BuzzerState {
    Disable = 0,
    Enable = 1,
}

impl BuzzerState {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Disable),
            1 => Ok(Self::Enable),
            _ => Err(WireError::InvalidField {
                field: "buzzer state",
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

/// Response to `GetState`: energy counter plus lift and machine state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendState {
    /// Measured energy since the last reset, in watt-seconds.
    pub energy: f32,
    pub lift: LiftState,
    pub werni: WerniState,
}

impl SendState {
    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Ok(Self {
            energy: f32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
            lift: LiftState::from_byte(payload[4])?,
            werni: WerniState::from_byte(payload[5])?,
        })
    }

    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..4].copy_from_slice(&self.energy.to_le_bytes());
        payload[4] = self.lift.as_byte();
        payload[5] = self.werni.as_byte();
        payload
    }
}

/// Unsolicited button report. The stop button comes first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendIoState {
    pub stop: ButtonState,
    pub start: ButtonState,
}

impl SendIoState {
    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Ok(Self {
            stop: ButtonState::from_byte(payload[0])?,
            start: ButtonState::from_byte(payload[1])?,
        })
    }

    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = self.stop.as_byte();
        payload[1] = self.start.as_byte();
        payload
    }
}

/// Asynchronous confirmation that a previously acknowledged command has
/// finished executing. Distinct from the ack, which only confirms receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionFinished {
    /// The command that finished.
    pub command: CommandId,
    pub success: bool,
}

impl ExecutionFinished {
    pub fn decode(payload: &[u8; PAYLOAD_LEN]) -> Result<Self> {
        Ok(Self {
            command: CommandId::from_byte(payload[0])?,
            success: payload[1] != 0,
        })
    }

    pub fn encode(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[0] = self.command.as_byte();
        payload[1] = u8::from(self.success);
        payload
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_state_round_trip() {
        for state in [
            ButtonState::Released,
            ButtonState::Pressed,
            ButtonState::ShortClicked,
            ButtonState::LongClicked,
        ] {
            assert_eq!(ButtonState::from_byte(state.as_byte()).unwrap(), state);
        }
        assert!(ButtonState::from_byte(4).is_err());
    }

    #[test]
    fn clicked_covers_both_click_lengths() {
        assert!(ButtonState::ShortClicked.clicked());
        assert!(ButtonState::LongClicked.clicked());
        assert!(!ButtonState::Pressed.clicked());
        assert!(!ButtonState::Released.clicked());
    }

    #[test]
    fn send_state_round_trip() {
        let state = SendState {
            energy: 1234.5,
            lift: LiftState::Down,
            werni: WerniState::Building,
        };
        let payload = state.encode();
        assert_eq!(SendState::decode(&payload).unwrap(), state);
    }

    #[test]
    fn send_state_rejects_invalid_lift() {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload[4] = 7;
        assert!(SendState::decode(&payload).is_err());
    }

    #[test]
    fn io_state_stop_button_first() {
        let io = SendIoState {
            stop: ButtonState::Released,
            start: ButtonState::ShortClicked,
        };
        let payload = io.encode();
        assert_eq!(payload[0], 0);
        assert_eq!(payload[1], 2);
        assert_eq!(SendIoState::decode(&payload).unwrap(), io);
    }

    #[test]
    fn execution_finished_round_trip() {
        let done = ExecutionFinished {
            command: CommandId::MoveLift,
            success: true,
        };
        let payload = done.encode();
        assert_eq!(payload[0], CommandId::MoveLift.as_byte());
        assert_eq!(payload[1], 1);
        assert_eq!(ExecutionFinished::decode(&payload).unwrap(), done);
    }
}
