//! Message types and encode/decode dispatch.
//!
//! - [`CommandId`] — the stable numeric command ids agreed with the
//!   electronics controller.
//! - [`Command`] — tagged payload union: one variant per command, with
//!   payload-carrying variants wrapping the structs from [`motion`] and
//!   [`state`].
//! - [`Message`] — a command stamped with its sequence id; maps 1:1 onto the
//!   fixed 19-byte wire record `[cmd][id][payload; 16][checksum]`.

pub mod motion;
pub mod state;

use crate::codec;
use crate::error::{Result, WireError};

/// Fixed size of the payload field. Every command's payload fits in (and is
/// zero-padded to) this many bytes.
pub const PAYLOAD_LEN: usize = 16;

/// Wire record length: command id + sequence id + payload + checksum.
pub const RECORD_LEN: usize = 2 + PAYLOAD_LEN + 1;

// ---------------------------------------------------------------------------
// Command ids
// ---------------------------------------------------------------------------

/// Numeric command ids on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    Reserved = 0,
    Acknowledge = 1,
    NotAcknowledge = 2,
    CrcError = 3,
    RotateGrid = 4,
    PlaceCubes = 5,
    MoveLift = 6,
    GetState = 7,
    SendState = 8,
    PauseBuild = 9,
    ResumeBuild = 10,
    PrimeMagazine = 11,
    SendIoState = 12,
    ExecutionFinished = 13,
    ResetEnergyMeasurement = 14,
    ResetWerni = 15,
    EnableBuzzer = 16,
}

impl CommandId {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(Self::Reserved),
            1 => Ok(Self::Acknowledge),
            2 => Ok(Self::NotAcknowledge),
            3 => Ok(Self::CrcError),
            4 => Ok(Self::RotateGrid),
            5 => Ok(Self::PlaceCubes),
            6 => Ok(Self::MoveLift),
            7 => Ok(Self::GetState),
            8 => Ok(Self::SendState),
            9 => Ok(Self::PauseBuild),
            10 => Ok(Self::ResumeBuild),
            11 => Ok(Self::PrimeMagazine),
            12 => Ok(Self::SendIoState),
            13 => Ok(Self::ExecutionFinished),
            14 => Ok(Self::ResetEnergyMeasurement),
            15 => Ok(Self::ResetWerni),
            16 => Ok(Self::EnableBuzzer),
            _ => Err(WireError::UnknownCommand { cmd: b }),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Command — tagged payload union
// ---------------------------------------------------------------------------

/// A wire command with its payload.
///
/// Bare commands (no meaningful payload) encode a zeroed payload field.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reserved,
    Acknowledge,
    NotAcknowledge,
    CrcError,
    RotateGrid(motion::RotateGrid),
    PlaceCubes(motion::PlaceCubes),
    MoveLift(motion::MoveLift),
    GetState,
    SendState(state::SendState),
    PauseBuild,
    ResumeBuild,
    PrimeMagazine,
    SendIoState(state::SendIoState),
    ExecutionFinished(state::ExecutionFinished),
    ResetEnergyMeasurement,
    ResetWerni,
    EnableBuzzer(state::BuzzerState),
}

impl Command {
    /// The numeric id this command carries on the wire.
    pub fn id(&self) -> CommandId {
        match self {
            Command::Reserved => CommandId::Reserved,
            Command::Acknowledge => CommandId::Acknowledge,
            Command::NotAcknowledge => CommandId::NotAcknowledge,
            Command::CrcError => CommandId::CrcError,
            Command::RotateGrid(_) => CommandId::RotateGrid,
            Command::PlaceCubes(_) => CommandId::PlaceCubes,
            Command::MoveLift(_) => CommandId::MoveLift,
            Command::GetState => CommandId::GetState,
            Command::SendState(_) => CommandId::SendState,
            Command::PauseBuild => CommandId::PauseBuild,
            Command::ResumeBuild => CommandId::ResumeBuild,
            Command::PrimeMagazine => CommandId::PrimeMagazine,
            Command::SendIoState(_) => CommandId::SendIoState,
            Command::ExecutionFinished(_) => CommandId::ExecutionFinished,
            Command::ResetEnergyMeasurement => CommandId::ResetEnergyMeasurement,
            Command::ResetWerni => CommandId::ResetWerni,
            Command::EnableBuzzer(_) => CommandId::EnableBuzzer,
        }
    }

    fn encode_payload(&self) -> [u8; PAYLOAD_LEN] {
        match self {
            Command::RotateGrid(m) => m.encode(),
            Command::PlaceCubes(m) => m.encode(),
            Command::MoveLift(m) => m.encode(),
            Command::SendState(m) => m.encode(),
            Command::SendIoState(m) => m.encode(),
            Command::ExecutionFinished(m) => m.encode(),
            Command::EnableBuzzer(m) => m.encode(),
            _ => [0u8; PAYLOAD_LEN],
        }
    }
}

// ---------------------------------------------------------------------------
// Message — the wire record
// ---------------------------------------------------------------------------

/// A command stamped with its sequence id, ready for the wire.
///
/// Immutable once built; a retransmission reuses the identical record.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Sequence id, wrapping mod 256, monotonic per sender.
    pub id: u8,
    pub command: Command,
}

impl Message {
    /// Encode into the 19-byte record (checksum included, preamble not).
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[0] = self.command.id().as_byte();
        record[1] = self.id;
        record[2..2 + PAYLOAD_LEN].copy_from_slice(&self.command.encode_payload());
        record[RECORD_LEN - 1] = codec::checksum(&record[..RECORD_LEN - 1]);
        record
    }

    /// Decode a 19-byte record (after the preamble has been stripped).
    ///
    /// Fails on wrong length, checksum mismatch, unknown command id, or an
    /// out-of-range payload byte; never yields a partial record.
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() != RECORD_LEN {
            return Err(WireError::WrongLength {
                expected: RECORD_LEN,
                got: record.len(),
            });
        }

        let expected = record[RECORD_LEN - 1];
        let computed = codec::checksum(&record[..RECORD_LEN - 1]);
        if expected != computed {
            return Err(WireError::ChecksumMismatch { expected, computed });
        }

        let id = record[1];
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&record[2..2 + PAYLOAD_LEN]);

        let command = match CommandId::from_byte(record[0])? {
            CommandId::Reserved => Command::Reserved,
            CommandId::Acknowledge => Command::Acknowledge,
            CommandId::NotAcknowledge => Command::NotAcknowledge,
            CommandId::CrcError => Command::CrcError,
            CommandId::RotateGrid => Command::RotateGrid(motion::RotateGrid::decode(&payload)?),
            CommandId::PlaceCubes => Command::PlaceCubes(motion::PlaceCubes::decode(&payload)?),
            CommandId::MoveLift => Command::MoveLift(motion::MoveLift::decode(&payload)?),
            CommandId::GetState => Command::GetState,
            CommandId::SendState => Command::SendState(state::SendState::decode(&payload)?),
            CommandId::PauseBuild => Command::PauseBuild,
            CommandId::ResumeBuild => Command::ResumeBuild,
            CommandId::PrimeMagazine => Command::PrimeMagazine,
            CommandId::SendIoState => Command::SendIoState(state::SendIoState::decode(&payload)?),
            CommandId::ExecutionFinished => {
                Command::ExecutionFinished(state::ExecutionFinished::decode(&payload)?)
            }
            CommandId::ResetEnergyMeasurement => Command::ResetEnergyMeasurement,
            CommandId::ResetWerni => Command::ResetWerni,
            CommandId::EnableBuzzer => Command::EnableBuzzer(state::BuzzerState::decode(&payload)?),
        };

        Ok(Message { id, command })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
