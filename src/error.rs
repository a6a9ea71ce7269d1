use thiserror::Error;

/// Errors arising from wire record encoding and decoding.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("wrong record length (expected {expected} bytes, got {got})")]
    WrongLength { expected: usize, got: usize },

    #[error("unknown command id 0x{cmd:02X}")]
    UnknownCommand { cmd: u8 },

    #[error("checksum mismatch (expected 0x{expected:02X}, computed 0x{computed:02X})")]
    ChecksumMismatch { expected: u8, computed: u8 },

    #[error("invalid {field} byte 0x{value:02X}")]
    InvalidField { field: &'static str, value: u8 },
}

pub type Result<T> = std::result::Result<T, WireError>;
