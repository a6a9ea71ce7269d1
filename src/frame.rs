//! Frame layout and stream resynchronization.
//!
//! Wire format:
//! ```text
//! "AAAB" [cmd] [id] [payload; 16] [checksum]
//! ```
//!
//! The 4-byte preamble is a pure framing marker: prepended when sending and
//! stripped before the 19-byte record is decoded. It is not covered by the
//! checksum.

use crate::error::Result;
use crate::protocol::{Message, RECORD_LEN};

/// Out-of-band framing marker preceding every record on the wire.
pub const PREAMBLE: [u8; 4] = *b"AAAB";

/// Total frame length on the wire: preamble plus record.
pub const FRAME_LEN: usize = PREAMBLE.len() + RECORD_LEN;

/// Encode a message into a complete wire frame.
pub fn encode_frame(message: &Message) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..PREAMBLE.len()].copy_from_slice(&PREAMBLE);
    frame[PREAMBLE.len()..].copy_from_slice(&message.encode());
    frame
}

/// Splits a byte stream into decoded messages. Buffers partial data across
/// calls, so it can be fed arbitrary UART read chunks.
///
/// Recovery rules: with no preamble in sight the whole buffer is garbage and
/// is discarded. A frame that fails to decode gives up only its preamble, so
/// a byte-shifted frame behind it can still be found on the next scan.
#[derive(Default)]
pub struct FrameSplitter {
    buf: Vec<u8>,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(4 * FRAME_LEN),
        }
    }

    /// Append freshly read bytes.
    pub fn feed(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Extract the next frame, if a complete one is buffered.
    ///
    /// `Some(Err(..))` reports a frame that failed to decode; the caller is
    /// expected to log it and keep polling.
    pub fn next(&mut self) -> Option<Result<Message>> {
        let start = match self
            .buf
            .windows(PREAMBLE.len())
            .position(|w| w == PREAMBLE)
        {
            Some(pos) => pos,
            None => {
                self.buf.clear();
                return None;
            }
        };
        if start > 0 {
            self.buf.drain(..start);
        }
        if self.buf.len() < FRAME_LEN {
            return None;
        }

        match Message::decode(&self.buf[PREAMBLE.len()..FRAME_LEN]) {
            Ok(message) => {
                self.buf.drain(..FRAME_LEN);
                Some(Ok(message))
            }
            Err(error) => {
                // Drop the stale preamble only; the payload may contain the
                // preamble of the next, intact frame.
                self.buf.drain(..PREAMBLE.len());
                Some(Err(error))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
