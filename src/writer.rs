//! The UART write loop.
//!
//! Owns the outbound serial connection and drains the command queue one
//! command at a time: encode with a fresh sequence id, write the frame, then
//! block until the controller acknowledges receipt. A timeout retransmits the
//! identical record (same sequence id — it is the same logical command), so
//! commands reach the controller exactly in enqueue order and at most one is
//! ever in flight.

use std::io::Write;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, info, warn};
use serialport::SerialPort;

use crate::cancel::CancelToken;
use crate::codec::SequenceId;
use crate::frame::encode_frame;
use crate::protocol::{Command, Message};

/// How long to wait for an acknowledgment before retransmitting.
const ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between a timed-out attempt and its retransmission.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Pause before retrying a failed open.
const REOPEN_BACKOFF: Duration = Duration::from_secs(1);

/// Poll interval on the command queue, so cancellation stays responsive.
const QUEUE_POLL: Duration = Duration::from_secs(1);

enum AckOutcome {
    /// Ack, nack, or crc-error arrived — the command counts as delivered.
    Delivered,
    /// Nothing arrived in time; retransmit.
    Retry,
    /// The ack channel is gone; the reader has shut down.
    Disconnected,
}

pub struct UartWriter {
    port_path: String,
    baud_rate: u32,
    cancel: CancelToken,
    queue_rx: Receiver<Command>,
    ack_rx: Receiver<Message>,
    seq: SequenceId,
    ack_timeout: Duration,
}

impl UartWriter {
    pub fn spawn(
        port_path: String,
        baud_rate: u32,
        cancel: CancelToken,
        queue_rx: Receiver<Command>,
        ack_rx: Receiver<Message>,
    ) -> JoinHandle<()> {
        let mut writer = UartWriter {
            port_path,
            baud_rate,
            cancel,
            queue_rx,
            ack_rx,
            seq: SequenceId::new(),
            ack_timeout: ACK_TIMEOUT,
        };
        thread::spawn(move || writer.run())
    }

    fn run(&mut self) {
        info!("uart writer started on {}", self.port_path);
        let mut port: Option<Box<dyn SerialPort>> = None;

        while !self.cancel.is_cancelled() {
            match self.queue_rx.recv_timeout(QUEUE_POLL) {
                Ok(command) => {
                    let message = Message {
                        id: self.seq.next(),
                        command,
                    };
                    self.deliver(&mut port, &message);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("uart writer stopped");
    }

    /// Write `message` and block until it is acknowledged, retransmitting on
    /// timeout and reopening the port on write failure. Returns early only
    /// when cancelled or the reader is gone.
    fn deliver(&mut self, port: &mut Option<Box<dyn SerialPort>>, message: &Message) {
        let wire = encode_frame(message);

        // A stale ack left over from an earlier retransmission must not
        // complete this command.
        while self.ack_rx.try_recv().is_ok() {}

        while !self.cancel.is_cancelled() {
            let Some(handle) = port.as_mut() else {
                match self.open_port() {
                    Some(opened) => *port = Some(opened),
                    None => thread::sleep(REOPEN_BACKOFF),
                }
                continue;
            };

            if let Err(e) = handle.write_all(&wire).and_then(|()| handle.flush()) {
                warn!("serial write failed: {e}");
                *port = None;
                continue;
            }
            debug!(
                "sent {:?} (id {}), awaiting acknowledgment",
                message.command.id(),
                message.id
            );

            match self.await_ack(message) {
                AckOutcome::Delivered => return,
                AckOutcome::Retry => thread::sleep(RETRY_DELAY),
                AckOutcome::Disconnected => return,
            }
        }
    }

    /// Wait for the next message on the ack channel. Any of the three
    /// acknowledgment kinds unblocks the write; only silence retransmits.
    fn await_ack(&self, message: &Message) -> AckOutcome {
        match self.ack_rx.recv_timeout(self.ack_timeout) {
            Ok(ack) => {
                match ack.command {
                    Command::Acknowledge => {
                        debug!("command id {} acknowledged", message.id);
                    }
                    Command::NotAcknowledge => {
                        warn!("command id {} rejected by the controller", message.id);
                    }
                    Command::CrcError => {
                        warn!(
                            "controller reported a checksum error for command id {}",
                            message.id
                        );
                    }
                    ref other => {
                        warn!("unexpected message on ack channel: {:?}", other.id());
                    }
                }
                AckOutcome::Delivered
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "no acknowledgment for {:?} (id {}) within {:?}, retransmitting",
                    message.command.id(),
                    message.id,
                    self.ack_timeout
                );
                AckOutcome::Retry
            }
            Err(RecvTimeoutError::Disconnected) => AckOutcome::Disconnected,
        }
    }

    fn open_port(&self) -> Option<Box<dyn SerialPort>> {
        match serialport::new(&self.port_path, self.baud_rate)
            .timeout(Duration::from_secs(1))
            .open()
        {
            Ok(port) => {
                info!("uart write connection opened on {}", self.port_path);
                Some(port)
            }
            Err(e) => {
                error!(
                    "failed to open uart write connection on {}: {e}",
                    self.port_path
                );
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
