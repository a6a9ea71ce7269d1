//! The UART read loop.
//!
//! Owns the inbound serial connection. Decoded frames are routed by command:
//! acknowledgments go to the writer's side channel, machine reports go to the
//! application inbox, everything else is logged and dropped. Transport
//! failures never escape the loop — the handle is released and reopened after
//! a short backoff.

use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use serialport::SerialPort;

use crate::cancel::CancelToken;
use crate::frame::FrameSplitter;
use crate::protocol::{Command, Message};

/// Poll interval for a single blocking read. Short enough that cancellation
/// and reconnects stay responsive.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Pause before retrying a failed open.
const REOPEN_BACKOFF: Duration = Duration::from_secs(1);

pub struct UartReader {
    port_path: String,
    baud_rate: u32,
    cancel: CancelToken,
    ack_tx: Sender<Message>,
    inbox_tx: Sender<Message>,
    splitter: FrameSplitter,
}

impl UartReader {
    pub fn spawn(
        port_path: String,
        baud_rate: u32,
        cancel: CancelToken,
        ack_tx: Sender<Message>,
        inbox_tx: Sender<Message>,
    ) -> JoinHandle<()> {
        let mut reader = UartReader {
            port_path,
            baud_rate,
            cancel,
            ack_tx,
            inbox_tx,
            splitter: FrameSplitter::new(),
        };
        thread::spawn(move || reader.run())
    }

    fn run(&mut self) {
        info!("uart reader started on {}", self.port_path);
        let mut port: Option<Box<dyn SerialPort>> = None;
        let mut buf = [0u8; 256];

        while !self.cancel.is_cancelled() {
            let Some(handle) = port.as_mut() else {
                match self.open_port() {
                    Some(opened) => port = Some(opened),
                    None => thread::sleep(REOPEN_BACKOFF),
                }
                continue;
            };

            match handle.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => self.pump(&buf[..n]),
                Err(e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    warn!("serial read failed, reopening connection: {e}");
                    port = None;
                    thread::sleep(REOPEN_BACKOFF);
                }
            }
        }
        info!("uart reader stopped");
    }

    fn open_port(&self) -> Option<Box<dyn SerialPort>> {
        match serialport::new(&self.port_path, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()
        {
            Ok(port) => {
                info!("uart read connection opened on {}", self.port_path);
                Some(port)
            }
            Err(e) => {
                error!("failed to open uart read connection on {}: {e}", self.port_path);
                None
            }
        }
    }

    /// Feed freshly read bytes and dispatch every complete frame.
    fn pump(&mut self, bytes: &[u8]) {
        self.splitter.feed(bytes);
        while let Some(result) = self.splitter.next() {
            match result {
                Ok(message) => self.dispatch(message),
                Err(e) => warn!("dropping invalid frame: {e}"),
            }
        }
    }

    fn dispatch(&self, message: Message) {
        match message.command {
            Command::Acknowledge | Command::NotAcknowledge | Command::CrcError => {
                debug!("ack received: {:?} (id {})", message.command.id(), message.id);
                if self.ack_tx.send(message).is_err() {
                    debug!("ack channel closed, dropping acknowledgment");
                }
            }
            Command::SendState(_) | Command::SendIoState(_) | Command::ExecutionFinished(_) => {
                if self.inbox_tx.send(message).is_err() {
                    debug!("inbox closed, dropping message");
                }
            }
            ref other => warn!("unhandled command received: {:?}", other.id()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
