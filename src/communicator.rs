//! Wires the UART reader and writer together.
//!
//! Owns every channel endpoint the two threads share: the outbound command
//! queue, the acknowledgment side channel (reader → writer), and the
//! application inbox (reader → controller). The queues are the only
//! shared-state boundary — each thread keeps its own state exclusively.

use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::info;

use crate::cancel::CancelToken;
use crate::config::AppConfiguration;
use crate::protocol::{Command, Message};
use crate::reader::UartReader;
use crate::writer::UartWriter;

/// Manages the communication with the electronics controller.
pub struct UartCommunicator {
    cancel: CancelToken,
    write_tx: Sender<Command>,
    inbox_rx: Receiver<Message>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl UartCommunicator {
    /// Spawns the reader and writer threads against the configured ports.
    pub fn start(config: &AppConfiguration, cancel: CancelToken) -> Self {
        info!("starting uart reader and writer");
        let (write_tx, write_rx) = unbounded();
        let (ack_tx, ack_rx) = unbounded();
        let (inbox_tx, inbox_rx) = unbounded();

        let reader = UartReader::spawn(
            config.serial.read.clone(),
            config.serial.baud_rate,
            cancel.clone(),
            ack_tx,
            inbox_tx,
        );
        let writer = UartWriter::spawn(
            config.serial.write.clone(),
            config.serial.baud_rate,
            cancel.clone(),
            write_rx,
            ack_rx,
        );

        Self {
            cancel,
            write_tx,
            inbox_rx,
            reader: Some(reader),
            writer: Some(writer),
        }
    }

    /// A clone of the outbound command queue, e.g. for the build planner.
    pub fn sender(&self) -> Sender<Command> {
        self.write_tx.clone()
    }

    /// Enqueues a command for delivery.
    pub fn send(&self, command: Command) {
        let _ = self.write_tx.send(command);
    }

    /// Inbound machine reports: state, IO, and execution-finished messages.
    pub fn inbox(&self) -> &Receiver<Message> {
        &self.inbox_rx
    }

    /// Asks both threads to finish their current operation and exit.
    pub fn halt(&self) {
        self.cancel.cancel();
    }

    /// Waits for both threads to exit. Call [`halt`](Self::halt) first.
    pub fn join(mut self) {
        info!("waiting for uart reader and writer to stop");
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
