//! The WERNI daemon.
//!
//! Loads the configuration, starts the UART reader/writer pair, and runs the
//! controller loop that sequences a run: button handling, build kickoff,
//! lift/state tracking, and the end-of-run buzzer. SIGINT/SIGTERM trigger a
//! cooperative halt.

use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{error, info, warn};

use werni::builder::Builder;
use werni::protocol::motion::MoveLift;
use werni::protocol::state::{BuzzerState, LiftState, SendIoState, SendState};
use werni::protocol::{Command, CommandId, Message};
use werni::{AppConfiguration, CancelToken, CubeConfiguration, UartCommunicator};

/// Seconds the buzzer marks the end of a run.
const BUZZER_SECS: u64 = 10;

#[derive(Parser)]
#[command(name = "wernid", about = "Driver daemon for the WERNI cube-sorting machine")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(default_value = "config.toml")]
    config: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match AppConfiguration::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || cancel.cancel()) {
            error!("failed to install signal handler: {e}");
            process::exit(1);
        }
    }

    let communicator = UartCommunicator::start(&config, cancel.clone());
    let mut controller = Controller::new(&config, &communicator, cancel);
    controller.run(communicator.inbox());

    communicator.halt();
    communicator.join();
    info!("shut down gracefully");
}

/// Sequences a run from the machine's buttons and status reports.
struct Controller {
    uart: Sender<Command>,
    builder: Builder,
    cancel: CancelToken,
    efficiency_mode: bool,
    initialized: bool,
    in_progress: bool,
    paused: bool,
}

impl Controller {
    fn new(config: &AppConfiguration, communicator: &UartCommunicator, cancel: CancelToken) -> Self {
        Self {
            uart: communicator.sender(),
            builder: Builder::new(communicator.sender()),
            cancel,
            efficiency_mode: config.app.efficiency_mode,
            initialized: false,
            in_progress: false,
            paused: false,
        }
    }

    fn run(&mut self, inbox: &Receiver<Message>) {
        info!("entering controller loop");
        while !self.cancel.is_cancelled() {
            match inbox.recv_timeout(Duration::from_secs(1)) {
                Ok(message) => self.handle(message),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("exiting controller loop");
    }

    fn handle(&mut self, message: Message) {
        match message.command {
            Command::SendIoState(io) => self.handle_buttons(io),
            Command::ExecutionFinished(done) => {
                info!(
                    "finished command: {:?} (success: {})",
                    done.command, done.success
                );
                if done.command == CommandId::MoveLift && self.in_progress {
                    self.send(Command::GetState);
                }
            }
            Command::SendState(state) => self.handle_state(state),
            ref other => warn!("unexpected message in inbox: {:?}", other.id()),
        }
    }

    fn handle_buttons(&mut self, io: SendIoState) {
        if io.stop.clicked() {
            info!("pausing build");
            self.paused = true;
            self.send(Command::PauseBuild);
        } else if io.start.clicked() {
            if self.paused {
                info!("resuming build");
                self.paused = false;
                self.send(Command::ResumeBuild);
            } else if self.initialized {
                self.start_run();
            } else {
                self.initialize();
            }
        }
    }

    fn handle_state(&mut self, state: SendState) {
        let energy_wh = self.convert_energy(state.energy);
        info!(
            "state - energy: {energy_wh:.3}Wh, lift: {:?}, werni: {:?}",
            state.lift, state.werni
        );
        if state.lift == LiftState::Down {
            self.finish_run();
        }
    }

    /// First start click: prepare the machine for a run.
    fn initialize(&mut self) {
        info!("initializing machine");
        self.send(Command::PrimeMagazine);
        self.send(Command::MoveLift(MoveLift::Up));
        self.initialized = true;
    }

    fn start_run(&mut self) {
        if self.in_progress {
            warn!("run already in progress");
            return;
        }
        info!("starting new run");
        self.in_progress = true;
        self.builder.reset();
        self.send(Command::ResetEnergyMeasurement);

        // The recognizer is an external collaborator; until it delivers a
        // completed configuration this builds the machine's default layout,
        // matching the recognition-timeout fallback.
        self.builder
            .set_config(CubeConfiguration::default_layout().slots());
        self.builder.build(true);
    }

    fn finish_run(&mut self) {
        if !self.in_progress {
            warn!("no run in progress");
            return;
        }
        info!("finishing current run");
        self.initialized = false;
        self.in_progress = false;

        let uart = self.uart.clone();
        thread::spawn(move || {
            let _ = uart.send(Command::EnableBuzzer(BuzzerState::Enable));
            thread::sleep(Duration::from_secs(BUZZER_SECS));
            let _ = uart.send(Command::EnableBuzzer(BuzzerState::Disable));
        });
    }

    /// Converts the controller's watt-second counter into Wh; efficiency
    /// mode is scored at half the measured energy.
    fn convert_energy(&self, energy: f32) -> f32 {
        let multiplier = if self.efficiency_mode { 0.5 } else { 1.0 };
        (energy / 3600.0) * multiplier
    }

    fn send(&self, command: Command) {
        let _ = self.uart.send(command);
    }
}
