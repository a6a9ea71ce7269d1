pub mod builder;
pub mod cancel;
pub mod codec;
pub mod communicator;
pub mod config;
pub mod cube;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod reader;
pub mod writer;

pub use builder::{Builder, RotationTracker};
pub use cancel::CancelToken;
pub use communicator::UartCommunicator;
pub use config::{AppConfiguration, ConfigError};
pub use cube::{CubeColor, CubeConfiguration, CubeState};
pub use error::WireError;
pub use frame::FrameSplitter;
pub use protocol::{Command, CommandId, Message};
