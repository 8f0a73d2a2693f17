pub mod config;

pub use config::{Config, ReceiverConfig, SenderConfig, DEFAULT_PORT};
