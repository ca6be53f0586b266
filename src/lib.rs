pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod utils;

pub use application::{DownloadOrchestrator, EngineEvent, EventSink, SourceResolver};
pub use config::EngineConfig;
pub use domain::{AppError, DownloadRequest, ErrorKind, Resolution, SessionReport};
