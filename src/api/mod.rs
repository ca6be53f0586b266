pub mod client;
pub mod models;
pub mod ytdlp;

pub use client::{ApiClient, ApiError, HttpSource, Result};
pub use models::ApiConfig;
pub use ytdlp::YtDlpResolver;
