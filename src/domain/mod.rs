pub mod error;
pub mod model;

pub use error::{AppError, ErrorKind};
pub use model::{
    ByteSource, ByteStream, Collection, DownloadPhase, DownloadRequest, ItemDescriptor,
    Resolution, SessionReport, SourceKind, StreamVariant, TransferOutcome,
};
