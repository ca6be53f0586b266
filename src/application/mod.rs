pub mod events;
pub mod orchestrator;
pub mod resolver;
pub mod selector;
pub mod session;
pub mod transfer;

pub use events::{EngineEvent, EventSink};
pub use orchestrator::DownloadOrchestrator;
pub use resolver::{classify, SourceResolver, DEFAULT_COLLECTION_MARKER};
pub use selector::{select, Selection};
pub use session::{ControlState, SessionControl};
pub use transfer::TransferController;
