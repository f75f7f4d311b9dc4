pub mod classifier;
pub mod config;
pub mod discovery;
pub mod events;
pub mod extractor;
pub mod fetcher;
pub mod filter;
pub mod geo;
pub mod outbound;
pub mod pipeline;
pub mod publisher;
pub mod roles;
pub mod run_manager;
pub mod storage;
pub mod types;

// Re-exports for clean API
pub use classifier::{Classifier, LexicalClassifier};
pub use config::ScoutConfig;
pub use events::{EventKind, EventSink, ProgressEvent};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use filter::{FilterContext, FilterInput, FilterResult};
pub use outbound::{DispatchError, HttpDispatcher, JobDispatcher, MockDispatcher};
pub use pipeline::Pipeline;
pub use publisher::{EventPublisher, Subscription};
pub use run_manager::{RunManager, StorageSink};
pub use storage::{PostgresScoutStorage, ScoutStorage};
pub use types::*;
