pub mod analysis;
pub mod ast;
pub mod changes;
pub mod clustering;
pub mod config;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod progress;
pub mod selection;
pub mod storage;

pub use config::AppConfig;
pub use engine::{ClusteringEngine, ClusteringResult, PairFailure};
pub use error::{Error, Result};
pub use model::{Dataset, Solution, Verdict};
pub use progress::{ProgressReporter, SilentReporter};
