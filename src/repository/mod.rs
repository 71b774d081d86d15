mod atomic;
mod bisect;
mod graph;
mod history;
mod store;

pub use bisect::{BisectInterval, BisectRangeResolver, BisectTerms};
pub use graph::CommitGraph;
pub use history::{decode as decode_history, encode as encode_history, HistoryFile};
pub use store::{EvaluationStore, MemoryStore};
