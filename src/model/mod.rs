mod commit;
mod evaluation;

pub use commit::CommitHash;
pub use evaluation::{EvaluationRecord, EvaluationSnapshot};
