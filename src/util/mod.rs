mod format;

pub use format::{format_age, format_timestamp};
