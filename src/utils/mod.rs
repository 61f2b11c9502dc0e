//! Small shared helpers

mod retry;

pub use retry::with_retry;
