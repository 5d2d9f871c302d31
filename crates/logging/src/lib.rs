//! A `Logger` trait threaded by reference instead of free functions over
//! hidden global state.
#![deny(missing_docs)]

mod capturing;
mod level;
mod logger;

pub use capturing::CapturingLogger;
pub use level::LogLevel;
pub use logger::{Fatal, Logger, TracingLogger};
