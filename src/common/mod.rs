mod config;
mod error;
pub(crate) mod io;
mod logger;
mod types;

pub use config::*;
pub use error::{ErrorKind, Result, SlotDbError};
pub use logger::{default_logger, LogLevel, Logger, NullLogger, TracingLogger};
pub use types::{PageId, SlotId};

#[cfg(test)]
pub(crate) use logger::testing;
