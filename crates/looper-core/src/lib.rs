//! Copy files out of a watched directory once they stop growing, verify the
//! copy by checksum, and remember what was copied in an append-only ledger.

pub mod config;
pub mod logging;

pub mod checksum;
pub mod error;
pub mod ledger;
pub mod poller;
pub mod probe;
pub mod report;
pub mod scan;
pub mod stop;
pub mod verify;

pub use error::{LooperError, Result};
pub use scan::{CycleSummary, Looper};
