#![deny(rust_2018_idioms, clippy::disallowed_methods, clippy::disallowed_types)]
#![forbid(unsafe_code)]

//! Canonical process descriptors for trace data.
//!
//! A [`Process`] identifies the service instance that emitted a span: a
//! service name plus a set of tags. Records are stored in a canonical
//! (sorted) form so that equality and the deterministic hash contribution
//! are independent of the order tags were supplied in. Downstream storage
//! relies on this to deduplicate process descriptors by content.

mod process;
mod tag;

pub use self::process::Process;
pub use self::tag::{KeyValue, TagValue, Tags};

use std::io;
use thiserror::Error;

/// A value whose contents can be written to a sink as a deterministic byte
/// stream.
///
/// Two values that compare equal must produce identical byte streams. The
/// write is fail-fast: the first sink error aborts the operation and no
/// further bytes are written. Bytes already written are not rolled back;
/// the sink is the caller's to manage.
pub trait Hashable {
    fn hash<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), WriteFailure>;
}

/// The sink rejected or failed a write during [`Hashable::hash`].
#[derive(Debug, Error)]
#[error("failed to write hash contribution: {0}")]
pub struct WriteFailure(#[from] io::Error);

impl WriteFailure {
    pub fn io_error(&self) -> &io::Error {
        &self.0
    }
}
