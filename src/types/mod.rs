//! Data types shared by the reporter subsystems

mod entry;
mod payload;

pub use entry::QueueEntry;
pub use payload::{ObjectRef, Payload};
