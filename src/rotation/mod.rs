//! File rotation
//!
//! - `sequence`: suffix discovery for fixed-name targets
//! - `policy`: size/time rotation decisions
//! - `target`: output locations and file naming
//! - `timer`: the recurring time-mode rotation signal

mod policy;
mod sequence;
mod target;
mod timer;

pub use policy::{RotationConfig, RotationPolicy};
pub use sequence::{
    format_suffix, max_suffix, parse_suffix, read_dir_names, SequenceAllocator, MIN_SUFFIX_WIDTH,
};
pub use target::{
    normalize_extension, sanitize_component, FileNamer, RotationTarget, DEFAULT_DATED_EXTENSION,
    DEFAULT_EXTENSION, RANDOM_TAG_BYTES,
};
pub use timer::RotationTimer;
