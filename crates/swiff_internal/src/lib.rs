//! This module is separated into its own crate to enable simple dynamic linking for `swiff`, and should not be used directly.

/// `use swiff::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export swiff_types for convenience
pub use swiff_types;

// Re-export commonly used types at crate root
pub use swiff_types::swf::{Diagnostic, ErrorKind, Movie, ParseConfig, Playhead, SwfError};
