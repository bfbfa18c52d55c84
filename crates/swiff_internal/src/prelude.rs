//! Prelude module for `swiff_internal`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```rust
//! use swiff_internal::prelude::*;
//!
//! let mut writer = SwfWriter::new(8);
//! writer.show_frame();
//! let movie = Movie::from_bytes(&writer.finish().unwrap()).unwrap();
//! assert_eq!(movie.frame_count(), 1);
//! ```

// Re-export everything from swiff_types::prelude
#[doc(inline)]
pub use swiff_types::prelude::*;

// Re-export the entire swiff_types module for advanced usage
#[doc(inline)]
pub use swiff_types;
