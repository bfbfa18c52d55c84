//! This crate provides the SWF decoder, definition library and timeline playback for
//! the `swiff-rs` project.
//!
//! # Parts
//!
//! - **Bitstream**: [`swf::BitReader`] and [`swf::TagCursor`] read bit fields, fixed-point
//!   values and length-framed tags from a decompressed movie buffer
//! - **Library**: shapes, fonts, text, sounds, bitmaps and sprites keyed by library ID
//! - **Timeline**: frames built from PlaceObject/RemoveObject tags, scenes and labels
//! - **Playhead**: seek, step and loop over a movie or sprite timeline
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use swiff_types::prelude::*;
//!
//! # fn main() -> Result<(), SwfError> {
//! let movie = Movie::open("movie.swf")?;
//! println!("{}", movie.header());
//! for diagnostic in movie.diagnostics() {
//!     println!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use swiff_types::swf::{Movie, ParseConfig};
//!
//! let config = ParseConfig::with_legacy_encoding_label("shift_jis").unwrap();
//! let data = std::fs::read("old_movie.swf").unwrap();
//! let movie = Movie::from_bytes_with_config(&data, &config).unwrap();
//! ```

pub mod swf;

/// `use swiff_types::prelude::*;` to import commonly used items.
pub mod prelude;
