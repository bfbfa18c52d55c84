//! Prelude module for `swiff_types`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use swiff_types::prelude::*;
//!
//! let movie = Arc::new(Movie::open("movie.swf").unwrap());
//! let mut playhead = Playhead::new(movie);
//! playhead.play();
//! ```

// Movie and errors
#[doc(inline)]
pub use crate::swf::{Diagnostic, ErrorKind, Movie, MovieSummary, ParseConfig, SwfError};

// Library
#[doc(inline)]
pub use crate::swf::{
	Bitmap, Definition, DefinitionKind, DynamicText, Font, Library, Shape, Sound, Sprite, StaticText,
};

// Timeline and playback
#[doc(inline)]
pub use crate::swf::{
	Frame, PlayState, PlacedObject, Playhead, PlayheadDelegate, Scene, SeekTarget, Timeline,
};

// Collaborators
#[doc(inline)]
pub use crate::swf::{AudioOutput, HeadlessHost, Host, RenderContext, RenderDelegate, Renderer};

// Records and encoding
#[doc(inline)]
pub use crate::swf::{Color, ColorTransform, Matrix, Rect, SwfWriter, TagCode};

// Re-export the swf module for advanced usage
#[doc(inline)]
pub use crate::swf;
