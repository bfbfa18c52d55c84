//! SWF decoding and playback.
//!
//! # Layers
//!
//! | Module       | Role                                                      |
//! |--------------|-----------------------------------------------------------|
//! | [`bits`]     | bit- and byte-granular reads                              |
//! | [`header`]   | signature, decompression, movie header                    |
//! | [`cursor`]   | tag framing, sprite scopes                                |
//! | [`records`]  | RECT, MATRIX, colors, color transforms, strings           |
//! | [`library`]  | shapes, fonts, text, sounds, bitmaps, sprites             |
//! | [`timeline`] | placed objects, frames, scenes, the playhead              |
//! | [`movie`]    | the top-level scan                                        |
//! | [`host`]     | renderer, audio and timer collaborators                   |
//! | [`writer`]   | encoder for building test and benchmark streams           |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use swiff_types::swf::{Movie, Playhead, SwfWriter, TagCode};
//!
//! let mut writer = SwfWriter::new(10);
//! writer.tag(TagCode::SetBackgroundColor, &[0x20, 0x40, 0x60]);
//! writer.show_frame();
//! writer.show_frame();
//!
//! let movie = Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap());
//! assert_eq!(movie.frame_count(), 2);
//!
//! let mut playhead = Playhead::new(Arc::clone(&movie));
//! playhead.goto_frame(1, false).unwrap();
//! assert!(playhead.placed_objects().is_empty());
//! ```

pub mod bits;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod header;
pub mod host;
pub mod library;
pub mod movie;
pub mod parse_config;
pub mod records;
pub mod tag;
pub mod timeline;
pub mod writer;

#[cfg(test)]
mod tests;

pub use bits::BitReader;
pub use cursor::TagCursor;
pub use error::{Diagnostic, ErrorKind, SwfError};
pub use header::{Compression, Header, decompress};
pub use host::{AudioOutput, HeadlessHost, Host, RenderContext, RenderDelegate, Renderer, dispatch_sounds, render_frame};
pub use library::{
	Definition, DefinitionKind, Library, LibraryBuilder,
	bitmap::Bitmap,
	font::{Font, FontBuilder, FontTag},
	shape::{FillStyle, LineStyle, Path, PathOp, Shape},
	sound::{Sound, SoundEvent, SoundInfo},
	sprite::Sprite,
	text::{DynamicText, StaticText},
};
pub use movie::{FileAttributes, Movie, MovieSummary};
pub use parse_config::ParseConfig;
pub use records::{Color, ColorTransform, Matrix, Rect, Twips};
pub use tag::{Tag, TagCode};
pub use timeline::{
	Timeline, TimelineBuilder,
	frame::{Frame, FrameLabel},
	placed::{PlaceAction, PlacedObject, Placement, Removal},
	playhead::{FrameRef, FrameUpdate, PlayState, Playhead, PlayheadDelegate, SeekTarget, UpdateCause},
	scene::Scene,
};
pub use writer::{BitWriter, SwfWriter, TagStream};
