//! Tag codes and the code → (base, version) split table.
//!
//! Several SWF tags are numbered revisions of one behavior: `DefineShape3` is a
//! `DefineShape` of version 3, `PlaceObject2` a `PlaceObject` of version 2. Decoders are
//! keyed on the base code and branch on `version >= N`.

use std::{fmt::Display, ops::Range};

macro_rules! tag_codes {
	($($(#[$meta:meta])* $name:ident = $value:expr,)*) => {
		/// Every tag code this crate knows about.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
		#[repr(u16)]
		pub enum TagCode {
			$($(#[$meta])* $name = $value,)*
		}

		impl TagCode {
			/// Maps a raw tag code to a known [`TagCode`].
			pub fn from_u16(code: u16) -> Option<Self> {
				match code {
					$($value => Some(TagCode::$name),)*
					_ => None,
				}
			}

			/// Tag name as it appears in the format documentation.
			pub fn name(&self) -> &'static str {
				match self {
					$(TagCode::$name => stringify!($name),)*
				}
			}
		}
	};
}

tag_codes! {
	/// End of a tag stream
	End = 0,
	/// Frame boundary
	ShowFrame = 1,
	/// Shape definition
	DefineShape = 2,
	/// Place a character (full replacement)
	PlaceObject = 4,
	/// Remove a character at a depth
	RemoveObject = 5,
	/// JPEG image using shared tables
	DefineBits = 6,
	/// Button definition
	DefineButton = 7,
	/// Shared JPEG encoding tables
	JpegTables = 8,
	/// Stage background color
	SetBackgroundColor = 9,
	/// Glyph outlines
	DefineFont = 10,
	/// Static text
	DefineText = 11,
	/// Frame actions
	DoAction = 12,
	/// Font name and code table
	DefineFontInfo = 13,
	/// Event sound
	DefineSound = 14,
	/// Start an event sound
	StartSound = 15,
	/// Button sounds
	DefineButtonSound = 17,
	/// Streaming sound header
	SoundStreamHead = 18,
	/// Streaming sound data for one frame
	SoundStreamBlock = 19,
	/// Lossless bitmap
	DefineBitsLossless = 20,
	/// Complete JPEG
	DefineBitsJpeg2 = 21,
	/// Shape with extended style counts
	DefineShape2 = 22,
	/// Button color transform
	DefineButtonCxform = 23,
	/// Editing protection marker
	Protect = 24,
	/// Partial placement update
	PlaceObject2 = 26,
	/// Remove by depth only
	RemoveObject2 = 28,
	/// Shape with alpha colors
	DefineShape3 = 32,
	/// Static text with alpha colors
	DefineText2 = 33,
	/// Button with actions
	DefineButton2 = 34,
	/// JPEG with alpha channel
	DefineBitsJpeg3 = 35,
	/// Lossless bitmap with alpha
	DefineBitsLossless2 = 36,
	/// Dynamic text field
	DefineEditText = 37,
	/// Nested timeline
	DefineSprite = 39,
	/// Frame label
	FrameLabel = 43,
	/// Streaming sound header, any format
	SoundStreamHead2 = 45,
	/// Morph shape
	DefineMorphShape = 46,
	/// Font with layout
	DefineFont2 = 48,
	/// Exported symbol names
	ExportAssets = 56,
	/// Imported symbols
	ImportAssets = 57,
	/// Debugger password
	EnableDebugger = 58,
	/// One-time sprite actions
	DoInitAction = 59,
	/// Video stream definition
	DefineVideoStream = 60,
	/// Video frame payload
	VideoFrame = 61,
	/// Font info with language code
	DefineFontInfo2 = 62,
	/// Debugger password, version 2
	EnableDebugger2 = 64,
	/// Script recursion and timeout limits
	ScriptLimits = 65,
	/// Tab order
	SetTabIndex = 66,
	/// File-level feature flags
	FileAttributes = 69,
	/// Placement with filters and blend modes
	PlaceObject3 = 70,
	/// Imported symbols, version 2
	ImportAssets2 = 71,
	/// Font alignment zones
	DefineFontAlignZones = 73,
	/// Text rendering settings
	CsmTextSettings = 74,
	/// Font with 20x resolution glyphs
	DefineFont3 = 75,
	/// Class names for characters
	SymbolClass = 76,
	/// XMP metadata
	Metadata = 77,
	/// 9-slice grid
	DefineScalingGrid = 78,
	/// ActionScript 3 bytecode
	DoAbc = 82,
	/// Shape with line style extensions
	DefineShape4 = 83,
	/// Morph shape with line style extensions
	DefineMorphShape2 = 84,
	/// Scene and frame label table
	DefineSceneAndFrameLabelData = 86,
	/// Opaque binary payload
	DefineBinaryData = 87,
	/// Font name and copyright
	DefineFontName = 88,
	/// Start a sound by class name
	StartSound2 = 89,
	/// JPEG with alpha and deblocking
	DefineBitsJpeg4 = 90,
	/// CFF font
	DefineFont4 = 91,
}

impl TagCode {
	/// Splits a versioned variant into its base code and version number.
	///
	/// Base codes are version 1.
	///
	/// # Examples
	///
	/// ```
	/// use swiff_types::swf::TagCode;
	///
	/// assert_eq!(TagCode::DefineShape3.split(), (TagCode::DefineShape, 3));
	/// assert_eq!(TagCode::ShowFrame.split(), (TagCode::ShowFrame, 1));
	/// ```
	pub fn split(self) -> (TagCode, u8) {
		match self {
			TagCode::DefineBitsJpeg2 => (TagCode::DefineBits, 2),
			TagCode::DefineBitsJpeg3 => (TagCode::DefineBits, 3),
			TagCode::DefineBitsJpeg4 => (TagCode::DefineBits, 4),
			TagCode::DefineShape2 => (TagCode::DefineShape, 2),
			TagCode::DefineShape3 => (TagCode::DefineShape, 3),
			TagCode::DefineShape4 => (TagCode::DefineShape, 4),
			TagCode::PlaceObject2 => (TagCode::PlaceObject, 2),
			TagCode::PlaceObject3 => (TagCode::PlaceObject, 3),
			TagCode::RemoveObject2 => (TagCode::RemoveObject, 2),
			TagCode::DefineText2 => (TagCode::DefineText, 2),
			TagCode::DefineButton2 => (TagCode::DefineButton, 2),
			TagCode::DefineBitsLossless2 => (TagCode::DefineBitsLossless, 2),
			TagCode::SoundStreamHead2 => (TagCode::SoundStreamHead, 2),
			TagCode::DefineMorphShape2 => (TagCode::DefineMorphShape, 2),
			TagCode::DefineFont2 => (TagCode::DefineFont, 2),
			TagCode::DefineFont3 => (TagCode::DefineFont, 3),
			TagCode::DefineFont4 => (TagCode::DefineFont, 4),
			TagCode::DefineFontInfo2 => (TagCode::DefineFontInfo, 2),
			TagCode::EnableDebugger2 => (TagCode::EnableDebugger, 2),
			TagCode::ImportAssets2 => (TagCode::ImportAssets, 2),
			TagCode::StartSound2 => (TagCode::StartSound, 2),
			other => (other, 1),
		}
	}
}

impl Display for TagCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// The tag the cursor is currently positioned in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
	/// Raw 10-bit tag code
	pub raw_code: u16,
	/// Base code after splitting, `None` for unknown codes
	pub code: Option<TagCode>,
	/// Version derived from the raw code
	pub version: u8,
	/// Offset of the tag header
	pub header_offset: usize,
	/// Byte range of the tag body within the movie buffer
	pub body: Range<usize>,
}

impl Tag {
	/// Builds a tag view from its raw header fields.
	pub fn new(raw_code: u16, header_offset: usize, body: Range<usize>) -> Self {
		let (code, version) = match TagCode::from_u16(raw_code) {
			Some(known) => {
				let (base, version) = known.split();
				(Some(base), version)
			}
			None => (None, 1),
		};
		Self {
			raw_code,
			code,
			version,
			header_offset,
			body,
		}
	}

	/// The unsplit code, e.g. `DefineShape3` rather than `DefineShape`.
	pub fn full_code(&self) -> Option<TagCode> {
		TagCode::from_u16(self.raw_code)
	}

	/// Body length in bytes.
	pub fn len(&self) -> usize {
		self.body.len()
	}

	/// Returns `true` when the body is empty.
	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}
}

impl Display for Tag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.full_code() {
			Some(code) => write!(f, "{code}")?,
			None => write!(f, "Unknown({})", self.raw_code)?,
		}
		write!(f, " @{:#x} ({} bytes)", self.header_offset, self.body.len())
	}
}
