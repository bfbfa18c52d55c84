//! Format constants shared by the decoders and the writer.

/// Signature of an uncompressed file
pub const SIGNATURE_UNCOMPRESSED: &[u8; 3] = b"FWS";

/// Signature of a zlib-compressed file
pub const SIGNATURE_ZLIB: &[u8; 3] = b"CWS";

/// Signature of an LZMA-compressed file
pub const SIGNATURE_LZMA: &[u8; 3] = b"ZWS";

/// Signature, version and file length
pub const HEADER_PREFIX_SIZE: usize = 8;

/// Upper bound for buffer preallocation from a declared length
pub const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Short tag length value announcing a following 32-bit length
pub const LONG_TAG_LENGTH: u16 = 0x3F;

/// Number of bits of the tag header used for the length
pub const TAG_LENGTH_BITS: u16 = 6;

/// Style array count announcing a 16-bit extended count
pub const EXTENDED_STYLE_COUNT: u8 = 0xFF;

/// Maximum number of gradient control points
pub const MAX_GRADIENT_STOPS: usize = 15;

/// First movie version with UTF-8 strings
pub const FIRST_UTF8_VERSION: u8 = 6;

/// First movie version with the spread/interpolation gradient header
pub const FIRST_GRADIENT_MODES_VERSION: u8 = 8;

/// Glyph em square of DefineFont/DefineFont2 outlines
pub const EM_SQUARE: f32 = 1024.0;

/// Glyph em square of DefineFont3 outlines
pub const EM_SQUARE_HIGH_RES: f32 = 20480.0;

/// Sample rates selected by the 2-bit rate field
pub const SOUND_RATES: [u32; 4] = [5512, 11025, 22050, 44100];

/// Fill style type bytes
pub mod fill {
	/// Solid color
	pub const SOLID: u8 = 0x00;
	/// Linear gradient
	pub const LINEAR_GRADIENT: u8 = 0x10;
	/// Radial gradient
	pub const RADIAL_GRADIENT: u8 = 0x12;
	/// Focal radial gradient
	pub const FOCAL_GRADIENT: u8 = 0x13;
	/// Repeating, smoothed bitmap
	pub const REPEATING_BITMAP: u8 = 0x40;
	/// Clipped, smoothed bitmap
	pub const CLIPPED_BITMAP: u8 = 0x41;
	/// Repeating bitmap without smoothing
	pub const NON_SMOOTHED_REPEATING_BITMAP: u8 = 0x42;
	/// Clipped bitmap without smoothing
	pub const NON_SMOOTHED_CLIPPED_BITMAP: u8 = 0x43;
}

/// Lossless bitmap format bytes
pub mod lossless {
	/// 8-bit palette indices
	pub const COLOR_MAPPED: u8 = 3;
	/// 15-bit RGB
	pub const RGB15: u8 = 4;
	/// 24-bit RGB (32-bit with alpha in version 2)
	pub const RGB24: u8 = 5;
}
