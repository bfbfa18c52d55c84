//! Compound records embedded in tag bodies.
//!
//! ## RECT
//!
//! ```text
//! Field   Type        Comment
//! ------  ----------  ---------------------------------
//! Nbits   UB[5]       width of each following field
//! Xmin    SB[Nbits]   twips
//! Xmax    SB[Nbits]
//! Ymin    SB[Nbits]
//! Ymax    SB[Nbits]
//! (byte aligned afterwards)
//! ```
//!
//! ## MATRIX
//!
//! ```text
//! HasScale        UB[1]
//!   NScaleBits    UB[5]       if HasScale
//!   ScaleX/Y      FB[NScale]  16.16 fixed
//! HasRotate       UB[1]
//!   NRotateBits   UB[5]       if HasRotate
//!   Skew0/1       FB[NRotate]
//! NTranslateBits  UB[5]
//! TranslateX/Y    SB[NTrans]  twips
//! ```
//!
//! ## CXFORM / CXFORMWITHALPHA
//!
//! ```text
//! HasAddTerms   UB[1]
//! HasMultTerms  UB[1]
//! Nbits         UB[4]
//! Mult R,G,B(,A) SB[Nbits]   if HasMultTerms, 8.8 fixed
//! Add  R,G,B(,A) SB[Nbits]   if HasAddTerms, 8.8 fixed
//! ```
//!
//! Color channels are normalized to `0.0..=1.0`, so add terms use the same 8.8 scale.
//!
//! ## Strings
//!
//! Movies of version 6 and later store UTF-8. Older movies use a configurable legacy
//! encoding ([`crate::swf::ParseConfig::legacy_encoding`]). Null-terminated,
//! length-prefixed, and caller-length strings are separate entry points.

use std::fmt::Display;

use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};

use super::{bits::BitReader, error::SwfError};

/// Twentieths of a pixel.
pub type Twips = i32;

/// Number of twips per pixel.
pub const TWIPS_PER_PIXEL: f32 = 20.0;

/// Axis-aligned rectangle in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Rect {
	/// Left edge
	pub x_min: Twips,
	/// Right edge
	pub x_max: Twips,
	/// Top edge
	pub y_min: Twips,
	/// Bottom edge
	pub y_max: Twips,
}

impl Rect {
	/// Creates a rectangle from its edges.
	pub fn new(x_min: Twips, x_max: Twips, y_min: Twips, y_max: Twips) -> Self {
		Self {
			x_min,
			x_max,
			y_min,
			y_max,
		}
	}

	/// Reads a RECT record and byte-aligns the reader.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if the record runs past the reader's limit.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let nbits = reader.read_ubits(5)?;
		let x_min = reader.read_sbits(nbits)?;
		let x_max = reader.read_sbits(nbits)?;
		let y_min = reader.read_sbits(nbits)?;
		let y_max = reader.read_sbits(nbits)?;
		reader.byte_align();
		Ok(Self {
			x_min,
			x_max,
			y_min,
			y_max,
		})
	}

	/// Width in twips.
	pub fn width(&self) -> Twips {
		self.x_max - self.x_min
	}

	/// Height in twips.
	pub fn height(&self) -> Twips {
		self.y_max - self.y_min
	}

	/// Returns `true` when the rectangle has no area.
	pub fn is_empty(&self) -> bool {
		self.width() <= 0 || self.height() <= 0
	}

	/// Smallest rectangle containing a single point.
	pub fn from_point(x: Twips, y: Twips) -> Self {
		Self::new(x, x, y, y)
	}

	/// Grows the rectangle to contain a point.
	pub fn include(&mut self, x: Twips, y: Twips) {
		self.x_min = self.x_min.min(x);
		self.x_max = self.x_max.max(x);
		self.y_min = self.y_min.min(y);
		self.y_max = self.y_max.max(y);
	}

	/// Smallest rectangle containing both.
	pub fn union(&self, other: &Rect) -> Rect {
		Rect::new(
			self.x_min.min(other.x_min),
			self.x_max.max(other.x_max),
			self.y_min.min(other.y_min),
			self.y_max.max(other.y_max),
		)
	}

	/// Grows every edge outward by `amount` twips.
	pub fn inflate(&self, amount: Twips) -> Rect {
		Rect::new(self.x_min - amount, self.x_max + amount, self.y_min - amount, self.y_max + amount)
	}

	/// Size in pixels as `(width, height)`.
	pub fn size_in_pixels(&self) -> (f32, f32) {
		(self.width() as f32 / TWIPS_PER_PIXEL, self.height() as f32 / TWIPS_PER_PIXEL)
	}
}

impl Display for Rect {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}, {})-({}, {})", self.x_min, self.y_min, self.x_max, self.y_max)
	}
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
	/// Red
	pub r: u8,
	/// Green
	pub g: u8,
	/// Blue
	pub b: u8,
	/// Alpha, 255 is opaque
	pub a: u8,
}

impl Default for Color {
	fn default() -> Self {
		Self::BLACK
	}
}

impl Color {
	/// Opaque black.
	pub const BLACK: Color = Color::rgb(0, 0, 0);
	/// Opaque white.
	pub const WHITE: Color = Color::rgb(255, 255, 255);

	/// Opaque color from components.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self {
			r,
			g,
			b,
			a: 255,
		}
	}

	/// Reads an RGB record (alpha is opaque).
	pub fn read_rgb(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let r = reader.read_u8()?;
		let g = reader.read_u8()?;
		let b = reader.read_u8()?;
		Ok(Color::rgb(r, g, b))
	}

	/// Reads an RGBA record.
	pub fn read_rgba(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let r = reader.read_u8()?;
		let g = reader.read_u8()?;
		let b = reader.read_u8()?;
		let a = reader.read_u8()?;
		Ok(Self {
			r,
			g,
			b,
			a,
		})
	}

	/// Reads an ARGB record.
	pub fn read_argb(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let a = reader.read_u8()?;
		let r = reader.read_u8()?;
		let g = reader.read_u8()?;
		let b = reader.read_u8()?;
		Ok(Self {
			r,
			g,
			b,
			a,
		})
	}

	/// Reads RGBA when `with_alpha`, otherwise RGB.
	pub fn read(reader: &mut BitReader<'_>, with_alpha: bool) -> Result<Self, SwfError> {
		if with_alpha {
			Self::read_rgba(reader)
		} else {
			Self::read_rgb(reader)
		}
	}

	/// Components as normalized floats `[r, g, b, a]`.
	pub fn to_normalized(&self) -> [f32; 4] {
		[
			f32::from(self.r) / 255.0,
			f32::from(self.g) / 255.0,
			f32::from(self.b) / 255.0,
			f32::from(self.a) / 255.0,
		]
	}
}

impl Display for Color {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
	}
}

/// 2D affine transform. Scale and skew are unitless, translation is in twips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
	/// Horizontal scale (a)
	pub scale_x: f32,
	/// Vertical skew (b)
	pub rotate_skew0: f32,
	/// Horizontal skew (c)
	pub rotate_skew1: f32,
	/// Vertical scale (d)
	pub scale_y: f32,
	/// Horizontal translation (tx)
	pub translate_x: Twips,
	/// Vertical translation (ty)
	pub translate_y: Twips,
}

impl Default for Matrix {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Matrix {
	/// The identity transform.
	pub const IDENTITY: Matrix = Matrix {
		scale_x: 1.0,
		rotate_skew0: 0.0,
		rotate_skew1: 0.0,
		scale_y: 1.0,
		translate_x: 0,
		translate_y: 0,
	};

	/// Pure translation.
	pub fn translate(x: Twips, y: Twips) -> Self {
		Self {
			translate_x: x,
			translate_y: y,
			..Self::IDENTITY
		}
	}

	/// Reads a MATRIX record. Aligns before and after.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if the record runs past the reader's limit.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		reader.byte_align();
		let mut matrix = Matrix::IDENTITY;

		if reader.read_bit()? {
			let nbits = reader.read_ubits(5)?;
			matrix.scale_x = reader.read_fbits(nbits)?;
			matrix.scale_y = reader.read_fbits(nbits)?;
		}
		if reader.read_bit()? {
			let nbits = reader.read_ubits(5)?;
			matrix.rotate_skew0 = reader.read_fbits(nbits)?;
			matrix.rotate_skew1 = reader.read_fbits(nbits)?;
		}
		let nbits = reader.read_ubits(5)?;
		matrix.translate_x = reader.read_sbits(nbits)?;
		matrix.translate_y = reader.read_sbits(nbits)?;

		reader.byte_align();
		Ok(matrix)
	}

	/// Returns `true` for the identity transform.
	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Maps a point in twips through the transform.
	pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
		(
			self.scale_x * x + self.rotate_skew1 * y + self.translate_x as f32,
			self.rotate_skew0 * x + self.scale_y * y + self.translate_y as f32,
		)
	}

	/// `self` applied after `inner`.
	pub fn concat(&self, inner: &Matrix) -> Matrix {
		let (tx, ty) = self.transform_point(inner.translate_x as f32, inner.translate_y as f32);
		Matrix {
			scale_x: self.scale_x * inner.scale_x + self.rotate_skew1 * inner.rotate_skew0,
			rotate_skew0: self.rotate_skew0 * inner.scale_x + self.scale_y * inner.rotate_skew0,
			rotate_skew1: self.scale_x * inner.rotate_skew1 + self.rotate_skew1 * inner.scale_y,
			scale_y: self.rotate_skew0 * inner.rotate_skew1 + self.scale_y * inner.scale_y,
			translate_x: tx.round() as Twips,
			translate_y: ty.round() as Twips,
		}
	}
}

/// Per-channel multiply and add terms, `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTransform {
	/// Multiply terms
	pub multiply: [f32; 4],
	/// Add terms on normalized channels
	pub add: [f32; 4],
}

impl Default for ColorTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ColorTransform {
	/// Multiply by one, add zero.
	pub const IDENTITY: ColorTransform = ColorTransform {
		multiply: [1.0; 4],
		add: [0.0; 4],
	};

	/// Reads a CXFORM record (no alpha terms).
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if the record runs past the reader's limit.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		Self::read_terms(reader, 3)
	}

	/// Reads a CXFORMWITHALPHA record.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if the record runs past the reader's limit.
	pub fn read_with_alpha(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		Self::read_terms(reader, 4)
	}

	fn read_terms(reader: &mut BitReader<'_>, channels: usize) -> Result<Self, SwfError> {
		reader.byte_align();
		let has_add = reader.read_bit()?;
		let has_mult = reader.read_bit()?;
		let nbits = reader.read_ubits(4)?;

		let mut transform = ColorTransform::IDENTITY;
		if has_mult {
			for term in transform.multiply.iter_mut().take(channels) {
				*term = reader.read_sbits(nbits)? as f32 / 256.0;
			}
		}
		if has_add {
			for term in transform.add.iter_mut().take(channels) {
				*term = reader.read_sbits(nbits)? as f32 / 256.0;
			}
		}
		reader.byte_align();
		Ok(transform)
	}

	/// Returns `true` for the identity transform.
	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Applies the transform to a color, clamping every channel.
	pub fn apply(&self, color: Color) -> Color {
		let input = color.to_normalized();
		let mut out = [0u8; 4];
		for (i, channel) in out.iter_mut().enumerate() {
			let value = input[i] * self.multiply[i] + self.add[i];
			*channel = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
		}
		Color {
			r: out[0],
			g: out[1],
			b: out[2],
			a: out[3],
		}
	}

	/// `self` applied after `inner`.
	pub fn concat(&self, inner: &ColorTransform) -> ColorTransform {
		let mut result = ColorTransform::IDENTITY;
		for i in 0..4 {
			result.multiply[i] = self.multiply[i] * inner.multiply[i];
			result.add[i] = self.multiply[i] * inner.add[i] + self.add[i];
		}
		result
	}
}

/// Picks the encoding for STRING fields in a movie of the given version.
pub fn string_encoding(version: u8, legacy: &'static Encoding) -> &'static Encoding {
	if version >= 6 {
		UTF_8
	} else {
		legacy
	}
}

fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> String {
	let (text, _, had_errors) = encoding.decode(bytes);
	if had_errors {
		log::debug!("replaced invalid {} sequences in string", encoding.name());
	}
	text.into_owned()
}

/// Reads a null-terminated string.
///
/// # Errors
///
/// Returns [`SwfError::Truncated`] if no terminator appears before the reader's limit.
pub fn read_string(reader: &mut BitReader<'_>, encoding: &'static Encoding) -> Result<String, SwfError> {
	let start = reader.position();
	let end = reader.limit();
	let window = &reader.data()[start.min(end)..end];
	let Some(len) = window.iter().position(|&b| b == 0) else {
		return Err(SwfError::Truncated {
			offset: start,
			needed: 1,
		});
	};
	let bytes = reader.read_bytes(len)?;
	reader.advance(1)?;
	Ok(decode_bytes(bytes, encoding))
}

/// Reads a string prefixed by a one-byte length.
///
/// A trailing null inside the counted bytes is dropped.
pub fn read_length_prefixed_string(
	reader: &mut BitReader<'_>,
	encoding: &'static Encoding,
) -> Result<String, SwfError> {
	let start = reader.position();
	let len = usize::from(reader.read_u8()?);
	match read_string_with_length(reader, len, encoding) {
		Ok(text) => Ok(text),
		Err(err) => {
			reader.seek(start);
			Err(err)
		}
	}
}

/// Reads exactly `len` bytes as a string; a trailing null is dropped.
pub fn read_string_with_length(
	reader: &mut BitReader<'_>,
	len: usize,
	encoding: &'static Encoding,
) -> Result<String, SwfError> {
	let mut bytes = reader.read_bytes(len)?;
	if let Some((&0, rest)) = bytes.split_last() {
		bytes = rest;
	}
	Ok(decode_bytes(bytes, encoding))
}
