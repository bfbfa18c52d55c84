//! Reciprocal encoder for the records and tag framing read by [`super::bits`] and
//! [`super::cursor`].
//!
//! The writer is deliberately thin: it knows field widths and framing, not definitions.
//! Higher-level tag bodies are assembled by callers from these primitives.

use std::io::Write;

use flate2::write::ZlibEncoder;

use super::{
	constants,
	error::SwfError,
	header::Compression,
	records::{Color, ColorTransform, Matrix, Rect},
	tag::TagCode,
};

/// Number of bits needed to store `value` as UB.
pub fn count_ubits(value: u32) -> u32 {
	32 - value.leading_zeros()
}

/// Number of bits needed to store `value` as SB.
pub fn count_sbits(value: i32) -> u32 {
	if value == 0 {
		return 0;
	}
	let magnitude = if value < 0 {
		!value
	} else {
		value
	};
	33 - magnitude.leading_zeros()
}

fn max_sbits(values: &[i32]) -> u32 {
	values.iter().map(|&v| count_sbits(v)).max().unwrap_or(0)
}

fn to_fixed16(value: f32) -> i32 {
	(f64::from(value) * 65536.0).round() as i32
}

/// MSB-first bit writer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
	data: Vec<u8>,
	bit_buffer: u8,
	bits_in_buffer: u32,
}

impl BitWriter {
	/// Creates an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Writes the low `n` bits of `value`, MSB first.
	pub fn write_ubits(&mut self, value: u32, n: u32) {
		for i in (0..n.min(32)).rev() {
			let bit = ((value >> i) & 1) as u8;
			self.bit_buffer = (self.bit_buffer << 1) | bit;
			self.bits_in_buffer += 1;

			if self.bits_in_buffer == 8 {
				self.data.push(self.bit_buffer);
				self.bit_buffer = 0;
				self.bits_in_buffer = 0;
			}
		}
	}

	/// Writes the low `n` bits of a two's complement value.
	pub fn write_sbits(&mut self, value: i32, n: u32) {
		self.write_ubits(value as u32, n);
	}

	/// Writes a 16.16 fixed-point value in `n` bits.
	pub fn write_fbits(&mut self, value: f32, n: u32) {
		self.write_sbits(to_fixed16(value), n);
	}

	/// Writes a single flag bit.
	pub fn write_bit(&mut self, value: bool) {
		self.write_ubits(u32::from(value), 1);
	}

	/// Pads the pending byte with zero bits.
	pub fn byte_align(&mut self) {
		if self.bits_in_buffer > 0 {
			let pad = 8 - self.bits_in_buffer;
			self.write_ubits(0, pad);
		}
	}

	/// Writes one byte, aligning first.
	pub fn write_u8(&mut self, value: u8) {
		self.byte_align();
		self.data.push(value);
	}

	/// Writes a little-endian `u16`.
	pub fn write_u16(&mut self, value: u16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `u32`.
	pub fn write_u32(&mut self, value: u32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `i16`.
	pub fn write_i16(&mut self, value: i16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `i32`.
	pub fn write_i32(&mut self, value: i32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes an 8.8 fixed-point value.
	pub fn write_fixed8(&mut self, value: f32) {
		self.write_i16((value * 256.0).round() as i16);
	}

	/// Writes a 16.16 fixed-point value.
	pub fn write_fixed16(&mut self, value: f32) {
		self.write_i32(to_fixed16(value));
	}

	/// Writes an IEEE single-precision float.
	pub fn write_f32(&mut self, value: f32) {
		self.write_u32(value.to_bits());
	}

	/// Writes a variable-length `u32`.
	pub fn write_encoded_u32(&mut self, mut value: u32) {
		self.byte_align();
		loop {
			let group = (value & 0x7F) as u8;
			value >>= 7;
			if value == 0 {
				self.data.push(group);
				break;
			}
			self.data.push(group | 0x80);
		}
	}

	/// Writes raw bytes, aligning first.
	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.byte_align();
		self.data.extend_from_slice(bytes);
	}

	/// Writes a null-terminated UTF-8 string.
	pub fn write_string(&mut self, value: &str) {
		self.write_bytes(value.as_bytes());
		self.data.push(0);
	}

	/// Writes a RECT record with the smallest field width.
	///
	/// Field widths are capped at 31 bits, the largest the 5-bit prefix can express.
	pub fn write_rect(&mut self, rect: &Rect) {
		let fields = [rect.x_min, rect.x_max, rect.y_min, rect.y_max];
		let nbits = max_sbits(&fields).min(31);
		self.write_ubits(nbits, 5);
		for field in fields {
			self.write_sbits(field, nbits);
		}
		self.byte_align();
	}

	/// Writes a MATRIX record, omitting identity scale and zero skew.
	pub fn write_matrix(&mut self, matrix: &Matrix) {
		self.byte_align();

		let has_scale = matrix.scale_x != 1.0 || matrix.scale_y != 1.0;
		self.write_bit(has_scale);
		if has_scale {
			let values = [to_fixed16(matrix.scale_x), to_fixed16(matrix.scale_y)];
			let nbits = max_sbits(&values).min(31);
			self.write_ubits(nbits, 5);
			for value in values {
				self.write_sbits(value, nbits);
			}
		}

		let has_rotate = matrix.rotate_skew0 != 0.0 || matrix.rotate_skew1 != 0.0;
		self.write_bit(has_rotate);
		if has_rotate {
			let values = [to_fixed16(matrix.rotate_skew0), to_fixed16(matrix.rotate_skew1)];
			let nbits = max_sbits(&values).min(31);
			self.write_ubits(nbits, 5);
			for value in values {
				self.write_sbits(value, nbits);
			}
		}

		let values = [matrix.translate_x, matrix.translate_y];
		let nbits = max_sbits(&values).min(31);
		self.write_ubits(nbits, 5);
		for value in values {
			self.write_sbits(value, nbits);
		}
		self.byte_align();
	}

	/// Writes a CXFORM (`with_alpha == false`) or CXFORMWITHALPHA record.
	pub fn write_color_transform(&mut self, transform: &ColorTransform, with_alpha: bool) {
		self.byte_align();
		let channels = if with_alpha {
			4
		} else {
			3
		};
		let to_terms = |values: &[f32; 4]| -> Vec<i32> {
			values.iter().take(channels).map(|v| (v * 256.0).round() as i32).collect()
		};
		let mult = to_terms(&transform.multiply);
		let add = to_terms(&transform.add);
		let has_mult = mult.iter().any(|&v| v != 256);
		let has_add = add.iter().any(|&v| v != 0);

		let mut nbits = 0;
		if has_mult {
			nbits = nbits.max(max_sbits(&mult));
		}
		if has_add {
			nbits = nbits.max(max_sbits(&add));
		}
		let nbits = nbits.min(15);

		self.write_bit(has_add);
		self.write_bit(has_mult);
		self.write_ubits(nbits, 4);
		if has_mult {
			for term in &mult {
				self.write_sbits(*term, nbits);
			}
		}
		if has_add {
			for term in &add {
				self.write_sbits(*term, nbits);
			}
		}
		self.byte_align();
	}

	/// Writes an RGB record.
	pub fn write_rgb(&mut self, color: Color) {
		self.write_bytes(&[color.r, color.g, color.b]);
	}

	/// Writes an RGBA record.
	pub fn write_rgba(&mut self, color: Color) {
		self.write_bytes(&[color.r, color.g, color.b, color.a]);
	}

	/// Bytes written so far, including a pending partial byte.
	pub fn len(&self) -> usize {
		self.data.len() + usize::from(self.bits_in_buffer > 0)
	}

	/// Returns `true` if nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Flushes a pending partial byte and returns the buffer.
	pub fn into_bytes(mut self) -> Vec<u8> {
		self.byte_align();
		self.data
	}
}

fn write_tag_header(out: &mut Vec<u8>, raw_code: u16, len: usize, force_long: bool) {
	let long = force_long || len >= usize::from(constants::LONG_TAG_LENGTH);
	if long {
		let value = (raw_code << constants::TAG_LENGTH_BITS) | constants::LONG_TAG_LENGTH;
		out.extend_from_slice(&value.to_le_bytes());
		out.extend_from_slice(&(len as u32).to_le_bytes());
	} else {
		let value = (raw_code << constants::TAG_LENGTH_BITS) | len as u16;
		out.extend_from_slice(&value.to_le_bytes());
	}
}

/// A framed sequence of tags, used for movie bodies and sprite bodies alike.
#[derive(Debug, Default, Clone)]
pub struct TagStream {
	data: Vec<u8>,
	frames: u16,
}

impl TagStream {
	/// Creates an empty stream.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a tag with the shortest header that fits.
	pub fn tag(&mut self, code: TagCode, body: &[u8]) {
		self.raw_tag(code as u16, body);
	}

	/// Appends a tag by raw code, including codes this crate does not know.
	pub fn raw_tag(&mut self, raw_code: u16, body: &[u8]) {
		if raw_code == TagCode::ShowFrame as u16 {
			self.frames += 1;
		}
		write_tag_header(&mut self.data, raw_code, body.len(), false);
		self.data.extend_from_slice(body);
	}

	/// Appends a tag that always uses the 32-bit length form.
	pub fn long_tag(&mut self, code: TagCode, body: &[u8]) {
		if code == TagCode::ShowFrame {
			self.frames += 1;
		}
		write_tag_header(&mut self.data, code as u16, body.len(), true);
		self.data.extend_from_slice(body);
	}

	/// Appends a ShowFrame tag.
	pub fn show_frame(&mut self) {
		self.tag(TagCode::ShowFrame, &[]);
	}

	/// Appends an End tag.
	pub fn end(&mut self) {
		self.tag(TagCode::End, &[]);
	}

	/// Number of ShowFrame tags written.
	pub fn frame_count(&self) -> u16 {
		self.frames
	}

	/// The framed bytes.
	pub fn into_bytes(self) -> Vec<u8> {
		self.data
	}

	/// Builds a complete DefineSprite body: ID, frame count, tags and End.
	pub fn into_sprite_body(mut self, sprite_id: u16) -> Vec<u8> {
		self.end();
		let mut body = Vec::with_capacity(self.data.len() + 4);
		body.extend_from_slice(&sprite_id.to_le_bytes());
		body.extend_from_slice(&self.frames.to_le_bytes());
		body.extend_from_slice(&self.data);
		body
	}
}

/// Assembles a complete SWF file.
///
/// # Examples
///
/// ```
/// use swiff_types::swf::{Movie, SwfWriter, TagCode};
///
/// let mut writer = SwfWriter::new(10);
/// writer.tag(TagCode::SetBackgroundColor, &[0xFF, 0x00, 0x00]);
/// writer.show_frame();
/// let bytes = writer.finish().unwrap();
///
/// let movie = Movie::from_bytes(&bytes).unwrap();
/// assert_eq!(movie.frame_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SwfWriter {
	version: u8,
	stage: Rect,
	frame_rate: f32,
	frame_count: Option<u16>,
	compression: Compression,
	tags: TagStream,
}

impl SwfWriter {
	/// Creates a writer for an uncompressed 550x400 movie at 24 fps.
	pub fn new(version: u8) -> Self {
		Self {
			version,
			stage: Rect::new(0, 11000, 0, 8000),
			frame_rate: 24.0,
			frame_count: None,
			compression: Compression::None,
			tags: TagStream::new(),
		}
	}

	/// Sets the stage rectangle.
	pub fn set_stage(&mut self, stage: Rect) {
		self.stage = stage;
	}

	/// Sets the frame rate.
	pub fn set_frame_rate(&mut self, frame_rate: f32) {
		self.frame_rate = frame_rate;
	}

	/// Overrides the declared frame count. Defaults to the number of ShowFrame tags.
	pub fn set_frame_count(&mut self, frame_count: u16) {
		self.frame_count = Some(frame_count);
	}

	/// Selects the output compression.
	pub fn set_compression(&mut self, compression: Compression) {
		self.compression = compression;
	}

	/// Appends a tag.
	pub fn tag(&mut self, code: TagCode, body: &[u8]) {
		self.tags.tag(code, body);
	}

	/// Appends a tag by raw code.
	pub fn raw_tag(&mut self, raw_code: u16, body: &[u8]) {
		self.tags.raw_tag(raw_code, body);
	}

	/// Appends a tag with the long header form.
	pub fn long_tag(&mut self, code: TagCode, body: &[u8]) {
		self.tags.long_tag(code, body);
	}

	/// Appends a ShowFrame tag.
	pub fn show_frame(&mut self) {
		self.tags.show_frame();
	}

	/// Appends the End tag and produces the file.
	///
	/// # Errors
	///
	/// Returns [`SwfError::UnsupportedCompression`] for LZMA output, or an I/O error
	/// from the zlib encoder.
	pub fn finish(mut self) -> Result<Vec<u8>, SwfError> {
		self.tags.end();
		self.finish_without_end()
	}

	/// Produces the file without appending an End tag.
	///
	/// # Errors
	///
	/// Same as [`SwfWriter::finish`].
	pub fn finish_without_end(self) -> Result<Vec<u8>, SwfError> {
		let frame_count = self.frame_count.unwrap_or(self.tags.frame_count());

		let mut writer = BitWriter::new();
		writer.write_rect(&self.stage);
		writer.write_u16((self.frame_rate * 256.0).round() as u16);
		writer.write_u16(frame_count);
		writer.write_bytes(&self.tags.into_bytes());
		let body = writer.into_bytes();

		let file_length = (constants::HEADER_PREFIX_SIZE + body.len()) as u32;
		let mut out = Vec::with_capacity(file_length as usize);
		out.extend_from_slice(&self.compression.signature());
		out.push(self.version);
		out.extend_from_slice(&file_length.to_le_bytes());

		match self.compression {
			Compression::None => out.extend_from_slice(&body),
			Compression::Zlib => {
				let mut encoder = ZlibEncoder::new(out, flate2::Compression::default());
				encoder.write_all(&body)?;
				out = encoder.finish()?;
			}
			Compression::Lzma => return Err(SwfError::UnsupportedCompression(Compression::Lzma)),
		}
		Ok(out)
	}
}
