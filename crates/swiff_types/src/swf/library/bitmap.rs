//! Bitmap placeholder definitions.
//!
//! Image payloads are kept as shared slices of the movie buffer and handed to a
//! platform codec later; nothing here decompresses pixels. The container format is
//! sniffed and, where the header makes it cheap, the pixel size is read.
//!
//! | Tag                  | Payload                                        |
//! |----------------------|------------------------------------------------|
//! | DefineBits           | JPEG without tables (uses JPEGTables)          |
//! | DefineBitsJPEG2      | JPEG, PNG or GIF89a                            |
//! | DefineBitsJPEG3      | as JPEG2 plus zlib alpha plane                 |
//! | DefineBitsJPEG4      | as JPEG3 plus deblocking strength              |
//! | DefineBitsLossless/2 | zlib pixels with format, width, height         |

use bytes::Bytes;
use serde::Serialize;

use crate::swf::{
	constants,
	cursor::TagCursor,
	error::SwfError,
	records::{Rect, TWIPS_PER_PIXEL, Twips},
};

/// Pixel layout of a lossless bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LosslessFormat {
	/// 8-bit indices into a color table
	ColorMapped {
		/// Number of table entries
		table_size: u16,
	},
	/// 15-bit RGB (version 1 only)
	Rgb15,
	/// 24-bit RGB, or premultiplied ARGB in version 2
	Rgb24,
}

/// Detected container format of a bitmap payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFormat {
	/// JPEG stream
	Jpeg,
	/// PNG file
	Png,
	/// GIF89a file
	Gif,
	/// zlib-compressed pixels
	Lossless(LosslessFormat),
	/// Unrecognized bytes
	Unknown,
}

impl ImageFormat {
	/// Detects the format from leading bytes.
	pub fn sniff(data: &[u8]) -> Self {
		match data {
			[0xFF, 0xD8, ..] | [0xFF, 0xD9, 0xFF, 0xD8, ..] => ImageFormat::Jpeg,
			[0x89, b'P', b'N', b'G', ..] => ImageFormat::Png,
			[b'G', b'I', b'F', b'8', b'9', b'a', ..] => ImageFormat::Gif,
			_ => ImageFormat::Unknown,
		}
	}
}

/// A bitmap definition with its undecoded payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bitmap {
	/// Tag version: 1-4 for JPEG tags, 1-2 for lossless tags
	pub version: u8,
	/// Payload container format
	pub format: ImageFormat,
	/// Width in pixels, when known without decoding
	pub width: Option<u16>,
	/// Height in pixels, when known without decoding
	pub height: Option<u16>,
	/// Image payload
	#[serde(skip)]
	pub data: Bytes,
	/// zlib alpha plane of JPEG3/JPEG4
	#[serde(skip)]
	pub alpha_data: Option<Bytes>,
	/// JPEG4 deblocking filter strength
	pub deblocking: Option<f32>,
	/// Needs the movie's JPEGTables to decode
	pub uses_jpeg_tables: bool,
	/// Lossless payload carries alpha
	pub has_alpha: bool,
}

impl Bitmap {
	/// Decodes a DefineBits, DefineBitsJPEG2/3/4 tag body.
	pub fn decode_jpeg(cursor: &mut TagCursor<'_>) -> Result<(u16, Self), SwfError> {
		let version = cursor.current_tag_version();
		let id = cursor.read_u16()?;

		let alpha_offset = if version >= 3 {
			Some(cursor.read_u32()? as usize)
		} else {
			None
		};
		let deblocking = if version >= 4 {
			Some(cursor.read_fixed8()?)
		} else {
			None
		};

		let (data, alpha_data) = match alpha_offset {
			Some(len) => {
				let offset = cursor.position();
				if len > cursor.remaining() {
					return Err(SwfError::malformed_record(
						offset,
						format!("alpha offset {len} beyond {} body bytes", cursor.remaining()),
					));
				}
				let image = cursor.read_shared(len)?;
				let alpha = cursor.read_remaining_shared();
				(image, (!alpha.is_empty()).then_some(alpha))
			}
			None => (cursor.read_remaining_shared(), None),
		};

		let format = if version == 1 {
			ImageFormat::Jpeg
		} else {
			ImageFormat::sniff(&data)
		};
		let (width, height) = match format {
			ImageFormat::Png => png_size(&data),
			ImageFormat::Gif => gif_size(&data),
			ImageFormat::Jpeg => jpeg_size(&data),
			_ => None,
		}
		.map_or((None, None), |(w, h)| (Some(w), Some(h)));

		Ok((
			id,
			Self {
				version,
				format,
				width,
				height,
				data,
				has_alpha: alpha_data.is_some(),
				alpha_data,
				deblocking,
				uses_jpeg_tables: version == 1,
			},
		))
	}

	/// Decodes a DefineBitsLossless or DefineBitsLossless2 tag body.
	pub fn decode_lossless(cursor: &mut TagCursor<'_>) -> Result<(u16, Self), SwfError> {
		let version = cursor.current_tag_version();
		let id = cursor.read_u16()?;
		let offset = cursor.position();
		let format = match cursor.read_u8()? {
			constants::lossless::COLOR_MAPPED => None,
			constants::lossless::RGB15 if version == 1 => Some(LosslessFormat::Rgb15),
			constants::lossless::RGB24 => Some(LosslessFormat::Rgb24),
			other => {
				return Err(SwfError::malformed_record(offset, format!("unknown lossless format {other}")));
			}
		};
		let width = cursor.read_u16()?;
		let height = cursor.read_u16()?;
		let format = match format {
			Some(format) => format,
			None => LosslessFormat::ColorMapped {
				table_size: u16::from(cursor.read_u8()?) + 1,
			},
		};
		let data = cursor.read_remaining_shared();

		Ok((
			id,
			Self {
				version,
				format: ImageFormat::Lossless(format),
				width: Some(width),
				height: Some(height),
				data,
				alpha_data: None,
				deblocking: None,
				uses_jpeg_tables: false,
				has_alpha: version >= 2,
			},
		))
	}

	/// Pixel bounds in twips, when the size is known.
	pub fn bounds(&self) -> Option<Rect> {
		let (width, height) = (self.width?, self.height?);
		let to_twips = |pixels: u16| (f32::from(pixels) * TWIPS_PER_PIXEL) as Twips;
		Some(Rect::new(0, to_twips(width), 0, to_twips(height)))
	}
}

fn png_size(data: &[u8]) -> Option<(u16, u16)> {
	let header = data.get(16..24)?;
	let width = u32::from_be_bytes(header[0..4].try_into().ok()?);
	let height = u32::from_be_bytes(header[4..8].try_into().ok()?);
	Some((u16::try_from(width).ok()?, u16::try_from(height).ok()?))
}

fn gif_size(data: &[u8]) -> Option<(u16, u16)> {
	let header = data.get(6..10)?;
	Some((u16::from_le_bytes([header[0], header[1]]), u16::from_le_bytes([header[2], header[3]])))
}

/// Scans JPEG markers for the first start-of-frame segment.
fn jpeg_size(data: &[u8]) -> Option<(u16, u16)> {
	let mut pos = 0;
	while pos + 4 <= data.len() {
		if data[pos] != 0xFF {
			pos += 1;
			continue;
		}
		let marker = data[pos + 1];
		match marker {
			0xD8 | 0xD9 | 0x01 | 0xD0..=0xD7 | 0xFF => {
				pos += if marker == 0xFF {
					1
				} else {
					2
				};
			}
			0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
				let segment = data.get(pos + 5..pos + 9)?;
				let height = u16::from_be_bytes([segment[0], segment[1]]);
				let width = u16::from_be_bytes([segment[2], segment[3]]);
				return Some((width, height));
			}
			_ => {
				let len = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
				pos += 2 + len;
			}
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::{
		ParseConfig, TagCode,
		writer::{BitWriter, SwfWriter},
	};

	fn with_cursor<T>(code: TagCode, body: &[u8], decode: impl FnOnce(&mut TagCursor<'_>) -> T) -> T {
		let mut writer = SwfWriter::new(10);
		writer.tag(code, body);
		let data = bytes::Bytes::from(writer.finish().unwrap());
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		assert!(cursor.advance_to_next_tag().unwrap());
		decode(&mut cursor)
	}

	fn tiny_jpeg() -> Vec<u8> {
		let mut jpeg = vec![0xFF, 0xD8];
		// APP0 segment, 4 bytes long
		jpeg.extend([0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00]);
		// SOF0: length, precision, height 30, width 40
		jpeg.extend([0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x1E, 0x00, 0x28]);
		jpeg.extend([0xFF, 0xD9]);
		jpeg
	}

	#[test]
	fn test_sniff() {
		assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF]), ImageFormat::Jpeg);
		assert_eq!(ImageFormat::sniff(&[0xFF, 0xD9, 0xFF, 0xD8]), ImageFormat::Jpeg);
		assert_eq!(ImageFormat::sniff(b"\x89PNG\r\n"), ImageFormat::Png);
		assert_eq!(ImageFormat::sniff(b"GIF89a"), ImageFormat::Gif);
		assert_eq!(ImageFormat::sniff(b"BM"), ImageFormat::Unknown);
	}

	#[test]
	fn test_jpeg3_with_alpha() {
		let jpeg = tiny_jpeg();
		let mut body = BitWriter::new();
		body.write_u16(8);
		body.write_u32(jpeg.len() as u32);
		body.write_bytes(&jpeg);
		body.write_bytes(&[0x78, 0x9C, 0x03, 0x00]);

		let (id, bitmap) = with_cursor(TagCode::DefineBitsJpeg3, &body.into_bytes(), |cursor| {
			Bitmap::decode_jpeg(cursor).unwrap()
		});
		assert_eq!(id, 8);
		assert_eq!(bitmap.version, 3);
		assert_eq!(bitmap.format, ImageFormat::Jpeg);
		assert_eq!((bitmap.width, bitmap.height), (Some(40), Some(30)));
		assert_eq!(bitmap.data.len(), jpeg.len());
		assert_eq!(bitmap.alpha_data.as_deref(), Some(&[0x78, 0x9C, 0x03, 0x00][..]));
		assert!(bitmap.has_alpha);
		assert_eq!(bitmap.bounds(), Some(Rect::new(0, 800, 0, 600)));
	}

	#[test]
	fn test_jpeg3_alpha_offset_past_body() {
		let mut body = BitWriter::new();
		body.write_u16(8);
		body.write_u32(100);
		body.write_bytes(&[0xFF, 0xD8]);
		let err = with_cursor(TagCode::DefineBitsJpeg3, &body.into_bytes(), |cursor| {
			Bitmap::decode_jpeg(cursor).unwrap_err()
		});
		assert!(matches!(
			err,
			SwfError::MalformedRecord {
				..
			}
		));
	}

	#[test]
	fn test_define_bits_uses_tables() {
		let (_, bitmap) = with_cursor(TagCode::DefineBits, &[1, 0, 0xFF, 0xD8, 0xFF, 0xD9], |cursor| {
			Bitmap::decode_jpeg(cursor).unwrap()
		});
		assert!(bitmap.uses_jpeg_tables);
		assert_eq!(bitmap.width, None);
	}

	#[test]
	fn test_lossless_color_mapped() {
		let mut body = BitWriter::new();
		body.write_u16(2);
		body.write_u8(constants::lossless::COLOR_MAPPED);
		body.write_u16(16);
		body.write_u16(8);
		body.write_u8(255);
		body.write_bytes(&[0x78, 0x9C]);

		let (_, bitmap) = with_cursor(TagCode::DefineBitsLossless2, &body.into_bytes(), |cursor| {
			Bitmap::decode_lossless(cursor).unwrap()
		});
		assert_eq!(
			bitmap.format,
			ImageFormat::Lossless(LosslessFormat::ColorMapped {
				table_size: 256,
			})
		);
		assert_eq!((bitmap.width, bitmap.height), (Some(16), Some(8)));
		assert!(bitmap.has_alpha);
		assert_eq!(bitmap.data.len(), 2);
	}

	#[test]
	fn test_lossless_rgb15_requires_version1() {
		let mut body = BitWriter::new();
		body.write_u16(2);
		body.write_u8(constants::lossless::RGB15);
		body.write_u16(1);
		body.write_u16(1);
		let err = with_cursor(TagCode::DefineBitsLossless2, &body.into_bytes(), |cursor| {
			Bitmap::decode_lossless(cursor).unwrap_err()
		});
		assert!(matches!(
			err,
			SwfError::MalformedRecord {
				..
			}
		));
	}
}
