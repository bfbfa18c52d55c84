//! SWF file header and the decompression front-end.
//!
//! ## Layout
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  -------------------------------------------
//! 0x00    3     signature    "FWS" plain, "CWS" zlib, "ZWS" LZMA
//! 0x03    1     version      SWF format version
//! 0x04    4     file_length  uncompressed length, including this header
//! 0x08    var   stage        RECT (compressed from here on for CWS/ZWS)
//! ...     2     frame_rate   8.8 fixed, frames per second
//! ...     2     frame_count  declared number of frames
//! ```
//!
//! For `CWS` files everything after byte 8 is a zlib stream. [`decompress`] inflates it
//! into a fresh buffer that keeps the original 8 header bytes in front, so tag offsets
//! are always relative to the uncompressed file.

use std::{fmt::Display, io::Read};

use bytes::{BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use serde::Serialize;

use super::{bits::BitReader, constants, error::SwfError, records::Rect};

/// Compression scheme selected by the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Compression {
	/// `FWS`
	None,
	/// `CWS`, zlib after byte 8
	Zlib,
	/// `ZWS`, recognized but not inflated
	Lzma,
}

impl Compression {
	/// Maps a 3-byte signature to its compression scheme.
	///
	/// # Errors
	///
	/// Returns [`SwfError::InvalidSignature`] for anything other than `FWS`, `CWS`, `ZWS`.
	pub fn from_signature(signature: [u8; 3]) -> Result<Self, SwfError> {
		match &signature {
			constants::SIGNATURE_UNCOMPRESSED => Ok(Compression::None),
			constants::SIGNATURE_ZLIB => Ok(Compression::Zlib),
			constants::SIGNATURE_LZMA => Ok(Compression::Lzma),
			_ => Err(SwfError::InvalidSignature(signature)),
		}
	}

	/// The signature bytes for this scheme.
	pub fn signature(&self) -> [u8; 3] {
		match self {
			Compression::None => *constants::SIGNATURE_UNCOMPRESSED,
			Compression::Zlib => *constants::SIGNATURE_ZLIB,
			Compression::Lzma => *constants::SIGNATURE_LZMA,
		}
	}
}

impl Display for Compression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Compression::None => write!(f, "None"),
			Compression::Zlib => write!(f, "Zlib"),
			Compression::Lzma => write!(f, "LZMA"),
		}
	}
}

/// Movie-level header fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Header {
	/// Compression declared by the signature
	pub compression: Compression,
	/// Format version
	pub version: u8,
	/// Uncompressed file length declared in the header
	pub file_length: u32,
	/// Stage rectangle in twips
	pub stage: Rect,
	/// Frames per second
	pub frame_rate: f32,
	/// Declared frame count
	pub frame_count: u16,
}

impl Header {
	/// Reads the complete header from an uncompressed buffer positioned at offset 0.
	///
	/// # Errors
	///
	/// Returns [`SwfError::InvalidSignature`] or [`SwfError::Truncated`].
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let mut signature = [0u8; 3];
		signature.copy_from_slice(reader.read_bytes(3)?);
		let compression = Compression::from_signature(signature)?;
		let version = reader.read_u8()?;
		let file_length = reader.read_u32()?;
		let stage = Rect::read(reader)?;
		let frame_rate = f32::from(reader.read_u16()?) / 256.0;
		let frame_count = reader.read_u16()?;

		Ok(Self {
			compression,
			version,
			file_length,
			stage,
			frame_rate,
			frame_count,
		})
	}

	/// Parses just the header of a (possibly compressed) SWF file.
	///
	/// # Errors
	///
	/// Any error from [`decompress`] or [`Header::read`].
	///
	/// # Examples
	///
	/// ```no_run
	/// use swiff_types::swf::Header;
	///
	/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
	/// let data = std::fs::read("movie.swf")?;
	/// let header = Header::from_bytes(&data)?;
	/// println!("SWF {} at {} fps", header.version, header.frame_rate);
	/// # Ok(())
	/// # }
	/// ```
	pub fn from_bytes(data: &[u8]) -> Result<Self, SwfError> {
		let buffer = decompress(data)?;
		let mut reader = BitReader::new(&buffer);
		Self::read(&mut reader)
	}
}

impl Display for Header {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let (width, height) = self.stage.size_in_pixels();
		write!(
			f,
			"SWF v{} ({}), {}x{} px, {:.2} fps, {} frames, {} bytes",
			self.version,
			self.compression,
			width,
			height,
			self.frame_rate,
			self.frame_count,
			self.file_length
		)
	}
}

/// Produces the uncompressed movie buffer.
///
/// Plain files are copied once into a shared buffer. Zlib files are inflated after
/// byte 8 and the original header bytes are kept in front.
///
/// # Errors
///
/// - [`SwfError::Truncated`] if the data is shorter than the 8-byte prefix
/// - [`SwfError::InvalidSignature`] for an unknown signature
/// - [`SwfError::UnsupportedCompression`] for LZMA files
/// - [`SwfError::Decompression`] if the zlib stream is corrupt
pub fn decompress(data: &[u8]) -> Result<Bytes, SwfError> {
	if data.len() < constants::HEADER_PREFIX_SIZE {
		return Err(SwfError::Truncated {
			offset: data.len(),
			needed: constants::HEADER_PREFIX_SIZE - data.len(),
		});
	}

	let signature = [data[0], data[1], data[2]];
	let compression = Compression::from_signature(signature)?;
	let declared = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;

	match compression {
		Compression::None => Ok(Bytes::copy_from_slice(data)),
		Compression::Lzma => Err(SwfError::UnsupportedCompression(compression)),
		Compression::Zlib => {
			let capacity = declared.min(constants::MAX_PREALLOCATION);
			let mut out = BytesMut::with_capacity(capacity);
			out.put_slice(&data[..constants::HEADER_PREFIX_SIZE]);

			let mut body = Vec::with_capacity(capacity.saturating_sub(constants::HEADER_PREFIX_SIZE));
			ZlibDecoder::new(&data[constants::HEADER_PREFIX_SIZE..])
				.read_to_end(&mut body)
				.map_err(|err| SwfError::Decompression {
					message: err.to_string(),
				})?;
			out.put_slice(&body);

			if out.len() != declared {
				log::warn!("declared file length {declared} but inflated {} bytes", out.len());
			}
			Ok(out.freeze())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::writer::SwfWriter;

	#[test]
	fn test_signature_mapping() {
		assert_eq!(Compression::from_signature(*b"FWS").unwrap(), Compression::None);
		assert_eq!(Compression::from_signature(*b"CWS").unwrap(), Compression::Zlib);
		assert_eq!(Compression::from_signature(*b"ZWS").unwrap(), Compression::Lzma);
		assert!(matches!(
			Compression::from_signature(*b"GIF"),
			Err(SwfError::InvalidSignature(sig)) if &sig == b"GIF"
		));
	}

	#[test]
	fn test_header_from_plain_and_zlib() {
		for compression in [Compression::None, Compression::Zlib] {
			let mut writer = SwfWriter::new(10);
			writer.set_stage(Rect::new(0, 11000, 0, 8000));
			writer.set_frame_rate(24.5);
			writer.set_compression(compression);
			writer.show_frame();
			let data = writer.finish().unwrap();

			let header = Header::from_bytes(&data).unwrap();
			assert_eq!(header.compression, compression);
			assert_eq!(header.version, 10);
			assert_eq!(header.stage.width(), 11000);
			assert_eq!(header.frame_rate, 24.5);
			assert_eq!(header.frame_count, 1);
			assert_eq!(decompress(&data).unwrap().len(), header.file_length as usize);
		}
	}

	#[test]
	fn test_corrupt_zlib_is_terminal() {
		let mut data = b"CWS\x0a\x40\x00\x00\x00".to_vec();
		data.extend_from_slice(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
		assert!(matches!(
			decompress(&data),
			Err(SwfError::Decompression {
				..
			})
		));
	}

	#[test]
	fn test_lzma_and_short_input() {
		let data = b"ZWS\x0d\x40\x00\x00\x00\x00\x00\x00\x00";
		assert!(matches!(
			decompress(data),
			Err(SwfError::UnsupportedCompression(Compression::Lzma))
		));
		assert!(matches!(
			decompress(b"FWS"),
			Err(SwfError::Truncated {
				needed: 5,
				..
			})
		));
	}
}
