//! Tag-granular cursor over an uncompressed movie buffer.
//!
//! ## Tag Header
//!
//! ```text
//! UI16  code_and_length   code = value >> 6, length = value & 0x3F
//! UI32  long_length       present only when length == 0x3F
//! ```
//!
//! The cursor keeps a stack of scopes. The top-level scope spans the whole buffer;
//! [`TagCursor::enter_sprite`] pushes the body of the current `DefineSprite` tag so that
//! nested tags are framed against the sprite body and never leak into sibling tags.
//!
//! Before moving to the next tag the cursor always skips whatever part of the current
//! body the decoder left unread. While a tag is current, reads are limited to its body.

use std::ops::{Deref, DerefMut};

use bytes::Bytes;
use encoding_rs::Encoding;

use super::{
	bits::BitReader,
	constants,
	error::SwfError,
	header::Header,
	parse_config::ParseConfig,
	records,
	tag::{Tag, TagCode},
};

#[derive(Debug, Clone)]
struct Scope {
	end: usize,
	parent: Option<Tag>,
}

/// Cursor that frames tags on top of a [`BitReader`].
///
/// Dereferences to the underlying reader, so field decoders call `cursor.read_u16()`
/// directly.
#[derive(Debug)]
pub struct TagCursor<'a> {
	buffer: &'a Bytes,
	reader: BitReader<'a>,
	version: u8,
	legacy_encoding: &'static Encoding,
	current: Option<Tag>,
	scopes: Vec<Scope>,
}

impl<'a> TagCursor<'a> {
	/// Creates a cursor at offset 0 of an uncompressed movie buffer.
	pub fn new(buffer: &'a Bytes, config: &ParseConfig) -> Self {
		Self {
			buffer,
			reader: BitReader::new(buffer),
			version: 0,
			legacy_encoding: config.legacy_encoding,
			current: None,
			scopes: Vec::new(),
		}
	}

	/// Reads the movie header and records the format version.
	///
	/// # Errors
	///
	/// Returns [`SwfError::InvalidSignature`] or [`SwfError::Truncated`].
	pub fn read_header(&mut self) -> Result<Header, SwfError> {
		self.reader.seek(0);
		self.reader.set_limit(self.buffer.len());
		let header = Header::read(&mut self.reader)?;
		self.version = header.version;
		if header.file_length as usize != self.buffer.len() {
			log::debug!(
				"header declares {} bytes, buffer holds {}",
				header.file_length,
				self.buffer.len()
			);
		}
		Ok(header)
	}

	/// Movie format version, valid after [`TagCursor::read_header`].
	pub fn version(&self) -> u8 {
		self.version
	}

	/// Overrides the format version. Used when decoding detached tag streams.
	pub fn set_version(&mut self, version: u8) {
		self.version = version;
	}

	/// Encoding used for STRING fields in this movie.
	pub fn string_encoding(&self) -> &'static Encoding {
		records::string_encoding(self.version, self.legacy_encoding)
	}

	/// The configured legacy encoding, regardless of movie version.
	pub fn legacy_encoding(&self) -> &'static Encoding {
		self.legacy_encoding
	}

	/// The tag the cursor is positioned in.
	pub fn current_tag(&self) -> Option<&Tag> {
		self.current.as_ref()
	}

	/// Base code of the current tag.
	pub fn current_tag_code(&self) -> Option<TagCode> {
		self.current.as_ref().and_then(|tag| tag.code)
	}

	/// Version of the current tag, 1 for base codes.
	pub fn current_tag_version(&self) -> u8 {
		self.current.as_ref().map_or(1, |tag| tag.version)
	}

	/// Unread bytes left in the current tag body.
	pub fn bytes_remaining_in_current_tag(&self) -> usize {
		match &self.current {
			Some(_) => self.reader.remaining(),
			None => 0,
		}
	}

	/// Nesting depth of sprite scopes.
	pub fn sprite_depth(&self) -> usize {
		self.scopes.len()
	}

	fn scope_end(&self) -> usize {
		self.scopes.last().map_or(self.buffer.len(), |scope| scope.end)
	}

	/// Moves to the next top-level tag.
	///
	/// Returns `Ok(false)` at the End tag or when the buffer is exhausted.
	///
	/// # Errors
	///
	/// - [`SwfError::Truncated`] if a tag header is cut off
	/// - [`SwfError::MalformedTag`] if a tag claims to extend past the buffer
	pub fn advance_to_next_tag(&mut self) -> Result<bool, SwfError> {
		self.next_tag()
	}

	/// Moves to the next tag inside the current sprite body.
	///
	/// Returns `Ok(false)` at the sprite's End tag or at the end of the sprite body.
	///
	/// # Errors
	///
	/// Same as [`TagCursor::advance_to_next_tag`], relative to the sprite body.
	pub fn advance_to_next_tag_in_sprite(&mut self) -> Result<bool, SwfError> {
		if self.scopes.is_empty() {
			return Err(SwfError::malformed_tag(
				self.reader.position(),
				"advance_to_next_tag_in_sprite called outside a sprite",
			));
		}
		self.next_tag()
	}

	fn next_tag(&mut self) -> Result<bool, SwfError> {
		let scope_end = self.scope_end();

		if let Some(tag) = self.current.take() {
			let unread = tag.body.end.saturating_sub(self.reader.position());
			if unread > 0 {
				log::trace!("skipping {unread} unread bytes of {tag}");
			}
			self.reader.seek(tag.body.end.max(self.reader.position()));
		} else {
			self.reader.byte_align();
		}
		self.reader.set_limit(scope_end);

		let header_offset = self.reader.position();
		if header_offset >= scope_end {
			return Ok(false);
		}

		let code_and_length = self.reader.read_u16()?;
		let raw_code = code_and_length >> constants::TAG_LENGTH_BITS;
		let short_length = code_and_length & constants::LONG_TAG_LENGTH;
		let length = if short_length == constants::LONG_TAG_LENGTH {
			self.reader.read_u32()? as usize
		} else {
			usize::from(short_length)
		};

		let body_start = self.reader.position();
		let body_end = body_start.checked_add(length).filter(|end| *end <= scope_end).ok_or_else(|| {
			SwfError::malformed_tag(
				header_offset,
				format!(
					"tag code {raw_code} claims {length} bytes, only {} remain",
					scope_end.saturating_sub(body_start)
				),
			)
		})?;

		let tag = Tag::new(raw_code, header_offset, body_start..body_end);
		log::trace!("{tag}");
		self.reader.set_limit(body_end);
		let is_end = tag.code == Some(TagCode::End);
		self.current = Some(tag);
		Ok(!is_end)
	}

	/// Opens the body of the current `DefineSprite` tag as a nested scope.
	///
	/// The sprite ID and frame count must already have been read.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedTag`] if the cursor is not inside a tag.
	pub fn enter_sprite(&mut self) -> Result<(), SwfError> {
		let Some(parent) = self.current.take() else {
			return Err(SwfError::malformed_tag(self.reader.position(), "enter_sprite without a current tag"));
		};
		self.scopes.push(Scope {
			end: parent.body.end,
			parent: Some(parent),
		});
		Ok(())
	}

	/// Closes the innermost sprite scope and restores its `DefineSprite` tag as current.
	pub fn leave_sprite(&mut self) {
		if let Some(scope) = self.scopes.pop() {
			if let Some(parent) = &scope.parent {
				self.reader.set_limit(parent.body.end);
			}
			self.current = scope.parent;
		}
	}

	/// Zero-copy slice of the movie buffer.
	pub fn slice(&self, range: std::ops::Range<usize>) -> Bytes {
		self.buffer.slice(range)
	}

	/// Reads `len` bytes as a shared slice of the movie buffer.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if fewer than `len` bytes remain in the tag.
	pub fn read_shared(&mut self, len: usize) -> Result<Bytes, SwfError> {
		let start = self.reader.position();
		self.reader.advance(len)?;
		Ok(self.buffer.slice(start..start + len))
	}

	/// Reads the rest of the current tag body as a shared slice.
	pub fn read_remaining_shared(&mut self) -> Bytes {
		self.reader.byte_align();
		let start = self.reader.position();
		let rest = self.reader.read_remaining();
		self.buffer.slice(start..start + rest.len())
	}

	/// Reads a null-terminated string in the movie's encoding.
	pub fn read_string(&mut self) -> Result<String, SwfError> {
		let encoding = self.string_encoding();
		records::read_string(&mut self.reader, encoding)
	}

	/// Reads a one-byte-length-prefixed string in the movie's encoding.
	pub fn read_length_prefixed_string(&mut self) -> Result<String, SwfError> {
		let encoding = self.string_encoding();
		records::read_length_prefixed_string(&mut self.reader, encoding)
	}

	/// Reads a string of `len` bytes in the movie's encoding.
	pub fn read_string_with_length(&mut self, len: usize) -> Result<String, SwfError> {
		let encoding = self.string_encoding();
		records::read_string_with_length(&mut self.reader, len, encoding)
	}
}

impl<'a> Deref for TagCursor<'a> {
	type Target = BitReader<'a>;

	fn deref(&self) -> &Self::Target {
		&self.reader
	}
}

impl DerefMut for TagCursor<'_> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.reader
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::writer::{SwfWriter, TagStream};

	fn movie(tags: impl FnOnce(&mut SwfWriter)) -> Bytes {
		let mut writer = SwfWriter::new(8);
		tags(&mut writer);
		Bytes::from(writer.finish().unwrap())
	}

	#[test]
	fn test_walks_tags_and_skips_unread_bodies() {
		let data = movie(|w| {
			w.tag(TagCode::SetBackgroundColor, &[1, 2, 3]);
			w.tag(TagCode::DefineShape3, &[0u8; 100]);
			w.show_frame();
		});
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		let header = cursor.read_header().unwrap();
		assert_eq!(header.version, 8);

		assert!(cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.current_tag_code(), Some(TagCode::SetBackgroundColor));
		assert_eq!(cursor.bytes_remaining_in_current_tag(), 3);
		assert_eq!(cursor.read_u8().unwrap(), 1);
		assert_eq!(cursor.bytes_remaining_in_current_tag(), 2);

		assert!(cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.current_tag_code(), Some(TagCode::DefineShape));
		assert_eq!(cursor.current_tag_version(), 3);
		assert_eq!(cursor.bytes_remaining_in_current_tag(), 100);
		assert!(cursor.read_bytes(101).is_err());

		assert!(cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.current_tag_code(), Some(TagCode::ShowFrame));

		assert!(!cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.current_tag_code(), Some(TagCode::End));
	}

	#[test]
	fn test_tag_past_buffer_end_is_malformed() {
		let mut data = movie(|_| {}).to_vec();
		// Replace the End tag with a header claiming 40 bytes.
		let end = data.len() - 2;
		data.truncate(end);
		data.extend_from_slice(&((9u16 << 6) | 40).to_le_bytes());
		data.extend_from_slice(&[0; 4]);
		let data = Bytes::from(data);

		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		let err = cursor.advance_to_next_tag().unwrap_err();
		assert!(matches!(
			err,
			SwfError::MalformedTag {
				offset,
				..
			} if offset == end
		));
	}

	#[test]
	fn test_sprite_scope() {
		let mut inner = TagStream::new();
		inner.tag(TagCode::PlaceObject2, &[0x02, 0x01, 0x00, 0x05, 0x00]);
		inner.tag(TagCode::ShowFrame, &[]);
		inner.end();
		let mut sprite = vec![7, 0, 1, 0];
		sprite.extend_from_slice(&inner.into_bytes());

		let data = movie(|w| {
			w.tag(TagCode::DefineSprite, &sprite);
			w.show_frame();
		});
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();

		assert!(cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.read_u16().unwrap(), 7);
		assert_eq!(cursor.read_u16().unwrap(), 1);
		cursor.enter_sprite().unwrap();
		assert_eq!(cursor.sprite_depth(), 1);

		let mut seen = Vec::new();
		while cursor.advance_to_next_tag_in_sprite().unwrap() {
			seen.push(cursor.current_tag().unwrap().full_code().unwrap());
		}
		assert_eq!(seen, vec![TagCode::PlaceObject2, TagCode::ShowFrame]);
		cursor.leave_sprite();
		assert_eq!(cursor.current_tag_code(), Some(TagCode::DefineSprite));

		assert!(cursor.advance_to_next_tag().unwrap());
		assert_eq!(cursor.current_tag_code(), Some(TagCode::ShowFrame));
	}

	#[test]
	fn test_long_header_and_stream_without_end() {
		let mut writer = SwfWriter::new(9);
		writer.long_tag(TagCode::ShowFrame, &[]);
		let data = Bytes::from(writer.finish_without_end().unwrap());

		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		assert!(cursor.advance_to_next_tag().unwrap());
		let tag = cursor.current_tag().unwrap();
		assert_eq!(tag.body.start - tag.header_offset, 6);
		assert!(!cursor.advance_to_next_tag().unwrap());
		assert!(cursor.current_tag().is_none());
	}
}
