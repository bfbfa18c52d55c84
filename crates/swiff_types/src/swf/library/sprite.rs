//! DefineSprite: a nested timeline.
//!
//! ```text
//! UI16  sprite_id
//! UI16  frame_count
//! TAG[] control tags, terminated by End
//! ```
//!
//! Only timeline tags are legal inside a sprite. Definitions and nested sprites are
//! skipped.

use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::{Diagnostic, SwfError},
	parse_config::ParseConfig,
	timeline::{Timeline, TimelineBuilder},
};

/// A sprite definition.
#[derive(Debug, Clone, Serialize)]
pub struct Sprite {
	/// Frame count from the sprite header
	pub declared_frame_count: u16,
	/// The sprite's frames
	pub timeline: Timeline,
}

impl Sprite {
	/// Decodes a DefineSprite tag and its nested tag stream.
	///
	/// Local failures inside the sprite are appended to `diagnostics`.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] for a short sprite header and
	/// [`SwfError::MalformedTag`] when a nested tag overruns the sprite body.
	pub fn decode(
		cursor: &mut TagCursor<'_>,
		config: &ParseConfig,
		diagnostics: &mut Vec<Diagnostic>,
	) -> Result<(u16, Self), SwfError> {
		let id = cursor.read_u16()?;
		let declared_frame_count = cursor.read_u16()?;

		cursor.enter_sprite()?;
		let mut builder = TimelineBuilder::new(declared_frame_count);
		let scanned = scan(cursor, &mut builder, diagnostics);
		cursor.leave_sprite();
		scanned?;

		Ok((
			id,
			Self {
				declared_frame_count,
				timeline: builder.finish(config, diagnostics, None, Some(id)),
			},
		))
	}
}

fn scan(cursor: &mut TagCursor<'_>, builder: &mut TimelineBuilder, diagnostics: &mut Vec<Diagnostic>) -> Result<(), SwfError> {
	while cursor.advance_to_next_tag_in_sprite()? {
		if builder.handle_tag(cursor, diagnostics)? {
			continue;
		}
		if let Some(tag) = cursor.current_tag() {
			log::debug!("skipping {tag} inside sprite");
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::{
		TagCode,
		error::ErrorKind,
		writer::{BitWriter, SwfWriter, TagStream},
	};
	use bytes::Bytes;

	fn place(id: u16, depth: u16) -> Vec<u8> {
		let mut body = BitWriter::new();
		body.write_u16(id);
		body.write_u16(depth);
		body.write_matrix(&crate::swf::records::Matrix::IDENTITY);
		body.into_bytes()
	}

	fn decode_first(data: &[u8]) -> (Result<(u16, Sprite), SwfError>, Vec<Diagnostic>, bool) {
		let data = Bytes::copy_from_slice(data);
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		assert!(cursor.advance_to_next_tag().unwrap());
		let mut diagnostics = Vec::new();
		let result = Sprite::decode(&mut cursor, &config, &mut diagnostics);
		let has_next = cursor.advance_to_next_tag().unwrap();
		(result, diagnostics, has_next && cursor.current_tag_code() == Some(TagCode::ShowFrame))
	}

	#[test]
	fn test_sprite_frames_stay_inside_body() {
		let mut inner = TagStream::new();
		inner.tag(TagCode::PlaceObject, &place(1, 1));
		inner.show_frame();
		inner.tag(TagCode::RemoveObject2, &1u16.to_le_bytes());
		inner.show_frame();

		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::DefineSprite, &inner.into_sprite_body(9));
		writer.show_frame();

		let (result, diagnostics, next_is_show_frame) = decode_first(&writer.finish().unwrap());
		let (id, sprite) = result.unwrap();
		assert_eq!(id, 9);
		assert!(diagnostics.is_empty());
		assert!(next_is_show_frame);
		assert_eq!(sprite.declared_frame_count, 2);
		assert_eq!(sprite.timeline.frame_count(), 2);
		assert_eq!(sprite.timeline.frame(0).unwrap().placed_at(1).unwrap().library_id, 1);
		assert_eq!(sprite.timeline.frame(1).unwrap().depth_count(), 0);
	}

	#[test]
	fn test_definitions_inside_sprite_are_skipped() {
		let mut inner = TagStream::new();
		inner.tag(TagCode::DefineShape, &[1, 0, 0]);
		inner.show_frame();

		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::DefineSprite, &inner.into_sprite_body(3));

		let (result, diagnostics, _) = decode_first(&writer.finish().unwrap());
		assert_eq!(result.unwrap().1.timeline.frame_count(), 1);
		assert!(diagnostics.is_empty());
	}

	#[test]
	fn test_overrunning_nested_tag_is_fatal() {
		let mut body = Vec::new();
		body.extend_from_slice(&4u16.to_le_bytes());
		body.extend_from_slice(&1u16.to_le_bytes());
		// PlaceObject claiming 20 bytes inside a 4-byte remainder
		body.extend_from_slice(&(((TagCode::PlaceObject as u16) << 6) | 20).to_le_bytes());
		body.extend_from_slice(&[0, 0]);

		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::DefineSprite, &body);
		writer.show_frame();

		let (result, _, next_is_show_frame) = decode_first(&writer.finish().unwrap());
		assert_eq!(result.unwrap_err().kind(), ErrorKind::MalformedTag);
		assert!(next_is_show_frame);
	}
}
