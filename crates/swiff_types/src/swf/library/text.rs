//! Static and dynamic text definitions.
//!
//! ## DefineText / DefineText2
//!
//! ```text
//! UI16        text_id
//! RECT        bounds
//! MATRIX      matrix
//! UI8         glyph_bits
//! UI8         advance_bits
//! TEXTRECORD  records...      terminated by a zero byte
//! ```
//!
//! Each TEXTRECORD optionally switches the active font, color and pen offsets, then
//! lists `(glyph index, advance)` pairs packed with the widths declared above.
//!
//! ## DefineEditText
//!
//! Two flag bytes select which of the following fields are present: font ID, font
//! class, font height, color, max length, layout block, variable name, initial text.

use bitflags::bitflags;
use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::SwfError,
	records::{Color, Matrix, Rect, Twips},
};

/// One packed glyph reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlyphEntry {
	/// Index into the font's glyph table
	pub index: u32,
	/// Pen advance after this glyph, in twips
	pub advance: Twips,
}

/// A run of glyphs sharing font, color and baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRecord {
	/// New active font
	pub font_id: Option<u16>,
	/// New active color
	pub color: Option<Color>,
	/// New pen x position
	pub x_offset: Option<Twips>,
	/// New pen y position
	pub y_offset: Option<Twips>,
	/// New font height in twips, present with `font_id`
	pub height: Option<u16>,
	/// Glyphs of this run
	pub glyphs: Vec<GlyphEntry>,
}

/// A glyph with every record switch resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionedGlyph {
	/// Font the glyph comes from
	pub font_id: u16,
	/// Glyph index in that font
	pub index: u32,
	/// Font height in twips
	pub height: u16,
	/// Fill color
	pub color: Color,
	/// Pen x in text space
	pub x: Twips,
	/// Baseline y in text space
	pub y: Twips,
}

/// Pre-laid-out text (DefineText, DefineText2).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticText {
	/// Declared bounds
	pub bounds: Rect,
	/// Text-to-character transform
	pub matrix: Matrix,
	/// Text records in file order
	pub records: Vec<TextRecord>,
}

impl StaticText {
	/// Decodes a DefineText tag body. Returns the text ID and the text.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<(u16, Self), SwfError> {
		let with_alpha = cursor.current_tag_version() >= 2;
		let id = cursor.read_u16()?;
		let bounds = Rect::read(cursor)?;
		let matrix = Matrix::read(cursor)?;
		let glyph_bits = u32::from(cursor.read_u8()?);
		let advance_bits = u32::from(cursor.read_u8()?);

		let mut records = Vec::new();
		loop {
			let offset = cursor.position();
			let flags = cursor.read_u8()?;
			if flags == 0 {
				break;
			}
			if flags & 0x80 == 0 {
				return Err(SwfError::malformed_record(offset, format!("text record type bit missing in {flags:#04x}")));
			}
			let has_font = flags & 0x08 != 0;
			let has_color = flags & 0x04 != 0;
			let has_y = flags & 0x02 != 0;
			let has_x = flags & 0x01 != 0;

			let font_id = if has_font {
				Some(cursor.read_u16()?)
			} else {
				None
			};
			let color = if has_color {
				Some(Color::read(cursor, with_alpha)?)
			} else {
				None
			};
			let x_offset = if has_x {
				Some(Twips::from(cursor.read_i16()?))
			} else {
				None
			};
			let y_offset = if has_y {
				Some(Twips::from(cursor.read_i16()?))
			} else {
				None
			};
			let height = if has_font {
				Some(cursor.read_u16()?)
			} else {
				None
			};

			let count = usize::from(cursor.read_u8()?);
			let mut glyphs = Vec::with_capacity(count);
			for _ in 0..count {
				glyphs.push(GlyphEntry {
					index: cursor.read_ubits(glyph_bits)?,
					advance: cursor.read_sbits(advance_bits)?,
				});
			}
			cursor.byte_align();

			records.push(TextRecord {
				font_id,
				color,
				x_offset,
				y_offset,
				height,
				glyphs,
			});
		}

		Ok((
			id,
			Self {
				bounds,
				matrix,
				records,
			},
		))
	}

	/// Fonts referenced by the records, in first-use order.
	pub fn font_ids(&self) -> Vec<u16> {
		let mut ids = Vec::new();
		for id in self.records.iter().filter_map(|record| record.font_id) {
			if !ids.contains(&id) {
				ids.push(id);
			}
		}
		ids
	}

	/// Resolves record switches into absolute glyph positions.
	///
	/// Glyphs that appear before any font is selected are skipped.
	pub fn positioned_glyphs(&self) -> Vec<PositionedGlyph> {
		let mut glyphs = Vec::new();
		let mut font: Option<(u16, u16)> = None;
		let mut color = Color::BLACK;
		let (mut x, mut y) = (0, 0);

		for record in &self.records {
			if let (Some(id), Some(height)) = (record.font_id, record.height) {
				font = Some((id, height));
			}
			if let Some(new_color) = record.color {
				color = new_color;
			}
			if let Some(new_x) = record.x_offset {
				x = new_x;
			}
			if let Some(new_y) = record.y_offset {
				y = new_y;
			}
			let Some((font_id, height)) = font else {
				log::debug!("text record without an active font, {} glyphs skipped", record.glyphs.len());
				continue;
			};
			for entry in &record.glyphs {
				glyphs.push(PositionedGlyph {
					font_id,
					index: entry.index,
					height,
					color,
					x,
					y,
				});
				x += entry.advance;
			}
		}
		glyphs
	}
}

bitflags! {
	/// DefineEditText flags, first flag byte in the high bits.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct EditTextFlags: u16 {
		/// Initial text present
		const HAS_TEXT = 0x8000;
		/// Wrap long lines
		const WORD_WRAP = 0x4000;
		/// Multiple lines
		const MULTILINE = 0x2000;
		/// Display asterisks
		const PASSWORD = 0x1000;
		/// Not editable
		const READ_ONLY = 0x0800;
		/// Text color present
		const HAS_TEXT_COLOR = 0x0400;
		/// Max length present
		const HAS_MAX_LENGTH = 0x0200;
		/// Font ID present
		const HAS_FONT = 0x0100;
		/// Font class name present
		const HAS_FONT_CLASS = 0x0080;
		/// Resize to fit the text
		const AUTO_SIZE = 0x0040;
		/// Layout block present
		const HAS_LAYOUT = 0x0020;
		/// Not selectable
		const NO_SELECT = 0x0010;
		/// Draw border and background
		const BORDER = 0x0008;
		/// Authored as static text
		const WAS_STATIC = 0x0004;
		/// Text is HTML
		const HTML = 0x0002;
		/// Render with embedded glyphs
		const USE_OUTLINES = 0x0001;
	}
}

/// Paragraph alignment of a dynamic text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TextAlign {
	/// Left aligned
	#[default]
	Left,
	/// Right aligned
	Right,
	/// Centered
	Center,
	/// Justified
	Justify,
}

/// Paragraph layout of a dynamic text field, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TextLayout {
	/// Alignment
	pub align: TextAlign,
	/// Left margin
	pub left_margin: u16,
	/// Right margin
	pub right_margin: u16,
	/// First-line indent
	pub indent: u16,
	/// Extra line spacing
	pub leading: i16,
}

/// An editable or script-driven text field (DefineEditText).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicText {
	/// Field bounds
	pub bounds: Rect,
	/// Field flags
	pub flags: EditTextFlags,
	/// Font by library ID
	pub font_id: Option<u16>,
	/// Font by runtime class name
	pub font_class: Option<String>,
	/// Font height in twips
	pub font_height: Option<u16>,
	/// Text color
	pub color: Option<Color>,
	/// Maximum length in characters
	pub max_length: Option<u16>,
	/// Paragraph layout
	pub layout: Option<TextLayout>,
	/// Bound variable name, may be empty
	pub variable_name: String,
	/// Initial contents
	pub initial_text: Option<String>,
}

impl DynamicText {
	/// Decodes a DefineEditText tag body. Returns the field ID and the field.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<(u16, Self), SwfError> {
		let id = cursor.read_u16()?;
		let bounds = Rect::read(cursor)?;
		let high = cursor.read_u8()?;
		let low = cursor.read_u8()?;
		let flags = EditTextFlags::from_bits_truncate(u16::from_be_bytes([high, low]));

		let font_id = if flags.contains(EditTextFlags::HAS_FONT) {
			Some(cursor.read_u16()?)
		} else {
			None
		};
		let font_class = if flags.contains(EditTextFlags::HAS_FONT_CLASS) {
			Some(cursor.read_string()?)
		} else {
			None
		};
		let font_height = if flags.intersects(EditTextFlags::HAS_FONT | EditTextFlags::HAS_FONT_CLASS) {
			Some(cursor.read_u16()?)
		} else {
			None
		};
		let color = if flags.contains(EditTextFlags::HAS_TEXT_COLOR) {
			Some(Color::read_rgba(cursor)?)
		} else {
			None
		};
		let max_length = if flags.contains(EditTextFlags::HAS_MAX_LENGTH) {
			Some(cursor.read_u16()?)
		} else {
			None
		};
		let layout = if flags.contains(EditTextFlags::HAS_LAYOUT) {
			let offset = cursor.position();
			let align = match cursor.read_u8()? {
				0 => TextAlign::Left,
				1 => TextAlign::Right,
				2 => TextAlign::Center,
				3 => TextAlign::Justify,
				other => return Err(SwfError::malformed_record(offset, format!("unknown text alignment {other}"))),
			};
			Some(TextLayout {
				align,
				left_margin: cursor.read_u16()?,
				right_margin: cursor.read_u16()?,
				indent: cursor.read_u16()?,
				leading: cursor.read_i16()?,
			})
		} else {
			None
		};
		let variable_name = cursor.read_string()?;
		let initial_text = if flags.contains(EditTextFlags::HAS_TEXT) {
			Some(cursor.read_string()?)
		} else {
			None
		};

		Ok((
			id,
			Self {
				bounds,
				flags,
				font_id,
				font_class,
				font_height,
				color,
				max_length,
				layout,
				variable_name,
				initial_text,
			},
		))
	}

	/// Users may edit the text.
	pub fn is_editable(&self) -> bool {
		!self.flags.contains(EditTextFlags::READ_ONLY)
	}

	/// Users may select the text.
	pub fn is_selectable(&self) -> bool {
		!self.flags.contains(EditTextFlags::NO_SELECT)
	}

	/// Contents are HTML.
	pub fn is_html(&self) -> bool {
		self.flags.contains(EditTextFlags::HTML)
	}

	/// Spans multiple lines.
	pub fn is_multiline(&self) -> bool {
		self.flags.contains(EditTextFlags::MULTILINE)
	}

	/// Displays asterisks.
	pub fn is_password(&self) -> bool {
		self.flags.contains(EditTextFlags::PASSWORD)
	}
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

	#[test]
	fn test_static_text_records() {
		let mut body = BitWriter::new();
		body.write_u16(4);
		body.write_rect(&Rect::new(0, 2000, -400, 100));
		body.write_matrix(&Matrix::IDENTITY);
		body.write_u8(4);
		body.write_u8(8);
		// font, color, x and y offsets
		body.write_u8(0x80 | 0x08 | 0x04 | 0x02 | 0x01);
		body.write_u16(2);
		body.write_rgba(Color::rgb(255, 0, 0));
		body.write_i16(20);
		body.write_i16(300);
		body.write_u16(240);
		body.write_u8(2);
		body.write_ubits(3, 4);
		body.write_sbits(100, 8);
		body.write_ubits(5, 4);
		body.write_sbits(-20, 8);
		// y offset only
		body.write_u8(0x80 | 0x02);
		body.write_i16(600);
		body.write_u8(1);
		body.write_ubits(1, 4);
		body.write_sbits(50, 8);
		body.write_u8(0);

		let (id, text) = with_cursor(TagCode::DefineText2, &body.into_bytes(), |cursor| {
			StaticText::decode(cursor).unwrap()
		});
		assert_eq!(id, 4);
		assert_eq!(text.records.len(), 2);
		assert_eq!(text.font_ids(), vec![2]);
		assert_eq!(text.records[0].glyphs[1], GlyphEntry {
			index: 5,
			advance: -20,
		});

		let glyphs = text.positioned_glyphs();
		assert_eq!(glyphs.len(), 3);
		assert_eq!((glyphs[0].x, glyphs[0].y), (20, 300));
		assert_eq!((glyphs[1].x, glyphs[1].y), (120, 300));
		assert_eq!((glyphs[2].x, glyphs[2].y), (100, 600));
		assert_eq!(glyphs[2].color, Color::rgb(255, 0, 0));
		assert_eq!(glyphs[2].height, 240);
	}

	#[test]
	fn test_static_text_bad_record_type() {
		let mut body = BitWriter::new();
		body.write_u16(1);
		body.write_rect(&Rect::default());
		body.write_matrix(&Matrix::IDENTITY);
		body.write_u8(1);
		body.write_u8(1);
		body.write_u8(0x08);
		let err = with_cursor(TagCode::DefineText, &body.into_bytes(), |cursor| {
			StaticText::decode(cursor).unwrap_err()
		});
		assert!(matches!(
			err,
			SwfError::MalformedRecord {
				..
			}
		));
	}

	#[test]
	fn test_edit_text_fields() {
		let mut body = BitWriter::new();
		body.write_u16(12);
		body.write_rect(&Rect::new(0, 4000, 0, 400));
		let flags =
			EditTextFlags::HAS_TEXT | EditTextFlags::HAS_FONT | EditTextFlags::HAS_LAYOUT | EditTextFlags::READ_ONLY;
		body.write_bytes(&flags.bits().to_be_bytes());
		body.write_u16(3);
		body.write_u16(360);
		body.write_u8(2);
		body.write_u16(40);
		body.write_u16(40);
		body.write_u16(0);
		body.write_i16(2);
		body.write_string("score");
		body.write_string("0");

		let (id, field) = with_cursor(TagCode::DefineEditText, &body.into_bytes(), |cursor| {
			DynamicText::decode(cursor).unwrap()
		});
		assert_eq!(id, 12);
		assert_eq!(field.font_id, Some(3));
		assert_eq!(field.font_height, Some(360));
		assert_eq!(field.layout.unwrap().align, TextAlign::Center);
		assert_eq!(field.variable_name, "score");
		assert_eq!(field.initial_text.as_deref(), Some("0"));
		assert!(!field.is_editable());
		assert!(field.is_selectable());
		assert!(field.color.is_none());
	}
}
