//! Font definitions, accumulated across several tag kinds.
//!
//! A font ID can be mentioned by up to four tag families:
//!
//! | Tag                   | Contributes                                           |
//! |-----------------------|-------------------------------------------------------|
//! | DefineFont 1-4        | glyph outlines, code table, layout, name, CFF payload |
//! | DefineFontInfo 1-2    | name, style flags, language, code table               |
//! | DefineFontName        | display name, copyright                               |
//! | DefineFontAlignZones  | CSM hint and per-glyph alignment zones                |
//!
//! Each tag is decoded into a [`FontTag`] and folded into a [`FontBuilder`]. The
//! builder is frozen into an immutable [`Font`] when the movie scan ends.
//!
//! ## DefineFont2 / DefineFont3 Layout
//!
//! ```text
//! UI16     font_id
//! UI8      flags            HasLayout ShiftJIS SmallText ANSI WideOffsets WideCodes Italic Bold
//! UI8      language
//! UI8      name_len
//! UI8[n]   name
//! UI16     num_glyphs
//! UI16/32  offset_table[num_glyphs]   relative to the offset table
//! UI16/32  code_table_offset
//! SHAPE    glyphs[num_glyphs]
//! UI8/16   code_table[num_glyphs]
//! -- HasLayout --
//! SI16     ascent, descent, leading
//! SI16     advances[num_glyphs]
//! RECT     bounds[num_glyphs]
//! UI16     kerning_count
//! KERNINGRECORD[kerning_count]
//! ```

use std::collections::BTreeMap;

use bitflags::bitflags;
use bytes::Bytes;
use encoding_rs::{Encoding, SHIFT_JIS};
use serde::Serialize;

use crate::swf::{
	constants,
	cursor::TagCursor,
	error::SwfError,
	library::shape::{PathOp, glyph_outline, read_shape_records},
	records::Rect,
	tag::{Tag, TagCode},
};

bitflags! {
	/// Style and encoding flags of a font.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct FontFlags: u8 {
		/// Bold face
		const BOLD = 0x01;
		/// Italic face
		const ITALIC = 0x02;
		/// Code table uses 16-bit codes
		const WIDE_CODES = 0x04;
		/// Character codes are ANSI
		const ANSI = 0x08;
		/// Glyphs are aligned on pixel boundaries for small text
		const SMALL_TEXT = 0x10;
		/// Character codes are Shift-JIS
		const SHIFT_JIS = 0x20;
	}
}

/// Language code of a font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Language {
	/// No language
	#[default]
	Unknown,
	/// Latin scripts
	Latin,
	/// Japanese
	Japanese,
	/// Korean
	Korean,
	/// Simplified Chinese
	SimplifiedChinese,
	/// Traditional Chinese
	TraditionalChinese,
}

impl Language {
	/// Maps a LANGCODE byte; unknown values map to [`Language::Unknown`].
	pub fn from_code(code: u8) -> Self {
		match code {
			1 => Language::Latin,
			2 => Language::Japanese,
			3 => Language::Korean,
			4 => Language::SimplifiedChinese,
			5 => Language::TraditionalChinese,
			_ => Language::Unknown,
		}
	}
}

/// Kerning adjustment between two character codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KerningRecord {
	/// Left character code
	pub left: u16,
	/// Right character code
	pub right: u16,
	/// Advance adjustment in em units
	pub adjustment: i16,
}

/// Stroke thickness hint for CSM anti-aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CsmHint {
	/// Thin strokes
	Thin,
	/// Medium strokes
	Medium,
	/// Thick strokes
	Thick,
}

/// One alignment zone of a glyph, in em units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignZone {
	/// Zone start
	pub position: f32,
	/// Zone extent
	pub size: f32,
}

/// Alignment zones of one glyph.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GlyphZones {
	/// Zone data in file order
	pub zones: Vec<AlignZone>,
	/// Zones apply to the X axis
	pub mask_x: bool,
	/// Zones apply to the Y axis
	pub mask_y: bool,
}

/// Optional layout metrics of a font.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FontLayout {
	/// Height above the baseline
	pub ascent: u16,
	/// Depth below the baseline
	pub descent: u16,
	/// Line gap
	pub leading: i16,
	/// Per-glyph advance
	pub advances: Vec<i16>,
	/// Per-glyph bounds
	pub bounds: Vec<Rect>,
	/// Kerning pairs
	pub kerning: Vec<KerningRecord>,
	/// CSM hint from DefineFontAlignZones
	pub csm_hint: Option<CsmHint>,
	/// Per-glyph alignment zones from DefineFontAlignZones
	pub zones: Vec<GlyphZones>,
}

/// A single glyph outline with its character code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Glyph {
	/// Character code, if a code table was seen
	pub code: Option<u16>,
	/// Outline in em units
	pub outline: Vec<PathOp>,
}

/// Fields contributed by a DefineFont tag.
#[derive(Debug, Clone, PartialEq)]
pub struct FontGlyphs {
	/// DefineFont version, 1-4
	pub version: u8,
	/// Style flags (version 2+)
	pub flags: FontFlags,
	/// Language (version 2+)
	pub language: Language,
	/// Name (version 2+)
	pub name: Option<String>,
	/// Glyph outlines in glyph order
	pub outlines: Vec<Vec<PathOp>>,
	/// Character codes (version 2+)
	pub codes: Option<Vec<u16>>,
	/// Layout (version 2+ with HasLayout)
	pub layout: Option<FontLayout>,
	/// Raw CFF payload (version 4)
	pub cff_data: Option<Bytes>,
}

/// A decoded font-related tag.
#[derive(Debug, Clone, PartialEq)]
pub enum FontTag {
	/// DefineFont, DefineFont2, DefineFont3 or DefineFont4
	Glyphs(FontGlyphs),
	/// DefineFontInfo or DefineFontInfo2
	Info {
		/// Font name
		name: String,
		/// Style flags
		flags: FontFlags,
		/// Language (version 2)
		language: Language,
		/// Code table
		codes: Vec<u16>,
	},
	/// DefineFontName
	Name {
		/// Display name
		name: String,
		/// Copyright notice
		copyright: String,
	},
	/// DefineFontAlignZones
	AlignZones {
		/// Thickness hint
		hint: CsmHint,
		/// Per-glyph zones
		zones: Vec<GlyphZones>,
	},
}

impl FontTag {
	/// Decodes the current font tag. Returns the font ID and the decoded part.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] for inconsistent offset tables and
	/// [`SwfError::Truncated`] for short bodies.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<(u16, FontTag), SwfError> {
		let offset = cursor.position();
		match cursor.current_tag().and_then(Tag::full_code) {
			Some(TagCode::DefineFontName) => decode_font_name(cursor),
			Some(TagCode::DefineFontAlignZones) => decode_align_zones(cursor),
			Some(TagCode::DefineFontInfo | TagCode::DefineFontInfo2) => decode_font_info(cursor),
			Some(TagCode::DefineFont | TagCode::DefineFont2 | TagCode::DefineFont3 | TagCode::DefineFont4) => {
				decode_define_font(cursor)
			}
			_ => Err(SwfError::malformed_tag(offset, "not a font tag")),
		}
	}
}

fn read_codes(cursor: &mut TagCursor<'_>, count: usize, wide: bool) -> Result<Vec<u16>, SwfError> {
	let mut codes = Vec::with_capacity(count.min(cursor.remaining()));
	for _ in 0..count {
		codes.push(if wide {
			cursor.read_u16()?
		} else {
			u16::from(cursor.read_u8()?)
		});
	}
	Ok(codes)
}

fn name_encoding(cursor: &TagCursor<'_>, flags: FontFlags) -> &'static Encoding {
	if flags.contains(FontFlags::SHIFT_JIS) {
		SHIFT_JIS
	} else {
		cursor.string_encoding()
	}
}

/// Reads glyph shapes whose offsets are relative to `table_start`; the last glyph ends at `end`.
fn read_glyph_table(
	cursor: &mut TagCursor<'_>,
	table_start: usize,
	offsets: &[usize],
	end: usize,
) -> Result<Vec<Vec<PathOp>>, SwfError> {
	let body_end = cursor.limit();
	let version = cursor.version();
	let mut outlines = Vec::with_capacity(offsets.len());

	for (index, &offset) in offsets.iter().enumerate() {
		let start = table_start + offset;
		let stop = offsets.get(index + 1).map_or(end, |next| table_start + next);
		if start > stop || stop > body_end {
			return Err(SwfError::malformed_record(
				table_start,
				format!("glyph {index} spans {start:#x}..{stop:#x} outside the tag body"),
			));
		}
		if start == stop {
			outlines.push(Vec::new());
			continue;
		}
		cursor.seek(start);
		cursor.set_limit(stop);
		let records = read_shape_records(cursor, 0, version);
		cursor.set_limit(body_end);
		outlines.push(glyph_outline(&records?));
	}

	cursor.seek(end);
	Ok(outlines)
}

fn decode_define_font(cursor: &mut TagCursor<'_>) -> Result<(u16, FontTag), SwfError> {
	let version = cursor.current_tag_version();
	let id = cursor.read_u16()?;

	if version == 1 {
		let table_start = cursor.position();
		let body_end = cursor.limit();
		if cursor.remaining() == 0 {
			return Ok((id, FontTag::Glyphs(empty_glyphs(1))));
		}
		let first = usize::from(cursor.read_u16()?);
		let count = first / 2;
		let mut offsets = vec![first];
		for _ in 1..count {
			offsets.push(usize::from(cursor.read_u16()?));
		}
		let outlines = read_glyph_table(cursor, table_start, &offsets, body_end)?;
		return Ok((
			id,
			FontTag::Glyphs(FontGlyphs {
				outlines,
				..empty_glyphs(1)
			}),
		));
	}

	if version == 4 {
		let raw_flags = cursor.read_u8()?;
		let name = cursor.read_string()?;
		let cff_data = if raw_flags & 0x04 != 0 {
			Some(cursor.read_remaining_shared())
		} else {
			None
		};
		let mut flags = FontFlags::empty();
		flags.set(FontFlags::BOLD, raw_flags & 0x01 != 0);
		flags.set(FontFlags::ITALIC, raw_flags & 0x02 != 0);
		return Ok((
			id,
			FontTag::Glyphs(FontGlyphs {
				flags,
				name: Some(name),
				cff_data,
				..empty_glyphs(4)
			}),
		));
	}

	let raw_flags = cursor.read_u8()?;
	let has_layout = raw_flags & 0x80 != 0;
	let wide_offsets = raw_flags & 0x08 != 0;
	let wide_codes = raw_flags & 0x04 != 0 || version >= 3;

	let mut flags = FontFlags::empty();
	flags.set(FontFlags::SHIFT_JIS, raw_flags & 0x40 != 0);
	flags.set(FontFlags::SMALL_TEXT, raw_flags & 0x20 != 0);
	flags.set(FontFlags::ANSI, raw_flags & 0x10 != 0);
	flags.set(FontFlags::WIDE_CODES, wide_codes);
	flags.set(FontFlags::ITALIC, raw_flags & 0x02 != 0);
	flags.set(FontFlags::BOLD, raw_flags & 0x01 != 0);

	let language = Language::from_code(cursor.read_u8()?);
	let name_len = usize::from(cursor.read_u8()?);
	let name_bytes = cursor.read_bytes(name_len)?;
	let (name, _, _) = name_encoding(cursor, flags).decode(name_bytes);
	let name = name.trim_end_matches('\0').to_string();

	let count = usize::from(cursor.read_u16()?);
	let table_start = cursor.position();
	let read_offset = |cursor: &mut TagCursor<'_>| -> Result<usize, SwfError> {
		if wide_offsets {
			Ok(cursor.read_u32()? as usize)
		} else {
			Ok(usize::from(cursor.read_u16()?))
		}
	};

	let mut offsets = Vec::with_capacity(count.min(cursor.remaining()));
	for _ in 0..count {
		offsets.push(read_offset(cursor)?);
	}
	let offset_size = if wide_offsets {
		4
	} else {
		2
	};
	let code_table_offset = if count > 0 || cursor.remaining() >= offset_size {
		read_offset(cursor)?
	} else {
		cursor.position() - table_start
	};

	let outlines = read_glyph_table(cursor, table_start, &offsets, table_start + code_table_offset)?;
	let codes = read_codes(cursor, count, wide_codes)?;

	let layout = if has_layout {
		let ascent = cursor.read_u16()?;
		let descent = cursor.read_u16()?;
		let leading = cursor.read_i16()?;
		let mut advances = Vec::with_capacity(count);
		for _ in 0..count {
			advances.push(cursor.read_i16()?);
		}
		let mut bounds = Vec::with_capacity(count);
		for _ in 0..count {
			bounds.push(Rect::read(cursor)?);
		}
		let kerning_count = usize::from(cursor.read_u16()?);
		let mut kerning = Vec::with_capacity(kerning_count.min(cursor.remaining()));
		for _ in 0..kerning_count {
			let pair = read_codes(cursor, 2, wide_codes)?;
			kerning.push(KerningRecord {
				left: pair[0],
				right: pair[1],
				adjustment: cursor.read_i16()?,
			});
		}
		Some(FontLayout {
			ascent,
			descent,
			leading,
			advances,
			bounds,
			kerning,
			..FontLayout::default()
		})
	} else {
		None
	};

	Ok((
		id,
		FontTag::Glyphs(FontGlyphs {
			version,
			flags,
			language,
			name: Some(name),
			outlines,
			codes: Some(codes),
			layout,
			cff_data: None,
		}),
	))
}

fn empty_glyphs(version: u8) -> FontGlyphs {
	FontGlyphs {
		version,
		flags: FontFlags::empty(),
		language: Language::Unknown,
		name: None,
		outlines: Vec::new(),
		codes: None,
		layout: None,
		cff_data: None,
	}
}

fn decode_font_info(cursor: &mut TagCursor<'_>) -> Result<(u16, FontTag), SwfError> {
	let version = cursor.current_tag_version();
	let id = cursor.read_u16()?;
	let name_len = usize::from(cursor.read_u8()?);
	let name_bytes = cursor.read_bytes(name_len)?;
	let raw_flags = cursor.read_u8()?;

	let mut flags = FontFlags::empty();
	flags.set(FontFlags::SMALL_TEXT, raw_flags & 0x20 != 0);
	flags.set(FontFlags::SHIFT_JIS, raw_flags & 0x10 != 0);
	flags.set(FontFlags::ANSI, raw_flags & 0x08 != 0);
	flags.set(FontFlags::ITALIC, raw_flags & 0x04 != 0);
	flags.set(FontFlags::BOLD, raw_flags & 0x02 != 0);
	flags.set(FontFlags::WIDE_CODES, raw_flags & 0x01 != 0);

	let (name, _, _) = name_encoding(cursor, flags).decode(name_bytes);
	let name = name.trim_end_matches('\0').to_string();

	let language = if version >= 2 {
		Language::from_code(cursor.read_u8()?)
	} else {
		Language::Unknown
	};

	let wide = flags.contains(FontFlags::WIDE_CODES);
	let count = if wide {
		cursor.remaining() / 2
	} else {
		cursor.remaining()
	};
	let codes = read_codes(cursor, count, wide)?;

	Ok((
		id,
		FontTag::Info {
			name,
			flags,
			language,
			codes,
		},
	))
}

fn decode_font_name(cursor: &mut TagCursor<'_>) -> Result<(u16, FontTag), SwfError> {
	let id = cursor.read_u16()?;
	let name = cursor.read_string()?;
	let copyright = cursor.read_string()?;
	Ok((
		id,
		FontTag::Name {
			name,
			copyright,
		},
	))
}

fn decode_align_zones(cursor: &mut TagCursor<'_>) -> Result<(u16, FontTag), SwfError> {
	let id = cursor.read_u16()?;
	let offset = cursor.position();
	let hint = match cursor.read_ubits(2)? {
		0 => CsmHint::Thin,
		1 => CsmHint::Medium,
		2 => CsmHint::Thick,
		other => return Err(SwfError::malformed_record(offset, format!("reserved CSM hint {other}"))),
	};
	cursor.read_ubits(6)?;

	let mut zones = Vec::new();
	while cursor.remaining() > 0 {
		let count = cursor.read_u8()?;
		let mut glyph = GlyphZones::default();
		for _ in 0..count {
			let position = cursor.read_f16()?;
			let size = cursor.read_f16()?;
			glyph.zones.push(AlignZone {
				position,
				size,
			});
		}
		cursor.read_ubits(6)?;
		glyph.mask_y = cursor.read_bit()?;
		glyph.mask_x = cursor.read_bit()?;
		zones.push(glyph);
	}

	Ok((
		id,
		FontTag::AlignZones {
			hint,
			zones,
		},
	))
}

/// Mutable staging state of a font while the movie is being scanned.
#[derive(Debug, Clone, Default)]
pub struct FontBuilder {
	version: u8,
	name: Option<String>,
	copyright: Option<String>,
	flags: FontFlags,
	language: Language,
	outlines: Vec<Vec<PathOp>>,
	codes: Option<Vec<u16>>,
	layout: Option<FontLayout>,
	cff_data: Option<Bytes>,
}

impl FontBuilder {
	/// Creates an empty builder with no glyphs.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` once a DefineFont tag has been applied.
	pub fn has_glyph_definition(&self) -> bool {
		self.version > 0
	}

	/// Folds a decoded tag into the builder.
	///
	/// Later tags overwrite the fields they carry; a DefineFontInfo name does not
	/// replace a DefineFontName display name.
	pub fn apply(&mut self, tag: FontTag) {
		match tag {
			FontTag::Glyphs(glyphs) => {
				self.version = glyphs.version;
				self.flags |= glyphs.flags;
				if glyphs.language != Language::Unknown {
					self.language = glyphs.language;
				}
				if self.name.is_none() {
					self.name = glyphs.name;
				}
				self.outlines = glyphs.outlines;
				if glyphs.codes.is_some() {
					self.codes = glyphs.codes;
				}
				if let Some(mut layout) = glyphs.layout {
					if let Some(previous) = self.layout.take() {
						layout.csm_hint = previous.csm_hint;
						layout.zones = previous.zones;
					}
					self.layout = Some(layout);
				}
				self.cff_data = glyphs.cff_data;
			}
			FontTag::Info {
				name,
				flags,
				language,
				codes,
			} => {
				if self.name.is_none() {
					self.name = Some(name);
				}
				self.flags |= flags;
				if language != Language::Unknown {
					self.language = language;
				}
				self.codes = Some(codes);
			}
			FontTag::Name {
				name,
				copyright,
			} => {
				self.name = Some(name);
				self.copyright = Some(copyright);
			}
			FontTag::AlignZones {
				hint,
				zones,
			} => {
				let layout = self.layout.get_or_insert_with(FontLayout::default);
				layout.csm_hint = Some(hint);
				layout.zones = zones;
			}
		}
	}

	/// Freezes the builder.
	pub fn build(self) -> Font {
		let codes = self.codes.unwrap_or_default();
		let glyphs: Vec<Glyph> = self
			.outlines
			.into_iter()
			.enumerate()
			.map(|(index, outline)| Glyph {
				code: codes.get(index).copied(),
				outline,
			})
			.collect();
		let code_index = glyphs
			.iter()
			.enumerate()
			.filter_map(|(index, glyph)| glyph.code.map(|code| (code, index)))
			.collect();

		Font {
			version: self.version,
			name: self.name,
			copyright: self.copyright,
			flags: self.flags,
			language: self.language,
			glyphs,
			code_index,
			layout: self.layout,
			cff_data: self.cff_data,
		}
	}
}

/// An immutable font definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
	/// DefineFont version, 0 when only info tags were seen
	pub version: u8,
	/// Font name
	pub name: Option<String>,
	/// Copyright from DefineFontName
	pub copyright: Option<String>,
	/// Style and encoding flags
	pub flags: FontFlags,
	/// Language
	pub language: Language,
	/// Glyphs in glyph order
	pub glyphs: Vec<Glyph>,
	#[serde(skip)]
	code_index: BTreeMap<u16, usize>,
	/// Layout metrics, if present
	pub layout: Option<FontLayout>,
	/// Raw CFF payload of DefineFont4
	#[serde(skip)]
	pub cff_data: Option<Bytes>,
}

impl Font {
	/// Size of the em square glyph outlines are expressed in.
	pub fn em_square(&self) -> f32 {
		if self.version >= 3 {
			constants::EM_SQUARE_HIGH_RES
		} else {
			constants::EM_SQUARE
		}
	}

	/// Whether the font is bold.
	pub fn is_bold(&self) -> bool {
		self.flags.contains(FontFlags::BOLD)
	}

	/// Whether the font is italic.
	pub fn is_italic(&self) -> bool {
		self.flags.contains(FontFlags::ITALIC)
	}

	/// Glyph index for a character code.
	pub fn glyph_index(&self, code: u16) -> Option<usize> {
		self.code_index.get(&code).copied()
	}

	/// Advance of a glyph in em units, if layout is present.
	pub fn advance(&self, glyph_index: usize) -> Option<i16> {
		self.layout.as_ref()?.advances.get(glyph_index).copied()
	}

	/// Kerning adjustment between two character codes; 0 when none is declared.
	pub fn kerning(&self, left: u16, right: u16) -> i16 {
		self.layout
			.as_ref()
			.and_then(|layout| {
				layout.kerning.iter().find(|record| record.left == left && record.right == right)
			})
			.map_or(0, |record| record.adjustment)
	}

	/// Lays out a string with advances and kerning. Returns the total advance in em units,
	/// or `None` if a character has no glyph or the font has no layout.
	pub fn measure(&self, text: &str) -> Option<i32> {
		let mut total = 0i32;
		let mut previous: Option<u16> = None;
		for ch in text.chars() {
			let code = u16::try_from(u32::from(ch)).ok()?;
			let index = self.glyph_index(code)?;
			total += i32::from(self.advance(index)?);
			if let Some(left) = previous {
				total += i32::from(self.kerning(left, code));
			}
			previous = Some(code);
		}
		Some(total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::{
		ParseConfig,
		writer::{BitWriter, SwfWriter},
	};

	fn decode_first(version: u8, code: TagCode, body: &[u8]) -> Result<(u16, FontTag), SwfError> {
		let mut writer = SwfWriter::new(version);
		writer.tag(code, body);
		let data = bytes::Bytes::from(writer.finish().unwrap());
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		assert!(cursor.advance_to_next_tag().unwrap());
		FontTag::decode(&mut cursor)
	}

	fn glyph_square() -> Vec<u8> {
		let mut writer = BitWriter::new();
		writer.write_ubits(1, 4);
		writer.write_ubits(0, 4);
		writer.write_bit(false);
		writer.write_ubits(0b00101, 5);
		writer.write_ubits(2, 5);
		writer.write_sbits(0, 2);
		writer.write_sbits(0, 2);
		writer.write_ubits(1, 1);
		writer.write_bit(true);
		writer.write_bit(true);
		writer.write_ubits(8, 4);
		writer.write_bit(true);
		writer.write_sbits(300, 10);
		writer.write_sbits(-200, 10);
		writer.write_bit(false);
		writer.write_ubits(0, 5);
		writer.into_bytes()
	}

	#[test]
	fn test_define_font2_with_layout() {
		let glyph = glyph_square();
		let mut body = BitWriter::new();
		body.write_u16(7);
		body.write_u8(0x80 | 0x04 | 0x01); // layout, wide codes, bold
		body.write_u8(1);
		body.write_u8(4);
		body.write_bytes(b"Sans");
		body.write_u16(2);
		// two glyph offsets + code table offset, 2 bytes each
		let first = 6u16;
		body.write_u16(first);
		body.write_u16(first + glyph.len() as u16);
		body.write_u16(first + 2 * glyph.len() as u16);
		body.write_bytes(&glyph);
		body.write_bytes(&glyph);
		body.write_u16(u16::from(b'A'));
		body.write_u16(u16::from(b'B'));
		body.write_u16(900);
		body.write_u16(200);
		body.write_i16(0);
		body.write_i16(500);
		body.write_i16(600);
		body.write_rect(&Rect::new(0, 300, -200, 0));
		body.write_rect(&Rect::new(0, 300, -200, 0));
		body.write_u16(1);
		body.write_u16(u16::from(b'A'));
		body.write_u16(u16::from(b'B'));
		body.write_i16(-40);

		let (id, tag) = decode_first(8, TagCode::DefineFont2, &body.into_bytes()).unwrap();
		assert_eq!(id, 7);
		let mut builder = FontBuilder::new();
		builder.apply(tag);
		let font = builder.build();

		assert_eq!(font.name.as_deref(), Some("Sans"));
		assert!(font.is_bold());
		assert!(!font.is_italic());
		assert_eq!(font.language, Language::Latin);
		assert_eq!(font.glyphs.len(), 2);
		assert_eq!(font.glyphs[1].outline, vec![
			PathOp::MoveTo {
				x: 0,
				y: 0,
			},
			PathOp::LineTo {
				x: 300,
				y: -200,
			},
		]);
		assert_eq!(font.glyph_index(u16::from(b'B')), Some(1));
		assert_eq!(font.kerning(u16::from(b'A'), u16::from(b'B')), -40);
		assert_eq!(font.measure("AB"), Some(500 + 600 - 40));
		assert_eq!(font.em_square(), 1024.0);
	}

	#[test]
	fn test_define_font1_then_info() {
		let glyph = glyph_square();
		let mut body = BitWriter::new();
		body.write_u16(3);
		body.write_u16(2);
		body.write_bytes(&glyph);
		let (id, glyphs) = decode_first(5, TagCode::DefineFont, &body.into_bytes()).unwrap();
		assert_eq!(id, 3);

		let mut info = BitWriter::new();
		info.write_u16(3);
		info.write_u8(5);
		info.write_bytes(b"Serif");
		info.write_u8(0x02 | 0x04); // bold, italic, narrow codes
		info.write_u8(b'x');
		let (_, info) = decode_first(5, TagCode::DefineFontInfo, &info.into_bytes()).unwrap();

		let mut builder = FontBuilder::new();
		assert!(!builder.has_glyph_definition());
		builder.apply(glyphs);
		assert!(builder.has_glyph_definition());
		builder.apply(info);
		let font = builder.build();
		assert_eq!(font.name.as_deref(), Some("Serif"));
		assert!(font.is_bold() && font.is_italic());
		assert_eq!(font.glyphs[0].code, Some(u16::from(b'x')));
		assert!(font.layout.is_none());
		assert_eq!(font.measure("x"), None);
	}

	#[test]
	fn test_font_name_and_zones() {
		let mut name = BitWriter::new();
		name.write_u16(9);
		name.write_string("Display");
		name.write_string("(c) nobody");
		let (_, name) = decode_first(10, TagCode::DefineFontName, &name.into_bytes()).unwrap();

		let mut zones = BitWriter::new();
		zones.write_u16(9);
		zones.write_ubits(1, 2);
		zones.write_ubits(0, 6);
		zones.write_u8(2);
		for half in [0x3C00u16, 0x4000, 0x0000, 0x3800] {
			zones.write_u16(half);
		}
		zones.write_ubits(0, 6);
		zones.write_bit(true);
		zones.write_bit(false);
		let (_, zones) = decode_first(10, TagCode::DefineFontAlignZones, &zones.into_bytes()).unwrap();

		let mut builder = FontBuilder::new();
		builder.apply(zones);
		builder.apply(name);
		let font = builder.build();
		assert_eq!(font.copyright.as_deref(), Some("(c) nobody"));
		let layout = font.layout.unwrap();
		assert_eq!(layout.csm_hint, Some(CsmHint::Medium));
		assert_eq!(layout.zones.len(), 1);
		assert_eq!(layout.zones[0].zones[0], AlignZone {
			position: 1.0,
			size: 2.0,
		});
		assert_eq!(layout.zones[0].zones[1].size, 0.5);
		assert!(layout.zones[0].mask_y);
		assert!(!layout.zones[0].mask_x);
	}

	#[test]
	fn test_shift_jis_font_info_name() {
		let mut info = BitWriter::new();
		info.write_u16(1);
		let (encoded, _, _) = SHIFT_JIS.encode("ゴシック");
		info.write_u8(encoded.len() as u8);
		info.write_bytes(&encoded);
		info.write_u8(0x10);
		let (_, tag) = decode_first(5, TagCode::DefineFontInfo, &info.into_bytes()).unwrap();
		let FontTag::Info {
			name,
			..
		} = tag
		else {
			panic!("expected font info");
		};
		assert_eq!(name, "ゴシック");
	}

	#[test]
	fn test_glyph_offsets_outside_body() {
		let mut body = BitWriter::new();
		body.write_u16(1);
		body.write_u16(4);
		body.write_u16(0x4000);
		assert!(matches!(
			decode_first(5, TagCode::DefineFont, &body.into_bytes()),
			Err(SwfError::MalformedRecord {
				..
			})
		));
	}

	#[test]
	fn test_define_font4_cff() {
		let mut body = BitWriter::new();
		body.write_u16(2);
		body.write_u8(0x04 | 0x02);
		body.write_string("Cff");
		body.write_bytes(b"OTTO");
		let (_, tag) = decode_first(10, TagCode::DefineFont4, &body.into_bytes()).unwrap();
		let mut builder = FontBuilder::new();
		builder.apply(tag);
		let font = builder.build();
		assert!(font.is_italic());
		assert_eq!(font.version, 4);
		assert_eq!(font.cff_data.as_deref(), Some(&b"OTTO"[..]));
		assert!(font.glyphs.is_empty());
	}
}
