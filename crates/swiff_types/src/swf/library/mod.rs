//! DefinitionLibrary: immutable definitions addressed by 16-bit library IDs.
//!
//! | Tag family              | Definition                        |
//! |-------------------------|-----------------------------------|
//! | DefineShape 1-4         | [`DefinitionKind::Shape`]         |
//! | DefineFont 1-4, FontInfo 1-2, FontName, FontAlignZones | [`DefinitionKind::Font`] |
//! | DefineText 1-2          | [`DefinitionKind::StaticText`]    |
//! | DefineEditText          | [`DefinitionKind::DynamicText`]   |
//! | DefineSound             | [`DefinitionKind::Sound`]         |
//! | DefineSprite            | [`DefinitionKind::Sprite`]        |
//! | DefineBits*, Lossless*  | [`DefinitionKind::Bitmap`]        |
//!
//! Fonts accumulate across up to four tags and are frozen when the scan ends. Every other
//! definition is complete after its own tag. A definition whose tag fails to decode is
//! dropped and recorded as a diagnostic; the scan goes on.

pub mod bitmap;
pub mod font;
pub mod shape;
pub mod sound;
pub mod sprite;
pub mod text;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::{self, Diagnostic, ErrorKind, SwfError},
	parse_config::ParseConfig,
	records::Rect,
	tag::TagCode,
};

use self::{
	bitmap::Bitmap,
	font::{Font, FontBuilder, FontTag},
	shape::Shape,
	sound::Sound,
	sprite::Sprite,
	text::{DynamicText, StaticText},
};

/// Kind-specific payload of a [`Definition`].
#[derive(Debug, Clone, Serialize)]
pub enum DefinitionKind {
	/// Vector shape
	Shape(Shape),
	/// Font
	Font(Font),
	/// Text field
	DynamicText(DynamicText),
	/// Pre-laid-out text
	StaticText(StaticText),
	/// Event sound
	Sound(Sound),
	/// Nested timeline
	Sprite(Sprite),
	/// Image payload
	Bitmap(Bitmap),
}

/// One library entry.
#[derive(Debug, Clone, Serialize)]
pub struct Definition {
	/// Library ID
	pub library_id: u16,
	/// Declared bounds, for kinds that have them
	pub bounds: Option<Rect>,
	/// Payload
	pub kind: DefinitionKind,
}

impl Definition {
	fn new(library_id: u16, kind: DefinitionKind) -> Self {
		let bounds = match &kind {
			DefinitionKind::Shape(shape) => Some(shape.bounds),
			DefinitionKind::DynamicText(text) => Some(text.bounds),
			DefinitionKind::StaticText(text) => Some(text.bounds),
			DefinitionKind::Bitmap(bitmap) => bitmap.bounds(),
			DefinitionKind::Font(_) | DefinitionKind::Sound(_) | DefinitionKind::Sprite(_) => None,
		};
		Self {
			library_id,
			bounds,
			kind,
		}
	}

	/// Short kind name, e.g. `"Shape"`.
	pub fn kind_name(&self) -> &'static str {
		match self.kind {
			DefinitionKind::Shape(_) => "Shape",
			DefinitionKind::Font(_) => "Font",
			DefinitionKind::DynamicText(_) => "DynamicText",
			DefinitionKind::StaticText(_) => "StaticText",
			DefinitionKind::Sound(_) => "Sound",
			DefinitionKind::Sprite(_) => "Sprite",
			DefinitionKind::Bitmap(_) => "Bitmap",
		}
	}
}

macro_rules! typed_accessor {
	($(#[$meta:meta])* $name:ident, $variant:ident, $ty:ty) => {
		$(#[$meta])*
		pub fn $name(&self, library_id: u16) -> Option<&$ty> {
			match self.get(library_id).map(|definition| &definition.kind) {
				Some(DefinitionKind::$variant(value)) => Some(value),
				_ => None,
			}
		}
	};
}

/// Definitions of one movie, keyed by library ID.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Library {
	definitions: BTreeMap<u16, Definition>,
}

impl Library {
	/// Definition by ID.
	pub fn get(&self, library_id: u16) -> Option<&Definition> {
		self.definitions.get(&library_id)
	}

	/// Returns `true` if the ID is defined.
	pub fn contains(&self, library_id: u16) -> bool {
		self.definitions.contains_key(&library_id)
	}

	/// Number of definitions.
	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	/// Returns `true` if the library holds nothing.
	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	/// Definitions in ID order.
	pub fn iter(&self) -> impl Iterator<Item = &Definition> {
		self.definitions.values()
	}

	typed_accessor!(
		/// Shape by ID.
		shape, Shape, Shape
	);
	typed_accessor!(
		/// Font by ID.
		font, Font, Font
	);
	typed_accessor!(
		/// Sprite by ID.
		sprite, Sprite, Sprite
	);
	typed_accessor!(
		/// Sound by ID.
		sound, Sound, Sound
	);
	typed_accessor!(
		/// Bitmap by ID.
		bitmap, Bitmap, Bitmap
	);
	typed_accessor!(
		/// Static text by ID.
		static_text, StaticText, StaticText
	);
	typed_accessor!(
		/// Text field by ID.
		dynamic_text, DynamicText, DynamicText
	);

	/// Number of definitions per kind name.
	pub fn count_by_kind(&self) -> BTreeMap<&'static str, usize> {
		let mut counts = BTreeMap::new();
		for definition in self.definitions.values() {
			*counts.entry(definition.kind_name()).or_insert(0) += 1;
		}
		counts
	}
}

/// Collects definitions during the top-level scan.
#[derive(Debug, Default)]
pub struct LibraryBuilder {
	definitions: BTreeMap<u16, Definition>,
	fonts: BTreeMap<u16, FontBuilder>,
}

impl LibraryBuilder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Decodes the current tag if it defines something.
	///
	/// Returns `Ok(false)` for tags that are not definitions. A definition that fails to
	/// decode is dropped with a diagnostic.
	///
	/// # Errors
	///
	/// Only terminal errors are returned, e.g. a nested sprite tag overrunning its body.
	pub fn decode_definition(
		&mut self,
		cursor: &mut TagCursor<'_>,
		config: &ParseConfig,
		diagnostics: &mut Vec<Diagnostic>,
	) -> Result<bool, SwfError> {
		let Some(code) = cursor.current_tag_code() else {
			return Ok(false);
		};
		let peeked_id = peek_id(cursor);

		let decoded = match code {
			TagCode::DefineShape => Shape::decode(cursor, config).map(|(id, shape)| Some((id, DefinitionKind::Shape(shape)))),
			TagCode::DefineFont | TagCode::DefineFontInfo | TagCode::DefineFontName | TagCode::DefineFontAlignZones => {
				FontTag::decode(cursor).map(|(id, tag)| {
					self.fonts.entry(id).or_default().apply(tag);
					None
				})
			}
			TagCode::DefineText => StaticText::decode(cursor).map(|(id, text)| Some((id, DefinitionKind::StaticText(text)))),
			TagCode::DefineEditText => {
				DynamicText::decode(cursor).map(|(id, text)| Some((id, DefinitionKind::DynamicText(text))))
			}
			TagCode::DefineSound => Sound::decode(cursor).map(|(id, sound)| Some((id, DefinitionKind::Sound(sound)))),
			TagCode::DefineSprite => {
				Sprite::decode(cursor, config, diagnostics).map(|(id, sprite)| Some((id, DefinitionKind::Sprite(sprite))))
			}
			TagCode::DefineBits => Bitmap::decode_jpeg(cursor).map(|(id, bitmap)| Some((id, DefinitionKind::Bitmap(bitmap)))),
			TagCode::DefineBitsLossless => {
				Bitmap::decode_lossless(cursor).map(|(id, bitmap)| Some((id, DefinitionKind::Bitmap(bitmap))))
			}
			_ => return Ok(false),
		};

		match decoded {
			Ok(Some((id, kind))) => self.insert(Definition::new(id, kind), code, diagnostics),
			Ok(None) => {}
			Err(err) => error::recover(err, Some(code), peeked_id, diagnostics)?,
		}
		Ok(true)
	}

	fn insert(&mut self, definition: Definition, code: TagCode, diagnostics: &mut Vec<Diagnostic>) {
		let id = definition.library_id;
		if self.definitions.contains_key(&id) || self.fonts.contains_key(&id) {
			let diagnostic = Diagnostic {
				kind: ErrorKind::MalformedRecord,
				offset: None,
				tag: Some(code),
				library_id: Some(id),
				message: format!("library id {id} defined twice, keeping the first definition"),
			};
			log::warn!("{diagnostic}");
			diagnostics.push(diagnostic);
			return;
		}
		log::trace!("defined {} {id}", definition.kind_name());
		self.definitions.insert(id, definition);
	}

	/// Freezes pending fonts and returns the library.
	pub fn finish(mut self, diagnostics: &mut Vec<Diagnostic>) -> Library {
		for (id, font) in std::mem::take(&mut self.fonts) {
			if !font.has_glyph_definition() {
				log::debug!("font {id} has info tags but no DefineFont");
			}
			if self.definitions.contains_key(&id) {
				let diagnostic = Diagnostic {
					kind: ErrorKind::MalformedRecord,
					offset: None,
					tag: Some(TagCode::DefineFont),
					library_id: Some(id),
					message: format!("font tags reuse library id {id} of another definition"),
				};
				log::warn!("{diagnostic}");
				diagnostics.push(diagnostic);
				continue;
			}
			self.definitions.insert(id, Definition::new(id, DefinitionKind::Font(font.build())));
		}
		Library {
			definitions: self.definitions,
		}
	}
}

/// The leading UI16 of the current tag body, which is the library ID for every definition tag.
fn peek_id(cursor: &TagCursor<'_>) -> Option<u16> {
	let body = cursor.current_tag()?.body.clone();
	let bytes = cursor.data().get(body.start..body.start.checked_add(2)?)?;
	Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
