//! The decoded movie: header, library, top-level timeline and metadata.
//!
//! Decoding is one linear pass over the top-level tag stream:
//!
//! 1. [`decompress`] produces the working buffer. Failure here is terminal and happens
//!    before any tag is read.
//! 2. Each tag is offered to the [`TimelineBuilder`], then to the [`LibraryBuilder`], then
//!    to the movie-level handlers (file attributes, exports, scenes, ...).
//! 3. References from placed objects to missing definitions are reported once per ID.
//!
//! Framing errors abort the parse. Record-level errors drop one definition or placement
//! and are kept in [`Movie::diagnostics`].

use std::{
	collections::{BTreeMap, BTreeSet},
	io::Read,
	path::Path,
};

use bitflags::bitflags;
use bytes::Bytes;
use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::{self, Diagnostic, ErrorKind, SwfError},
	header::{Header, decompress},
	library::{Definition, DefinitionKind, Library, LibraryBuilder, sound::SoundTarget},
	parse_config::ParseConfig,
	records::Color,
	tag::TagCode,
	timeline::{
		Timeline, TimelineBuilder,
		frame::Frame,
		placed::PlacedObject,
		scene::{Scene, SceneData},
	},
};

bitflags! {
	/// FileAttributes flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct FileAttributes: u32 {
		/// Hardware blitting requested
		const USE_DIRECT_BLIT = 0x40;
		/// GPU compositing requested
		const USE_GPU = 0x20;
		/// A Metadata tag is present
		const HAS_METADATA = 0x10;
		/// Scripts are ActionScript 3
		const ACTION_SCRIPT_3 = 0x08;
		/// Local playback may use the network
		const USE_NETWORK = 0x01;
	}
}

/// A fully decoded movie.
#[derive(Debug, Clone)]
pub struct Movie {
	header: Header,
	library: Library,
	timeline: Timeline,
	file_attributes: FileAttributes,
	metadata: Option<String>,
	exports: BTreeMap<String, u16>,
	symbol_classes: BTreeMap<String, u16>,
	jpeg_tables: Option<Bytes>,
	diagnostics: Vec<Diagnostic>,
}

/// Serializable overview of a movie.
#[derive(Debug, Clone, Serialize)]
pub struct MovieSummary {
	/// Movie header
	pub header: Header,
	/// Number of definitions per kind
	pub definitions: BTreeMap<&'static str, usize>,
	/// Frames of the top-level timeline
	pub frame_count: usize,
	/// Scenes of the top-level timeline
	pub scene_count: usize,
	/// Frame labels of the top-level timeline
	pub label_count: usize,
	/// Exported symbols
	pub export_count: usize,
	/// First stage background color
	pub background_color: Option<Color>,
	/// FileAttributes flags
	pub file_attributes: FileAttributes,
	/// Recovered problems
	pub diagnostic_count: usize,
}

#[derive(Debug, Default)]
struct MovieTags {
	file_attributes: FileAttributes,
	metadata: Option<String>,
	exports: BTreeMap<String, u16>,
	symbol_classes: BTreeMap<String, u16>,
	jpeg_tables: Option<Bytes>,
	scene_data: Option<SceneData>,
}

impl MovieTags {
	fn handle_tag(&mut self, cursor: &mut TagCursor<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<(), SwfError> {
		let Some(code) = cursor.current_tag_code() else {
			if let Some(tag) = cursor.current_tag() {
				log::debug!("skipping unknown tag {tag}");
			}
			return Ok(());
		};

		let result = match code {
			TagCode::FileAttributes => cursor.read_u32().map(|bits| {
				self.file_attributes = FileAttributes::from_bits_truncate(bits);
			}),
			TagCode::Metadata => cursor.read_string().map(|xml| self.metadata = Some(xml)),
			TagCode::ExportAssets => read_symbol_table(cursor).map(|entries| self.exports.extend(entries)),
			TagCode::SymbolClass => read_symbol_table(cursor).map(|entries| self.symbol_classes.extend(entries)),
			TagCode::JpegTables => {
				self.jpeg_tables = Some(cursor.read_remaining_shared());
				Ok(())
			}
			TagCode::DefineSceneAndFrameLabelData => SceneData::decode(cursor).map(|data| {
				if self.scene_data.is_some() {
					log::debug!("second DefineSceneAndFrameLabelData replaces the first");
				}
				self.scene_data = Some(data);
			}),
			TagCode::DoAction | TagCode::DoInitAction | TagCode::DoAbc => {
				log::debug!("skipping script tag {code}");
				Ok(())
			}
			TagCode::DefineButton |
			TagCode::DefineButtonSound |
			TagCode::DefineButtonCxform |
			TagCode::DefineMorphShape |
			TagCode::DefineVideoStream |
			TagCode::VideoFrame |
			TagCode::DefineBinaryData |
			TagCode::DefineScalingGrid |
			TagCode::CsmTextSettings => {
				log::debug!("skipping uninterpreted tag {code}");
				Ok(())
			}
			_ => {
				log::debug!("ignoring {code}");
				Ok(())
			}
		};

		match result {
			Ok(()) => Ok(()),
			Err(err) => error::recover(err, Some(code), None, diagnostics),
		}
	}
}

fn read_symbol_table(cursor: &mut TagCursor<'_>) -> Result<Vec<(String, u16)>, SwfError> {
	let count = cursor.read_u16()?;
	let mut entries = Vec::with_capacity(usize::from(count));
	for _ in 0..count {
		let id = cursor.read_u16()?;
		entries.push((cursor.read_string()?, id));
	}
	Ok(entries)
}

impl Movie {
	/// Decodes a movie with the default [`ParseConfig`].
	///
	/// # Errors
	///
	/// Returns the first terminal error: a container problem, a decompression failure,
	/// a truncated header or a malformed tag frame.
	///
	/// # Examples
	///
	/// ```
	/// use swiff_types::swf::{Movie, SwfWriter};
	///
	/// let mut writer = SwfWriter::new(6);
	/// writer.show_frame();
	/// let movie = Movie::from_bytes(&writer.finish().unwrap()).unwrap();
	/// assert_eq!(movie.header().version, 6);
	/// assert!(movie.diagnostics().is_empty());
	/// ```
	pub fn from_bytes(data: &[u8]) -> Result<Self, SwfError> {
		Self::from_bytes_with_config(data, &ParseConfig::default())
	}

	/// Decodes a movie with an explicit configuration.
	///
	/// # Errors
	///
	/// See [`Movie::from_bytes`]. With [`ParseConfig::reject_diagnostics`] set, the first
	/// diagnostic is returned as an error instead.
	pub fn from_bytes_with_config(data: &[u8], config: &ParseConfig) -> Result<Self, SwfError> {
		let buffer = decompress(data)?;
		Self::parse(&buffer, config)
	}

	/// Reads and decodes a file.
	///
	/// # Errors
	///
	/// I/O errors and everything [`Movie::from_bytes`] returns.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SwfError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Reads a reader to its end and decodes the bytes.
	///
	/// # Errors
	///
	/// I/O errors and everything [`Movie::from_bytes`] returns.
	pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, SwfError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_bytes(&data)
	}

	fn parse(buffer: &Bytes, config: &ParseConfig) -> Result<Self, SwfError> {
		let mut cursor = TagCursor::new(buffer, config);
		let header = cursor.read_header()?;
		log::debug!("{header}");

		let mut diagnostics = Vec::new();
		let mut timeline = TimelineBuilder::new(header.frame_count);
		let mut library = LibraryBuilder::new();
		let mut tags = MovieTags::default();

		while cursor.advance_to_next_tag()? {
			if timeline.handle_tag(&mut cursor, &mut diagnostics)? {
				continue;
			}
			if library.decode_definition(&mut cursor, config, &mut diagnostics)? {
				continue;
			}
			tags.handle_tag(&mut cursor, &mut diagnostics)?;
		}

		let library = library.finish(&mut diagnostics);
		let timeline = timeline.finish(config, &mut diagnostics, tags.scene_data.as_ref(), None);
		check_references(&library, &timeline, &mut diagnostics);
		check_sprite_cycles(&library, &mut diagnostics);
		if config.reject_diagnostics {
			if let Some(first) = diagnostics.first() {
				return Err(SwfError::from(first));
			}
		}

		let movie = Self {
			header,
			library,
			timeline,
			file_attributes: tags.file_attributes,
			metadata: tags.metadata,
			exports: tags.exports,
			symbol_classes: tags.symbol_classes,
			jpeg_tables: tags.jpeg_tables,
			diagnostics,
		};
		log::info!(
			"decoded SWF v{}: {} definitions, {} frames, {} scenes, {} diagnostics",
			movie.header.version,
			movie.library.len(),
			movie.timeline.frame_count(),
			movie.timeline.scenes().len(),
			movie.diagnostics.len()
		);
		Ok(movie)
	}

	/// Movie header.
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Frames of the top-level timeline. Never zero.
	pub fn frame_count(&self) -> usize {
		self.timeline.frame_count()
	}

	/// Authored frames per second.
	pub fn frame_rate(&self) -> f32 {
		self.header.frame_rate
	}

	/// Definition by library ID.
	pub fn definition(&self, library_id: u16) -> Option<&Definition> {
		self.library.get(library_id)
	}

	/// All definitions.
	pub fn library(&self) -> &Library {
		&self.library
	}

	/// The top-level timeline.
	pub fn timeline(&self) -> &Timeline {
		&self.timeline
	}

	/// Frames of the top-level timeline.
	pub fn frames(&self) -> &[Frame] {
		self.timeline.frames()
	}

	/// Scenes of the top-level timeline.
	pub fn scenes(&self) -> &[Scene] {
		self.timeline.scenes()
	}

	/// First stage background color set by the movie.
	pub fn background_color(&self) -> Option<Color> {
		self.timeline.frames().iter().find_map(Frame::background_color)
	}

	/// FileAttributes flags.
	pub fn file_attributes(&self) -> FileAttributes {
		self.file_attributes
	}

	/// Metadata XML.
	pub fn metadata(&self) -> Option<&str> {
		self.metadata.as_deref()
	}

	/// ExportAssets names.
	pub fn exports(&self) -> &BTreeMap<String, u16> {
		&self.exports
	}

	/// SymbolClass names.
	pub fn symbol_classes(&self) -> &BTreeMap<String, u16> {
		&self.symbol_classes
	}

	/// Library ID bound to an exported or class name.
	pub fn resolve_symbol(&self, name: &str) -> Option<u16> {
		self.exports.get(name).or_else(|| self.symbol_classes.get(name)).copied()
	}

	/// Shared JPEG tables for DefineBits bitmaps.
	pub fn jpeg_tables(&self) -> Option<&Bytes> {
		self.jpeg_tables.as_ref()
	}

	/// Problems recovered from during decoding.
	pub fn diagnostics(&self) -> &[Diagnostic] {
		&self.diagnostics
	}

	/// Placed objects of a frame in depth order, without objects whose definition is missing.
	pub fn display_list<'a>(&'a self, frame: &'a Frame) -> Vec<&'a PlacedObject> {
		frame.placed_objects().filter(|object| self.library.contains(object.library_id)).collect()
	}

	/// Serializable overview.
	pub fn summary(&self) -> MovieSummary {
		MovieSummary {
			header: self.header,
			definitions: self.library.count_by_kind(),
			frame_count: self.timeline.frame_count(),
			scene_count: self.timeline.scenes().len(),
			label_count: self.timeline.labels().len(),
			export_count: self.exports.len(),
			background_color: self.background_color(),
			file_attributes: self.file_attributes,
			diagnostic_count: self.diagnostics.len(),
		}
	}
}

/// Reports every sprite that ends up placing itself, directly or through other sprites.
///
/// Depth-first walk over the sprite placement graph; a placement that reaches a sprite
/// still on the walk path closes a cycle. One diagnostic is recorded per cycle found.
fn check_sprite_cycles(library: &Library, diagnostics: &mut Vec<Diagnostic>) {
	#[derive(Clone, Copy, PartialEq, Eq)]
	enum Mark {
		OnPath,
		Done,
	}

	let children: BTreeMap<u16, BTreeSet<u16>> = library
		.iter()
		.filter_map(|definition| match &definition.kind {
			DefinitionKind::Sprite(sprite) => {
				let placed = sprite
					.timeline
					.placements()
					.map(|(_, object)| object.library_id)
					.filter(|id| library.sprite(*id).is_some())
					.collect();
				Some((definition.library_id, placed))
			}
			_ => None,
		})
		.collect();

	let mut marks: BTreeMap<u16, Mark> = BTreeMap::new();
	for (&root, root_children) in &children {
		if marks.contains_key(&root) {
			continue;
		}
		marks.insert(root, Mark::OnPath);
		let mut path = vec![root];
		let mut stack = vec![root_children.iter()];

		while let Some(edges) = stack.last_mut() {
			let Some(&child) = edges.next() else {
				stack.pop();
				if let Some(done) = path.pop() {
					marks.insert(done, Mark::Done);
				}
				continue;
			};
			match marks.get(&child) {
				Some(Mark::Done) => {}
				Some(Mark::OnPath) => {
					let start = path.iter().position(|id| *id == child).unwrap_or(0);
					let chain: Vec<String> = path[start..].iter().chain([&child]).map(u16::to_string).collect();
					let diagnostic = Diagnostic {
						kind: ErrorKind::MalformedRecord,
						offset: None,
						tag: Some(TagCode::DefineSprite),
						library_id: Some(child),
						message: format!("sprite {child} places itself: {}", chain.join(" -> ")),
					};
					log::warn!("{diagnostic}");
					diagnostics.push(diagnostic);
				}
				None => {
					if let Some(grandchildren) = children.get(&child) {
						marks.insert(child, Mark::OnPath);
						path.push(child);
						stack.push(grandchildren.iter());
					}
				}
			}
		}
	}
}

/// Records one [`ErrorKind::UnresolvedReference`] per missing library ID.
fn check_references(library: &Library, timeline: &Timeline, diagnostics: &mut Vec<Diagnostic>) {
	let mut reported = BTreeSet::new();
	let sprites = library.iter().filter_map(|definition| match &definition.kind {
		DefinitionKind::Sprite(sprite) => Some((Some(definition.library_id), &sprite.timeline)),
		_ => None,
	});

	for (owner, timeline) in std::iter::once((None, timeline)).chain(sprites) {
		let placed = timeline.placements().map(|(frame, object)| (frame, object.library_id, "placed object"));
		let sounds = timeline.sound_events().filter_map(|(frame, event)| match event.target {
			SoundTarget::Id(id) => Some((frame, id, "sound event")),
			SoundTarget::Class(_) => None,
		});
		for (frame, id, what) in placed.chain(sounds) {
			if library.contains(id) || !reported.insert(id) {
				continue;
			}
			let location = match owner {
				Some(sprite) => format!("frame {frame} of sprite {sprite}"),
				None => format!("frame {frame}"),
			};
			let diagnostic = Diagnostic {
				kind: ErrorKind::UnresolvedReference,
				offset: None,
				tag: None,
				library_id: Some(id),
				message: format!("{what} in {location} refers to undefined library id {id}"),
			};
			log::warn!("{diagnostic}");
			diagnostics.push(diagnostic);
		}
	}
}
