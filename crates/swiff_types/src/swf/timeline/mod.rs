//! Sprite/Frame/Timeline model.
//!
//! A [`Timeline`] is the frozen frame list of the movie or of one sprite. It is built by a
//! single linear scan of a tag stream through a [`TimelineBuilder`]:
//!
//! | Tag                   | Effect on the working frame                       |
//! |-----------------------|---------------------------------------------------|
//! | PlaceObject (1/2/3)   | place, replace or modify one depth                |
//! | RemoveObject (1/2)    | clear one depth                                   |
//! | FrameLabel            | label the frame                                   |
//! | StartSound (1/2)      | attach a sound event                              |
//! | SoundStreamHead (1/2) | open the timeline's streaming sound               |
//! | SoundStreamBlock      | append stream data for the current frame          |
//! | SetBackgroundColor    | set the stage color from this frame on            |
//! | ShowFrame             | freeze the working frame and start the next one   |
//!
//! Frozen frames share unmodified [`PlacedObject`] entries with their predecessors.

pub mod filter;
pub mod frame;
pub mod placed;
pub mod playhead;
pub mod scene;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::{self, Diagnostic, ErrorKind, SwfError},
	library::sound::{Sound, SoundEvent, SoundStreamBuilder},
	parse_config::ParseConfig,
	records::Color,
	tag::TagCode,
};

use self::{
	frame::{Frame, FrameLabel, WorkingFrame},
	placed::{PlacedObject, Placement, Removal},
	scene::{Scene, SceneData},
};

/// The frozen frame list of a movie or sprite.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
	frames: Vec<Frame>,
	scenes: Vec<Scene>,
	labels: BTreeMap<String, usize>,
	stream_sound: Option<Sound>,
}

impl Timeline {
	/// Number of frames. Never zero.
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Frame at a raw index.
	pub fn frame(&self, index: usize) -> Option<&Frame> {
		self.frames.get(index)
	}

	/// All frames in order.
	pub fn frames(&self) -> &[Frame] {
		&self.frames
	}

	/// Scenes in frame order. Never empty.
	pub fn scenes(&self) -> &[Scene] {
		&self.scenes
	}

	/// Scene by name.
	pub fn scene(&self, name: &str) -> Option<&Scene> {
		self.scenes.iter().find(|scene| scene.name == name)
	}

	/// Index into [`Timeline::scenes`] of the scene containing a raw frame.
	pub fn scene_index_of(&self, raw_index: usize) -> usize {
		self.scenes.iter().rposition(|scene| scene.start <= raw_index).unwrap_or(0)
	}

	/// Raw index of a frame label anywhere in the timeline.
	pub fn label_index(&self, name: &str) -> Option<usize> {
		self.labels.get(name).copied()
	}

	/// Every label with its raw index.
	pub fn labels(&self) -> &BTreeMap<String, usize> {
		&self.labels
	}

	/// Streaming sound assembled from SoundStreamHead/SoundStreamBlock tags.
	pub fn stream_sound(&self) -> Option<&Sound> {
		self.stream_sound.as_ref()
	}

	/// Every placed object of every frame, with its frame index.
	pub fn placements(&self) -> impl Iterator<Item = (usize, &PlacedObject)> {
		self.frames.iter().flat_map(|frame| frame.placed_objects().map(move |object| (frame.index(), object)))
	}

	/// Every sound event of every frame, with its frame index.
	pub fn sound_events(&self) -> impl Iterator<Item = (usize, &SoundEvent)> {
		self.frames.iter().flat_map(|frame| frame.sound_events().iter().map(move |event| (frame.index(), event)))
	}
}

/// Incremental builder fed one tag at a time.
#[derive(Debug)]
pub struct TimelineBuilder {
	declared_frame_count: u16,
	working: WorkingFrame,
	frames: Vec<Frame>,
	labels: BTreeMap<String, usize>,
	stream: Option<SoundStreamBuilder>,
}

impl TimelineBuilder {
	/// Creates a builder for a timeline that declares `declared_frame_count` frames.
	pub fn new(declared_frame_count: u16) -> Self {
		Self {
			declared_frame_count,
			working: WorkingFrame::default(),
			frames: Vec::new(),
			labels: BTreeMap::new(),
			stream: None,
		}
	}

	/// Frames frozen so far.
	pub fn frames_built(&self) -> usize {
		self.frames.len()
	}

	/// Applies the current tag if it is a timeline tag.
	///
	/// Returns `Ok(false)` for tags that do not belong to timelines. Record-level
	/// failures are appended to `diagnostics` and the tag is skipped.
	///
	/// # Errors
	///
	/// Only terminal errors such as [`SwfError::MalformedTag`] are returned.
	pub fn handle_tag(&mut self, cursor: &mut TagCursor<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<bool, SwfError> {
		let Some(code) = cursor.current_tag_code() else {
			return Ok(false);
		};
		let offset = cursor.position();

		let result = match code {
			TagCode::ShowFrame => {
				self.show_frame();
				Ok(())
			}
			TagCode::PlaceObject => Placement::decode(cursor).and_then(|placement| self.working.place(&placement, offset)),
			TagCode::RemoveObject => Removal::decode(cursor).map(|removal| {
				if !self.working.remove(&removal) {
					log::debug!("RemoveObject at empty depth {}", removal.depth);
				}
			}),
			TagCode::FrameLabel => self.decode_label(cursor),
			TagCode::StartSound => SoundEvent::decode(cursor).map(|event| self.working.add_sound_event(event)),
			TagCode::SoundStreamHead => SoundStreamBuilder::decode_head(cursor).map(|stream| {
				if self.stream.is_some() {
					log::debug!("second SoundStreamHead replaces the first");
				}
				self.stream = Some(stream);
			}),
			TagCode::SoundStreamBlock => match &mut self.stream {
				Some(stream) => stream.append_block(cursor, self.frames.len()),
				None => Err(SwfError::malformed_record(offset, "SoundStreamBlock without SoundStreamHead")),
			},
			TagCode::SetBackgroundColor => Color::read_rgb(cursor).map(|color| self.working.set_background_color(color)),
			_ => return Ok(false),
		};

		if let Err(err) = result {
			error::recover(err, Some(code), None, diagnostics)?;
		}
		Ok(true)
	}

	fn show_frame(&mut self) {
		let index = self.frames.len();
		self.frames.push(self.working.freeze(index));
	}

	fn decode_label(&mut self, cursor: &mut TagCursor<'_>) -> Result<(), SwfError> {
		let name = cursor.read_string()?;
		let anchor = cursor.remaining() > 0 && cursor.read_u8()? == 1;
		let index = self.frames.len();
		match self.labels.get(&name) {
			Some(existing) => log::debug!("label \"{name}\" already names frame {existing}"),
			None => {
				self.labels.insert(name.clone(), index);
			}
		}
		self.working.set_label(FrameLabel {
			name,
			anchor,
		});
		Ok(())
	}

	/// Freezes the timeline.
	///
	/// Tags after the last ShowFrame are dropped. A timeline without any ShowFrame gets
	/// one empty frame. `owner` is the sprite ID for nested timelines.
	pub fn finish(
		self,
		config: &ParseConfig,
		diagnostics: &mut Vec<Diagnostic>,
		scene_data: Option<&SceneData>,
		owner: Option<u16>,
	) -> Timeline {
		let Self {
			declared_frame_count,
			working,
			mut frames,
			mut labels,
			stream,
		} = self;

		if working.is_dirty() {
			log::debug!("discarding tags after the last ShowFrame of {}", describe_owner(owner));
		}

		if config.verify_frame_counts && frames.len() != usize::from(declared_frame_count) {
			let diagnostic = Diagnostic {
				kind: ErrorKind::MalformedRecord,
				offset: None,
				tag: owner.map(|_| TagCode::DefineSprite),
				library_id: owner,
				message: format!(
					"{} declares {declared_frame_count} frames but shows {}",
					describe_owner(owner),
					frames.len()
				),
			};
			log::warn!("{diagnostic}");
			diagnostics.push(diagnostic);
		}

		if frames.is_empty() {
			frames.push(WorkingFrame::default().freeze(0));
		}

		if let Some(data) = scene_data {
			for (frame, label) in &data.labels {
				let index = *frame as usize;
				if index >= frames.len() {
					log::debug!("scene label \"{label}\" names missing frame {index}");
					continue;
				}
				labels.entry(label.clone()).or_insert(index);
			}
		}
		labels.retain(|_, index| *index < frames.len());

		let scenes = scene::build_scenes(scene_data, &labels, frames.len());
		Timeline {
			frames,
			scenes,
			labels,
			stream_sound: stream.map(SoundStreamBuilder::build),
		}
	}
}

fn describe_owner(owner: Option<u16>) -> String {
	match owner {
		Some(id) => format!("sprite {id}"),
		None => "movie".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::writer::{BitWriter, SwfWriter};
	use bytes::Bytes;

	fn place2(depth: u16, id: Option<u16>, x: i32) -> Vec<u8> {
		let mut body = BitWriter::new();
		let flags = 0x04 | if id.is_some() { 0x02 } else { 0x01 };
		body.write_u8(flags);
		body.write_u16(depth);
		if let Some(id) = id {
			body.write_u16(id);
		}
		body.write_matrix(&crate::swf::records::Matrix::translate(x, 0));
		body.into_bytes()
	}

	fn build(writer: SwfWriter, declared: u16) -> (Timeline, Vec<Diagnostic>) {
		let data = Bytes::from(writer.finish_without_end().unwrap());
		let config = ParseConfig::default();
		let mut cursor = TagCursor::new(&data, &config);
		cursor.read_header().unwrap();
		let mut builder = TimelineBuilder::new(declared);
		let mut diagnostics = Vec::new();
		while cursor.advance_to_next_tag().unwrap() {
			builder.handle_tag(&mut cursor, &mut diagnostics).unwrap();
		}
		let timeline = builder.finish(&config, &mut diagnostics, None, None);
		(timeline, diagnostics)
	}

	#[test]
	fn test_frames_and_labels() {
		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::PlaceObject2, &place2(1, Some(7), 20));
		writer.tag(TagCode::FrameLabel, b"start\0");
		writer.show_frame();
		writer.tag(TagCode::PlaceObject2, &place2(1, None, 40));
		writer.show_frame();
		writer.tag(TagCode::RemoveObject2, &1u16.to_le_bytes());
		writer.show_frame();

		let (timeline, diagnostics) = build(writer, 3);
		assert!(diagnostics.is_empty());
		assert_eq!(timeline.frame_count(), 3);
		assert_eq!(timeline.label_index("start"), Some(0));
		assert_eq!(timeline.frame(0).unwrap().label().unwrap().name, "start");
		assert_eq!(timeline.frame(1).unwrap().placed_at(1).unwrap().library_id, 7);
		assert_eq!(timeline.frame(1).unwrap().placed_at(1).unwrap().matrix().translate_x, 40);
		assert_eq!(timeline.frame(2).unwrap().depth_count(), 0);
		assert_eq!(timeline.scenes().len(), 1);
	}

	#[test]
	fn test_empty_timeline_has_one_frame() {
		let writer = SwfWriter::new(10);
		let (timeline, diagnostics) = build(writer, 0);
		assert_eq!(timeline.frame_count(), 1);
		assert_eq!(timeline.frame(0).unwrap().depth_count(), 0);
		assert!(diagnostics.is_empty());
	}

	#[test]
	fn test_frame_count_mismatch_is_diagnosed() {
		let mut writer = SwfWriter::new(10);
		writer.show_frame();
		let (_, diagnostics) = build(writer, 4);
		assert_eq!(diagnostics.len(), 1);
		assert_eq!(diagnostics[0].kind, ErrorKind::MalformedRecord);
	}

	#[test]
	fn test_bad_placement_is_skipped() {
		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::PlaceObject2, &place2(3, None, 0));
		writer.tag(TagCode::PlaceObject2, &place2(4, Some(2), 0));
		writer.show_frame();
		let (timeline, diagnostics) = build(writer, 1);
		assert_eq!(diagnostics.len(), 1);
		assert_eq!(diagnostics[0].tag, Some(TagCode::PlaceObject));
		assert_eq!(timeline.frame(0).unwrap().depth_count(), 1);
	}

	#[test]
	fn test_stream_blocks_follow_frames() {
		let mut head = BitWriter::new();
		head.write_u8(0x0A);
		head.write_u8(0x0A);
		head.write_u16(100);
		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::SoundStreamHead, &head.into_bytes());
		writer.show_frame();
		writer.tag(TagCode::SoundStreamBlock, &[1, 2, 3, 4]);
		writer.show_frame();

		let (timeline, _) = build(writer, 2);
		let sound = timeline.stream_sound().unwrap();
		assert!(sound.stream_block_for_frame(0).is_none());
		let block = sound.stream_block_for_frame(1).unwrap();
		assert_eq!(sound.block_data(block).as_ref(), &[1, 2, 3, 4]);
	}
}
