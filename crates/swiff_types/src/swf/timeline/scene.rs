//! Scenes and the DefineSceneAndFrameLabelData tag.
//!
//! ## DefineSceneAndFrameLabelData
//!
//! ```text
//! EncodedU32  scene_count
//! repeat scene_count:
//!     EncodedU32  frame_offset
//!     STRING      name
//! EncodedU32  label_count
//! repeat label_count:
//!     EncodedU32  frame_number
//!     STRING      label
//! ```
//!
//! Scenes cover contiguous frame ranges that start at their offset and end at the next
//! scene's offset. A timeline without the tag has one implicit scene over all frames.

use std::{collections::BTreeMap, ops::Range};

use serde::Serialize;

use crate::swf::{cursor::TagCursor, error::SwfError};

/// Name of the scene synthesized for timelines without scene data.
pub const IMPLICIT_SCENE_NAME: &str = "Scene 1";

/// Decoded DefineSceneAndFrameLabelData body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneData {
	/// `(first frame, name)` per scene, in file order
	pub scenes: Vec<(u32, String)>,
	/// `(frame, label)` pairs
	pub labels: Vec<(u32, String)>,
}

impl SceneData {
	/// Decodes the tag body.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] when a count promises more entries than the body holds.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<Self, SwfError> {
		let scene_count = cursor.read_encoded_u32()?;
		let mut scenes = Vec::new();
		for _ in 0..scene_count {
			let offset = cursor.read_encoded_u32()?;
			scenes.push((offset, cursor.read_string()?));
		}
		let label_count = cursor.read_encoded_u32()?;
		let mut labels = Vec::new();
		for _ in 0..label_count {
			let frame = cursor.read_encoded_u32()?;
			labels.push((frame, cursor.read_string()?));
		}
		Ok(Self {
			scenes,
			labels,
		})
	}
}

/// A named, contiguous range of a timeline's frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scene {
	/// Scene name
	pub name: String,
	/// First raw frame index
	pub start: usize,
	/// Number of frames
	pub len: usize,
	labels: BTreeMap<String, usize>,
}

impl Scene {
	/// Raw frame range covered by the scene.
	pub fn frame_range(&self) -> Range<usize> {
		self.start..self.start + self.len
	}

	/// Returns `true` when the raw index falls inside the scene.
	pub fn contains(&self, raw_index: usize) -> bool {
		self.frame_range().contains(&raw_index)
	}

	/// Converts a scene-relative index to a raw index.
	pub fn raw_index(&self, relative: usize) -> Option<usize> {
		(relative < self.len).then(|| self.start + relative)
	}

	/// Raw index of a label inside this scene.
	pub fn label(&self, name: &str) -> Option<usize> {
		self.labels.get(name).copied()
	}

	/// Labels of this scene with their raw indices.
	pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
		self.labels.iter().map(|(name, index)| (name.as_str(), *index))
	}
}

/// Splits `frame_count` frames into scenes.
///
/// Offsets are sorted and clamped to the timeline; the first scene always starts at
/// frame 0. Labels are assigned to the scene containing them.
pub(crate) fn build_scenes(data: Option<&SceneData>, labels: &BTreeMap<String, usize>, frame_count: usize) -> Vec<Scene> {
	let mut starts: Vec<(usize, String)> = match data {
		Some(data) if !data.scenes.is_empty() => data
			.scenes
			.iter()
			.map(|(offset, name)| (*offset as usize, name.clone()))
			.collect(),
		_ => vec![(0, IMPLICIT_SCENE_NAME.to_string())],
	};
	starts.sort_by_key(|(start, _)| *start);
	if let Some(first) = starts.first_mut() {
		if first.0 != 0 {
			log::debug!("first scene starts at frame {}, moved to 0", first.0);
			first.0 = 0;
		}
	}
	starts.retain(|(start, name)| {
		let inside = *start < frame_count.max(1);
		if !inside {
			log::debug!("scene \"{name}\" starts at frame {start}, past the timeline");
		}
		inside
	});

	let ends: Vec<usize> = starts
		.iter()
		.skip(1)
		.map(|(start, _)| *start)
		.chain(std::iter::once(frame_count.max(1)))
		.collect();

	starts
		.into_iter()
		.zip(ends)
		.map(|((start, name), end)| {
			let scene_labels = labels
				.iter()
				.filter(|(_, index)| (start..end).contains(*index))
				.map(|(label, index)| (label.clone(), *index))
				.collect();
			Scene {
				name,
				start,
				len: end - start,
				labels: scene_labels,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn labels(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
		pairs.iter().map(|(name, index)| (name.to_string(), *index)).collect()
	}

	#[test]
	fn test_implicit_scene() {
		let scenes = build_scenes(None, &labels(&[("a", 2)]), 5);
		assert_eq!(scenes.len(), 1);
		assert_eq!(scenes[0].name, IMPLICIT_SCENE_NAME);
		assert_eq!(scenes[0].frame_range(), 0..5);
		assert_eq!(scenes[0].label("a"), Some(2));
		assert_eq!(scenes[0].raw_index(4), Some(4));
		assert_eq!(scenes[0].raw_index(5), None);
	}

	#[test]
	fn test_scene_ranges_and_labels() {
		let data = SceneData {
			scenes: vec![(3, "second".into()), (0, "first".into()), (40, "beyond".into())],
			labels: Vec::new(),
		};
		let scenes = build_scenes(Some(&data), &labels(&[("intro", 1), ("main", 4)]), 6);
		assert_eq!(scenes.len(), 2);
		assert_eq!(scenes[0].name, "first");
		assert_eq!(scenes[0].frame_range(), 0..3);
		assert_eq!(scenes[1].name, "second");
		assert_eq!(scenes[1].frame_range(), 3..6);
		assert_eq!(scenes[1].raw_index(0), Some(3));
		assert_eq!(scenes[1].label("main"), Some(4));
		assert_eq!(scenes[1].label("intro"), None);
		assert!(scenes[0].contains(2));
		assert!(!scenes[0].contains(3));
	}

	#[test]
	fn test_first_scene_pinned_to_zero() {
		let data = SceneData {
			scenes: vec![(2, "late".into())],
			labels: Vec::new(),
		};
		let scenes = build_scenes(Some(&data), &BTreeMap::new(), 4);
		assert_eq!(scenes[0].frame_range(), 0..4);
	}
}
