//! Frozen frames and the working frame they are built from.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::swf::{
	error::SwfError,
	library::sound::SoundEvent,
	records::Color,
	timeline::placed::{PlacedObject, Placement, Removal},
};

/// Depth-keyed display list. Entries are shared between frames until modified.
pub type DepthMap = BTreeMap<u16, Arc<PlacedObject>>;

/// A named frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameLabel {
	/// Label text
	pub name: String,
	/// Named anchor (browser history entry)
	pub anchor: bool,
}

/// One frozen frame of a timeline.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
	index: usize,
	label: Option<FrameLabel>,
	#[serde(serialize_with = "serialize_depths")]
	depths: Arc<DepthMap>,
	sound_events: Vec<SoundEvent>,
	background_color: Option<Color>,
}

fn serialize_depths<S: serde::Serializer>(depths: &Arc<DepthMap>, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.collect_seq(depths.values().map(|object| object.as_ref()))
}

impl Frame {
	/// Zero-based position in its timeline.
	pub fn index(&self) -> usize {
		self.index
	}

	/// First label attached to this frame.
	pub fn label(&self) -> Option<&FrameLabel> {
		self.label.as_ref()
	}

	/// Placed objects in ascending depth order.
	pub fn placed_objects(&self) -> impl Iterator<Item = &PlacedObject> {
		self.depths.values().map(|object| object.as_ref())
	}

	/// The object at a depth.
	pub fn placed_at(&self, depth: u16) -> Option<&PlacedObject> {
		self.depths.get(&depth).map(|object| object.as_ref())
	}

	/// Shared handle of the object at a depth.
	pub fn placed_handle(&self, depth: u16) -> Option<&Arc<PlacedObject>> {
		self.depths.get(&depth)
	}

	/// Number of occupied depths.
	pub fn depth_count(&self) -> usize {
		self.depths.len()
	}

	/// Sounds started or stopped on this frame.
	pub fn sound_events(&self) -> &[SoundEvent] {
		&self.sound_events
	}

	/// Stage background color in effect on this frame.
	pub fn background_color(&self) -> Option<Color> {
		self.background_color
	}

	/// Returns `true` when both frames share one display list allocation.
	pub fn shares_display_list(&self, other: &Frame) -> bool {
		Arc::ptr_eq(&self.depths, &other.depths)
	}
}

/// Mutable staging frame between two ShowFrame tags.
#[derive(Debug, Default)]
pub(crate) struct WorkingFrame {
	depths: Arc<DepthMap>,
	label: Option<FrameLabel>,
	sound_events: Vec<SoundEvent>,
	background_color: Option<Color>,
	dirty: bool,
}

impl WorkingFrame {
	/// Applies a placement to the working display list.
	pub fn place(&mut self, placement: &Placement, offset: usize) -> Result<(), SwfError> {
		let current = self.depths.get(&placement.depth).map(|object| object.as_ref());
		if let Some(object) = placement.apply(current, offset)? {
			// The first change after a freeze copies the whole depth map (O(depths) per
			// changed frame). The placed objects themselves stay shared.
			Arc::make_mut(&mut self.depths).insert(placement.depth, Arc::new(object));
		}
		self.dirty = true;
		Ok(())
	}

	/// Clears a depth. Returns `false` when the depth was already empty.
	pub fn remove(&mut self, removal: &Removal) -> bool {
		self.dirty = true;
		let Some(current) = self.depths.get(&removal.depth) else {
			return false;
		};
		if removal.library_id.is_some_and(|expected| expected != current.library_id) {
			log::debug!("RemoveObject at depth {} names another character", removal.depth);
		}
		Arc::make_mut(&mut self.depths).remove(&removal.depth);
		true
	}

	/// Attaches a label; later labels on the same frame only register in the label table.
	pub fn set_label(&mut self, label: FrameLabel) {
		self.dirty = true;
		if self.label.is_none() {
			self.label = Some(label);
		}
	}

	pub fn add_sound_event(&mut self, event: SoundEvent) {
		self.dirty = true;
		self.sound_events.push(event);
	}

	pub fn set_background_color(&mut self, color: Color) {
		self.dirty = true;
		self.background_color = Some(color);
	}

	/// Something was applied since the last freeze.
	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// Freezes the staged state into frame `index` and reseeds from it.
	///
	/// The display list and background carry over; labels and sounds do not.
	pub fn freeze(&mut self, index: usize) -> Frame {
		self.dirty = false;
		Frame {
			index,
			label: self.label.take(),
			depths: Arc::clone(&self.depths),
			sound_events: std::mem::take(&mut self.sound_events),
			background_color: self.background_color,
		}
	}
}
