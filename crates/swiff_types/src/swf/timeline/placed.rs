//! Placed objects and the PlaceObject/RemoveObject protocol.
//!
//! ## PlaceObject2 / PlaceObject3 flags
//!
//! ```text
//! bit  PlaceObject2 byte        PlaceObject3 second byte
//! 7    HasClipActions           (reserved)
//! 6    HasClipDepth             OpaqueBackground
//! 5    HasName                  HasVisible
//! 4    HasRatio                 HasImage
//! 3    HasColorTransform        HasClassName
//! 2    HasMatrix                HasCacheAsBitmap
//! 1    HasCharacter             HasBlendMode
//! 0    Move                     HasFilterList
//! ```
//!
//! `Move` and `HasCharacter` select the action:
//!
//! | Move | HasCharacter | Action                                        |
//! |------|--------------|-----------------------------------------------|
//! | 0    | 1            | place a new object at an empty depth          |
//! | 1    | 0            | modify the object at the depth                |
//! | 1    | 1            | swap the character, keep unflagged fields     |
//! | 0    | 0            | treated as modify                             |
//!
//! PlaceObject (version 1) always replaces the whole entry.

use serde::Serialize;

use crate::swf::{
	cursor::TagCursor,
	error::SwfError,
	records::{Color, ColorTransform, Matrix},
	timeline::filter::{BlendMode, Filter},
};

/// One occupant of a timeline depth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedObject {
	/// Definition shown at this depth
	pub library_id: u16,
	/// Depth, unique within a frame
	pub depth: u16,
	/// Transform; `None` is identity
	pub matrix: Option<Matrix>,
	/// Color transform; `None` is identity
	pub color_transform: Option<ColorTransform>,
	/// Masks every depth up to and including this one
	pub clip_depth: Option<u16>,
	/// Morph ratio
	pub ratio: Option<u16>,
	/// Instance name
	pub name: Option<String>,
	/// Class name (PlaceObject3)
	pub class_name: Option<String>,
	/// Surface filters
	pub filters: Vec<Filter>,
	/// Blend mode
	pub blend_mode: BlendMode,
	/// Cache as bitmap hint
	pub cache_as_bitmap: bool,
	/// Visibility
	pub visible: bool,
	/// Opaque background color
	pub background_color: Option<Color>,
}

impl PlacedObject {
	/// A fresh object with default fields.
	pub fn new(library_id: u16, depth: u16) -> Self {
		Self {
			library_id,
			depth,
			matrix: None,
			color_transform: None,
			clip_depth: None,
			ratio: None,
			name: None,
			class_name: None,
			filters: Vec::new(),
			blend_mode: BlendMode::Normal,
			cache_as_bitmap: false,
			visible: true,
			background_color: None,
		}
	}

	/// Effective transform.
	pub fn matrix(&self) -> Matrix {
		self.matrix.unwrap_or(Matrix::IDENTITY)
	}

	/// Effective color transform.
	pub fn color_transform(&self) -> ColorTransform {
		self.color_transform.unwrap_or(ColorTransform::IDENTITY)
	}

	/// This object is a clipping mask.
	pub fn is_mask(&self) -> bool {
		self.clip_depth.is_some()
	}

	fn merge(&mut self, placement: &Placement) {
		if let Some(matrix) = placement.matrix {
			self.matrix = Some(matrix);
		}
		if let Some(transform) = placement.color_transform {
			self.color_transform = Some(transform);
		}
		if let Some(clip_depth) = placement.clip_depth {
			self.clip_depth = Some(clip_depth);
		}
		if let Some(ratio) = placement.ratio {
			self.ratio = Some(ratio);
		}
		if let Some(name) = &placement.name {
			self.name = Some(name.clone());
		}
		if let Some(class_name) = &placement.class_name {
			self.class_name = Some(class_name.clone());
		}
		if let Some(filters) = &placement.filters {
			self.filters = filters.clone();
		}
		if let Some(mode) = placement.blend_mode {
			self.blend_mode = mode;
		}
		if let Some(cache) = placement.cache_as_bitmap {
			self.cache_as_bitmap = cache;
		}
		if let Some(visible) = placement.visible {
			self.visible = visible;
		}
		if let Some(color) = placement.background_color {
			self.background_color = Some(color);
		}
	}
}

/// What a placement does to its depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaceAction {
	/// Full replacement (PlaceObject version 1)
	Replace(u16),
	/// New object at the depth
	Place(u16),
	/// Change the character, keep the other fields
	SwapCharacter(u16),
	/// Update flagged fields only
	Modify,
}

/// A decoded PlaceObject, PlaceObject2 or PlaceObject3 tag.
///
/// `None` fields were not flagged present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
	/// Target depth
	pub depth: u16,
	/// Action
	pub action: PlaceAction,
	/// New transform
	pub matrix: Option<Matrix>,
	/// New color transform
	pub color_transform: Option<ColorTransform>,
	/// New morph ratio
	pub ratio: Option<u16>,
	/// New instance name
	pub name: Option<String>,
	/// New clip depth
	pub clip_depth: Option<u16>,
	/// New class name
	pub class_name: Option<String>,
	/// New filter list
	pub filters: Option<Vec<Filter>>,
	/// New blend mode
	pub blend_mode: Option<BlendMode>,
	/// New bitmap caching flag
	pub cache_as_bitmap: Option<bool>,
	/// New visibility
	pub visible: Option<bool>,
	/// New background color
	pub background_color: Option<Color>,
	/// Clip actions follow (skipped, not interpreted)
	pub has_clip_actions: bool,
}

impl Placement {
	/// A placement with no fields flagged present.
	pub fn new(depth: u16, action: PlaceAction) -> Self {
		Self {
			depth,
			action,
			matrix: None,
			color_transform: None,
			ratio: None,
			name: None,
			clip_depth: None,
			class_name: None,
			filters: None,
			blend_mode: None,
			cache_as_bitmap: None,
			visible: None,
			background_color: None,
			has_clip_actions: false,
		}
	}

	/// Decodes a PlaceObject tag of any version.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] or [`SwfError::MalformedRecord`] for short or
	/// invalid bodies.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<Self, SwfError> {
		let version = cursor.current_tag_version();
		if version == 1 {
			let library_id = cursor.read_u16()?;
			let depth = cursor.read_u16()?;
			let mut placement = Self::new(depth, PlaceAction::Replace(library_id));
			placement.matrix = Some(Matrix::read(cursor)?);
			if cursor.remaining() > 0 {
				placement.color_transform = Some(ColorTransform::read(cursor)?);
			}
			return Ok(placement);
		}

		let flags = cursor.read_u8()?;
		let flags2 = if version >= 3 {
			cursor.read_u8()?
		} else {
			0
		};
		let depth = cursor.read_u16()?;

		let has_character = flags & 0x02 != 0;
		let is_move = flags & 0x01 != 0;
		let has_image = flags2 & 0x10 != 0;
		let class_name = if flags2 & 0x08 != 0 || (has_image && has_character) {
			Some(cursor.read_string()?)
		} else {
			None
		};

		let action = if has_character {
			let library_id = cursor.read_u16()?;
			if is_move {
				PlaceAction::SwapCharacter(library_id)
			} else {
				PlaceAction::Place(library_id)
			}
		} else {
			PlaceAction::Modify
		};

		let mut placement = Self::new(depth, action);
		placement.class_name = class_name;
		if flags & 0x04 != 0 {
			placement.matrix = Some(Matrix::read(cursor)?);
		}
		if flags & 0x08 != 0 {
			placement.color_transform = Some(ColorTransform::read_with_alpha(cursor)?);
		}
		if flags & 0x10 != 0 {
			placement.ratio = Some(cursor.read_u16()?);
		}
		if flags & 0x20 != 0 {
			placement.name = Some(cursor.read_string()?);
		}
		if flags & 0x40 != 0 {
			placement.clip_depth = Some(cursor.read_u16()?);
		}
		if flags2 & 0x01 != 0 {
			placement.filters = Some(Filter::read_list(cursor)?);
		}
		if flags2 & 0x02 != 0 {
			placement.blend_mode = Some(BlendMode::read(cursor)?);
		}
		if flags2 & 0x04 != 0 {
			placement.cache_as_bitmap = Some(cursor.read_u8()? != 0);
		}
		if flags2 & 0x20 != 0 {
			placement.visible = Some(cursor.read_u8()? != 0);
		}
		if flags2 & 0x40 != 0 {
			placement.background_color = Some(Color::read_rgba(cursor)?);
		}
		placement.has_clip_actions = flags & 0x80 != 0;
		Ok(placement)
	}

	/// Returns `true` if any field besides depth and character is set.
	pub fn has_field_updates(&self) -> bool {
		self.matrix.is_some()
			|| self.color_transform.is_some()
			|| self.ratio.is_some()
			|| self.name.is_some()
			|| self.clip_depth.is_some()
			|| self.class_name.is_some()
			|| self.filters.is_some()
			|| self.blend_mode.is_some()
			|| self.cache_as_bitmap.is_some()
			|| self.visible.is_some()
			|| self.background_color.is_some()
	}

	/// Computes the new occupant of the depth from its current occupant.
	///
	/// Returns `Ok(None)` when the placement leaves the entry untouched.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] when a modification targets an empty depth.
	pub fn apply(&self, current: Option<&PlacedObject>, offset: usize) -> Result<Option<PlacedObject>, SwfError> {
		match (self.action, current) {
			(PlaceAction::Replace(library_id) | PlaceAction::Place(library_id), _) => {
				let mut object = PlacedObject::new(library_id, self.depth);
				object.merge(self);
				Ok(Some(object))
			}
			(PlaceAction::SwapCharacter(library_id), Some(existing)) => {
				let mut object = existing.clone();
				object.library_id = library_id;
				object.merge(self);
				Ok(Some(object))
			}
			(PlaceAction::SwapCharacter(library_id), None) => {
				let mut object = PlacedObject::new(library_id, self.depth);
				object.merge(self);
				Ok(Some(object))
			}
			(PlaceAction::Modify, Some(existing)) => {
				if !self.has_field_updates() {
					return Ok(None);
				}
				let mut object = existing.clone();
				object.merge(self);
				Ok(Some(object))
			}
			(PlaceAction::Modify, None) => {
				Err(SwfError::malformed_record(offset, format!("modify of empty depth {}", self.depth)))
			}
		}
	}
}

/// A decoded RemoveObject or RemoveObject2 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Removal {
	/// Depth to clear
	pub depth: u16,
	/// Character named by RemoveObject version 1
	pub library_id: Option<u16>,
}

impl Removal {
	/// Decodes a RemoveObject tag of either version.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<Self, SwfError> {
		let library_id = if cursor.current_tag_version() == 1 {
			Some(cursor.read_u16()?)
		} else {
			None
		};
		Ok(Self {
			depth: cursor.read_u16()?,
			library_id,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn modify(depth: u16) -> Placement {
		Placement::new(depth, PlaceAction::Modify)
	}

	#[test]
	fn test_modify_without_fields_keeps_entry() {
		let mut existing = PlacedObject::new(3, 1);
		existing.matrix = Some(Matrix::translate(100, 200));
		assert_eq!(modify(1).apply(Some(&existing), 0).unwrap(), None);
	}

	#[test]
	fn test_modify_inherits_unflagged_fields() {
		let mut existing = PlacedObject::new(3, 1);
		existing.matrix = Some(Matrix::translate(100, 200));
		existing.name = Some("hero".into());

		let mut placement = modify(1);
		placement.ratio = Some(10);
		let updated = placement.apply(Some(&existing), 0).unwrap().unwrap();
		assert_eq!(updated.matrix, Some(Matrix::translate(100, 200)));
		assert_eq!(updated.name.as_deref(), Some("hero"));
		assert_eq!(updated.ratio, Some(10));
		assert_eq!(updated.library_id, 3);
	}

	#[test]
	fn test_replace_resets_fields() {
		let mut existing = PlacedObject::new(3, 1);
		existing.name = Some("hero".into());
		let mut placement = Placement::new(1, PlaceAction::Replace(4));
		placement.matrix = Some(Matrix::IDENTITY);
		let replaced = placement.apply(Some(&existing), 0).unwrap().unwrap();
		assert_eq!(replaced.library_id, 4);
		assert_eq!(replaced.name, None);
	}

	#[test]
	fn test_swap_character_keeps_transform() {
		let mut existing = PlacedObject::new(3, 1);
		existing.matrix = Some(Matrix::translate(5, 5));
		let swapped = Placement::new(1, PlaceAction::SwapCharacter(8)).apply(Some(&existing), 0).unwrap().unwrap();
		assert_eq!(swapped.library_id, 8);
		assert_eq!(swapped.matrix, Some(Matrix::translate(5, 5)));
	}

	#[test]
	fn test_modify_empty_depth_is_error() {
		assert!(matches!(
			modify(9).apply(None, 42),
			Err(SwfError::MalformedRecord {
				offset: 42,
				..
			})
		));
	}
}
