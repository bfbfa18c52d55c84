//! The playhead: a cursor over one timeline.
//!
//! ## States
//!
//! ```text
//!            goto(target, play = true) / play()
//!   Stopped ──────────────────────────────────▶ Playing
//!      ▲                                          │
//!      └──────── stop() / goto(target, false) ◀───┤
//!                step() past the last frame ◀─────┘  (no loop flag set)
//! ```
//!
//! Seek targets are resolved to a raw frame index before any state changes. A target that
//! does not resolve returns [`SwfError::UnresolvedSeek`] and leaves the playhead as it was.
//!
//! The playhead owns no timer. A [`crate::swf::host::Host`] calls [`Playhead::tick`] at the
//! movie's frame rate.

use std::{fmt::Display, sync::Arc, time::Duration};

use crate::swf::{
	error::SwfError,
	movie::Movie,
	timeline::{Timeline, frame::Frame, placed::PlacedObject, scene::Scene},
};

/// A frame inside a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRef {
	/// Zero-based scene-relative index
	Index(usize),
	/// Frame label
	Label(String),
}

/// Where to move the playhead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekTarget {
	/// Zero-based timeline-relative index
	Raw(usize),
	/// Frame label anywhere in the timeline
	Label(String),
	/// Frame of a named scene
	InScene {
		/// Scene name
		scene: String,
		/// Frame inside the scene
		frame: FrameRef,
	},
	/// Frame of the scene the playhead is in
	InCurrentScene(FrameRef),
}

impl Display for SeekTarget {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SeekTarget::Raw(index) => write!(f, "frame {index}"),
			SeekTarget::Label(label) => write!(f, "label \"{label}\""),
			SeekTarget::InScene {
				scene,
				frame: FrameRef::Index(index),
			} => write!(f, "frame {index} of scene \"{scene}\""),
			SeekTarget::InScene {
				scene,
				frame: FrameRef::Label(label),
			} => write!(f, "label \"{label}\" of scene \"{scene}\""),
			SeekTarget::InCurrentScene(FrameRef::Index(index)) => write!(f, "frame {index} of the current scene"),
			SeekTarget::InCurrentScene(FrameRef::Label(label)) => write!(f, "label \"{label}\" of the current scene"),
		}
	}
}

/// Running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
	/// Ticks are ignored
	#[default]
	Stopped,
	/// Every tick steps one frame
	Playing,
}

/// Why the frame changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCause {
	/// `goto` and its shorthands
	Seek,
	/// `step` or `tick`
	Step,
}

/// A frame change reported to the delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameUpdate {
	/// Previous raw index
	pub from: usize,
	/// New raw index
	pub to: usize,
	/// Index of the new scene in [`Timeline::scenes`]
	pub scene: usize,
	/// What triggered the change
	pub cause: UpdateCause,
	/// The delegate asked for an interpolated transition
	pub interpolate: bool,
	/// Sprite whose timeline moved, `None` for the movie timeline
	pub sprite: Option<u16>,
}

/// Observer of playhead frame changes, typically a view that renders the frame.
pub trait PlayheadDelegate {
	/// Called before the playhead moves.
	fn will_update_frame(&mut self, _update: &FrameUpdate) {}

	/// Called after the playhead moved. Pull the display list from `frame`.
	fn did_update_frame(&mut self, movie: &Movie, frame: &Frame, update: &FrameUpdate);

	/// Whether the change from `from` to `to` should be animated.
	fn should_interpolate(&mut self, _from: usize, _to: usize) -> bool {
		false
	}
}

/// Runtime cursor over the movie timeline or one sprite timeline.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use swiff_types::swf::{Movie, Playhead, SwfWriter, TagCode};
///
/// let mut writer = SwfWriter::new(10);
/// writer.tag(TagCode::FrameLabel, b"intro\0");
/// writer.show_frame();
/// writer.show_frame();
/// let movie = Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap());
///
/// let mut playhead = Playhead::new(movie);
/// playhead.play();
/// playhead.tick();
/// assert_eq!(playhead.current_index(), 1);
/// assert!(playhead.goto_label("missing", false).is_err());
/// assert_eq!(playhead.current_index(), 1);
/// ```
pub struct Playhead {
	movie: Arc<Movie>,
	sprite: Option<u16>,
	index: usize,
	scene: usize,
	state: PlayState,
	/// Wrap to the start of the current scene after its last frame
	pub loops_scene: bool,
	/// Wrap to frame 0 after the last frame of the timeline
	pub loops_movie: bool,
	delegate: Option<Box<dyn PlayheadDelegate>>,
}

impl std::fmt::Debug for Playhead {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Playhead")
			.field("sprite", &self.sprite)
			.field("index", &self.index)
			.field("scene", &self.scene)
			.field("state", &self.state)
			.field("loops_scene", &self.loops_scene)
			.field("loops_movie", &self.loops_movie)
			.field("has_delegate", &self.delegate.is_some())
			.finish()
	}
}

fn timeline_of(movie: &Movie, sprite: Option<u16>) -> &Timeline {
	match sprite.and_then(|id| movie.library().sprite(id)) {
		Some(sprite) => &sprite.timeline,
		None => movie.timeline(),
	}
}

impl Playhead {
	/// A stopped playhead on frame 0 of the movie timeline.
	pub fn new(movie: Arc<Movie>) -> Self {
		Self {
			movie,
			sprite: None,
			index: 0,
			scene: 0,
			state: PlayState::Stopped,
			loops_scene: false,
			loops_movie: true,
			delegate: None,
		}
	}

	/// A stopped playhead on frame 0 of a sprite's timeline.
	///
	/// # Errors
	///
	/// Returns [`SwfError::UnresolvedReference`] if `sprite_id` is not a sprite.
	pub fn for_sprite(movie: Arc<Movie>, sprite_id: u16) -> Result<Self, SwfError> {
		if movie.library().sprite(sprite_id).is_none() {
			return Err(SwfError::UnresolvedReference {
				library_id: sprite_id,
				message: "playhead target is not a sprite".to_string(),
			});
		}
		let mut playhead = Self::new(movie);
		playhead.sprite = Some(sprite_id);
		Ok(playhead)
	}

	/// Installs the frame change observer.
	pub fn set_delegate(&mut self, delegate: Box<dyn PlayheadDelegate>) {
		self.delegate = Some(delegate);
	}

	/// Removes and returns the observer.
	pub fn take_delegate(&mut self) -> Option<Box<dyn PlayheadDelegate>> {
		self.delegate.take()
	}

	/// The movie being played.
	pub fn movie(&self) -> &Arc<Movie> {
		&self.movie
	}

	/// The sprite being played, `None` for the movie timeline.
	pub fn sprite(&self) -> Option<u16> {
		self.sprite
	}

	/// The timeline being played.
	pub fn timeline(&self) -> &Timeline {
		timeline_of(&self.movie, self.sprite)
	}

	/// Running state.
	pub fn state(&self) -> PlayState {
		self.state
	}

	/// Returns `true` while playing.
	pub fn is_playing(&self) -> bool {
		self.state == PlayState::Playing
	}

	/// Current raw frame index.
	pub fn current_index(&self) -> usize {
		self.index
	}

	/// Current frame.
	pub fn current_frame(&self) -> &Frame {
		let timeline = self.timeline();
		&timeline.frames()[self.index.min(timeline.frame_count() - 1)]
	}

	/// Current scene.
	pub fn current_scene(&self) -> &Scene {
		let scenes = self.timeline().scenes();
		&scenes[self.scene.min(scenes.len() - 1)]
	}

	/// Objects to draw for the current frame, in depth order. Unresolved IDs are omitted.
	pub fn placed_objects(&self) -> Vec<&PlacedObject> {
		self.movie.display_list(self.current_frame())
	}

	/// Wall-clock time between two ticks at the authored frame rate.
	pub fn frame_interval(&self) -> Duration {
		let rate = self.movie.frame_rate();
		if rate > 0.0 {
			Duration::from_secs_f64(1.0 / f64::from(rate))
		} else {
			Duration::ZERO
		}
	}

	/// Resolves a target to a raw index without moving.
	pub fn resolve(&self, target: &SeekTarget) -> Option<usize> {
		let timeline = self.timeline();
		let in_scene = |scene: &Scene, frame: &FrameRef| match frame {
			FrameRef::Index(index) => scene.raw_index(*index),
			FrameRef::Label(label) => scene.label(label),
		};
		match target {
			SeekTarget::Raw(index) => (*index < timeline.frame_count()).then_some(*index),
			SeekTarget::Label(label) => timeline.label_index(label),
			SeekTarget::InScene {
				scene,
				frame,
			} => timeline.scene(scene).and_then(|scene| in_scene(scene, frame)),
			SeekTarget::InCurrentScene(frame) => in_scene(self.current_scene(), frame),
		}
	}

	/// Moves to `target` and sets the state to Playing iff `play`.
	///
	/// # Errors
	///
	/// Returns [`SwfError::UnresolvedSeek`] when the target does not exist; position and
	/// state are left unchanged.
	pub fn goto(&mut self, target: SeekTarget, play: bool) -> Result<(), SwfError> {
		let Some(index) = self.resolve(&target) else {
			log::debug!("unresolved seek to {target}");
			return Err(SwfError::UnresolvedSeek {
				target: target.to_string(),
			});
		};
		self.state = if play {
			PlayState::Playing
		} else {
			PlayState::Stopped
		};
		self.move_to(index, UpdateCause::Seek);
		Ok(())
	}

	/// Seeks to a zero-based raw index.
	pub fn goto_frame(&mut self, index: usize, play: bool) -> Result<(), SwfError> {
		self.goto(SeekTarget::Raw(index), play)
	}

	/// Seeks to a one-based frame number, as authoring tools count frames.
	pub fn goto_frame1(&mut self, number: usize, play: bool) -> Result<(), SwfError> {
		match number.checked_sub(1) {
			Some(index) => self.goto_frame(index, play),
			None => Err(SwfError::UnresolvedSeek {
				target: "frame number 0".to_string(),
			}),
		}
	}

	/// Seeks to a scene-relative frame of a named scene.
	pub fn goto_scene_frame(&mut self, scene: &str, index: usize, play: bool) -> Result<(), SwfError> {
		self.goto(
			SeekTarget::InScene {
				scene: scene.to_string(),
				frame: FrameRef::Index(index),
			},
			play,
		)
	}

	/// Seeks to a frame label.
	pub fn goto_label(&mut self, label: &str, play: bool) -> Result<(), SwfError> {
		self.goto(SeekTarget::Label(label.to_string()), play)
	}

	/// Starts playing from the current frame.
	pub fn play(&mut self) {
		self.state = PlayState::Playing;
	}

	/// Stops without moving.
	pub fn stop(&mut self) {
		self.state = PlayState::Stopped;
	}

	/// Advances one frame according to the loop flags.
	///
	/// Returns `true` if the frame changed. Reaching the end without a loop flag stops
	/// the playhead on the last frame.
	pub fn step(&mut self) -> bool {
		let timeline = timeline_of(&self.movie, self.sprite);
		let last = timeline.frame_count() - 1;
		let scene_range = self.current_scene().frame_range();

		let next = if self.loops_scene && self.index + 1 >= scene_range.end {
			scene_range.start
		} else if self.index < last {
			self.index + 1
		} else if self.loops_movie {
			0
		} else {
			self.state = PlayState::Stopped;
			return false;
		};
		self.move_to(next, UpdateCause::Step)
	}

	/// Steps once if playing.
	pub fn tick(&mut self) -> bool {
		match self.state {
			PlayState::Playing => self.step(),
			PlayState::Stopped => false,
		}
	}

	fn move_to(&mut self, index: usize, cause: UpdateCause) -> bool {
		if index == self.index {
			return false;
		}
		let movie = Arc::clone(&self.movie);
		let timeline = timeline_of(&movie, self.sprite);
		let scene = timeline.scene_index_of(index);
		let mut update = FrameUpdate {
			from: self.index,
			to: index,
			scene,
			cause,
			interpolate: false,
			sprite: self.sprite,
		};

		if let Some(delegate) = self.delegate.as_mut() {
			update.interpolate = delegate.should_interpolate(update.from, update.to);
			delegate.will_update_frame(&update);
		}
		self.index = index;
		self.scene = scene;
		log::trace!("playhead {} -> {index}", update.from);
		if let (Some(delegate), Some(frame)) = (self.delegate.as_mut(), timeline.frame(index)) {
			delegate.did_update_frame(&movie, frame, &update);
		}
		true
	}
}
