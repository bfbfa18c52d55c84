//! Collaborator interfaces around the playhead.
//!
//! The decoder never draws, plays audio or owns a timer. Those jobs belong to the
//! embedding application, which implements:
//!
//! - [`Renderer`]: draws a depth-ordered list of placed objects
//! - [`AudioOutput`]: plays decoded sound definitions
//! - [`Host`]: calls [`Playhead::tick`] at the movie's frame rate
//!
//! [`RenderDelegate`] connects a playhead to a renderer and an optional audio output.

use crate::swf::{
	library::sound::{Sound, SoundEvent, SoundTarget, StreamBlock},
	movie::Movie,
	records::{Color, Rect},
	timeline::{
		frame::Frame,
		placed::PlacedObject,
		playhead::{FrameUpdate, Playhead, PlayheadDelegate},
	},
};

/// Per-frame information handed to a [`Renderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
	/// Raw index of the frame being drawn
	pub frame_index: usize,
	/// Stage rectangle in twips
	pub stage: Rect,
	/// Stage background color in effect
	pub background: Option<Color>,
	/// The transition into this frame should be animated
	pub interpolate: bool,
}

/// Draws placed objects.
pub trait Renderer {
	/// Draws `placed` in the given (ascending depth) order. Definitions are looked up
	/// through `movie`.
	fn render(&mut self, movie: &Movie, placed: &[&PlacedObject], context: &RenderContext);
}

/// Plays sounds.
pub trait AudioOutput {
	/// Starts an event sound.
	fn play(&mut self, sound: &Sound, event: &SoundEvent);

	/// Stops every instance of a sound.
	fn stop(&mut self, _library_id: u16, _sound: &Sound) {}

	/// Queues the streaming sound data of one frame.
	fn queue_stream_block(&mut self, _sound: &Sound, _block: &StreamBlock) {}
}

/// Owner of the frame timer.
pub trait Host {
	/// Called once per timer period. Returns `true` if the frame changed.
	fn on_tick(&mut self, playhead: &mut Playhead) -> bool {
		playhead.tick()
	}
}

/// A host without a clock; ticks as fast as it is driven.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost {
	/// Ticks delivered so far
	pub ticks: u64,
}

impl Host for HeadlessHost {
	fn on_tick(&mut self, playhead: &mut Playhead) -> bool {
		self.ticks += 1;
		playhead.tick()
	}
}

impl HeadlessHost {
	/// Delivers `ticks` ticks. Returns how many of them changed the frame.
	pub fn drive(&mut self, playhead: &mut Playhead, ticks: usize) -> usize {
		(0..ticks).filter(|_| self.on_tick(playhead)).count()
	}
}

/// Draws one frame.
pub fn render_frame(movie: &Movie, frame: &Frame, renderer: &mut dyn Renderer, interpolate: bool) {
	let placed = movie.display_list(frame);
	let context = RenderContext {
		frame_index: frame.index(),
		stage: movie.header().stage,
		background: frame.background_color(),
		interpolate,
	};
	renderer.render(movie, &placed, &context);
}

/// Starts and stops the frame's event sounds. Returns the number of events delivered.
///
/// Targets are resolved through the library, class names through the export and
/// symbol class tables. Unresolved targets are skipped.
pub fn dispatch_sounds(movie: &Movie, frame: &Frame, audio: &mut dyn AudioOutput) -> usize {
	let mut delivered = 0;
	for event in frame.sound_events() {
		let library_id = match &event.target {
			SoundTarget::Id(id) => Some(*id),
			SoundTarget::Class(name) => movie.resolve_symbol(name),
		};
		let Some((library_id, sound)) = library_id.and_then(|id| movie.library().sound(id).map(|sound| (id, sound))) else {
			log::debug!("sound event target {:?} not found", event.target);
			continue;
		};
		if event.info.stop {
			audio.stop(library_id, sound);
		} else {
			audio.play(sound, event);
		}
		delivered += 1;
	}
	delivered
}

/// A [`PlayheadDelegate`] that renders every new frame and forwards its sounds.
///
/// Only the movie timeline's streaming sound is forwarded; sprite playheads get
/// their event sounds only.
pub struct RenderDelegate<R> {
	renderer: R,
	audio: Option<Box<dyn AudioOutput>>,
	/// Answer given to [`PlayheadDelegate::should_interpolate`]
	pub interpolate: bool,
}

impl<R: Renderer> RenderDelegate<R> {
	/// Creates a delegate without audio.
	pub fn new(renderer: R) -> Self {
		Self {
			renderer,
			audio: None,
			interpolate: false,
		}
	}

	/// Adds an audio output.
	pub fn with_audio(mut self, audio: Box<dyn AudioOutput>) -> Self {
		self.audio = Some(audio);
		self
	}

	/// The wrapped renderer.
	pub fn renderer(&self) -> &R {
		&self.renderer
	}
}

impl<R: Renderer> PlayheadDelegate for RenderDelegate<R> {
	fn did_update_frame(&mut self, movie: &Movie, frame: &Frame, update: &FrameUpdate) {
		render_frame(movie, frame, &mut self.renderer, update.interpolate);
		if let Some(audio) = self.audio.as_deref_mut() {
			dispatch_sounds(movie, frame, audio);
			if update.sprite.is_some() {
				return;
			}
			if let Some(stream) = movie.timeline().stream_sound() {
				if let Some(block) = stream.stream_block_for_frame(frame.index()) {
					audio.queue_stream_block(stream, block);
				}
			}
		}
	}

	fn should_interpolate(&mut self, _from: usize, _to: usize) -> bool {
		self.interpolate
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::{
		TagCode,
		writer::{BitWriter, SwfWriter},
	};
	use std::sync::{Arc, Mutex};

	#[derive(Default, Clone)]
	struct Log(Arc<Mutex<Vec<String>>>);

	impl Renderer for Log {
		fn render(&mut self, _movie: &Movie, placed: &[&PlacedObject], context: &RenderContext) {
			let ids: Vec<String> = placed.iter().map(|object| object.library_id.to_string()).collect();
			self.0.lock().unwrap().push(format!("render {} [{}]", context.frame_index, ids.join(",")));
		}
	}

	impl AudioOutput for Log {
		fn play(&mut self, sound: &Sound, _event: &SoundEvent) {
			self.0.lock().unwrap().push(format!("play {}", sound.sample_count));
		}

		fn stop(&mut self, library_id: u16, _sound: &Sound) {
			self.0.lock().unwrap().push(format!("stop {library_id}"));
		}
	}

	fn movie() -> Arc<Movie> {
		let mut sound = BitWriter::new();
		sound.write_u16(5);
		sound.write_u8(0x3E);
		sound.write_u32(441);
		sound.write_bytes(&[0; 8]);

		let mut place = BitWriter::new();
		place.write_u8(0x06);
		place.write_u16(1);
		place.write_u16(7);
		place.write_matrix(&crate::swf::records::Matrix::IDENTITY);

		let mut writer = SwfWriter::new(10);
		writer.tag(TagCode::DefineSound, &sound.into_bytes());
		writer.show_frame();
		writer.tag(TagCode::PlaceObject2, &place.into_bytes());
		writer.tag(TagCode::StartSound, &[5, 0, 0]);
		writer.show_frame();
		writer.tag(TagCode::StartSound, &[5, 0, 0x20]);
		writer.tag(TagCode::StartSound, &[9, 0, 0]);
		writer.show_frame();
		Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap())
	}

	#[test]
	fn test_render_delegate_forwards_frames_and_sounds() {
		let log = Log::default();
		let mut playhead = Playhead::new(movie());
		playhead.set_delegate(Box::new(RenderDelegate::new(log.clone()).with_audio(Box::new(log.clone()))));
		playhead.play();

		let mut host = HeadlessHost::default();
		assert_eq!(host.drive(&mut playhead, 2), 2);
		assert_eq!(host.ticks, 2);

		let entries = log.0.lock().unwrap().clone();
		// id 7 is undefined, so depth 1 is never drawn
		assert_eq!(entries, vec![
			"render 1 []".to_string(),
			"play 441".to_string(),
			"render 2 []".to_string(),
			"stop 5".to_string(),
		]);
	}
}
