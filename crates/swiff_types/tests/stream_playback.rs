//! Streaming sound and looping through the public API.

use std::sync::{Arc, Mutex};

use swiff_types::{
	prelude::*,
	swf::{
		library::sound::{SoundEvent, StreamBlock},
		writer::{BitWriter, TagStream},
	},
};

#[derive(Clone, Default)]
struct Blocks(Arc<Mutex<Vec<(usize, Vec<u8>)>>>);

impl AudioOutput for Blocks {
	fn play(&mut self, _sound: &Sound, _event: &SoundEvent) {}

	fn queue_stream_block(&mut self, sound: &Sound, block: &StreamBlock) {
		self.0.lock().unwrap().push((block.frame_index, sound.block_data(block).to_vec()));
	}
}

struct NullRenderer;

impl Renderer for NullRenderer {
	fn render(&mut self, _movie: &Movie, _placed: &[&PlacedObject], _context: &RenderContext) {}
}

fn streaming_movie() -> Arc<Movie> {
	let mut head = BitWriter::new();
	head.write_u8(0x0E);
	head.write_u8(0x3E);
	head.write_u16(1470);

	let mut writer = SwfWriter::new(10);
	writer.set_frame_rate(30.0);
	writer.tag(TagCode::SoundStreamHead2, &head.into_bytes());
	writer.tag(TagCode::SoundStreamBlock, &[1, 2, 3]);
	writer.show_frame();
	writer.show_frame();
	writer.tag(TagCode::SoundStreamBlock, &[4, 5]);
	writer.show_frame();
	Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap())
}

fn streaming_movie_with_sprite(sprite_id: u16) -> Arc<Movie> {
	let mut head = BitWriter::new();
	head.write_u8(0x0E);
	head.write_u8(0x3E);
	head.write_u16(1470);

	let mut inner = TagStream::new();
	for _ in 0..3 {
		inner.show_frame();
	}

	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::SoundStreamHead2, &head.into_bytes());
	writer.tag(TagCode::DefineSprite, &inner.into_sprite_body(sprite_id));
	writer.tag(TagCode::SoundStreamBlock, &[1, 2, 3]);
	writer.show_frame();
	writer.tag(TagCode::SoundStreamBlock, &[4, 5]);
	writer.show_frame();
	writer.tag(TagCode::SoundStreamBlock, &[6]);
	writer.show_frame();
	Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap())
}

#[test]
fn test_stream_blocks_are_queued_per_frame() {
	let movie = streaming_movie();
	let stream = movie.timeline().stream_sound().unwrap();
	assert_eq!(stream.stream_blocks.len(), 2);

	let blocks = Blocks::default();
	let mut playhead = Playhead::new(Arc::clone(&movie));
	playhead.set_delegate(Box::new(RenderDelegate::new(NullRenderer).with_audio(Box::new(blocks.clone()))));
	playhead.play();

	let mut host = HeadlessHost::default();
	assert_eq!(host.drive(&mut playhead, 3), 3);
	assert_eq!(playhead.current_index(), 0);

	let queued = blocks.0.lock().unwrap().clone();
	assert_eq!(queued, vec![(2, vec![4, 5]), (0, vec![1, 2, 3])]);
}

#[test]
fn test_sprite_playhead_leaves_movie_stream_alone() {
	let movie = streaming_movie_with_sprite(7);
	assert_eq!(movie.timeline().stream_sound().unwrap().stream_blocks.len(), 3);

	let blocks = Blocks::default();
	let mut sprite = Playhead::for_sprite(Arc::clone(&movie), 7).unwrap();
	sprite.set_delegate(Box::new(RenderDelegate::new(NullRenderer).with_audio(Box::new(blocks.clone()))));
	sprite.play();
	assert!(sprite.tick());
	assert!(sprite.tick());
	sprite.goto_frame(0, false).unwrap();
	assert_eq!(sprite.current_index(), 0);
	assert!(blocks.0.lock().unwrap().is_empty());

	let mut root = Playhead::new(movie);
	root.set_delegate(Box::new(RenderDelegate::new(NullRenderer).with_audio(Box::new(blocks.clone()))));
	root.play();
	assert!(root.tick());
	assert_eq!(blocks.0.lock().unwrap().clone(), vec![(1, vec![4, 5])]);
}

#[test]
fn test_playhead_stops_at_end_without_loop() {
	let movie = streaming_movie();
	let mut playhead = Playhead::new(movie);
	playhead.loops_movie = false;
	assert_eq!(playhead.frame_interval().as_millis(), 33);

	playhead.play();
	assert!(playhead.tick());
	assert!(playhead.tick());
	assert!(!playhead.tick());
	assert_eq!(playhead.current_index(), 2);
	assert_eq!(playhead.state(), PlayState::Stopped);
	assert!(!playhead.tick());
}

#[test]
fn test_stopped_playhead_ignores_ticks() {
	let mut playhead = Playhead::new(streaming_movie());
	let mut host = HeadlessHost::default();
	assert_eq!(host.drive(&mut playhead, 5), 0);
	assert_eq!(host.ticks, 5);
	assert_eq!(playhead.current_index(), 0);
}
