//! Playback tests for `swiff-rs`

use std::sync::Arc;

use swiff_rs::prelude::*;
use swiff_rs::swiff_types::swf::writer::BitWriter;

fn labelled_movie() -> Arc<Movie> {
	let mut place = BitWriter::new();
	place.write_u8(0x06);
	place.write_u16(1);
	place.write_u16(1);
	place.write_matrix(&Matrix::translate(40, 60));

	let mut shape = BitWriter::new();
	shape.write_u16(1);
	shape.write_rect(&Rect::new(0, 20, 0, 20));
	shape.write_u8(0);
	shape.write_u8(0);
	shape.write_u8(0);
	shape.write_bit(false);
	shape.write_ubits(0, 5);

	let mut writer = SwfWriter::new(9);
	writer.tag(TagCode::SetBackgroundColor, &[0xFF, 0xFF, 0xFF]);
	writer.tag(TagCode::DefineShape, &shape.into_bytes());
	writer.tag(TagCode::PlaceObject2, &place.into_bytes());
	writer.tag(TagCode::FrameLabel, b"start\0");
	writer.show_frame();
	writer.show_frame();
	writer.tag(TagCode::RemoveObject2, &1u16.to_le_bytes());
	writer.tag(TagCode::FrameLabel, b"empty\0");
	writer.show_frame();

	Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap())
}

#[test_log::test]
fn test_label_navigation() {
	let movie = labelled_movie();
	assert!(movie.diagnostics().is_empty(), "{:?}", movie.diagnostics());

	let mut playhead = Playhead::new(Arc::clone(&movie));
	assert_eq!(playhead.placed_objects().len(), 1);

	playhead.goto_label("empty", false).unwrap();
	assert!(playhead.placed_objects().is_empty());
	assert_eq!(playhead.current_frame().label().map(|label| label.name.as_str()), Some("empty"));

	playhead.goto_label("start", true).unwrap();
	assert!(playhead.is_playing());
	assert_eq!(playhead.placed_objects()[0].matrix().translate_y, 60);
}

#[test]
fn test_headless_loop() {
	let mut playhead = Playhead::new(labelled_movie());
	playhead.play();

	let mut host = HeadlessHost::default();
	assert_eq!(host.drive(&mut playhead, 7), 7);
	// 7 steps over 3 frames wraps twice
	assert_eq!(playhead.current_index(), 1);
}

#[test]
fn test_summary_serializes() {
	let movie = labelled_movie();
	let value = serde_json::to_value(movie.summary()).unwrap();

	assert_eq!(value["frame_count"], 3);
	assert_eq!(value["label_count"], 2);
	assert_eq!(value["definitions"]["Shape"], 1);
	assert_eq!(value["header"]["version"], 9);
}
