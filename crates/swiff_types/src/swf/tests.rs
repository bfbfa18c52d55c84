//! End-to-end decoding tests over synthetic movies.

use std::sync::Arc;

use crate::swf::{
	Compression, ErrorKind, FileAttributes, Movie, ParseConfig, Playhead, SwfWriter, TagCode,
	records::{Color, Matrix, Rect},
	timeline::playhead::PlayState,
	writer::{BitWriter, TagStream},
};

fn solid_square(id: u16) -> Vec<u8> {
	let mut body = BitWriter::new();
	body.write_u16(id);
	body.write_rect(&Rect::new(0, 200, 0, 200));
	body.write_u8(1);
	body.write_u8(0x00);
	body.write_rgb(Color::rgb(0, 0, 255));
	body.write_u8(0);
	body.write_ubits(1, 4);
	body.write_ubits(0, 4);
	body.write_bit(false);
	body.write_ubits(0b00101, 5);
	body.write_ubits(1, 5);
	body.write_sbits(0, 1);
	body.write_sbits(0, 1);
	body.write_ubits(1, 1);
	for (dx, dy) in [(200, 0), (0, 200), (-200, 0), (0, -200)] {
		body.write_bit(true);
		body.write_bit(true);
		body.write_ubits(8, 4);
		body.write_bit(true);
		body.write_sbits(dx, 10);
		body.write_sbits(dy, 10);
	}
	body.write_bit(false);
	body.write_ubits(0, 5);
	body.into_bytes()
}

fn place2(flags: u8, depth: u16, id: Option<u16>, matrix: Option<Matrix>, name: Option<&str>) -> Vec<u8> {
	let mut body = BitWriter::new();
	body.write_u8(flags);
	body.write_u16(depth);
	if let Some(id) = id {
		body.write_u16(id);
	}
	if let Some(matrix) = matrix {
		body.write_matrix(&matrix);
	}
	if let Some(name) = name {
		body.write_string(name);
	}
	body.into_bytes()
}

fn place1(id: u16, depth: u16) -> Vec<u8> {
	let mut body = BitWriter::new();
	body.write_u16(id);
	body.write_u16(depth);
	body.write_matrix(&Matrix::IDENTITY);
	body.into_bytes()
}

fn decode(writer: SwfWriter) -> Arc<Movie> {
	Arc::new(Movie::from_bytes(&writer.finish().unwrap()).unwrap())
}

#[test]
fn test_place_object2_modify_inherits_fields() {
	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::DefineShape, &solid_square(1));
	// place: HasName | HasMatrix | HasCharacter
	writer.tag(TagCode::PlaceObject2, &place2(0x26, 1, Some(1), Some(Matrix::translate(100, 0)), Some("box")));
	writer.show_frame();
	// modify: HasMatrix | Move
	writer.tag(TagCode::PlaceObject2, &place2(0x05, 1, None, Some(Matrix::translate(50, 0)), None));
	writer.show_frame();
	// modify with no fields flagged
	writer.tag(TagCode::PlaceObject2, &place2(0x01, 1, None, None, None));
	writer.show_frame();

	let movie = decode(writer);
	assert!(movie.diagnostics().is_empty());
	assert_eq!(movie.frames()[2].placed_at(1), movie.frames()[1].placed_at(1));

	let first = movie.frames()[0].placed_at(1).unwrap();
	let second = movie.frames()[1].placed_at(1).unwrap();
	assert_eq!(first.matrix().translate_x, 100);
	assert_eq!(second.library_id, 1);
	assert_eq!(second.name.as_deref(), Some("box"));
	assert_eq!(second.matrix().translate_x, 50);
}

#[test]
fn test_nested_sprite_keeps_its_own_display_list() {
	let mut inner = TagStream::new();
	inner.tag(TagCode::PlaceObject, &place1(1, 1));
	inner.show_frame();
	inner.show_frame();

	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::DefineShape, &solid_square(1));
	writer.tag(TagCode::DefineSprite, &inner.into_sprite_body(2));
	writer.tag(TagCode::PlaceObject, &place1(2, 1));
	writer.show_frame();

	let movie = decode(writer);
	assert!(movie.diagnostics().is_empty());
	assert_eq!(movie.frame_count(), 1);
	assert_eq!(movie.frames()[0].placed_at(1).unwrap().library_id, 2);

	let sprite = movie.library().sprite(2).unwrap();
	assert_eq!(sprite.timeline.frame_count(), 2);
	assert_eq!(sprite.timeline.frame(0).unwrap().placed_at(1).unwrap().library_id, 1);

	let mut playhead = Playhead::for_sprite(Arc::clone(&movie), 2).unwrap();
	assert_eq!(playhead.placed_objects()[0].library_id, 1);
	playhead.goto_frame(1, false).unwrap();
	assert_eq!(playhead.placed_objects()[0].library_id, 1);

	let err = Playhead::for_sprite(movie, 1).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
}

#[test]
fn test_unresolved_seek_leaves_position_unchanged() {
	let mut writer = SwfWriter::new(10);
	writer.show_frame();
	writer.show_frame();
	writer.tag(TagCode::FrameLabel, b"end\0");
	writer.show_frame();

	let mut playhead = Playhead::new(decode(writer));
	playhead.goto_frame(1, true).unwrap();
	assert_eq!(playhead.state(), PlayState::Playing);

	let err = playhead.goto_label("missing", false).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::UnresolvedSeek);
	assert_eq!(playhead.current_index(), 1);
	assert_eq!(playhead.state(), PlayState::Playing);

	assert!(playhead.goto_frame(3, false).is_err());
	assert!(playhead.goto_frame1(0, false).is_err());
	assert_eq!(playhead.current_index(), 1);

	playhead.goto_label("end", false).unwrap();
	assert_eq!(playhead.current_index(), 2);
	assert_eq!(playhead.state(), PlayState::Stopped);
}

#[test]
fn test_corrupt_zlib_fails_before_any_tag() {
	let mut data = b"CWS\x0a".to_vec();
	data.extend_from_slice(&64u32.to_le_bytes());
	data.extend_from_slice(&[0xFF; 16]);

	let err = Movie::from_bytes(&data).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Decompression);
}

#[test]
fn test_zlib_movie_decodes() {
	let mut writer = SwfWriter::new(10);
	writer.set_compression(Compression::Zlib);
	writer.tag(TagCode::DefineShape, &solid_square(3));
	writer.show_frame();

	let movie = decode(writer);
	assert_eq!(movie.header().compression, Compression::Zlib);
	assert!(movie.library().shape(3).is_some());
}

#[test_log::test]
fn test_oversized_gradient_drops_only_its_shape() {
	let mut gradient = BitWriter::new();
	gradient.write_u16(1);
	gradient.write_rect(&Rect::new(0, 100, 0, 100));
	gradient.write_u8(1);
	gradient.write_u8(0x10);
	gradient.write_matrix(&Matrix::IDENTITY);
	// version 7 gradients carry a full byte count
	gradient.write_u8(16);
	for ratio in 0..16u8 {
		gradient.write_u8(ratio * 16);
		gradient.write_rgb(Color::rgb(ratio, ratio, ratio));
	}

	let mut writer = SwfWriter::new(7);
	writer.tag(TagCode::DefineShape, &gradient.into_bytes());
	writer.tag(TagCode::DefineShape, &solid_square(2));
	writer.show_frame();

	let movie = decode(writer);
	assert!(movie.library().shape(1).is_none());
	assert!(movie.library().shape(2).is_some());
	assert_eq!(movie.diagnostics().len(), 1);
	let diagnostic = &movie.diagnostics()[0];
	assert_eq!(diagnostic.kind, ErrorKind::MalformedRecord);
	assert_eq!(diagnostic.tag, Some(TagCode::DefineShape));
	assert_eq!(diagnostic.library_id, Some(1));
}

#[test_log::test]
fn test_missing_definition_is_reported_once() {
	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::PlaceObject2, &place2(0x02, 1, Some(40), None, None));
	writer.show_frame();
	writer.tag(TagCode::PlaceObject2, &place2(0x06, 1, Some(40), Some(Matrix::translate(20, 0)), None));
	writer.show_frame();

	let movie = decode(writer);
	let unresolved: Vec<_> = movie
		.diagnostics()
		.iter()
		.filter(|diagnostic| diagnostic.kind == ErrorKind::UnresolvedReference)
		.collect();
	assert_eq!(unresolved.len(), 1);
	assert_eq!(unresolved[0].library_id, Some(40));

	// still on the timeline, never in the display list
	assert_eq!(movie.frames()[1].depth_count(), 1);
	assert!(movie.display_list(&movie.frames()[1]).is_empty());
}

#[test]
fn test_movie_level_tags() {
	let mut exports = BitWriter::new();
	exports.write_u16(1);
	exports.write_u16(1);
	exports.write_string("Square");

	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::FileAttributes, &0x18u32.to_le_bytes());
	writer.tag(TagCode::Metadata, b"<rdf:RDF/>\0");
	writer.tag(TagCode::SetBackgroundColor, &[0x10, 0x20, 0x30]);
	writer.tag(TagCode::DefineShape, &solid_square(1));
	writer.tag(TagCode::ExportAssets, &exports.into_bytes());
	writer.tag(TagCode::DoAction, &[0]);
	writer.show_frame();

	let movie = decode(writer);
	assert!(movie.diagnostics().is_empty());
	assert_eq!(movie.file_attributes(), FileAttributes::HAS_METADATA | FileAttributes::ACTION_SCRIPT_3);
	assert_eq!(movie.metadata(), Some("<rdf:RDF/>"));
	assert_eq!(movie.background_color(), Some(Color::rgb(0x10, 0x20, 0x30)));
	assert_eq!(movie.resolve_symbol("Square"), Some(1));
	assert_eq!(movie.resolve_symbol("Circle"), None);

	let summary = movie.summary();
	assert_eq!(summary.frame_count, 1);
	assert_eq!(summary.scene_count, 1);
	assert_eq!(summary.export_count, 1);
	assert_eq!(summary.definitions.get("Shape"), Some(&1));
	assert_eq!(summary.diagnostic_count, 0);
	assert_eq!(summary.header.version, 10);
}

#[test]
fn test_scenes_from_scene_data() {
	let mut scenes = BitWriter::new();
	scenes.write_encoded_u32(2);
	scenes.write_encoded_u32(0);
	scenes.write_string("Intro");
	scenes.write_encoded_u32(2);
	scenes.write_string("Main");
	scenes.write_encoded_u32(1);
	scenes.write_encoded_u32(3);
	scenes.write_string("loop");

	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::DefineSceneAndFrameLabelData, &scenes.into_bytes());
	for _ in 0..4 {
		writer.show_frame();
	}

	let movie = decode(writer);
	let names: Vec<&str> = movie.scenes().iter().map(|scene| scene.name.as_str()).collect();
	assert_eq!(names, ["Intro", "Main"]);
	assert_eq!(movie.scenes()[1].frame_range(), 2..4);

	let mut playhead = Playhead::new(Arc::clone(&movie));
	playhead.goto_scene_frame("Main", 1, false).unwrap();
	assert_eq!(playhead.current_index(), 3);
	assert_eq!(playhead.current_scene().name, "Main");
	assert!(playhead.goto_scene_frame("Main", 2, false).is_err());

	playhead.goto_frame(0, false).unwrap();
	playhead.goto_label("loop", false).unwrap();
	assert_eq!(playhead.current_index(), 3);

	playhead.loops_scene = true;
	assert!(playhead.step());
	assert_eq!(playhead.current_index(), 2);
}

#[test_log::test]
fn test_self_placing_sprites_are_reported() {
	let sprite = |placed: u16, id: u16| {
		let mut inner = TagStream::new();
		inner.tag(TagCode::PlaceObject, &place1(placed, 1));
		inner.show_frame();
		inner.into_sprite_body(id)
	};

	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::DefineSprite, &sprite(3, 2));
	writer.tag(TagCode::DefineSprite, &sprite(3, 3));
	writer.tag(TagCode::DefineSprite, &sprite(6, 5));
	writer.tag(TagCode::DefineSprite, &sprite(5, 6));
	writer.tag(TagCode::PlaceObject, &place1(2, 1));
	writer.show_frame();

	let movie = decode(writer);
	assert_eq!(movie.library().len(), 4);
	let cycles: Vec<_> = movie.diagnostics().iter().map(|d| (d.kind, d.tag, d.library_id)).collect();
	assert_eq!(cycles, vec![
		(ErrorKind::MalformedRecord, Some(TagCode::DefineSprite), Some(3)),
		(ErrorKind::MalformedRecord, Some(TagCode::DefineSprite), Some(5)),
	]);
	assert!(movie.diagnostics()[1].message.ends_with("5 -> 6 -> 5"));
}

#[test]
fn test_strict_config_rejects_recovered_problems() {
	let mut writer = SwfWriter::new(10);
	writer.tag(TagCode::DefineShape, &solid_square(1));
	writer.tag(TagCode::PlaceObject2, &place2(0x02, 1, Some(40), None, None));
	writer.show_frame();
	let data = writer.finish().unwrap();

	let movie = Movie::from_bytes(&data).unwrap();
	assert!(movie.diagnostics().iter().any(|d| d.kind == ErrorKind::UnresolvedReference));

	let err = Movie::from_bytes_with_config(&data, &ParseConfig::strict()).unwrap_err();
	assert_eq!(err.kind(), movie.diagnostics()[0].kind);

	let mut clean = SwfWriter::new(10);
	clean.tag(TagCode::DefineShape, &solid_square(1));
	clean.show_frame();
	assert!(Movie::from_bytes_with_config(&clean.finish().unwrap(), &ParseConfig::strict()).is_ok());
}
