//! Benchmark helper utilities for swiff-rs
//!
//! This module generates synthetic movies for the decode and playback benchmarks.
//! Each movie defines `shape_count` square shapes and animates all of them across
//! `frame_count` frames, so both the library scan and the per-frame display list
//! copy show up in the profile.

use swiff_types::swf::{
	Compression, Matrix, Rect, SwfWriter, TagCode,
	records::Color,
	writer::BitWriter,
};

/// Encodes a DefineShape body for a solid square of `size` twips.
pub fn square_shape(id: u16, size: i32) -> Vec<u8> {
	let mut body = BitWriter::new();
	body.write_u16(id);
	body.write_rect(&Rect::new(0, size, 0, size));
	body.write_u8(1);
	body.write_u8(0x00);
	body.write_rgb(Color::rgb((id % 256) as u8, 0x80, 0x40));
	body.write_u8(0);
	body.write_ubits(1, 4);
	body.write_ubits(0, 4);

	body.write_bit(false);
	body.write_ubits(0b00101, 5);
	body.write_ubits(1, 5);
	body.write_sbits(0, 1);
	body.write_sbits(0, 1);
	body.write_ubits(1, 1);
	for (dx, dy) in [(size, 0), (0, size), (-size, 0), (0, -size)] {
		body.write_bit(true);
		body.write_bit(true);
		body.write_ubits(14, 4);
		body.write_bit(true);
		body.write_sbits(dx, 16);
		body.write_sbits(dy, 16);
	}
	body.write_bit(false);
	body.write_ubits(0, 5);
	body.into_bytes()
}

/// Encodes a PlaceObject2 body. `library_id` of `None` moves an existing object.
pub fn place_object(depth: u16, library_id: Option<u16>, matrix: &Matrix) -> Vec<u8> {
	let mut body = BitWriter::new();
	match library_id {
		Some(id) => {
			body.write_u8(0x06);
			body.write_u16(depth);
			body.write_u16(id);
		}
		None => {
			body.write_u8(0x05);
			body.write_u16(depth);
		}
	}
	body.write_matrix(matrix);
	body.into_bytes()
}

/// Builds a movie with `shape_count` shapes moving over `frame_count` frames.
pub fn generate_movie(shape_count: u16, frame_count: u16, compression: Compression) -> Vec<u8> {
	let mut writer = SwfWriter::new(10);
	writer.set_compression(compression);
	writer.tag(TagCode::SetBackgroundColor, &[0xFF, 0xFF, 0xFF]);

	for id in 1..=shape_count {
		writer.tag(TagCode::DefineShape, &square_shape(id, 400));
	}
	for frame in 0..frame_count {
		for id in 1..=shape_count {
			let matrix = Matrix::translate(i32::from(frame) * 20, i32::from(id) * 20);
			let library_id = (frame == 0).then_some(id);
			writer.tag(TagCode::PlaceObject2, &place_object(id, library_id, &matrix));
		}
		writer.show_frame();
	}

	// Writing to memory only fails for LZMA output
	writer.finish().unwrap_or_default()
}
