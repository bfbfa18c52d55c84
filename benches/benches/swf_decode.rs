//! Benchmark suite for SWF decoding
//!
//! This benchmark measures movie decoding, with and without zlib, and playhead
//! stepping over the decoded timeline.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml
//!
//! For flamegraph profiling:
//! cargo bench --manifest-path benches/Cargo.toml -- --profile-time=5

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::{hint::black_box, sync::Arc};
use swiff_benches::generate_movie;
use swiff_types::swf::{BitReader, Compression, Header, Movie, Playhead};

/// Benchmark full decoding at several timeline sizes
fn bench_decode_movie(c: &mut Criterion) {
	let mut group = c.benchmark_group("swf_decode");

	for (shapes, frames) in [(10u16, 24u16), (100, 120), (200, 600)] {
		for compression in [Compression::None, Compression::Zlib] {
			let data = generate_movie(shapes, frames, compression);
			group.throughput(Throughput::Bytes(data.len() as u64));
			let name = format!("{shapes}x{frames}/{compression}");
			group.bench_with_input(BenchmarkId::new("from_bytes", name), &data, |b, data| {
				b.iter(|| {
					let result = Movie::from_bytes(black_box(data));
					black_box(result)
				});
			});
		}
	}

	group.finish();
}

/// Benchmark raw bit-field reads
fn bench_bit_reads(c: &mut Criterion) {
	let mut group = c.benchmark_group("swf_bits");
	let data: Vec<u8> = (0..64 * 1024).map(|i| (i * 31 % 251) as u8).collect();

	for width in [1u32, 5, 13, 31] {
		let fields = data.len() as u64 * 8 / u64::from(width);
		group.throughput(Throughput::Elements(fields));
		group.bench_with_input(BenchmarkId::new("read_ubits", width), &width, |b, &width| {
			b.iter(|| {
				let mut reader = BitReader::new(black_box(&data));
				let mut sum = 0u64;
				while let Ok(value) = reader.read_ubits(width) {
					sum = sum.wrapping_add(u64::from(value));
				}
				black_box(sum)
			});
		});
	}

	group.finish();
}

/// Benchmark header parsing separately
fn bench_header_parsing(c: &mut Criterion) {
	let mut group = c.benchmark_group("swf_header");
	let data = generate_movie(1, 1, Compression::None);

	group.bench_function("parse_header", |b| {
		b.iter(|| {
			let result = Header::from_bytes(black_box(&data));
			black_box(result)
		});
	});

	group.finish();
}

/// Benchmark stepping the playhead through every frame
fn bench_playhead(c: &mut Criterion) {
	let mut group = c.benchmark_group("swf_playhead");
	let data = generate_movie(100, 600, Compression::None);
	let movie = match Movie::from_bytes(&data) {
		Ok(movie) => Arc::new(movie),
		Err(err) => {
			eprintln!("Warning: Could not decode benchmark movie: {err}");
			return;
		}
	};

	group.throughput(Throughput::Elements(movie.frame_count() as u64));
	group.bench_function("step_all_frames", |b| {
		b.iter(|| {
			let mut playhead = Playhead::new(Arc::clone(&movie));
			let mut visible = 0;
			for _ in 0..movie.frame_count() {
				playhead.step();
				visible += playhead.placed_objects().len();
			}
			black_box(visible)
		});
	});

	group.finish();
}

criterion_group!(benches, bench_bit_reads, bench_decode_movie, bench_header_parsing, bench_playhead);
criterion_main!(benches);
