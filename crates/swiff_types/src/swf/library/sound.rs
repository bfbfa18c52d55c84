//! Event sounds, streaming sounds, and sound start events.
//!
//! Only byte framing happens here. Sample decoding belongs to the audio output.
//!
//! ## SOUNDFORMAT bits
//!
//! ```text
//! UB[4]  compression   0 PCM native, 1 ADPCM, 2 MP3, 3 PCM LE, 4-6 Nellymoser, 11 Speex
//! UB[2]  rate          5.5, 11, 22, 44 kHz
//! UB[1]  16-bit
//! UB[1]  stereo
//! ```
//!
//! A streaming sound is announced by SoundStreamHead and fed by one SoundStreamBlock
//! per frame. Blocks are appended into one payload and indexed by frame number.

use std::ops::Range;

use bytes::{Bytes, BytesMut};
use serde::Serialize;

use crate::swf::{
	bits::BitReader,
	constants,
	cursor::TagCursor,
	error::SwfError,
};

/// Sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SoundCompression {
	/// Uncompressed, platform byte order
	UncompressedNative,
	/// ADPCM
	Adpcm,
	/// MP3
	Mp3,
	/// Uncompressed, little-endian
	UncompressedLittleEndian,
	/// Nellymoser at 16 kHz
	Nellymoser16Khz,
	/// Nellymoser at 8 kHz
	Nellymoser8Khz,
	/// Nellymoser
	Nellymoser,
	/// Speex
	Speex,
}

impl SoundCompression {
	fn from_bits(value: u32, offset: usize) -> Result<Self, SwfError> {
		match value {
			0 => Ok(SoundCompression::UncompressedNative),
			1 => Ok(SoundCompression::Adpcm),
			2 => Ok(SoundCompression::Mp3),
			3 => Ok(SoundCompression::UncompressedLittleEndian),
			4 => Ok(SoundCompression::Nellymoser16Khz),
			5 => Ok(SoundCompression::Nellymoser8Khz),
			6 => Ok(SoundCompression::Nellymoser),
			11 => Ok(SoundCompression::Speex),
			other => Err(SwfError::malformed_record(offset, format!("unknown sound compression {other}"))),
		}
	}
}

/// Encoding, rate, sample size and channel count of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundFormat {
	/// Sample encoding
	pub compression: SoundCompression,
	/// Samples per second
	pub sample_rate: u32,
	/// 16-bit samples
	pub is_16_bit: bool,
	/// Two channels
	pub is_stereo: bool,
}

impl SoundFormat {
	/// Reads the 8-bit SOUNDFORMAT field group.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let offset = reader.position();
		let compression = SoundCompression::from_bits(reader.read_ubits(4)?, offset)?;
		let rate = reader.read_ubits(2)? as usize;
		let is_16_bit = reader.read_bit()?;
		let is_stereo = reader.read_bit()?;
		Ok(Self {
			compression,
			sample_rate: constants::SOUND_RATES[rate],
			is_16_bit,
			is_stereo,
		})
	}

	/// Number of interleaved channels.
	pub fn channels(&self) -> u16 {
		if self.is_stereo {
			2
		} else {
			1
		}
	}
}

/// One SoundStreamBlock in the combined stream payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamBlock {
	/// Timeline frame the block belongs to
	pub frame_index: usize,
	/// Byte range within [`Sound::data`]
	pub range: Range<usize>,
	/// Samples in this block (MP3 only, 0 otherwise)
	pub sample_count: u16,
	/// Samples to skip at the start of this block (MP3 only)
	pub seek: i16,
}

/// A sound definition or a timeline's streaming sound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
	/// Encoding of `data`
	pub format: SoundFormat,
	/// Format the author asked the player to use (streams only)
	pub playback_format: Option<SoundFormat>,
	/// Declared samples per channel (per block for streams)
	pub sample_count: u32,
	/// MP3 encoder delay in samples
	pub latency_seek: i16,
	/// Encoded samples
	#[serde(skip)]
	pub data: Bytes,
	/// Per-frame blocks; empty for event sounds
	pub stream_blocks: Vec<StreamBlock>,
}

impl Sound {
	/// Decodes a DefineSound tag body. Returns the sound ID and the sound.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<(u16, Self), SwfError> {
		let id = cursor.read_u16()?;
		let format = SoundFormat::read(cursor)?;
		let sample_count = cursor.read_u32()?;
		let latency_seek = if format.compression == SoundCompression::Mp3 {
			cursor.read_i16()?
		} else {
			0
		};
		let data = cursor.read_remaining_shared();
		Ok((
			id,
			Self {
				format,
				playback_format: None,
				sample_count,
				latency_seek,
				data,
				stream_blocks: Vec::new(),
			},
		))
	}

	/// Returns `true` for a timeline streaming sound.
	pub fn is_streaming(&self) -> bool {
		self.playback_format.is_some()
	}

	/// Duration of an event sound in seconds.
	pub fn duration_secs(&self) -> f64 {
		f64::from(self.sample_count) / f64::from(self.format.sample_rate)
	}

	/// The block queued for a timeline frame.
	pub fn stream_block_for_frame(&self, frame_index: usize) -> Option<&StreamBlock> {
		self.stream_blocks
			.binary_search_by_key(&frame_index, |block| block.frame_index)
			.ok()
			.map(|index| &self.stream_blocks[index])
	}

	/// Payload bytes of a block.
	pub fn block_data(&self, block: &StreamBlock) -> Bytes {
		self.data.slice(block.range.clone())
	}
}

/// Accumulates SoundStreamBlock payloads for one timeline.
#[derive(Debug)]
pub struct SoundStreamBuilder {
	format: SoundFormat,
	playback_format: SoundFormat,
	sample_count: u16,
	latency_seek: i16,
	data: BytesMut,
	blocks: Vec<StreamBlock>,
}

impl SoundStreamBuilder {
	/// Decodes a SoundStreamHead or SoundStreamHead2 tag body.
	pub fn decode_head(cursor: &mut TagCursor<'_>) -> Result<Self, SwfError> {
		cursor.read_ubits(4)?;
		let rate = cursor.read_ubits(2)? as usize;
		let playback_16_bit = cursor.read_bit()?;
		let playback_stereo = cursor.read_bit()?;
		let format = SoundFormat::read(cursor)?;
		let sample_count = cursor.read_u16()?;
		let latency_seek = if format.compression == SoundCompression::Mp3 && cursor.remaining() >= 2 {
			cursor.read_i16()?
		} else {
			0
		};

		Ok(Self {
			format,
			playback_format: SoundFormat {
				compression: SoundCompression::UncompressedLittleEndian,
				sample_rate: constants::SOUND_RATES[rate],
				is_16_bit: playback_16_bit,
				is_stereo: playback_stereo,
			},
			sample_count,
			latency_seek,
			data: BytesMut::new(),
			blocks: Vec::new(),
		})
	}

	/// Appends the current SoundStreamBlock body for `frame_index`.
	///
	/// A second block for the same frame replaces the first one, payload included.
	pub fn append_block(&mut self, cursor: &mut TagCursor<'_>, frame_index: usize) -> Result<(), SwfError> {
		let (sample_count, seek) = if self.format.compression == SoundCompression::Mp3 {
			(cursor.read_u16()?, cursor.read_i16()?)
		} else {
			(self.sample_count, 0)
		};
		let payload = cursor.read_remaining();

		let replaced = match self.blocks.last() {
			Some(last) if last.frame_index == frame_index => Some(last.range.start),
			_ => None,
		};
		if let Some(start) = replaced {
			log::debug!("second stream block in frame {frame_index}, dropping the first");
			self.blocks.pop();
			// always the tail of the buffer
			self.data.truncate(start);
		}

		let start = self.data.len();
		self.data.extend_from_slice(payload);
		self.blocks.push(StreamBlock {
			frame_index,
			range: start..self.data.len(),
			sample_count,
			seek,
		});
		Ok(())
	}

	/// Freezes the stream into a [`Sound`].
	pub fn build(self) -> Sound {
		Sound {
			format: self.format,
			playback_format: Some(self.playback_format),
			sample_count: u32::from(self.sample_count),
			latency_seek: self.latency_seek,
			data: self.data.freeze(),
			stream_blocks: self.blocks,
		}
	}
}

/// One point of a volume envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvelopePoint {
	/// Position in 44 kHz samples
	pub position: u32,
	/// Left level, 0-32768
	pub left: u16,
	/// Right level, 0-32768
	pub right: u16,
}

/// Playback options of a sound start (SOUNDINFO).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundInfo {
	/// Stop the sound instead of starting it
	pub stop: bool,
	/// Do not start if already playing
	pub no_multiple: bool,
	/// First sample to play
	pub in_point: Option<u32>,
	/// Last sample to play
	pub out_point: Option<u32>,
	/// Number of times to play
	pub loop_count: u16,
	/// Volume envelope
	pub envelope: Vec<EnvelopePoint>,
}

impl SoundInfo {
	/// Reads a SOUNDINFO record.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let flags = reader.read_u8()?;
		let in_point = if flags & 0x01 != 0 {
			Some(reader.read_u32()?)
		} else {
			None
		};
		let out_point = if flags & 0x02 != 0 {
			Some(reader.read_u32()?)
		} else {
			None
		};
		let loop_count = if flags & 0x04 != 0 {
			reader.read_u16()?
		} else {
			1
		};
		let mut envelope = Vec::new();
		if flags & 0x08 != 0 {
			let points = reader.read_u8()?;
			for _ in 0..points {
				envelope.push(EnvelopePoint {
					position: reader.read_u32()?,
					left: reader.read_u16()?,
					right: reader.read_u16()?,
				});
			}
		}
		Ok(Self {
			stop: flags & 0x20 != 0,
			no_multiple: flags & 0x10 != 0,
			in_point,
			out_point,
			loop_count,
			envelope,
		})
	}

	/// Left and right volume at a 44 kHz sample position, `0.0..=1.0`.
	///
	/// Levels are interpolated linearly between envelope points and held flat
	/// before the first and after the last point.
	pub fn levels_at(&self, position: u32) -> (f32, f32) {
		let level = |value: u16| f32::from(value) / 32768.0;
		let (Some(first), Some(last)) = (self.envelope.first(), self.envelope.last()) else {
			return (1.0, 1.0);
		};
		if position <= first.position {
			return (level(first.left), level(first.right));
		}
		if position >= last.position {
			return (level(last.left), level(last.right));
		}
		for pair in self.envelope.windows(2) {
			let (a, b) = (&pair[0], &pair[1]);
			if position >= a.position && position <= b.position {
				let span = (b.position - a.position).max(1) as f32;
				let t = (position - a.position) as f32 / span;
				let lerp = |from: u16, to: u16| level(from) + (level(to) - level(from)) * t;
				return (lerp(a.left, b.left), lerp(a.right, b.right));
			}
		}
		(level(last.left), level(last.right))
	}
}

/// What a sound start refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SoundTarget {
	/// A DefineSound by library ID
	Id(u16),
	/// A sound by exported class name (StartSound2)
	Class(String),
}

/// A StartSound or StartSound2 attached to a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoundEvent {
	/// Sound to start or stop
	pub target: SoundTarget,
	/// Playback options
	pub info: SoundInfo,
}

impl SoundEvent {
	/// Decodes a StartSound or StartSound2 tag body.
	pub fn decode(cursor: &mut TagCursor<'_>) -> Result<Self, SwfError> {
		let target = if cursor.current_tag_version() >= 2 {
			SoundTarget::Class(cursor.read_string()?)
		} else {
			SoundTarget::Id(cursor.read_u16()?)
		};
		let info = SoundInfo::read(cursor)?;
		Ok(Self {
			target,
			info,
		})
	}
}
