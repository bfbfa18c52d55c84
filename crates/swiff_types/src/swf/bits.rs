//! Bit- and byte-granular reader over a SWF buffer.
//!
//! ## Bit Ordering
//!
//! Bit fields are read MSB-first within each byte, exactly like the writer in
//! [`super::writer`] emits them:
//!
//! ```text
//! byte:   b7 b6 b5 b4 b3 b2 b1 b0 | b7 b6 ...
//! read:    0  1  2  3  4  5  6  7 |  8  9 ...
//! ```
//!
//! ## Field Kinds
//!
//! | Kind  | Width    | Meaning                                      |
//! |-------|----------|----------------------------------------------|
//! | UB[n] | 0..=32   | unsigned bit field                           |
//! | SB[n] | 0..=32   | signed bit field, sign-extended from bit n-1 |
//! | FB[n] | 0..=32   | signed 16.16 fixed point                     |
//! | UI8+  | bytes    | little-endian integers, byte aligned         |
//! | EU32  | 1-5      | 7-bit groups with a continuation bit         |
//!
//! ## Alignment Contract
//!
//! Byte-level reads do not align on their own. Callers switch from bit fields to
//! bytes through [`BitReader::byte_align`]; this is how every record in the format
//! is laid out, and decoders state it explicitly.
//!
//! ## Failure
//!
//! Every read checks the reader's limit before touching any state. A read that would
//! cross the limit returns [`SwfError::Truncated`] and leaves the cursor where it was,
//! so repeated failing reads have no side effects.

use crate::swf::error::SwfError;

/// Cursor over a borrowed byte buffer with a bit offset.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
	data: &'a [u8],
	byte_pos: usize,
	bit_pos: u32,
	limit: usize,
}

impl<'a> BitReader<'a> {
	/// Creates a reader positioned at byte 0, bit 0.
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			byte_pos: 0,
			bit_pos: 0,
			limit: data.len(),
		}
	}

	/// The whole underlying buffer.
	pub fn data(&self) -> &'a [u8] {
		self.data
	}

	/// Current byte offset.
	pub fn position(&self) -> usize {
		self.byte_pos
	}

	/// Number of bits already consumed in the current byte.
	pub fn bit_offset(&self) -> u32 {
		self.bit_pos
	}

	/// Returns `true` when no partial byte is pending.
	pub fn is_aligned(&self) -> bool {
		self.bit_pos == 0
	}

	/// Exclusive byte offset reads may not cross.
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Restricts reads to `[.., limit)`, clamped to the buffer length.
	pub fn set_limit(&mut self, limit: usize) {
		self.limit = limit.min(self.data.len());
	}

	/// Moves the cursor to a byte offset, dropping any partial byte.
	///
	/// Offsets past the buffer end are clamped.
	pub fn seek(&mut self, position: usize) {
		self.byte_pos = position.min(self.data.len());
		self.bit_pos = 0;
	}

	/// Whole bytes left before the limit, not counting a partially read byte.
	pub fn remaining(&self) -> usize {
		let next = if self.bit_pos == 0 {
			self.byte_pos
		} else {
			self.byte_pos + 1
		};
		self.limit.saturating_sub(next)
	}

	fn bits_available(&self) -> u64 {
		let bytes = self.limit.saturating_sub(self.byte_pos) as u64;
		(bytes * 8).saturating_sub(u64::from(self.bit_pos))
	}

	fn truncated(&self, needed_bits: u64) -> SwfError {
		let missing = needed_bits.saturating_sub(self.bits_available());
		SwfError::Truncated {
			offset: self.byte_pos,
			needed: missing.div_ceil(8) as usize,
		}
	}

	/// Reads an unsigned bit field of `n` bits, `n` in `0..=32`.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] when fewer than `n` bits remain, and
	/// [`SwfError::MalformedRecord`] when `n` exceeds 32.
	///
	/// # Examples
	///
	/// ```
	/// use swiff_types::swf::BitReader;
	///
	/// let mut reader = BitReader::new(&[0b1011_0000]);
	/// assert_eq!(reader.read_ubits(1).unwrap(), 1);
	/// assert_eq!(reader.read_ubits(3).unwrap(), 0b011);
	/// ```
	pub fn read_ubits(&mut self, n: u32) -> Result<u32, SwfError> {
		if n > 32 {
			return Err(SwfError::malformed_record(
				self.byte_pos,
				format!("bit field width {n} exceeds 32"),
			));
		}
		if n == 0 {
			return Ok(0);
		}
		if u64::from(n) > self.bits_available() {
			return Err(self.truncated(u64::from(n)));
		}

		let mut value: u64 = 0;
		let mut left = n;
		while left > 0 {
			let byte = self.data[self.byte_pos];
			let avail = 8 - self.bit_pos;
			let take = avail.min(left);
			let shift = avail - take;
			let bits = (u32::from(byte) >> shift) & ((1u32 << take) - 1);
			value = (value << take) | u64::from(bits);
			left -= take;
			self.bit_pos += take;
			if self.bit_pos == 8 {
				self.bit_pos = 0;
				self.byte_pos += 1;
			}
		}

		Ok(value as u32)
	}

	/// Reads a signed bit field of `n` bits and sign-extends it.
	///
	/// # Errors
	///
	/// Same as [`BitReader::read_ubits`].
	pub fn read_sbits(&mut self, n: u32) -> Result<i32, SwfError> {
		let raw = self.read_ubits(n)?;
		Ok(sign_extend(raw, n))
	}

	/// Reads an `n`-bit signed 16.16 fixed-point field.
	///
	/// # Errors
	///
	/// Same as [`BitReader::read_ubits`].
	pub fn read_fbits(&mut self, n: u32) -> Result<f32, SwfError> {
		Ok(self.read_sbits(n)? as f32 / 65536.0)
	}

	/// Reads a single bit as a flag.
	pub fn read_bit(&mut self) -> Result<bool, SwfError> {
		Ok(self.read_ubits(1)? == 1)
	}

	/// Discards the remaining bits of the current byte.
	///
	/// Calling it on an aligned reader does nothing.
	pub fn byte_align(&mut self) {
		if self.bit_pos != 0 {
			self.bit_pos = 0;
			self.byte_pos += 1;
		}
	}

	fn take(&mut self, len: usize) -> Result<&'a [u8], SwfError> {
		let end = self.byte_pos.checked_add(len).filter(|end| *end <= self.limit);
		match end {
			Some(end) => {
				let slice = &self.data[self.byte_pos..end];
				self.byte_pos = end;
				Ok(slice)
			}
			None => Err(SwfError::Truncated {
				offset: self.byte_pos,
				needed: len - self.limit.saturating_sub(self.byte_pos),
			}),
		}
	}

	fn take_array<const N: usize>(&mut self) -> Result<[u8; N], SwfError> {
		let mut out = [0u8; N];
		out.copy_from_slice(self.take(N)?);
		Ok(out)
	}

	/// Reads one byte. The reader must be byte aligned.
	pub fn read_u8(&mut self) -> Result<u8, SwfError> {
		Ok(self.take_array::<1>()?[0])
	}

	/// Reads a little-endian `u16`. The reader must be byte aligned.
	pub fn read_u16(&mut self) -> Result<u16, SwfError> {
		Ok(u16::from_le_bytes(self.take_array()?))
	}

	/// Reads a little-endian `u32`. The reader must be byte aligned.
	pub fn read_u32(&mut self) -> Result<u32, SwfError> {
		Ok(u32::from_le_bytes(self.take_array()?))
	}

	/// Reads a signed byte.
	pub fn read_i8(&mut self) -> Result<i8, SwfError> {
		Ok(self.read_u8()? as i8)
	}

	/// Reads a little-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16, SwfError> {
		Ok(i16::from_le_bytes(self.take_array()?))
	}

	/// Reads a little-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32, SwfError> {
		Ok(i32::from_le_bytes(self.take_array()?))
	}

	/// Reads a signed 8.8 fixed-point value.
	pub fn read_fixed8(&mut self) -> Result<f32, SwfError> {
		Ok(f32::from(self.read_i16()?) / 256.0)
	}

	/// Reads a signed 16.16 fixed-point value.
	pub fn read_fixed16(&mut self) -> Result<f32, SwfError> {
		Ok(self.read_i32()? as f32 / 65536.0)
	}

	/// Reads an IEEE single-precision float.
	pub fn read_f32(&mut self) -> Result<f32, SwfError> {
		Ok(f32::from_bits(self.read_u32()?))
	}

	/// Reads an IEEE half-precision float.
	pub fn read_f16(&mut self) -> Result<f32, SwfError> {
		Ok(f16_to_f32(self.read_u16()?))
	}

	/// Reads a variable-length `u32`: 7-bit groups, low group first, high bit set
	/// on every group but the last, at most five groups.
	///
	/// # Errors
	///
	/// Returns [`SwfError::Truncated`] if the buffer ends inside the value. The
	/// cursor does not move on failure.
	///
	/// # Examples
	///
	/// ```
	/// use swiff_types::swf::BitReader;
	///
	/// let mut reader = BitReader::new(&[0xE5, 0x8E, 0x26]);
	/// assert_eq!(reader.read_encoded_u32().unwrap(), 624_485);
	/// ```
	pub fn read_encoded_u32(&mut self) -> Result<u32, SwfError> {
		let start = self.byte_pos;
		let mut value: u32 = 0;
		for group in 0..5 {
			let byte = match self.read_u8() {
				Ok(byte) => byte,
				Err(err) => {
					self.byte_pos = start;
					return Err(err);
				}
			};
			value |= u32::from(byte & 0x7F).wrapping_shl(7 * group);
			if byte & 0x80 == 0 {
				break;
			}
		}
		Ok(value)
	}

	/// Reads `len` raw bytes.
	pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], SwfError> {
		self.take(len)
	}

	/// Reads everything up to the limit.
	pub fn read_remaining(&mut self) -> &'a [u8] {
		self.byte_align();
		let start = self.byte_pos.min(self.limit);
		self.byte_pos = self.limit.max(self.byte_pos);
		&self.data[start..self.limit.max(start)]
	}

	/// Skips `len` bytes.
	pub fn advance(&mut self, len: usize) -> Result<(), SwfError> {
		self.take(len).map(|_| ())
	}
}

/// Sign-extends the low `n` bits of `raw`.
pub(crate) fn sign_extend(raw: u32, n: u32) -> i32 {
	match n {
		0 => 0,
		32 => raw as i32,
		_ => {
			let shift = 32 - n;
			((raw << shift) as i32) >> shift
		}
	}
}

fn f16_to_f32(bits: u16) -> f32 {
	let sign = if bits & 0x8000 != 0 {
		-1.0
	} else {
		1.0
	};
	let exponent = i32::from((bits >> 10) & 0x1F);
	let mantissa = f32::from(bits & 0x03FF);
	match exponent {
		0 => sign * mantissa * 2f32.powi(-24),
		0x1F if mantissa == 0.0 => sign * f32::INFINITY,
		0x1F => f32::NAN,
		_ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exponent - 15),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::swf::writer::BitWriter;

	#[test]
	fn test_ubits_sbits_every_width() {
		for n in 0..=32u32 {
			// Alternate all-ones and a pattern with only the sign bit set.
			let patterns: [u32; 2] = if n == 0 {
				[0, 0]
			} else {
				[u32::MAX >> (32 - n), 1u32 << (n - 1)]
			};
			for pattern in patterns {
				let mut writer = BitWriter::new();
				writer.write_ubits(pattern, n);
				writer.write_ubits(pattern, n);
				let data = writer.into_bytes();

				let mut reader = BitReader::new(&data);
				let unsigned = reader.read_ubits(n).unwrap();
				let signed = reader.read_sbits(n).unwrap();

				assert_eq!(unsigned, pattern, "unsigned width {n}");
				let expected = if n == 0 {
					0
				} else if n == 32 {
					pattern as i32
				} else if pattern >> (n - 1) & 1 == 1 {
					(i64::from(pattern) - (1i64 << n)) as i32
				} else {
					pattern as i32
				};
				assert_eq!(signed, expected, "signed width {n}");
			}
		}
	}

	#[test]
	fn test_zero_width_reads_nothing() {
		let mut reader = BitReader::new(&[]);
		assert_eq!(reader.read_ubits(0).unwrap(), 0);
		assert_eq!(reader.read_sbits(0).unwrap(), 0);
		assert_eq!(reader.position(), 0);
	}

	#[test]
	fn test_byte_align_idempotent() {
		let data = [0xFF, 0x12, 0x34];
		let mut once = BitReader::new(&data);
		once.read_ubits(3).unwrap();
		once.byte_align();

		let mut twice = BitReader::new(&data);
		twice.read_ubits(3).unwrap();
		twice.byte_align();
		twice.byte_align();

		assert_eq!(once.position(), twice.position());
		assert_eq!(once.read_u16().unwrap(), twice.read_u16().unwrap());

		let mut aligned = BitReader::new(&data);
		aligned.byte_align();
		assert_eq!(aligned.position(), 0);
	}

	#[test]
	fn test_truncated_read_does_not_move() {
		let mut reader = BitReader::new(&[0xAB, 0xCD]);
		reader.read_ubits(4).unwrap();

		let err = reader.read_ubits(16).unwrap_err();
		assert!(matches!(
			err,
			SwfError::Truncated {
				offset: 0,
				needed: 1,
			}
		));
		assert_eq!(reader.position(), 0);
		assert_eq!(reader.bit_offset(), 4);

		// Still usable afterwards.
		assert_eq!(reader.read_ubits(12).unwrap(), 0xBCD);
		assert!(reader.read_u8().is_err());
		assert!(reader.read_u8().is_err());
		assert_eq!(reader.position(), 2);
	}

	#[test]
	fn test_limit_is_respected() {
		let data = [1, 2, 3, 4];
		let mut reader = BitReader::new(&data);
		reader.set_limit(2);
		assert_eq!(reader.read_u16().unwrap(), 0x0201);
		assert!(reader.read_u8().is_err());
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn test_little_endian_primitives() {
		let data = [0xFE, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF];
		let mut reader = BitReader::new(&data);
		assert_eq!(reader.read_i8().unwrap(), -2);
		assert_eq!(reader.read_u16().unwrap(), 0x1234);
		assert_eq!(reader.read_u32().unwrap(), 0x1234_5678);
		assert_eq!(reader.read_i16().unwrap(), -1);
	}

	#[test]
	fn test_fixed_point() {
		let mut reader = BitReader::new(&[0x80, 0x01, 0x00, 0x80, 0x01, 0x00]);
		assert_eq!(reader.read_fixed8().unwrap(), 1.5);
		assert_eq!(reader.read_fixed16().unwrap(), 1.5);

		let mut writer = BitWriter::new();
		writer.write_sbits(-(1 << 15), 18);
		let data = writer.into_bytes();
		let mut reader = BitReader::new(&data);
		assert_eq!(reader.read_fbits(18).unwrap(), -0.5);
	}

	#[test]
	fn test_encoded_u32() {
		let mut reader = BitReader::new(&[0x7F, 0x80, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
		assert_eq!(reader.read_encoded_u32().unwrap(), 127);
		assert_eq!(reader.read_encoded_u32().unwrap(), 128);
		assert_eq!(reader.read_encoded_u32().unwrap(), u32::MAX);

		let mut short = BitReader::new(&[0x80, 0x80]);
		assert!(short.read_encoded_u32().is_err());
		assert_eq!(short.position(), 0);
	}

	#[test]
	fn test_half_float() {
		assert_eq!(f16_to_f32(0x3C00), 1.0);
		assert_eq!(f16_to_f32(0xC000), -2.0);
		assert_eq!(f16_to_f32(0x3800), 0.5);
		assert_eq!(f16_to_f32(0), 0.0);
	}

	#[test]
	fn test_read_remaining_and_advance() {
		let data = [1, 2, 3, 4, 5];
		let mut reader = BitReader::new(&data);
		reader.advance(2).unwrap();
		assert!(reader.advance(10).is_err());
		assert_eq!(reader.read_remaining(), &[3, 4, 5]);
		assert!(reader.read_remaining().is_empty());
	}
}
