//! Surface filters and blend modes of PlaceObject3.
//!
//! ## FILTERLIST
//!
//! ```text
//! UI8     count
//! FILTER  filters[count]      UI8 filter id + body
//! ```
//!
//! | ID | Filter        |
//! |----|---------------|
//! | 0  | DropShadow    |
//! | 1  | Blur          |
//! | 2  | Glow          |
//! | 3  | Bevel         |
//! | 4  | GradientGlow  |
//! | 5  | Convolution   |
//! | 6  | ColorMatrix   |
//! | 7  | GradientBevel |

use bitflags::bitflags;
use serde::Serialize;

use crate::swf::{
	bits::BitReader,
	error::SwfError,
	library::shape::GradientStop,
	records::Color,
};

bitflags! {
	/// Shared switches of shadow, glow and bevel filters.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct FilterFlags: u8 {
		/// Inner shadow or inner glow
		const INNER = 0x80;
		/// Knock out the source
		const KNOCKOUT = 0x40;
		/// Composite with the source
		const COMPOSITE_SOURCE = 0x20;
		/// Bevel on top
		const ON_TOP = 0x10;
	}
}

/// Blur, offset and strength shared by shadow-like filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShadowParams {
	/// Horizontal blur
	pub blur_x: f32,
	/// Vertical blur
	pub blur_y: f32,
	/// Angle in radians
	pub angle: f32,
	/// Distance in pixels
	pub distance: f32,
	/// Strength
	pub strength: f32,
	/// Switches
	pub flags: FilterFlags,
	/// Blur passes
	pub passes: u8,
}

/// A surface filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Filter {
	/// Drop shadow
	DropShadow {
		/// Shadow color
		color: Color,
		/// Parameters
		params: ShadowParams,
	},
	/// Box blur
	Blur {
		/// Horizontal blur
		blur_x: f32,
		/// Vertical blur
		blur_y: f32,
		/// Blur passes
		passes: u8,
	},
	/// Glow; angle and distance are zero
	Glow {
		/// Glow color
		color: Color,
		/// Parameters
		params: ShadowParams,
	},
	/// Bevel
	Bevel {
		/// Shadow color
		shadow_color: Color,
		/// Highlight color
		highlight_color: Color,
		/// Parameters
		params: ShadowParams,
	},
	/// Glow with a gradient
	GradientGlow {
		/// Gradient stops
		stops: Vec<GradientStop>,
		/// Parameters
		params: ShadowParams,
	},
	/// Convolution matrix
	Convolution {
		/// Matrix columns
		columns: u8,
		/// Matrix rows
		rows: u8,
		/// Divisor
		divisor: f32,
		/// Bias
		bias: f32,
		/// Row-major matrix values
		matrix: Vec<f32>,
		/// Color for out-of-range pixels
		default_color: Color,
		/// Clamp to the image edge
		clamp: bool,
		/// Keep the source alpha
		preserve_alpha: bool,
	},
	/// 4x5 color matrix
	ColorMatrix {
		/// Row-major values
		matrix: [f32; 20],
	},
	/// Bevel with a gradient
	GradientBevel {
		/// Gradient stops
		stops: Vec<GradientStop>,
		/// Parameters
		params: ShadowParams,
	},
}

fn read_blur(reader: &mut BitReader<'_>) -> Result<(f32, f32), SwfError> {
	Ok((reader.read_fixed16()?, reader.read_fixed16()?))
}

/// Reads the trailing flag byte; `pass_bits` is 5 for shadow/glow and 4 for bevels.
fn read_flags(reader: &mut BitReader<'_>, pass_bits: u32) -> Result<(FilterFlags, u8), SwfError> {
	let byte = reader.read_u8()?;
	let mask = if pass_bits == 4 {
		0xF0
	} else {
		0xE0
	};
	let passes = byte & !mask;
	Ok((FilterFlags::from_bits_truncate(byte & mask), passes))
}

fn read_gradient_filter(reader: &mut BitReader<'_>) -> Result<(Vec<GradientStop>, ShadowParams), SwfError> {
	let count = usize::from(reader.read_u8()?);
	let mut colors = Vec::with_capacity(count);
	for _ in 0..count {
		colors.push(Color::read_rgba(reader)?);
	}
	let mut stops = Vec::with_capacity(count);
	for color in colors {
		stops.push(GradientStop {
			ratio: reader.read_u8()?,
			color,
		});
	}
	let (blur_x, blur_y) = read_blur(reader)?;
	let angle = reader.read_fixed16()?;
	let distance = reader.read_fixed16()?;
	let strength = reader.read_fixed8()?;
	let (flags, passes) = read_flags(reader, 4)?;
	Ok((
		stops,
		ShadowParams {
			blur_x,
			blur_y,
			angle,
			distance,
			strength,
			flags,
			passes,
		},
	))
}

impl Filter {
	/// Reads one FILTER record.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] for an unknown filter ID.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let offset = reader.position();
		let filter = match reader.read_u8()? {
			0 => {
				let color = Color::read_rgba(reader)?;
				let (blur_x, blur_y) = read_blur(reader)?;
				let angle = reader.read_fixed16()?;
				let distance = reader.read_fixed16()?;
				let strength = reader.read_fixed8()?;
				let (flags, passes) = read_flags(reader, 5)?;
				Filter::DropShadow {
					color,
					params: ShadowParams {
						blur_x,
						blur_y,
						angle,
						distance,
						strength,
						flags,
						passes,
					},
				}
			}
			1 => {
				let (blur_x, blur_y) = read_blur(reader)?;
				let passes = reader.read_u8()? >> 3;
				Filter::Blur {
					blur_x,
					blur_y,
					passes,
				}
			}
			2 => {
				let color = Color::read_rgba(reader)?;
				let (blur_x, blur_y) = read_blur(reader)?;
				let strength = reader.read_fixed8()?;
				let (flags, passes) = read_flags(reader, 5)?;
				Filter::Glow {
					color,
					params: ShadowParams {
						blur_x,
						blur_y,
						angle: 0.0,
						distance: 0.0,
						strength,
						flags,
						passes,
					},
				}
			}
			3 => {
				let shadow_color = Color::read_rgba(reader)?;
				let highlight_color = Color::read_rgba(reader)?;
				let (blur_x, blur_y) = read_blur(reader)?;
				let angle = reader.read_fixed16()?;
				let distance = reader.read_fixed16()?;
				let strength = reader.read_fixed8()?;
				let (flags, passes) = read_flags(reader, 4)?;
				Filter::Bevel {
					shadow_color,
					highlight_color,
					params: ShadowParams {
						blur_x,
						blur_y,
						angle,
						distance,
						strength,
						flags,
						passes,
					},
				}
			}
			4 => {
				let (stops, params) = read_gradient_filter(reader)?;
				Filter::GradientGlow {
					stops,
					params,
				}
			}
			5 => {
				let columns = reader.read_u8()?;
				let rows = reader.read_u8()?;
				let divisor = reader.read_f32()?;
				let bias = reader.read_f32()?;
				let len = usize::from(columns) * usize::from(rows);
				let mut matrix = Vec::with_capacity(len.min(reader.remaining() / 4));
				for _ in 0..len {
					matrix.push(reader.read_f32()?);
				}
				let default_color = Color::read_rgba(reader)?;
				let flags = reader.read_u8()?;
				Filter::Convolution {
					columns,
					rows,
					divisor,
					bias,
					matrix,
					default_color,
					clamp: flags & 0x02 != 0,
					preserve_alpha: flags & 0x01 != 0,
				}
			}
			6 => {
				let mut matrix = [0.0; 20];
				for value in &mut matrix {
					*value = reader.read_f32()?;
				}
				Filter::ColorMatrix {
					matrix,
				}
			}
			7 => {
				let (stops, params) = read_gradient_filter(reader)?;
				Filter::GradientBevel {
					stops,
					params,
				}
			}
			other => return Err(SwfError::malformed_record(offset, format!("unknown filter id {other}"))),
		};
		Ok(filter)
	}

	/// Reads a FILTERLIST.
	pub fn read_list(reader: &mut BitReader<'_>) -> Result<Vec<Self>, SwfError> {
		let count = reader.read_u8()?;
		(0..count).map(|_| Filter::read(reader)).collect()
	}

	/// Short name of the filter kind.
	pub fn name(&self) -> &'static str {
		match self {
			Filter::DropShadow {
				..
			} => "DropShadow",
			Filter::Blur {
				..
			} => "Blur",
			Filter::Glow {
				..
			} => "Glow",
			Filter::Bevel {
				..
			} => "Bevel",
			Filter::GradientGlow {
				..
			} => "GradientGlow",
			Filter::Convolution {
				..
			} => "Convolution",
			Filter::ColorMatrix {
				..
			} => "ColorMatrix",
			Filter::GradientBevel {
				..
			} => "GradientBevel",
		}
	}
}

/// Compositing mode of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BlendMode {
	/// Normal
	#[default]
	Normal,
	/// Layer
	Layer,
	/// Multiply
	Multiply,
	/// Screen
	Screen,
	/// Lighten
	Lighten,
	/// Darken
	Darken,
	/// Difference
	Difference,
	/// Add
	Add,
	/// Subtract
	Subtract,
	/// Invert
	Invert,
	/// Alpha
	Alpha,
	/// Erase
	Erase,
	/// Overlay
	Overlay,
	/// Hard light
	HardLight,
}

impl BlendMode {
	/// Reads a blend mode byte.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] for values above 14.
	pub fn read(reader: &mut BitReader<'_>) -> Result<Self, SwfError> {
		let offset = reader.position();
		let mode = match reader.read_u8()? {
			0 | 1 => BlendMode::Normal,
			2 => BlendMode::Layer,
			3 => BlendMode::Multiply,
			4 => BlendMode::Screen,
			5 => BlendMode::Lighten,
			6 => BlendMode::Darken,
			7 => BlendMode::Difference,
			8 => BlendMode::Add,
			9 => BlendMode::Subtract,
			10 => BlendMode::Invert,
			11 => BlendMode::Alpha,
			12 => BlendMode::Erase,
			13 => BlendMode::Overlay,
			14 => BlendMode::HardLight,
			other => return Err(SwfError::malformed_record(offset, format!("unknown blend mode {other}"))),
		};
		Ok(mode)
	}
}
