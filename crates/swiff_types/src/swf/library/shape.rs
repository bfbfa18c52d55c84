//! Shape definitions: style arrays, edge records, and path assembly.
//!
//! ## Tag Layout (DefineShape 1-4)
//!
//! ```text
//! UI16        shape_id
//! RECT        bounds
//! RECT        edge_bounds          version 4 only
//! UI8         flags                version 4 only
//! FILLSTYLEARRAY
//! LINESTYLEARRAY
//! UB[4]       num_fill_bits
//! UB[4]       num_line_bits
//! SHAPERECORD...                   terminated by an all-zero style change
//! ```
//!
//! ## Path Assembly
//!
//! Edges arrive as a single pen stroke that toggles styles along the way. Fill edges
//! are collected per fill style: an edge with `fill_style1` set is kept in drawing
//! direction, an edge with `fill_style0` set is kept reversed, so every fill sees its
//! region on the same side. Each fill's edges are then chained into closed contours.
//! Line edges are kept in drawing order and a new path record is started at every
//! style change record.
//!
//! A new-styles record closes the current style group; style indices in later groups
//! are offset into one flattened style list. Within a group, fill paths come first
//! (by style index), then line paths.

use std::collections::{HashMap, HashSet};

use bitflags::bitflags;
use serde::Serialize;

use crate::swf::{
	bits::BitReader,
	constants,
	cursor::TagCursor,
	error::SwfError,
	parse_config::ParseConfig,
	records::{Color, Matrix, Rect, Twips},
};

/// Gradient spread mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpreadMode {
	/// Extend the end colors
	#[default]
	Pad,
	/// Mirror the gradient
	Reflect,
	/// Repeat the gradient
	Repeat,
}

/// Gradient color interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum InterpolationMode {
	/// sRGB interpolation
	#[default]
	Normal,
	/// Linear RGB interpolation
	Linear,
}

/// One gradient control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradientStop {
	/// Position along the gradient, 0-255
	pub ratio: u8,
	/// Color at this position
	pub color: Color,
}

/// Gradient definition, at most 15 stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gradient {
	/// Spread mode
	pub spread: SpreadMode,
	/// Interpolation mode
	pub interpolation: InterpolationMode,
	/// Control points in file order
	pub stops: Vec<GradientStop>,
}

impl Gradient {
	/// Reads a GRADIENT record.
	///
	/// Movies of version 8 and later carry spread and interpolation modes in the top
	/// four bits of the count byte; older movies use the whole byte as the count.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] if the count exceeds 15 stops, or if the
	/// reserved spread/interpolation values are used.
	pub fn read(reader: &mut BitReader<'_>, with_alpha: bool, movie_version: u8) -> Result<Self, SwfError> {
		let offset = reader.position();
		let (spread, interpolation, count) = if movie_version >= constants::FIRST_GRADIENT_MODES_VERSION {
			let spread = match reader.read_ubits(2)? {
				0 => SpreadMode::Pad,
				1 => SpreadMode::Reflect,
				2 => SpreadMode::Repeat,
				other => return Err(SwfError::malformed_record(offset, format!("reserved spread mode {other}"))),
			};
			let interpolation = match reader.read_ubits(2)? {
				0 => InterpolationMode::Normal,
				1 => InterpolationMode::Linear,
				other => {
					return Err(SwfError::malformed_record(offset, format!("reserved interpolation mode {other}")));
				}
			};
			(spread, interpolation, reader.read_ubits(4)? as usize)
		} else {
			(SpreadMode::Pad, InterpolationMode::Normal, usize::from(reader.read_u8()?))
		};

		if count > constants::MAX_GRADIENT_STOPS {
			return Err(SwfError::malformed_record(
				offset,
				format!("gradient has {count} stops, limit is {}", constants::MAX_GRADIENT_STOPS),
			));
		}

		let mut stops = Vec::with_capacity(count);
		for _ in 0..count {
			let ratio = reader.read_u8()?;
			let color = Color::read(reader, with_alpha)?;
			stops.push(GradientStop {
				ratio,
				color,
			});
		}

		Ok(Self {
			spread,
			interpolation,
			stops,
		})
	}
}

/// How an area is painted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FillStyle {
	/// Flat color
	Solid(Color),
	/// Linear gradient in gradient space (-16384..16384 twips) mapped by `matrix`
	LinearGradient {
		/// Gradient-to-shape transform
		matrix: Matrix,
		/// Stops
		gradient: Gradient,
	},
	/// Radial gradient
	RadialGradient {
		/// Gradient-to-shape transform
		matrix: Matrix,
		/// Stops
		gradient: Gradient,
	},
	/// Radial gradient with a moved focal point
	FocalGradient {
		/// Gradient-to-shape transform
		matrix: Matrix,
		/// Stops
		gradient: Gradient,
		/// Focal point, -1.0 to 1.0
		focal_point: f32,
	},
	/// Bitmap fill referencing a bitmap definition
	Bitmap {
		/// Library ID of the bitmap, 0xFFFF for none
		bitmap_id: u16,
		/// Bitmap-to-shape transform
		matrix: Matrix,
		/// Tile instead of clamping
		repeating: bool,
		/// Bilinear smoothing
		smoothed: bool,
	},
}

impl FillStyle {
	/// Reads a FILLSTYLE record.
	pub fn read(reader: &mut BitReader<'_>, shape_version: u8, movie_version: u8) -> Result<Self, SwfError> {
		let with_alpha = shape_version >= 3;
		let offset = reader.position();
		let fill_type = reader.read_u8()?;
		let style = match fill_type {
			constants::fill::SOLID => FillStyle::Solid(Color::read(reader, with_alpha)?),
			constants::fill::LINEAR_GRADIENT => FillStyle::LinearGradient {
				matrix: Matrix::read(reader)?,
				gradient: Gradient::read(reader, with_alpha, movie_version)?,
			},
			constants::fill::RADIAL_GRADIENT => FillStyle::RadialGradient {
				matrix: Matrix::read(reader)?,
				gradient: Gradient::read(reader, with_alpha, movie_version)?,
			},
			constants::fill::FOCAL_GRADIENT => FillStyle::FocalGradient {
				matrix: Matrix::read(reader)?,
				gradient: Gradient::read(reader, with_alpha, movie_version)?,
				focal_point: reader.read_fixed8()?,
			},
			constants::fill::REPEATING_BITMAP..=constants::fill::NON_SMOOTHED_CLIPPED_BITMAP => {
				let bitmap_id = reader.read_u16()?;
				let matrix = Matrix::read(reader)?;
				FillStyle::Bitmap {
					bitmap_id,
					matrix,
					repeating: fill_type & 0x01 == 0,
					smoothed: fill_type & 0x02 == 0,
				}
			}
			other => {
				return Err(SwfError::malformed_record(offset, format!("unknown fill style type {other:#04x}")));
			}
		};
		Ok(style)
	}

	/// Bitmap referenced by this fill, if any.
	pub fn bitmap_id(&self) -> Option<u16> {
		match self {
			FillStyle::Bitmap {
				bitmap_id,
				..
			} if *bitmap_id != 0xFFFF => Some(*bitmap_id),
			_ => None,
		}
	}
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CapStyle {
	/// Round caps
	#[default]
	Round,
	/// No caps
	None,
	/// Square caps
	Square,
}

impl CapStyle {
	fn from_bits(value: u32, offset: usize) -> Result<Self, SwfError> {
		match value {
			0 => Ok(CapStyle::Round),
			1 => Ok(CapStyle::None),
			2 => Ok(CapStyle::Square),
			other => Err(SwfError::malformed_record(offset, format!("reserved cap style {other}"))),
		}
	}
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum JoinStyle {
	/// Round joins
	#[default]
	Round,
	/// Beveled joins
	Bevel,
	/// Mitered joins with a limit factor
	Miter(f32),
}

bitflags! {
	/// Stroke flags from LINESTYLE2.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct LineFlags: u8 {
		/// Do not scale the stroke horizontally
		const NO_HSCALE = 0x01;
		/// Do not scale the stroke vertically
		const NO_VSCALE = 0x02;
		/// Snap strokes to whole pixels
		const PIXEL_HINTING = 0x04;
		/// Leave paths that return to their start unclosed
		const NO_CLOSE = 0x08;
	}
}

/// How an edge is stroked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
	/// Stroke width in twips
	pub width: u16,
	/// Stroke color; ignored when `fill` is set
	pub color: Color,
	/// Fill used instead of a flat color (LINESTYLE2 only)
	pub fill: Option<FillStyle>,
	/// Cap at the start of each path
	pub start_cap: CapStyle,
	/// Cap at the end of each path
	pub end_cap: CapStyle,
	/// Join style
	pub join: JoinStyle,
	/// Scaling and hinting flags
	pub flags: LineFlags,
}

impl LineStyle {
	/// Reads a LINESTYLE (versions 1-3) or LINESTYLE2 (version 4) record.
	pub fn read(reader: &mut BitReader<'_>, shape_version: u8, movie_version: u8) -> Result<Self, SwfError> {
		let width = reader.read_u16()?;
		if shape_version < 4 {
			return Ok(Self {
				width,
				color: Color::read(reader, shape_version >= 3)?,
				fill: None,
				start_cap: CapStyle::Round,
				end_cap: CapStyle::Round,
				join: JoinStyle::Round,
				flags: LineFlags::empty(),
			});
		}

		let offset = reader.position();
		let start_cap = CapStyle::from_bits(reader.read_ubits(2)?, offset)?;
		let join_kind = reader.read_ubits(2)?;
		let has_fill = reader.read_bit()?;
		let no_hscale = reader.read_bit()?;
		let no_vscale = reader.read_bit()?;
		let pixel_hinting = reader.read_bit()?;
		reader.read_ubits(5)?;
		let no_close = reader.read_bit()?;
		let end_cap = CapStyle::from_bits(reader.read_ubits(2)?, offset)?;

		let join = match join_kind {
			0 => JoinStyle::Round,
			1 => JoinStyle::Bevel,
			2 => JoinStyle::Miter(reader.read_fixed8()?),
			other => return Err(SwfError::malformed_record(offset, format!("reserved join style {other}"))),
		};

		let (color, fill) = if has_fill {
			(Color::BLACK, Some(FillStyle::read(reader, shape_version, movie_version)?))
		} else {
			(Color::read_rgba(reader)?, None)
		};

		let mut flags = LineFlags::empty();
		flags.set(LineFlags::NO_HSCALE, no_hscale);
		flags.set(LineFlags::NO_VSCALE, no_vscale);
		flags.set(LineFlags::PIXEL_HINTING, pixel_hinting);
		flags.set(LineFlags::NO_CLOSE, no_close);

		Ok(Self {
			width,
			color,
			fill,
			start_cap,
			end_cap,
			join,
			flags,
		})
	}
}

fn read_style_count(reader: &mut BitReader<'_>, shape_version: u8) -> Result<usize, SwfError> {
	let count = reader.read_u8()?;
	if count == constants::EXTENDED_STYLE_COUNT && shape_version >= 2 {
		Ok(usize::from(reader.read_u16()?))
	} else {
		Ok(usize::from(count))
	}
}

/// Reads a FILLSTYLEARRAY.
pub fn read_fill_styles(
	reader: &mut BitReader<'_>,
	shape_version: u8,
	movie_version: u8,
) -> Result<Vec<FillStyle>, SwfError> {
	let count = read_style_count(reader, shape_version)?;
	let mut styles = Vec::with_capacity(count.min(reader.remaining()));
	for _ in 0..count {
		styles.push(FillStyle::read(reader, shape_version, movie_version)?);
	}
	Ok(styles)
}

/// Reads a LINESTYLEARRAY.
pub fn read_line_styles(
	reader: &mut BitReader<'_>,
	shape_version: u8,
	movie_version: u8,
) -> Result<Vec<LineStyle>, SwfError> {
	let count = read_style_count(reader, shape_version)?;
	let mut styles = Vec::with_capacity(count.min(reader.remaining()));
	for _ in 0..count {
		styles.push(LineStyle::read(reader, shape_version, movie_version)?);
	}
	Ok(styles)
}

/// A single drawing operation in twips, absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PathOp {
	/// Start a new sub-path
	MoveTo {
		/// X
		x: Twips,
		/// Y
		y: Twips,
	},
	/// Straight edge
	LineTo {
		/// X
		x: Twips,
		/// Y
		y: Twips,
	},
	/// Quadratic Bézier edge
	CurveTo {
		/// Control point X
		control_x: Twips,
		/// Control point Y
		control_y: Twips,
		/// Anchor X
		x: Twips,
		/// Anchor Y
		y: Twips,
	},
}

/// One painted path: either a fill or a stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Path {
	/// Index into [`Shape::fill_styles`]
	pub fill_style: Option<usize>,
	/// Index into [`Shape::line_styles`]
	pub line_style: Option<usize>,
	/// Drawing operations
	pub ops: Vec<PathOp>,
}

bitflags! {
	/// DefineShape4 flags.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
	pub struct ShapeFlags: u8 {
		/// Use the non-zero winding rule
		const USES_FILL_WINDING_RULE = 0x04;
		/// At least one stroke does not scale
		const USES_NON_SCALING_STROKES = 0x02;
		/// At least one stroke scales
		const USES_SCALING_STROKES = 0x01;
	}
}

/// A decoded shape definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
	/// Shape version, 1-4
	pub version: u8,
	/// Declared bounds including strokes
	pub bounds: Rect,
	/// Bounds of the edges only; declared for version 4, computed otherwise
	pub edge_bounds: Option<Rect>,
	/// Version 4 flags
	pub flags: ShapeFlags,
	/// Flattened fill styles of every style group
	pub fill_styles: Vec<FillStyle>,
	/// Flattened line styles of every style group
	pub line_styles: Vec<LineStyle>,
	/// Paths in paint order
	pub paths: Vec<Path>,
}

impl Shape {
	/// Decodes a DefineShape tag body. Returns the shape ID and the shape.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] for out-of-range fields (for example a
	/// gradient with more than 15 stops) and [`SwfError::Truncated`] if the body is short.
	pub fn decode(cursor: &mut TagCursor<'_>, config: &ParseConfig) -> Result<(u16, Self), SwfError> {
		let version = cursor.current_tag_version();
		let movie_version = cursor.version();
		let id = cursor.read_u16()?;
		let bounds = Rect::read(cursor)?;

		let (declared_edge_bounds, flags) = if version >= 4 {
			let edge_bounds = Rect::read(cursor)?;
			let flags = ShapeFlags::from_bits_truncate(cursor.read_u8()?);
			(Some(edge_bounds), flags)
		} else {
			(None, ShapeFlags::empty())
		};

		let fill_styles = read_fill_styles(cursor, version, movie_version)?;
		let line_styles = read_line_styles(cursor, version, movie_version)?;
		let records_offset = cursor.position();
		let records = read_shape_records(cursor, version, movie_version)?;

		let mut builder = PathBuilder::new(fill_styles, line_styles);
		builder.run(&records, records_offset)?;
		let (fill_styles, line_styles, paths, computed) = builder.finish();

		let edge_bounds = match declared_edge_bounds {
			Some(declared) => Some(declared),
			None if config.compute_edge_bounds => computed,
			None => None,
		};

		Ok((
			id,
			Self {
				version,
				bounds,
				edge_bounds,
				flags,
				fill_styles,
				line_styles,
				paths,
			},
		))
	}

	/// Library IDs of bitmaps used by fill styles.
	pub fn bitmap_ids(&self) -> Vec<u16> {
		let mut ids: Vec<u16> = self
			.fill_styles
			.iter()
			.chain(self.line_styles.iter().filter_map(|line| line.fill.as_ref()))
			.filter_map(FillStyle::bitmap_id)
			.collect();
		ids.sort_unstable();
		ids.dedup();
		ids
	}

	/// Uses the non-zero winding rule (version 4 only).
	pub fn uses_fill_winding_rule(&self) -> bool {
		self.flags.contains(ShapeFlags::USES_FILL_WINDING_RULE)
	}

	/// Has strokes that do not scale.
	pub fn uses_non_scaling_strokes(&self) -> bool {
		self.flags.contains(ShapeFlags::USES_NON_SCALING_STROKES)
	}

	/// Has strokes that scale.
	pub fn uses_scaling_strokes(&self) -> bool {
		self.flags.contains(ShapeFlags::USES_SCALING_STROKES)
	}
}

/// A style change inside a shape record stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct StyleChange {
	pub move_to: Option<(Twips, Twips)>,
	pub fill_style0: Option<u32>,
	pub fill_style1: Option<u32>,
	pub line_style: Option<u32>,
	pub new_styles: Option<(Vec<FillStyle>, Vec<LineStyle>)>,
}

/// A decoded SHAPERECORD.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShapeRecord {
	StyleChange(StyleChange),
	StraightEdge {
		dx: Twips,
		dy: Twips,
	},
	CurvedEdge {
		control_dx: Twips,
		control_dy: Twips,
		anchor_dx: Twips,
		anchor_dy: Twips,
	},
}

/// Reads `num_fill_bits`, `num_line_bits` and the records up to the end record.
///
/// `shape_version` 0 marks a glyph outline, which may not carry new styles.
pub(crate) fn read_shape_records(
	reader: &mut BitReader<'_>,
	shape_version: u8,
	movie_version: u8,
) -> Result<Vec<ShapeRecord>, SwfError> {
	let mut fill_bits = reader.read_ubits(4)?;
	let mut line_bits = reader.read_ubits(4)?;
	let mut records = Vec::new();

	loop {
		let offset = reader.position();
		let is_edge = reader.read_bit()?;
		if is_edge {
			let straight = reader.read_bit()?;
			let nbits = reader.read_ubits(4)? + 2;
			if straight {
				let general = reader.read_bit()?;
				let (dx, dy) = if general {
					(reader.read_sbits(nbits)?, reader.read_sbits(nbits)?)
				} else if reader.read_bit()? {
					(0, reader.read_sbits(nbits)?)
				} else {
					(reader.read_sbits(nbits)?, 0)
				};
				records.push(ShapeRecord::StraightEdge {
					dx,
					dy,
				});
			} else {
				records.push(ShapeRecord::CurvedEdge {
					control_dx: reader.read_sbits(nbits)?,
					control_dy: reader.read_sbits(nbits)?,
					anchor_dx: reader.read_sbits(nbits)?,
					anchor_dy: reader.read_sbits(nbits)?,
				});
			}
			continue;
		}

		let flags = reader.read_ubits(5)?;
		if flags == 0 {
			break;
		}
		let has_new_styles = flags & 0b10000 != 0;
		let has_line = flags & 0b01000 != 0;
		let has_fill1 = flags & 0b00100 != 0;
		let has_fill0 = flags & 0b00010 != 0;
		let has_move = flags & 0b00001 != 0;

		let mut change = StyleChange::default();
		if has_move {
			let nbits = reader.read_ubits(5)?;
			change.move_to = Some((reader.read_sbits(nbits)?, reader.read_sbits(nbits)?));
		}
		if has_fill0 {
			change.fill_style0 = Some(reader.read_ubits(fill_bits)?);
		}
		if has_fill1 {
			change.fill_style1 = Some(reader.read_ubits(fill_bits)?);
		}
		if has_line {
			change.line_style = Some(reader.read_ubits(line_bits)?);
		}
		if has_new_styles {
			if shape_version < 2 {
				return Err(SwfError::malformed_record(offset, "new styles in a version 1 shape"));
			}
			reader.byte_align();
			let fills = read_fill_styles(reader, shape_version, movie_version)?;
			let lines = read_line_styles(reader, shape_version, movie_version)?;
			fill_bits = reader.read_ubits(4)?;
			line_bits = reader.read_ubits(4)?;
			change.new_styles = Some((fills, lines));
		}
		records.push(ShapeRecord::StyleChange(change));
	}

	reader.byte_align();
	Ok(records)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
	from: (Twips, Twips),
	control: Option<(Twips, Twips)>,
	to: (Twips, Twips),
}

impl Edge {
	fn reversed(&self) -> Edge {
		Edge {
			from: self.to,
			control: self.control,
			to: self.from,
		}
	}

	fn op(&self) -> PathOp {
		match self.control {
			Some((control_x, control_y)) => PathOp::CurveTo {
				control_x,
				control_y,
				x: self.to.0,
				y: self.to.1,
			},
			None => PathOp::LineTo {
				x: self.to.0,
				y: self.to.1,
			},
		}
	}
}

/// Chains unordered edges into contours that follow each other end to start.
fn chain_edges(edges: &[Edge]) -> Vec<PathOp> {
	let mut by_start: HashMap<(Twips, Twips), Vec<usize>> = HashMap::new();
	for (index, edge) in edges.iter().enumerate().rev() {
		by_start.entry(edge.from).or_default().push(index);
	}

	// Open chains start at an edge nothing leads into.
	let ends: HashSet<(Twips, Twips)> = edges.iter().map(|edge| edge.to).collect();
	let (open, closed): (Vec<usize>, Vec<usize>) = (0..edges.len()).partition(|&i| !ends.contains(&edges[i].from));

	let mut used = vec![false; edges.len()];
	let mut ops = Vec::with_capacity(edges.len() + 1);
	for start in open.into_iter().chain(closed) {
		if used[start] {
			continue;
		}
		let mut current = start;
		ops.push(PathOp::MoveTo {
			x: edges[start].from.0,
			y: edges[start].from.1,
		});
		loop {
			used[current] = true;
			ops.push(edges[current].op());
			let next = by_start.get_mut(&edges[current].to).and_then(|candidates| {
				while let Some(candidate) = candidates.pop() {
					if !used[candidate] {
						return Some(candidate);
					}
				}
				None
			});
			match next {
				Some(next) => current = next,
				None => break,
			}
		}
	}
	ops
}

#[derive(Debug, Default)]
struct StyleGroup {
	fill_offset: usize,
	line_offset: usize,
	fill_edges: Vec<Vec<Edge>>,
	lines: Vec<Path>,
}

fn offset_point(point: (Twips, Twips), delta: (Twips, Twips), offset: usize) -> Result<(Twips, Twips), SwfError> {
	match (point.0.checked_add(delta.0), point.1.checked_add(delta.1)) {
		(Some(x), Some(y)) => Ok((x, y)),
		_ => Err(SwfError::malformed_record(offset, "shape edge moves the pen out of range")),
	}
}

/// Turns shape records into fill and line paths.
struct PathBuilder {
	fill_styles: Vec<FillStyle>,
	line_styles: Vec<LineStyle>,
	group: StyleGroup,
	paths: Vec<Path>,
	pen: (Twips, Twips),
	fill0: u32,
	fill1: u32,
	line: u32,
	line_path: Option<Path>,
	bounds: Option<Rect>,
}

impl PathBuilder {
	fn new(fill_styles: Vec<FillStyle>, line_styles: Vec<LineStyle>) -> Self {
		let mut group = StyleGroup::default();
		group.fill_edges.resize(fill_styles.len(), Vec::new());
		Self {
			fill_styles,
			line_styles,
			group,
			paths: Vec::new(),
			pen: (0, 0),
			fill0: 0,
			fill1: 0,
			line: 0,
			line_path: None,
			bounds: None,
		}
	}

	/// Replays `records` from the current pen position.
	///
	/// # Errors
	///
	/// Returns [`SwfError::MalformedRecord`] at `offset` if an edge moves the pen
	/// outside the `i32` twip range.
	fn run(&mut self, records: &[ShapeRecord], offset: usize) -> Result<(), SwfError> {
		for record in records {
			match record {
				ShapeRecord::StyleChange(change) => self.style_change(change),
				ShapeRecord::StraightEdge {
					dx,
					dy,
				} => {
					let to = offset_point(self.pen, (*dx, *dy), offset)?;
					self.edge(Edge {
						from: self.pen,
						control: None,
						to,
					});
				}
				ShapeRecord::CurvedEdge {
					control_dx,
					control_dy,
					anchor_dx,
					anchor_dy,
				} => {
					let control = offset_point(self.pen, (*control_dx, *control_dy), offset)?;
					let to = offset_point(control, (*anchor_dx, *anchor_dy), offset)?;
					self.edge(Edge {
						from: self.pen,
						control: Some(control),
						to,
					});
				}
			}
		}
		Ok(())
	}

	fn style_change(&mut self, change: &StyleChange) {
		self.close_line_path();

		if let Some((fills, lines)) = &change.new_styles {
			self.close_group();
			self.group.fill_offset = self.fill_styles.len();
			self.group.line_offset = self.line_styles.len();
			self.group.fill_edges.resize(fills.len(), Vec::new());
			self.fill_styles.extend(fills.iter().cloned());
			self.line_styles.extend(lines.iter().cloned());
			self.fill0 = 0;
			self.fill1 = 0;
			self.line = 0;
		}
		if let Some(pen) = change.move_to {
			self.pen = pen;
		}
		if let Some(fill0) = change.fill_style0 {
			self.fill0 = fill0;
		}
		if let Some(fill1) = change.fill_style1 {
			self.fill1 = fill1;
		}
		if let Some(line) = change.line_style {
			self.line = line;
		}
	}

	fn edge(&mut self, edge: Edge) {
		self.include_edge(&edge);
		if let Some(list) = self.fill_list(self.fill1) {
			list.push(edge);
		}
		if let Some(list) = self.fill_list(self.fill0) {
			list.push(edge.reversed());
		}

		let line_index = self.line as usize;
		if line_index != 0 && line_index <= self.line_styles.len() - self.group.line_offset {
			let global = self.group.line_offset + line_index - 1;
			let path = self.line_path.get_or_insert_with(|| Path {
				fill_style: None,
				line_style: Some(global),
				ops: vec![PathOp::MoveTo {
					x: edge.from.0,
					y: edge.from.1,
				}],
			});
			path.ops.push(edge.op());
		}
		self.pen = edge.to;
	}

	fn fill_list(&mut self, style: u32) -> Option<&mut Vec<Edge>> {
		let index = (style as usize).checked_sub(1)?;
		self.group.fill_edges.get_mut(index)
	}

	fn include_edge(&mut self, edge: &Edge) {
		let bounds = self.bounds.get_or_insert_with(|| Rect::from_point(edge.from.0, edge.from.1));
		bounds.include(edge.from.0, edge.from.1);
		bounds.include(edge.to.0, edge.to.1);
		if let Some(control) = edge.control {
			for (x, y) in quadratic_extrema(edge.from, control, edge.to) {
				bounds.include(x, y);
			}
		}
	}

	fn close_line_path(&mut self) {
		if let Some(path) = self.line_path.take() {
			self.group.lines.push(path);
		}
	}

	fn close_group(&mut self) {
		self.close_line_path();
		let group = std::mem::take(&mut self.group);
		for (index, edges) in group.fill_edges.iter().enumerate() {
			if edges.is_empty() {
				continue;
			}
			self.paths.push(Path {
				fill_style: Some(group.fill_offset + index),
				line_style: None,
				ops: chain_edges(edges),
			});
		}
		self.paths.extend(group.lines);
	}

	fn finish(mut self) -> (Vec<FillStyle>, Vec<LineStyle>, Vec<Path>, Option<Rect>) {
		self.close_group();
		(self.fill_styles, self.line_styles, self.paths, self.bounds)
	}
}

/// Points where a quadratic curve reaches an extreme in x or y.
fn quadratic_extrema(p0: (Twips, Twips), p1: (Twips, Twips), p2: (Twips, Twips)) -> Vec<(Twips, Twips)> {
	let axis_t = |a: Twips, b: Twips, c: Twips| -> Option<f64> {
		let denom = f64::from(a) - 2.0 * f64::from(b) + f64::from(c);
		if denom == 0.0 {
			return None;
		}
		let t = (f64::from(a) - f64::from(b)) / denom;
		(t > 0.0 && t < 1.0).then_some(t)
	};
	let at = |t: f64| -> (Twips, Twips) {
		let mt = 1.0 - t;
		let x = mt * mt * f64::from(p0.0) + 2.0 * mt * t * f64::from(p1.0) + t * t * f64::from(p2.0);
		let y = mt * mt * f64::from(p0.1) + 2.0 * mt * t * f64::from(p1.1) + t * t * f64::from(p2.1);
		(x.round() as Twips, y.round() as Twips)
	};
	[axis_t(p0.0, p1.0, p2.0), axis_t(p0.1, p1.1, p2.1)].into_iter().flatten().map(at).collect()
}

/// Converts glyph records into a single outline, ignoring fill and line selection.
pub(crate) fn glyph_outline(records: &[ShapeRecord]) -> Vec<PathOp> {
	let mut ops = Vec::new();
	let mut pen = (0, 0);
	let mut open = false;
	for record in records {
		match record {
			ShapeRecord::StyleChange(change) => {
				if let Some(to) = change.move_to {
					pen = to;
					ops.push(PathOp::MoveTo {
						x: to.0,
						y: to.1,
					});
					open = true;
				}
			}
			ShapeRecord::StraightEdge {
				dx,
				dy,
			} => {
				if !open {
					ops.push(PathOp::MoveTo {
						x: pen.0,
						y: pen.1,
					});
					open = true;
				}
				pen = (pen.0 + dx, pen.1 + dy);
				ops.push(PathOp::LineTo {
					x: pen.0,
					y: pen.1,
				});
			}
			ShapeRecord::CurvedEdge {
				control_dx,
				control_dy,
				anchor_dx,
				anchor_dy,
			} => {
				if !open {
					ops.push(PathOp::MoveTo {
						x: pen.0,
						y: pen.1,
					});
					open = true;
				}
				let control = (pen.0 + control_dx, pen.1 + control_dy);
				pen = (control.0 + anchor_dx, control.1 + anchor_dy);
				ops.push(PathOp::CurveTo {
					control_x: control.0,
					control_y: control.1,
					x: pen.0,
					y: pen.1,
				});
			}
		}
	}
	ops
}
