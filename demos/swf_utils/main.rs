//! SWF inspection utility.
//!
//! Provides four subcommands:
//! - `info`: decode one movie and print its header, library and timeline summary.
//! - `tags`: list the top-level tag stream with a hex preview of each body.
//! - `validate`: decode every `.swf` file under a directory and report diagnostics.
//! - `play`: drive a headless playhead and print the display list of every frame.

use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use anyhow::{Context, Result, bail};
use bytes_view::BodyPreview;
use clap::{Args, Parser, Subcommand};
use swiff_rs::{
	prelude::*,
	swiff_types::swf::{TagCursor, decompress},
};
use walkdir::WalkDir;

fn main() -> Result<()> {
	// Initialize logger with default level set to info if RUST_LOG is not set
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

	let cli = Cli::parse();
	match cli.command {
		Command::Info(opts) => run_info(opts),
		Command::Tags(opts) => run_tags(opts),
		Command::Validate(opts) => run_validate(opts),
		Command::Play(opts) => run_play(opts),
	}
}

#[derive(Parser)]
#[command(name = "swf_utils")]
#[command(author = "swiff-rs project")]
#[command(version)]
#[command(about = "Decode, validate and play SWF movies", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Print a summary of one movie
	Info(InfoArgs),
	/// List the top-level tags of one movie
	Tags(TagsArgs),
	/// Decode every .swf file under a directory
	Validate(ValidateArgs),
	/// Step through a movie or sprite timeline without rendering
	Play(PlayArgs),
}

#[derive(Args)]
struct DecodeArgs {
	/// WHATWG label of the encoding used by pre-version-6 strings
	#[arg(long, value_name = "LABEL", env = "SWIFF_LEGACY_ENCODING", default_value = "windows-1252")]
	legacy_encoding: String,

	/// Do not compare declared and actual frame counts
	#[arg(long, default_value_t = false, conflicts_with = "strict")]
	lenient: bool,

	/// Fail on the first recoverable problem instead of reporting it
	#[arg(long, default_value_t = false)]
	strict: bool,
}

#[derive(Args)]
struct InfoArgs {
	/// Path to a .swf file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Print the summary as JSON
	#[arg(long, default_value_t = false)]
	json: bool,

	#[command(flatten)]
	decode: DecodeArgs,
}

#[derive(Args)]
struct TagsArgs {
	/// Path to a .swf file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Number of body bytes to dump in hex per tag
	#[arg(long = "hex", value_name = "BYTES", default_value_t = 16)]
	hex: usize,
}

#[derive(Args)]
struct ValidateArgs {
	/// Directory containing .swf files
	#[arg(value_name = "DIR", default_value = ".")]
	root: PathBuf,

	/// Recurse into sub-directories while scanning
	#[arg(short, long, default_value_t = false)]
	recursive: bool,

	/// Print diagnostics of every file, not only the count
	#[arg(short, long, default_value_t = false)]
	verbose: bool,

	/// Exit with an error when any file has diagnostics
	#[arg(long, default_value_t = false)]
	fail_on_warning: bool,

	#[command(flatten)]
	decode: DecodeArgs,
}

#[derive(Args)]
struct PlayArgs {
	/// Path to a .swf file
	#[arg(value_name = "FILE")]
	file: PathBuf,

	/// Play a sprite's timeline instead of the movie's
	#[arg(short, long, value_name = "ID")]
	sprite: Option<u16>,

	/// Start at this frame label
	#[arg(short, long, value_name = "LABEL", conflicts_with = "scene")]
	label: Option<String>,

	/// Start at the first frame of this scene
	#[arg(long, value_name = "NAME")]
	scene: Option<String>,

	/// Number of ticks to deliver
	#[arg(short, long, value_name = "COUNT", default_value_t = 10)]
	ticks: usize,

	/// Loop the current scene instead of the whole timeline
	#[arg(long, default_value_t = false)]
	loop_scene: bool,

	#[command(flatten)]
	decode: DecodeArgs,
}

fn build_config(args: &DecodeArgs) -> Result<ParseConfig> {
	let Some(mut config) = ParseConfig::with_legacy_encoding_label(&args.legacy_encoding) else {
		bail!("Unknown encoding label {}", args.legacy_encoding);
	};
	config.verify_frame_counts = !args.lenient;
	config.reject_diagnostics = args.strict;
	Ok(config)
}

fn load_movie(path: &Path, config: &ParseConfig) -> Result<Movie> {
	let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
	Movie::from_bytes_with_config(&data, config).with_context(|| format!("Failed to decode {}", path.display()))
}

fn run_info(args: InfoArgs) -> Result<()> {
	let config = build_config(&args.decode)?;
	let movie = load_movie(&args.file, &config)?;
	let summary = movie.summary();

	if args.json {
		println!("{}", serde_json::to_string_pretty(&summary)?);
		return Ok(());
	}

	println!("File: {}", args.file.display());
	println!("{}", movie.header());
	println!("Frames: {} at {:.2} fps", summary.frame_count, movie.frame_rate());
	if let Some(color) = summary.background_color {
		println!("Background: {color}");
	}
	println!("Attributes: {:?}", summary.file_attributes);

	println!("Definitions:");
	for (kind, count) in &summary.definitions {
		println!("  {kind:<12} {count}");
	}

	println!("Scenes:");
	for scene in movie.scenes() {
		println!("  {:<16} frames {}..{}", scene.name, scene.start, scene.start + scene.len);
		for (label, index) in scene.labels() {
			println!("    label {label:<12} -> {index}");
		}
	}

	if !movie.exports().is_empty() {
		println!("Exports:");
		for (name, id) in movie.exports() {
			println!("  {name} -> {id}");
		}
	}

	print_diagnostics(movie.diagnostics(), "");
	Ok(())
}

fn run_tags(args: TagsArgs) -> Result<()> {
	let raw = fs::read(&args.file).with_context(|| format!("Failed to read {}", args.file.display()))?;
	let buffer = decompress(&raw)?;
	let config = ParseConfig::default();
	let mut cursor = TagCursor::new(&buffer, &config);
	let header = cursor.read_header()?;
	println!("{header}");

	let mut count = 0usize;
	while cursor.advance_to_next_tag()? {
		let Some(tag) = cursor.current_tag() else {
			continue;
		};
		let base = match tag.code {
			Some(code) => format!("{code}/v{}", tag.version),
			None => "-".to_string(),
		};
		let preview = BodyPreview::new(&cursor.data()[tag.body.clone()], args.hex);
		println!("{count:>6} {tag} [{base}] {preview}");
		count += 1;
	}
	println!("{count} tags");
	Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
	if !args.root.is_dir() {
		bail!("{} is not a directory", args.root.display());
	}

	let config = build_config(&args.decode)?;
	let files = collect_swf_files(&args.root, args.recursive);
	if files.is_empty() {
		println!("No .swf files found under {}", args.root.display());
		return Ok(());
	}

	let mut clean = 0usize;
	let mut warned = 0usize;
	let mut failed = 0usize;

	for path in &files {
		match load_movie(path, &config) {
			Ok(movie) if movie.diagnostics().is_empty() => {
				clean += 1;
				println!("✅ {} ({} frames)", path.display(), movie.frame_count());
			}
			Ok(movie) => {
				warned += 1;
				println!("⚠️ {} ({} diagnostics)", path.display(), movie.diagnostics().len());
				if args.verbose {
					print_diagnostics(movie.diagnostics(), "    ");
				}
			}
			Err(err) => {
				failed += 1;
				println!("❌ {} - {err:#}", path.display());
			}
		}
	}

	println!("\nScanned {} files: {clean} clean, {warned} with diagnostics, {failed} failed", files.len());

	if failed > 0 {
		bail!("Validation finished with errors (see summary)");
	}
	if args.fail_on_warning && warned > 0 {
		bail!("Validation finished with warnings (see summary)");
	}
	Ok(())
}

fn run_play(args: PlayArgs) -> Result<()> {
	let config = build_config(&args.decode)?;
	let movie = Arc::new(load_movie(&args.file, &config)?);

	let mut playhead = match args.sprite {
		Some(id) => Playhead::for_sprite(Arc::clone(&movie), id)?,
		None => Playhead::new(Arc::clone(&movie)),
	};
	playhead.loops_scene = args.loop_scene;
	playhead.set_delegate(Box::new(RenderDelegate::new(PrintRenderer)));

	match (&args.label, &args.scene) {
		(Some(label), _) => playhead.goto_label(label, true)?,
		(None, Some(scene)) => playhead.goto_scene_frame(scene, 0, true)?,
		(None, None) => playhead.play(),
	}
	print_frame(&movie, playhead.current_frame(), &playhead.placed_objects());

	let mut host = HeadlessHost::default();
	let changed = host.drive(&mut playhead, args.ticks);
	println!(
		"{} ticks, {changed} frame changes, stopped at frame {} ({:?})",
		host.ticks,
		playhead.current_index(),
		playhead.state()
	);
	Ok(())
}

struct PrintRenderer;

impl Renderer for PrintRenderer {
	fn render(&mut self, movie: &Movie, placed: &[&PlacedObject], context: &RenderContext) {
		println!("frame {}{}", context.frame_index, if context.interpolate { " (tween)" } else { "" });
		print_placed(movie, placed);
	}
}

fn print_frame(movie: &Movie, frame: &Frame, placed: &[&PlacedObject]) {
	println!("frame {}", frame.index());
	print_placed(movie, placed);
}

fn print_placed(movie: &Movie, placed: &[&PlacedObject]) {
	for object in placed {
		let kind = movie.definition(object.library_id).map_or("?", Definition::kind_name);
		let matrix = object.matrix();
		println!(
			"  depth {:>4}: {kind:<11} #{:<5} at ({}, {}){}",
			object.depth,
			object.library_id,
			matrix.translate_x,
			matrix.translate_y,
			object.name.as_deref().map(|name| format!(" \"{name}\"")).unwrap_or_default()
		);
	}
}

fn print_diagnostics(diagnostics: &[Diagnostic], indent: &str) {
	if diagnostics.is_empty() {
		return;
	}
	println!("{indent}Diagnostics:");
	for diagnostic in diagnostics {
		println!("{indent}  {diagnostic}");
	}
}

fn collect_swf_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
	let max_depth = if recursive {
		usize::MAX
	} else {
		1
	};
	let mut files: Vec<PathBuf> = WalkDir::new(root)
		.max_depth(max_depth)
		.into_iter()
		.filter_map(std::result::Result::ok)
		.filter(|entry| entry.file_type().is_file())
		.map(walkdir::DirEntry::into_path)
		.filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("swf")))
		.collect();
	files.sort();
	files
}

mod bytes_view {
	use std::fmt::Display;

	/// Hex dump of the first bytes of a tag body.
	pub struct BodyPreview<'a> {
		bytes: &'a [u8],
		truncated: bool,
	}

	impl<'a> BodyPreview<'a> {
		pub fn new(body: &'a [u8], limit: usize) -> Self {
			Self {
				bytes: &body[..body.len().min(limit)],
				truncated: body.len() > limit,
			}
		}
	}

	impl Display for BodyPreview<'_> {
		fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
			if self.bytes.is_empty() {
				return Ok(());
			}
			write!(f, "{}", hex::encode(self.bytes))?;
			if self.truncated {
				write!(f, "…")?;
			}
			Ok(())
		}
	}
}
