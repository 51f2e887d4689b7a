mod crop;
mod export;
mod inspect;
mod pack;
mod ranges;
mod source;
mod ttfgen;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::{fs, path::Path, path::PathBuf};

use crate::inspect::Layout;
use crate::ranges::Limits;
use crate::source::{Atlas, Metadata, SourceFont};

// ---------------------------------------------
// bitfont: bitmap font builder CLI
// Subcommands:
//   build    --atlas <png> --json <file>               -> encode atlas + JSON
//            --ttf <font> --size <px> [--range A:B]*   -> rasterize TTF and encode
//   bundle   <blob>... -o <case>                       -> pack blobs into a "case" container
//   inspect  <file> [--text ...]                       -> dump header/ranges, preview text
// ---------------------------------------------
#[derive(Parser, Debug)]
#[command(name = "bitfont", author, version, about = "bitfont: build and inspect bit-packed bitmap fonts", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Encode a font from a TTF or from atlas+JSON.
  Build(BuildArgs),
  /// Pack encoded font blobs into one container.
  Bundle(BundleArgs),
  /// Print a font's header and ranges, optionally rendering sample text.
  Inspect(InspectArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
  /// Loadable "ftbw" blob.
  Blob,
  /// Rust module defining `pub static FONT`.
  Rust,
}

#[derive(Args, Debug)]
struct BuildArgs {
  /// Path to a TrueType/OpenType font (alternative to --atlas/--json)
  #[arg(long = "ttf")]
  ttf: Option<PathBuf>,

  /// Pixel size to render the TTF at (required with --ttf)
  #[arg(long = "size")]
  size: Option<f32>,

  /// Character range(s) for TTF mode, inclusive, format START:END (single scalars). Repeatable.
  /// Examples:
  ///   --range " :~"     (printable ASCII incl. space)
  ///   --range "0:9" --range "A:Z" --range "a:z"
  #[arg(long = "range", action = ArgAction::Append)]
  ranges: Vec<String>,

  /// Input atlas image path (PNG/JPG/etc.) [alternative to --ttf]
  #[arg(short = 'a', long = "atlas")]
  atlas: Option<PathBuf>,

  /// Font config JSON path (glyph positions/advances, metrics) [alternative to --ttf]
  #[arg(short = 'j', long = "json")]
  json: Option<PathBuf>,

  /// Output encoding
  #[arg(long = "format", value_enum, default_value_t = OutputFormat::Blob)]
  format: OutputFormat,

  /// Short font name (defaults to the output file stem)
  #[arg(long = "name")]
  name: Option<String>,

  /// Largest glyph-data estimate per character range, in bytes
  #[arg(long = "max-range-bytes", default_value_t = Limits::default().max_bytes)]
  max_range_bytes: usize,

  /// Codepoint gap that starts a new character range
  #[arg(long = "max-gap", default_value_t = Limits::default().max_gap)]
  max_gap: usize,

  /// If set, also write preview artifacts next to --output:
  /// <output>.atlas.png and <output>.meta.json (TTF mode only)
  #[arg(long = "preview", default_value_t = false)]
  preview: bool,

  /// Output file (.ftbw or .rs)
  #[arg(short, long)]
  output: PathBuf,
}

#[derive(Args, Debug)]
struct BundleArgs {
  /// Encoded font blobs, stored under their short names and heights
  #[arg(required = true)]
  inputs: Vec<PathBuf>,

  /// Output container
  #[arg(short, long)]
  output: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlignArg {
  Left,
  Center,
  Right,
  Justify,
}

#[derive(Args, Debug)]
struct InspectArgs {
  /// Font blob or container
  input: PathBuf,

  /// Sample text to lay out and print
  #[arg(long = "text")]
  text: Option<String>,

  /// Wrap width in pixels
  #[arg(long = "width", default_value_t = 64)]
  width: i16,

  #[arg(long = "align", value_enum, default_value_t = AlignArg::Left)]
  align: AlignArg,
}

/// One scalar value on either side of a `--range`.
fn range_end(part: &str, which: &str, arg: &str) -> Result<char> {
  let mut chars = part.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) => Ok(c),
    (None, _) => bail!("empty {which} in --range {arg:?}"),
    (Some(_), Some(_)) => bail!("{which} of --range {arg:?} must be a single character"),
  }
}

/// `START:END` pairs, inclusive; printable ASCII when none are given.
fn parse_ranges(ranges: &[String]) -> Result<Vec<(char, char)>> {
  if ranges.is_empty() {
    return Ok(vec![(' ', '~')]);
  }
  ranges
    .iter()
    .map(|arg| -> Result<(char, char)> {
      // ':' itself is a valid start, so split at the last colon.
      let (start, end) = arg.rsplit_once(':').ok_or_else(|| anyhow!("--range {arg:?} is not START:END"))?;
      let (start, end) = (range_end(start, "start", arg)?, range_end(end, "end", arg)?);
      if end < start {
        bail!("--range {arg:?} ends before it starts");
      }
      Ok((start, end))
    })
    .collect()
}

fn file_stem(path: &Path) -> Result<String> {
  path
    .file_stem()
    .and_then(|s| s.to_str())
    .map(|s| s.split('.').next().unwrap_or(s).to_string())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| anyhow!("cannot derive a font name from {:?}; pass --name", path))
}

fn load_source(args: &BuildArgs) -> Result<(Metadata, Atlas)> {
  let using_ttf = args.ttf.is_some();
  let using_atlas = args.atlas.is_some() || args.json.is_some();
  if using_ttf && using_atlas {
    bail!("Specify either --ttf/--size/--range... or --atlas/--json, not both");
  }

  if using_ttf {
    let ttf_path = args.ttf.as_ref().ok_or_else(|| anyhow!("--ttf is required"))?;
    let size = args.size.ok_or_else(|| anyhow!("--size is required with --ttf"))?;
    let ranges = parse_ranges(&args.ranges)?;
    let ttf_bytes = fs::read(ttf_path).with_context(|| format!("read ttf {:?}", ttf_path))?;
    let (meta, atlas) = ttfgen::import_ttf(&ttf_bytes, size, &ranges).context("rasterize TTF")?;

    if args.preview {
      // Foo.ftbw -> Foo.atlas.png / Foo.meta.json
      let json_text = serde_json::to_string_pretty(&meta)?;
      let png = source::encode_l8_png(&atlas.pixels, atlas.width, atlas.height)?;
      let base = args.output.with_extension("");
      let atlas_path = base.with_extension("atlas.png");
      let meta_path = base.with_extension("meta.json");
      fs::write(&atlas_path, &png).with_context(|| format!("write {:?}", atlas_path))?;
      fs::write(&meta_path, &json_text).with_context(|| format!("write {:?}", meta_path))?;
      info!("wrote preview {} and {}", atlas_path.display(), meta_path.display());
    }
    return Ok((meta, atlas));
  }

  let atlas_path = args.atlas.as_ref().ok_or_else(|| anyhow!("--atlas is required unless using --ttf"))?;
  let json_path = args.json.as_ref().ok_or_else(|| anyhow!("--json is required unless using --ttf"))?;
  let png_bytes = fs::read(atlas_path).with_context(|| format!("read atlas {:?}", atlas_path))?;
  let json_text = fs::read_to_string(json_path).with_context(|| format!("read json {:?}", json_path))?;
  let meta: Metadata = serde_json::from_str(&json_text).with_context(|| format!("parse json {:?}", json_path))?;
  let (w, h, l8) = source::decode_png_to_l8(&png_bytes)?;
  Ok((meta, Atlas::new(w, h, l8)?))
}

fn build(args: BuildArgs) -> Result<()> {
  let (meta, atlas) = load_source(&args)?;
  let font = SourceFont::from_atlas(&meta, &atlas)?;
  let short_name = match &args.name {
    Some(name) => name.clone(),
    None => file_stem(&args.output)?,
  };
  let limits = Limits { max_bytes: args.max_range_bytes, max_gap: args.max_gap };
  let encoded = export::encode_font(&font, &short_name, limits)?;

  let out = match args.format {
    OutputFormat::Blob => export::write_blob(&encoded)?,
    OutputFormat::Rust => export::write_rust_source(&encoded)?.into_bytes(),
  };
  fs::write(&args.output, &out).with_context(|| format!("write {:?}", args.output))?;
  info!(
    "{}: {} glyphs in {} ranges, {} kerning pairs, wrote {} bytes to {}",
    encoded.full_name,
    font.glyphs.len(),
    encoded.ranges.len(),
    encoded.kerning.len(),
    out.len(),
    args.output.display()
  );
  Ok(())
}

fn bundle(args: BundleArgs) -> Result<()> {
  let mut faces = Vec::with_capacity(args.inputs.len());
  for path in &args.inputs {
    let blob = fs::read(path).with_context(|| format!("read font {:?}", path))?;
    let font = bitfont::load(&blob).map_err(|e| anyhow!("{:?}: {e}", path))?;
    let (name, size) = (font.info.short_name.to_string(), font.info.height);
    info!("adding {} ({}px, {} bytes)", name, size, blob.len());
    faces.push((name, size, blob));
  }
  let case = export::write_case(&faces)?;
  fs::write(&args.output, &case).with_context(|| format!("write {:?}", args.output))?;
  info!("wrote {} faces, {} bytes to {}", faces.len(), case.len(), args.output.display());
  Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
  let bytes = fs::read(&args.input).with_context(|| format!("read {:?}", args.input))?;
  let fonts = if bytes.starts_with(bitfont::TYPECASE_MAGIC) {
    let case = bitfont::TypeCase::parse(&bytes).map_err(|e| anyhow!("{:?}: {e}", args.input))?;
    print!("{}", inspect::describe_case(&case));
    case
      .faces()
      .iter()
      .map(|face| case.load_face(face).map_err(|e| anyhow!("face {:?}: {e}", face.name)))
      .collect::<Result<Vec<_>>>()?
  } else {
    vec![bitfont::load(&bytes).map_err(|e| anyhow!("{:?}: {e}", args.input))?]
  };

  let layout = match args.align {
    AlignArg::Left => Layout::Aligned(bitfont::Align::Left),
    AlignArg::Center => Layout::Aligned(bitfont::Align::Center),
    AlignArg::Right => Layout::Aligned(bitfont::Align::Right),
    AlignArg::Justify => Layout::Justified,
  };
  for font in &fonts {
    print!("{}", inspect::describe(font));
    if let Some(text) = &args.text {
      for row in inspect::render_text(font, text, args.width, layout) {
        println!("{row}");
      }
    }
  }
  Ok(())
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  match Cli::parse().command {
    Command::Build(args) => build(args),
    Command::Bundle(args) => bundle(args),
    Command::Inspect(args) => inspect(args),
  }
}
