use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use cm3d2::json::JsonDocument;
use cm3d2::{AnyDocument, DEFAULT_PEEK_LIMIT, DecodeOptions, FormatKind};

#[derive(Parser)]
#[command(
    name = "cm3d2-convert",
    version,
    about = "Convert CM3D2/COM3D2 asset files to and from editable JSON"
)]
struct Cli {
    /// Log decode/encode details (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DecodeArgs {
    /// Binary format; inferred from the extension, then the signature, when omitted.
    #[arg(long, value_parser = parse_format)]
    format: Option<FormatKind>,
    /// Reject files whose signature does not match the format.
    #[arg(long)]
    strict: bool,
    /// Largest string, in bytes, that may be inspected before it is consumed.
    #[arg(long, default_value_t = DEFAULT_PEEK_LIMIT)]
    peek_limit: usize,
}

impl DecodeArgs {
    fn options(&self) -> DecodeOptions {
        DecodeOptions {
            strict_signature: self.strict,
            peek_limit: self.peek_limit,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Decode a binary asset into JSON.
    ToJson {
        input: PathBuf,
        /// Output path; defaults to the input path with `.json` appended.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Encode JSON produced by `to-json` back into a binary asset.
    FromJson {
        input: PathBuf,
        /// Output path; defaults to the input path without `.json`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that files re-encode to identical bytes, directly and through JSON.
    Verify {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Print the format, header and item counts of a binary asset.
    Info {
        input: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
}

fn parse_format(s: &str) -> Result<FormatKind, String> {
    FormatKind::ALL
        .into_iter()
        .find(|k| k.to_string().eq_ignore_ascii_case(s))
        .or_else(|| FormatKind::from_extension(s))
        .ok_or_else(|| {
            let names: Vec<String> = FormatKind::ALL.iter().map(|k| k.to_string()).collect();
            format!("unknown format '{s}', expected one of {}", names.join(", "))
        })
}

/// `--format`, then the file extension, then the leading signature.
fn resolve_format(path: &Path, bytes: &[u8], explicit: Option<FormatKind>) -> Result<FormatKind> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    if let Some(format) = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(FormatKind::from_extension)
    {
        return Ok(format);
    }
    match FormatKind::detect(bytes) {
        Some(format) => {
            log::debug!("{}: detected {format} from signature", path.display());
            Ok(format)
        }
        None => bail!(
            "{}: cannot tell the format from the extension or signature; pass --format",
            path.display()
        ),
    }
}

fn decode_file(path: &Path, args: &DecodeArgs) -> Result<(Vec<u8>, AnyDocument)> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let format = resolve_format(path, &bytes, args.format)?;
    let doc = AnyDocument::decode_as(format, bytes.as_slice(), &args.options())
        .with_context(|| format!("failed to decode {} as {format}", path.display()))?;
    Ok((bytes, doc))
}

fn first_difference(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .unwrap_or(a.len().min(b.len()))
}

fn check_same(path: &Path, stage: &str, original: &[u8], encoded: &[u8]) -> Result<()> {
    if original != encoded {
        bail!(
            "{}: {stage} output differs at byte {} ({} bytes in, {} bytes out)",
            path.display(),
            first_difference(original, encoded),
            original.len(),
            encoded.len()
        );
    }
    Ok(())
}

fn to_json(
    input: &Path,
    output: Option<PathBuf>,
    compact: bool,
    args: &DecodeArgs,
) -> Result<()> {
    let (_, doc) = decode_file(input, args)?;
    let text = if compact {
        doc.to_json_string()?
    } else {
        doc.to_json_string_pretty()?
    };
    let output = output.unwrap_or_else(|| {
        let mut name = input.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    });
    fs::write(&output, text).with_context(|| format!("failed to write {}", output.display()))?;
    log::info!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn from_json(input: &Path, output: Option<PathBuf>) -> Result<()> {
    let text =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let doc = AnyDocument::from_json_str(&text)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    let output = match output {
        Some(path) => path,
        None if input.extension().is_some_and(|e| e == "json") => input.with_extension(""),
        None => input.with_extension(doc.format().extension()),
    };
    let bytes = doc
        .to_bytes()
        .with_context(|| format!("failed to encode {}", input.display()))?;
    fs::write(&output, bytes).with_context(|| format!("failed to write {}", output.display()))?;
    log::info!("{} -> {}", input.display(), output.display());
    Ok(())
}

fn verify(inputs: &[PathBuf], args: &DecodeArgs) -> Result<()> {
    let mut failures = 0;
    for input in inputs {
        let result = decode_file(input, args).and_then(|(bytes, doc)| {
            check_same(input, "binary", &bytes, &doc.to_bytes()?)?;
            let reparsed = AnyDocument::from_json_str(&doc.to_json_string()?)?;
            check_same(input, "json", &bytes, &reparsed.to_bytes()?)
        });
        match result {
            Ok(()) => println!("ok      {}", input.display()),
            Err(e) => {
                failures += 1;
                println!("FAILED  {}: {e:#}", input.display());
            }
        }
    }
    if failures > 0 {
        bail!("{failures} of {} files did not round-trip", inputs.len());
    }
    Ok(())
}

fn info(input: &Path, args: &DecodeArgs) -> Result<()> {
    let (bytes, doc) = decode_file(input, args)?;
    println!("file:      {}", input.display());
    println!("format:    {}", doc.format());
    println!("size:      {} bytes", bytes.len());
    match &doc {
        AnyDocument::Material(m) => {
            println!("header:    {} v{}", m.signature, m.version);
            println!("material:  {} ({})", m.material.name, m.material.shader_name);
            println!("properties: {}", m.material.properties.len());
        }
        AnyDocument::PMat(p) => {
            println!("header:    {} v{}", p.signature, p.version);
            println!("material:  {} (queue {})", p.material_name, p.render_queue);
            println!("hash ok:   {}", p.hash_matches());
        }
        AnyDocument::Collider(c) => {
            println!("header:    {} v{}", c.signature, c.version);
            println!("colliders: {}", c.colliders.len());
        }
        AnyDocument::Physics(p) => {
            println!("header:    {} v{}", p.signature, p.version);
            println!("root:      {}", p.root_name);
            println!("colliders: {} (file {})", p.colliders_count, p.collider_file_name);
        }
        AnyDocument::Mesh(m) => {
            println!("header:    {} v{}", m.signature, m.version);
            println!("mesh:      {} (root {})", m.name, m.root_bone_name);
            println!("bones:     {}", m.bones.len());
            println!("vertices:  {}", m.vertices.len());
            println!("submeshes: {}", m.submeshes.len());
            println!("materials: {}", m.materials.len());
            println!("morphs:    {}", m.morphs.len());
            println!("thickness: {}", m.skin_thickness.is_some());
        }
        AnyDocument::Preset(p) => {
            println!("header:    {} v{}", p.signature, p.version);
            println!("type:      {}", p.preset_type.0);
            println!("thumbnail: {} bytes", p.thumbnail.len());
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::ToJson {
            input,
            output,
            compact,
            decode,
        } => to_json(&input, output, compact, &decode),
        Command::FromJson { input, output } => from_json(&input, output),
        Command::Verify { inputs, decode } => verify(&inputs, &decode),
        Command::Info { input, decode } => info(&input, &decode),
    }
}
