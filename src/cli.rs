// Command-line front end for metagz.
//
// Plays the role of the upload layer on local files: applies the upload
// policy, names outputs, and prints the same report objects a web front end
// would return (`--json`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::error;

use crate::container::codec::DEFAULT_LEVEL;
use crate::container::decoder;
use crate::container::encoder::EncodeOptions;
use crate::container::frame::{self, LENGTH_PREFIX_LEN};
use crate::container::metadata::{FORMAT_VERSION, MAX_METADATA_LEN, Metadata};
use crate::io::{self as fileio, FileOptions, IoError};
use crate::policy::{self, UploadPolicy};
use crate::report::{CompressReport, DecompressHeaders, ErrorReport, Operation};

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

fn parse_level(s: &str) -> Result<u32, String> {
    let level: u32 = s.parse().map_err(|e| format!("invalid level '{s}': {e}"))?;
    if level > 9 {
        return Err(format!("level must be 0-9, got {level}"));
    }
    Ok(level)
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Self-describing gzip containers with embedded file metadata.
#[derive(Parser, Debug)]
#[command(
    name = "metagz",
    version,
    about = "Wrap files in gzip containers that remember their filename",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print reports as JSON to stdout.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Wrap one or more files in containers.
    Compress(CompressArgs),
    /// Recover the original file from a container, gzip or deflate stream.
    Decompress(DecompressArgs),
    /// Show how a file would be decoded, without writing anything.
    Inspect(InspectArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Maximum input size (supports K/M/G suffixes).
    #[arg(long = "max-size", value_name = "BYTES", value_parser = parse_byte_size)]
    max_size: Option<u64>,

    /// Accept any file type (keep only the size limit).
    #[arg(long = "any-type")]
    any_type: bool,
}

#[derive(Args, Debug)]
struct CompressArgs {
    /// Gzip compression level (0-9).
    #[arg(short = 'l', long, value_name = "N", value_parser = parse_level)]
    level: Option<u32>,

    /// Declared MIME type (guessed from the extension when omitted).
    #[arg(long, value_name = "TYPE")]
    mime: Option<String>,

    /// Directory for the written containers.
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Files to compress.
    #[arg(value_name = "INPUT", required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct DecompressArgs {
    /// Filename to use when the input has no embedded metadata.
    #[arg(long = "name", value_name = "FILENAME")]
    fallback_name: Option<String>,

    /// Directory for the recovered file.
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Write the recovered payload to stdout instead of a file.
    #[arg(short = 'c', long = "stdout", conflicts_with = "output_dir")]
    stdout: bool,

    #[command(flatten)]
    policy: PolicyArgs,

    /// File to decompress.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Filename to use when the input has no embedded metadata.
    #[arg(long = "name", value_name = "FILENAME")]
    fallback_name: Option<String>,

    /// File to inspect.
    #[arg(value_name = "INPUT", value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Inspect,
    Config,
}

struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    use_stdout: bool,
    level: u32,
    mime: Option<String>,
    fallback_name: Option<String>,
    max_size: u64,
    any_type: bool,
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
}

impl Options {
    fn empty(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            use_stdout: false,
            level: DEFAULT_LEVEL,
            mime: None,
            fallback_name: None,
            max_size: policy::DEFAULT_MAX_SIZE,
            any_type: false,
            inputs: Vec::new(),
            output_dir: PathBuf::from("."),
        }
    }

    fn apply_policy(&mut self, args: &PolicyArgs) {
        if let Some(max) = args.max_size {
            self.max_size = max;
        }
        self.any_type = args.any_type;
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Compress(args) => {
            let mut opts = Options::empty(Command::Compress, &cli);
            opts.apply_policy(&args.policy);
            opts.level = args.level.unwrap_or(DEFAULT_LEVEL);
            opts.mime = args.mime.clone();
            opts.inputs = args.inputs.clone();
            if let Some(dir) = &args.output_dir {
                opts.output_dir = dir.clone();
            }
            opts
        }
        Cmd::Decompress(args) => {
            let mut opts = Options::empty(Command::Decompress, &cli);
            opts.apply_policy(&args.policy);
            opts.fallback_name = args.fallback_name.clone();
            opts.use_stdout = args.stdout;
            opts.inputs = vec![args.input.clone()];
            if let Some(dir) = &args.output_dir {
                opts.output_dir = dir.clone();
            }
            opts
        }
        Cmd::Inspect(args) => {
            let mut opts = Options::empty(Command::Inspect, &cli);
            opts.any_type = true;
            opts.fallback_name = args.fallback_name.clone();
            opts.inputs = vec![args.input.clone()];
            opts
        }
        Cmd::Config => Options::empty(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("metagz".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Build FileOptions from CLI options
// ---------------------------------------------------------------------------

fn build_file_options(opts: &Options) -> FileOptions {
    let policy = if opts.any_type {
        UploadPolicy::any_type(opts.max_size)
    } else {
        UploadPolicy {
            max_size: opts.max_size,
            ..UploadPolicy::default()
        }
    };

    FileOptions {
        encode: EncodeOptions { level: opts.level },
        policy,
        mime: opts.mime.clone(),
        fallback_name: opts.fallback_name.clone(),
        force: opts.force,
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => error!("failed to render JSON report: {e}"),
    }
}

fn report_failure(opts: &Options, op: Operation, input: &Path, err: &IoError) {
    if opts.json_output {
        print_json(&ErrorReport::for_error(op, err));
    }
    eprintln!("metagz: {}: {err}", input.display());
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("metagz version {version} (Rust)");

    let parallel = cfg!(feature = "parallel") as u8;
    eprintln!("PARALLEL={parallel}");
    eprintln!("FORMAT_VERSION={FORMAT_VERSION}");
    eprintln!("LENGTH_PREFIX_LEN={LENGTH_PREFIX_LEN}");
    eprintln!("MAX_METADATA_LEN={MAX_METADATA_LEN}");
    eprintln!("DEFAULT_LEVEL={DEFAULT_LEVEL}");
    eprintln!("DEFAULT_MAX_SIZE={}", policy::DEFAULT_MAX_SIZE);
    eprintln!("ALLOWED_EXTENSIONS={}", policy::DEFAULT_EXTENSIONS.join(","));

    0
}

// ---------------------------------------------------------------------------
// Compress command
// ---------------------------------------------------------------------------

fn compress_one(opts: &Options, file_opts: &FileOptions, input: &Path) -> bool {
    match fileio::compress_file(input, &opts.output_dir, file_opts) {
        Ok(stats) => {
            let report = CompressReport::from(&stats);
            if opts.json_output {
                print_json(&report);
            } else if !opts.quiet {
                eprintln!(
                    "metagz: {} -> {} ({} -> {} bytes, {})",
                    input.display(),
                    stats.output_path.display(),
                    report.original_size,
                    report.compressed_size,
                    report.compression_ratio
                );
            }
            true
        }
        Err(e) => {
            report_failure(opts, Operation::Compress, input, &e);
            false
        }
    }
}

fn cmd_compress(opts: &Options) -> i32 {
    let file_opts = build_file_options(opts);

    #[cfg(feature = "parallel")]
    let ok = {
        use rayon::prelude::*;
        opts.inputs
            .par_iter()
            .map(|input| compress_one(opts, &file_opts, input))
            .collect::<Vec<_>>()
    };
    #[cfg(not(feature = "parallel"))]
    let ok = opts
        .inputs
        .iter()
        .map(|input| compress_one(opts, &file_opts, input))
        .collect::<Vec<_>>();

    if ok.iter().all(|&b| b) { 0 } else { 1 }
}

// ---------------------------------------------------------------------------
// Decompress command
// ---------------------------------------------------------------------------

fn cmd_decompress(opts: &Options) -> i32 {
    let file_opts = build_file_options(opts);
    let Some(input) = opts.inputs.first() else {
        eprintln!("metagz: decompress requires an input file");
        return 1;
    };

    if opts.use_stdout {
        let decoded = match fileio::decode_file(input, &file_opts) {
            Ok(d) => d,
            Err(e) => {
                report_failure(opts, Operation::Decompress, input, &e);
                return 1;
            }
        };
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(&decoded.payload).and_then(|()| stdout.flush()) {
            eprintln!("metagz: write error: {e}");
            return 1;
        }
        if opts.verbose > 0 && !opts.quiet {
            for (name, value) in DecompressHeaders::from_decoded(&decoded).to_pairs() {
                eprintln!("{name}: {value}");
            }
        }
        return 0;
    }

    match fileio::decompress_file(input, &opts.output_dir, &file_opts) {
        Ok(stats) => {
            if opts.json_output {
                let headers = DecompressHeaders::from(&stats);
                print_json(&serde_json::json!({
                    "output": stats.output_path.display().to_string(),
                    "format": stats.format.label(),
                    "headers": headers,
                }));
            } else if !opts.quiet {
                eprintln!(
                    "metagz: {} -> {} ({}, {} -> {} bytes)",
                    input.display(),
                    stats.output_path.display(),
                    stats.format.description(),
                    stats.input_size,
                    stats.output_size
                );
            }
            0
        }
        Err(e) => {
            report_failure(opts, Operation::Decompress, input, &e);
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Inspect command
// ---------------------------------------------------------------------------

/// What `inspect` found in a buffer.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Inspection {
    input: String,
    size: usize,
    /// Set only when the framed stage accepted the buffer.
    metadata_length: Option<u32>,
    /// Why the framed stage passed on the buffer.
    framing_error: Option<String>,
    metadata: Option<Metadata>,
    format: Option<&'static str>,
    format_description: Option<&'static str>,
    filename: Option<String>,
    payload_size: Option<usize>,
    decode_error: Option<String>,
}

impl Inspection {
    fn run(input: &Path, data: &[u8], fallback: &str) -> Self {
        let framed = decoder::try_framed(data);
        let decoded = decoder::decode(data, fallback);

        let (metadata_length, metadata, framing_error) = match framed {
            Ok(d) => (
                frame::FrameHeader::decode(data).ok().map(|h| h.metadata_len),
                d.metadata,
                None,
            ),
            Err(e) => (None, None, Some(e.to_string())),
        };

        Self {
            input: input.display().to_string(),
            size: data.len(),
            metadata_length,
            framing_error,
            metadata,
            format: decoded.as_ref().ok().map(|d| d.format.label()),
            format_description: decoded.as_ref().ok().map(|d| d.format.description()),
            filename: decoded.as_ref().ok().map(|d| d.filename.clone()),
            payload_size: decoded.as_ref().ok().map(|d| d.payload.len()),
            decode_error: decoded.err().map(|e| e.to_string()),
        }
    }

    fn print_text(&self) {
        println!("File:                 {}", self.input);
        println!("Size:                 {}", self.size);
        match (&self.metadata, &self.framing_error) {
            (Some(meta), _) => {
                if let Some(n) = self.metadata_length {
                    println!("Metadata length:      {n}");
                }
                println!("Original filename:    {}", meta.filename);
                println!("Original size:        {}", meta.original_size);
                println!("Timestamp:            {}", meta.timestamp);
                if let Some(mime) = &meta.mimetype {
                    println!("MIME type:            {mime}");
                }
                if let Some(at) = &meta.compressed_at {
                    println!("Compressed at:        {at}");
                }
                println!("Format version:       {}", meta.version);
            }
            (None, Some(e)) => println!("Framing:              none ({e})"),
            (None, None) => println!("Framing:              none"),
        }
        match (self.format_description, &self.decode_error) {
            (Some(desc), _) => {
                println!("Detected format:      {desc}");
                if let Some(name) = &self.filename {
                    println!("Recovered filename:   {name}");
                }
                if let Some(n) = self.payload_size {
                    println!("Payload size:         {n}");
                }
            }
            (None, Some(e)) => println!("Detected format:      {e}"),
            (None, None) => {}
        }
    }
}

fn cmd_inspect(opts: &Options) -> i32 {
    let Some(input) = opts.inputs.first() else {
        eprintln!("metagz: inspect requires an input file");
        return 1;
    };
    let data = match std::fs::read(input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("metagz: {}: {e}", input.display());
            return 1;
        }
    };

    let fallback = opts
        .fallback_name
        .clone()
        .or_else(|| input.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_default();
    let inspection = Inspection::run(input, &data, &fallback);

    if opts.json_output {
        print_json(&inspection);
    } else {
        inspection.print_text();
    }

    if inspection.decode_error.is_none() { 0 } else { 1 }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let opts = resolve_options(cli);

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Inspect => cmd_inspect(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
