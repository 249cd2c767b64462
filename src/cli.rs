// Command-line front end for vcdelta.
//
// Subcommands map onto the library: `decode` is the stateless codec path,
// `apply` seeds a DeltaCodec and walks a chain of deltas, `check` runs the
// validator and the print commands walk the VCDIFF structure.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use bitflags::Flags;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde_json::json;

use crate::codec::{self, CodecError, DeltaCodec};
use crate::validator;
use crate::vcdiff::decoder::{DEFAULT_MAX_OUTPUT_LEN, DecodeOptions, InstructionIterator, StreamDecoder};
use crate::vcdiff::header::{self, HARD_MAX_WINSIZE};
use crate::vcdiff::Instruction;

const BUF_SIZE: usize = 64 * 1024;

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
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Stateful VCDIFF (RFC 3284) delta decoder.
#[derive(Parser, Debug)]
#[command(
    name = "vcdelta",
    version,
    about = "Stateful VCDIFF delta decoder",
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

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode one delta against an explicit base.
    Decode(DecodeArgs),
    /// Apply a chain of deltas, checking base ids at every step.
    Apply(ApplyArgs),
    /// Report whether files look like VCDIFF deltas.
    Check(CheckArgs),
    /// Print build/configuration details.
    Config,
    /// Print the file header and the first window header.
    Header(PrintArgs),
    /// Print all window headers.
    Headers(PrintArgs),
    /// Print window headers and decoded instructions.
    Delta(PrintArgs),
}

#[derive(Args, Debug)]
struct DecodeTuningArgs {
    /// Disable Adler-32 verification.
    #[arg(long = "no-checksum")]
    no_checksum: bool,

    /// Refuse to reconstruct more than this many bytes (supports K/M/G suffix).
    #[arg(long = "max-output", value_parser = parse_byte_size, default_value_t = DEFAULT_MAX_OUTPUT_LEN as u64)]
    max_output: u64,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Base payload the delta was made against.
    #[arg(long, short = 'b', visible_alias = "source", value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Input delta file (default: stdin).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    /// Decode window by window from the delta file straight to the output file.
    #[arg(long)]
    stream: bool,

    #[command(flatten)]
    tuning: DecodeTuningArgs,

    /// Input delta file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Initial base payload.
    #[arg(long, short = 'b', value_hint = ValueHint::FilePath)]
    base: PathBuf,

    /// Identifier of the initial base.
    #[arg(long = "base-id")]
    base_id: String,

    /// One chain step (repeat in production order).
    #[arg(
        long = "step",
        num_args = 3,
        value_names = ["DELTA_ID", "BASE_ID", "DELTA_FILE"],
        action = ArgAction::Append,
        required = true
    )]
    steps: Vec<String>,

    /// Output file for the final payload (default: stdout).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Check/compute only (do not write output).
    #[arg(long = "check-only")]
    no_output: bool,

    #[command(flatten)]
    tuning: DecodeTuningArgs,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Files to check.
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct PrintArgs {
    /// VCDIFF input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Decode,
    Apply,
    Check,
    Config,
    PrintHdr,
    PrintHdrs,
    PrintDelta,
}

/// One `--step DELTA_ID BASE_ID DELTA_FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    delta_id: String,
    base_id: String,
    delta_file: PathBuf,
}

#[derive(Debug)]
struct Options {
    command: Command,
    use_stdout: bool,
    force: bool,
    quiet: bool,
    verbose: u8,
    no_checksum: bool,
    no_output: bool,
    stream: bool,
    max_output_len: usize,
    base_file: Option<PathBuf>,
    base_id: Option<String>,
    steps: Vec<Step>,
    input_files: Vec<PathBuf>,
    output_file: Option<PathBuf>,
    json_output: bool,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            use_stdout: false,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            no_checksum: false,
            no_output: false,
            stream: false,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
            base_file: None,
            base_id: None,
            steps: Vec::new(),
            input_files: Vec::new(),
            output_file: None,
            json_output: cli.json_output,
        }
    }

    fn apply_tuning(&mut self, tuning: &DecodeTuningArgs) {
        self.no_checksum = tuning.no_checksum;
        self.max_output_len = usize::try_from(tuning.max_output).unwrap_or(usize::MAX);
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::default()
            .with_checksum(!self.no_checksum)
            .with_max_output_len(self.max_output_len)
    }

    fn input_file(&self) -> Option<&Path> {
        self.input_files.first().map(PathBuf::as_path)
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Decode(args) => {
            let mut opts = Options::new(Command::Decode, &cli);
            opts.apply_tuning(&args.tuning);
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.stream = args.stream;
            opts.base_file = Some(args.base.clone());
            opts.input_files = args.input.clone().or(args.input_pos.clone()).into_iter().collect();
            opts.output_file = args.output.clone().or(args.output_pos.clone());
            opts
        }
        Cmd::Apply(args) => {
            let mut opts = Options::new(Command::Apply, &cli);
            opts.apply_tuning(&args.tuning);
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.base_file = Some(args.base.clone());
            opts.base_id = Some(args.base_id.clone());
            opts.steps = args
                .steps
                .chunks_exact(3)
                .map(|s| Step {
                    delta_id: s[0].clone(),
                    base_id: s[1].clone(),
                    delta_file: PathBuf::from(&s[2]),
                })
                .collect();
            opts.output_file = args.output.clone();
            opts
        }
        Cmd::Check(args) => {
            let mut opts = Options::new(Command::Check, &cli);
            opts.input_files = args.files.clone();
            opts
        }
        Cmd::Config => Options::new(Command::Config, &cli),
        Cmd::Header(args) | Cmd::Headers(args) | Cmd::Delta(args) => {
            let command = match cli.command {
                Cmd::Header(_) => Command::PrintHdr,
                Cmd::Headers(_) => Command::PrintHdrs,
                _ => Command::PrintDelta,
            };
            let mut opts = Options::new(command, &cli);
            opts.input_files = vec![args.input.clone()];
            opts
        }
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("vcdelta".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn read_input(path: Option<&Path>) -> io::Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, String> {
    if opts.no_output {
        return Ok(Box::new(io::sink()));
    }
    match opts.output_file.as_deref() {
        Some(path) if !opts.use_stdout => {
            if path.exists() && !opts.force {
                return Err(format!(
                    "output file exists, use -f to overwrite: {}",
                    path.display()
                ));
            }
            let file =
                File::create(path).map_err(|e| format!("output file: {}: {e}", path.display()))?;
            Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, file)))
        }
        _ => Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        ))),
    }
}

fn write_payload(opts: &Options, payload: &[u8]) -> Result<(), String> {
    let mut out = open_output(opts)?;
    out.write_all(payload)
        .and_then(|()| out.flush())
        .map_err(|e| format!("write error: {e}"))
}

fn emit_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => eprintln!("{s}"),
        Err(e) => eprintln!("vcdelta: json: {e}"),
    }
}

fn digest_hex(data: &[u8]) -> Option<String> {
    #[cfg(feature = "file-io")]
    {
        Some(crate::io::to_hex(&crate::io::sha256(data)))
    }
    #[cfg(not(feature = "file-io"))]
    {
        let _ = data;
        None
    }
}

fn report_codec_error(opts: &Options, context: &str, step: Option<usize>, e: &CodecError) {
    eprintln!("vcdelta: {context}: {}: {e}", e.kind());
    if opts.json_output {
        emit_json(&json!({
            "command": context,
            "error": e.kind().as_str(),
            "message": e.to_string(),
            "step": step,
            "resync": e.is_identifier_error(),
        }));
    }
}

fn flag_names<F: Flags>(flags: F) -> String {
    let names: Vec<String> = flags
        .iter_names()
        .map(|(name, _)| format!("VCD_{name}"))
        .collect();
    if names.is_empty() {
        "none".into()
    } else {
        names.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("vcdelta version {version}");

    let lzma = cfg!(feature = "lzma-secondary") as u8;
    let zlib = cfg!(feature = "zlib-secondary") as u8;
    let adler32 = cfg!(feature = "adler32") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("SECONDARY_LZMA={lzma}");
    eprintln!("SECONDARY_ZLIB={zlib}");
    eprintln!("ADLER32={adler32}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("HARD_MAX_WINSIZE={HARD_MAX_WINSIZE}");
    eprintln!("DEFAULT_MAX_OUTPUT={DEFAULT_MAX_OUTPUT_LEN}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

fn cmd_decode(opts: &Options) -> i32 {
    if opts.stream {
        return cmd_decode_stream(opts);
    }

    let Some(base_path) = opts.base_file.as_deref() else {
        eprintln!("vcdelta: decode requires --base");
        return 1;
    };
    let base = match std::fs::read(base_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("vcdelta: base file: {}: {e}", base_path.display());
            return 1;
        }
    };
    let delta = match read_input(opts.input_file()) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("vcdelta: delta input: {e}");
            return 1;
        }
    };

    let target = match codec::decode_with_options(&delta, &base, &opts.decode_options()) {
        Ok(target) => target,
        Err(e) => {
            report_codec_error(opts, "decode", None, &e);
            return 1;
        }
    };

    if let Err(msg) = write_payload(opts, &target) {
        eprintln!("vcdelta: {msg}");
        return 1;
    }

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "vcdelta: decoder: base size: {}, delta size: {}, output size: {}",
            base.len(),
            delta.len(),
            target.len()
        );
    }
    if opts.json_output {
        emit_json(&json!({
            "command": "decode",
            "base_size": base.len(),
            "delta_size": delta.len(),
            "output_size": target.len(),
            "sha256": digest_hex(&target),
        }));
    }

    0
}

fn cmd_decode_stream(opts: &Options) -> i32 {
    let (Some(base), Some(delta), Some(output)) = (
        opts.base_file.as_deref(),
        opts.input_file(),
        opts.output_file.as_deref(),
    ) else {
        eprintln!("vcdelta: --stream requires a delta file and an output file");
        return 1;
    };
    if opts.use_stdout || opts.no_output {
        eprintln!("vcdelta: --stream writes to a file; drop --stdout/--check-only");
        return 1;
    }
    if output.exists() && !opts.force {
        eprintln!(
            "vcdelta: output file exists, use -f to overwrite: {}",
            output.display()
        );
        return 1;
    }

    let stats = match codec::decode_file(base, delta, output, &opts.decode_options()) {
        Ok(stats) => stats,
        Err(e) => {
            report_codec_error(opts, "decode", None, &e);
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "vcdelta: decoder: output size: {}, windows: {}",
            stats.output_size, stats.windows
        );
    }
    if opts.json_output {
        emit_json(&json!({
            "command": "decode",
            "base_size": stats.base_size,
            "delta_size": stats.delta_size,
            "output_size": stats.output_size,
            "windows": stats.windows,
            "sha256": stats.output_sha256.map(|d| crate::io::to_hex(&d)),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Apply command
// ---------------------------------------------------------------------------

fn cmd_apply(opts: &Options) -> i32 {
    let (Some(base_path), Some(base_id)) = (opts.base_file.as_deref(), opts.base_id.as_deref())
    else {
        eprintln!("vcdelta: apply requires --base and --base-id");
        return 1;
    };
    let base = match std::fs::read(base_path) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("vcdelta: base file: {}: {e}", base_path.display());
            return 1;
        }
    };

    let codec = DeltaCodec::with_options(opts.decode_options());
    codec.set_base(base, base_id);

    for (i, step) in opts.steps.iter().enumerate() {
        let delta = match std::fs::read(&step.delta_file) {
            Ok(data) => data,
            Err(e) => {
                eprintln!(
                    "vcdelta: step {}: {}: {e}",
                    i + 1,
                    step.delta_file.display()
                );
                return 1;
            }
        };
        match codec.apply(&delta, &step.delta_id, &step.base_id) {
            Ok(payload) => {
                if opts.verbose > 0 && !opts.quiet {
                    eprintln!(
                        "vcdelta: step {}: {} -> {}: {} bytes",
                        i + 1,
                        step.base_id,
                        step.delta_id,
                        payload.len()
                    );
                }
            }
            Err(e) => {
                report_codec_error(opts, "apply", Some(i + 1), &e);
                return 1;
            }
        }
    }

    let Some(last) = codec.snapshot() else {
        eprintln!("vcdelta: apply: codec lost its base");
        return 1;
    };

    if let Err(msg) = write_payload(opts, &last.payload) {
        eprintln!("vcdelta: {msg}");
        return 1;
    }

    if opts.json_output {
        emit_json(&json!({
            "command": "apply",
            "steps": opts.steps.len(),
            "final_id": last.id,
            "output_size": last.payload.len(),
            "sha256": digest_hex(&last.payload),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Check command
// ---------------------------------------------------------------------------

fn cmd_check(opts: &Options) -> i32 {
    let mut all_deltas = true;
    let mut report = Vec::with_capacity(opts.input_files.len());

    for path in &opts.input_files {
        let verdict = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|buf| validator::inspect(&buf).map_err(|e| e.to_string()));

        match &verdict {
            Ok(summary) => {
                if !opts.quiet {
                    let secondary = summary
                        .secondary_id
                        .map(|id| header::secondary_name(id).unwrap_or("unknown"))
                        .unwrap_or("none");
                    println!(
                        "{}: VCDIFF delta ({}, secondary: {secondary})",
                        path.display(),
                        flag_names(summary.indicator)
                    );
                }
            }
            Err(reason) => {
                all_deltas = false;
                if !opts.quiet {
                    println!("{}: not a delta: {reason}", path.display());
                }
            }
        }

        report.push(json!({
            "file": path.display().to_string(),
            "delta": verdict.is_ok(),
            "reason": verdict.as_ref().err(),
        }));
    }

    if opts.json_output {
        emit_json(&json!({ "command": "check", "files": report }));
    }

    if all_deltas { 0 } else { 1 }
}

// ---------------------------------------------------------------------------
// Print commands (header, headers, delta)
// ---------------------------------------------------------------------------

fn cmd_print(opts: &Options) -> i32 {
    let Some(input_file) = opts.input_file() else {
        eprintln!("vcdelta: print commands require an input file");
        return 1;
    };

    let file = match File::open(input_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("vcdelta: {}: {e}", input_file.display());
            return 1;
        }
    };
    let mut decoder = StreamDecoder::new(BufReader::with_capacity(BUF_SIZE, file), false);

    let file_hdr = match decoder.read_header() {
        Ok(hdr) => hdr.clone(),
        Err(e) => {
            eprintln!("vcdelta: invalid VCDIFF header: {e}");
            return 1;
        }
    };

    println!("VCDIFF version:               0");
    println!("VCDIFF header size:           {}", file_hdr.encoded_len());
    println!(
        "VCDIFF header indicator:      {}",
        flag_names(file_hdr.indicator)
    );
    match file_hdr.secondary_id {
        Some(id) => match header::secondary_name(id) {
            Some(name) => println!("VCDIFF secondary compressor:  {name}"),
            None => println!("VCDIFF secondary compressor:  unknown (id={id})"),
        },
        None => println!("VCDIFF secondary compressor:  none"),
    }
    if let Some(data) = file_hdr.app_header.as_deref()
        && !data.is_empty()
    {
        println!(
            "VCDIFF application header:    {}",
            String::from_utf8_lossy(data)
        );
    }

    let mut window_num: u64 = 0;
    let mut target_offset: u64 = 0;

    loop {
        let wh = match decoder.next_window() {
            Ok(Some(wh)) => wh,
            Ok(None) => break,
            Err(e) => {
                eprintln!("vcdelta: window {window_num}: {e}");
                return 1;
            }
        };

        println!();
        println!("VCDIFF window number:         {window_num}");
        println!("VCDIFF window indicator:      {}", flag_names(wh.indicator));
        if let Some(cksum) = wh.adler32 {
            println!("VCDIFF adler32 checksum:      {cksum:08X}");
        }
        if !wh.delta_indicator.is_empty() {
            println!(
                "VCDIFF delta indicator:       {}",
                flag_names(wh.delta_indicator)
            );
        }
        if target_offset > 0 {
            println!("VCDIFF window at offset:      {target_offset}");
        }
        if wh.has_copy_window() {
            println!("VCDIFF copy window length:    {}", wh.copy_window_len);
            println!("VCDIFF copy window offset:    {}", wh.copy_window_offset);
        }
        println!("VCDIFF delta encoding length: {}", wh.enc_len);
        println!("VCDIFF target window length:  {}", wh.target_window_len);
        println!("VCDIFF data section length:   {}", wh.data_len);
        println!("VCDIFF inst section length:   {}", wh.inst_len);
        println!("VCDIFF addr section length:   {}", wh.addr_len);

        if opts.command == Command::PrintDelta && print_instructions(&decoder, &wh, target_offset) != 0 {
            return 1;
        }

        target_offset += wh.target_window_len;
        window_num += 1;

        if opts.command == Command::PrintHdr {
            break;
        }
    }

    0
}

fn print_instructions<R: Read>(
    decoder: &StreamDecoder<R>,
    wh: &header::WindowHeader,
    target_offset: u64,
) -> i32 {
    let (_, inst, addr) = match decoder.sections(wh) {
        Ok(sections) => sections,
        Err(e) => {
            eprintln!("vcdelta: decompress sections: {e}");
            return 1;
        }
    };

    println!("  Offset     Type   Size  Address");
    let copy_window_len = wh.copy_window_len;
    let mut offset = target_offset;
    for result in InstructionIterator::new(&inst, &addr, copy_window_len) {
        let instruction = match result {
            Ok(instruction) => instruction,
            Err(e) => {
                eprintln!("vcdelta: instruction decode: {e}");
                return 1;
            }
        };
        match instruction {
            Instruction::Add { len } => println!("  {offset:06}     ADD  {len:6}"),
            Instruction::Run { len } => println!("  {offset:06}     RUN  {len:6}"),
            Instruction::Copy { len, addr: at, .. } => {
                let at_str = if at >= copy_window_len {
                    format!("T@{}", at - copy_window_len)
                } else if wh.has_target() {
                    format!("T@{}", wh.copy_window_offset + at)
                } else {
                    format!("S@{}", wh.copy_window_offset + at)
                };
                println!("  {offset:06}     CPY  {len:6}  {at_str}");
            }
        }
        offset += u64::from(instruction.len());
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if opts.use_stdout
        && let Some(path) = opts.output_file.take()
        && !opts.quiet
    {
        eprintln!(
            "vcdelta: warning: -c option overrides output filename: {}",
            path.display()
        );
    }

    let exit_code = match opts.command {
        Command::Decode => cmd_decode(&opts),
        Command::Apply => cmd_apply(&opts),
        Command::Check => cmd_check(&opts),
        Command::Config => cmd_config(),
        Command::PrintHdr | Command::PrintHdrs | Command::PrintDelta => cmd_print(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


