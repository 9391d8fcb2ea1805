// Command-line front-end for hexandtabler.
//
// Every subcommand loads the document into a `Session` (plus an optional
// conversion table) and drives the same operations the editor uses.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::charmap::{AlphabetSeries, CharMap};
use crate::guess::GuessRequest;
use crate::io::{self, DocumentStats};
use crate::search::{FindOptions, SearchKind};
use crate::session::{EditorConfig, Session};

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Byte offset: decimal, or hex with a `0x` prefix.
fn parse_offset(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty offset".into());
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid offset '{s}': {e}"))
}

/// Table slot: two hex digits.
fn parse_slot(s: &str) -> Result<u8, String> {
    let hex = s.trim().trim_start_matches("0x");
    u8::from_str_radix(hex, 16).map_err(|e| format!("invalid byte value '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Byte editor toolkit: table-aware search, replace and encoding guesser.
#[derive(Parser, Debug)]
#[command(
    name = "hexandtabler",
    version,
    about = "Table-aware hex search/replace and encoding guesser",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Conversion table (.tbl) used to decode and render characters.
    #[arg(long, short = 't', global = true, value_hint = ValueHint::FilePath)]
    table: Option<PathBuf>,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Find a pattern in a file.
    Find(FindArgs),
    /// Replace every occurrence of a pattern.
    Replace(ReplaceArgs),
    /// Guess a character mapping from known plaintext.
    Guess(GuessArgs),
    /// Print a hex dump with the character column.
    Dump(DumpArgs),
    /// Conversion table maintenance.
    #[command(subcommand)]
    Table(TableCmd),
    /// Print build/configuration details.
    Config,
}

#[derive(Subcommand, Debug)]
enum TableCmd {
    /// Write the current table to a file.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Hex,
    Char,
    Relative,
}

impl From<KindArg> for SearchKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Hex => SearchKind::Hex,
            KindArg::Char => SearchKind::Char,
            KindArg::Relative => SearchKind::Relative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SeriesArg {
    LatinUpper,
    LatinLower,
    Hiragana,
    Katakana,
    Cyrillic,
}

impl From<SeriesArg> for AlphabetSeries {
    fn from(series: SeriesArg) -> Self {
        match series {
            SeriesArg::LatinUpper => AlphabetSeries::LatinUpper,
            SeriesArg::LatinLower => AlphabetSeries::LatinLower,
            SeriesArg::Hiragana => AlphabetSeries::Hiragana,
            SeriesArg::Katakana => AlphabetSeries::Katakana,
            SeriesArg::Cyrillic => AlphabetSeries::Cyrillic,
        }
    }
}

#[derive(Args, Debug)]
struct FindArgs {
    /// File to search.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Pattern text.
    pattern: String,

    /// How the pattern is interpreted.
    #[arg(long, value_enum, default_value_t = KindArg::Hex)]
    kind: KindArg,

    /// Case-insensitive matching (ASCII letters).
    #[arg(long = "ignore-case", short = 'i')]
    ignore_case: bool,

    /// Wrap around at the end (or start) of the file.
    #[arg(long)]
    wrap: bool,

    /// Search towards the start of the file.
    #[arg(long)]
    backwards: bool,

    /// Cursor offset to search from; a match under the cursor is skipped.
    /// Without it the whole file is searched from the start (or the end
    /// with --backwards).
    #[arg(long, value_parser = parse_offset)]
    from: Option<usize>,

    /// List every match instead of the next one.
    #[arg(long, conflicts_with_all = ["wrap", "backwards", "from"])]
    all: bool,
}

#[derive(Args, Debug)]
struct ReplaceArgs {
    /// File to modify.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Pattern text.
    pattern: String,

    /// Replacement text (empty deletes matches).
    replacement: String,

    /// How pattern and replacement are interpreted.
    #[arg(long, value_enum, default_value_t = KindArg::Hex)]
    kind: KindArg,

    /// Case-insensitive matching (ASCII letters).
    #[arg(long = "ignore-case", short = 'i')]
    ignore_case: bool,

    /// Output file (default: rewrite the input, requires --force).
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Overwrite existing output files.
    #[arg(short = 'f', long)]
    force: bool,
}

#[derive(Args, Debug)]
struct GuessArgs {
    /// File to scan.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Known plaintext (repeat for several phrases).
    #[arg(long = "phrase", short = 'p', value_name = "PHRASE", action = ArgAction::Append, required = true)]
    phrases: Vec<String>,

    /// First byte offset to scan.
    #[arg(long, value_parser = parse_offset, default_value = "0")]
    start: usize,

    /// End of the scanned range (exclusive, default: end of file).
    #[arg(long, value_parser = parse_offset)]
    end: Option<usize>,

    /// Apply candidate N (as listed) to the table.
    #[arg(long, value_name = "N")]
    apply: Option<usize>,

    /// Save the resulting table.
    #[arg(long = "save-table", value_name = "OUT", value_hint = ValueHint::FilePath, requires = "apply")]
    save_table: Option<PathBuf>,

    /// Overwrite an existing table file.
    #[arg(short = 'f', long)]
    force: bool,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// File to dump.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// First byte offset.
    #[arg(long, value_parser = parse_offset, default_value = "0")]
    offset: usize,

    /// Number of bytes (default: to end of file).
    #[arg(long, value_parser = parse_offset)]
    length: Option<usize>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output table file.
    #[arg(value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Alphabet series to write into the table.
    #[arg(long, value_enum, requires = "at")]
    series: Option<SeriesArg>,

    /// First slot (hex) the series is written to.
    #[arg(long, value_parser = parse_slot, requires = "series")]
    at: Option<u8>,

    /// Overwrite an existing table file.
    #[arg(short = 'f', long)]
    force: bool,
}

// ---------------------------------------------------------------------------
// Resolved options (global flags flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Options {
    table_file: Option<PathBuf>,
    quiet: bool,
    verbose: u8,
    json_output: bool,
}

fn resolve_options(cli: Cli) -> (Options, Cmd) {
    let opts = Options {
        table_file: cli.table,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
    };
    (opts, cli.command)
}

fn log_filter(opts: &Options) -> &'static str {
    match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("hexandtabler".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let (opts, _) = resolve_options(cli);
        let _ = log_filter(&opts);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn load_char_map(opts: &Options) -> Result<CharMap, String> {
    match &opts.table_file {
        Some(path) => io::load_table(path)
            .map(CharMap::from_table)
            .map_err(|e| format!("table file: {}: {e}", path.display())),
        None => Ok(CharMap::new()),
    }
}

fn open_session(opts: &Options, path: &Path) -> Result<(Session, DocumentStats), String> {
    let (data, stats) =
        io::load_document(path).map_err(|e| format!("input file: {}: {e}", path.display()))?;
    let mut session = Session::new(EditorConfig::default());
    session.apply_char_map(load_char_map(opts)?.export());
    session.set_buffer(data);
    session.take_notifications();
    Ok((session, stats))
}

fn check_overwrite(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "output file exists, use -f to overwrite: {}",
            path.display()
        ));
    }
    Ok(())
}

fn fail(msg: impl std::fmt::Display) -> i32 {
    eprintln!("hexandtabler: {msg}");
    1
}

fn sha_field(stats: &DocumentStats) -> serde_json::Value {
    match &stats.sha256 {
        Some(sha) => serde_json::Value::String(io::hex_digest(sha)),
        None => serde_json::Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    let config = EditorConfig::default();
    eprintln!("hexandtabler version {version} (Rust)");
    eprintln!("FILE_IO={}", cfg!(feature = "file-io") as u8);
    eprintln!("PARALLEL={}", cfg!(feature = "parallel") as u8);
    eprintln!("BYTES_PER_LINE={}", config.bytes_per_line);
    eprintln!("HISTORY_LIMIT={}", config.history_limit);
    eprintln!(
        "MIN_RELATIVE_CHARS={}",
        crate::search::relative::MIN_PATTERN_CHARS
    );
    eprintln!("sizeof(usize)={}", std::mem::size_of::<usize>());
    0
}

// ---------------------------------------------------------------------------
// Find command
// ---------------------------------------------------------------------------

fn cmd_find(opts: &Options, args: &FindArgs) -> i32 {
    let (mut session, _) = match open_session(opts, &args.file) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let kind = SearchKind::from(args.kind);

    let spans: Vec<Range<usize>> = if args.all {
        match session.find_all(&args.pattern, kind, !args.ignore_case) {
            Ok(spans) => spans,
            Err(e) => return fail(e),
        }
    } else {
        let find_opts = FindOptions {
            case_sensitive: !args.ignore_case,
            wrap: args.wrap,
            backwards: args.backwards,
        };
        let found = match args.from {
            Some(offset) => {
                session.go_to_offset(offset);
                session.find(&args.pattern, kind, find_opts)
            }
            None => session.find_first(&args.pattern, kind, find_opts),
        };
        match found {
            Ok(found) => found.map(|m| m.start..m.end()).into_iter().collect(),
            Err(e) => return fail(e),
        }
    };

    if opts.json_output {
        let matches: Vec<_> = spans
            .iter()
            .map(|r| serde_json::json!({ "offset": r.start, "length": r.len() }))
            .collect();
        let json = serde_json::json!({
            "command": "find",
            "pattern": args.pattern,
            "matches": matches,
        });
        println!("{json:#}");
    } else if !opts.quiet {
        for span in &spans {
            let text = session.char_map().render(&session.buffer()[span.clone()]);
            println!("{:08X}  {text}", span.start);
        }
    }

    if spans.is_empty() {
        if !opts.quiet {
            eprintln!("hexandtabler: no match for \"{}\"", args.pattern);
        }
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Replace command
// ---------------------------------------------------------------------------

fn cmd_replace(opts: &Options, args: &ReplaceArgs) -> i32 {
    let output = args.output.as_deref().unwrap_or(&args.file);
    if let Err(e) = check_overwrite(output, args.force) {
        return fail(e);
    }

    let (mut session, _) = match open_session(opts, &args.file) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let count = match session.replace_all(
        &args.pattern,
        &args.replacement,
        SearchKind::from(args.kind),
        !args.ignore_case,
    ) {
        Ok(n) => n,
        Err(e) => return fail(e),
    };
    if count == 0 {
        if !opts.quiet {
            eprintln!("hexandtabler: no occurrences of \"{}\"", args.pattern);
        }
        return 1;
    }

    let stats = match io::save_document(output, session.buffer()) {
        Ok(stats) => stats,
        Err(e) => return fail(format!("output file: {}: {e}", output.display())),
    };
    session.mark_saved();

    if opts.json_output {
        let json = serde_json::json!({
            "command": "replace",
            "replaced": count,
            "output": output.display().to_string(),
            "output_size": stats.size,
            "output_sha256": sha_field(&stats),
        });
        println!("{json:#}");
    } else if !opts.quiet {
        println!("replaced {count} occurrence(s)");
        if opts.verbose > 0 {
            eprintln!(
                "hexandtabler: wrote {} bytes to {}",
                stats.size,
                output.display()
            );
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Guess command
// ---------------------------------------------------------------------------

fn cmd_guess(opts: &Options, args: &GuessArgs) -> i32 {
    if let Some(out) = &args.save_table
        && let Err(e) = check_overwrite(out, args.force)
    {
        return fail(e);
    }

    let (mut session, _) = match open_session(opts, &args.file) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let request = GuessRequest::new(args.phrases.clone())
        .with_range(args.start..args.end.unwrap_or(usize::MAX));
    if let Err(e) = session.start_guess(&request) {
        return fail(e);
    }
    let results = session.wait_guess().unwrap_or_default();

    if opts.json_output {
        let list: Vec<_> = results
            .iter()
            .map(|m| {
                let pairs: serde_json::Map<String, serde_json::Value> = m
                    .pairs()
                    .map(|(c, b)| (c.to_string(), serde_json::Value::from(format!("{b:02X}"))))
                    .collect();
                serde_json::Value::Object(pairs)
            })
            .collect();
        let json = serde_json::json!({ "command": "guess", "candidates": list });
        println!("{json:#}");
    } else if !opts.quiet {
        for (i, mapping) in results.iter().enumerate() {
            println!("{i:>4}  {mapping}");
        }
    }

    if results.is_empty() {
        if !opts.quiet {
            eprintln!("hexandtabler: no consistent mapping found");
        }
        return 1;
    }

    if let Some(n) = args.apply {
        let Some(mapping) = results.get(n) else {
            return fail(format!(
                "--apply {n}: only {} candidate(s) found",
                results.len()
            ));
        };
        session.apply_mapping(mapping);
        if let Some(out) = &args.save_table {
            if let Err(e) = io::save_table(out, session.char_map()) {
                return fail(format!("table file: {}: {e}", out.display()));
            }
            if opts.verbose > 0 && !opts.quiet {
                eprintln!("hexandtabler: table written to {}", out.display());
            }
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Dump command
// ---------------------------------------------------------------------------

fn cmd_dump(opts: &Options, args: &DumpArgs) -> i32 {
    let (session, stats) = match open_session(opts, &args.file) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data = session.buffer();
    let start = args.offset.min(data.len());
    let end = args
        .length
        .map_or(data.len(), |n| start.saturating_add(n).min(data.len()));
    let row = session.config().bytes_per_line;

    if opts.json_output {
        let json = serde_json::json!({
            "command": "dump",
            "size": stats.size,
            "sha256": sha_field(&stats),
            "offset": start,
            "hex": crate::editor::clipboard::to_hex_string(&data[start..end]),
            "text": session.char_map().render(&data[start..end]),
        });
        println!("{json:#}");
        return 0;
    }

    let mut offset = start;
    while offset < end {
        let line = &data[offset..(offset + row).min(end)];
        let hex = crate::editor::clipboard::to_hex_string(line);
        println!(
            "{offset:08X}  {hex:<width$}  {}",
            session.char_map().render(line),
            width = row * 3 - 1
        );
        offset += row;
    }
    0
}

// ---------------------------------------------------------------------------
// Table command
// ---------------------------------------------------------------------------

fn cmd_table_export(opts: &Options, args: &ExportArgs) -> i32 {
    if let Err(e) = check_overwrite(&args.output, args.force) {
        return fail(e);
    }
    let mut map = match load_char_map(opts) {
        Ok(map) => map,
        Err(e) => return fail(e),
    };
    if let (Some(series), Some(at)) = (args.series, args.at) {
        let written = map.insert_series(at, series.into());
        log::info!("wrote {written} series glyph(s) from slot {at:02X}");
    }
    if let Err(e) = io::save_table(&args.output, &map) {
        return fail(format!("table file: {}: {e}", args.output.display()));
    }
    if !opts.quiet && opts.verbose > 0 {
        eprintln!("hexandtabler: table written to {}", args.output.display());
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let (opts, command) = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &command {
        Cmd::Find(args) => cmd_find(&opts, args),
        Cmd::Replace(args) => cmd_replace(&opts, args),
        Cmd::Guess(args) => cmd_guess(&opts, args),
        Cmd::Dump(args) => cmd_dump(&opts, args),
        Cmd::Table(TableCmd::Export(args)) => cmd_table_export(&opts, args),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
