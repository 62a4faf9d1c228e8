//! Command-line interface for the ptyx lexer
//!
//! Usage:
//!   ptyx styles `<path>` [--start N] [--end N] [--format simple|json|yaml] [--merge]
//!   ptyx check `<path>` [--format simple|json]   - Check embedded Python blocks
//!   ptyx format `<path>` [--in-place]            - Reformat embedded Python blocks
//!
//! `--config <file>` layers a TOML file over the built-in defaults. Logging goes to
//! stderr and is controlled by `RUST_LOG` (default: `warn`).

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use ptyx_config::{Loader, PtyxConfig};
use ptyx_lexer::ptyx::blocks::{BlockChecker, BlockFormatter, ProcessTool};
use ptyx_lexer::ptyx::lexing::{coalesce, IncrementalStyler, StyleSpan, StyledBuffer};
use ptyx_lexer::ptyx::registry::GrammarRegistry;
use ptyx_lexer::ptyx::styling::{Mode, StyleTag};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let path_arg = || {
        Arg::new("path")
            .help("Path to the ptyx file")
            .required(true)
            .index(1)
    };

    let matches = Command::new("ptyx")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Style, check and format ptyx templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the defaults"),
        )
        .subcommand(
            Command::new("styles")
                .about("Print the style spans of a byte range")
                .arg(path_arg())
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_parser(value_parser!(usize))
                        .default_value("0")
                        .help("First byte of the range"),
                )
                .arg(
                    Arg::new("end")
                        .long("end")
                        .value_parser(value_parser!(usize))
                        .help("End of the range (default: end of file)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["simple", "json", "yaml"])
                        .default_value("simple"),
                )
                .arg(
                    Arg::new("merge")
                        .long("merge")
                        .help("Merge adjacent spans with the same style")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check embedded Python blocks with the configured checker")
                .arg(path_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["simple", "json"])
                        .default_value("simple"),
                ),
        )
        .subcommand(
            Command::new("format")
                .about("Reformat embedded Python blocks with the configured formatter")
                .arg(path_arg())
                .arg(
                    Arg::new("in-place")
                        .long("in-place")
                        .short('i')
                        .help("Rewrite the file instead of printing the result")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config"));

    match matches.subcommand() {
        Some(("styles", sub)) => handle_styles_command(&config, sub),
        Some(("check", sub)) => handle_check_command(&config, sub),
        Some(("format", sub)) => handle_format_command(&config, sub),
        _ => unreachable!("a subcommand is required"),
    }
}

fn load_config(path: Option<&String>) -> PtyxConfig {
    let mut loader = Loader::new();
    if let Some(path) = path {
        debug!(path = %path, "layering user configuration");
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

fn read_document(matches: &ArgMatches) -> (String, String) {
    let path = matches
        .get_one::<String>("path")
        .cloned()
        .unwrap_or_default();
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        std::process::exit(1);
    });
    (path, text)
}

/// One span as printed by `ptyx styles`.
#[derive(Debug, Serialize)]
struct SpanRecord<'a> {
    start: usize,
    len: usize,
    style: StyleTag,
    mode: Mode,
    text: &'a str,
}

fn span_records<'a>(text: &'a str, start: usize, spans: &[StyleSpan]) -> Vec<SpanRecord<'a>> {
    let mut offset = start;
    spans
        .iter()
        .map(|span| {
            let record = SpanRecord {
                start: offset,
                len: span.len,
                style: span.style,
                mode: span.style.mode(),
                text: text.get(offset..offset + span.len).unwrap_or(""),
            };
            offset += span.len;
            record
        })
        .collect()
}

/// Handle the styles command
fn handle_styles_command(config: &PtyxConfig, matches: &ArgMatches) {
    let (_, text) = read_document(matches);
    let registry = Arc::new(GrammarRegistry::from(&config.grammar));
    let mut styler = IncrementalStyler::new(registry).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let start = matches.get_one::<usize>("start").copied().unwrap_or(0);
    let end = matches
        .get_one::<usize>("end")
        .copied()
        .unwrap_or(text.len());

    let mut buffer = StyledBuffer::new(text.as_str());
    let pass = styler.style_range(&mut buffer, start, end);
    let spans = if matches.get_flag("merge") {
        coalesce(&pass.spans)
    } else {
        pass.spans
    };
    let records = span_records(&text, pass.start, &spans);

    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("simple");
    let output = match format {
        "json" => serde_json::to_string_pretty(&records).map_err(|e| e.to_string()),
        "yaml" => serde_yaml::to_string(&records).map_err(|e| e.to_string()),
        _ => Ok(records
            .iter()
            .map(|r| format!("{}\t{}\t{}\t{:?}\n", r.start, r.len, r.style, r.text))
            .collect::<String>()),
    };
    match output {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error formatting spans: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle the check command
fn handle_check_command(config: &PtyxConfig, matches: &ArgMatches) {
    let (path, text) = read_document(matches);
    let checker = BlockChecker::new(ProcessTool::from(&config.checker));
    let diagnostics = checker.check_document(&text);

    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error formatting diagnostics: {}", e);
                std::process::exit(1);
            }
        },
        _ => {
            for diagnostic in &diagnostics {
                println!("{}:{}", path, diagnostic);
            }
        }
    }

    if !diagnostics.is_empty() {
        std::process::exit(1);
    }
}

/// Handle the format command
fn handle_format_command(config: &PtyxConfig, matches: &ArgMatches) {
    let (path, text) = read_document(matches);
    let formatter = BlockFormatter::new(ProcessTool::from(&config.formatter))
        .with_sentinel(config.blocks.sentinel.as_str())
        .with_delimiter_length(config.blocks.delimiter_length);
    let formatted = formatter.format_document(&text);

    if matches.get_flag("in-place") {
        if formatted != text {
            if let Err(e) = std::fs::write(&path, formatted) {
                eprintln!("Error writing file '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", formatted);
    }
}
