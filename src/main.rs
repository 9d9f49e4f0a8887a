//! midiscore - Converts Standard MIDI Files into notated scores.
//!
//! Reads a .mid file, quantizes its notes to a tick grid and prints the
//! resulting staffs, either as a listing or as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- song.mid               # Print a per-staff listing
//! cargo run -- --quantize 64 song.mid # Coarser grid
//! cargo run -- --json song.mid        # Dump the document as JSON
//! ```
//!
//! Set `RUST_LOG=debug` to see every decoded event.

use anyhow::{bail, Context, Result};
use midiscore::midi::{import_from_midi, ImportOptions, ImportReport};
use midiscore::score::{Document, Element};
use std::path::PathBuf;

/// Command-line options for the application.
struct CliOptions {
    /// MIDI file to import.
    input: PathBuf,
    /// Quantization and notation settings.
    import: ImportOptions,
    /// Print the document as JSON instead of a listing.
    json: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--quantize <ticks>` or `-q <ticks>`: Quantization grid
    /// - `--dots <n>` or `-d <n>`: Most dots on a written length
    /// - `--json`: Print the document as JSON
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut import = ImportOptions::default();
        let mut json = false;
        let mut input: Option<PathBuf> = None;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--quantize" | "-q" => {
                    i += 1;
                    let value = args.get(i).context("--quantize requires a tick count")?;
                    import.quantization_unit = value
                        .parse()
                        .with_context(|| format!("Invalid quantization unit: {value}"))?;
                }
                "--dots" | "-d" => {
                    i += 1;
                    let value = args.get(i).context("--dots requires a number")?;
                    import.max_dots = value
                        .parse()
                        .with_context(|| format!("Invalid dot count: {value}"))?;
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    eprintln!("midiscore - Convert a MIDI file into a score");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS] <FILE>",
                        args.first().map_or("midiscore", String::as_str)
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -q, --quantize TICKS  Quantization grid in ticks (default 32)");
                    eprintln!("  -d, --dots N          Most dots on a note length (default 4)");
                    eprintln!("      --json            Print the document as JSON");
                    eprintln!("  -h, --help            Print this help message");
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
                other => {
                    if input.is_some() {
                        bail!("Only one input file can be given");
                    }
                    input = Some(PathBuf::from(other));
                }
            }
            i += 1;
        }

        let input = input.context("No input file given (use --help for usage)")?;
        Ok(Self {
            input,
            import,
            json,
        })
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (document, report) = import_from_midi(&cli.input, cli.import)
        .with_context(|| format!("Failed to import {}", cli.input.display()))?;

    if cli.json {
        let json = document.to_json().context("Failed to serialize document")?;
        println!("{json}");
    } else {
        print_listing(&document, &report);
    }
    Ok(())
}

/// Prints the imported sheet staff by staff.
fn print_listing(document: &Document, report: &ImportReport) {
    println!("{}", document.title);
    if let Some(header) = report.header {
        let division = match header.ticks_per_quarter() {
            Some(ticks) => format!("{ticks} ticks per quarter"),
            None => format!("SMPTE division 0x{:04x}", header.division),
        };
        println!("format {}, {} track(s), {division}", header.format, header.track_count);
    }
    if !report.summary.track_names.is_empty() {
        println!("tracks: {}", report.summary.track_names.join(", "));
    }

    let Some(sheet) = document.sheets.get(report.sheet_index) else {
        return;
    };
    for staff in &sheet.staffs {
        println!();
        println!("{}", staff.name);
        for voice in &staff.voices {
            for element in voice.elements() {
                match element {
                    Element::Note(note) => println!(
                        "  {:>6}  {:<6} {:<4}{}{}",
                        note.time_start,
                        note.length.to_string(),
                        note.pitch.to_string(),
                        if note.tie_end { " (tied)" } else { "" },
                        if note.tie_start { " ~" } else { "" },
                    ),
                    Element::Rest(rest) => {
                        println!("  {:>6}  {:<6} rest", rest.time_start, rest.length.to_string())
                    }
                }
            }
        }
    }

    let stats = &report.stats;
    println!();
    println!(
        "{} note(s), {} rest(s) on {} staff(s); dropped {} unmatched, {} too short, {} overlapping",
        stats.build.notes_written,
        stats.build.rests_written,
        stats.build.staffs_written,
        stats.unmatched_notes,
        stats.lost_to_quantization,
        stats.discarded_overlaps,
    );
}
