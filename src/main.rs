//! XDF Convert - Convert an XDF recording around a reference stream
//!
//! Loads an XDF file, builds a continuous recording from the reference
//! stream, aligns the (single) marker stream onto it and prints a summary.
//! Optionally exports the result to a Zarr store.
//!
//! # Usage
//!
//! ```bash
//! # Convert the first *.xdf file found in the home directory
//! xdf-convert
//!
//! # Convert a specific file with a specific reference stream
//! xdf-convert recording.xdf --reference BrainAmpSeries
//!
//! # Nearest-sample alignment, exported to Zarr
//! xdf-convert recording.xdf --precise --zarr recording.zarr
//!
//! # Events as JSON
//! xdf-convert recording.xdf --json
//! ```
//!
//! # Output
//!
//! - Reference stream summary (channels, sampling rate, duration)
//! - Fast alignment: annotations and the events derived from them with their
//!   event id mapping
//! - Precise alignment: the `(sample, 0, code)` event table

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use lsl_xdf_toolbox::cli::Args;
use lsl_xdf_toolbox::convert::{Conversion, convert_streams};
use lsl_xdf_toolbox::raw::Event;
use lsl_xdf_toolbox::select::find_reference;
use lsl_xdf_toolbox::xdf::load_xdf_with;
use lsl_xdf_toolbox::zarr::write_conversion;

fn main() -> Result<()> {
    let args = Args::parse();
    // JSON output must be the only thing on stdout
    let report = !args.quiet && !args.json;

    if report {
        lsl_xdf_toolbox::display_license_notice("xdf-convert");
        tracing_subscriber::fmt::init();
    }

    let path = args.resolve_file()?;
    let options = args.convert_options();

    if report {
        println!("File: {}", path.display());
        println!("Reference: {}", options.reference);
        println!("Alignment: {:?}", options.policy());
        println!();
    }

    let file = load_xdf_with(&path, &options.load)?;
    let conversion = convert_streams(&file.streams, &options)?;
    let raw = conversion.raw();

    if report {
        println!("RAW");
        println!("\tChannels:\t{}", raw.n_channels());
        println!("\tSamples:\t{}", raw.n_times());
        println!("\tSample rate:\t{} Hz", raw.info().sfreq);
        println!("\tDuration:\t{:.3} s", raw.duration());
        println!("\tChannel names:\t{}", raw.info().ch_names.join(", "));
        println!();
    }

    match &conversion {
        Conversion::Raw(_) => {
            if report {
                println!("No marker stream found - recording has no annotations");
            }
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "events": [] }))?);
            }
        }
        Conversion::Annotated(raw) => {
            let (events, event_id) = raw.events_from_annotations();
            if args.json {
                let output = json!({
                    "annotations": raw.annotations(),
                    "events": events,
                    "event_id": event_id,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("ANNOTATIONS ({} found)", raw.annotations().len());
                if args.verbose {
                    for annotation in raw.annotations() {
                        println!(
                            "\t{:>10.4} s\t{}",
                            annotation.onset, annotation.description
                        );
                    }
                }
                println!();
                print_events(&events, args.verbose);
                println!("EVENT IDS");
                for (description, id) in &event_id {
                    println!("\t{}\t-> {}", description, id);
                }
            }
        }
        Conversion::WithEvents { events, .. } => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "events": events }))?);
            } else {
                print_events(events, args.verbose);
            }
        }
    }

    if let Some(store_path) = &args.zarr {
        let stream_info = find_reference(&file.streams, &options.reference)
            .ok()
            .map(|s| &s.info);
        write_conversion(store_path, &conversion, &options, stream_info)?;
        if report {
            println!();
            println!("Exported to {}", store_path.display());
        }
    }

    Ok(())
}

fn print_events(events: &[Event], verbose: bool) {
    println!("EVENTS ({} found)", events.len());
    let shown = if verbose { events.len() } else { events.len().min(10) };
    for event in &events[..shown] {
        println!("\t[{:>8}, {}, {:>4}]", event.sample, event.previous, event.code);
    }
    if shown < events.len() {
        println!("\t... {} more (use --verbose to show all)", events.len() - shown);
    }
    println!();
}
