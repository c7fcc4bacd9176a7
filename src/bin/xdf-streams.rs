//! XDF Streams - List the streams of an XDF recording
//!
//! Prints the name and type of every stream in file order, which is what
//! `xdf-convert --reference` expects as input.
//!
//! # Usage
//!
//! ```bash
//! xdf-streams recording.xdf
//! xdf-streams recording.xdf --verbose
//! xdf-streams recording.xdf --json
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use lsl_xdf_toolbox::select::stream_names;
use lsl_xdf_toolbox::xdf::load_xdf;

#[derive(Parser)]
#[command(name = "xdf-streams")]
#[command(about = "List the (name, type) of every stream in an XDF recording")]
#[command(version)]
struct Args {
    /// XDF file to inspect
    file: PathBuf,

    /// Also show channel count, format, rate and sample count
    #[arg(short, long)]
    verbose: bool,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !args.json {
        tracing_subscriber::fmt::init();
    }

    let file = load_xdf(&args.file)?;
    let names = stream_names(&file.streams);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
        return Ok(());
    }

    lsl_xdf_toolbox::display_license_notice("xdf-streams");

    println!("File: {}", args.file.display());
    println!(
        "XDF version: {}",
        file.version().unwrap_or_else(|| "unknown".to_string())
    );
    println!();
    println!("STREAMS ({} found)", file.streams.len());

    for (idx, stream) in file.streams.iter().enumerate() {
        let is_last = idx + 1 == file.streams.len();
        let prefix = if is_last { "  └─" } else { "  ├─" };
        let indent = if is_last { "     " } else { "  │  " };

        println!("{} {} ({})", prefix, stream.name(), stream.stream_type());
        if args.verbose {
            let info = &stream.info;
            println!("{}├─ Channels: {} ({})", indent, info.channel_count, info.channel_format);
            if info.is_irregular() {
                println!("{}├─ Nominal rate: irregular", indent);
            } else {
                println!("{}├─ Nominal rate: {} Hz", indent, info.nominal_srate);
            }
            println!("{}├─ Clock offsets: {}", indent, stream.clock_times.len());
            match (stream.time_stamps.first(), stream.time_stamps.last()) {
                (Some(first), Some(last)) => {
                    println!("{}├─ Samples: {}", indent, stream.len());
                    println!("{}└─ Time Range: {:.6} → {:.6}", indent, first, last);
                }
                _ => println!("{}└─ Samples: 0", indent),
            }
        }
    }

    Ok(())
}
