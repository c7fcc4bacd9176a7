//! LSL XDF Toolbox - Convert Lab Streaming Layer XDF recordings for analysis
//!
//! This crate turns an XDF recording into a continuous multichannel time
//! series (`RawArray`) built from one reference stream, with the events of a
//! marker stream aligned onto the reference timeline.
//!
//! # Overview
//!
//! An XDF file holds several independent streams (EEG, EMG, markers, ...),
//! each sampled on its own clock. Conversion is a single pass:
//!
//! 1. Load the file and post-process timestamps ([`xdf`])
//! 2. Pick the reference stream by name and find marker streams ([`select`])
//! 3. Flatten the reference stream's channel descriptors ([`channels`])
//! 4. Align marker timestamps to the reference timeline ([`align`])
//! 5. Build the output recording ([`convert`], [`raw`])
//!
//! # Alignment Policies
//!
//! - **Fast** (default): marker onset = marker timestamp - first reference
//!   timestamp. The result carries onset-based annotations.
//! - **Precise**: every marker is mapped to the reference sample nearest in
//!   time. The result carries a separate `(sample, 0, code)` event table.
//!
//! # Command-Line Tools
//!
//! - `xdf-convert` - Convert a recording, print a summary, optionally export to Zarr
//! - `xdf-streams` - List the `(name, type)` of every stream in a file
//!
//! ```bash
//! # List streams
//! xdf-streams recording.xdf
//!
//! # Convert with the EEG amplifier stream as reference
//! xdf-convert recording.xdf --reference BrainAmpSeries
//!
//! # Precise alignment and Zarr export
//! xdf-convert recording.xdf --reference BrainAmpSeries --precise --zarr converted.zarr
//! ```
//!
//! # Library Usage
//!
//! ```no_run
//! use lsl_xdf_toolbox::convert::{read_raw_xdf, Conversion, ConvertOptions};
//!
//! let options = ConvertOptions::new("BrainAmpSeries");
//! match read_raw_xdf("recording.xdf", &options)? {
//!     Conversion::Raw(raw) => println!("{} channels, no markers", raw.n_channels()),
//!     Conversion::Annotated(raw) => println!("{} annotations", raw.annotations().len()),
//!     Conversion::WithEvents { events, .. } => println!("{} events", events.len()),
//! }
//! # Ok::<(), lsl_xdf_toolbox::error::ConvertError>(())
//! ```
//!
//! # License
//!
//! This project is licensed under the GNU General Public License v3.0 or later.

pub mod align;
pub mod channels;
pub mod cli;
pub mod convert;
pub mod error;
pub mod raw;
pub mod select;
pub mod xdf;
pub mod zarr;

use chrono::Datelike;

/// Display GPL license notice for a program
pub fn display_license_notice(program_name: &str) {
	let version = env!("CARGO_PKG_VERSION");
	let current_year = chrono::Utc::now().year();
	let copyright_year = if current_year == 2025 {
		"2025".to_string()
	} else {
		format!("2025-{}", current_year)
	};

	println!("{} {} Copyright (C) {} Raul C. Sîmpetru", program_name, version, copyright_year);
	println!("This program comes with ABSOLUTELY NO WARRANTY.");
	println!("For details see https://www.gnu.org/licenses/gpl-3.0.html#license-text.");
	println!("This is free software, and you are welcome to redistribute it under certain conditions.");
	println!();
}
