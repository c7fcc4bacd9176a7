use clap::Parser;
use std::path::{Path, PathBuf};

use crate::convert::{ConvertOptions, DEFAULT_REFERENCE};
use crate::xdf::LoadOptions;

#[derive(Parser, Clone, Debug)]
#[command(name = "xdf-convert")]
#[command(about = "Convert an XDF recording into a continuous time series with aligned markers")]
#[command(version)]
pub struct Args {
    #[arg(help = "XDF file to convert (defaults to the first *.xdf entry in the home directory)")]
    pub file: Option<PathBuf>,

    #[arg(
        long,
        short = 'r',
        help = "Name of the stream used as time reference",
        default_value = DEFAULT_REFERENCE
    )]
    pub reference: String,

    #[arg(
        long,
        short = 'p',
        help = "Align markers to the nearest reference sample instead of a constant offset (slower)"
    )]
    pub precise: bool,

    #[arg(long, help = "Export the converted recording to this Zarr store")]
    pub zarr: Option<PathBuf>,

    #[arg(long, help = "Do not apply clock offset measurements to timestamps")]
    pub no_clock_sync: bool,

    #[arg(long, help = "Do not smooth timestamps of regular streams")]
    pub no_dejitter: bool,

    #[arg(
        long,
        default_value = "1.0",
        help = "Gap in seconds that starts a new dejitter segment"
    )]
    pub jitter_break_seconds: f64,

    #[arg(
        long,
        default_value = "500",
        help = "Gap in samples that starts a new dejitter segment"
    )]
    pub jitter_break_samples: f64,

    #[arg(long, help = "Print events and annotations as JSON")]
    pub json: bool,

    #[arg(long, short = 'v', help = "Show every annotation and event")]
    pub verbose: bool,

    #[arg(long, short = 'q', help = "Minimal output mode")]
    pub quiet: bool,
}

impl Args {
    /// Conversion options from the parsed arguments
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            reference: self.reference.clone(),
            precise: self.precise,
            load: LoadOptions {
                synchronize_clocks: !self.no_clock_sync,
                dejitter_timestamps: !self.no_dejitter,
                jitter_break_threshold_seconds: self.jitter_break_seconds,
                jitter_break_threshold_samples: self.jitter_break_samples,
            },
        }
    }

    /// The file to convert: the explicit argument, or a search of the home directory
    pub fn resolve_file(&self) -> anyhow::Result<PathBuf> {
        if let Some(file) = &self.file {
            return Ok(file.clone());
        }

        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("No file given and no home directory found"))?;

        find_xdf_file(&home)?
            .ok_or_else(|| anyhow::anyhow!("No file given and no .xdf file in {}", home.display()))
    }
}

/// First directory entry (in name order) whose file name contains ".xdf"
pub fn find_xdf_file(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut names: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name())
        .filter(|name| name.to_string_lossy().contains(".xdf"))
        .collect();
    names.sort();

    Ok(names.into_iter().next().map(|name| dir.join(name)))
}
