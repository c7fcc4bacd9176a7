//! XDF loading on top of the `xdf` crate
//!
//! The `xdf` crate parses the container (chunks, samples, XML headers); this
//! module maps each parsed stream into a [`Stream`] with per-stream metadata,
//! decoded samples widened to f64, timestamps and the clock offset
//! measurements listed in the stream footer, then applies timestamp
//! post-processing.

pub mod clock;
mod stream;

pub use stream::{ChannelFormat, MARKER_STREAM_TYPE, Stream, StreamInfo, TimeSeries};

pub(crate) use stream::{child_elements, child_text};

use std::path::Path;

use crate::error::{ConvertError, Result};

/// Timestamp post-processing applied while loading
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub synchronize_clocks: bool,
    pub dejitter_timestamps: bool,
    pub jitter_break_threshold_seconds: f64,
    pub jitter_break_threshold_samples: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synchronize_clocks: true,
            dejitter_timestamps: true,
            jitter_break_threshold_seconds: 1.0,
            jitter_break_threshold_samples: 500.0,
        }
    }
}

/// A loaded XDF recording
#[derive(Debug, Clone)]
pub struct XdfFile {
    /// File header document (`<info><version>...`)
    pub header: xmltree::Element,
    /// Streams ordered by stream id, which is the order recorders declare them in
    pub streams: Vec<Stream>,
}

impl XdfFile {
    /// Format version declared in the file header
    pub fn version(&self) -> Option<String> {
        child_text(&self.header, "version")
    }
}

/// Load an XDF file with default post-processing
pub fn load_xdf(path: impl AsRef<Path>) -> Result<XdfFile> {
    load_xdf_with(path, &LoadOptions::default())
}

/// Load an XDF file
pub fn load_xdf_with(path: impl AsRef<Path>, options: &LoadOptions) -> Result<XdfFile> {
    let path = path.as_ref();
    tracing::info!("Loading XDF file {}", path.display());
    let bytes = std::fs::read(path)?;
    read_xdf(&bytes, options)
}

/// Parse an in-memory XDF recording
pub fn read_xdf(bytes: &[u8], options: &LoadOptions) -> Result<XdfFile> {
    let file = ::xdf::XDFFile::from_bytes(bytes)
        .map_err(|e| ConvertError::Xdf(e.to_string()))?;

    let mut streams = file
        .streams
        .iter()
        .map(|s| Stream::from_xdf(s.id, &s.header, &s.samples, s.footer.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    streams.sort_by_key(|s| s.info.stream_id);

    for stream in &mut streams {
        tracing::debug!(
            "Stream {}: '{}' ({}), {} channels of {} at {} Hz, {} samples",
            stream.info.stream_id,
            stream.info.name,
            stream.info.stream_type,
            stream.info.channel_count,
            stream.info.channel_format,
            stream.info.nominal_srate,
            stream.len()
        );
        if options.synchronize_clocks {
            clock::synchronize_clocks(stream);
        }
        if options.dejitter_timestamps {
            clock::dejitter(
                stream,
                options.jitter_break_threshold_seconds,
                options.jitter_break_threshold_samples,
            );
        }
    }

    tracing::info!("Loaded {} stream(s)", streams.len());

    Ok(XdfFile {
        header: file.header,
        streams,
    })
}
