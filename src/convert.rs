use serde_json::json;
use std::path::Path;

use crate::align::{self, AlignPolicy, Alignment};
use crate::channels::ChannelInfo;
use crate::error::{ConvertError, Result};
use crate::raw::{Annotation, Event, Info, RawArray};
use crate::select;
use crate::xdf::{self, LoadOptions, Stream, TimeSeries};

/// Default reference stream name used by the command-line driver
pub const DEFAULT_REFERENCE: &str = "BrainAmpSeries";

/// Configuration for one conversion
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Name of the stream that provides the time reference and the data
    pub reference: String,
    /// Align markers to the nearest reference sample instead of a constant offset
    pub precise: bool,
    pub load: LoadOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE.to_string(),
            precise: false,
            load: LoadOptions::default(),
        }
    }
}

impl ConvertOptions {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn precise(mut self, precise: bool) -> Self {
        self.precise = precise;
        self
    }

    pub fn policy(&self) -> AlignPolicy {
        AlignPolicy::from_precise(self.precise)
    }

    /// Serialize the effective configuration for export metadata
    pub fn to_config_json(&self) -> serde_json::Value {
        json!({
            "reference": self.reference,
            "precise": self.precise,
            "align_policy": self.policy(),
            "synchronize_clocks": self.load.synchronize_clocks,
            "dejitter_timestamps": self.load.dejitter_timestamps,
            "jitter_break_threshold_seconds": self.load.jitter_break_threshold_seconds,
            "jitter_break_threshold_samples": self.load.jitter_break_threshold_samples,
            "converter_version": env!("CARGO_PKG_VERSION"),
        })
    }
}

/// Outcome of a conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// No marker stream in the recording
    Raw(RawArray),
    /// One marker stream, aligned by offset from the first reference sample
    Annotated(RawArray),
    /// One marker stream, aligned to the nearest reference sample
    WithEvents { raw: RawArray, events: Vec<Event> },
}

impl Conversion {
    pub fn raw(&self) -> &RawArray {
        match self {
            Conversion::Raw(raw) | Conversion::Annotated(raw) => raw,
            Conversion::WithEvents { raw, .. } => raw,
        }
    }

    /// Aligned events of the precise path
    pub fn events(&self) -> Option<&[Event]> {
        match self {
            Conversion::WithEvents { events, .. } => Some(events),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (RawArray, Option<Vec<Event>>) {
        match self {
            Conversion::Raw(raw) | Conversion::Annotated(raw) => (raw, None),
            Conversion::WithEvents { raw, events } => (raw, Some(events)),
        }
    }
}

/// Load an XDF file and convert it around the reference stream
pub fn read_raw_xdf(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Conversion> {
    let file = xdf::load_xdf_with(path, &options.load)?;
    convert_streams(&file.streams, options)
}

/// Convert already loaded streams around the reference stream
pub fn convert_streams(streams: &[Stream], options: &ConvertOptions) -> Result<Conversion> {
    let reference = select::find_reference(streams, &options.reference)?;
    let markers = select::marker_streams(streams);

    if let Some(markers) = &markers
        && markers.len() > 1
    {
        return Err(ConvertError::MultipleMarkerStreams {
            count: markers.len(),
        });
    }

    let mut raw = build_raw(reference)?;
    tracing::info!(
        "Reference '{}': {} channels, {} samples at {} Hz",
        reference.name(),
        raw.n_channels(),
        raw.n_times(),
        raw.info().sfreq
    );

    let Some(marker) = markers.and_then(|m| m.into_iter().next()) else {
        tracing::info!("No marker stream found");
        return Ok(Conversion::Raw(raw));
    };

    let codes = marker_codes(marker)?;
    let alignment = align::align(options.policy(), &reference.time_stamps, &marker.time_stamps)
        .ok_or_else(|| ConvertError::EmptyReferenceStream(reference.name().to_string()))?;

    tracing::info!(
        "Aligned {} marker(s) from '{}' ({:?})",
        codes.len(),
        marker.name(),
        options.policy()
    );

    match alignment {
        Alignment::Onsets(onsets) => {
            let annotations = onsets
                .into_iter()
                .zip(&codes)
                .map(|(onset, code)| Annotation {
                    onset,
                    duration: 0.0,
                    description: code.to_string(),
                })
                .collect();
            raw.set_annotations(annotations);
            Ok(Conversion::Annotated(raw))
        }
        Alignment::Indices(indices) => {
            let events = indices
                .into_iter()
                .zip(&codes)
                .map(|(sample, &code)| Event::new(sample, code))
                .collect();
            Ok(Conversion::WithEvents { raw, events })
        }
    }
}

/// Build the continuous recording from the reference stream
fn build_raw(stream: &Stream) -> Result<RawArray> {
    let sfreq = stream.info.nominal_srate;
    if !(sfreq.is_finite() && sfreq > 0.0) {
        return Err(ConvertError::InvalidSampleRate {
            name: stream.name().to_string(),
            rate: sfreq,
        });
    }

    let samples = match &stream.time_series {
        TimeSeries::Numeric(samples) => samples,
        TimeSeries::String(_) => {
            return Err(ConvertError::NonNumericReference {
                name: stream.name().to_string(),
                format: stream.info.channel_format.to_string(),
            });
        }
    };

    let channels = ChannelInfo::from_stream(stream)?;
    RawArray::new(samples.t().to_owned(), Info::new(channels, sfreq))
}

/// Integer code of every marker sample, taken from its first channel
///
/// Numeric values are truncated toward zero; string values are trimmed and
/// parsed.
pub fn marker_codes(stream: &Stream) -> Result<Vec<i64>> {
    match &stream.time_series {
        TimeSeries::Numeric(samples) => samples
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, row)| match row.first() {
                Some(&value) if value.is_finite() => Ok(value.trunc() as i64),
                other => Err(ConvertError::InvalidMarker {
                    index,
                    value: other.map(f64::to_string).unwrap_or_default(),
                }),
            })
            .collect(),
        TimeSeries::String(rows) => rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let value = row.first().map(String::as_str).unwrap_or("");
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ConvertError::InvalidMarker {
                        index,
                        value: value.to_string(),
                    })
            })
            .collect(),
    }
}
