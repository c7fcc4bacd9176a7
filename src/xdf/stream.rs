use ndarray::Array2;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use xmltree::{Element, XMLNode};

use crate::error::{ConvertError, Result};

/// Stream type that marks a discrete-event stream
pub const MARKER_STREAM_TYPE: &str = "Markers";

/// Value format of every channel in a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFormat {
    Float32,
    Double64,
    Int8,
    Int16,
    Int32,
    Int64,
    String,
}

impl ChannelFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "float32" => Some(Self::Float32),
            "double64" => Some(Self::Double64),
            "int8" => Some(Self::Int8),
            "int16" => Some(Self::Int16),
            "int32" => Some(Self::Int32),
            "int64" => Some(Self::Int64),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::String)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Double64 => "double64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ChannelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed text of the first child element called `name`; empty for `<name/>`
pub(crate) fn child_text(element: &Element, name: &str) -> Option<String> {
    element.get_child(name).map(|child| {
        child
            .get_text()
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    })
}

/// Child elements called `name`, in document order
pub(crate) fn child_elements<'a>(
    element: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}

/// Convert an XML element's content to JSON
///
/// Leaves become strings. Elements with children become objects; a child
/// name that repeats (e.g. `<channel>` inside `<channels>`) becomes an array
/// in document order.
pub(crate) fn element_to_json(element: &Element) -> Value {
    let children: Vec<&Element> = element.children.iter().filter_map(XMLNode::as_element).collect();
    if children.is_empty() {
        let text = element.get_text().map(|t| t.trim().to_string()).unwrap_or_default();
        return Value::String(text);
    }

    let mut result = Map::new();
    for child in &children {
        let value = element_to_json(child);
        let repeated = children.iter().filter(|c| c.name == child.name).nth(1).is_some();
        if !repeated {
            result.insert(child.name.clone(), value);
        } else if let Value::Array(items) = result
            .entry(child.name.clone())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            items.push(value);
        }
    }
    Value::Object(result)
}

/// Stream metadata declared in an XDF stream header
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub stream_id: u32,
    pub name: String,
    pub stream_type: String,
    pub channel_count: usize,
    pub nominal_srate: f64,
    pub channel_format: ChannelFormat,
    pub source_id: String,
    /// Full `<info>` element, including `<desc>`
    pub header: Element,
}

impl StreamInfo {
    pub fn from_header(stream_id: u32, header: Element) -> Result<Self> {
        let field = |name: &str| child_text(&header, name).unwrap_or_default();

        let channel_count = child_text(&header, "channel_count")
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| {
                ConvertError::Xdf(format!(
                    "Stream {} header has missing or invalid channel_count",
                    stream_id
                ))
            })?;

        let channel_format = child_text(&header, "channel_format")
            .as_deref()
            .and_then(ChannelFormat::parse)
            .ok_or_else(|| {
                ConvertError::Xdf(format!(
                    "Stream {} header has unsupported channel_format {:?}",
                    stream_id,
                    child_text(&header, "channel_format")
                ))
            })?;

        // Missing or unparsable rates count as irregular
        let nominal_srate = child_text(&header, "nominal_srate")
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(Self {
            stream_id,
            name: field("name"),
            stream_type: field("type"),
            channel_count,
            nominal_srate,
            channel_format,
            source_id: field("source_id"),
            header,
        })
    }

    /// The `<desc>` element, if the stream declares one
    pub fn desc(&self) -> Option<&Element> {
        self.header.get_child("desc")
    }

    pub fn is_irregular(&self) -> bool {
        self.nominal_srate == 0.0
    }

    /// Stream info as JSON for export metadata
    pub fn to_json(&self) -> Value {
        json!({
            "stream_id": self.stream_id,
            "name": self.name,
            "type": self.stream_type,
            "source_id": self.source_id,
            "channel_count": self.channel_count,
            "nominal_srate": self.nominal_srate,
            "channel_format": self.channel_format,
            "description": self.desc().map(element_to_json).unwrap_or_else(|| json!({})),
        })
    }
}

/// Decoded samples of one stream
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeries {
    /// `[samples × channels]`, every numeric format widened to f64
    Numeric(Array2<f64>),
    /// One row of channel values per sample
    String(Vec<Vec<String>>),
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        match self {
            TimeSeries::Numeric(data) => data.nrows(),
            TimeSeries::String(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stream of an XDF file
#[derive(Debug, Clone)]
pub struct Stream {
    pub info: StreamInfo,
    pub time_series: TimeSeries,
    pub time_stamps: Vec<f64>,
    /// Collection times of the clock offset measurements
    pub clock_times: Vec<f64>,
    /// Clock offsets measured at `clock_times`
    pub clock_values: Vec<f64>,
}

impl Stream {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn stream_type(&self) -> &str {
        &self.info.stream_type
    }

    pub fn len(&self) -> usize {
        self.time_stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_stamps.is_empty()
    }

    pub fn is_markers(&self) -> bool {
        self.info.stream_type == MARKER_STREAM_TYPE
    }

    /// Build a stream from one stream of a parsed XDF file
    ///
    /// Samples stored without a timestamp get `previous + 1 / nominal_srate`.
    /// Clock offsets come from the `<clock_offsets>` block of the footer.
    pub(crate) fn from_xdf(
        id: u32,
        header: &Element,
        samples: &[::xdf::Sample],
        footer: Option<&Element>,
    ) -> Result<Self> {
        let info = StreamInfo::from_header(id, header.clone())?;
        let channels = info.channel_count;
        let tdiff = if info.nominal_srate > 0.0 {
            1.0 / info.nominal_srate
        } else {
            0.0
        };

        let mut values: Vec<f64> = Vec::new();
        let mut strings: Vec<Vec<String>> = Vec::new();
        let mut time_stamps = Vec::with_capacity(samples.len());
        let mut last_timestamp = 0.0;

        for (index, sample) in samples.iter().enumerate() {
            let width = widen_values(&sample.values, info.channel_format, &mut values, &mut strings)
                .ok_or_else(|| {
                    ConvertError::Xdf(format!(
                        "Sample {} of stream '{}' does not match channel format {}",
                        index, info.name, info.channel_format
                    ))
                })?;
            if width != channels {
                return Err(ConvertError::Xdf(format!(
                    "Sample {} of stream '{}' has {} values for {} channels",
                    index, info.name, width, channels
                )));
            }

            let timestamp = sample.timestamp.unwrap_or(last_timestamp + tdiff);
            time_stamps.push(timestamp);
            last_timestamp = timestamp;
        }

        let time_series = if info.channel_format.is_numeric() {
            let rows = time_stamps.len();
            rows.checked_mul(channels)
                .filter(|&expected| expected == values.len())
                .ok_or_else(|| {
                    ConvertError::Xdf(format!(
                        "Stream '{}' has {} values for {} samples of {} channels",
                        info.name,
                        values.len(),
                        rows,
                        channels
                    ))
                })?;
            TimeSeries::Numeric(Array2::from_shape_vec((rows, channels), values)?)
        } else {
            TimeSeries::String(strings)
        };

        let (clock_times, clock_values) = footer
            .map(clock_offsets)
            .unwrap_or_default();

        Ok(Self {
            info,
            time_series,
            time_stamps,
            clock_times,
            clock_values,
        })
    }
}

macro_rules! widen {
    ($out:expr, $values:expr) => {{
        $out.extend($values.iter().map(|&v| v as f64));
        $values.len()
    }};
}

/// Append one sample's values and return how many there were
///
/// `None` when the decoded values do not match the declared format.
fn widen_values(
    sample: &::xdf::Values,
    format: ChannelFormat,
    values: &mut Vec<f64>,
    strings: &mut Vec<Vec<String>>,
) -> Option<usize> {
    use ::xdf::Values;

    let width = match (sample, format) {
        (Values::Float32(v), ChannelFormat::Float32) => widen!(values, v),
        (Values::Float64(v), ChannelFormat::Double64) => widen!(values, v),
        (Values::Int8(v), ChannelFormat::Int8) => widen!(values, v),
        (Values::Int16(v), ChannelFormat::Int16) => widen!(values, v),
        (Values::Int32(v), ChannelFormat::Int32) => widen!(values, v),
        (Values::Int64(v), ChannelFormat::Int64) => widen!(values, v),
        (Values::String(s), ChannelFormat::String) => {
            strings.push(vec![s.clone()]);
            1
        }
        _ => return None,
    };
    Some(width)
}

/// `(collection times, offset values)` listed in a stream footer
fn clock_offsets(footer: &Element) -> (Vec<f64>, Vec<f64>) {
    let mut times = Vec::new();
    let mut values = Vec::new();

    let Some(offsets) = footer.get_child("clock_offsets") else {
        return (times, values);
    };

    for offset in child_elements(offsets, "offset") {
        let time = child_text(offset, "time").and_then(|t| t.parse::<f64>().ok());
        let value = child_text(offset, "value").and_then(|v| v.parse::<f64>().ok());
        match (time, value) {
            (Some(time), Some(value)) => {
                times.push(time);
                values.push(value);
            }
            _ => tracing::warn!("Skipping unreadable clock offset entry in stream footer"),
        }
    }

    (times, values)
}
