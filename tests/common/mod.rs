#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lsl_xdf_toolbox::convert::ConvertOptions;
use lsl_xdf_toolbox::xdf::LoadOptions;

/// Per-stream bookkeeping for the footer written at the end of the file
#[derive(Default)]
struct FooterStats {
    first: Option<f64>,
    last: Option<f64>,
    count: usize,
    clock_offsets: Vec<(f64, f64)>,
}

/// Writes synthetic XDF files for tests
///
/// Every declared stream gets a footer chunk (first/last timestamp, sample
/// count, clock offsets) when the bytes are taken, the way recorders close a
/// file.
pub struct XdfBuilder {
    bytes: Vec<u8>,
    footers: BTreeMap<u32, FooterStats>,
}

impl XdfBuilder {
    pub fn new() -> Self {
        let mut builder = Self::bare();
        builder.chunk(
            1,
            br#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?><info><version>1.0</version></info>"#,
        );
        builder
    }

    /// Magic only, no file header
    pub fn bare() -> Self {
        Self {
            bytes: b"XDF:".to_vec(),
            footers: BTreeMap::new(),
        }
    }

    fn chunk(&mut self, tag: u16, content: &[u8]) {
        let length = (content.len() + 2) as u32;
        self.bytes.push(4);
        self.bytes.extend_from_slice(&length.to_le_bytes());
        self.bytes.extend_from_slice(&tag.to_le_bytes());
        self.bytes.extend_from_slice(content);
    }

    fn record_samples(&mut self, stream_id: u32, timestamps: impl IntoIterator<Item = Option<f64>>) {
        let stats = self.footers.entry(stream_id).or_default();
        for ts in timestamps {
            stats.count += 1;
            if let Some(ts) = ts {
                stats.first.get_or_insert(ts);
                stats.last = Some(ts);
            }
        }
    }

    pub fn stream_header(mut self, stream_id: u32, xml: &str) -> Self {
        let mut content = stream_id.to_le_bytes().to_vec();
        content.extend_from_slice(xml.as_bytes());
        self.chunk(2, &content);
        self.footers.entry(stream_id).or_default();
        self
    }

    /// A clock offset chunk, also listed in the stream's footer
    pub fn clock_offset(mut self, stream_id: u32, collection_time: f64, offset_value: f64) -> Self {
        let mut content = stream_id.to_le_bytes().to_vec();
        content.extend_from_slice(&collection_time.to_le_bytes());
        content.extend_from_slice(&offset_value.to_le_bytes());
        self.chunk(4, &content);
        self.footers
            .entry(stream_id)
            .or_default()
            .clock_offsets
            .push((collection_time, offset_value));
        self
    }

    pub fn boundary(mut self) -> Self {
        self.chunk(
            5,
            &[
                0x43, 0xA5, 0x46, 0xDC, 0xCB, 0xF5, 0x41, 0x0F, 0xB3, 0x0E, 0xD5, 0x46, 0x73, 0x83,
                0xCB, 0xE4,
            ],
        );
        self
    }

    /// float32 samples; `None` timestamps are left for the reader to deduce
    pub fn samples_f32(mut self, stream_id: u32, timestamps: &[Option<f64>], rows: &[Vec<f32>]) -> Self {
        let mut content = samples_prefix(stream_id, rows.len());
        for (ts, row) in timestamps.iter().zip(rows) {
            push_timestamp(&mut content, *ts);
            for value in row {
                content.extend_from_slice(&value.to_le_bytes());
            }
        }
        self.chunk(3, &content);
        self.record_samples(stream_id, timestamps.iter().copied().take(rows.len()));
        self
    }

    pub fn samples_i16(mut self, stream_id: u32, timestamps: &[f64], rows: &[Vec<i16>]) -> Self {
        let mut content = samples_prefix(stream_id, rows.len());
        for (ts, row) in timestamps.iter().zip(rows) {
            push_timestamp(&mut content, Some(*ts));
            for value in row {
                content.extend_from_slice(&value.to_le_bytes());
            }
        }
        self.chunk(3, &content);
        self.record_samples(stream_id, timestamps.iter().copied().map(Some).take(rows.len()));
        self
    }

    pub fn samples_i32(mut self, stream_id: u32, timestamps: &[f64], rows: &[Vec<i32>]) -> Self {
        let mut content = samples_prefix(stream_id, rows.len());
        for (ts, row) in timestamps.iter().zip(rows) {
            push_timestamp(&mut content, Some(*ts));
            for value in row {
                content.extend_from_slice(&value.to_le_bytes());
            }
        }
        self.chunk(3, &content);
        self.record_samples(stream_id, timestamps.iter().copied().map(Some).take(rows.len()));
        self
    }

    /// Single-channel string samples
    pub fn samples_string(mut self, stream_id: u32, timestamps: &[f64], values: &[&str]) -> Self {
        let mut content = samples_prefix(stream_id, values.len());
        for (ts, value) in timestamps.iter().zip(values) {
            push_timestamp(&mut content, Some(*ts));
            content.push(4);
            content.extend_from_slice(&(value.len() as u32).to_le_bytes());
            content.extend_from_slice(value.as_bytes());
        }
        self.chunk(3, &content);
        self.record_samples(stream_id, timestamps.iter().copied().map(Some).take(values.len()));
        self
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        let footers = std::mem::take(&mut self.footers);
        for (stream_id, stats) in footers {
            let mut content = stream_id.to_le_bytes().to_vec();
            content.extend_from_slice(footer_xml(&stats).as_bytes());
            self.chunk(6, &content);
        }
        self.bytes
    }

    pub fn write(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.into_bytes()).expect("write test XDF file");
        path
    }
}

fn footer_xml(stats: &FooterStats) -> String {
    let offsets: String = stats
        .clock_offsets
        .iter()
        .map(|(time, value)| format!("<offset><time>{}</time><value>{}</value></offset>", time, value))
        .collect();

    format!(
        r#"<?xml version="1.0"?>
<info>
  <first_timestamp>{}</first_timestamp>
  <last_timestamp>{}</last_timestamp>
  <sample_count>{}</sample_count>
  <clock_offsets>{}</clock_offsets>
</info>"#,
        stats.first.unwrap_or(0.0),
        stats.last.unwrap_or(0.0),
        stats.count,
        offsets
    )
}

fn samples_prefix(stream_id: u32, count: usize) -> Vec<u8> {
    let mut content = stream_id.to_le_bytes().to_vec();
    content.push(4);
    content.extend_from_slice(&(count as u32).to_le_bytes());
    content
}

fn push_timestamp(content: &mut Vec<u8>, ts: Option<f64>) {
    match ts {
        Some(ts) => {
            content.push(8);
            content.extend_from_slice(&ts.to_le_bytes());
        }
        None => content.push(0),
    }
}

/// Stream header XML in the layout LSL writes
pub fn stream_xml(
    name: &str,
    stream_type: &str,
    srate: f64,
    format: &str,
    channel_count: usize,
    channels: &[(&str, &str, &str)],
) -> String {
    let mut desc = String::new();
    if !channels.is_empty() {
        desc.push_str("<channels>");
        for (label, ch_type, unit) in channels {
            desc.push_str(&format!(
                "<channel><label>{}</label><type>{}</type><unit>{}</unit></channel>",
                label, ch_type, unit
            ));
        }
        desc.push_str("</channels>");
    }

    format!(
        r#"<?xml version="1.0"?>
<info>
  <name>{name}</name>
  <type>{stream_type}</type>
  <channel_count>{channel_count}</channel_count>
  <nominal_srate>{srate}</nominal_srate>
  <channel_format>{format}</channel_format>
  <source_id>{name}_source</source_id>
  <created_at>1000.0</created_at>
  <desc>{desc}</desc>
</info>"#
    )
}

pub fn eeg_xml(name: &str, srate: f64) -> String {
    stream_xml(
        name,
        "EEG",
        srate,
        "float32",
        2,
        &[("Fp1", "EEG", "uV"), ("Fp2", "EEG", "uV")],
    )
}

pub fn marker_xml(name: &str, format: &str) -> String {
    stream_xml(name, "Markers", 0.0, format, 1, &[])
}

/// Options without timestamp post-processing, so timestamps stay exactly as written
pub fn exact_options(reference: &str, precise: bool) -> ConvertOptions {
    ConvertOptions {
        reference: reference.to_string(),
        precise,
        load: LoadOptions {
            synchronize_clocks: false,
            dejitter_timestamps: false,
            ..LoadOptions::default()
        },
    }
}

/// Two-channel EEG rows with recognisable values: `[i, -i]`
pub fn eeg_rows(n: usize) -> Vec<Vec<f32>> {
    (0..n).map(|i| vec![i as f32, -(i as f32)]).collect()
}

/// The worked example: reference at 10 Hz `[0.0, 0.1, 0.2, 0.3]`, one marker `7` at 0.25 s
pub fn example_recording(dir: &Path) -> PathBuf {
    XdfBuilder::new()
        .stream_header(1, &eeg_xml("BrainAmpSeries", 10.0))
        .stream_header(2, &marker_xml("Triggers", "int32"))
        .samples_f32(
            1,
            &[Some(0.0), Some(0.1), Some(0.2), Some(0.3)],
            &eeg_rows(4),
        )
        .samples_i32(2, &[0.25], &[vec![7]])
        .write(dir, "example.xdf")
}
