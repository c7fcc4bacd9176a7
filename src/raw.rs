use ndarray::{Array2, ErrorKind, ShapeError};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::channels::ChannelInfo;
use crate::error::Result;

/// Measurement info of a continuous recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub ch_names: Vec<String>,
    pub ch_types: Vec<String>,
    pub ch_units: Vec<String>,
    /// Sampling rate in Hz
    pub sfreq: f64,
}

impl Info {
    pub fn new(channels: ChannelInfo, sfreq: f64) -> Self {
        Self {
            ch_names: channels.labels,
            ch_types: channels.types,
            ch_units: channels.units,
            sfreq,
        }
    }

    pub fn nchan(&self) -> usize {
        self.ch_names.len()
    }
}

/// A time-stamped annotation on a continuous recording
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Seconds from the first sample
    pub onset: f64,
    pub duration: f64,
    pub description: String,
}

/// A discrete event: `[sample, previous, code]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub sample: usize,
    pub previous: i64,
    pub code: i64,
}

impl Event {
    pub fn new(sample: usize, code: i64) -> Self {
        Self {
            sample,
            previous: 0,
            code,
        }
    }
}

/// Continuous multichannel recording held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct RawArray {
    info: Info,
    /// `[channels × samples]`
    data: Array2<f64>,
    annotations: Vec<Annotation>,
}

impl RawArray {
    /// Wrap a `[channels × samples]` matrix; the row count must match the info
    pub fn new(data: Array2<f64>, info: Info) -> Result<Self> {
        if data.nrows() != info.nchan() {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }

        Ok(Self {
            info,
            data,
            annotations: Vec::new(),
        })
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Sample times in seconds from the first sample
    pub fn times(&self) -> Vec<f64> {
        (0..self.n_times())
            .map(|i| i as f64 / self.info.sfreq)
            .collect()
    }

    /// Length of the recording in seconds
    pub fn duration(&self) -> f64 {
        self.n_times() as f64 / self.info.sfreq
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Replace the annotations, ordered by onset
    ///
    /// Annotations outside the data span are kept but reported.
    pub fn set_annotations(&mut self, mut annotations: Vec<Annotation>) {
        annotations.sort_by(|a, b| a.onset.total_cmp(&b.onset));

        let duration = self.duration();
        let outside = annotations
            .iter()
            .filter(|a| a.onset < 0.0 || a.onset > duration)
            .count();
        if outside > 0 {
            tracing::warn!(
                "{} of {} annotation(s) fall outside the data range [0, {:.3}] s",
                outside,
                annotations.len(),
                duration
            );
        }

        self.annotations = annotations;
    }

    /// Turn annotations into events
    ///
    /// Each distinct description gets an id, `1..=n` in lexical order of the
    /// descriptions. The sample index is `round(onset * sfreq)`; annotations
    /// that do not land on a sample of the recording are skipped.
    pub fn events_from_annotations(&self) -> (Vec<Event>, BTreeMap<String, i64>) {
        let mut event_id: BTreeMap<String, i64> = self
            .annotations
            .iter()
            .map(|a| (a.description.clone(), 0))
            .collect();
        for (id, value) in event_id.values_mut().enumerate() {
            *value = id as i64 + 1;
        }

        let mut skipped = 0;
        let mut events = Vec::with_capacity(self.annotations.len());
        for annotation in &self.annotations {
            let sample = (annotation.onset * self.info.sfreq).round();
            if !(sample >= 0.0 && sample < self.n_times() as f64) {
                skipped += 1;
                continue;
            }
            events.push(Event::new(sample as usize, event_id[&annotation.description]));
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} annotation(s) outside the recording", skipped);
        }

        (events, event_id)
    }
}
