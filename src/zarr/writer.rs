use anyhow::Result;
use ndarray::{Array1, Array2, Ix1, Ix2};
use std::sync::Arc;
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::filesystem::FilesystemStore;

use super::blosc_codec;
use crate::raw::Event;

/// Chunk length along the sample axis
const SAMPLE_CHUNK: u64 = 1000;

/// Writes the arrays and attributes of one converted recording group
pub struct ConversionWriter {
    store: Arc<FilesystemStore>,
    group_path: String,
}

impl ConversionWriter {
    pub fn new(store: Arc<FilesystemStore>, group_path: String) -> Self {
        Self { store, group_path }
    }

    /// Write the `[channels × samples]` data matrix to `<group>/data`
    pub fn write_data(&self, data: &Array2<f64>) -> Result<()> {
        let (channels, samples) = data.dim();
        let data_path = format!("{}/data", self.group_path);

        let array = ArrayBuilder::new(
            vec![channels as u64, samples as u64],
            vec![(channels as u64).max(1), chunk_len(samples)],
            DataType::Float64,
            FillValue::from(0.0f64),
        )
        .dimension_names(Some(vec![
            Some("channels".to_string()),
            Some("samples".to_string()),
        ]))
        .bytes_to_bytes_codecs(vec![blosc_codec(8)?])
        .build(self.store.clone(), &data_path)?;

        array.store_metadata()?;
        if channels > 0 && samples > 0 {
            array.store_array_subset_ndarray::<f64, Ix2>(&[0, 0], data.to_owned())?;
        }

        tracing::debug!("Wrote {} ({} × {})", data_path, channels, samples);
        Ok(())
    }

    /// Write sample times (seconds from first sample) to `<group>/time`
    pub fn write_time(&self, times: &[f64]) -> Result<()> {
        let time_path = format!("{}/time", self.group_path);

        let array = ArrayBuilder::new(
            vec![times.len() as u64],
            vec![chunk_len(times.len())],
            DataType::Float64,
            FillValue::from(0.0f64),
        )
        .dimension_names(Some(vec![Some("samples".to_string())]))
        .bytes_to_bytes_codecs(vec![blosc_codec(8)?])
        .build(self.store.clone(), &time_path)?;

        array.store_metadata()?;
        if !times.is_empty() {
            array.store_array_subset_ndarray::<f64, Ix1>(&[0], Array1::from(times.to_vec()))?;
        }

        Ok(())
    }

    /// Write aligned events as `[E × 3]` rows of (sample, previous, code)
    pub fn write_events(&self, events: &[Event]) -> Result<()> {
        let events_path = format!("{}/events", self.group_path);

        let flat: Vec<i64> = events
            .iter()
            .flat_map(|e| [e.sample as i64, e.previous, e.code])
            .collect();
        let table = Array2::<i64>::from_shape_vec((events.len(), 3), flat)?;

        let array = ArrayBuilder::new(
            vec![events.len() as u64, 3],
            vec![chunk_len(events.len()), 3],
            DataType::Int64,
            FillValue::from(0i64),
        )
        .dimension_names(Some(vec![
            Some("events".to_string()),
            Some("fields".to_string()),
        ]))
        .build(self.store.clone(), &events_path)?;

        array.store_metadata()?;
        if !events.is_empty() {
            array.store_array_subset_ndarray::<i64, Ix2>(&[0, 0], table)?;
        }

        tracing::debug!("Wrote {} event(s) to {}", events.len(), events_path);
        Ok(())
    }

    /// Merge attributes into the group's zarr.json
    pub fn write_attributes(&self, attrs: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        let mut group = zarrs::group::Group::open(self.store.clone(), &self.group_path)?;
        group.attributes_mut().extend(attrs);
        group.store_metadata()?;
        Ok(())
    }
}

fn chunk_len(len: usize) -> u64 {
    (len as u64).clamp(1, SAMPLE_CHUNK)
}
