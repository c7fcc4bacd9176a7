pub mod writer;

use anyhow::Result;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use zarrs::array::codec::{BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode};
use zarrs::filesystem::FilesystemStore;
use zarrs::group::GroupBuilder;
use zarrs::storage::{ReadableStorageTraits, StoreKey};

use crate::convert::{Conversion, ConvertOptions};
use crate::xdf::StreamInfo;
use writer::ConversionWriter;

/// Open a Zarr store, creating the directory and root group if needed
pub fn open_or_create_zarr_store(store_path: &Path) -> Result<Arc<FilesystemStore>> {
    std::fs::create_dir_all(store_path)?;
    let store = Arc::new(FilesystemStore::new(store_path)?);

    if !group_exists(&store, "/")? {
        let root_group = GroupBuilder::new().build(store.clone(), "/")?;
        root_group.store_metadata()?;
    }

    Ok(store)
}

/// Write a conversion result to `<store>/<reference name>/`
///
/// Layout:
///
/// ```text
/// <store>/
/// └── <reference>/
///     ├── data     [C × N] float64 (channels × samples)
///     ├── time     [N] float64 (seconds from first sample)
///     ├── events   [E × 3] int64 (sample, previous, code), precise alignment only
///     └── zarr.json  (channel info, sfreq, annotations, conversion config)
/// ```
///
/// Refuses to overwrite a group that already exists.
pub fn write_conversion(
    store_path: &Path,
    conversion: &Conversion,
    options: &ConvertOptions,
    stream_info: Option<&StreamInfo>,
) -> Result<()> {
    let store = open_or_create_zarr_store(store_path)?;
    let group_path = format!("/{}", options.reference);

    if group_exists(&store, &group_path)? {
        anyhow::bail!(
            "Group '{}' already exists in {}; remove it before exporting again",
            group_path,
            store_path.display()
        );
    }

    let group = GroupBuilder::new().build(store.clone(), &group_path)?;
    group.store_metadata()?;

    let raw = conversion.raw();
    let writer = ConversionWriter::new(store.clone(), group_path.clone());
    writer.write_data(raw.data())?;
    writer.write_time(&raw.times())?;
    if let Some(events) = conversion.events() {
        writer.write_events(events)?;
    }

    let mut attrs = serde_json::Map::new();
    attrs.insert("ch_names".to_string(), json!(raw.info().ch_names));
    attrs.insert("ch_types".to_string(), json!(raw.info().ch_types));
    attrs.insert("ch_units".to_string(), json!(raw.info().ch_units));
    attrs.insert("sfreq".to_string(), json!(raw.info().sfreq));
    attrs.insert("annotations".to_string(), serde_json::to_value(raw.annotations())?);
    if !raw.annotations().is_empty() {
        let (_, event_id) = raw.events_from_annotations();
        attrs.insert("event_id".to_string(), json!(event_id));
    }
    if let Some(info) = stream_info {
        attrs.insert("stream_info".to_string(), info.to_json());
    }
    attrs.insert("conversion_config".to_string(), options.to_config_json());
    attrs.insert("exported_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
    writer.write_attributes(attrs)?;

    tracing::info!(
        "Exported '{}' ({} channels, {} samples) to {}",
        options.reference,
        raw.n_channels(),
        raw.n_times(),
        store_path.display()
    );

    Ok(())
}

/// Blosc LZ4 codec with bit-shuffling for fixed-size numeric values
pub(crate) fn blosc_codec(typesize: usize) -> Result<Arc<BloscCodec>> {
    let compression_level = BloscCompressionLevel::try_from(5u8)
        .map_err(|e| anyhow::anyhow!("Invalid compression level: {}", e))?;
    Ok(Arc::new(BloscCodec::new(
        BloscCompressor::LZ4,
        compression_level,
        None, // blocksize (auto-detect)
        BloscShuffleMode::BitShuffle,
        Some(typesize),
    )?))
}

/// Check if a Zarr group exists (Zarr v3 uses zarr.json with node_type)
fn group_exists(store: &Arc<FilesystemStore>, path: &str) -> Result<bool> {
    let trimmed_path = path.trim_end_matches('/').trim_start_matches('/');
    let metadata_path = if trimmed_path.is_empty() {
        "zarr.json".to_string()
    } else {
        format!("{}/zarr.json", trimmed_path)
    };
    let metadata_key = StoreKey::new(&metadata_path)?;

    match store.get(&metadata_key) {
        Ok(Some(data)) => {
            let json: serde_json::Value = serde_json::from_slice(&data)?;
            Ok(json.get("node_type").and_then(|v| v.as_str()) == Some("group"))
        }
        _ => Ok(false),
    }
}

/// Read attributes from a group's zarr.json file (Zarr v3 format)
pub fn read_group_attributes(store: &Arc<FilesystemStore>, path: &str) -> Result<serde_json::Value> {
    let trimmed_path = path.trim_end_matches('/').trim_start_matches('/');
    let zarr_json_path = if trimmed_path.is_empty() {
        "zarr.json".to_string()
    } else {
        format!("{}/zarr.json", trimmed_path)
    };
    let zarr_key = StoreKey::new(&zarr_json_path)?;
    let zarr_bytes = store
        .get(&zarr_key)?
        .ok_or_else(|| anyhow::anyhow!("Metadata not found at {}", zarr_json_path))?;
    let zarr_metadata: serde_json::Value = serde_json::from_slice(&zarr_bytes)?;

    Ok(zarr_metadata
        .get("attributes")
        .cloned()
        .unwrap_or_else(|| json!({})))
}
