use serde::Serialize;
use std::path::Path;

use crate::error::{ConvertError, Result};
use crate::xdf::{self, Stream};

/// Name and type of one stream in a recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamName {
    pub name: String,
    #[serde(rename = "type")]
    pub stream_type: String,
}

/// Find the stream whose name matches `name` exactly
///
/// The match is case-sensitive. A name shared by more than one stream is
/// reported as ambiguous instead of silently picking one of them.
pub fn find_reference<'a>(streams: &'a [Stream], name: &str) -> Result<&'a Stream> {
    let mut matches = streams.iter().filter(|s| s.name() == name);

    let reference = matches.next().ok_or_else(|| ConvertError::ReferenceNotFound {
        name: name.to_string(),
        available: streams.iter().map(|s| s.name().to_string()).collect(),
    })?;

    let extra = matches.count();
    if extra > 0 {
        return Err(ConvertError::AmbiguousReference {
            name: name.to_string(),
            count: extra + 1,
        });
    }

    Ok(reference)
}

/// All streams of type `Markers`, or `None` when the recording has none
pub fn marker_streams(streams: &[Stream]) -> Option<Vec<&Stream>> {
    let markers: Vec<&Stream> = streams.iter().filter(|s| s.is_markers()).collect();
    if markers.is_empty() { None } else { Some(markers) }
}

/// `(name, type)` of every stream, in file order
pub fn stream_names(streams: &[Stream]) -> Vec<StreamName> {
    streams
        .iter()
        .map(|s| StreamName {
            name: s.name().to_string(),
            stream_type: s.stream_type().to_string(),
        })
        .collect()
}

/// Load a file and list the `(name, type)` of its streams
pub fn get_name_streams(path: impl AsRef<Path>) -> Result<Vec<StreamName>> {
    let file = xdf::load_xdf(path)?;
    Ok(stream_names(&file.streams))
}
