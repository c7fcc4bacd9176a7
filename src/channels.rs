use serde::Serialize;
use xmltree::Element;

use crate::error::{ConvertError, Result};
use crate::xdf::{Stream, child_elements, child_text};

/// Per-channel metadata flattened into parallel vectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub labels: Vec<String>,
    /// Lowercased channel types (`"EEG"` becomes `"eeg"`)
    pub types: Vec<String>,
    pub units: Vec<String>,
}

impl ChannelInfo {
    /// Extract channel metadata from `<desc><channels><channel>...` of a stream
    ///
    /// The descriptor count must equal the declared channel count, and every
    /// descriptor must carry `label`, `type` and `unit`.
    pub fn from_stream(stream: &Stream) -> Result<Self> {
        let malformed = |reason: String| ConvertError::MalformedDescriptor {
            stream: stream.name().to_string(),
            reason,
        };

        let channels = stream
            .info
            .desc()
            .and_then(|desc| desc.get_child("channels"))
            .ok_or_else(|| malformed("missing <desc><channels> block".to_string()))?;

        let info = Self::from_descriptors(child_elements(channels, "channel"))
            .map_err(&malformed)?;

        if info.len() != stream.info.channel_count {
            return Err(malformed(format!(
                "{} channel descriptors for {} declared channels",
                info.len(),
                stream.info.channel_count
            )));
        }

        Ok(info)
    }

    /// Flatten a sequence of `<channel>` elements, in order
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a Element>,
    ) -> std::result::Result<Self, String> {
        let mut info = Self::default();

        for (index, channel) in descriptors.into_iter().enumerate() {
            let field = |name: &str| {
                child_text(channel, name).ok_or_else(|| format!("channel {} has no <{}>", index, name))
            };

            info.labels.push(field("label")?);
            info.types.push(field("type")?.to_lowercase());
            info.units.push(field("unit")?);
        }

        Ok(info)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
