//! Decoding of `pw-dump` output.
//!
//! `pw-dump --monitor` prints the whole graph as one JSON array, then one
//! array per batch of updates. Updated objects are printed in full; removed
//! globals are printed as `{ "id": N, "info": null }`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::volume::VolumeReading;

pub const NODE_TYPE: &str = "PipeWire:Interface:Node";
pub const METADATA_TYPE: &str = "PipeWire:Interface:Metadata";

#[derive(Debug, PartialEq)]
pub enum DumpObject {
    Node { id: u32, info: NodeInfo },
    Metadata { id: u32, name: Option<String>, entries: Vec<MetadataEntry> },
    Removed(u32),
    Other(u32),
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub props: HashMap<String, Value>,
    #[serde(default)]
    pub params: Option<NodeParams>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct NodeParams {
    #[serde(rename = "Props", default)]
    pub props: Vec<PropsParam>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropsParam {
    pub volume: Option<f64>,
    pub mute: Option<bool>,
    pub channel_volumes: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetadataEntry {
    pub subject: u32,
    pub key: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl PropsParam {
    /// Mean of the channel volumes, like WirePlumber's mixer, falling back to
    /// the scalar `volume`.
    pub fn reading(&self) -> Option<VolumeReading> {
        let volume = match self.channel_volumes.as_deref() {
            Some(channels) if !channels.is_empty() => {
                channels.iter().sum::<f64>() / channels.len() as f64
            }
            _ => self.volume?,
        };
        Some(VolumeReading { volume, muted: self.mute.unwrap_or(false) })
    }
}

impl NodeInfo {
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// `None` when the node publishes no params at all; `Some(None)` when it
    /// does but has no volume control.
    pub fn reading(&self) -> Option<Option<VolumeReading>> {
        let params = self.params.as_ref()?;
        Some(params.props.iter().find_map(PropsParam::reading))
    }
}

impl MetadataEntry {
    /// Node name stored in a `Spa:String:JSON` value such as
    /// `{ "name": "alsa_output.pci-0000_00_1f.3.analog-stereo" }`. Older
    /// dumps carry the JSON as a string.
    pub fn node_name(&self) -> Option<String> {
        match &self.value {
            Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_owned),
            Value::String(raw) => serde_json::from_str::<Value>(raw)
                .ok()
                .and_then(|v| v.get("name").and_then(Value::as_str).map(str::to_owned)),
            _ => None,
        }
    }
}

impl DumpObject {
    fn from_value(value: Value) -> Option<Self> {
        let id = u32::try_from(value.get("id").and_then(Value::as_u64)?).ok()?;
        let kind = value.get("type").and_then(Value::as_str);

        match kind {
            None if value.get("info").map_or(false, Value::is_null) => Some(DumpObject::Removed(id)),
            Some(NODE_TYPE) => {
                let info = match value.get("info") {
                    Some(info) if !info.is_null() => match NodeInfo::deserialize(info) {
                        Ok(info) => info,
                        Err(e) => {
                            tracing::warn!("Ignoring node {} with unreadable info: {}", id, e);
                            return Some(DumpObject::Other(id));
                        }
                    },
                    _ => NodeInfo::default(),
                };
                Some(DumpObject::Node { id, info })
            }
            Some(METADATA_TYPE) => {
                let name = value
                    .get("props")
                    .and_then(|p| p.get("metadata.name"))
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                let entries = value
                    .get("metadata")
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(|e| MetadataEntry::deserialize(e).ok())
                            .collect()
                    })
                    .unwrap_or_default();
                Some(DumpObject::Metadata { id, name, entries })
            }
            _ => Some(DumpObject::Other(id)),
        }
    }
}

pub fn parse_batch(text: &str) -> Result<Vec<DumpObject>, serde_json::Error> {
    let raw: Vec<Value> = serde_json::from_str(text)?;
    Ok(raw.into_iter().filter_map(DumpObject::from_value).collect())
}

/// Splits the monitor stream into top-level arrays. A batch ends at a line
/// that closes the outer array, which `pw-dump` never indents.
pub struct DumpReader<R> {
    inner: R,
    line: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> DumpReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: Vec::new() }
    }

    /// Next complete batch, or `None` at end of stream. A trailing partial
    /// batch is discarded. PipeWire does not validate strings, so invalid
    /// UTF-8 is replaced rather than rejected.
    pub async fn next_batch(&mut self) -> std::io::Result<Option<String>> {
        let mut batch = String::new();
        loop {
            self.line.clear();
            if self.inner.read_until(b'\n', &mut self.line).await? == 0 {
                if !batch.trim().is_empty() {
                    tracing::warn!("Graph dump ended mid-batch, dropping {} bytes", batch.len());
                }
                return Ok(None);
            }
            let line = String::from_utf8_lossy(&self.line);
            if batch.is_empty() && line.trim().is_empty() {
                continue;
            }
            batch.push_str(&line);

            let closes_outer = !line.starts_with(char::is_whitespace) && line.trim_end().ends_with(']');
            if closes_outer {
                return Ok(Some(batch));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: &str = r#"[
  {
    "id": 57,
    "type": "PipeWire:Interface:Node",
    "version": 3,
    "info": {
      "props": {
        "media.class": "Audio/Sink",
        "node.name": "alsa_output.pci-0000_00_1f.3.analog-stereo",
        "node.description": "Built-in Audio Analog Stereo"
      },
      "params": {
        "Props": [
          { "volume": 1.0, "mute": false, "channelVolumes": [ 0.25, 0.75 ] },
          { "params": [ ] }
        ]
      }
    }
  }
]
"#;

    #[test]
    fn test_parse_node() {
        let objects = parse_batch(NODE).unwrap();
        assert_eq!(objects.len(), 1);
        let DumpObject::Node { id, info } = &objects[0] else {
            panic!("expected node, got {:?}", objects[0]);
        };
        assert_eq!(*id, 57);
        assert_eq!(info.prop_str("media.class"), Some("Audio/Sink"));
        assert_eq!(info.reading(), Some(Some(VolumeReading::new(0.5))));
    }

    #[test]
    fn test_parse_metadata_and_removal() {
        let text = r#"[
  {
    "id": 40,
    "type": "PipeWire:Interface:Metadata",
    "props": { "metadata.name": "default" },
    "metadata": [
      { "subject": 0, "key": "default.audio.sink", "type": "Spa:String:JSON", "value": { "name": "speakers" } },
      { "subject": 0, "key": "default.audio.source", "type": "Spa:String:JSON", "value": "{\"name\":\"mic\"}" }
    ]
  },
  { "id": 12, "info": null },
  { "id": 3, "type": "PipeWire:Interface:Client", "info": { } }
]"#;
        let objects = parse_batch(text).unwrap();
        let DumpObject::Metadata { id, name, entries } = &objects[0] else {
            panic!("expected metadata, got {:?}", objects[0]);
        };
        assert_eq!(*id, 40);
        assert_eq!(name.as_deref(), Some("default"));
        assert_eq!(entries[0].node_name().as_deref(), Some("speakers"));
        assert_eq!(entries[1].node_name().as_deref(), Some("mic"));
        assert_eq!(objects[1], DumpObject::Removed(12));
        assert_eq!(objects[2], DumpObject::Other(3));
    }

    #[test]
    fn test_props_without_volume() {
        let param = PropsParam { mute: Some(true), ..Default::default() };
        assert_eq!(param.reading(), None);

        let param = PropsParam { volume: Some(0.4), mute: Some(true), channel_volumes: Some(vec![]) };
        assert_eq!(param.reading(), Some(VolumeReading::muted(0.4)));
    }

    #[test]
    fn test_node_without_params_has_no_reading() {
        assert_eq!(NodeInfo::default().reading(), None);
        let info = NodeInfo { params: Some(NodeParams::default()), ..Default::default() };
        assert_eq!(info.reading(), Some(None));
    }

    #[tokio::test]
    async fn test_reader_splits_batches() {
        let stream = tokio_test::io::Builder::new()
            .read(b"[\n  {\n    \"id\": 1,\n    \"params\": [\n      1\n    ]\n  }\n]\n")
            .read(b"\n[\n  { \"id\": 2, \"info\": null }\n")
            .read(b"]\n[ ]\n")
            .build();
        let mut reader = DumpReader::new(tokio::io::BufReader::new(stream));

        let first = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(parse_batch(&first).unwrap(), vec![DumpObject::Other(1)]);

        let second = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(parse_batch(&second).unwrap(), vec![DumpObject::Removed(2)]);

        let third = reader.next_batch().await.unwrap().unwrap();
        assert!(parse_batch(&third).unwrap().is_empty());

        assert!(reader.next_batch().await.unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_id_is_skipped() {
        let text = r#"[ { "id": 4294967296, "type": "PipeWire:Interface:Node" }, { "id": 8, "info": null } ]"#;
        assert_eq!(parse_batch(text).unwrap(), vec![DumpObject::Removed(8)]);
    }

    #[tokio::test]
    async fn test_reader_replaces_invalid_utf8() {
        let stream = tokio_test::io::Builder::new()
            .read(b"[\n  { \"id\": 3, \"type\": \"PipeWire:Interface:Node\", \"info\": { \"props\": { \"node.description\": \"Caf\xe9\" } } }\n]\n")
            .build();
        let mut reader = DumpReader::new(tokio::io::BufReader::new(stream));

        let batch = reader.next_batch().await.unwrap().unwrap();
        let objects = parse_batch(&batch).unwrap();
        let DumpObject::Node { info, .. } = &objects[0] else {
            panic!("expected node, got {:?}", objects[0]);
        };
        assert_eq!(info.prop_str("node.description"), Some("Caf\u{fffd}"));
    }

    #[tokio::test]
    async fn test_reader_drops_partial_batch() {
        let stream = tokio_test::io::Builder::new().read(b"[\n  { \"id\": 1 }\n").build();
        let mut reader = DumpReader::new(tokio::io::BufReader::new(stream));
        assert!(reader.next_batch().await.unwrap().is_none());
    }
}
