//! JSON codec for whole chains.
//!
//! The document shape is `{"config": …, "node": …}`, where each node is
//! `{"block": …, "nodes": […]}`. Encoding is available for any validation
//! state; decoding only ever produces an unverified chain, which must pass
//! the validation gate before use. Canonical documents round-trip
//! byte-exactly through decode → verify → encode.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chain::{Blockchain, Unverified};
use crate::config::BlockchainConfig;
use crate::types::BlockchainNode;

impl<State> Serialize for Blockchain<State> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = serializer.serialize_struct("Blockchain", 2)?;
        document.serialize_field("config", self.config())?;
        document.serialize_field("node", self.root())?;
        document.end()
    }
}

#[derive(Deserialize)]
struct BlockchainDocument {
    config: BlockchainConfig,
    node: BlockchainNode,
}

impl<'de> Deserialize<'de> for Blockchain<Unverified> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = BlockchainDocument::deserialize(deserializer)?;
        Ok(Blockchain::new(document.config, document.node))
    }
}

/// Encodes a chain, verified or not, as its canonical JSON document.
pub fn encode<State>(chain: &Blockchain<State>) -> serde_json::Result<String> {
    serde_json::to_string(chain)
}

/// Decodes an untrusted JSON document into an unverified chain.
pub fn decode(document: &str) -> serde_json::Result<Blockchain<Unverified>> {
    serde_json::from_str(document)
}
