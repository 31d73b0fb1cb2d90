//! Requested trackable resources (`reqtres`)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::{byte_size_to_bytes, leading_number};

/// Typed view of a `cpu=4,mem=16G,node=1,gres/gpu=2` resource request
///
/// Keys other than the four billed ones are kept as integers in `other`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u64>,

    /// Memory in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<u64>,

    #[serde(rename = "gres/gpu", default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<u64>,

    #[serde(flatten)]
    pub other: BTreeMap<String, u64>,
}

impl ResourceRequest {
    /// Parse a comma-separated `key=value` TRES string
    ///
    /// Tokens without `=` are ignored. Quantities take their leading integer;
    /// `mem` goes through the byte-size canonicalizer.
    pub fn parse(text: &str) -> Self {
        let mut request = ResourceRequest::default();

        for (key, value) in text
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
        {
            match key {
                "mem" => request.mem = Some(byte_size_to_bytes(value) as u64),
                "cpu" => request.cpu = Some(quantity(value)),
                "node" => request.node = Some(quantity(value)),
                "gres/gpu" => request.gpu = Some(quantity(value)),
                "" => {}
                other => {
                    request.other.insert(other.to_string(), quantity(value));
                }
            }
        }

        request
    }

    pub fn cpus(&self) -> u64 {
        self.cpu.unwrap_or(0)
    }

    pub fn nodes(&self) -> u64 {
        self.node.unwrap_or(0)
    }

    pub fn gpus(&self) -> u64 {
        self.gpu.unwrap_or(0)
    }
}

fn quantity(value: &str) -> u64 {
    leading_number(value).max(0.0) as u64
}
