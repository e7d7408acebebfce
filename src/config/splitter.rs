//! Dump splitting and chunk output configuration

use serde::{Deserialize, Serialize};

/// How a dump is cut into chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Keep only pages whose `<ns>` is in this list (empty = keep everything)
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<i32>,
    /// Number of accepted pages per chunk
    #[serde(default = "default_pages_per_chunk")]
    pub pages_per_chunk: usize,
    /// Stop after this many accepted pages
    #[serde(default)]
    pub max_pages: Option<usize>,
}

fn default_namespaces() -> Vec<i32> {
    vec![0]
}

fn default_pages_per_chunk() -> usize {
    1000
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            pages_per_chunk: default_pages_per_chunk(),
            max_pages: None,
        }
    }
}

impl SplitterConfig {
    /// The `--head` preset: first 1000 main-namespace pages
    pub fn head() -> Self {
        Self {
            namespaces: vec![0],
            pages_per_chunk: default_pages_per_chunk(),
            max_pages: Some(1000),
        }
    }
}

/// Where and how split chunks are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// File name prefix for chunk files (`<prefix>000000001.xml`)
    #[serde(default)]
    pub chunk_prefix: String,
}
