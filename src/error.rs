//! Error types shared by the dump reader, grammar loader and miner

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, splitting or mining a dump
#[derive(Debug, Error)]
pub enum MinerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("Invalid dump format: {0}")]
    InvalidFormat(String),

    #[error("UTF-8 decode error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<quick_xml::Error> for MinerError {
    fn from(e: quick_xml::Error) -> Self {
        MinerError::XmlParse(e.to_string())
    }
}

/// Errors raised while building or loading a grammar.
///
/// All of these are fatal and surface before any chunk is mined.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("unknown grammar '{0}' (not a file and not a built-in name)")]
    UnknownGrammar(String),

    #[error("invalid pattern in {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern in {0} has no capture group")]
    MissingCaptureGroup(String),

    #[error("invalid grammar definition: {0}")]
    InvalidDefinition(String),

    #[error("failed to read grammar file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse grammar file: {0}")]
    Toml(#[from] toml::de::Error),
}
