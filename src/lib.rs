//! wiktminer: streaming pronunciation miner for MediaWiki dumps
//!
//! Mines word → phonetic transcription pairs from Wiktionary XML exports:
//! - Constant-memory splitting of plain or multistream bz2 dumps into
//!   standalone XML chunks
//! - Minimal page parsing with quick-xml
//! - Declarative per-language grammars (built-in or loaded from TOML)
//! - A three-phase extractor: language block, pronunciation block, rules
//! - Running statistics over the whole dump

pub mod config;
pub mod dump;
pub mod error;
pub mod extractor;
pub mod grammar;
pub mod miner;

pub use config::Config;
pub use error::{GrammarError, MinerError};
pub use extractor::{extract, Extraction};
pub use grammar::{load_grammar, Grammar, GrammarDefinition};
pub use miner::{Miner, MinerOptions, MiningStatus};
