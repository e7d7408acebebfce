//! Per-language extraction grammars
//!
//! A [`GrammarDefinition`] is plain data (it round-trips through TOML); a
//! [`Grammar`] is the compiled, immutable form the extractor runs. All
//! patterns are compiled once, in [`Grammar::compile`].

pub mod cleaner;
pub mod registry;

pub use cleaner::{CleanRule, Cleaner, CleanerSpec, ParameterGuard};
pub use registry::{builtin_grammar, builtin_names, load_grammar};

use crate::error::GrammarError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Syntax of the heading that opens a language block.
///
/// For `== {{langue|fr}} ==` this is open `==`, prefix `{{langue|`, suffix
/// `}}`, close `==`, target `fr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageBlockSyntax {
    /// Opening delimiter (literal)
    #[serde(default)]
    pub open: String,
    /// Literal text before the label
    #[serde(default)]
    pub prefix: String,
    /// Literal text after the label
    #[serde(default)]
    pub suffix: String,
    /// Closing delimiter (literal)
    #[serde(default)]
    pub close: String,
    /// Opening delimiter must start the line
    #[serde(default)]
    pub anchor_open: bool,
    /// Closing delimiter must end the line
    #[serde(default)]
    pub anchor_close: bool,
    /// Label that opens the wanted block
    pub target: String,
    /// Only labels at most this long (in characters) end the block
    #[serde(default)]
    pub max_length_stop: Option<usize>,
}

/// Transcription delimiters to strip, as sets of characters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelimiterSet {
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
}

/// One extraction rule: a pattern with a capture group and its cleaner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub pattern: String,
    #[serde(default)]
    pub cleaner: CleanerSpec,
}

impl RuleDefinition {
    pub fn identity(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            cleaner: CleanerSpec::Identity,
        }
    }

    pub fn cleaned(pattern: impl Into<String>, cleaner: CleanerSpec) -> Self {
        Self {
            pattern: pattern.into(),
            cleaner,
        }
    }
}

fn default_mw_type() -> String {
    "wiktionary".to_string()
}

/// Serializable grammar description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarDefinition {
    /// ISO language code of the wiki
    pub language: String,
    /// MediaWiki project type
    #[serde(default = "default_mw_type")]
    pub mw_type: String,
    pub language_block: LanguageBlockSyntax,
    /// Pattern marking the start of the pronunciation block
    #[serde(default)]
    pub pronunciation_block: Option<String>,
    /// Tried in order on every line
    pub rules: Vec<RuleDefinition>,
    #[serde(default)]
    pub delimiters: DelimiterSet,
    /// Values meaning "template present, no transcription"
    #[serde(default)]
    pub sentinels: Vec<String>,
}

impl GrammarDefinition {
    /// Parse a TOML definition
    pub fn from_toml_str(s: &str) -> Result<Self, GrammarError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML definition from disk
    pub fn from_file(path: &Path) -> Result<Self, GrammarError> {
        let content = std::fs::read_to_string(path).map_err(|source| GrammarError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub pattern: Regex,
    pub clean: CleanRule,
}

/// Compiled, immutable grammar
#[derive(Debug, Clone)]
pub struct Grammar {
    language: String,
    mw_type: String,
    target: String,
    max_length_stop: Option<usize>,
    block_regex: Regex,
    pronunciation_regex: Option<Regex>,
    rules: Vec<ExtractionRule>,
    delimiter_regex: Option<Regex>,
    sentinels: HashSet<String>,
}

impl Grammar {
    /// Compile a definition
    pub fn compile(def: &GrammarDefinition) -> Result<Self, GrammarError> {
        if def.language.trim().is_empty() {
            return Err(GrammarError::InvalidDefinition("language must not be empty".into()));
        }
        if def.language_block.target.is_empty() {
            return Err(GrammarError::InvalidDefinition(
                "language_block.target must not be empty".into(),
            ));
        }
        if def.rules.is_empty() {
            return Err(GrammarError::InvalidDefinition(
                "at least one extraction rule is required".into(),
            ));
        }

        let block_regex = compile_pattern("language_block", &block_pattern(&def.language_block)?)?;

        let pronunciation_regex = def
            .pronunciation_block
            .as_deref()
            .map(|p| compile_pattern("pronunciation_block", p))
            .transpose()?;

        let mut grammar = Self {
            language: def.language.clone(),
            mw_type: def.mw_type.clone(),
            target: def.language_block.target.clone(),
            max_length_stop: def.language_block.max_length_stop,
            block_regex,
            pronunciation_regex,
            rules: Vec::with_capacity(def.rules.len()),
            delimiter_regex: delimiter_pattern(&def.delimiters)
                .map(|p| compile_pattern("delimiters", &p))
                .transpose()?,
            sentinels: def.sentinels.iter().cloned().collect(),
        };

        for (i, rule) in def.rules.iter().enumerate() {
            grammar.push_rule_at(format!("rules[{}]", i), &rule.pattern, rule.cleaner.clone().into_rule())?;
        }

        Ok(grammar)
    }

    /// Append a rule with a custom cleaner
    pub fn with_rule(mut self, pattern: &str, clean: CleanRule) -> Result<Self, GrammarError> {
        let field = format!("rules[{}]", self.rules.len());
        self.push_rule_at(field, pattern, clean)?;
        Ok(self)
    }

    fn push_rule_at(&mut self, field: String, pattern: &str, clean: CleanRule) -> Result<(), GrammarError> {
        let regex = compile_pattern(&field, pattern)?;
        if regex.captures_len() < 2 {
            return Err(GrammarError::MissingCaptureGroup(field));
        }
        self.rules.push(ExtractionRule { pattern: regex, clean });
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn mw_type(&self) -> &str {
        &self.mw_type
    }

    /// Label of the wanted language block
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn max_length_stop(&self) -> Option<usize> {
        self.max_length_stop
    }

    pub fn block_regex(&self) -> &Regex {
        &self.block_regex
    }

    pub fn pronunciation_regex(&self) -> Option<&Regex> {
        self.pronunciation_regex.as_ref()
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn delimiter_regex(&self) -> Option<&Regex> {
        self.delimiter_regex.as_ref()
    }

    pub fn is_sentinel(&self, value: &str) -> bool {
        self.sentinels.contains(value)
    }

    /// Run the extractor on one page's wikitext
    pub fn extract(&self, text: &str) -> crate::extractor::Extraction {
        crate::extractor::extract(self, text)
    }
}

fn compile_pattern(field: &str, pattern: &str) -> Result<Regex, GrammarError> {
    Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
        field: field.to_string(),
        source,
    })
}

/// Build the heading pattern. The label is everything up to the first
/// character of the suffix (or of the closing delimiter without a suffix).
/// Without a suffix the prefix is not part of the heading syntax.
fn block_pattern(syntax: &LanguageBlockSyntax) -> Result<String, GrammarError> {
    let stop_char = syntax
        .suffix
        .chars()
        .next()
        .or_else(|| syntax.close.chars().next())
        .ok_or_else(|| {
            GrammarError::InvalidDefinition(
                "language_block needs a suffix or a closing delimiter".into(),
            )
        })?;

    let label = format!("([^{}]*)", regex::escape(&stop_char.to_string()));
    let body = if syntax.suffix.is_empty() {
        format!(
            "{}{}{}",
            regex::escape(&syntax.open),
            label,
            regex::escape(&syntax.close)
        )
    } else {
        format!(
            "{}[ ]*{}{}{}[ ]*{}",
            regex::escape(&syntax.open),
            regex::escape(&syntax.prefix),
            label,
            regex::escape(&syntax.suffix),
            regex::escape(&syntax.close)
        )
    };

    Ok(format!(
        "{}{}{}",
        if syntax.anchor_open { "^" } else { "" },
        body,
        if syntax.anchor_close { "$" } else { "" }
    ))
}

/// `^[open]*(.*?)[close]*$`, or `None` when no delimiters are configured
fn delimiter_pattern(delimiters: &DelimiterSet) -> Option<String> {
    if delimiters.open.is_empty() && delimiters.close.is_empty() {
        return None;
    }

    let class = |chars: &str| -> String {
        if chars.is_empty() {
            String::new()
        } else {
            let escaped: String = chars.chars().map(|c| regex::escape(&c.to_string())).collect();
            format!("[{}]*", escaped)
        }
    };

    Some(format!("^{}(.*?){}$", class(&delimiters.open), class(&delimiters.close)))
}
