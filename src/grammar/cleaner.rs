//! Cleaning functions applied to a rule's captured text
//!
//! A rule either keeps its capture as-is (`Identity`) or hands it to a
//! cleaner that returns the transcription or rejects the match. Grammars
//! loaded from files pick one of the declarative [`CleanerSpec`] kinds;
//! Rust callers can also plug in an arbitrary closure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A cleaning function: `None` rejects the match
pub type Cleaner = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// How the capture of a matching rule becomes a candidate
#[derive(Clone)]
pub enum CleanRule {
    /// Trimmed capture
    Identity,
    /// Custom cleaning function
    Custom(Cleaner),
}

impl CleanRule {
    /// Wrap a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        CleanRule::Custom(Arc::new(f))
    }

    /// Apply to the raw capture
    pub fn apply(&self, capture: &str) -> Option<String> {
        match self {
            CleanRule::Identity => Some(capture.trim().to_string()),
            CleanRule::Custom(f) => f(capture),
        }
    }
}

impl fmt::Debug for CleanRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanRule::Identity => f.write_str("Identity"),
            CleanRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Rejects a named-parameter match when a parameter mentions `marker`
/// but is not exactly `allowed` (e.g. a `språk=` tag for another language)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterGuard {
    pub marker: String,
    pub allowed: String,
}

/// Declarative cleaner, loadable from a grammar file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CleanerSpec {
    #[default]
    Identity,

    /// Template parameters where one must carry the language tag and
    /// exactly one untagged parameter must remain
    TaggedParameter {
        /// Substrings marking a language tag (`lang=en`)
        #[serde(default)]
        tag_markers: Vec<String>,
        /// Whole parameters that are a language tag (`en`); also dropped
        #[serde(default)]
        tag_values: Vec<String>,
        /// Parameters containing any of these are dropped
        #[serde(default)]
        ignore_markers: Vec<String>,
        /// The remaining parameter must not contain any of these
        #[serde(default)]
        forbidden: Vec<String>,
    },

    /// First parameter starting with `key` (e.g. `fone=`)
    NamedParameter {
        key: String,
        #[serde(default)]
        guard: Option<ParameterGuard>,
    },

    /// Concatenation of every parameter after the one equal to `marker`
    AfterMarker { marker: String },
}

impl CleanerSpec {
    /// Clean one raw capture
    pub fn clean(&self, capture: &str) -> Option<String> {
        match self {
            CleanerSpec::Identity => Some(capture.trim().to_string()),
            CleanerSpec::TaggedParameter {
                tag_markers,
                tag_values,
                ignore_markers,
                forbidden,
            } => tagged_parameter(capture, tag_markers, tag_values, ignore_markers, forbidden),
            CleanerSpec::NamedParameter { key, guard } => {
                named_parameter(capture, key, guard.as_ref())
            }
            CleanerSpec::AfterMarker { marker } => after_marker(capture, marker),
        }
    }

    /// Turn into a rule usable by the extractor
    pub fn into_rule(self) -> CleanRule {
        match self {
            CleanerSpec::Identity => CleanRule::Identity,
            spec => CleanRule::Custom(Arc::new(move |capture: &str| spec.clean(capture))),
        }
    }
}

fn tagged_parameter(
    capture: &str,
    tag_markers: &[String],
    tag_values: &[String],
    ignore_markers: &[String],
    forbidden: &[String],
) -> Option<String> {
    let mut has_tag = false;
    let mut kept = Vec::new();

    for part in capture.trim().split('|') {
        let is_value = tag_values.iter().any(|v| v == part);
        if is_value || tag_markers.iter().any(|m| part.contains(m.as_str())) {
            has_tag = true;
        }
        if !is_value && !ignore_markers.iter().any(|m| part.contains(m.as_str())) {
            kept.push(part);
        }
    }

    match kept.as_slice() {
        [only] if has_tag && !forbidden.iter().any(|f| only.contains(f.as_str())) => {
            Some(only.trim().to_string())
        }
        _ => None,
    }
}

fn named_parameter(capture: &str, key: &str, guard: Option<&ParameterGuard>) -> Option<String> {
    for part in capture.trim().split('|') {
        if let Some(g) = guard {
            if part.contains(g.marker.as_str()) && part != g.allowed {
                return None;
            }
        }
        if let Some(value) = part.strip_prefix(key) {
            return Some(value.trim().to_string());
        }
    }
    None
}

fn after_marker(capture: &str, marker: &str) -> Option<String> {
    let mut parts = capture.trim().split('|');
    parts.by_ref().find(|p| *p == marker)?;
    let mut rest = parts.peekable();
    rest.peek()?;
    Some(rest.collect())
}
