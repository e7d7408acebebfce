//! Transcription extractor
//!
//! Applies a [`Grammar`] to one page's wikitext in three phases:
//!
//! ```text
//! wikitext ──► language block ──► pronunciation block ──► first accepted candidate
//!              (heading scan)     (marker .. blank line)   (rules × lines)
//! ```
//!
//! The winning candidate is then post-processed: alternatives after `", "`
//! are dropped, delimiters are stripped and sentinel values are rejected.

use crate::grammar::Grammar;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Separator between alternative pronunciations
const ALTERNATIVES_SEPARATOR: &str = ", ";

/// Result of running the extractor on one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// The target language block was found
    pub found_block: bool,
    /// Cleaned transcription, if one was found
    pub transcription: Option<String>,
}

impl Extraction {
    pub fn found_transcription(&self) -> bool {
        self.transcription.is_some()
    }

    fn no_block() -> Self {
        Self::default()
    }

    fn block_only() -> Self {
        Self {
            found_block: true,
            transcription: None,
        }
    }
}

/// Phase A scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockScan {
    BeforeTarget,
    InsideTarget { start: usize },
}

/// Extract a transcription from one page's wikitext
pub fn extract(grammar: &Grammar, text: &str) -> Extraction {
    let lines: Vec<&str> = text.lines().collect();

    let Some(block) = find_language_block(grammar, &lines) else {
        return Extraction::no_block();
    };

    let Some(pronunciation) = find_pronunciation_block(grammar, block) else {
        trace!("Language block without pronunciation block");
        return Extraction::block_only();
    };

    let Some(candidate) = find_candidate(grammar, pronunciation) else {
        return Extraction::block_only();
    };

    let transcription = strip_delimiters(grammar, keep_first_only(&candidate));
    if transcription.is_empty() || grammar.is_sentinel(&transcription) {
        trace!("Rejected candidate '{}'", candidate);
        return Extraction::block_only();
    }

    Extraction {
        found_block: true,
        transcription: Some(transcription),
    }
}

/// Phase A: lines from the target heading (inclusive) to the next heading
/// that satisfies the stop condition (exclusive), or to the end of text
pub fn find_language_block<'a, 'b>(grammar: &Grammar, lines: &'a [&'b str]) -> Option<&'a [&'b str]> {
    let mut state = BlockScan::BeforeTarget;

    for (i, line) in lines.iter().enumerate() {
        let Some(label) = grammar
            .block_regex()
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };

        match state {
            BlockScan::BeforeTarget => {
                if label == grammar.target() {
                    state = BlockScan::InsideTarget { start: i };
                }
            }
            BlockScan::InsideTarget { start } => {
                if is_block_end(grammar, label) {
                    return Some(&lines[start..i]);
                }
            }
        }
    }

    match state {
        BlockScan::BeforeTarget => None,
        BlockScan::InsideTarget { start } => Some(&lines[start..]),
    }
}

fn is_block_end(grammar: &Grammar, label: &str) -> bool {
    match grammar.max_length_stop() {
        Some(max) => label.chars().count() <= max,
        None => true,
    }
}

/// Phase B: lines from the first marker match to the next blank line.
///
/// Without a marker pattern the whole language block is returned. `None`
/// means a marker pattern is configured but never matched.
pub fn find_pronunciation_block<'a, 'b>(grammar: &Grammar, block: &'a [&'b str]) -> Option<&'a [&'b str]> {
    let Some(marker) = grammar.pronunciation_regex() else {
        return Some(block);
    };

    let start = block.iter().position(|line| marker.is_match(line))?;
    let end = block[start + 1..]
        .iter()
        .position(|line| line.trim().is_empty())
        .map_or(block.len(), |offset| start + 1 + offset);

    Some(&block[start..end])
}

/// Phase C: the first candidate accepted by a rule, scanning line by line
/// and trying rules in order on each line
pub fn find_candidate(grammar: &Grammar, lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        grammar.rules().iter().find_map(|rule| {
            let capture = rule.pattern.captures(line)?.get(1)?;
            rule.clean.apply(capture.as_str())
        })
    })
}

/// Keep only the text before the first `", "`
pub fn keep_first_only(candidate: &str) -> &str {
    candidate
        .split_once(ALTERNATIVES_SEPARATOR)
        .map_or(candidate, |(first, _)| first)
}

/// Strip the grammar's delimiter runs from both ends, then trim
pub fn strip_delimiters(grammar: &Grammar, candidate: &str) -> String {
    grammar
        .delimiter_regex()
        .and_then(|re| re.captures(candidate))
        .and_then(|c| c.get(1))
        .map_or(candidate, |m| m.as_str())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{builtin_grammar, CleanRule, DelimiterSet, GrammarDefinition, LanguageBlockSyntax, RuleDefinition};

    fn grammar(code: &str) -> Grammar {
        builtin_grammar(code).unwrap()
    }

    fn transcription(code: &str, text: &str) -> Option<String> {
        grammar(code).extract(text).transcription
    }

    #[test]
    fn keep_first_only_truncates_alternatives() {
        assert_eq!(keep_first_only("iˈtalja, iˈtaːljä"), "iˈtalja");
        assert_eq!(keep_first_only("iˈtalja"), "iˈtalja");
        assert_eq!(keep_first_only("a,b"), "a,b");
    }

    #[test]
    fn strip_delimiters_removes_both_ends() {
        let it = grammar("it");
        assert_eq!(strip_delimiters(&it, "/ˈka.sa/"), "ˈka.sa");
        assert_eq!(strip_delimiters(&it, "[ ˈka.sa ]"), "ˈka.sa");
        assert_eq!(strip_delimiters(&grammar("de"), "/x/"), "/x/");
    }

    #[test]
    fn italian_page() {
        let text = "== {{-it-}} ==\n{{-sost-}}\n'''casa'''\n\n{{-pron-}}\n{{IPA|/ˈka.sa/|/ˈkaː.za/}}\n\n{{-etim-}}\n";
        let extraction = grammar("it").extract(text);
        assert!(extraction.found_block);
        assert_eq!(extraction.transcription.as_deref(), Some("ˈka.sa"));
        assert!(extraction.found_transcription());
    }

    #[test]
    fn first_alternative_wins_end_to_end() {
        let text = "== {{-it-}} ==\n{{-pron-}}\n{{IPA|/iˈtalja, iˈtaːljä/}}\n";
        assert_eq!(transcription("it", text).as_deref(), Some("iˈtalja"));
    }

    #[test]
    fn missing_target_language() {
        let text = "== {{-en-}} ==\n{{-pron-}}\n{{IPA|/hoʊm/}}\n";
        assert_eq!(grammar("it").extract(text), Extraction::default());
    }

    #[test]
    fn block_ends_at_next_language() {
        let text = "==English==\n===Etymology===\nfrom Latin\n\n==French==\n===Pronunciation===\n* {{IPA|/a/|lang=en}}\n";
        let extraction = grammar("en").extract(text);
        assert!(extraction.found_block);
        assert_eq!(extraction.transcription, None);
    }

    #[test]
    fn english_requires_language_tag() {
        let tagged = "==English==\n===Pronunciation===\n* {{IPA|/fɹiː/|lang=en}}\n";
        assert_eq!(transcription("en", tagged).as_deref(), Some("fɹiː"));

        let untagged = "==English==\n===Pronunciation===\n* {{IPA|/fɹiː/}}\n";
        assert_eq!(transcription("en", untagged), None);
    }

    #[test]
    fn pronunciation_block_ends_at_blank_line() {
        let text = "==English==\n===Pronunciation===\n* {{audio|en|free.ogg}}\n\n===Noun===\n* {{IPA|/fɹiː/|lang=en}}\n";
        assert_eq!(transcription("en", text), None);
    }

    #[test]
    fn configured_pronunciation_block_not_found() {
        let text = "==English==\n===Noun===\n* {{IPA|/fɹiː/|lang=en}}\n";
        let extraction = grammar("en").extract(text);
        assert!(extraction.found_block);
        assert_eq!(extraction.transcription, None);
    }

    #[test]
    fn missing_pronunciation_pattern_searches_whole_block() {
        let sv = grammar("sv");
        let lines = ["==Svenska==", "===Substantiv===", "", "*{{uttal|ipa=hɵnd}}"];
        let block = find_language_block(&sv, &lines).unwrap();
        assert_eq!(find_pronunciation_block(&sv, block), Some(block));
        assert_eq!(
            transcription("sv", &lines.join("\n")).as_deref(),
            Some("hɵnd")
        );
    }

    #[test]
    fn sentinel_is_rejected() {
        let text = "== Haus ({{Sprache|Deutsch}}) ==\n{{Aussprache}}\n:{{IPA}} {{Lautschrift|…}}\n";
        let extraction = grammar("de").extract(text);
        assert!(extraction.found_block);
        assert!(!extraction.found_transcription());

        let text = text.replace('…', "haʊ̯s");
        assert_eq!(transcription("de", &text).as_deref(), Some("haʊ̯s"));
    }

    #[test]
    fn length_threshold_skips_section_headings() {
        let text = "{{-is-}}\n{{-nafnorð-}}\n{{-framburður-}}\n:{{IPA-is|ipa|tʰ|a|ʰ|k|ː}}\n";
        assert_eq!(transcription("is", text).as_deref(), Some("tʰaʰkː"));

        let text = "{{-is-}}\n{{-en-}}\n{{-framburður-}}\n:{{IPA-is|ipa|tʰ|a|ʰ|k|ː}}\n";
        assert!(grammar("is").extract(text).found_block);
        assert_eq!(transcription("is", text), None);
    }

    #[test]
    fn rejected_rule_falls_through_to_next_rule() {
        let text = "{{-is-}}\n{{-framburður-}}\n{{IPA|[ˈtʰaːk]}}\n";
        assert_eq!(transcription("is", text).as_deref(), Some("ˈtʰaːk"));
    }

    #[test]
    fn empty_marker_parameters_end_the_scan() {
        let text = "{{-is-}}\n{{-framburður-}}\n:{{IPA-is|ipa|}}\n:{{IPA|[tʰaːk]}}\n";
        let extraction = grammar("is").extract(text);
        assert!(extraction.found_block);
        assert!(!extraction.found_transcription());
    }

    #[test]
    fn french_pronunciation() {
        let text = "== {{langue|fr}} ==\n=== {{S|nom|fr}} ===\n'''slovaque''' {{pron|slɔ.vak|fr}}\n\n=== {{S|prononciation}} ===\n* {{écouter|lang=fr|France|slɔ.vak|audio=Fr-slovaque.ogg}}\n";
        assert_eq!(transcription("fr", text).as_deref(), Some("slɔ.vak"));
    }

    #[test]
    fn spanish_named_parameter() {
        let text = "== {{lengua|es}} ==\n{{pron-graf|fone=o.lanˈdes}}\n";
        assert_eq!(transcription("es", text).as_deref(), Some("o.lanˈdes"));
    }

    #[test]
    fn portuguese_plain_afi_line() {
        let text = "={{-pt-}}=\n\n=={{pronúncia|pt}}==\n* [[AFI]]: /esˈertu/\n";
        assert_eq!(transcription("pt", text).as_deref(), Some("esˈertu"));
    }

    #[test]
    fn russian_transcription() {
        let text = "= {{-ru-}} =\n\n=== Произношение ===\n{{transcription|nəvəsʲɪˈbʲirsk}}\n";
        assert_eq!(transcription("ru", text).as_deref(), Some("nəvəsʲɪˈbʲirsk"));
    }

    #[test]
    fn empty_candidate_counts_as_missing() {
        let text = "== {{-it-}} ==\n{{-pron-}}\n{{IPA|//}}\n";
        let extraction = grammar("it").extract(text);
        assert!(extraction.found_block);
        assert_eq!(extraction.transcription, None);
    }

    #[test]
    fn custom_cleaner_rejects_and_accepts() {
        let def = GrammarDefinition {
            language: "xx".into(),
            mw_type: "wiktionary".into(),
            language_block: LanguageBlockSyntax {
                open: "==".into(),
                prefix: String::new(),
                suffix: String::new(),
                close: "==".into(),
                anchor_open: true,
                anchor_close: true,
                target: "Xish".into(),
                max_length_stop: None,
            },
            pronunciation_block: None,
            rules: vec![RuleDefinition::identity(r"\{\{sound\|([^}]*)\}\}")],
            delimiters: DelimiterSet::default(),
            sentinels: vec![],
        };
        let grammar = Grammar::compile(&def)
            .unwrap()
            .with_rule(
                r"\{\{ipa\|([^}]*)\}\}",
                CleanRule::custom(|s| s.strip_prefix("ok:").map(str::to_string)),
            )
            .unwrap();

        let lines = ["==Xish==", "{{ipa|no:a}}", "{{ipa|ok:b}}"];
        assert_eq!(find_candidate(&grammar, &lines).as_deref(), Some("b"));
    }
}
