//! Built-in grammars and grammar loading
//!
//! Built-ins are resolved by language code (`it`), site name
//! (`itwiktionary`) or site file name (`itwiktionary.toml`). Anything that
//! names an existing file is loaded as a TOML definition instead.

use super::{
    CleanerSpec, DelimiterSet, Grammar, GrammarDefinition, LanguageBlockSyntax, ParameterGuard,
    RuleDefinition,
};
use crate::error::GrammarError;
use std::path::Path;
use tracing::debug;

/// `{{IPA|first|...}}`: first positional parameter only
const IPA_FIRST_PARAM: &str = r"\{\{IPA\|([^|}]*)(\|[^|}]*)*\}\}";
/// `{{IPA|...}}`: all parameters
const IPA_ALL_PARAMS: &str = r"\{\{IPA\|([^}]*)\}\}";

type Factory = fn() -> GrammarDefinition;

const BUILTINS: &[(&str, Factory)] = &[
    ("da", danish),
    ("de", german),
    ("en", english),
    ("es", spanish),
    ("fi", finnish),
    ("fr", french),
    ("is", icelandic),
    ("it", italian),
    ("lt", lithuanian),
    ("lv", latvian),
    ("nl", dutch),
    ("no", norwegian),
    ("pl", polish),
    ("pt", portuguese),
    ("ru", russian),
    ("sv", swedish),
];

/// Language codes of all built-in grammars
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(code, _)| *code)
}

/// Definition of a built-in grammar, if `name` refers to one
pub fn builtin_definition(name: &str) -> Option<GrammarDefinition> {
    let code = normalize_name(name);
    BUILTINS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, factory)| factory())
}

/// Compile a built-in grammar
pub fn builtin_grammar(name: &str) -> Result<Grammar, GrammarError> {
    let def = builtin_definition(name).ok_or_else(|| GrammarError::UnknownGrammar(name.to_string()))?;
    Grammar::compile(&def)
}

/// Load a grammar from a file path or a built-in name
pub fn load_grammar(name_or_path: &str) -> Result<Grammar, GrammarError> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        debug!("Loading grammar definition from {}", path.display());
        return Grammar::compile(&GrammarDefinition::from_file(path)?);
    }
    builtin_grammar(name_or_path)
}

fn normalize_name(name: &str) -> &str {
    let name = name.strip_suffix(".toml").unwrap_or(name);
    name.strip_suffix("wiktionary").unwrap_or(name)
}

fn heading(open: &str, prefix: &str, suffix: &str, close: &str, anchored: bool, target: &str) -> LanguageBlockSyntax {
    LanguageBlockSyntax {
        open: open.to_string(),
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
        close: close.to_string(),
        anchor_open: anchored,
        anchor_close: anchored,
        target: target.to_string(),
        max_length_stop: None,
    }
}

fn delimiters(open: &str, close: &str) -> DelimiterSet {
    DelimiterSet {
        open: open.to_string(),
        close: close.to_string(),
    }
}

fn slashes_and_brackets() -> DelimiterSet {
    delimiters("/[", "/]")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn definition(
    language: &str,
    language_block: LanguageBlockSyntax,
    pronunciation_block: Option<&str>,
    rules: Vec<RuleDefinition>,
    delimiters: DelimiterSet,
) -> GrammarDefinition {
    GrammarDefinition {
        language: language.to_string(),
        mw_type: "wiktionary".to_string(),
        language_block,
        pronunciation_block: pronunciation_block.map(str::to_string),
        rules,
        delimiters,
        sentinels: Vec::new(),
    }
}

/// `{{=da=}}` ... `{{-pronun-}}` ... `*{{IPA|[ˈhunˀ]}}`
fn danish() -> GrammarDefinition {
    definition(
        "da",
        heading("{{", "=", "=", "}}", true, "da"),
        Some(r"\{\{-pronun-\}\}"),
        vec![RuleDefinition::identity(IPA_FIRST_PARAM)],
        slashes_and_brackets(),
    )
}

/// `== Vorteil ({{Sprache|Deutsch}}) ==` ... `:{{IPA}} {{Lautschrift|ˈfɔʁˌtaɪ̯l}}`
fn german() -> GrammarDefinition {
    let mut def = definition(
        "de",
        heading("", "{{Sprache|", "}}", "", false, "Deutsch"),
        Some(r"\{\{Aussprache\}\}"),
        vec![RuleDefinition::identity(
            r":\{\{IPA\}\} \{\{Lautschrift\|([^|}]*)(\|[^|}]*)*\}\}",
        )],
        DelimiterSet::default(),
    );
    // Many entries carry the template with an ellipsis instead of a transcription
    def.sentinels = strings(&["…"]);
    def
}

/// `==English==` ... `===Pronunciation===` ... `* {{IPA|/fɹiː/|lang=en}}`
fn english() -> GrammarDefinition {
    definition(
        "en",
        heading("==", "", "", "==", true, "English"),
        Some("===Pronunciation==="),
        vec![RuleDefinition::cleaned(
            IPA_ALL_PARAMS,
            CleanerSpec::TaggedParameter {
                tag_markers: strings(&["lang=en"]),
                tag_values: strings(&["en"]),
                ignore_markers: strings(&["lang="]),
                forbidden: Vec::new(),
            },
        )],
        delimiters("/", "/"),
    )
}

/// `== {{lengua|es}} ==` ... `{{pron-graf|fone=o.lanˈdes}}`
fn spanish() -> GrammarDefinition {
    definition(
        "es",
        heading("==", "{{lengua|", "}}", "==", false, "es"),
        None,
        vec![RuleDefinition::cleaned(
            r"\{\{pron-graf\|([^}]*)\}\}",
            CleanerSpec::NamedParameter {
                key: "fone=".to_string(),
                guard: None,
            },
        )],
        DelimiterSet::default(),
    )
}

/// `==Suomi==` ... `====Ääntäminen====` ... `{{IPA|/ˈyhdekˌsæn/}}`
fn finnish() -> GrammarDefinition {
    definition(
        "fi",
        heading("==", "", "", "==", true, "Suomi"),
        Some("====Ääntäminen===="),
        vec![RuleDefinition::identity(IPA_ALL_PARAMS)],
        slashes_and_brackets(),
    )
}

/// `== {{langue|fr}} ==` ... `=== {{S|prononciation}} ===` ... `* {{pron|slɔ.vak|fr}}`
fn french() -> GrammarDefinition {
    let cleaner = CleanerSpec::TaggedParameter {
        tag_markers: strings(&["lang=fr", "France"]),
        tag_values: strings(&["fr"]),
        ignore_markers: strings(&["lang=", "France", "audio=", "titre="]),
        forbidden: strings(&["-", ", "]),
    };
    definition(
        "fr",
        heading("==", "{{langue|", "}}", "==", false, "fr"),
        Some(r"=== \{\{S\|prononciation\}\} ==="),
        vec![
            RuleDefinition::cleaned(r"\{\{pron\|([^}]*)\}\}", cleaner.clone()),
            RuleDefinition::cleaned(r"\{\{écouter\|([^}]*)\}\}", cleaner),
        ],
        DelimiterSet::default(),
    )
}

/// `{{-is-}}` ... `{{-framburður-}}` ... `:{{IPA-is|ipa|tʰ|a|ʰ|k|ː}}`
fn icelandic() -> GrammarDefinition {
    let mut block = heading("{{", "-", "-", "}}", true, "is");
    // Section headings share the `{{-...-}}` shape; only short labels are languages
    block.max_length_stop = Some(2);
    definition(
        "is",
        block,
        Some(r"\{\{-framburður-\}\}"),
        vec![
            RuleDefinition::cleaned(
                r"\{\{IPA[^|]*\|([^}]*)\}\}",
                CleanerSpec::AfterMarker {
                    marker: "ipa".to_string(),
                },
            ),
            RuleDefinition::identity(IPA_FIRST_PARAM),
        ],
        delimiters("[", "]"),
    )
}

/// `== {{-it-}} ==` ... `{{-pron-}}` ... `{{IPA|/ˈka.sa/}}`
fn italian() -> GrammarDefinition {
    definition(
        "it",
        heading("==", "{{-", "-}}", "==", true, "it"),
        Some(r"\{\{-pron-\}\}"),
        vec![RuleDefinition::identity(IPA_FIRST_PARAM)],
        slashes_and_brackets(),
    )
}

/// `== {{ltv}} ==` ... `=== Tarimas ===` ... `{{IPA|...}}`
fn lithuanian() -> GrammarDefinition {
    definition(
        "lt",
        heading("==", "{{", "}}", "==", true, "ltv"),
        Some("=== Tarimas ==="),
        vec![RuleDefinition::identity(IPA_FIRST_PARAM)],
        slashes_and_brackets(),
    )
}

/// `{{-lv-}}` ... `===Izruna===` ... `* {{IPA|[kuɐ̯ks]}}`
fn latvian() -> GrammarDefinition {
    let mut block = heading("{{", "-", "-", "}}", true, "lv");
    block.max_length_stop = Some(2);
    definition(
        "lv",
        block,
        Some("===Izruna==="),
        vec![RuleDefinition::identity(IPA_FIRST_PARAM)],
        slashes_and_brackets(),
    )
}

/// `{{=nld=}}` ... `{{-pron-}}` ... `*{{WikiW|IPA}}: {{IPA|/jaː/|nld}}`
fn dutch() -> GrammarDefinition {
    let mut def = definition(
        "nl",
        heading("{{", "=", "=", "}}", true, "nld"),
        Some(r"\{\{-pron-\}\}"),
        vec![RuleDefinition::identity(IPA_FIRST_PARAM)],
        slashes_and_brackets(),
    );
    def.sentinels = strings(&["xxxx"]);
    def
}

/// `==Norsk==` ... `====Uttale====` ... `*{{IPA|/veps/|språk=no}}`
fn norwegian() -> GrammarDefinition {
    definition(
        "no",
        heading("==", "", "", "==", true, "Norsk"),
        Some("====Uttale===="),
        vec![RuleDefinition::cleaned(
            IPA_ALL_PARAMS,
            CleanerSpec::TaggedParameter {
                tag_markers: strings(&["språk=no", "språk=nb"]),
                tag_values: strings(&["no", "nb"]),
                ignore_markers: strings(&["språk="]),
                forbidden: Vec::new(),
            },
        )],
        slashes_and_brackets(),
    )
}

/// `== czytać ({{język polski}}) ==` ... `{{wymowa}} {{IPA3|ˈʧ̑ɨtaʨ̑}}`
fn polish() -> GrammarDefinition {
    definition(
        "pl",
        heading("", "{{język ", "}}", "", false, "polski"),
        Some(r"\{\{wymowa\}\}"),
        vec![RuleDefinition::identity(r"\{\{IPA3\|([^|}]*)(\|[^|}]*)*\}\}")],
        DelimiterSet::default(),
    )
}

/// `={{-pt-}}=` ... `=={{pronúncia|pt}}==` ... `* [[AFI]]: /esˈertu/`
fn portuguese() -> GrammarDefinition {
    definition(
        "pt",
        heading("=", "{{-", "-}}", "=", true, "pt"),
        Some(r"^==[^pP]*[pP]ronúncia[^=]*==$"),
        vec![
            RuleDefinition::identity(r"\{\{AFI\|([^|}]*)(\|[^|}]*)*\}\}"),
            RuleDefinition::identity(r"\[*AFI\]*: (/[^/]*/)"),
        ],
        delimiters("/", "/"),
    )
}

/// `= {{-ru-}} =` ... `=== Произношение ===` ... `{{transcription|nəvəsʲɪˈbʲirsk}}`
fn russian() -> GrammarDefinition {
    definition(
        "ru",
        heading("=", "{{-", "-}}", "=", true, "ru"),
        Some("=== Произношение ==="),
        vec![RuleDefinition::identity(
            r"\{\{transcription[^|]*\|([^|}]*)(\|[^|}]*)*\}\}",
        )],
        slashes_and_brackets(),
    )
}

/// `==Svenska==` ... `*{{uttal|ipa=hɵnd}}`
fn swedish() -> GrammarDefinition {
    definition(
        "sv",
        heading("==", "", "", "==", true, "Svenska"),
        None,
        vec![RuleDefinition::cleaned(
            r"\{\{uttal\|([^}]*)\}\}",
            CleanerSpec::NamedParameter {
                key: "ipa=".to_string(),
                guard: Some(ParameterGuard {
                    marker: "språk".to_string(),
                    allowed: "språk=svenska".to_string(),
                }),
            },
        )],
        DelimiterSet::default(),
    )
}
