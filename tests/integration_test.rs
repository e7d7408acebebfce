//! End-to-end tests: dump on disk → splitter → parser → extractor → status

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiktminer::config::SplitterConfig;
use wiktminer::dump::{count_pages, DumpCompression, DumpSource, PageParser, Splitter, MEDIAWIKI_CLOSE, MEDIAWIKI_OPEN};
use wiktminer::grammar::{builtin_grammar, load_grammar};
use wiktminer::{GrammarError, Miner, MinerError, MinerOptions};

struct TestPage<'a> {
    id: u32,
    title: &'a str,
    ns: i32,
    text: &'a str,
}

fn page_xml(page: &TestPage<'_>) -> String {
    format!(
        "  <page>\n    <title>{}</title>\n    <ns>{}</ns>\n    <id>{}</id>\n    <revision>\n      <id>{}</id>\n      <timestamp>2016-05-01T12:00:00Z</timestamp>\n      <text xml:space=\"preserve\">{}</text>\n    </revision>\n  </page>\n",
        page.title,
        page.ns,
        page.id,
        page.id + 1000,
        page.text
    )
}

fn dump_xml(pages: &[TestPage<'_>]) -> String {
    let mut xml = String::from(MEDIAWIKI_OPEN);
    xml.push_str("  <siteinfo>\n    <sitename>Wikizionario</sitename>\n  </siteinfo>\n");
    for page in pages {
        xml.push_str(&page_xml(page));
    }
    xml.push_str(MEDIAWIKI_CLOSE);
    xml.push('\n');
    xml
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn quiet_options(splitter: SplitterConfig) -> MinerOptions {
    MinerOptions {
        splitter,
        quiet: true,
    }
}

const CASA: &str = "== {{-it-}} ==\n{{-sost-}}\n\n{{-pron-}}\n{{IPA|/ˈka.sa/}}\n\n{{-etim-}}\ndal latino";
const HOUSE: &str = "== {{-en-}} ==\n{{-sost-}}\nhouse";

/// `count` main-namespace Italian pages, every third one in namespace 1
fn numbered_pages(count: u32) -> String {
    let mut xml = String::from(MEDIAWIKI_OPEN);
    for id in 1..=count {
        let title = format!("parola{}", id);
        xml.push_str(&page_xml(&TestPage {
            id,
            title: &title,
            ns: if id % 3 == 0 { 1 } else { 0 },
            text: CASA,
        }));
    }
    xml.push_str(MEDIAWIKI_CLOSE);
    xml
}

#[test]
fn test_two_page_dump_end_to_end() {
    let dir = TempDir::new().unwrap();
    let xml = dump_xml(&[
        TestPage { id: 1, title: "casa", ns: 0, text: CASA },
        TestPage { id: 2, title: "house", ns: 0, text: HOUSE },
    ]);
    let path = write_file(dir.path(), "itwiktionary.xml", xml.as_bytes());

    let miner = Miner::new(builtin_grammar("it").unwrap(), quiet_options(SplitterConfig::default()));
    let status = miner.mine_path(&path, false).unwrap();

    assert_eq!(status.pages_seen, 2);
    assert_eq!(status.pages_with_language_block, 1);
    assert_eq!(status.pages_with_transcription, 1);
    assert_eq!(status.outcomes[0].title, "casa");
    assert_eq!(status.outcomes[0].transcription.as_deref(), Some("ˈka.sa"));
    assert!(!status.outcomes[1].found_block);
}

#[test]
fn test_multistream_bz2_dump() {
    let dir = TempDir::new().unwrap();
    let first = dump_xml(&[TestPage { id: 1, title: "casa", ns: 0, text: CASA }]);
    let (head, tail) = first.split_at(first.find("  <page>").unwrap());

    // Two concatenated bzip2 streams, like Wikimedia's multistream dumps
    let mut compressed = Vec::new();
    for part in [head, tail] {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::fast());
        encoder.write_all(part.as_bytes()).unwrap();
        compressed.extend(encoder.finish().unwrap());
    }
    let path = write_file(dir.path(), "itwiktionary.xml.bz2", &compressed);

    let miner = Miner::new(builtin_grammar("it").unwrap(), quiet_options(SplitterConfig::default()));
    let status = miner.mine_path(&path, false).unwrap();
    assert_eq!(status.pages_seen, 1);
    assert_eq!(status.pages_with_transcription, 1);
}

#[test]
fn test_conservation_and_self_containment() {
    let mut xml = numbered_pages(23);
    // Truncated trailing page: never closed
    xml = xml.replace(MEDIAWIKI_CLOSE, "  <page>\n    <title>rotta</title>\n    <ns>0</ns>\n");

    let source = DumpSource::from_reader("memory", std::io::Cursor::new(xml.clone()), DumpCompression::Plain);
    let config = SplitterConfig {
        namespaces: vec![],
        pages_per_chunk: 5,
        ..SplitterConfig::default()
    };

    let parser = PageParser::new(true);
    let mut pages_in_chunks = 0;
    let mut chunk_sizes = Vec::new();
    for chunk in Splitter::new(source, &config).unwrap().chunks() {
        let chunk = chunk.unwrap();
        let pages = parser.parse_str(&chunk.contents).unwrap();
        assert_eq!(pages.len(), chunk.pages);
        pages_in_chunks += chunk.pages;
        chunk_sizes.push(chunk.pages);
    }

    assert_eq!(pages_in_chunks, 23);
    assert_eq!(chunk_sizes, vec![5, 5, 5, 5, 3]);

    // The census counts every opened page, the truncated one included
    let census = DumpSource::from_reader("memory", std::io::Cursor::new(xml), DumpCompression::Plain);
    assert_eq!(count_pages(census).unwrap(), 24);
}

#[test]
fn test_namespace_filter_and_early_cutoff() {
    let xml = numbered_pages(30);

    let source = DumpSource::from_reader("memory", std::io::Cursor::new(xml.clone()), DumpCompression::Plain);
    let chunks: Vec<_> = Splitter::new(source, &SplitterConfig::default())
        .unwrap()
        .chunks()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].pages, 20);
    assert_eq!(chunks[0].pages_total, 30);

    let config = SplitterConfig {
        max_pages: Some(7),
        pages_per_chunk: 100,
        ..SplitterConfig::default()
    };
    let source = DumpSource::from_reader("memory", std::io::Cursor::new(xml), DumpCompression::Plain);
    let miner = Miner::new(builtin_grammar("it").unwrap(), quiet_options(config));
    let status = miner.mine_source(source).unwrap();
    assert_eq!(status.pages_seen, 7);
    assert_eq!(status.pages_with_transcription, 7);
    assert_eq!(status.batches, 1);
}

#[test]
fn test_split_then_mine_directory_matches_streaming() {
    let dir = TempDir::new().unwrap();
    let chunks_dir = dir.path().join("chunks");
    std::fs::create_dir(&chunks_dir).unwrap();
    let path = write_file(dir.path(), "dump.xml", numbered_pages(12).as_bytes());

    let config = SplitterConfig {
        pages_per_chunk: 3,
        ..SplitterConfig::default()
    };
    let summary = Splitter::new(DumpSource::open(&path).unwrap(), &config)
        .unwrap()
        .split_to_dir(&chunks_dir, "it-")
        .unwrap();
    assert_eq!(summary.pages_total, 12);
    assert_eq!(summary.pages_matching_namespace, 8);
    assert_eq!(summary.chunks_written, 3);
    assert!(chunks_dir.join("it-000000001.xml").is_file());
    assert!(chunks_dir.join("it-000000003.xml").is_file());

    let miner = Miner::new(builtin_grammar("it").unwrap(), quiet_options(config));
    let from_dir = miner.mine_path(&chunks_dir, true).unwrap();
    let streamed = miner.mine_path(&path, false).unwrap();

    assert_eq!(from_dir.pages_seen, streamed.pages_seen);
    assert_eq!(from_dir.pages_with_transcription, streamed.pages_with_transcription);
    assert_eq!(from_dir.outcomes, streamed.outcomes);
}

#[test]
fn test_grammar_loaded_from_toml_file() {
    let dir = TempDir::new().unwrap();
    let grammar_path = write_file(
        dir.path(),
        "custom.toml",
        br#"
language = "it"
pronunciation_block = '\{\{-pron-\}\}'
sentinels = ["..."]

[language_block]
open = "=="
prefix = "{{-"
suffix = "-}}"
close = "=="
anchor_open = true
anchor_close = true
target = "it"

[[rules]]
pattern = '\{\{IPA\|([^|}]*)(\|[^|}]*)*\}\}'

[delimiters]
open = "/["
close = "/]"
"#,
    );
    let xml = dump_xml(&[
        TestPage { id: 1, title: "casa", ns: 0, text: CASA },
        TestPage { id: 2, title: "vuoto", ns: 0, text: "== {{-it-}} ==\n{{-pron-}}\n{{IPA|...}}" },
    ]);
    let dump_path = write_file(dir.path(), "dump.xml", xml.as_bytes());

    let grammar = load_grammar(grammar_path.to_str().unwrap()).unwrap();
    let status = Miner::new(grammar, quiet_options(SplitterConfig::default()))
        .mine_path(&dump_path, false)
        .unwrap();
    assert_eq!(status.pages_with_language_block, 2);
    assert_eq!(status.pages_with_transcription, 1);
}

#[test]
fn test_fatal_errors_surface_before_mining() {
    assert!(matches!(
        load_grammar("klingonwiktionary"),
        Err(GrammarError::UnknownGrammar(_))
    ));

    let miner = Miner::new(builtin_grammar("en").unwrap(), quiet_options(SplitterConfig::default()));
    assert!(matches!(
        miner.mine_path(Path::new("/nonexistent/enwiktionary.xml"), false),
        Err(MinerError::Io(_))
    ));
    assert!(matches!(
        miner.mine_path(Path::new("enwiktionary.json"), false),
        Err(MinerError::InvalidFormat(_))
    ));
}
