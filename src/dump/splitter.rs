//! Streaming dump splitter
//!
//! Cuts a MediaWiki export into chunks of whole `<page>` elements, each
//! wrapped in the export root element so it parses on its own. Only three
//! line-level markers are recognized (`<page>`, `</page>`, `<ns>N</ns>`);
//! real XML parsing happens later, per chunk.

use super::source::DumpSource;
use crate::config::SplitterConfig;
use crate::error::MinerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, trace};

/// Export root open tag, with the namespace declarations of schema 0.10
pub const MEDIAWIKI_OPEN: &str = "<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:schemaLocation=\"http://www.mediawiki.org/xml/export-0.10/ http://www.mediawiki.org/xml/export-0.10.xsd\" version=\"0.10\">\n";
/// Export root close tag
pub const MEDIAWIKI_CLOSE: &str = "</mediawiki>";

const PAGE_OPEN: &str = "<page>";
const PAGE_CLOSE: &str = "</page>";

static RE_NAMESPACE: OnceLock<Regex> = OnceLock::new();

fn namespace_regex() -> &'static Regex {
    RE_NAMESPACE.get_or_init(|| Regex::new(r"^<ns>([0-9]+)</ns>").unwrap())
}

/// A bounded batch of pages, as a standalone XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Pages opened in the dump so far, accepted or not
    pub pages_total: usize,
    /// Pages accepted by the namespace filter so far
    pub pages_matching_namespace: usize,
    /// 1-based chunk index
    pub index: usize,
    /// Pages contained in this chunk
    pub pages: usize,
    /// Wrapped XML contents
    pub contents: String,
}

impl Chunk {
    /// File name used when the chunk is written to disk
    pub fn file_name(&self, prefix: &str) -> String {
        chunk_file_name(prefix, self.index)
    }
}

/// `<prefix><9-digit index>.xml`
pub fn chunk_file_name(prefix: &str, index: usize) -> String {
    format!("{}{:09}.xml", prefix, index)
}

/// Totals reported after splitting a dump to disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub pages_total: usize,
    pub pages_matching_namespace: usize,
    pub chunks_written: usize,
}

/// Splits one dump source into chunks
#[derive(Debug)]
pub struct Splitter {
    source: DumpSource,
    namespaces: HashSet<i32>,
    pages_per_chunk: usize,
    max_pages: Option<usize>,
}

impl Splitter {
    /// Create a splitter over `source`
    pub fn new(source: DumpSource, config: &SplitterConfig) -> Result<Self, MinerError> {
        if config.pages_per_chunk == 0 {
            return Err(MinerError::Config(
                "pages_per_chunk must be at least 1".to_string(),
            ));
        }
        if config.max_pages == Some(0) {
            return Err(MinerError::Config("max_pages must be at least 1".to_string()));
        }

        Ok(Self {
            source,
            namespaces: config.namespaces.iter().copied().collect(),
            pages_per_chunk: config.pages_per_chunk,
            max_pages: config.max_pages,
        })
    }

    /// Consume the splitter and iterate over its chunks.
    ///
    /// The iterator reads the source once and cannot be restarted.
    pub fn chunks(self) -> ChunkIter {
        ChunkIter {
            source: Some(self.source),
            namespaces: self.namespaces,
            pages_per_chunk: self.pages_per_chunk,
            max_pages: self.max_pages,
            state: SplitState::Waiting,
            page_namespace: NamespaceState::Unknown,
            page_buf: String::new(),
            chunk_buf: String::new(),
            pages_in_chunk: 0,
            pages_total: 0,
            pages_matching: 0,
            chunk_index: 0,
            line: Vec::with_capacity(8192),
        }
    }

    /// Write every chunk to `<output_dir>/<prefix><index>.xml`
    pub fn split_to_dir(self, output_dir: &Path, prefix: &str) -> Result<SplitSummary, MinerError> {
        if !output_dir.is_dir() {
            return Err(MinerError::InvalidFormat(format!(
                "output directory must exist (got '{}')",
                output_dir.display()
            )));
        }

        let mut summary = SplitSummary::default();
        for chunk in self.chunks() {
            let chunk = chunk?;
            let path: PathBuf = output_dir.join(chunk.file_name(prefix));
            std::fs::write(&path, chunk.contents.as_bytes())?;
            debug!("Wrote chunk {} ({} pages) to {}", chunk.index, chunk.pages, path.display());

            summary.pages_total = chunk.pages_total;
            summary.pages_matching_namespace = chunk.pages_matching_namespace;
            summary.chunks_written = chunk.index;
        }

        info!(
            "Split complete: {} pages seen, {} kept, {} chunk files",
            summary.pages_total, summary.pages_matching_namespace, summary.chunks_written
        );
        Ok(summary)
    }
}

/// Count `<page>` markers without buffering or wrapping anything
pub fn count_pages(mut source: DumpSource) -> Result<usize, MinerError> {
    let mut buf = Vec::with_capacity(8192);
    let mut pages = 0;
    while source.read_line(&mut buf)? > 0 {
        if buf.trim_ascii() == PAGE_OPEN.as_bytes() {
            pages += 1;
        }
    }
    Ok(pages)
}

/// Line-level state of the splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
    /// Between pages, waiting for `<page>`
    Waiting,
    /// Buffering a page until `</page>`
    InPage,
}

/// Namespace decision for the page being buffered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamespaceState {
    Unknown,
    Accepted,
    Rejected,
}

/// Outcome of feeding one line to the state machine
enum Step {
    Continue,
    Emit(Chunk),
    /// `max_pages` reached: emit and stop
    Finish(Chunk),
}

/// Single-pass iterator over the chunks of a dump.
///
/// Holds the open source until the input is exhausted, `max_pages` is
/// reached, or a read fails; the source is dropped at that point and the
/// iterator returns `None` from then on.
pub struct ChunkIter {
    source: Option<DumpSource>,
    namespaces: HashSet<i32>,
    pages_per_chunk: usize,
    max_pages: Option<usize>,
    state: SplitState,
    page_namespace: NamespaceState,
    page_buf: String,
    chunk_buf: String,
    pages_in_chunk: usize,
    pages_total: usize,
    pages_matching: usize,
    chunk_index: usize,
    line: Vec<u8>,
}

impl ChunkIter {
    /// Whether the underlying source is still open
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Drop the source, closing the file or stream
    fn release(&mut self) {
        if let Some(source) = self.source.take() {
            trace!("Releasing dump source {} after {} bytes", source.source_name(), source.bytes_read());
        }
    }

    fn feed(&mut self, line: &str) -> Step {
        let stripped = line.trim();

        match self.state {
            SplitState::Waiting => {
                if stripped == PAGE_OPEN {
                    self.state = SplitState::InPage;
                    self.pages_total += 1;
                    self.page_buf.clear();
                    self.page_buf.push_str(line);
                    self.page_namespace = if self.namespaces.is_empty() {
                        NamespaceState::Accepted
                    } else {
                        NamespaceState::Unknown
                    };
                }
                Step::Continue
            }
            SplitState::InPage => {
                if self.page_namespace == NamespaceState::Unknown {
                    if let Some(caps) = namespace_regex().captures(stripped) {
                        // An unparseable number leaves the namespace unknown
                        if let Ok(ns) = caps[1].parse::<i32>() {
                            self.page_namespace = if self.namespaces.contains(&ns) {
                                NamespaceState::Accepted
                            } else {
                                NamespaceState::Rejected
                            };
                        }
                    }
                }

                self.page_buf.push_str(line);

                if stripped != PAGE_CLOSE {
                    return Step::Continue;
                }

                self.state = SplitState::Waiting;
                if self.page_namespace != NamespaceState::Accepted {
                    self.page_buf.clear();
                    return Step::Continue;
                }

                self.chunk_buf.push_str(&self.page_buf);
                self.page_buf.clear();
                self.pages_in_chunk += 1;
                self.pages_matching += 1;

                if self.max_pages == Some(self.pages_matching) {
                    return Step::Finish(self.wrap_chunk());
                }
                if self.pages_in_chunk == self.pages_per_chunk {
                    return Step::Emit(self.wrap_chunk());
                }
                Step::Continue
            }
        }
    }

    fn wrap_chunk(&mut self) -> Chunk {
        self.chunk_index += 1;

        let mut contents =
            String::with_capacity(MEDIAWIKI_OPEN.len() + self.chunk_buf.len() + MEDIAWIKI_CLOSE.len());
        contents.push_str(MEDIAWIKI_OPEN);
        contents.push_str(&self.chunk_buf);
        contents.push_str(MEDIAWIKI_CLOSE);

        let chunk = Chunk {
            pages_total: self.pages_total,
            pages_matching_namespace: self.pages_matching,
            index: self.chunk_index,
            pages: self.pages_in_chunk,
            contents,
        };

        self.chunk_buf.clear();
        self.pages_in_chunk = 0;
        chunk
    }
}

impl Iterator for ChunkIter {
    type Item = Result<Chunk, MinerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let source = self.source.as_mut()?;

            match source.read_line(&mut self.line) {
                Ok(0) => {
                    self.release();
                    if self.state == SplitState::InPage {
                        debug!("Dropping truncated page at end of input");
                        self.page_buf.clear();
                        self.state = SplitState::Waiting;
                    }
                    if self.pages_in_chunk > 0 {
                        return Some(Ok(self.wrap_chunk()));
                    }
                    return None;
                }
                Ok(_) => {}
                Err(e) => {
                    self.release();
                    return Some(Err(e));
                }
            }

            let raw = std::mem::take(&mut self.line);
            let line = match String::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    self.release();
                    return Some(Err(MinerError::Utf8(e)));
                }
            };

            let step = self.feed(&line);

            // Hand the allocation back for the next read
            self.line = line.into_bytes();

            match step {
                Step::Continue => {}
                Step::Emit(chunk) => return Some(Ok(chunk)),
                Step::Finish(chunk) => {
                    debug!("Reached max pages ({}), stopping", self.pages_matching);
                    self.release();
                    return Some(Ok(chunk));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ChunkIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::source::DumpCompression;

    fn page(id: usize, ns: i32) -> String {
        format!(
            "  <page>\n    <title>Word {id}</title>\n    <ns>{ns}</ns>\n    <id>{id}</id>\n    <revision>\n      <id>{rev}</id>\n      <text xml:space=\"preserve\">text {id}</text>\n    </revision>\n  </page>\n",
            id = id,
            ns = ns,
            rev = id * 10
        )
    }

    fn dump(pages: &[(usize, i32)]) -> String {
        let mut xml = String::from("<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\" version=\"0.10\">\n  <siteinfo>\n    <sitename>Wiktionary</sitename>\n  </siteinfo>\n");
        for (id, ns) in pages {
            xml.push_str(&page(*id, *ns));
        }
        xml.push_str("</mediawiki>\n");
        xml
    }

    fn splitter(xml: String, config: SplitterConfig) -> Splitter {
        let source = DumpSource::from_reader(
            "test",
            std::io::Cursor::new(xml.into_bytes()),
            DumpCompression::Plain,
        );
        Splitter::new(source, &config).unwrap()
    }

    fn config(namespaces: Vec<i32>, pages_per_chunk: usize, max_pages: Option<usize>) -> SplitterConfig {
        SplitterConfig {
            namespaces,
            pages_per_chunk,
            max_pages,
        }
    }

    fn collect(splitter: Splitter) -> Vec<Chunk> {
        splitter.chunks().map(|c| c.unwrap()).collect()
    }

    #[test]
    fn test_chunks_are_exactly_sized_except_last() {
        let pages: Vec<_> = (1..=7).map(|i| (i, 0)).collect();
        let chunks = collect(splitter(dump(&pages), config(vec![], 3, None)));

        assert_eq!(chunks.iter().map(|c| c.pages).collect::<Vec<_>>(), vec![3, 3, 1]);
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(chunks.last().unwrap().pages_total, 7);
        assert_eq!(chunks.last().unwrap().pages_matching_namespace, 7);
    }

    #[test]
    fn test_chunk_is_wrapped_in_export_root() {
        let chunks = collect(splitter(dump(&[(1, 0)]), config(vec![], 10, None)));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contents.starts_with(MEDIAWIKI_OPEN));
        assert!(chunks[0].contents.ends_with(MEDIAWIKI_CLOSE));
        assert!(chunks[0].contents.contains("<title>Word 1</title>"));
        // siteinfo is outside any page and never copied
        assert!(!chunks[0].contents.contains("siteinfo"));
    }

    #[test]
    fn test_namespace_filter_discards_other_pages() {
        let chunks = collect(splitter(
            dump(&[(1, 0), (2, 1), (3, 0), (4, 10)]),
            config(vec![0], 10, None),
        ));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].pages, 2);
        assert_eq!(chunks[0].pages_total, 4);
        assert_eq!(chunks[0].pages_matching_namespace, 2);
        assert!(chunks[0].contents.contains("Word 3"));
        assert!(!chunks[0].contents.contains("Word 2"));
        assert!(!chunks[0].contents.contains("Word 4"));
    }

    #[test]
    fn test_first_namespace_line_wins() {
        // A second <ns> line (e.g. inside text) must not flip the decision
        let xml = format!(
            "{}  <page>\n    <ns>1</ns>\n    <id>9</id>\n    <revision><text>\n<ns>0</ns>\n</text></revision>\n  </page>\n{}",
            MEDIAWIKI_OPEN, MEDIAWIKI_CLOSE
        );
        let chunks = collect(splitter(xml, config(vec![0], 10, None)));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_malformed_namespace_line_keeps_looking() {
        let xml = format!(
            "{}  <page>\n    <ns>abc</ns>\n    <ns>0</ns>\n    <id>1</id>\n  </page>\n{}",
            MEDIAWIKI_OPEN, MEDIAWIKI_CLOSE
        );
        let chunks = collect(splitter(xml, config(vec![0], 10, None)));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].pages, 1);
    }

    #[test]
    fn test_max_pages_cuts_off_mid_chunk() {
        let pages: Vec<_> = (1..=10).map(|i| (i, 0)).collect();
        let mut iter = splitter(dump(&pages), config(vec![0], 4, Some(6))).chunks();

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.pages, 4);
        assert!(iter.is_open());

        let second = iter.next().unwrap().unwrap();
        assert_eq!(second.pages, 2);
        assert_eq!(second.pages_matching_namespace, 6);
        assert!(!iter.is_open(), "source must be released at max_pages");

        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_max_pages_smaller_than_chunk() {
        let pages: Vec<_> = (1..=5).map(|i| (i, 0)).collect();
        let chunks = collect(splitter(dump(&pages), config(vec![], 1000, Some(2))));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].pages, 2);
    }

    #[test]
    fn test_truncated_trailing_page_is_dropped() {
        let mut xml = dump(&[(1, 0), (2, 0)]);
        xml.truncate(xml.len() - "</mediawiki>\n".len());
        xml.push_str("  <page>\n    <title>Cut</title>\n    <ns>0</ns>\n");

        let mut iter = splitter(xml, config(vec![], 10, None)).chunks();
        let chunk = iter.next().unwrap().unwrap();
        assert_eq!(chunk.pages, 2);
        assert_eq!(chunk.pages_total, 3);
        assert!(!chunk.contents.contains("Cut"));
        assert!(iter.next().is_none());
        assert!(!iter.is_open());
    }

    #[test]
    fn test_empty_dump_yields_nothing() {
        let chunks = collect(splitter(dump(&[]), config(vec![], 10, None)));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let mut bytes = format!("{}  <page>\n", MEDIAWIKI_OPEN).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let source = DumpSource::from_reader("bad", std::io::Cursor::new(bytes), DumpCompression::Plain);
        let mut iter = Splitter::new(source, &config(vec![], 10, None)).unwrap().chunks();

        assert!(matches!(iter.next(), Some(Err(MinerError::Utf8(_)))));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_rejects_zero_pages_per_chunk() {
        let source = DumpSource::from_reader("x", std::io::Cursor::new(Vec::new()), DumpCompression::Plain);
        assert!(Splitter::new(source, &config(vec![], 0, None)).is_err());
    }

    #[test]
    fn test_count_pages() {
        let xml = dump(&[(1, 0), (2, 1), (3, 0)]);
        let source = DumpSource::from_reader("x", std::io::Cursor::new(xml.into_bytes()), DumpCompression::Plain);
        assert_eq!(count_pages(source).unwrap(), 3);
    }

    #[test]
    fn test_split_to_dir_writes_numbered_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let pages: Vec<_> = (1..=5).map(|i| (i, 0)).collect();
        let summary = splitter(dump(&pages), config(vec![0], 2, None))
            .split_to_dir(dir.path(), "enwikt-")
            .unwrap();

        assert_eq!(
            summary,
            SplitSummary {
                pages_total: 5,
                pages_matching_namespace: 5,
                chunks_written: 3
            }
        );
        for index in 1..=3 {
            let path = dir.path().join(format!("enwikt-{:09}.xml", index));
            assert!(path.is_file(), "missing {}", path.display());
        }
    }

    #[test]
    fn test_split_to_missing_dir_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = splitter(dump(&[(1, 0)]), config(vec![], 2, None))
            .split_to_dir(&dir.path().join("nope"), "");
        assert!(matches!(result, Err(MinerError::InvalidFormat(_))));
    }

    #[test]
    fn test_chunk_file_name_is_zero_padded() {
        assert_eq!(chunk_file_name("", 1), "000000001.xml");
        assert_eq!(chunk_file_name("it-", 123), "it-000000123.xml");
    }
}
