//! Page parser for self-contained MediaWiki export fragments

use crate::error::MinerError;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default namespace of the MediaWiki export schema 0.10
pub const EXPORT_NAMESPACE: &str = "http://www.mediawiki.org/xml/export-0.10/";

/// One MediaWiki page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page ID
    pub id: String,
    /// Page title (empty if absent)
    pub title: String,
    /// `<ns>` value, only filled by full parsing
    pub namespace: Option<i32>,
    /// ID of the first revision, only filled by full parsing
    pub revision_id: Option<String>,
    /// Timestamp of the first revision, only filled by full parsing
    pub revision_timestamp: Option<DateTime<Utc>>,
    /// Wikitext of the first revision (empty if absent)
    pub revision_text: String,
}

/// Element whose text is being collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Namespace,
    RevisionId,
    RevisionTimestamp,
    RevisionText,
}

/// Partial page being built from XML events
#[derive(Debug, Default)]
struct PartialPage {
    id: Option<String>,
    title: Option<String>,
    namespace: Option<String>,
    revisions_seen: usize,
    revision_id: Option<String>,
    revision_timestamp: Option<String>,
    revision_text: Option<String>,
}

impl PartialPage {
    fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Title => &mut self.title,
            Field::Namespace => &mut self.namespace,
            Field::RevisionId => &mut self.revision_id,
            Field::RevisionTimestamp => &mut self.revision_timestamp,
            Field::RevisionText => &mut self.revision_text,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn finish(self, full_parsing: bool) -> Result<Page, MinerError> {
        let id = self
            .id
            .ok_or_else(|| MinerError::InvalidFormat("<page> without <id>".to_string()))?;

        let mut page = Page {
            id,
            title: self.title.unwrap_or_default(),
            revision_text: self.revision_text.unwrap_or_default(),
            ..Page::default()
        };

        if full_parsing {
            page.namespace = self.namespace.and_then(|ns| ns.trim().parse().ok());
            page.revision_id = self.revision_id;
            page.revision_timestamp = self.revision_timestamp.and_then(|ts| {
                DateTime::parse_from_rfc3339(ts.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            });
        }

        Ok(page)
    }
}

/// Parses chunk XML into pages.
///
/// Cheap mode (the default for mining) keeps only id, title and text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageParser {
    full_parsing: bool,
}

impl PageParser {
    pub fn new(full_parsing: bool) -> Self {
        Self { full_parsing }
    }

    /// Parse a chunk held in memory
    pub fn parse_str(&self, xml: &str) -> Result<Vec<Page>, MinerError> {
        self.parse_reader(xml.as_bytes())
    }

    /// Parse a standalone `.xml` file (e.g. a chunk written by the splitter)
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Page>, MinerError> {
        let file = File::open(path.as_ref())?;
        self.parse_reader(BufReader::new(file))
    }

    fn parse_reader<R: BufRead>(&self, source: R) -> Result<Vec<Page>, MinerError> {
        let mut reader = Reader::from_reader(source);
        let mut buf = Vec::with_capacity(8192);
        let mut pages = Vec::new();

        // Element names from the root down to the current element
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut current: Option<PartialPage> = None;
        let mut field: Option<Field> = None;
        let mut text_buf = String::new();
        let mut saw_root = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let name = e.name().as_ref().to_vec();

                    if path.is_empty() {
                        check_root(e, saw_root)?;
                        saw_root = true;
                    } else if path.len() == 1 && name == b"page" {
                        current = Some(PartialPage::default());
                    } else if let Some(ref mut page) = current {
                        if path.len() == 2 && name == b"revision" {
                            page.revisions_seen += 1;
                        }
                        field = self.field_for(&path, &name, page.revisions_seen);
                        text_buf.clear();
                    }

                    path.push(name);
                }
                Event::Empty(ref e) => {
                    if path.is_empty() {
                        check_root(e, saw_root)?;
                        saw_root = true;
                    } else if path.len() == 2 && e.name().as_ref() == b"revision" {
                        if let Some(ref mut page) = current {
                            page.revisions_seen += 1;
                        }
                    }
                }
                Event::Text(ref e) => {
                    if field.is_some() {
                        text_buf.push_str(&e.unescape()?);
                    }
                }
                Event::CData(ref e) => {
                    if field.is_some() {
                        text_buf.push_str(&String::from_utf8(e.to_vec())?);
                    }
                }
                Event::End(_) => {
                    let name = path.pop().unwrap_or_default();

                    if let Some(f) = field.take() {
                        if let Some(ref mut page) = current {
                            page.set(f, std::mem::take(&mut text_buf));
                        }
                    } else if path.len() == 1 && name == b"page" {
                        if let Some(page) = current.take() {
                            pages.push(page.finish(self.full_parsing)?);
                        }
                    }
                }
                Event::Eof => {
                    if !saw_root {
                        return Err(MinerError::InvalidFormat(
                            "no <mediawiki> root element".to_string(),
                        ));
                    }
                    if let Some(open) = path.last() {
                        return Err(MinerError::XmlParse(format!(
                            "unexpected end of document inside <{}>",
                            String::from_utf8_lossy(open)
                        )));
                    }
                    break;
                }
                _ => {}
            }

            buf.clear();
        }

        Ok(pages)
    }

    /// Which page field, if any, an element at this depth carries
    fn field_for(&self, path: &[Vec<u8>], name: &[u8], revisions_seen: usize) -> Option<Field> {
        match (path.len(), name) {
            (2, b"id") => Some(Field::Id),
            (2, b"title") => Some(Field::Title),
            (2, b"ns") if self.full_parsing => Some(Field::Namespace),
            (3, _) if revisions_seen == 1 && path[2] == b"revision" => match name {
                b"text" => Some(Field::RevisionText),
                b"id" if self.full_parsing => Some(Field::RevisionId),
                b"timestamp" if self.full_parsing => Some(Field::RevisionTimestamp),
                _ => None,
            },
            _ => None,
        }
    }
}

/// The root must be a single `<mediawiki>` in the export namespace
fn check_root(e: &BytesStart<'_>, saw_root: bool) -> Result<(), MinerError> {
    if saw_root {
        return Err(MinerError::XmlParse("multiple root elements".to_string()));
    }
    if e.name().as_ref() != b"mediawiki" {
        return Err(MinerError::InvalidFormat(format!(
            "expected <mediawiki> root, found <{}>",
            String::from_utf8_lossy(e.name().as_ref())
        )));
    }

    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"xmlns" {
            let value = attr.unescape_value()?;
            if value == EXPORT_NAMESPACE {
                return Ok(());
            }
            return Err(MinerError::InvalidFormat(format!(
                "unsupported export namespace '{}'",
                value
            )));
        }
    }

    Err(MinerError::InvalidFormat(
        "<mediawiki> root has no export namespace".to_string(),
    ))
}
