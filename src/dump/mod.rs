//! Dump reading: byte sources, the streaming splitter and the page parser
//!
//! ```text
//! dump.xml[.bz2] ──► DumpSource ──► Splitter ──► Chunk (standalone XML)
//!                                                   │
//!                                                   ▼
//!                                              PageParser ──► Vec<Page>
//! ```
//!
//! The splitter only looks at three line markers and never builds an XML
//! tree, so memory stays bounded by `pages_per_chunk` regardless of dump
//! size. Each chunk is wrapped in the export root element and can be parsed
//! (or written to disk and parsed later) on its own.

pub mod page;
pub mod source;
pub mod splitter;

pub use page::{Page, PageParser, EXPORT_NAMESPACE};
pub use source::{DumpCompression, DumpSource};
pub use splitter::{
    chunk_file_name, count_pages, Chunk, ChunkIter, SplitSummary, Splitter, MEDIAWIKI_CLOSE,
    MEDIAWIKI_OPEN,
};
