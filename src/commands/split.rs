use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use wiktminer::{
    config::{Config, SplitterConfig},
    dump::{count_pages, DumpSource, SplitSummary, Splitter},
};

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Dump file (.xml or .xml.bz2, `-` for stdin)
    pub dump: PathBuf,

    /// Directory for the chunk files (must exist)
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Chunk file name prefix
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Keep only pages in these namespaces
    #[arg(long, num_args = 1..)]
    pub ns: Vec<i32>,

    /// Pages per chunk
    #[arg(long)]
    pub pages_per_chunk: Option<usize>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Only the first 1000 pages of namespace 0
    #[arg(long)]
    pub head: bool,

    /// Only count the pages, write nothing
    #[arg(long, conflicts_with_all = ["head", "max_pages"])]
    pub count: bool,

    /// Print split statistics
    #[arg(long)]
    pub stats: bool,
}

pub fn split(config: Config, args: SplitArgs) -> Result<()> {
    let source = DumpSource::open(&args.dump)
        .with_context(|| format!("Failed to open dump: {}", args.dump.display()))?;

    if args.count {
        let pages = count_pages(source)?;
        eprintln!("{}", pages);
        return Ok(());
    }

    let mut splitter_config = if args.head {
        SplitterConfig::head()
    } else {
        config.splitter
    };
    if !args.ns.is_empty() {
        splitter_config.namespaces = args.ns;
    }
    if let Some(k) = args.pages_per_chunk {
        splitter_config.pages_per_chunk = k;
    }
    if args.max_pages.is_some() {
        splitter_config.max_pages = args.max_pages;
    }

    let prefix = args.prefix.unwrap_or(config.output.chunk_prefix);
    info!(
        "Splitting {} into {} ({} pages per chunk)",
        args.dump.display(),
        args.output_dir.display(),
        splitter_config.pages_per_chunk
    );

    let summary = Splitter::new(source, &splitter_config)?
        .split_to_dir(&args.output_dir, &prefix)
        .with_context(|| format!("Failed to split {}", args.dump.display()))?;

    if args.stats {
        write_summary(&mut std::io::stderr().lock(), &summary)?;
    }

    Ok(())
}

fn write_summary<W: Write>(writer: &mut W, summary: &SplitSummary) -> std::io::Result<()> {
    writeln!(writer, "\nSplit Summary")?;
    writeln!(writer, "=============")?;
    writeln!(writer, "Pages seen:          {}", summary.pages_total)?;
    writeln!(writer, "Pages in namespace:  {}", summary.pages_matching_namespace)?;
    writeln!(writer, "Chunks written:      {}", summary.chunks_written)
}
