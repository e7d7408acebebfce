use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use wiktminer::{
    config::Config,
    grammar::load_grammar,
    miner::{ExtractionOutcome, Miner, MinerOptions},
};

/// Output row format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated `word<TAB>IPA`
    Tsv,
    /// One JSON object per page
    Jsonl,
}

#[derive(Debug, Args)]
pub struct MineArgs {
    /// Grammar: built-in name (e.g. `it`, `enwiktionary`) or TOML file path
    pub grammar: String,

    /// Dump file (.xml or .xml.bz2, `-` for stdin) or chunk directory
    pub dump: PathBuf,

    /// Mine the `.xml` chunk files inside DUMP
    #[arg(long)]
    pub from_dir: bool,

    /// Keep only pages in these namespaces
    #[arg(long, num_args = 1..)]
    pub ns: Vec<i32>,

    /// Pages per chunk
    #[arg(long)]
    pub pages_per_chunk: Option<usize>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Print pages with and without transcription
    #[arg(long, conflicts_with = "without")]
    pub all: bool,

    /// Print only pages without transcription
    #[arg(long)]
    pub without: bool,

    /// Sort rows by word
    #[arg(long)]
    pub sort: bool,

    /// Shortcut for `--ns 0 --format tsv --sort`
    #[arg(long)]
    pub canonical: bool,

    /// Write rows to this file instead of stdout
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Row format
    #[arg(long, value_enum, default_value = "tsv")]
    pub format: OutputFormat,

    /// Print mining statistics
    #[arg(long)]
    pub stats: bool,

    /// Hide the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

/// Which outcomes become rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    WithTranscription,
    WithoutTranscription,
    All,
}

impl Selection {
    fn accepts(self, outcome: &ExtractionOutcome) -> bool {
        match self {
            Selection::WithTranscription => outcome.found_transcription,
            Selection::WithoutTranscription => !outcome.found_transcription,
            Selection::All => true,
        }
    }
}

pub fn mine(config: Config, args: MineArgs) -> Result<()> {
    let mut splitter = config.splitter;
    let mut format = args.format;
    let mut sort = args.sort;

    if !args.ns.is_empty() {
        splitter.namespaces = args.ns;
    }
    if let Some(k) = args.pages_per_chunk {
        splitter.pages_per_chunk = k;
    }
    if args.max_pages.is_some() {
        splitter.max_pages = args.max_pages;
    }
    if args.canonical {
        splitter.namespaces = vec![0];
        format = OutputFormat::Tsv;
        sort = true;
    }

    let selection = if args.all {
        Selection::All
    } else if args.without {
        Selection::WithoutTranscription
    } else {
        Selection::WithTranscription
    };

    let grammar = load_grammar(&args.grammar)
        .with_context(|| format!("Failed to load grammar '{}'", args.grammar))?;
    info!(
        "Grammar '{}' ({}), target language block '{}'",
        grammar.language(),
        grammar.mw_type(),
        grammar.target()
    );

    let miner = Miner::new(
        grammar,
        MinerOptions {
            splitter,
            quiet: args.quiet,
        },
    );

    let mut status = miner
        .mine_path(&args.dump, args.from_dir)
        .with_context(|| format!("Failed to mine {}", args.dump.display()))?;

    if sort {
        status.sort_outcomes();
    }

    let writer: Box<dyn Write> = match &args.output_file {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    let rows = write_rows(
        &mut writer,
        status.outcomes.iter().filter(|o| selection.accepts(o)),
        format,
        selection == Selection::All,
    )?;
    writer.flush()?;

    if let Some(path) = &args.output_file {
        info!("Wrote {} rows to {}", rows, path.display());
    }

    if args.stats {
        eprintln!("\n{}", status);
    }

    Ok(())
}

/// Write one row per outcome, returning the number of rows
fn write_rows<'a, W, I>(writer: &mut W, outcomes: I, format: OutputFormat, detailed: bool) -> Result<usize>
where
    W: Write,
    I: Iterator<Item = &'a ExtractionOutcome>,
{
    let mut rows = 0;
    for outcome in outcomes {
        let ipa = outcome.transcription.as_deref().unwrap_or_default();
        match format {
            OutputFormat::Jsonl => writeln!(writer, "{}", serde_json::to_string(outcome)?)?,
            OutputFormat::Tsv if detailed => writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                outcome.found_block, outcome.found_transcription, outcome.id, outcome.title, ipa
            )?,
            OutputFormat::Tsv => writeln!(writer, "{}\t{}", outcome.title, ipa)?,
        }
        rows += 1;
    }
    Ok(rows)
}
