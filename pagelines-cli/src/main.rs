use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Import from pagelines-core
use pagelines_core::{
    CompactLineAlgorithm, DebugConfig, ExtractorImpl, JsonFragmentExtractor, PageStages, PdfTextReader,
    ReaderConfig, SortAlgorithm,
};

// Import CLI utilities
use pagelines_cli::{extract_texts_cached, FileStorage, NoOpStorage, TextsStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Reading-ordered words per page
    Words,
    /// Lines with member words and metadata
    Lines,
    /// Lines with text and boxes only
    Compact,
    /// Scanned-document verdict
    Scanned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CompactAlgorithmArg {
    #[value(name = "middle_y")]
    MiddleY,
    #[value(name = "y0")]
    Y0,
}

impl From<CompactAlgorithmArg> for CompactLineAlgorithm {
    fn from(arg: CompactAlgorithmArg) -> Self {
        match arg {
            CompactAlgorithmArg::MiddleY => CompactLineAlgorithm::MiddleY,
            CompactAlgorithmArg::Y0 => CompactLineAlgorithm::Y0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Pick by file extension
    Auto,
    /// Text-content dump (JSON)
    Json,
    /// PDF via lopdf
    Lopdf,
}

#[derive(Parser)]
#[command(name = "pagelines")]
#[command(about = "Rebuild reading-ordered words and lines from PDF page text")]
struct Args {
    /// Path to the PDF (or text-content dump) to process
    #[arg(short, long)]
    input: String,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Lines)]
    output_format: OutputFormat,

    /// Compact line clustering (defaults to the config value)
    #[arg(long, value_enum)]
    compact_algorithm: Option<CompactAlgorithmArg>,

    #[arg(long, value_enum, default_value_t = Backend::Auto)]
    backend: Backend,

    /// Keep fragment text as extracted (no spaced-letter collapsing)
    #[arg(long)]
    raw: bool,

    /// Do not merge close text neighbors
    #[arg(long)]
    no_merge: bool,

    /// Plain (y0, x0) ordering instead of the row-tolerant sort
    #[arg(long)]
    simple_sort: bool,

    /// Keep words in the header band
    #[arg(long)]
    keep_header: bool,

    /// Keep words in the footer band
    #[arg(long)]
    keep_footer: bool,

    /// Debug logging and extractor diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Log words matching this pattern after every stage (regex or substring, repeatable)
    #[arg(long = "trace-text")]
    trace_text: Vec<String>,

    /// Dump every intermediate stage of this page (1-based) and exit
    #[arg(long)]
    dump_stages: Option<u32>,

    /// Directory for stage dump output
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,

    /// Skip cache and force fresh processing
    #[arg(long)]
    skip_cache: bool,

    /// Cache directory (default: user cache dir)
    #[arg(long)]
    cache_dir: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let input = Path::new(&args.input);
    if !input.exists() {
        bail!("Input not found at: {}", args.input);
    }

    let config = build_config(&args);

    let extractor = select_extractor(args.backend, input)?;
    let debug_config = DebugConfig::new(!args.trace_text.is_empty(), args.trace_text.clone());
    let reader = PdfTextReader::new(Box::new(extractor), config).with_debug(debug_config);

    info!(input = %args.input, extractor = reader.extractor_name(), "Processing");

    // Stage dump mode: capture and save all intermediates of one page
    if let Some(page_num) = args.dump_stages {
        let doc = reader.open_file(input)?;
        let stages = reader
            .capture_stages(doc.as_ref(), page_num)
            .with_context(|| format!("Stage dump of page {page_num} failed"))?;
        save_stages(&stages, &args.stages_dir)?;
        info!("All stages dumped to: {}", args.stages_dir);
        return Ok(());
    }

    let storage: Box<dyn TextsStorage> = if args.skip_cache {
        Box::new(NoOpStorage::new())
    } else {
        let cache_dir = args
            .cache_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(FileStorage::default_dir);
        Box::new(FileStorage::new(cache_dir)?)
    };

    let texts = extract_texts_cached(&reader, input, storage.as_ref())?;

    let json = match args.output_format {
        OutputFormat::Words => to_json(&texts)?,
        OutputFormat::Lines => to_json(&reader.get_lines_from_texts(&texts))?,
        OutputFormat::Compact => {
            let algorithm = args
                .compact_algorithm
                .map(CompactLineAlgorithm::from)
                .unwrap_or(reader.config().compact_line_algorithm);
            to_json(&reader.get_compact_lines_from_texts(&texts, algorithm))?
        }
        OutputFormat::Scanned => to_json(&serde_json::json!({
            "scanned": reader.is_scanned(&texts),
            "pages": texts.len(),
        }))?,
    };

    match &args.output {
        Some(output_path) => {
            std::fs::write(output_path, json).with_context(|| format!("Failed to write {output_path}"))?;
            info!("Results saved to: {}", output_path);
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file (or defaults) with command-line overrides applied
fn build_config(args: &Args) -> ReaderConfig {
    let mut config = ReaderConfig::load_with_fallback(args.config.as_deref());

    if args.verbose {
        config.verbose = true;
    }
    if args.raw {
        config.raw = true;
    }
    if args.no_merge {
        config.merge_close_text_neighbor = false;
    }
    if args.simple_sort {
        config.sort_algorithm = SortAlgorithm::Simple;
    }
    if args.keep_header {
        config.exclude_header = false;
    }
    if args.keep_footer {
        config.exclude_footer = false;
    }
    if let Some(algorithm) = args.compact_algorithm {
        config.compact_line_algorithm = algorithm.into();
    }

    config
}

fn select_extractor(backend: Backend, input: &Path) -> Result<ExtractorImpl> {
    match backend {
        Backend::Auto => ExtractorImpl::for_path(input)
            .ok_or_else(|| anyhow!("No extractor for {} (try --backend)", input.display())),
        Backend::Json => Ok(ExtractorImpl::Json(JsonFragmentExtractor::new())),
        #[cfg(feature = "lopdf-backend")]
        Backend::Lopdf => Ok(ExtractorImpl::Lopdf(pagelines_core::LopdfExtractor::new())),
        #[cfg(not(feature = "lopdf-backend"))]
        Backend::Lopdf => Err(anyhow!(
            "lopdf backend not compiled in!\n\
             Compile with: --features lopdf-backend"
        )),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn save_stages(stages: &PageStages, output_dir: &str) -> Result<()> {
    use std::fs;
    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)?;

    // Stage 0: Raw fragments
    let fragments_path = dir.join("stage0_fragments.json");
    fs::write(&fragments_path, to_json(&stages.fragments)?)?;
    info!("  {} ({} fragments)", fragments_path.display(), stages.fragments.len());

    // Stage 1: Mapped words
    let mapped_path = dir.join("stage1_mapped.json");
    fs::write(&mapped_path, to_json(&stages.mapped)?)?;
    info!("  {} ({} words)", mapped_path.display(), stages.mapped.len());

    // Stage 2..n: one file per word stage
    for (index, (name, words)) in stages.stages.iter().enumerate() {
        let stage_path = dir.join(format!("stage{}_{}.json", index + 2, name));
        fs::write(&stage_path, to_json(words)?)?;
        info!("  {} ({} words)", stage_path.display(), words.len());
    }

    // Summary file: quick reference for validation scripts
    let stage_counts: serde_json::Map<String, serde_json::Value> = stages
        .stages
        .iter()
        .map(|(name, words)| (name.clone(), words.len().into()))
        .collect();
    let summary = serde_json::json!({
        "page_num": stages.page_num,
        "lang": stages.lang,
        "viewport": stages.viewport,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "fragments": stages.fragments.len(),
        "mapped": stages.mapped.len(),
        "stage_counts": stage_counts,
    });
    let summary_path = dir.join("summary.json");
    fs::write(&summary_path, to_json(&summary)?)?;
    info!("  {}", summary_path.display());

    Ok(())
}
