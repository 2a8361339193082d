use crate::config::{CompactLineAlgorithm, ReaderConfig, ScannedThreshold};
use crate::error::ExtractResult;
use crate::extractors::{ExtractedDocument, OpenOptions, PageTextExtractor};
use crate::pipeline::{self, map_fragments, DebugConfig, PageEngine};
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Collects timings for the reader's steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        debug!(step = step_name, elapsed_ms = elapsed.as_millis() as u64, "Step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn total(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

/// Reconstruct one page: map fragments, then run the word stages.
pub fn reconstruct_page(
    content: &TextContent,
    viewport: &Viewport,
    page_num: u32,
    config: &ReaderConfig,
    debug_config: &DebugConfig,
) -> PageText {
    let mapped = map_fragments(&content.fragments, &viewport.transform, page_num, config.raw);
    pipeline::debug_pipeline_words("FragmentMapper", &mapped, debug_config);

    let words = PageEngine::for_config(config, viewport.height)
        .with_debug(debug_config.clone())
        .run(mapped);

    PageText {
        words,
        lang: content.lang.clone(),
    }
}

/// Text layout reader: opens documents through an extractor and rebuilds
/// words, lines and compact lines from their positioned fragments.
pub struct PdfTextReader {
    extractor: Box<dyn PageTextExtractor>,
    config: ReaderConfig,
    debug_config: DebugConfig,
}

impl PdfTextReader {
    pub fn new(extractor: Box<dyn PageTextExtractor>, config: ReaderConfig) -> Self {
        Self {
            extractor,
            config,
            debug_config: DebugConfig::disabled(),
        }
    }

    pub fn with_debug(mut self, debug_config: DebugConfig) -> Self {
        self.debug_config = debug_config;
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    fn open_options(&self) -> OpenOptions {
        OpenOptions {
            verbose: self.config.verbose,
        }
    }

    pub fn open(&self, bytes: &[u8]) -> ExtractResult<Box<dyn ExtractedDocument>> {
        self.extractor.open(bytes, &self.open_options())
    }

    pub fn open_file(&self, path: &Path) -> ExtractResult<Box<dyn ExtractedDocument>> {
        info!(path = %path.display(), extractor = self.extractor.name(), "Opening document");
        self.extractor.open_file(path, &self.open_options())
    }

    /// Words of every page, keyed by 1-based page number.
    ///
    /// Extraction is sequential; reconstruction runs per page in parallel.
    pub fn get_texts(&self, doc: &dyn ExtractedDocument) -> ExtractResult<PageTexts> {
        let mut profiler = StepProfiler::new(true);

        let extracted = profiler.time_step("extract", || -> ExtractResult<Vec<_>> {
            (1..=doc.page_count())
                .map(|page_num| -> ExtractResult<(u32, Viewport, TextContent)> {
                    let page = doc.page(page_num)?;
                    Ok((page_num, page.viewport(), page.text_content()?))
                })
                .collect()
        })?;

        let fragment_count: usize = extracted.iter().map(|(_, _, content)| content.fragments.len()).sum();

        let pages: PageTexts = profiler.time_step("reconstruct", || {
            extracted
                .par_iter()
                .map(|(page_num, viewport, content)| {
                    let page = reconstruct_page(content, viewport, *page_num, &self.config, &self.debug_config);
                    (*page_num, page)
                })
                .collect()
        });

        info!(
            pages = pages.len(),
            fragments = fragment_count,
            words = pages.values().map(|p| p.words.len()).sum::<usize>(),
            elapsed_ms = profiler.total().as_millis() as u64,
            "Extracted page texts"
        );

        Ok(pages)
    }

    pub fn get_lines_from_texts(&self, texts: &PageTexts) -> PageLines {
        texts
            .iter()
            .map(|(page_num, page)| (*page_num, pipeline::assemble_lines(&page.words)))
            .collect()
    }

    pub fn get_compact_lines_from_texts(
        &self,
        texts: &PageTexts,
        algorithm: CompactLineAlgorithm,
    ) -> CompactPageLines {
        texts
            .iter()
            .map(|(page_num, page)| (*page_num, pipeline::compact_lines(&page.words, algorithm)))
            .collect()
    }

    /// Scan heuristic with the configured thresholds
    pub fn is_scanned(&self, texts: &PageTexts) -> bool {
        self.is_scanned_with(texts, &self.config.scanned_threshold)
    }

    pub fn is_scanned_with(&self, texts: &PageTexts, threshold: &ScannedThreshold) -> bool {
        pipeline::is_scanned(texts, threshold)
    }

    /// Every intermediate result of one page, for diagnostics
    pub fn capture_stages(&self, doc: &dyn ExtractedDocument, page_num: u32) -> ExtractResult<PageStages> {
        let page = doc.page(page_num)?;
        let viewport = page.viewport();
        let content = page.text_content()?;

        let mapped = map_fragments(&content.fragments, &viewport.transform, page_num, self.config.raw);
        let stages = PageEngine::for_config(&self.config, viewport.height)
            .with_debug(self.debug_config.clone())
            .run_capturing(mapped.clone());

        Ok(PageStages {
            page_num,
            viewport,
            lang: content.lang,
            fragments: content.fragments,
            mapped,
            stages,
        })
    }
}
