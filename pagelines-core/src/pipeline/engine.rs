use super::neighbor_merge::NeighborMerger;
use super::region_filter::RegionFilter;
use super::sequencer::Sequencer;
use crate::config::ReaderConfig;
use crate::types::Word;
use regex::Regex;
use std::time::Instant;
use tracing::{debug, trace};

/// One word-to-word step of per-page reconstruction.
pub trait WordStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, words: Vec<Word>) -> Vec<Word>;
}

// Debug configuration for pipeline tracing
#[derive(Debug, Clone, Default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub filter_patterns: Vec<String>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filter_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    fn matches(&self, text: &str) -> bool {
        self.filter_patterns.iter().any(|pattern| {
            // Try regex first, fall back to simple string contains
            match Regex::new(pattern) {
                Ok(regex) => regex.is_match(text),
                Err(_) => text.contains(pattern.as_str()),
            }
        })
    }
}

/// Log the words of interest as they leave a stage
pub fn debug_pipeline_words(stage_name: &str, words: &[Word], debug_config: &DebugConfig) {
    if !debug_config.enabled || debug_config.filter_patterns.is_empty() {
        return;
    }

    let matching: Vec<_> = words
        .iter()
        .enumerate()
        .filter(|(_, word)| debug_config.matches(&word.text))
        .collect();

    if matching.is_empty() {
        return;
    }

    debug!(stage = stage_name, count = matching.len(), "Matching words");
    for (index, word) in matching {
        let preview: String = if word.text.chars().count() > 50 {
            format!("{}...", word.text.chars().take(47).collect::<String>())
        } else {
            word.text.clone()
        };
        debug!(
            stage = stage_name,
            index,
            id = ?word.id,
            text = %preview,
            x0 = word.bbox.x0,
            y0 = word.bbox.y0,
            x1 = word.bbox.x1,
            y1 = word.bbox.y1,
            font_size = word.font_size(),
            "  word"
        );
    }
}

/// Ordered stage list for one page: sequencing, optional neighbor merging,
/// region filtering.
pub struct PageEngine {
    stages: Vec<Box<dyn WordStage>>,
    debug_config: DebugConfig,
}

impl PageEngine {
    pub fn for_config(config: &ReaderConfig, page_height: f64) -> Self {
        let mut stages: Vec<Box<dyn WordStage>> = vec![Box::new(Sequencer::new(config.sort_algorithm))];
        if config.merge_close_text_neighbor {
            stages.push(Box::new(NeighborMerger));
        }
        stages.push(Box::new(RegionFilter::new(config, page_height)));

        Self {
            stages,
            debug_config: DebugConfig::disabled(),
        }
    }

    pub fn with_debug(mut self, debug_config: DebugConfig) -> Self {
        self.debug_config = debug_config;
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, words: Vec<Word>) -> Vec<Word> {
        self.stages
            .iter()
            .fold(words, |words, stage| self.run_stage(stage.as_ref(), words))
    }

    /// Same as `run`, keeping a copy of the words after every stage
    pub fn run_capturing(&self, words: Vec<Word>) -> Vec<(String, Vec<Word>)> {
        let mut captured = Vec::with_capacity(self.stages.len());
        let mut current = words;

        for stage in &self.stages {
            current = self.run_stage(stage.as_ref(), current);
            captured.push((stage.name().to_string(), current.clone()));
        }

        captured
    }

    fn run_stage(&self, stage: &dyn WordStage, words: Vec<Word>) -> Vec<Word> {
        let before = words.len();
        let started = Instant::now();
        let words = stage.apply(words);

        trace!(stage = stage.name(), elapsed = ?started.elapsed(), "Stage finished");
        debug!(stage = stage.name(), before, after = words.len(), "Stage applied");
        debug_pipeline_words(stage.name(), &words, &self.debug_config);

        words
    }
}
