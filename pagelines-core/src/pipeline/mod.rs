// Page reconstruction pipeline
// Per-page stages turning raw fragments into ordered words, then page words into lines:
// - fragment_mapper.rs: fragments -> words in page coordinates, text normalization
// - sequencer.rs: reading order (robust / simple comparators)
// - neighbor_merge.rs: coalesce split glyphs, short runs and bullet markers
// - region_filter.rs: header/footer bands, dense ids
// - line_assembly.rs: words -> lines
// - compact_lines.rs: words -> compact lines (middle_y / y0)
// - scan_detection.rs: scanned-document heuristic
// - engine.rs: WordStage trait, PageEngine, pipeline tracing

pub mod compact_lines;
pub mod engine;
pub mod fragment_mapper;
pub mod line_assembly;
pub mod neighbor_merge;
pub mod region_filter;
pub mod scan_detection;
pub mod sequencer;

pub use compact_lines::compact_lines;
pub use engine::{debug_pipeline_words, DebugConfig, PageEngine, WordStage};
pub use fragment_mapper::{map_fragments, normalize_text};
pub use line_assembly::assemble_lines;
pub use neighbor_merge::{merge_neighbors, NeighborMerger};
pub use region_filter::{filter_regions, RegionFilter};
pub use scan_detection::is_scanned;
pub use sequencer::{sequence_words, Sequencer};
