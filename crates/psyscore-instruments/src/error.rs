use psyscore_core::error::CoreError;
use psyscore_core::models::response::ItemId;
use thiserror::Error;

/// The definition (or a table it is normed against) is internally
/// inconsistent. Raised before any score is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("instrument defines no items")]
    NoItems,

    #[error("item {0} is defined more than once")]
    DuplicateItem(ItemId),

    #[error("item {item} uses unknown response scale '{scale}'")]
    UnknownResponseScale { item: ItemId, scale: String },

    #[error("{context} references unknown item {item}")]
    UnknownItem { context: String, item: ItemId },

    #[error("item {item} is inverted but no scale maximum is declared or inferable")]
    MissingScaleMaximum { item: ItemId },

    #[error("answer key is empty")]
    EmptyAnswerKey,

    #[error("sectioned rule declares no sections")]
    NoSections,

    #[error("section '{section}' range {start}..={end} is invalid for {item_count} items")]
    SectionOutOfBounds {
        section: String,
        start: usize,
        end: usize,
        item_count: usize,
    },

    #[error("section '{0}' is declared more than once")]
    DuplicateSection(String),

    #[error("sections '{first}' and '{second}' overlap")]
    SectionOverlap { first: String, second: String },

    #[error("items {start}..={end} are not covered by any section")]
    SectionGap { start: usize, end: usize },

    #[error("weighted-formula rule references no scales")]
    NoWeightedScales,

    #[error("item {item} is both weighted and unweighted in scale '{scale}'")]
    ConflictingWeight { scale: String, item: ItemId },

    #[error("{context}: range '{label}' has min {min} greater than max {max}")]
    InvertedRange {
        context: String,
        label: String,
        min: f64,
        max: f64,
    },

    #[error("{context}: ranges '{first}' and '{second}' overlap")]
    OverlappingRanges {
        context: String,
        first: String,
        second: String,
    },

    #[error("{context}: gap between ranges '{first}' and '{second}'")]
    RangeGap {
        context: String,
        first: String,
        second: String,
    },

    #[error("normative bin '{bin}': {reason}")]
    InvalidBin { bin: String, reason: String },
}

/// Arithmetic or lookup failure while a score is being computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("scale '{scale}' has no weighted-formula table")]
    MissingScaleTable { scale: String },

    #[error("weighted table for scale '{scale}' references unknown item {item}")]
    UnknownItem { scale: String, item: ItemId },

    #[error("normative bin '{bin}' has no {kind} conversion table for '{scale}'")]
    MissingConversion {
        bin: String,
        kind: &'static str,
        scale: String,
    },

    #[error("{stage} table for '{scale}' is empty")]
    EmptyConversionTable { scale: String, stage: &'static str },

    #[error("non-finite value computed for {0}")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("calculation failed: {0}")]
    Calculation(#[from] CalculationError),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("asset_version {found} is newer than this build supports ({supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("malformed asset: {0}")]
    Malformed(String),

    #[error("invalid asset: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("application is for instrument '{application}', definition is '{definition}'")]
    InstrumentMismatch {
        application: String,
        definition: String,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
