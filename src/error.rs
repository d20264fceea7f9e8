// src/error.rs

use thiserror::Error;

/// The sheet's shape cannot be reconciled with the family layout.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceFormatError {
    #[error("header row {offset} is outside the sheet ({rows} rows)")]
    HeaderOutOfRange { offset: usize, rows: usize },

    #[error("only {resolved} canonical fields matched the header row (need at least {minimum}); labels seen: {labels:?}")]
    InsufficientCoverage {
        resolved: usize,
        minimum: usize,
        labels: Vec<String>,
    },

    #[error("required field `{field}` has no value in any data row")]
    MissingRequiredField { field: String },
}

/// A raw date value could not be decoded into a `TemporalKey`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TemporalFormatError {
    #[error("date value is absent")]
    Absent,

    #[error("cannot parse `{raw}` as a {encoding} date")]
    Unparsable { raw: String, encoding: &'static str },

    #[error("month {month} decoded from `{raw}` is outside 1-12")]
    MonthOutOfRange { raw: String, month: u32 },
}

/// Alias tables are static configuration; these are build-time mistakes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AliasConfigError {
    #[error("source label `{label}` is claimed by both `{first}` and `{second}`")]
    AmbiguousLabel {
        label: String,
        first: String,
        second: String,
    },

    #[error("canonical field `{0}` is declared twice")]
    DuplicateField(String),

    #[error("canonical field `{0}` has no source labels")]
    NoLabels(String),

    #[error("required field `{0}` is not declared in the table")]
    UnknownRequired(String),
}

/// Everything that can fail a single file's normalization run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error(transparent)]
    SourceFormat(#[from] SourceFormatError),

    #[error("record {index}: {source}")]
    TemporalFormat {
        index: usize,
        #[source]
        source: TemporalFormatError,
    },
}
