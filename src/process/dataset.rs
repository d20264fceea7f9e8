use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::process::date_parser::{self, TemporalKey};
use crate::schema::{CanonicalRecord, SourceFamily};

/// A canonical record together with its derived date key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedRecord {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    #[serde(flatten)]
    pub key: TemporalKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub source: String,
    pub last_updated: String,
    pub description: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_records: usize,
}

/// The envelope written out as `{"metadata": ..., "data": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub metadata: Metadata,
    #[serde(rename = "data")]
    pub records: Vec<DatedRecord>,
}

impl Dataset {
    pub fn latest(&self) -> Option<&DatedRecord> {
        self.records.last()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolve each record's date and wrap the result in a `Dataset`.
///
/// `last_updated` is the only run-dependent value; the caller supplies it.
pub fn assemble(
    records: Vec<CanonicalRecord>,
    family: &SourceFamily,
    last_updated: DateTime<Utc>,
) -> Result<Dataset, PipelineError> {
    let total_in = records.len();
    let mut dated = Vec::with_capacity(total_in);

    for (index, record) in records.into_iter().enumerate() {
        let raw = record.get(family.date_field);
        if raw.is_null() && family.skip_undated_rows {
            continue;
        }
        let key = date_parser::resolve(raw, family.encoding)
            .map_err(|source| PipelineError::TemporalFormat { index, source })?;
        dated.push(DatedRecord { record, key });
    }

    if dated.len() != total_in {
        debug!(
            family = family.id,
            skipped = total_in - dated.len(),
            "dropped undated rows"
        );
    }

    let metadata = Metadata {
        source: family.source.to_string(),
        last_updated: last_updated.to_rfc3339(),
        description: family.description.to_string(),
        start_date: dated.first().map(|r| r.key.date_string.clone()),
        end_date: dated.last().map(|r| r.key.date_string.clone()),
        total_records: dated.len(),
    };

    Ok(Dataset {
        metadata,
        records: dated,
    })
}
