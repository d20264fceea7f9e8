// src/schema/alias.rs

use std::collections::{HashMap, HashSet};

use crate::error::AliasConfigError;

/// One canonical field and the source labels that have meant it,
/// most current label first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAlias {
    pub field: String,
    pub labels: Vec<String>,
}

/// Priority-ordered mapping canonical field → acceptable source labels.
///
/// Built through [`AliasTableBuilder`], which rejects a label claimed by
/// two fields, so lookups never have to break ties at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    fields: Vec<FieldAlias>,
    required: Option<String>,
}

impl AliasTable {
    pub fn builder() -> AliasTableBuilder {
        AliasTableBuilder::default()
    }

    pub fn fields(&self) -> &[FieldAlias] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The field that must carry a value somewhere in the sheet.
    pub fn required(&self) -> Option<&str> {
        self.required.as_deref()
    }

    /// First label of `alias` present in `header`, with its column index.
    pub fn resolve_column<'a>(
        alias: &'a FieldAlias,
        header: &HashMap<String, usize>,
    ) -> Option<(&'a str, usize)> {
        alias
            .labels
            .iter()
            .find_map(|label| header.get(label).map(|&idx| (label.as_str(), idx)))
    }
}

#[derive(Debug, Default)]
pub struct AliasTableBuilder {
    fields: Vec<FieldAlias>,
    required: Option<String>,
}

impl AliasTableBuilder {
    /// Field with labels in preference order.
    pub fn field(mut self, field: &str, labels: &[&str]) -> Self {
        self.fields.push(FieldAlias {
            field: field.to_string(),
            labels: labels.iter().map(|l| l.trim().to_string()).collect(),
        });
        self
    }

    pub fn required(mut self, field: &str) -> Self {
        self.required = Some(field.to_string());
        self
    }

    pub fn build(self) -> Result<AliasTable, AliasConfigError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        let mut seen_fields: HashSet<&str> = HashSet::new();

        for alias in &self.fields {
            if !seen_fields.insert(alias.field.as_str()) {
                return Err(AliasConfigError::DuplicateField(alias.field.clone()));
            }
            if alias.labels.is_empty() {
                return Err(AliasConfigError::NoLabels(alias.field.clone()));
            }
            for label in &alias.labels {
                match owners.get(label.as_str()) {
                    // same label listed twice under one field is harmless
                    Some(owner) if *owner == alias.field => {}
                    Some(owner) => {
                        return Err(AliasConfigError::AmbiguousLabel {
                            label: label.clone(),
                            first: owner.to_string(),
                            second: alias.field.clone(),
                        })
                    }
                    None => {
                        owners.insert(label.as_str(), alias.field.as_str());
                    }
                }
            }
        }

        if let Some(req) = &self.required {
            if !seen_fields.contains(req.as_str()) {
                return Err(AliasConfigError::UnknownRequired(req.clone()));
            }
        }

        Ok(AliasTable {
            fields: self.fields,
            required: self.required,
        })
    }
}
