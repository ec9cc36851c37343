//! Semantic fields and their candidate source-column names
//!
//! Exports do not agree on column names, so each semantic field carries an
//! ordered list of accepted names. The first name present in the merged
//! column set wins. Matching is exact and case-sensitive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A normalized field resolved from one of several possible columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticField {
    EmissionDate,
    TaxOperationCode,
    Status,
    TaxValue,
}

impl SemanticField {
    /// All fields, in resolution order
    pub const ALL: [SemanticField; 4] = [
        SemanticField::EmissionDate,
        SemanticField::TaxOperationCode,
        SemanticField::Status,
        SemanticField::TaxValue,
    ];

    /// Human-readable field name for notices
    pub fn label(&self) -> &'static str {
        match self {
            SemanticField::EmissionDate => "Emission date",
            SemanticField::TaxOperationCode => "CFOP",
            SemanticField::Status => "Status",
            SemanticField::TaxValue => "ICMS value",
        }
    }

    /// What every record receives when the field has no column
    pub fn fallback_label(&self) -> &'static str {
        match self {
            SemanticField::EmissionDate => "default date 2025-01-01",
            SemanticField::TaxOperationCode => "code 'Não identificado'",
            SemanticField::Status => "status 'Emitida DANFE'",
            SemanticField::TaxValue => "value 0",
        }
    }
}

const EMISSION_DATE_COLUMNS: &[&str] = &[
    "Data de emissão atualizada",
    "Data",
    "Emissão",
    "DATA EMISSÃO",
];
const TAX_OPERATION_CODE_COLUMNS: &[&str] = &["CFOP", "Código CFOP", "CFOP Code"];
const STATUS_COLUMNS: &[&str] = &["Situação", "Status", "SITUAÇÃO", "STATUS"];
const TAX_VALUE_COLUMNS: &[&str] = &["Valor de ICMS", "ICMS", "VALOR ICMS", "ICMS Valor"];

/// Ordered candidate column names per semantic field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCandidates {
    names: HashMap<SemanticField, Vec<String>>,
}

impl Default for ColumnCandidates {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        let mut names = HashMap::new();
        names.insert(SemanticField::EmissionDate, owned(EMISSION_DATE_COLUMNS));
        names.insert(SemanticField::TaxOperationCode, owned(TAX_OPERATION_CODE_COLUMNS));
        names.insert(SemanticField::Status, owned(STATUS_COLUMNS));
        names.insert(SemanticField::TaxValue, owned(TAX_VALUE_COLUMNS));
        Self { names }
    }
}

impl ColumnCandidates {
    /// Candidate names for a field, highest priority first
    pub fn names(&self, field: SemanticField) -> &[String] {
        self.names.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append lower-priority names to a field, skipping duplicates
    pub fn extend<I, S>(&mut self, field: SemanticField, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = self.names.entry(field).or_default();
        for name in extra {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    /// Pick the first candidate present in `columns`
    pub fn resolve<'a>(&'a self, field: SemanticField, columns: &[String]) -> Option<&'a str> {
        self.names(field)
            .iter()
            .find(|candidate| columns.iter().any(|c| c == *candidate))
            .map(String::as_str)
    }
}
