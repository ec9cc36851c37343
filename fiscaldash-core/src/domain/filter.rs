//! Filter criteria applied to the unified table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{FiscalTable, Record};

/// Label of the "no filter" choice in selection lists
pub const ALL_LABEL: &str = "Todos";

/// Exact-match selection, or no filtering at all
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Interpret a choice from a selection list; [`ALL_LABEL`] means no filter
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL_LABEL {
            Selection::All
        } else {
            Selection::Only(choice.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Selection::All => ALL_LABEL,
            Selection::Only(value) => value,
        }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        value.map(Selection::Only).unwrap_or_default()
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if given in reverse
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The three independent filters; they compose by AND
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub code: Selection,
    pub status: Selection,
}

impl FilterCriteria {
    /// Undated records never fall inside a date range
    pub fn matches(&self, record: &Record) -> bool {
        let in_range = match (&self.date_range, record.emission_date) {
            (None, _) => true,
            (Some(range), Some(date)) => range.contains(date),
            (Some(_), None) => false,
        };
        in_range
            && self.code.matches(&record.tax_operation_code)
            && self.status.matches(&record.status)
    }

    pub fn apply<'a>(&self, table: &'a FiscalTable) -> FilteredTable<'a> {
        FilteredTable {
            raw_columns: &table.raw_columns,
            records: table.records.iter().filter(|r| self.matches(r)).collect(),
        }
    }
}

/// Borrowed view of the records passing a filter
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    pub raw_columns: &'a [String],
    pub records: Vec<&'a Record>,
}

impl FilteredTable<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::DEFAULT_STATUS;
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table() -> FiscalTable {
        FiscalTable::new(
            Vec::new(),
            vec![
                Record::new("a.xlsx", Some(date(2025, 1, 5)), "5102", DEFAULT_STATUS, Decimal::ONE),
                Record::new("a.xlsx", Some(date(2025, 2, 5)), "5910", "Cancelada", Decimal::ONE),
                Record::new("b.xlsx", Some(date(2025, 3, 5)), "5102", "Cancelada", Decimal::ONE),
                Record::new("b.xlsx", None, "5102", DEFAULT_STATUS, Decimal::ONE),
            ],
        )
    }

    #[test]
    fn test_default_criteria_keep_everything() {
        let table = table();
        assert_eq!(FilterCriteria::default().apply(&table).len(), 4);
    }

    #[test]
    fn test_date_range_is_inclusive_and_drops_undated() {
        let table = table();
        let criteria = FilterCriteria {
            date_range: Some(DateRange::new(date(2025, 1, 5), date(2025, 2, 5))),
            ..Default::default()
        };
        let filtered = criteria.apply(&table);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.records.iter().all(|r| r.emission_date.is_some()));
    }

    #[test]
    fn test_filters_compose_with_and() {
        let table = table();
        let criteria = FilterCriteria {
            date_range: None,
            code: Selection::Only("5102".to_string()),
            status: Selection::Only("Cancelada".to_string()),
        };
        let filtered = criteria.apply(&table);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.records[0].emission_date, Some(date(2025, 3, 5)));
    }

    #[test]
    fn test_all_choice_is_a_no_op() {
        assert_eq!(Selection::from_choice(ALL_LABEL), Selection::All);
        assert_eq!(
            Selection::from_choice("5102"),
            Selection::Only("5102".to_string())
        );
        assert!(Selection::All.matches("anything"));
    }

    #[test]
    fn test_reversed_range_is_normalized() {
        let range = DateRange::new(date(2025, 3, 1), date(2025, 1, 1));
        assert_eq!(range.start, date(2025, 1, 1));
        assert!(range.contains(date(2025, 2, 1)));
    }
}
