//! Structural filter clauses for index queries

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// A single filter term sent alongside a query
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Exact match on one value: `{"term": {field: value}}`
    Term { field: String, value: Value },
    /// Match any of the values: `{"terms": {field: [values]}}`
    Terms { field: String, values: Vec<Value> },
    /// Inclusive range: `{"range": {field: {"gte": .., "lte": ..}}}`
    Range {
        field: String,
        gte: Option<String>,
        lte: Option<String>,
    },
}

impl FilterClause {
    pub fn to_value(&self) -> Value {
        match self {
            FilterClause::Term { field, value } => json!({ "term": { field: value } }),
            FilterClause::Terms { field, values } => json!({ "terms": { field: values } }),
            FilterClause::Range { field, gte, lte } => {
                let mut bounds = serde_json::Map::new();
                if let Some(gte) = gte {
                    bounds.insert("gte".to_string(), Value::String(gte.clone()));
                }
                if let Some(lte) = lte {
                    bounds.insert("lte".to_string(), Value::String(lte.clone()));
                }
                json!({ "range": { field: bounds } })
            }
        }
    }
}

impl Serialize for FilterClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Translates typed query parameters into filter clauses
pub struct FilterBuilder;

impl FilterBuilder {
    /// Build clauses in order: ticker, date range, then custom filters.
    ///
    /// Empty strings count as absent. Array-valued custom filters become
    /// `terms` clauses, everything else a `term` clause; field names are
    /// passed through unchecked.
    pub fn build(
        ticker: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        filters: &[(String, Value)],
    ) -> Vec<FilterClause> {
        let mut clauses = Vec::new();

        if let Some(ticker) = ticker.filter(|t| !t.is_empty()) {
            clauses.push(FilterClause::Term {
                field: "ticker".to_string(),
                value: Value::String(ticker.to_string()),
            });
        }

        let gte = start_date.filter(|d| !d.is_empty());
        let lte = end_date.filter(|d| !d.is_empty());
        if gte.is_some() || lte.is_some() {
            clauses.push(FilterClause::Range {
                field: "date".to_string(),
                gte: gte.map(str::to_string),
                lte: lte.map(str::to_string),
            });
        }

        for (field, value) in filters {
            match value {
                Value::Array(values) => clauses.push(FilterClause::Terms {
                    field: field.clone(),
                    values: values.clone(),
                }),
                scalar => clauses.push(FilterClause::Term {
                    field: field.clone(),
                    value: scalar.clone(),
                }),
            }
        }

        clauses
    }

    /// Build clauses straight from a [`SearchConfig`](super::SearchConfig)
    pub fn from_config(config: &super::SearchConfig) -> Vec<FilterClause> {
        Self::build(
            config.ticker.as_deref(),
            config.start_date.as_deref(),
            config.end_date.as_deref(),
            &config.filters,
        )
    }
}
