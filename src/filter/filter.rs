use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterData, FilterOrderInfo, SqlResult};

/// Builds a complete parameterized SELECT from a [`FilterData`] description.
pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select_columns: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select {
            self.select(select)?;
        }
        if let Some(where_clause) = data.where_clause {
            self.where_clause(where_clause)?;
        }
        if let Some(order) = data.order {
            self.order(order)?;
        }
        if let Some(limit) = data.limit {
            self.limit(limit, data.offset)?;
        }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        Self::validate_select_columns(&columns)?;
        self.select_columns = columns;
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit(
                "Limit must be non-negative".to_string(),
            ));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset(
                    "Offset must be non-negative".to_string(),
                ));
            }
        }

        // Apply the environment-wide cap
        let max_limit = crate::config::config().search.max_limit;
        let applied_limit = if limit > max_limit {
            if crate::config::config().search.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let select_clause = self.build_select_clause();
        let (where_clause, params) = if let Some(ref where_data) = self.where_data {
            FilterWhere::generate(where_data, 0)?
        } else {
            (String::new(), vec![])
        };
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", select_clause),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", where_clause)
            },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
        if !valid_start || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!(
                "Invalid table name format: {}",
                name
            )));
        }
        Ok(())
    }

    fn validate_select_columns(columns: &[String]) -> Result<(), FilterError> {
        for column in columns {
            if column == "*" {
                continue;
            }
            let mut chars = column.chars();
            let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
            if !valid_start || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(FilterError::InvalidColumn(format!(
                    "Invalid column name format: {}",
                    column
                )));
            }
        }
        Ok(())
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.contains(&"*".to_string()) {
            "*".to_string()
        } else {
            self.select_columns
                .iter()
                .map(|c| format!("\"{}\"", c))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter_for(data: FilterData) -> Filter {
        let mut filter = Filter::new("artworks").unwrap();
        filter.assign(data).unwrap();
        filter
    }

    #[test]
    fn bare_filter_selects_everything() {
        let result = filter_for(FilterData::default()).to_sql().unwrap();
        assert_eq!(result.query, "SELECT * FROM \"artworks\"");
        assert!(result.params.is_empty());
    }

    #[test]
    fn full_query_assembles_all_clauses() {
        let result = filter_for(FilterData {
            where_clause: Some(json!({"category": "sculpture"})),
            order: Some(json!("price desc")),
            limit: Some(20),
            offset: Some(40),
            ..Default::default()
        })
        .to_sql()
        .unwrap();
        assert_eq!(
            result.query,
            "SELECT * FROM \"artworks\" WHERE \"category\" = $1 ORDER BY \"price\" DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(result.params, vec![json!("sculpture")]);
    }

    #[test]
    fn limit_is_capped_to_configured_max() {
        let max = crate::config::config().search.max_limit;
        let result = filter_for(FilterData {
            limit: Some(max + 1),
            ..Default::default()
        })
        .to_sql()
        .unwrap();
        assert_eq!(result.query, format!("SELECT * FROM \"artworks\" LIMIT {}", max));
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new("artworks").unwrap();
        assert!(filter.limit(-1, None).is_err());
    }

    #[test]
    fn bad_table_name_is_rejected() {
        assert!(Filter::new("artworks; DROP TABLE users").is_err());
        assert!(Filter::new("").is_err());
    }
}
