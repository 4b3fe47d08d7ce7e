use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                // Array of strings like ["created_at desc", "title asc"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v {
                        out.extend(Self::parse_order_string(s)?);
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "title": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    let sort = match v.as_str().unwrap_or("asc").to_ascii_lowercase().as_str() {
                        "desc" => SortDirection::Desc,
                        _ => SortDirection::Asc,
                    };
                    out.push(FilterOrderInfo {
                        column: k.clone(),
                        sort,
                    });
                }
                out
            }
            _ => vec![],
        };

        for info in &infos {
            Self::validate_column(&info.column)?;
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                out.push(FilterOrderInfo {
                    column: col.to_string(),
                    sort,
                });
            }
        }
        Ok(out)
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
        if !valid_start || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!(
                "Invalid order column: {}",
                column
            )));
        }
        Ok(())
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_spec_parses_column_and_direction() {
        let infos = FilterOrder::validate_and_parse(&json!("price desc, title")).unwrap();
        let sql = FilterOrder::generate(&infos).unwrap();
        assert_eq!(sql, "ORDER BY \"price\" DESC, \"title\" ASC");
    }

    #[test]
    fn object_spec_parses() {
        let infos = FilterOrder::validate_and_parse(&json!({"created_at": "desc"})).unwrap();
        let sql = FilterOrder::generate(&infos).unwrap();
        assert_eq!(sql, "ORDER BY \"created_at\" DESC");
    }

    #[test]
    fn order_column_is_validated() {
        let err = FilterOrder::validate_and_parse(&json!("price; DROP")).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }
}
