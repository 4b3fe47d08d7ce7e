use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, WhereCondition};

/// Translates a JSON WHERE object into a parameterized SQL predicate.
///
/// Values never end up in the SQL text; every comparison binds through a
/// `$n` placeholder.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<WhereCondition>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    pub fn generate(
        where_data: &Value,
        starting_param_index: usize,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        if where_data.is_null() {
            return Ok(());
        }
        match where_data {
            Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause(
                "WHERE must be a JSON object".to_string(),
            )),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.param_values.clear();
        self.conditions.clear();

        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = self.conditions.clone();
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        let where_clause = if sql_conditions.is_empty() {
            String::new()
        } else {
            sql_conditions.join(" AND ")
        };
        Ok((where_clause, self.param_values.clone()))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            // Raw SQL strings are never accepted; conditions must arrive as
            // structured objects so every value goes through a bind parameter.
            Value::String(_) => Err(FilterError::InvalidWhereClause(
                "Raw SQL conditions are not supported".to_string(),
            )),
            _ => Err(FilterError::InvalidWhereClause(
                "Unsupported WHERE format".to_string(),
            )),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, 0)?;
                    let offset = self.param_values.len() + self.param_index;
                    let sql = renumber_placeholders(&sql, offset);
                    self.param_values.extend(params);
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                self.conditions.push(WhereCondition::Composed(sql_parts.join(joiner)));
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, 0)?;
                let offset = self.param_values.len() + self.param_index;
                let sql = renumber_placeholders(&sql, offset);
                self.param_values.extend(params);
                self.conditions
                    .push(WhereCondition::Composed(format!("NOT ({})", sql)));
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        Self::validate_column(field)?;
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = Self::map_operator(op_key)?;
                // Arrays only make sense where the operator expands them
                if op_val.is_array()
                    && !matches!(operator, FilterOp::In | FilterOp::Between)
                {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} does not accept an array",
                        op_key
                    )));
                }
                self.conditions.push(WhereCondition::Field {
                    column: field.to_string(),
                    operator,
                    data: op_val.clone(),
                });
            }
        } else {
            // Implicit equality: { field: value }
            if value.is_array() {
                return Err(FilterError::InvalidOperatorData(format!(
                    "Array value for '{}' requires $in",
                    field
                )));
            }
            self.conditions.push(WhereCondition::Field {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            });
        }
        Ok(())
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        let mut chars = column.chars();
        let valid_start = chars.next().is_some_and(|c| c.is_alphabetic() || c == '_');
        if !valid_start || !column.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!(
                "Invalid column name format: {}",
                column
            )));
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$between" => FilterOp::Between,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &WhereCondition) -> Result<String, FilterError> {
        let (column, operator, data) = match condition {
            WhereCondition::Composed(sql) => return Ok(sql.clone()),
            WhereCondition::Field {
                column,
                operator,
                data,
            } => (column, operator, data),
        };

        let quoted_column = format!("\"{}\"", column);
        match operator {
            FilterOp::Eq => {
                if data.is_null() {
                    Ok(format!("{} IS NULL", quoted_column))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::Ne => {
                if data.is_null() {
                    Ok(format!("{} IS NOT NULL", quoted_column))
                } else {
                    Ok(format!("{} <> {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(data.clone()))),
            FilterOp::Like => Ok(format!(
                "{} LIKE {}",
                quoted_column,
                self.param(data.clone())
            )),
            FilterOp::ILike => Ok(format!(
                "{} ILIKE {}",
                quoted_column,
                self.param(data.clone())
            )),
            FilterOp::In => {
                if let Value::Array(values) = data {
                    if values.is_empty() {
                        return Ok("1=0".to_string());
                    }
                    let params: Vec<String> =
                        values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(data.clone())))
                }
            }
            FilterOp::Between => {
                if let Value::Array(values) = data {
                    if values.len() != 2 {
                        return Err(FilterError::InvalidOperatorData(
                            "$between requires exactly 2 values".to_string(),
                        ));
                    }
                    Ok(format!(
                        "{} BETWEEN {} AND {}",
                        quoted_column,
                        self.param(values[0].clone()),
                        self.param(values[1].clone())
                    ))
                } else {
                    Err(FilterError::InvalidOperatorData(
                        "$between requires array with 2 values".to_string(),
                    ))
                }
            }
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_index + self.param_values.len())
    }
}

/// Shift `$n` placeholders in a rendered subclause so they continue the
/// parent clause's numbering.
fn renumber_placeholders(sql: &str, offset: usize) -> String {
    if offset == 0 {
        return sql.to_string();
    }
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek().is_some_and(|n| n.is_ascii_digit()) {
            let mut digits = String::new();
            while chars.peek().is_some_and(|n| n.is_ascii_digit()) {
                digits.push(chars.next().unwrap_or_default());
            }
            let n: usize = digits.parse().unwrap_or(0);
            out.push('$');
            out.push_str(&(n + offset).to_string());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality() {
        let (sql, params) = FilterWhere::generate(&json!({"category": "painting"}), 0).unwrap();
        assert_eq!(sql, "\"category\" = $1");
        assert_eq!(params, vec![json!("painting")]);
    }

    #[test]
    fn null_equality_uses_is_null() {
        let (sql, params) = FilterWhere::generate(&json!({"artist_id": null}), 0).unwrap();
        assert_eq!(sql, "\"artist_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn range_conditions_share_column() {
        let (sql, params) =
            FilterWhere::generate(&json!({"price": {"$gte": 100, "$lte": 500}}), 0).unwrap();
        assert_eq!(sql, "\"price\" >= $1 AND \"price\" <= $2");
        assert_eq!(params, vec![json!(100), json!(500)]);
    }

    #[test]
    fn ilike_for_substring_search() {
        let (sql, params) =
            FilterWhere::generate(&json!({"title": {"$ilike": "%sunset%"}}), 0).unwrap();
        assert_eq!(sql, "\"title\" ILIKE $1");
        assert_eq!(params, vec![json!("%sunset%")]);
    }

    #[test]
    fn in_with_empty_array_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({"id": {"$in": []}}), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn between_requires_two_values() {
        let err = FilterWhere::generate(&json!({"price": {"$between": [1]}}), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn or_combines_subclauses_with_continued_numbering() {
        let (sql, params) = FilterWhere::generate(
            &json!({"$or": [{"style": "abstract"}, {"style": "impressionist"}]}),
            0,
        )
        .unwrap();
        assert_eq!(sql, "(\"style\" = $1) OR (\"style\" = $2)");
        assert_eq!(params, vec![json!("abstract"), json!("impressionist")]);
    }

    #[test]
    fn not_wraps_subclause() {
        let (sql, params) =
            FilterWhere::generate(&json!({"$not": {"premium_only": true}}), 0).unwrap();
        assert_eq!(sql, "NOT (\"premium_only\" = $1)");
        assert_eq!(params, vec![json!(true)]);
    }

    #[test]
    fn raw_sql_string_is_rejected() {
        let err = FilterWhere::generate(&json!("price > 0; DROP TABLE artworks"), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidWhereClause(_)));
    }

    #[test]
    fn malformed_column_is_rejected() {
        let err = FilterWhere::generate(&json!({"price; --": 1}), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = FilterWhere::generate(&json!({"price": {"$regex": ".*"}}), 0).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
    }

    #[test]
    fn implicit_equality_rejects_array_values() {
        let err = FilterWhere::generate(&json!({"style": ["abstract", "cubist"]}), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn scalar_operators_reject_array_values() {
        let err = FilterWhere::generate(&json!({"price": {"$gt": [100, 200]}}), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));

        // $in and $between still take arrays
        assert!(FilterWhere::generate(&json!({"price": {"$between": [100, 200]}}), 0).is_ok());
        assert!(FilterWhere::generate(&json!({"style": {"$in": ["abstract"]}}), 0).is_ok());
    }
}
