use serde::{Deserialize, Serialize};

/// Comparison operators accepted in WHERE objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$like")]
    Like,
    #[serde(rename = "$ilike")]
    ILike,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$between")]
    Between,
}

/// Declarative query description, usually deserialized from a request body
/// or assembled from query-string parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub select: Option<Vec<String>>,
    pub where_clause: Option<serde_json::Value>,
    pub order: Option<serde_json::Value>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// A parsed WHERE condition: either a single column predicate or a
/// pre-rendered SQL fragment produced by a logical operator.
#[derive(Debug, Clone)]
pub enum WhereCondition {
    Field {
        column: String,
        operator: FilterOp,
        data: serde_json::Value,
    },
    Composed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
