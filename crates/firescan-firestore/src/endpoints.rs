//! Firestore REST request/response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::FirestoreValue;

// ============================================================================
// Method Names
// ============================================================================

/// Suffix appended to the parent resource for queries.
pub const RUN_QUERY: &str = "runQuery";

/// Suffix appended to the parent resource for aggregations.
pub const RUN_AGGREGATION_QUERY: &str = "runAggregationQuery";

/// Field documents are ordered by.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Alias of the count aggregation in responses.
pub const COUNT_ALIAS: &str = "count";

// ============================================================================
// Request Types
// ============================================================================

/// Request body for runQuery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest<'a> {
    pub structured_query: StructuredQuery<'a>,
}

/// A structured query over a single collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery<'a> {
    pub from: Vec<CollectionSelector<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,
}

impl<'a> StructuredQuery<'a> {
    /// Query every document of `collection_id` under the request's parent.
    pub fn collection(collection_id: &'a str) -> Self {
        Self {
            from: vec![CollectionSelector { collection_id }],
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector<'a> {
    pub collection_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Order<'a> {
    pub field: FieldReference<'a>,
    pub direction: Direction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference<'a> {
    pub field_path: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Descending,
}

/// Request body for runAggregationQuery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryRequest<'a> {
    pub structured_aggregation_query: StructuredAggregationQuery<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAggregationQuery<'a> {
    pub structured_query: StructuredQuery<'a>,
    pub aggregations: Vec<Aggregation<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Aggregation<'a> {
    pub alias: &'a str,
    pub count: CountAggregation,
}

/// Unbounded count; serializes as `{}`.
#[derive(Debug, Serialize)]
pub struct CountAggregation {}

// ============================================================================
// Response Types
// ============================================================================

/// One element of the runQuery response array.
///
/// Progress-only elements carry just `readTime` and no document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponseItem {
    #[serde(default)]
    pub document: Option<DocumentResource>,
}

/// A document resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResource {
    /// `projects/<p>/databases/<d>/documents/<path>`.
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

impl DocumentResource {
    /// The document ID: the last segment of its resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// One element of the runAggregationQuery response array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAggregationQueryResponseItem {
    #[serde(default)]
    pub result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(default)]
    pub aggregate_fields: BTreeMap<String, FirestoreValue>,
}

/// Google API error response format.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
