//! Wire types for the remote query service.
//!
//! Field names mirror the JSON the service emits (`snake_case`, so no serde
//! renames are needed except for `type` on columns). Every response carries a
//! `success` flag; a `false` flag plus `error` is a *domain* failure: the
//! request completed transport-wise but the server declared it unsuccessful.

use serde::Deserialize;
use thiserror::Error;

/// One result row: column name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// QueryResponse  (/api/query, /api/voice, /api/sql)
// ---------------------------------------------------------------------------

/// Raw response body for query submission endpoints.
///
/// All payload fields are optional at the wire level; [`QueryResult`] applies
/// the strictness rules when converting.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub original_query: Option<String>,
    /// Present only for `/api/voice` responses.
    pub transcribed_text: Option<String>,
    pub sql_query: Option<String>,
    pub intent: Option<String>,
    pub row_count: Option<u64>,
    pub columns: Option<Vec<String>>,
    pub results: Option<Vec<Row>>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// QueryResult  (validated domain type)
// ---------------------------------------------------------------------------

/// A validated, successful query result.
///
/// `row_count` is the server's authoritative count and may exceed
/// `rows.len()` when the server truncates large result sets.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The question as the user asked it (falls back to the transcription
    /// for voice queries, matching the service's display convention).
    pub original_query: String,
    /// What the server heard, for voice submissions.
    pub transcribed_text: Option<String>,
    /// The SQL the server generated and executed.
    pub sql_query: String,
    /// The intent label the server assigned to the question.
    pub intent: String,
    /// Authoritative row count reported by the server.
    pub row_count: u64,
    /// Column names, in display order.
    pub columns: Vec<String>,
    /// Result rows, keyed by column name.
    pub rows: Vec<Row>,
}

/// Why a `QueryResponse` could not be converted into a [`QueryResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResponseError {
    /// The server declared the request unsuccessful.
    #[error("{0}")]
    NotSuccessful(String),

    /// `success` was true but a required field was absent. The server
    /// contract does not define this case, so it is rejected rather than
    /// defaulted.
    #[error("malformed response: missing field `{0}`")]
    MissingField(&'static str),
}

impl QueryResult {
    /// Convert a raw [`QueryResponse`] into a validated result.
    ///
    /// Requires `success == true` and the presence of `row_count` and
    /// `columns`. `sql_query` and `intent` default to empty strings when
    /// absent; `results` defaults to an empty row set (a zero-row result is
    /// a legitimate success).
    pub fn from_response(resp: QueryResponse) -> Result<Self, ResponseError> {
        if !resp.success {
            let msg = resp
                .error
                .unwrap_or_else(|| "query failed with no error message".into());
            return Err(ResponseError::NotSuccessful(msg));
        }

        let row_count = resp.row_count.ok_or(ResponseError::MissingField("row_count"))?;
        let columns = resp.columns.ok_or(ResponseError::MissingField("columns"))?;

        let original_query = resp
            .original_query
            .or_else(|| resp.transcribed_text.clone())
            .unwrap_or_default();

        Ok(Self {
            original_query,
            transcribed_text: resp.transcribed_text,
            sql_query: resp.sql_query.unwrap_or_default(),
            intent: resp.intent.unwrap_or_default(),
            row_count,
            columns,
            rows: resp.results.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// SchemaResponse  (/api/schema)
// ---------------------------------------------------------------------------

/// Response body for `/api/schema`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaResponse {
    pub success: bool,
    pub schema: Option<Schema>,
    pub error: Option<String>,
}

/// The database schema as reported by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    pub tables: Vec<TableInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

// ---------------------------------------------------------------------------
// ExamplesResponse  (/api/examples)
// ---------------------------------------------------------------------------

/// Response body for `/api/examples`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamplesResponse {
    pub success: bool,
    pub examples: Option<Vec<ExampleQuery>>,
    pub error: Option<String>,
}

/// A canned example question the user can pick from.
#[derive(Debug, Clone, Deserialize)]
pub struct ExampleQuery {
    pub text: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn success_json() -> &'static str {
        r#"{
            "success": true,
            "original_query": "How many people work in IT?",
            "sql_query": "SELECT COUNT(*) AS count FROM employees WHERE dept = 'IT'",
            "intent": "count",
            "row_count": 1,
            "columns": ["count"],
            "results": [{"count": 42}]
        }"#
    }

    #[test]
    fn parse_success_payload() {
        let resp: QueryResponse = serde_json::from_str(success_json()).unwrap();
        let result = QueryResult::from_response(resp).unwrap();

        assert_eq!(result.original_query, "How many people work in IT?");
        assert_eq!(result.intent, "count");
        assert_eq!(result.row_count, 1);
        assert_eq!(result.columns, vec!["count".to_string()]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["count"], serde_json::json!(42));
        assert!(result.transcribed_text.is_none());
    }

    #[test]
    fn parse_voice_payload_keeps_transcription() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{
                "success": true,
                "transcribed_text": "list all employees",
                "sql_query": "SELECT * FROM employees",
                "intent": "list",
                "row_count": 0,
                "columns": ["id", "name"],
                "results": []
            }"#,
        )
        .unwrap();

        let result = QueryResult::from_response(resp).unwrap();
        assert_eq!(result.transcribed_text.as_deref(), Some("list all employees"));
        // With no original_query, the transcription stands in for it.
        assert_eq!(result.original_query, "list all employees");
        assert_eq!(result.row_count, 0);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn failure_payload_yields_not_successful() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{"success": false, "error": "could not understand the question"}"#,
        )
        .unwrap();

        let err = QueryResult::from_response(resp).unwrap_err();
        assert_eq!(
            err,
            ResponseError::NotSuccessful("could not understand the question".into())
        );
    }

    #[test]
    fn success_without_row_count_is_malformed() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{"success": true, "columns": ["a"], "results": []}"#,
        )
        .unwrap();

        let err = QueryResult::from_response(resp).unwrap_err();
        assert_eq!(err, ResponseError::MissingField("row_count"));
    }

    #[test]
    fn success_without_columns_is_malformed() {
        let resp: QueryResponse =
            serde_json::from_str(r#"{"success": true, "row_count": 3}"#).unwrap();

        let err = QueryResult::from_response(resp).unwrap_err();
        assert_eq!(err, ResponseError::MissingField("columns"));
    }

    /// `row_count` reflects the authoritative source count and may exceed
    /// the number of rows actually returned (server-side truncation).
    #[test]
    fn truncated_results_keep_server_row_count() {
        let resp: QueryResponse = serde_json::from_str(
            r#"{
                "success": true,
                "row_count": 5000,
                "columns": ["id"],
                "results": [{"id": 1}, {"id": 2}]
            }"#,
        )
        .unwrap();

        let result = QueryResult::from_response(resp).unwrap();
        assert_eq!(result.row_count, 5000);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn parse_schema_payload() {
        let resp: SchemaResponse = serde_json::from_str(
            r#"{
                "success": true,
                "schema": {
                    "tables": [{
                        "name": "employees",
                        "columns": [
                            {"name": "id", "type": "INTEGER", "nullable": false, "primary_key": true},
                            {"name": "name", "type": "TEXT", "nullable": true, "primary_key": false}
                        ]
                    }]
                }
            }"#,
        )
        .unwrap();

        assert!(resp.success);
        let schema = resp.schema.unwrap();
        assert_eq!(schema.tables.len(), 1);
        assert_eq!(schema.tables[0].name, "employees");
        assert_eq!(schema.tables[0].columns[0].column_type, "INTEGER");
        assert!(schema.tables[0].columns[0].primary_key);
    }

    #[test]
    fn parse_examples_payload() {
        let resp: ExamplesResponse = serde_json::from_str(
            r#"{
                "success": true,
                "examples": [
                    {"text": "list employees", "description": "Show every employee"}
                ]
            }"#,
        )
        .unwrap();

        let examples = resp.examples.unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].text, "list employees");
    }
}
