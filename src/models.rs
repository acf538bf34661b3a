use serde::{Deserialize, Serialize};

/// Body of POST /execute
#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    /// User's free-text request
    pub prompt: String,
    /// Optional conversation id; interactions are logged under it
    pub session_id: Option<String>,
    /// Positional arguments to pass to the matched function
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

/// Response of POST /execute
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    /// Name of the matched function
    pub function: String,
    /// Ready-to-run script
    pub code: String,
    /// Plain English explanation
    pub description: String,
}

/// Best registered function for a query, as returned by the vector index
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMatch {
    pub name: String,
    pub description: String,
    pub score: f32,
}

/// Response of GET /debug/functions
#[derive(Debug, Serialize)]
pub struct DebugFunctionsResponse {
    pub registered_functions: Vec<String>,
    pub indexed_functions: u64,
}
