use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::codegen::CodeGenerator;
use crate::error::{DispatchError, Result};
use crate::models::{DebugFunctionsResponse, ExecuteRequest, ExecuteResponse};
use crate::registry::FunctionRegistry;
use crate::search::VectorSearch;
use crate::session::{SessionManager, SessionRecord};

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FunctionRegistry>,
    pub search: Arc<dyn VectorSearch>,
    pub sessions: Arc<SessionManager>,
}

pub fn router(state: AppState) -> Router {
    // Permissive CORS for the single-developer/demo use case
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/execute", post(execute))
        .route("/debug/functions", get(list_functions))
        .route("/sessions/:id", get(session_history))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

/// Takes a user's request in plain English, finds the best matching
/// function, and returns a ready-to-run script invoking it.
async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(DispatchError::Validation("prompt cannot be empty".to_string()));
    }

    tracing::info!("Processing request: {}", request.prompt);

    let Some(matched) = state.search.retrieve(&request.prompt).await? else {
        tracing::warn!("No function found for: {}", request.prompt);
        return Err(DispatchError::NoMatch);
    };

    let code = CodeGenerator::generate_execution_code(&state.registry, &matched.name, &request.args)?;

    if let Some(session_id) = &request.session_id {
        state
            .sessions
            .append(session_id, &request.prompt, &matched.name)
            .await;
    }

    Ok(Json(ExecuteResponse {
        function: matched.name,
        code,
        description: matched.description,
    }))
}

/// Shows all available functions and the state of the vector index
async fn list_functions(State(state): State<AppState>) -> Result<Json<DebugFunctionsResponse>> {
    let indexed = state.search.indexed_count().await?;
    Ok(Json(DebugFunctionsResponse {
        registered_functions: state.registry.names().iter().map(|s| s.to_string()).collect(),
        indexed_functions: indexed,
    }))
}

async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<Vec<SessionRecord>> {
    Json(state.sessions.history(&session_id).await)
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FunctionMatch;
    use crate::search::MockVectorSearch;
    use serde_json::json;

    fn state_with_search(search: MockVectorSearch) -> AppState {
        AppState {
            registry: Arc::new(FunctionRegistry::builtin()),
            search: Arc::new(search),
            sessions: Arc::new(SessionManager::new()),
        }
    }

    fn calculator_match() -> FunctionMatch {
        FunctionMatch {
            name: "open_calculator".to_string(),
            description: "Opens system calculator".to_string(),
            score: 0.83,
        }
    }

    #[tokio::test]
    async fn test_execute_returns_matched_function_and_code() {
        let mut search = MockVectorSearch::new();
        search
            .expect_retrieve()
            .returning(|_| Ok(Some(calculator_match())));
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "Open calculator".to_string(),
            session_id: None,
            args: vec![],
        };
        let Json(response) = execute(State(state), Json(request)).await.unwrap();

        assert_eq!(response.function, "open_calculator");
        assert_eq!(response.description, "Opens system calculator");
        assert!(response.code.contains("result = open_calculator()"));
    }

    #[tokio::test]
    async fn test_execute_no_match_is_not_found() {
        let mut search = MockVectorSearch::new();
        search.expect_retrieve().returning(|_| Ok(None));
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "translate this to French".to_string(),
            session_id: None,
            args: vec![],
        };
        let err = execute(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoMatch));
    }

    #[tokio::test]
    async fn test_execute_stale_index_name_is_internal_error() {
        // Search can return a name the registry no longer knows when the
        // seeded collection is stale
        let mut search = MockVectorSearch::new();
        search.expect_retrieve().returning(|_| {
            Ok(Some(FunctionMatch {
                name: "defragment_disk".to_string(),
                description: "Defragments the system disk".to_string(),
                score: 0.9,
            }))
        });
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "defrag my disk".to_string(),
            session_id: None,
            args: vec![],
        };
        let err = execute(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownFunction(name) if name == "defragment_disk"));
        assert_eq!(
            err_status(DispatchError::UnknownFunction("defragment_disk".to_string())),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    fn err_status(err: DispatchError) -> axum::http::StatusCode {
        use axum::response::IntoResponse;
        err.into_response().status()
    }

    #[tokio::test]
    async fn test_execute_rejects_empty_prompt() {
        let search = MockVectorSearch::new();
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "   ".to_string(),
            session_id: None,
            args: vec![],
        };
        let err = execute(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn test_execute_logs_session_interaction() {
        let mut search = MockVectorSearch::new();
        search
            .expect_retrieve()
            .returning(|_| Ok(Some(calculator_match())));
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "Open calculator".to_string(),
            session_id: Some("demo".to_string()),
            args: vec![],
        };
        execute(State(state.clone()), Json(request)).await.unwrap();

        let history = state.sessions.history("demo").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prompt, "Open calculator");
        assert_eq!(history[0].function, "open_calculator");
    }

    #[tokio::test]
    async fn test_execute_passes_args_into_generated_code() {
        let mut search = MockVectorSearch::new();
        search.expect_retrieve().returning(|_| {
            Ok(Some(FunctionMatch {
                name: "execute_shell_command".to_string(),
                description: "Executes a given shell command".to_string(),
                score: 0.7,
            }))
        });
        let state = state_with_search(search);

        let request = ExecuteRequest {
            prompt: "run ls".to_string(),
            session_id: None,
            args: vec![json!("ls -la")],
        };
        let Json(response) = execute(State(state), Json(request)).await.unwrap();
        assert!(response.code.contains("execute_shell_command('ls -la')"));
    }

    #[tokio::test]
    async fn test_list_functions_reports_registry_and_index() {
        let mut search = MockVectorSearch::new();
        search.expect_indexed_count().returning(|| Ok(5));
        let state = state_with_search(search);

        let Json(response) = list_functions(State(state)).await.unwrap();
        assert_eq!(response.indexed_functions, 5);
        assert!(
            response
                .registered_functions
                .contains(&"retrieve_cpu_usage".to_string())
        );
    }

    #[tokio::test]
    async fn test_session_history_endpoint() {
        let state = state_with_search(MockVectorSearch::new());
        state.sessions.append("s", "cpu usage", "retrieve_cpu_usage").await;

        let Json(history) = session_history(State(state), Path("s".to_string())).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].function, "retrieve_cpu_usage");
    }
}
