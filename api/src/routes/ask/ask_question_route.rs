//! POST /ask: answers a telemetry question with retrieved context.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use contextor::AskOptions;
use tracing::info;

use crate::{
    app_state::AppState,
    error_handler::AppResult,
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"Which laps ran the coolant above 95 C?","top_k":5}'
/// ```
pub async fn ask_question(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<AskResponse>> {
    let Json(body) = payload?;
    info!(top_k = ?body.top_k, min_score = ?body.min_score, "POST /ask");

    let opts = AskOptions {
        top_k: body.top_k,
        min_score: body.min_score,
        filter: body.filter,
    };
    let qa = state
        .contextor
        .answer_with_opts(&body.question, opts)
        .await?;

    Ok(Json(AskResponse::from(qa)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::AppError;
    use crate::routes::test_support::{row, state};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn request(question: &str) -> Result<Json<AskRequest>, JsonRejection> {
        Ok(Json(AskRequest {
            question: question.into(),
            top_k: None,
            min_score: None,
            filter: None,
        }))
    }

    #[tokio::test]
    async fn answers_with_context_and_advice() {
        let state = state();
        state
            .contextor
            .ingest_rows(&[row("lm24-0001")])
            .await
            .unwrap();

        let Json(res) = ask_question(State(state), request("coolant temperature?"))
            .await
            .unwrap();
        assert_eq!(res.answer, "grounded answer");
        assert_eq!(res.context.len(), 1);
        assert_eq!(res.context[0].key, "lm24-0001#0");
        assert_eq!(res.context[0].rank, 1);
        assert!(res.grounding_note.is_none());
        assert!(res.advice.is_some());
    }

    #[tokio::test]
    async fn empty_index_is_not_an_error() {
        let Json(res) = ask_question(State(state()), request("coolant?"))
            .await
            .unwrap();
        assert!(res.context.is_empty());
        assert_eq!(
            res.grounding_note.as_deref(),
            Some(contextor::prompt::NO_DATA_MARKER)
        );
    }

    #[tokio::test]
    async fn blank_question_is_a_bad_request() {
        let err = ask_question(State(state()), request("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Http { code: "INVALID_QUERY", .. }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
