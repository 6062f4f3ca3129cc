//! Question answering endpoints

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse, AskStreamParams};

/// POST /ask - Answer with citations
pub async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    if request.question.trim().is_empty() {
        return Err(Error::InvalidInput("Question must not be empty".to_string()));
    }

    let response = state
        .answerer()
        .ask(
            &request.question,
            request.document_ids.as_deref(),
            request.top_k,
        )
        .await?;

    Ok(Json(response))
}

/// GET /ask/stream - Answer fragments as server-sent events.
///
/// Failures before streaming starts are reported as a single `Error: ...`
/// event, since the response status is already committed.
pub async fn ask_question_stream(
    State(state): State<AppState>,
    Query(params): Query<AskStreamParams>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let filter = params.document_filter();

    let fragments = match state
        .answerer()
        .ask_stream(&params.question, filter.as_deref())
        .await
    {
        Ok(fragments) => fragments,
        Err(e) => {
            tracing::warn!("Streaming answer failed: {}", e);
            stream::once(async move { Ok::<_, Error>(format!("Error: {}", e)) }).boxed()
        }
    };

    let events = fragments.map(|fragment| {
        let data = fragment.unwrap_or_else(|e| format!("Error: {}", e));
        Ok::<_, Infallible>(Event::default().data(data))
    });

    Sse::new(events)
}
