//! API handlers for the guestbook service.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::primitives::Address;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::schema::LimitsConfig;
use crate::guestbook::form::validate_fields;
use crate::guestbook::state::GuestbookState;
use crate::guestbook::types::{Message, PendingAction, Session};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub guestbook: Arc<GuestbookState>,
    pub session: Arc<Session>,
    pub limits: LimitsConfig,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub connected: bool,
    pub address: Option<String>,
    pub chain_id: u64,
    pub writable: bool,
    pub loading: bool,
    pub action: PendingAction,
    /// Human-readable progress label while a mutation is in flight.
    pub progress: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: u64,
    pub author: String,
    pub author_short: String,
    pub title: String,
    pub text: String,
    /// Authored by the session wallet; gates edit/delete affordances.
    pub own: bool,
    /// Resolved as the contract-reported latest message.
    pub latest: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub loading: bool,
    pub count: usize,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    /// Case-insensitive substring to match against title or text.
    pub q: Option<String>,

    /// Restrict to messages authored by the session wallet.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchDeleteResponse {
    pub requested: usize,
    pub failed: usize,
    pub results: BTreeMap<u64, DeleteOutcome>,
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    let action = state.guestbook.pending_action();
    Json(SessionView {
        connected: state.session.is_connected(),
        address: state.session.address().map(|a| a.to_string()),
        chain_id: state.session.chain_id(),
        writable: state.guestbook.is_writable(),
        loading: state.guestbook.is_loading(),
        action,
        progress: action.label(),
    })
}

pub async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<MessageList> {
    let snapshot = state.guestbook.snapshot();
    let latest_id = state.guestbook.latest().map(|m| m.id);
    let session_address = state.session.address();

    let messages: Vec<MessageView> =
        filter_messages(&snapshot, params.q.as_deref(), params.mine, session_address)
            .into_iter()
            .map(|m| message_view(m, session_address, latest_id))
            .collect();

    Json(MessageList {
        loading: state.guestbook.is_loading(),
        count: messages.len(),
        messages,
    })
}

pub async fn get_latest(State(state): State<AppState>) -> impl IntoResponse {
    let session_address = state.session.address();
    match state.guestbook.latest() {
        Some(message) => {
            let view = message_view(&message, session_address, Some(message.id));
            (StatusCode::OK, Json(view)).into_response()
        }
        None => (StatusCode::NOT_FOUND, "No latest message resolved").into_response(),
    }
}

pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<MessagePayload>,
) -> impl IntoResponse {
    if let Some(reject) = mutation_preconditions(&state) {
        return reject.into_response();
    }
    if let Err(e) = validate_fields(&payload.title, &payload.text, &state.limits) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    if state.guestbook.create(&payload.title, &payload.text).await {
        let body = serde_json::json!({ "status": "confirmed" });
        (StatusCode::CREATED, Json(body)).into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "Message submission failed").into_response()
    }
}

pub async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<MessagePayload>,
) -> impl IntoResponse {
    if let Some(reject) = mutation_preconditions(&state) {
        return reject.into_response();
    }
    if let Err(e) = validate_fields(&payload.title, &payload.text, &state.limits) {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }
    if !is_displayed(&state, id) {
        return (StatusCode::NOT_FOUND, "Unknown message id").into_response();
    }

    if state.guestbook.edit(id, &payload.title, &payload.text).await {
        let body = serde_json::json!({ "status": "confirmed" });
        (StatusCode::OK, Json(body)).into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "Message submission failed").into_response()
    }
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    if let Some(reject) = mutation_preconditions(&state) {
        return reject.into_response();
    }
    if !is_displayed(&state, id) {
        return (StatusCode::NOT_FOUND, "Unknown message id").into_response();
    }

    if state.guestbook.remove(id).await {
        let body = serde_json::json!({ "status": "confirmed" });
        (StatusCode::OK, Json(body)).into_response()
    } else {
        (StatusCode::BAD_GATEWAY, "Message submission failed").into_response()
    }
}

pub async fn batch_delete(
    State(state): State<AppState>,
    Json(request): Json<BatchDeleteRequest>,
) -> impl IntoResponse {
    if request.ids.is_empty() {
        return (StatusCode::BAD_REQUEST, "No ids supplied").into_response();
    }
    if let Some(reject) = mutation_preconditions(&state) {
        return reject.into_response();
    }

    let results = state.guestbook.remove_many(&request.ids).await;
    let failed = results.values().filter(|r| r.is_err()).count();
    let response = BatchDeleteResponse {
        requested: results.len(),
        failed,
        results: results
            .into_iter()
            .map(|(id, result)| {
                let outcome = match result {
                    Ok(()) => DeleteOutcome {
                        ok: true,
                        error: None,
                    },
                    Err(e) => DeleteOutcome {
                        ok: false,
                        error: Some(e.to_string()),
                    },
                };
                (id, outcome)
            })
            .collect(),
    };
    Json(response).into_response()
}

pub async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    if !state.session.is_connected() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Session disconnected").into_response();
    }

    state.guestbook.load().await;
    let count = state.guestbook.snapshot().len();
    let body = serde_json::json!({ "status": "reloaded", "count": count });
    Json(body).into_response()
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let connected = state.session.is_connected();
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if connected { "operational" } else { "degraded" },
        connected,
    })
}

fn mutation_preconditions(state: &AppState) -> Option<(StatusCode, &'static str)> {
    if !state.session.is_connected() {
        return Some((StatusCode::SERVICE_UNAVAILABLE, "Session disconnected"));
    }
    if !state.guestbook.is_writable() {
        return Some((StatusCode::SERVICE_UNAVAILABLE, "No signing wallet configured"));
    }
    None
}

/// Mutations are only offered for messages the collection currently shows.
fn is_displayed(state: &AppState, id: u64) -> bool {
    state.guestbook.snapshot().iter().any(|m| m.id == id)
}

fn filter_messages<'a>(
    messages: &'a [Message],
    query: Option<&str>,
    mine: bool,
    session_address: Option<Address>,
) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| query.is_none_or(|q| m.matches_query(q)))
        .filter(|m| {
            if !mine {
                return true;
            }
            session_address.is_some_and(|addr| m.is_authored_by(addr))
        })
        .collect()
}

fn message_view(
    message: &Message,
    session_address: Option<Address>,
    latest_id: Option<u64>,
) -> MessageView {
    MessageView {
        id: message.id,
        author: message.author.to_string(),
        author_short: message.short_author(),
        title: message.title.clone(),
        text: message.text.clone(),
        own: session_address.is_some_and(|addr| message.is_authored_by(addr)),
        latest: latest_id == Some(message.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u64, author_byte: u8, title: &str, text: &str) -> Message {
        Message {
            id,
            author: Address::repeat_byte(author_byte),
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn query_filter_is_case_insensitive_over_title_and_text() {
        let messages = vec![
            message(2, 0x11, "Hello World", "first"),
            message(1, 0x22, "other", "WORLD news"),
            message(0, 0x33, "unrelated", "nothing here"),
        ];

        let hits = filter_messages(&messages, Some("world"), false, None);
        let ids: Vec<u64> = hits.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn mine_filter_requires_a_session_address() {
        let messages = vec![message(1, 0x11, "a", "b"), message(0, 0x22, "c", "d")];

        let anonymous = filter_messages(&messages, None, true, None);
        assert!(anonymous.is_empty());

        let own = filter_messages(&messages, None, true, Some(Address::repeat_byte(0x22)));
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, 0);
    }

    #[test]
    fn view_carries_ownership_and_latest_flags() {
        let m = message(3, 0x44, "title", "text");
        let view = message_view(&m, Some(Address::repeat_byte(0x44)), Some(3));
        assert!(view.own);
        assert!(view.latest);
        assert!(view.author_short.starts_with("0x"));
        assert!(view.author_short.contains("..."));

        let other = message_view(&m, Some(Address::repeat_byte(0x55)), Some(1));
        assert!(!other.own);
        assert!(!other.latest);
    }
}
