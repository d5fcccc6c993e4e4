//! JSON handlers that put the ledger service behind HTTP.
//!
//! Every route is scoped to a conversation ID in the path. The chat transport
//! forwards button presses and messages here and shows the returned text.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    conversation::{Action, ConfirmationToken},
    database_id::ConversationId,
    messages,
    report::ReportSummary,
    service::{DecisionReply, LedgerService, TextReply},
};

/// A menu action picked by the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: Action,
}

/// A line of text typed by the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// The user's answer to a confirmation prompt.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// The token sent with the prompt.
    pub token: ConfirmationToken,
    pub accepted: bool,
}

/// The month to report on. See [crate::service::LedgerService::on_report_requested].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    pub month: Option<u8>,
    pub year: Option<i32>,
}

/// A reply that is only text.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub summary: ReportSummary,
    /// The report rendered as text.
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
    pub message: String,
}

/// A route handler for selecting a menu action.
pub async fn select_action(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<ActionRequest>,
) -> Json<MessageResponse> {
    let message = state
        .service
        .on_action_selected(conversation_id, request.action);

    Json(MessageResponse { message })
}

/// A route handler for a line of user text.
///
/// Input the ledger could not use is answered with 400 and an
/// `{error, message}` body.
pub async fn receive_text(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<TextRequest>,
) -> Result<Response, Error> {
    let reply = run_blocking(&state, move |service| {
        service.on_text_received(conversation_id, &request.text)
    })
    .await?;

    let status = match reply {
        TextReply::Prompt { .. } => StatusCode::OK,
        TextReply::Error { .. } => StatusCode::BAD_REQUEST,
    };

    Ok((status, Json(reply)).into_response())
}

/// A route handler for accepting or rejecting a confirmation.
pub async fn decide(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionReply>, Error> {
    let reply = run_blocking(&state, move |service| {
        service.on_confirmation_decision(conversation_id, &request.token, request.accepted)
    })
    .await?;

    Ok(Json(reply))
}

/// A route handler for cancelling the pending action.
pub async fn cancel(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: state.service.on_cancel(conversation_id),
    })
}

/// A route handler for the report of a month, the current month by default.
pub async fn get_report(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, Error> {
    let summary = run_blocking(&state, move |service| {
        service.on_report_requested(conversation_id, query.month, query.year)
    })
    .await?;

    Ok(Json(ReportResponse {
        message: messages::report(&summary),
        summary,
    }))
}

/// A route handler for the current balance.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<BalanceResponse>, Error> {
    let balance = run_blocking(&state, move |service| {
        service.on_balance_requested(conversation_id)
    })
    .await?;

    Ok(Json(BalanceResponse {
        balance,
        message: messages::balance(balance),
    }))
}

/// Run a service call that touches the database on the blocking pool.
///
/// Store calls may wait on the SQLite busy timeout or sleep between commit
/// retries, which must not stall the async workers.
async fn run_blocking<T, F>(state: &AppState, call: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&LedgerService) -> Result<T, Error> + Send + 'static,
{
    let service = state.service.clone();

    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|error| Error::TaskFailed(error.to_string()))?
}
