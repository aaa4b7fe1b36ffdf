use crate::{
    api::models::*,
    auth::jwt::JwtService,
    core::{
        errors::LedgerError,
        models::{AppLog, Transaction, TransactionId, TransactionProposal, UserId},
        services::{LedgerService, PartnerBalance},
    },
    infrastructure::{
        directory::in_memory::InMemoryDirectory, logging::in_memory::InMemoryLogging,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, patch},
};
use http::header;

use std::sync::Arc;

pub type AppService = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryDirectory>;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<AppService>,
    pub jwt: Arc<JwtService>,
}

/// Authenticated caller, placed in request extensions by [`auth_middleware`].
#[derive(Clone, Copy, Debug)]
pub struct ActingUser(pub UserId);

// Middleware to validate JWT
async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| LedgerError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| LedgerError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = state.jwt.validate_token(token)?;
    let user_id = claims.user_id()?;
    req.extensions_mut().insert(ActingUser(user_id));
    Ok(next.run(req).await)
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}/accept", patch(accept_transaction))
        .route("/transactions/{transaction_id}/reject", patch(reject_transaction))
        .route("/users", get(list_transaction_partners))
        .route("/balance", get(get_balance))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction offered or requested", body = CreatedResponse),
        (status = 400, description = "Invalid proposal", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Cannot propose on behalf of another user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_transaction(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let proposal = TransactionProposal::try_from(req)?;
    let transaction = state.ledger.propose_transaction(proposal, user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            resource_id: transaction.id,
            message: format!("Transaction {} created", transaction.id),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/transactions",
    responses(
        (status = 200, description = "Transactions of the caller, oldest settlement first", body = [Transaction]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_transactions(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let transactions = state.ledger.list_transactions(user_id).await?;
    Ok(Json(transactions))
}

#[utoipa::path(
    get,
    path = "/api/transactions/{transaction_id}",
    params(("transaction_id" = u64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction found", body = Transaction),
        (status = 403, description = "Caller is not a party to the transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_transaction(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
    Path(transaction_id): Path<u64>,
) -> Result<Json<Transaction>, ApiError> {
    let transaction = state
        .ledger
        .get_transaction(TransactionId(transaction_id), user_id)
        .await?;
    Ok(Json(transaction))
}

#[utoipa::path(
    patch,
    path = "/api/transactions/{transaction_id}/accept",
    params(("transaction_id" = u64, Path, description = "Transaction id")),
    responses(
        (status = 201, description = "Transaction approved", body = CreatedResponse),
        (status = 403, description = "Caller may not accept this transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Transaction already settled or settlement conflict", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn accept_transaction(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
    Path(transaction_id): Path<u64>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let transaction = state
        .ledger
        .accept_transaction(TransactionId(transaction_id), user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            resource_id: transaction.id,
            message: format!("Transaction {} accepted", transaction.id),
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/transactions/{transaction_id}/reject",
    params(("transaction_id" = u64, Path, description = "Transaction id")),
    responses(
        (status = 201, description = "Transaction rejected", body = CreatedResponse),
        (status = 403, description = "Caller may not reject this transaction", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse),
        (status = 409, description = "Transaction already settled", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn reject_transaction(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
    Path(transaction_id): Path<u64>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let transaction = state
        .ledger
        .reject_transaction(TransactionId(transaction_id), user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            resource_id: transaction.id,
            message: format!("Transaction {} rejected", transaction.id),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Transaction partners and their balances", body = [PartnerBalance]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_transaction_partners(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
) -> Result<Json<Vec<PartnerBalance>>, ApiError> {
    let partners = state.ledger.transaction_partners(user_id).await?;
    Ok(Json(partners))
}

#[utoipa::path(
    get,
    path = "/api/balance",
    responses(
        (status = 200, description = "Current balance of the caller", body = BalanceResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_balance(
    State(state): State<AppState>,
    Extension(ActingUser(user_id)): Extension<ActingUser>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.balance(user_id).await?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Audit trail", body = [AppLog]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_app_logs(State(state): State<AppState>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = state.ledger.get_app_logs().await?;
    Ok(Json(logs))
}
