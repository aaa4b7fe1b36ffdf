use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::{ErrorKind, LedgerError};
use crate::core::models::{TransactionId, TransactionProposal, TransactionStatus, UserId};

/// Body of `POST /api/transactions`. A counterparty id of 0 (or an omitted
/// one) is resolved from `email`.
#[derive(Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub from_user_id: u64,
    #[serde(default)]
    pub to_user_id: u64,
    pub email: Option<String>,
    pub seconds: u64,
    pub multiplier: f64,
    pub tx_fee: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// 1 = offered, 2 = requested
    #[schema(example = 1)]
    pub status: u8,
}

impl TryFrom<CreateTransactionRequest> for TransactionProposal {
    type Error = LedgerError;

    fn try_from(req: CreateTransactionRequest) -> Result<Self, Self::Error> {
        let non_zero = |id: u64| (id != 0).then_some(UserId(id));
        Ok(TransactionProposal {
            from_user_id: non_zero(req.from_user_id),
            to_user_id: non_zero(req.to_user_id),
            email: req.email,
            seconds: req.seconds,
            multiplier: req.multiplier,
            tx_fee: req.tx_fee,
            description: req.description,
            location: req.location,
            status: TransactionStatus::from_code(req.status)?,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub resource_id: TransactionId,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: i64,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}
