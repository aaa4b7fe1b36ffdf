use utoipa::OpenApi;

use crate::{
    api::models::{BalanceResponse, CreateTransactionRequest, CreatedResponse, ErrorResponse},
    core::{
        models::{AppLog, Transaction, TransactionId, UserId},
        services::PartnerBalance,
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_transaction,
        super::handlers::list_transactions,
        super::handlers::get_transaction,
        super::handlers::accept_transaction,
        super::handlers::reject_transaction,
        super::handlers::list_transaction_partners,
        super::handlers::get_balance,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateTransactionRequest,
        CreatedResponse,
        BalanceResponse,
        ErrorResponse,
        Transaction,
        TransactionId,
        UserId,
        PartnerBalance,
        AppLog
    )),
    info(
        title = "Timebank API",
        description = "Time-exchange ledger: offers, requests and settled balances",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
