use axum::{Json, extract::State};
use bigdecimal::{BigDecimal, Zero};

use super::{ApiResult, validate_money};
use crate::{
    AppState,
    audit::{self, ClientIp},
    auth::AuthUser,
    error::AppError,
    extract::Payload,
    models::{
        AccountsResponse, CashMovement, CashMovementRequest, CashMovementResponse,
        LedgerResponse, TransactionType,
    },
    policy::Permission,
};

/// Rows returned by the administrative ledger view.
const LEDGER_LIMIT: i64 = 500;

/// move_cash
///
/// Validates and applies one deposit or withdrawal, then audits it.
async fn move_cash(
    state: &AppState,
    auth: &AuthUser,
    ip: &ClientIp,
    transaction_type: TransactionType,
    req: CashMovementRequest,
) -> Result<CashMovementResponse, AppError> {
    if req.amount <= BigDecimal::zero() {
        return Err(AppError::Validation(
            "Amount must be greater than zero".to_string(),
        ));
    }
    validate_money(&req.amount, "Amount")?;
    state
        .repo
        .get_member(req.member_id)
        .await?
        .ok_or_else(|| AppError::not_found("Member"))?;

    let description = req
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| match transaction_type {
            TransactionType::Deposit => "Deposit".to_string(),
            TransactionType::Withdrawal => "Withdrawal".to_string(),
        });

    let (transaction, account) = state
        .repo
        .apply_cash_movement(CashMovement {
            member_id: req.member_id,
            transaction_type,
            amount: req.amount,
            description,
            processed_by: auth.id,
        })
        .await?;

    tracing::info!(
        reference = %transaction.reference_number,
        kind = ?transaction_type,
        account = %account.account_number,
        processed_by = %auth.id,
        "cash movement recorded"
    );
    let action = match transaction_type {
        TransactionType::Deposit => "deposit",
        TransactionType::Withdrawal => "withdrawal",
    };
    audit::record(&state.repo, auth.id, ip, action, "transactions", Some(transaction.id)).await;

    Ok(CashMovementResponse {
        success: true,
        reference_number: transaction.reference_number.clone(),
        new_balance: account.balance,
        transaction,
    })
}

/// deposit
///
/// [Cash Office Route] Credits the member's mandatory savings account. The balance increment
/// and the ledger row are written atomically.
#[utoipa::path(
    post,
    path = "/api/transactions/deposit",
    request_body = CashMovementRequest,
    responses(
        (status = 200, description = "Deposit recorded", body = CashMovementResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Member or savings account not found")
    )
)]
pub async fn deposit(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<CashMovementRequest>,
) -> ApiResult<CashMovementResponse> {
    auth.require(Permission::RecordDeposit)?;

    let response = move_cash(&state, &auth, &ip, TransactionType::Deposit, payload).await?;
    Ok(Json(response))
}

/// withdraw
///
/// [Cash Office Route] Debits the member's mandatory savings account; never below zero.
#[utoipa::path(
    post,
    path = "/api/transactions/withdraw",
    request_body = CashMovementRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = CashMovementResponse),
        (status = 400, description = "Invalid amount or insufficient funds"),
        (status = 404, description = "Member or savings account not found")
    )
)]
pub async fn withdraw(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<CashMovementRequest>,
) -> ApiResult<CashMovementResponse> {
    auth.require(Permission::RecordWithdrawal)?;

    let response = move_cash(&state, &auth, &ip, TransactionType::Withdrawal, payload).await?;
    Ok(Json(response))
}

/// list_savings_accounts
///
/// [CSO Route] All savings accounts with their member numbers.
#[utoipa::path(
    get,
    path = "/api/cso/savings",
    responses((status = 200, description = "Accounts", body = AccountsResponse))
)]
pub async fn list_savings_accounts(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AccountsResponse> {
    auth.require(Permission::ViewSavingsAccounts)?;

    let accounts = state.repo.list_accounts().await?;
    Ok(Json(AccountsResponse { accounts }))
}

/// list_ledger
///
/// [Admin Route] The latest ledger rows across all members.
#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    responses((status = 200, description = "Ledger", body = LedgerResponse))
)]
pub async fn list_ledger(auth: AuthUser, State(state): State<AppState>) -> ApiResult<LedgerResponse> {
    auth.require(Permission::ViewLedger)?;

    let transactions = state.repo.list_transactions(LEDGER_LIMIT).await?;
    Ok(Json(LedgerResponse { transactions }))
}
