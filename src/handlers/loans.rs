use axum::{Json, extract::State, http::StatusCode};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiResult, caller_member, validate_money};
use crate::{
    AppState,
    audit::{self, ClientIp},
    auth::AuthUser,
    config::SaccoSettings,
    error::AppError,
    extract::{Payload, PathParam, QueryParams},
    loans::{LoanAction, repayment_schedule, transition},
    models::{
        ApplyLoanRequest, ApprovalsResponse, ApproveLoanRequest, DisburseLoanRequest, Loan,
        LoanApproval, LoanDecisionResponse, LoanListResponse, LoanResponse, LoanStatus,
        NewLoan, RejectLoanRequest, RepaymentResponse, RepaymentStatus, RepaymentsResponse,
    },
    policy::Permission,
};

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct LoanFilter {
    /// Only loans in this status.
    pub status: Option<LoanStatus>,
}

/// Bounds on the principal shared by applications and approval overrides.
fn validate_amount(amount: &BigDecimal, settings: &SaccoSettings) -> Result<(), AppError> {
    validate_money(amount, "Loan amount")?;
    if *amount <= BigDecimal::zero() {
        return Err(AppError::Validation(
            "Loan amount must be greater than zero".to_string(),
        ));
    }
    if *amount > settings.max_loan_amount {
        return Err(AppError::Validation(format!(
            "Loan amount cannot exceed {} ETB",
            settings.max_loan_amount
        )));
    }
    Ok(())
}

fn validate_application(
    req: &ApplyLoanRequest,
    settings: &SaccoSettings,
) -> Result<BigDecimal, AppError> {
    validate_amount(&req.loan_amount, settings)?;

    let interest_rate = req
        .interest_rate
        .clone()
        .unwrap_or_else(|| settings.loan_interest_rate.clone());
    if interest_rate < BigDecimal::zero() || interest_rate > BigDecimal::from(100) {
        return Err(AppError::Validation(
            "Interest rate must be between 0 and 100".to_string(),
        ));
    }
    if interest_rate.with_scale(2) != interest_rate {
        return Err(AppError::Validation(
            "Interest rate cannot have more than two decimal places".to_string(),
        ));
    }
    Ok(interest_rate)
}

async fn load_loan(state: &AppState, loan_id: Uuid) -> Result<Loan, AppError> {
    state
        .repo
        .get_loan(loan_id)
        .await?
        .ok_or_else(|| AppError::not_found("Loan"))
}

/// Shared by the reject endpoint and `approve` with `approved: false`.
async fn reject(
    state: &AppState,
    auth: &AuthUser,
    ip: &ClientIp,
    loan_id: Uuid,
    reason: Option<String>,
) -> Result<Loan, AppError> {
    let loan = load_loan(state, loan_id).await?;
    transition(loan.status, LoanAction::Reject)?;

    let loan = state
        .repo
        .reject_loan(loan_id, auth.id, reason)
        .await?
        .ok_or_else(|| AppError::Conflict("Loan is no longer pending".to_string()))?;

    tracing::info!(loan_number = %loan.loan_number, decided_by = %auth.id, "loan rejected");
    audit::record(&state.repo, auth.id, ip, "reject_loan", "loans", Some(loan.id)).await;
    Ok(loan)
}

/// apply_for_loan
///
/// [Member Route] Files a loan application for the caller's membership in `pending` status.
#[utoipa::path(
    post,
    path = "/api/loans/apply",
    request_body = ApplyLoanRequest,
    responses(
        (status = 201, description = "Application filed", body = LoanResponse),
        (status = 400, description = "Invalid application"),
        (status = 404, description = "Caller has no membership")
    )
)]
pub async fn apply_for_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<ApplyLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), AppError> {
    auth.require(Permission::ApplyForLoan)?;

    let member = caller_member(&state.repo, auth.id).await?;
    let interest_rate = validate_application(&payload, &state.config.settings)?;

    let loan = state
        .repo
        .create_loan(NewLoan {
            member_id: member.id,
            loan_amount: payload.loan_amount,
            interest_rate,
            loan_period: payload.loan_period,
            purpose: payload.purpose.trim().to_string(),
            collateral_description: payload.collateral_description,
        })
        .await?;

    tracing::info!(loan_number = %loan.loan_number, member_id = %member.id, "loan application filed");
    audit::record(&state.repo, auth.id, &ip, "apply_loan", "loans", Some(loan.id)).await;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            success: true,
            loan,
            message: "Loan application submitted successfully".to_string(),
        }),
    ))
}

/// approve_loan
///
/// [Lending Staff Route] Decides a pending application. On approval the repayment schedule is
/// generated from the (possibly overridden) amount, anchored on the approval date.
#[utoipa::path(
    put,
    path = "/api/loans/approve",
    request_body = ApproveLoanRequest,
    responses(
        (status = 200, description = "Decision recorded", body = LoanDecisionResponse),
        (status = 404, description = "Unknown loan"),
        (status = 409, description = "Loan is not pending")
    )
)]
pub async fn approve_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<ApproveLoanRequest>,
) -> ApiResult<LoanDecisionResponse> {
    auth.require(Permission::ApproveLoan)?;

    if !payload.approved {
        let loan = reject(&state, &auth, &ip, payload.loan_id, None).await?;
        return Ok(Json(LoanDecisionResponse {
            success: true,
            loan,
            repayments: Vec::new(),
            message: "Loan rejected successfully".to_string(),
        }));
    }

    let loan = load_loan(&state, payload.loan_id).await?;
    transition(loan.status, LoanAction::Approve)?;

    let loan_amount = payload.approval_amount.unwrap_or(loan.loan_amount);
    validate_amount(&loan_amount, &state.config.settings)?;

    let approved_at = Utc::now();
    let schedule = repayment_schedule(&loan_amount, loan.loan_period, approved_at.date_naive());

    let (loan, repayments) = state
        .repo
        .approve_loan(LoanApproval {
            loan_id: loan.id,
            approved_by: auth.id,
            approved_at,
            loan_amount,
            schedule,
        })
        .await?
        .ok_or_else(|| AppError::Conflict("Loan is no longer pending".to_string()))?;

    tracing::info!(
        loan_number = %loan.loan_number,
        installments = repayments.len(),
        approved_by = %auth.id,
        "loan approved"
    );
    audit::record(&state.repo, auth.id, &ip, "approve_loan", "loans", Some(loan.id)).await;

    Ok(Json(LoanDecisionResponse {
        success: true,
        loan,
        repayments,
        message: "Loan approved successfully".to_string(),
    }))
}

/// reject_loan
///
/// [Lending Staff Route] Rejects a pending application with an optional reason.
#[utoipa::path(
    put,
    path = "/api/loans/reject",
    request_body = RejectLoanRequest,
    responses(
        (status = 200, description = "Rejected", body = LoanResponse),
        (status = 404, description = "Unknown loan"),
        (status = 409, description = "Loan is not pending")
    )
)]
pub async fn reject_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<RejectLoanRequest>,
) -> ApiResult<LoanResponse> {
    auth.require(Permission::RejectLoan)?;

    let reason = payload
        .rejection_reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let loan = reject(&state, &auth, &ip, payload.loan_id, reason).await?;

    Ok(Json(LoanResponse {
        success: true,
        loan,
        message: "Loan rejected successfully".to_string(),
    }))
}

/// disburse_loan
///
/// [Cash Office Route] Releases an approved loan. A loan can be disbursed exactly once.
#[utoipa::path(
    put,
    path = "/api/loans/disburse",
    request_body = DisburseLoanRequest,
    responses(
        (status = 200, description = "Disbursed", body = LoanResponse),
        (status = 404, description = "Unknown loan"),
        (status = 409, description = "Loan is not approved")
    )
)]
pub async fn disburse_loan(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    Payload(payload): Payload<DisburseLoanRequest>,
) -> ApiResult<LoanResponse> {
    auth.require(Permission::DisburseLoan)?;

    let loan = load_loan(&state, payload.loan_id).await?;
    transition(loan.status, LoanAction::Disburse)?;

    let disbursed_at = payload.disbursement_date.unwrap_or_else(Utc::now);
    let loan = state
        .repo
        .disburse_loan(loan.id, auth.id, disbursed_at)
        .await?
        .ok_or_else(|| AppError::Conflict("Loan is no longer approved".to_string()))?;

    tracing::info!(loan_number = %loan.loan_number, disbursed_by = %auth.id, "loan disbursed");
    audit::record(&state.repo, auth.id, &ip, "disburse_loan", "loans", Some(loan.id)).await;

    Ok(Json(LoanResponse {
        success: true,
        loan,
        message: "Loan disbursed successfully".to_string(),
    }))
}

/// list_loans
///
/// [Staff Route] Loan book with member numbers, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/loans",
    params(LoanFilter),
    responses((status = 200, description = "Loans", body = LoanListResponse))
)]
pub async fn list_loans(
    auth: AuthUser,
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<LoanFilter>,
) -> ApiResult<LoanListResponse> {
    auth.require(Permission::ViewLoans)?;

    let loans = state.repo.list_loans(filter.status).await?;
    Ok(Json(LoanListResponse { loans }))
}

/// get_loan_repayments
///
/// [Authenticated Route] The schedule of one loan. Open to the borrowing member and to staff
/// who may view the loan book.
#[utoipa::path(
    get,
    path = "/api/loans/{id}/repayments",
    params(("id" = Uuid, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Schedule", body = RepaymentsResponse),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Unknown loan")
    )
)]
pub async fn get_loan_repayments(
    auth: AuthUser,
    State(state): State<AppState>,
    PathParam(loan_id): PathParam<Uuid>,
) -> ApiResult<RepaymentsResponse> {
    let loan = load_loan(&state, loan_id).await?;

    let is_borrower = matches!(
        state.repo.get_member_by_user(auth.id).await?,
        Some(member) if member.id == loan.member_id
    );
    if !is_borrower {
        auth.require(Permission::ViewLoans)?;
    }

    let repayments = state.repo.list_repayments(loan.id).await?;
    Ok(Json(RepaymentsResponse { repayments }))
}

/// pay_repayment
///
/// [Cash Office Route] Records an installment as paid. Paying the last outstanding installment
/// moves the loan to `repaid`.
#[utoipa::path(
    put,
    path = "/api/loans/repayments/{id}/pay",
    params(("id" = Uuid, Path, description = "Repayment ID")),
    responses(
        (status = 200, description = "Installment paid", body = RepaymentResponse),
        (status = 404, description = "Unknown installment"),
        (status = 409, description = "Already paid or loan not active")
    )
)]
pub async fn pay_repayment(
    auth: AuthUser,
    State(state): State<AppState>,
    ip: ClientIp,
    PathParam(repayment_id): PathParam<Uuid>,
) -> ApiResult<RepaymentResponse> {
    auth.require(Permission::RecordRepayment)?;

    let repayment = state
        .repo
        .get_repayment(repayment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Repayment"))?;
    if repayment.status == RepaymentStatus::Paid {
        return Err(AppError::Conflict(format!(
            "Installment {} is already paid",
            repayment.installment_number
        )));
    }

    let loan = load_loan(&state, repayment.loan_id).await?;
    if loan.status != LoanStatus::Active {
        return Err(AppError::Conflict(format!(
            "Loan is {} and cannot accept repayments",
            loan.status.as_str()
        )));
    }

    let (repayment, loan) = state
        .repo
        .pay_repayment(repayment.id, auth.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Installment is no longer payable".to_string()))?;

    audit::record(&state.repo, auth.id, &ip, "pay_repayment", "loan_repayments", Some(repayment.id))
        .await;

    let message = if loan.status == LoanStatus::Repaid {
        tracing::info!(loan_number = %loan.loan_number, "loan fully repaid");
        "Loan fully repaid".to_string()
    } else {
        format!("Installment {} recorded as paid", repayment.installment_number)
    };

    Ok(Json(RepaymentResponse {
        success: true,
        repayment,
        loan,
        message,
    }))
}

/// get_approvals
///
/// [Credit Officer Route] Decided applications, most recent decision first.
#[utoipa::path(
    get,
    path = "/api/credit-officer/approvals",
    responses((status = 200, description = "Decisions", body = ApprovalsResponse))
)]
pub async fn get_approvals(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<ApprovalsResponse> {
    auth.require(Permission::ViewLoanDecisions)?;

    let approvals = state.repo.list_decided_loans().await?;
    Ok(Json(ApprovalsResponse { approvals }))
}
