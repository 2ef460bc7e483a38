use axum::{Json, extract::State, http::StatusCode};
use bigdecimal::BigDecimal;
use sacco_portal::{
    AppConfig, AppError, AppState, MemoryRepository, MockIdentityProvider,
    audit::ClientIp,
    auth::AuthUser,
    extract::{PathParam, Payload, QueryParams},
    handlers,
    identity::IdentityState,
    models::{
        AccountType, ApplyLoanRequest, ApproveLoanRequest, CashMovementRequest,
        CashMovementResponse, CreateUserRequest, DisburseLoanRequest, EnrollMemberRequest,
        LoanStatus, MembershipStatus, NewUser, RegisterRequest, RegistrationResponse,
        RejectLoanRequest, RepaymentStatus, Role, ToggleUserStatusRequest,
        UpdateProfileRequest, UpdateUserRoleRequest,
    },
    repository::RepositoryState,
};
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

// --- Test Context ---

fn state_with(identity: IdentityState) -> AppState {
    AppState {
        repo: Arc::new(MemoryRepository::new()) as RepositoryState,
        identity,
        config: AppConfig::default(),
    }
}

fn test_state() -> AppState {
    state_with(Arc::new(MockIdentityProvider::new()) as IdentityState)
}

fn no_ip() -> ClientIp {
    ClientIp(None)
}

fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

/// Inserts a staff login directly and returns it as a resolved caller.
async fn seed_user(state: &AppState, role: Role) -> AuthUser {
    let user = state
        .repo
        .create_user(NewUser {
            id: Uuid::new_v4(),
            email: format!("{}-{}@sacco.test", role, Uuid::new_v4()),
            full_name: role.to_string(),
            phone: None,
            role,
        })
        .await
        .unwrap();

    AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
    }
}

async fn register(state: &AppState, email: &str, shares: Option<i32>) -> RegistrationResponse {
    let (status, Json(body)) = handlers::auth::register(
        State(state.clone()),
        no_ip(),
        Payload(RegisterRequest {
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            full_name: Some("Almaz Tesfaye".to_string()),
            phone: Some("+251911000000".to_string()),
            shares_held: shares,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    body
}

fn as_caller(registration: &RegistrationResponse) -> AuthUser {
    AuthUser {
        id: registration.user.id,
        email: registration.user.email.clone(),
        role: Role::Member,
    }
}

async fn deposit(
    state: &AppState,
    cashier: &AuthUser,
    member_id: Uuid,
    amount: &str,
) -> Result<CashMovementResponse, AppError> {
    handlers::transactions::deposit(
        cashier.clone(),
        State(state.clone()),
        no_ip(),
        Payload(CashMovementRequest {
            member_id,
            amount: dec(amount),
            description: None,
        }),
    )
    .await
    .map(|Json(body)| body)
}

async fn apply(state: &AppState, member: &AuthUser, amount: &str, months: i32) -> Uuid {
    let (status, Json(body)) = handlers::loans::apply_for_loan(
        member.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ApplyLoanRequest {
            loan_amount: dec(amount),
            interest_rate: None,
            loan_period: months,
            purpose: "Dairy equipment".to_string(),
            collateral_description: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.loan.status, LoanStatus::Pending);
    body.loan.id
}

// --- Registration ---

#[tokio::test]
async fn test_register_rejects_fewer_than_minimum_shares() {
    let state = test_state();

    let err = handlers::auth::register(
        State(state.clone()),
        no_ip(),
        Payload(RegisterRequest {
            email: "one.share@sacco.test".to_string(),
            password: "secret".to_string(),
            shares_held: Some(1),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        err.to_string(),
        "Minimum share purchase is 2 shares (2,000 ETB)"
    );
    assert!(state.repo.list_users().await.unwrap().is_empty());
    assert!(state.repo.list_members().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_creates_user_member_and_mandatory_account() {
    let state = test_state();

    let body = register(&state, "almaz@sacco.test", Some(2)).await;

    assert!(body.success);
    assert_eq!(body.user.role, Role::Member);
    assert_eq!(body.member.user_id, Some(body.user.id));
    assert_eq!(body.member.membership_status, MembershipStatus::Active);
    assert_eq!(body.member.shares_held, 2);
    assert_eq!(body.member.share_capital, BigDecimal::from(2000));
    assert_eq!(body.member.member_number, "MEM00000001");

    assert_eq!(body.account.member_id, body.member.id);
    assert_eq!(body.account.account_type, AccountType::Mandatory);
    assert_eq!(body.account.balance, BigDecimal::from(0));
    assert_eq!(body.account.account_number, "ACC00000001");

    let logs = state.repo.list_audit_logs(10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "register_member");
    assert_eq!(logs[0].user_email, "almaz@sacco.test");
}

#[tokio::test]
async fn test_register_defaults_to_minimum_shares() {
    let state = test_state();

    let body = register(&state, "default.shares@sacco.test", None).await;

    assert_eq!(body.member.shares_held, 2);
    assert_eq!(body.member.share_capital, BigDecimal::from(2000));
}

#[tokio::test]
async fn test_register_surfaces_identity_rejection_without_persisting() {
    let state = state_with(Arc::new(MockIdentityProvider::new_failing()) as IdentityState);

    let err = handlers::auth::register(
        State(state.clone()),
        no_ip(),
        Payload(RegisterRequest {
            email: "taken@sacco.test".to_string(),
            password: "secret".to_string(),
            shares_held: Some(3),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "User already registered");
    assert!(state.repo.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_refuses_share_capital_beyond_money_columns() {
    let state = test_state();

    let err = handlers::auth::register(
        State(state.clone()),
        no_ip(),
        Payload(RegisterRequest {
            email: "hoarder@sacco.test".to_string(),
            password: "secret".to_string(),
            shares_held: Some(1_000_000_000),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(err.to_string().starts_with("Share capital must be less than"));
    assert!(state.repo.list_users().await.unwrap().is_empty());
}

// --- Member self-service ---

#[tokio::test]
async fn test_profile_update_touches_only_supplied_fields() {
    let state = test_state();
    let registration = register(&state, "profile@sacco.test", Some(2)).await;
    let member = as_caller(&registration);

    let Json(profile) = handlers::members::update_profile(
        member.clone(),
        State(state.clone()),
        no_ip(),
        Payload(UpdateProfileRequest {
            address: Some("Bole, Addis Ababa".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    let updated = profile.member.expect("caller is a member");
    assert_eq!(updated.address.as_deref(), Some("Bole, Addis Ababa"));
    assert_eq!(updated.phone.as_deref(), Some("+251911000000"));
    assert_eq!(profile.user.full_name, "Almaz Tesfaye");
}

#[tokio::test]
async fn test_member_dashboard_reports_mandatory_balance() {
    let state = test_state();
    let registration = register(&state, "dash@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    deposit(&state, &cashier, registration.member.id, "750.25")
        .await
        .unwrap();

    let Json(stats) = handlers::members::get_member_stats(
        as_caller(&registration),
        State(state.clone()),
    )
    .await
    .unwrap();

    assert_eq!(stats.member.id, registration.member.id);
    assert_eq!(stats.balance, dec("750.25"));
}

#[tokio::test]
async fn test_member_transactions_are_paged_newest_first() {
    let state = test_state();
    let registration = register(&state, "pager@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    for amount in ["10", "20", "30"] {
        deposit(&state, &cashier, registration.member.id, amount)
            .await
            .unwrap();
    }

    let Json(page) = handlers::members::get_my_transactions(
        as_caller(&registration),
        State(state.clone()),
        QueryParams(handlers::members::PageParams {
            limit: Some(2),
            offset: Some(1),
        }),
    )
    .await
    .unwrap();

    let amounts: Vec<_> = page.transactions.iter().map(|t| t.amount.clone()).collect();
    assert_eq!(amounts, vec![dec("20"), dec("10")]);
}

// --- Staff enrolment ---

#[tokio::test]
async fn test_counter_enrolment_starts_pending_until_activated() {
    let state = test_state();
    let cso = seed_user(&state, Role::Cso).await;

    let (status, Json(enrolled)) = handlers::members::enroll_member(
        cso.clone(),
        State(state.clone()),
        no_ip(),
        Payload(EnrollMemberRequest {
            full_name: "Kebede Alemu".to_string(),
            national_id: Some("ET-554433".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(enrolled.member.membership_status, MembershipStatus::Pending);
    assert_eq!(enrolled.member.user_id, None);
    assert_eq!(
        enrolled.message,
        format!("Member {} registered successfully", enrolled.member.member_number)
    );

    let Json(activated) = handlers::members::activate_member(
        cso,
        State(state.clone()),
        no_ip(),
        Payload(sacco_portal::models::ActivateMemberRequest {
            member_id: enrolled.member.id,
        }),
    )
    .await
    .unwrap();

    assert_eq!(activated.member.membership_status, MembershipStatus::Active);
    assert_eq!(activated.message, "Member activated successfully");
}

#[tokio::test]
async fn test_activating_unknown_member_is_not_found() {
    let state = test_state();
    let manager = seed_user(&state, Role::Manager).await;

    let err = handlers::members::activate_member(
        manager,
        State(state),
        no_ip(),
        Payload(sacco_portal::models::ActivateMemberRequest {
            member_id: Uuid::new_v4(),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Member not found");
}

// --- Cash movements ---

#[tokio::test]
async fn test_concurrent_deposits_are_both_applied() {
    let state = test_state();
    let registration = register(&state, "busy@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let member_id = registration.member.id;

    let (first, second) = tokio::join!(
        deposit(&state, &cashier, member_id, "100"),
        deposit(&state, &cashier, member_id, "100"),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_ne!(first.reference_number, second.reference_number);
    assert!(first.reference_number.starts_with("DEP"));

    let account = state
        .repo
        .get_mandatory_account(member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, BigDecimal::from(200));

    let ledger = state
        .repo
        .list_member_transactions(member_id, 50, 0)
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].balance_after, BigDecimal::from(200));
}

#[tokio::test]
async fn test_withdrawal_beyond_balance_is_rejected_and_leaves_no_trace() {
    let state = test_state();
    let registration = register(&state, "saver@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let member_id = registration.member.id;
    deposit(&state, &cashier, member_id, "50").await.unwrap();

    let err = handlers::transactions::withdraw(
        cashier.clone(),
        State(state.clone()),
        no_ip(),
        Payload(CashMovementRequest {
            member_id,
            amount: dec("80"),
            description: Some("School fees".to_string()),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Insufficient funds");

    let account = state
        .repo
        .get_mandatory_account(member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, BigDecimal::from(50));
    assert_eq!(
        state
            .repo
            .list_member_transactions(member_id, 50, 0)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_withdrawal_within_balance_debits_account() {
    let state = test_state();
    let registration = register(&state, "spender@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let member_id = registration.member.id;
    deposit(&state, &cashier, member_id, "500").await.unwrap();

    let Json(body) = handlers::transactions::withdraw(
        cashier,
        State(state.clone()),
        no_ip(),
        Payload(CashMovementRequest {
            member_id,
            amount: dec("120.50"),
            description: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body.new_balance, dec("379.50"));
    assert!(body.reference_number.starts_with("WDR"));
    assert_eq!(body.transaction.description, "Withdrawal");
}

#[tokio::test]
async fn test_non_positive_amount_is_a_validation_error() {
    let state = test_state();
    let registration = register(&state, "zero@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;

    let err = deposit(&state, &cashier, registration.member.id, "0")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deposit_for_unknown_member_is_not_found() {
    let state = test_state();
    let cashier = seed_user(&state, Role::Cashier).await;

    let err = deposit(&state, &cashier, Uuid::new_v4(), "10")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Member not found");
}

#[tokio::test]
async fn test_sub_cent_deposit_is_rejected_without_moving_money() {
    let state = test_state();
    let registration = register(&state, "cents@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;

    let err = deposit(&state, &cashier, registration.member.id, "0.001")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Amount cannot have more than two decimal places");

    let account = state
        .repo
        .get_mandatory_account(registration.member.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, BigDecimal::from(0));
}

#[tokio::test]
async fn test_balance_overflow_is_a_validation_error() {
    let state = test_state();
    let registration = register(&state, "whale@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let member_id = registration.member.id;

    let err = deposit(&state, &cashier, member_id, "1000000000000")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    deposit(&state, &cashier, member_id, "999999999999.99")
        .await
        .unwrap();
    let err = deposit(&state, &cashier, member_id, "1").await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let account = state
        .repo
        .get_mandatory_account(member_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance, dec("999999999999.99"));
}

#[tokio::test]
async fn test_cso_may_deposit_but_not_withdraw() {
    let state = test_state();
    let registration = register(&state, "cso.flow@sacco.test", Some(2)).await;
    let cso = seed_user(&state, Role::Cso).await;

    deposit(&state, &cso, registration.member.id, "40").await.unwrap();

    let err = handlers::transactions::withdraw(
        cso,
        State(state),
        no_ip(),
        Payload(CashMovementRequest {
            member_id: registration.member.id,
            amount: dec("10"),
            description: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

// --- Loan lifecycle ---

#[tokio::test]
async fn test_loan_lifecycle_from_application_to_repaid() {
    let state = test_state();
    let registration = register(&state, "borrower@sacco.test", Some(2)).await;
    let member = as_caller(&registration);
    let officer = seed_user(&state, Role::CreditOfficer).await;
    let cashier = seed_user(&state, Role::Cashier).await;

    let loan_id = apply(&state, &member, "12000", 12).await;

    let Json(decision) = handlers::loans::approve_loan(
        officer.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ApproveLoanRequest {
            loan_id,
            approved: true,
            approval_amount: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(decision.loan.status, LoanStatus::Approved);
    assert_eq!(decision.loan.approved_by, Some(officer.id));
    assert_eq!(decision.repayments.len(), 12);
    assert!(
        decision
            .repayments
            .iter()
            .all(|r| r.amount_due == BigDecimal::from(1000) && r.status == RepaymentStatus::Pending)
    );
    let numbers: Vec<_> = decision.repayments.iter().map(|r| r.installment_number).collect();
    assert_eq!(numbers, (1..=12).collect::<Vec<_>>());

    // Approving twice is a state conflict.
    let err = handlers::loans::approve_loan(
        officer.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ApproveLoanRequest {
            loan_id,
            approved: true,
            approval_amount: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    // Installments cannot be paid before disbursement.
    let first_installment = decision.repayments[0].id;
    let err = handlers::loans::pay_repayment(
        cashier.clone(),
        State(state.clone()),
        no_ip(),
        PathParam(first_installment),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let Json(disbursed) = handlers::loans::disburse_loan(
        cashier.clone(),
        State(state.clone()),
        no_ip(),
        Payload(DisburseLoanRequest {
            loan_id,
            disbursement_date: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(disbursed.loan.status, LoanStatus::Active);
    assert_eq!(disbursed.loan.disbursed_by, Some(cashier.id));
    assert!(disbursed.loan.disbursed_at.is_some());

    // A loan is disbursed exactly once.
    let err = handlers::loans::disburse_loan(
        cashier.clone(),
        State(state.clone()),
        no_ip(),
        Payload(DisburseLoanRequest {
            loan_id,
            disbursement_date: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let mut last_message = String::new();
    for repayment in &decision.repayments {
        let Json(paid) = handlers::loans::pay_repayment(
            cashier.clone(),
            State(state.clone()),
            no_ip(),
            PathParam(repayment.id),
        )
        .await
        .unwrap();
        assert_eq!(paid.repayment.status, RepaymentStatus::Paid);
        last_message = paid.message;
    }
    assert_eq!(last_message, "Loan fully repaid");

    let loan = state.repo.get_loan(loan_id).await.unwrap().unwrap();
    assert_eq!(loan.status, LoanStatus::Repaid);

    let err = handlers::loans::pay_repayment(
        cashier,
        State(state.clone()),
        no_ip(),
        PathParam(first_installment),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_approval_amount_override_drives_the_schedule() {
    let state = test_state();
    let registration = register(&state, "override@sacco.test", Some(2)).await;
    let manager = seed_user(&state, Role::Manager).await;
    let loan_id = apply(&state, &as_caller(&registration), "10000", 3).await;

    let Json(decision) = handlers::loans::approve_loan(
        manager,
        State(state),
        no_ip(),
        Payload(ApproveLoanRequest {
            loan_id,
            approved: true,
            approval_amount: Some(dec("1000")),
        }),
    )
    .await
    .unwrap();

    assert_eq!(decision.loan.loan_amount, BigDecimal::from(1000));
    let total = decision
        .repayments
        .iter()
        .fold(BigDecimal::from(0), |acc, r| acc + &r.amount_due);
    assert_eq!(total, BigDecimal::from(1000));
    assert_eq!(decision.repayments[2].amount_due, dec("333.34"));
}

#[tokio::test]
async fn test_sub_cent_principal_never_reaches_the_schedule() {
    let state = test_state();
    let registration = register(&state, "fraction@sacco.test", Some(2)).await;
    let member = as_caller(&registration);
    let manager = seed_user(&state, Role::Manager).await;

    let err = handlers::loans::apply_for_loan(
        member.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ApplyLoanRequest {
            loan_amount: dec("1000.009"),
            interest_rate: None,
            loan_period: 3,
            purpose: "Seed stock".to_string(),
            collateral_description: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(state.repo.list_loans(None).await.unwrap().is_empty());

    let loan_id = apply(&state, &member, "1000", 3).await;
    let err = handlers::loans::approve_loan(
        manager,
        State(state.clone()),
        no_ip(),
        Payload(ApproveLoanRequest {
            loan_id,
            approved: true,
            approval_amount: Some(dec("999.999")),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let loan = state.repo.get_loan(loan_id).await.unwrap().unwrap();
    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.loan_amount, BigDecimal::from(1000));
}

#[tokio::test]
async fn test_declined_approval_rejects_the_loan() {
    let state = test_state();
    let registration = register(&state, "declined@sacco.test", Some(2)).await;
    let officer = seed_user(&state, Role::CreditOfficer).await;
    let loan_id = apply(&state, &as_caller(&registration), "5000", 6).await;

    let Json(decision) = handlers::loans::approve_loan(
        officer.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ApproveLoanRequest {
            loan_id,
            approved: false,
            approval_amount: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(decision.loan.status, LoanStatus::Rejected);
    assert!(decision.repayments.is_empty());
    assert!(state.repo.list_repayments(loan_id).await.unwrap().is_empty());

    let err = handlers::loans::reject_loan(
        officer.clone(),
        State(state.clone()),
        no_ip(),
        Payload(RejectLoanRequest {
            loan_id,
            rejection_reason: Some("Duplicate".to_string()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let Json(decided) = handlers::loans::get_approvals(officer, State(state))
        .await
        .unwrap();
    assert_eq!(decided.approvals.len(), 1);
    assert_eq!(decided.approvals[0].member_number, registration.member.member_number);
}

#[tokio::test]
async fn test_rejection_records_reason() {
    let state = test_state();
    let registration = register(&state, "reason@sacco.test", Some(2)).await;
    let manager = seed_user(&state, Role::Manager).await;
    let loan_id = apply(&state, &as_caller(&registration), "2500", 6).await;

    let Json(rejected) = handlers::loans::reject_loan(
        manager,
        State(state),
        no_ip(),
        Payload(RejectLoanRequest {
            loan_id,
            rejection_reason: Some("  Insufficient collateral ".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(rejected.loan.status, LoanStatus::Rejected);
    assert_eq!(
        rejected.loan.rejection_reason.as_deref(),
        Some("Insufficient collateral")
    );
    assert_eq!(rejected.message, "Loan rejected successfully");
}

#[tokio::test]
async fn test_application_above_ceiling_is_rejected() {
    let state = test_state();
    let registration = register(&state, "ambitious@sacco.test", Some(2)).await;

    let err = handlers::loans::apply_for_loan(
        as_caller(&registration),
        State(state.clone()),
        no_ip(),
        Payload(ApplyLoanRequest {
            loan_amount: dec("50000.01"),
            interest_rate: None,
            loan_period: 12,
            purpose: "Truck".to_string(),
            collateral_description: None,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(state.repo.list_loans(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_application_defaults_interest_rate() {
    let state = test_state();
    let registration = register(&state, "rate@sacco.test", Some(2)).await;
    let loan_id = apply(&state, &as_caller(&registration), "1000", 10).await;

    let loan = state.repo.get_loan(loan_id).await.unwrap().unwrap();
    assert_eq!(loan.interest_rate, BigDecimal::from(10));
    assert_eq!(loan.loan_number, "LOAN00000001");
}

#[tokio::test]
async fn test_member_role_without_membership_cannot_apply() {
    let state = test_state();
    let orphan = seed_user(&state, Role::Member).await;

    let err = handlers::loans::apply_for_loan(
        orphan,
        State(state),
        no_ip(),
        Payload(ApplyLoanRequest {
            loan_amount: dec("1000"),
            interest_rate: None,
            loan_period: 12,
            purpose: "Seeds".to_string(),
            collateral_description: None,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "Member not found");
}

#[tokio::test]
async fn test_repayment_schedule_is_private_to_borrower_and_staff() {
    let state = test_state();
    let borrower = register(&state, "owner@sacco.test", Some(2)).await;
    let neighbour = register(&state, "neighbour@sacco.test", Some(2)).await;
    let auditor = seed_user(&state, Role::Auditor).await;
    let loan_id = apply(&state, &as_caller(&borrower), "1200", 12).await;

    let Json(own) = handlers::loans::get_loan_repayments(
        as_caller(&borrower),
        State(state.clone()),
        PathParam(loan_id),
    )
    .await
    .unwrap();
    assert!(own.repayments.is_empty());

    let err = handlers::loans::get_loan_repayments(
        as_caller(&neighbour),
        State(state.clone()),
        PathParam(loan_id),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    let Json(audited) =
        handlers::loans::get_loan_repayments(auditor, State(state), PathParam(loan_id))
            .await
            .unwrap();
    assert!(audited.repayments.is_empty());
}

#[tokio::test]
async fn test_loan_book_filters_by_status() {
    let state = test_state();
    let registration = register(&state, "book@sacco.test", Some(2)).await;
    let member = as_caller(&registration);
    let manager = seed_user(&state, Role::Manager).await;
    let first = apply(&state, &member, "1000", 2).await;
    apply(&state, &member, "2000", 4).await;

    let Json(rejected) = handlers::loans::reject_loan(
        manager.clone(),
        State(state.clone()),
        no_ip(),
        Payload(RejectLoanRequest {
            loan_id: first,
            rejection_reason: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(rejected.loan.status, LoanStatus::Rejected);

    let Json(pending) = handlers::loans::list_loans(
        manager,
        State(state),
        QueryParams(handlers::loans::LoanFilter {
            status: Some(LoanStatus::Pending),
        }),
    )
    .await
    .unwrap();

    assert_eq!(pending.loans.len(), 1);
    assert_eq!(pending.loans[0].loan.loan_amount, BigDecimal::from(2000));
    assert_eq!(pending.loans[0].member_number, "MEM00000001");
}

// --- Administration ---

#[tokio::test]
async fn test_admin_creates_staff_login() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;

    let (status, Json(created)) = handlers::admin::create_user(
        admin,
        State(state.clone()),
        no_ip(),
        Payload(CreateUserRequest {
            email: "hirut@sacco.test".to_string(),
            password: "temporary".to_string(),
            full_name: None,
            phone: None,
            role: Role::Cashier,
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.user.role, Role::Cashier);
    assert_eq!(created.user.full_name, "hirut");
    assert!(created.user.is_active);
    assert!(state.repo.get_user(created.user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_user_with_taken_email_keeps_existing_login() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;
    let taken = admin.email.clone();

    let err = handlers::admin::create_user(
        admin,
        State(state.clone()),
        no_ip(),
        Payload(CreateUserRequest {
            email: taken.clone(),
            password: "temporary".to_string(),
            full_name: None,
            phone: None,
            role: Role::Cashier,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    let users = state.repo.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, taken);
    assert_eq!(users[0].role, Role::Admin);
}

#[tokio::test]
async fn test_toggle_status_twice_restores_original_value() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;
    let teller = seed_user(&state, Role::Cashier).await;

    let toggle = || {
        handlers::admin::toggle_user_status(
            admin.clone(),
            State(state.clone()),
            no_ip(),
            Payload(ToggleUserStatusRequest { user_id: teller.id }),
        )
    };

    let Json(first) = toggle().await.unwrap();
    assert!(!first.user.is_active);
    let Json(second) = toggle().await.unwrap();
    assert!(second.user.is_active);
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;

    let err = handlers::admin::toggle_user_status(
        admin.clone(),
        State(state.clone()),
        no_ip(),
        Payload(ToggleUserStatusRequest { user_id: admin.id }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    assert!(state.repo.get_user(admin.id).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_role_update_and_unknown_user() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;
    let staff = seed_user(&state, Role::Cso).await;

    let Json(updated) = handlers::admin::update_user_role(
        admin.clone(),
        State(state.clone()),
        no_ip(),
        Payload(UpdateUserRoleRequest {
            user_id: staff.id,
            role: Role::Manager,
        }),
    )
    .await
    .unwrap();
    assert_eq!(updated.user.role, Role::Manager);

    let err = handlers::admin::update_user_role(
        admin,
        State(state),
        no_ip(),
        Payload(UpdateUserRoleRequest {
            user_id: Uuid::new_v4(),
            role: Role::Manager,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn test_settings_expose_configured_policy() {
    let state = test_state();
    let admin = seed_user(&state, Role::Admin).await;

    let Json(body) = handlers::admin::get_settings(admin, State(state)).await.unwrap();

    assert_eq!(body.settings.min_shares, 2);
    assert_eq!(body.settings.share_price, BigDecimal::from(1000));
    assert_eq!(body.settings.max_loan_amount, BigDecimal::from(50000));
}

// --- Reporting and audit ---

#[tokio::test]
async fn test_dashboards_reflect_portfolio() {
    let state = test_state();
    let registration = register(&state, "portfolio@sacco.test", Some(5)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let admin = seed_user(&state, Role::Admin).await;
    let manager = seed_user(&state, Role::Manager).await;
    let auditor = seed_user(&state, Role::Auditor).await;
    deposit(&state, &cashier, registration.member.id, "300").await.unwrap();
    apply(&state, &as_caller(&registration), "1000", 4).await;

    let Json(admin_stats) = handlers::reports::get_admin_stats(admin.clone(), State(state.clone()))
        .await
        .unwrap();
    assert_eq!(admin_stats.total_members, 1);
    assert_eq!(admin_stats.total_loans, 1);
    assert_eq!(admin_stats.active_loans, 0);
    assert_eq!(admin_stats.total_savings, BigDecimal::from(300));
    assert_eq!(admin_stats.total_share_capital, BigDecimal::from(5000));
    assert_eq!(admin_stats.total_shares_held, 5);

    let Json(manager_stats) =
        handlers::reports::get_manager_stats(manager.clone(), State(state.clone()))
            .await
            .unwrap();
    assert_eq!(manager_stats.member_count, 1);
    assert_eq!(manager_stats.pending_loans, 1);

    let Json(auditor_stats) = handlers::reports::get_auditor_stats(auditor, State(state.clone()))
        .await
        .unwrap();
    assert_eq!(auditor_stats.total_transactions, 1);
    // register, deposit, apply
    assert_eq!(auditor_stats.total_audit_logs, 3);
    assert_eq!(auditor_stats.recent_activity, 3);

    let Json(report) = handlers::reports::get_admin_reports(admin, State(state.clone()))
        .await
        .unwrap();
    assert_eq!(report.stats.total_members, 1);

    let Json(manager_report) = handlers::reports::get_manager_reports(manager, State(state))
        .await
        .unwrap();
    assert_eq!(manager_report.reports.total_loans, 1);
}

#[tokio::test]
async fn test_audit_trail_names_the_actor() {
    let state = test_state();
    let registration = register(&state, "trail@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let auditor = seed_user(&state, Role::Auditor).await;
    deposit(&state, &cashier, registration.member.id, "25").await.unwrap();

    let Json(body) = handlers::audit::get_audit_logs(auditor, State(state))
        .await
        .unwrap();

    assert_eq!(body.logs.len(), 2);
    assert_eq!(body.logs[0].action, "deposit");
    assert_eq!(body.logs[0].table_name, "transactions");
    assert_eq!(body.logs[0].user_email, cashier.email);
    assert_eq!(body.logs[1].action, "register_member");
}

#[tokio::test]
async fn test_ledger_and_accounts_carry_member_numbers() {
    let state = test_state();
    let registration = register(&state, "ledger@sacco.test", Some(2)).await;
    let cashier = seed_user(&state, Role::Cashier).await;
    let admin = seed_user(&state, Role::Admin).await;
    let cso = seed_user(&state, Role::Cso).await;
    deposit(&state, &cashier, registration.member.id, "60").await.unwrap();

    let Json(ledger) = handlers::transactions::list_ledger(admin, State(state.clone()))
        .await
        .unwrap();
    assert_eq!(ledger.transactions.len(), 1);
    assert_eq!(
        ledger.transactions[0].member_number,
        registration.member.member_number
    );

    let Json(accounts) = handlers::transactions::list_savings_accounts(cso, State(state))
        .await
        .unwrap();
    assert_eq!(accounts.accounts.len(), 1);
    assert_eq!(accounts.accounts[0].account.balance, BigDecimal::from(60));
}
