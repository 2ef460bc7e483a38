use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    AccountType, AccountWithMember, AuditLogEntry, CashMovement, LedgerEntry, Loan,
    LoanApproval, LoanRepayment, LoanStatus, LoanWithMember, Member, MemberRegistration,
    MemberSummary, MembershipStatus, NewAuditLog, NewLoan, NewMember, NewUser, PortfolioTotals,
    RepaymentStatus, Role, SavingsAccount, Transaction, TransactionType, UpdateProfileRequest,
    User,
};
use crate::numbering::NumberKind;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by a PostgreSQL pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// next_number
///
/// Draws the next value of the sequence backing `kind` and renders it.
async fn next_number(conn: &mut PgConnection, kind: NumberKind) -> RepoResult<String> {
    let value: i64 = sqlx::query_scalar("SELECT nextval($1::regclass)")
        .bind(kind.sequence())
        .fetch_one(conn)
        .await?;
    Ok(kind.format(value))
}

async fn insert_user(conn: &mut PgConnection, user: NewUser) -> RepoResult<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, full_name, phone, role, is_active)
        VALUES ($1, $2, $3, $4, $5, true)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.full_name)
    .bind(user.phone)
    .bind(user.role)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

const LOAN_WITH_MEMBER: &str = r#"
    SELECT l.*, m.member_number
    FROM loans l
    JOIN members m ON m.id = l.member_id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, user).await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// toggle_user_active
    ///
    /// `NOT is_active` is evaluated by the database, so two concurrent toggles never read
    /// the same stale value.
    async fn toggle_user_active(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// create_member
    ///
    /// One transaction: optional `users` row, the `members` row and the mandatory account.
    async fn create_member(
        &self,
        user: Option<NewUser>,
        member: NewMember,
    ) -> RepoResult<MemberRegistration> {
        let mut tx = self.pool.begin().await?;

        let user = match user {
            Some(new_user) => Some(insert_user(&mut tx, new_user).await?),
            None => None,
        };

        let member_number = next_number(&mut tx, NumberKind::Member).await?;
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (
                id, user_id, member_number, full_name, phone, national_id, date_of_birth,
                address, next_of_kin, next_of_kin_phone, employment_status,
                membership_status, share_capital, shares_held
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.as_ref().map(|u| u.id))
        .bind(member_number)
        .bind(member.full_name)
        .bind(member.phone)
        .bind(member.national_id)
        .bind(member.date_of_birth)
        .bind(member.address)
        .bind(member.next_of_kin)
        .bind(member.next_of_kin_phone)
        .bind(member.employment_status)
        .bind(member.membership_status)
        .bind(member.share_capital)
        .bind(member.shares_held)
        .fetch_one(&mut *tx)
        .await?;

        let account_number = next_number(&mut tx, NumberKind::Account).await?;
        let account = sqlx::query_as::<_, SavingsAccount>(
            r#"
            INSERT INTO savings_accounts (id, member_id, account_number, account_type, balance)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(member.id)
        .bind(account_number)
        .bind(AccountType::Mandatory)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MemberRegistration {
            user,
            member,
            account,
        })
    }

    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn get_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// update_profile
    ///
    /// Uses `COALESCE` so only the supplied fields change. Name and phone are kept in step
    /// on both the login and the membership row.
    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<(User, Option<Member>)>> {
        let mut tx = self.pool.begin().await?;

        let Some(user) = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&changes.full_name)
        .bind(&changes.phone)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.full_name)
        .bind(changes.phone)
        .bind(changes.address)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((user, member)))
    }

    async fn set_membership_status(
        &self,
        member_id: Uuid,
        status: MembershipStatus,
    ) -> RepoResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members SET membership_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn list_members(&self) -> RepoResult<Vec<MemberSummary>> {
        let members = sqlx::query_as::<_, MemberSummary>(
            r#"
            SELECT
                m.id AS member_id, m.user_id, m.member_number,
                COALESCE(m.full_name, u.full_name) AS full_name,
                u.email,
                COALESCE(m.phone, u.phone) AS phone,
                m.membership_status, m.share_capital, m.shares_held,
                u.is_active, m.created_at
            FROM members m
            LEFT JOIN users u ON u.id = m.user_id
            ORDER BY m.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn list_member_accounts(&self, member_id: Uuid) -> RepoResult<Vec<SavingsAccount>> {
        let accounts = sqlx::query_as::<_, SavingsAccount>(
            "SELECT * FROM savings_accounts WHERE member_id = $1 ORDER BY created_at",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn list_accounts(&self) -> RepoResult<Vec<AccountWithMember>> {
        let accounts = sqlx::query_as::<_, AccountWithMember>(
            r#"
            SELECT a.*, m.member_number
            FROM savings_accounts a
            JOIN members m ON m.id = a.member_id
            ORDER BY a.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    async fn get_mandatory_account(&self, member_id: Uuid) -> RepoResult<Option<SavingsAccount>> {
        let account = sqlx::query_as::<_, SavingsAccount>(
            "SELECT * FROM savings_accounts WHERE member_id = $1 AND account_type = 'mandatory'",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// apply_cash_movement
    ///
    /// Locks the account row, applies the increment or guarded decrement in SQL and appends
    /// the ledger row inside the same transaction. Concurrent movements on one account are
    /// serialized by the row lock, so no update is ever lost.
    async fn apply_cash_movement(
        &self,
        movement: CashMovement,
    ) -> RepoResult<(Transaction, SavingsAccount)> {
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, SavingsAccount>(
            r#"
            SELECT * FROM savings_accounts
            WHERE member_id = $1 AND account_type = 'mandatory' AND is_active
            FOR UPDATE
            "#,
        )
        .bind(movement.member_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepoError::NotFound("Savings account"))?;

        let delta: BigDecimal = match movement.transaction_type {
            TransactionType::Deposit => movement.amount.clone(),
            TransactionType::Withdrawal => {
                if account.balance < movement.amount {
                    return Err(RepoError::InsufficientFunds);
                }
                -movement.amount.clone()
            }
        };

        let account = sqlx::query_as::<_, SavingsAccount>(
            r#"
            UPDATE savings_accounts SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(delta)
        .fetch_one(&mut *tx)
        .await?;

        let reference_number =
            next_number(&mut tx, NumberKind::for_transaction(movement.transaction_type)).await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                id, member_id, account_id, transaction_type, amount, balance_after,
                reference_number, description, processed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(movement.member_id)
        .bind(account.id)
        .bind(movement.transaction_type)
        .bind(movement.amount)
        .bind(&account.balance)
        .bind(reference_number)
        .bind(movement.description)
        .bind(movement.processed_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((transaction, account))
    }

    async fn list_member_transactions(
        &self,
        member_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE member_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(member_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    async fn list_transactions(&self, limit: i64) -> RepoResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT t.*, m.member_number
            FROM transactions t
            JOIN members m ON m.id = t.member_id
            ORDER BY t.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn create_loan(&self, loan: NewLoan) -> RepoResult<Loan> {
        let mut tx = self.pool.begin().await?;
        let loan_number = next_number(&mut tx, NumberKind::Loan).await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                id, member_id, loan_number, loan_amount, interest_rate, loan_period,
                purpose, collateral_description, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(loan.member_id)
        .bind(loan_number)
        .bind(loan.loan_amount)
        .bind(loan.interest_rate)
        .bind(loan.loan_period)
        .bind(loan.purpose)
        .bind(loan.collateral_description)
        .bind(LoanStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    async fn get_loan(&self, id: Uuid) -> RepoResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    async fn list_member_loans(&self, member_id: Uuid) -> RepoResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE member_id = $1 ORDER BY created_at DESC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    async fn list_loans(&self, status: Option<LoanStatus>) -> RepoResult<Vec<LoanWithMember>> {
        let sql = format!(
            "{LOAN_WITH_MEMBER} WHERE ($1::loan_status IS NULL OR l.status = $1) ORDER BY l.created_at DESC"
        );
        let loans = sqlx::query_as::<_, LoanWithMember>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    async fn list_decided_loans(&self) -> RepoResult<Vec<LoanWithMember>> {
        let sql = format!(
            "{LOAN_WITH_MEMBER} WHERE l.status IN ('approved', 'rejected') ORDER BY l.approved_at DESC NULLS LAST"
        );
        let loans = sqlx::query_as::<_, LoanWithMember>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// approve_loan
    ///
    /// The status guard (`status = 'pending'`) and the schedule inserts share one transaction;
    /// a loan that was decided concurrently yields `None` and nothing is written.
    async fn approve_loan(
        &self,
        approval: LoanApproval,
    ) -> RepoResult<Option<(Loan, Vec<LoanRepayment>)>> {
        let mut tx = self.pool.begin().await?;

        let Some(loan) = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'approved', approved_by = $2, approved_at = $3,
                loan_amount = $4, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(approval.loan_id)
        .bind(approval.approved_by)
        .bind(approval.approved_at)
        .bind(&approval.loan_amount)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let mut repayments = Vec::with_capacity(approval.schedule.len());
        for installment in approval.schedule {
            let repayment = sqlx::query_as::<_, LoanRepayment>(
                r#"
                INSERT INTO loan_repayments (id, loan_id, installment_number, due_date, amount_due, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(loan.id)
            .bind(installment.installment_number)
            .bind(installment.due_date)
            .bind(installment.amount_due)
            .bind(RepaymentStatus::Pending)
            .fetch_one(&mut *tx)
            .await?;
            repayments.push(repayment);
        }

        tx.commit().await?;
        Ok(Some((loan, repayments)))
    }

    async fn reject_loan(
        &self,
        loan_id: Uuid,
        decided_by: Uuid,
        reason: Option<String>,
    ) -> RepoResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'rejected', approved_by = $2, approved_at = NOW(),
                rejection_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(decided_by)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    async fn disburse_loan(
        &self,
        loan_id: Uuid,
        disbursed_by: Uuid,
        disbursed_at: DateTime<Utc>,
    ) -> RepoResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'active', disbursed_by = $2, disbursed_at = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(disbursed_by)
        .bind(disbursed_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    async fn list_repayments(&self, loan_id: Uuid) -> RepoResult<Vec<LoanRepayment>> {
        let repayments = sqlx::query_as::<_, LoanRepayment>(
            "SELECT * FROM loan_repayments WHERE loan_id = $1 ORDER BY installment_number",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(repayments)
    }

    async fn get_repayment(&self, id: Uuid) -> RepoResult<Option<LoanRepayment>> {
        let repayment =
            sqlx::query_as::<_, LoanRepayment>("SELECT * FROM loan_repayments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(repayment)
    }

    /// pay_repayment
    ///
    /// The parent loan row is locked first so that paying the last two installments
    /// concurrently still settles the loan exactly once.
    async fn pay_repayment(
        &self,
        repayment_id: Uuid,
        paid_by: Uuid,
    ) -> RepoResult<Option<(LoanRepayment, Loan)>> {
        let mut tx = self.pool.begin().await?;

        let Some(loan) = sqlx::query_as::<_, Loan>(
            r#"
            SELECT l.* FROM loans l
            JOIN loan_repayments r ON r.loan_id = l.id
            WHERE r.id = $1 AND l.status = 'active'
            FOR UPDATE OF l
            "#,
        )
        .bind(repayment_id)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let Some(repayment) = sqlx::query_as::<_, LoanRepayment>(
            r#"
            UPDATE loan_repayments SET status = 'paid', paid_at = NOW(), paid_by = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(repayment_id)
        .bind(paid_by)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loan_repayments WHERE loan_id = $1 AND status = 'pending'",
        )
        .bind(loan.id)
        .fetch_one(&mut *tx)
        .await?;

        let loan = if outstanding == 0 {
            sqlx::query_as::<_, Loan>(
                "UPDATE loans SET status = 'repaid', updated_at = NOW() WHERE id = $1 RETURNING *",
            )
            .bind(loan.id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            loan
        };

        tx.commit().await?;
        Ok(Some((repayment, loan)))
    }

    /// get_totals
    ///
    /// Compiles every dashboard counter in a single round trip.
    async fn get_totals(&self, since: DateTime<Utc>) -> RepoResult<PortfolioTotals> {
        let totals = sqlx::query_as::<_, PortfolioTotals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM members) AS total_members,
                (SELECT COUNT(*) FROM loans) AS total_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'pending') AS pending_loans,
                (SELECT COUNT(*) FROM loans WHERE status = 'active') AS active_loans,
                (SELECT COALESCE(SUM(balance), 0) FROM savings_accounts) AS total_savings,
                (SELECT COALESCE(SUM(share_capital), 0) FROM members) AS total_share_capital,
                (SELECT COALESCE(SUM(shares_held), 0)::BIGINT FROM members) AS total_shares_held,
                (SELECT COUNT(*) FROM transactions) AS total_transactions,
                (SELECT COUNT(*) FROM audit_logs) AS total_audit_logs,
                (SELECT COUNT(*) FROM audit_logs WHERE created_at >= $1) AS recent_audit_logs
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }

    async fn record_audit(&self, entry: NewAuditLog) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, action, table_name, record_id, ip_address, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.action)
        .bind(entry.table_name)
        .bind(entry.record_id)
        .bind(entry.ip_address)
        .bind(entry.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let logs = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT
                a.id, a.action, a.table_name, a.record_id, a.ip_address, a.created_at,
                COALESCE(u.email, 'Unknown') AS user_email
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
