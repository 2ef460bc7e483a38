use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::models::{
    AccountType, AccountWithMember, AuditLog, AuditLogEntry, CashMovement, LedgerEntry, Loan,
    LoanApproval, LoanRepayment, LoanStatus, LoanWithMember, Member, MemberRegistration,
    MemberSummary, MembershipStatus, NewAuditLog, NewLoan, NewMember, NewUser, PortfolioTotals,
    RepaymentStatus, Role, SavingsAccount, Transaction, TransactionType, UpdateProfileRequest,
    User, money_limit,
};
use crate::numbering::NumberKind;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    members: Vec<Member>,
    accounts: Vec<SavingsAccount>,
    loans: Vec<Loan>,
    repayments: Vec<LoanRepayment>,
    transactions: Vec<Transaction>,
    audit_logs: Vec<AuditLog>,
    sequences: HashMap<&'static str, i64>,
}

impl Tables {
    fn next_number(&mut self, kind: NumberKind) -> String {
        let value = self.sequences.entry(kind.sequence()).or_insert(0);
        *value += 1;
        kind.format(*value)
    }

    fn member_number(&self, member_id: Uuid) -> String {
        self.members
            .iter()
            .find(|m| m.id == member_id)
            .map(|m| m.member_number.clone())
            .unwrap_or_default()
    }

    fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn loan_mut(&mut self, id: Uuid) -> Option<&mut Loan> {
        self.loans.iter_mut().find(|l| l.id == id)
    }

    fn insert_user(&mut self, user: NewUser) -> RepoResult<User> {
        if self.users.iter().any(|u| u.id == user.id || u.email == user.email) {
            return Err(RepoError::Constraint(format!(
                "duplicate key value violates unique constraint: user {} already exists",
                user.email
            )));
        }

        let now = Utc::now();
        let user = User {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    fn loan_with_member(&self, loan: &Loan) -> LoanWithMember {
        LoanWithMember {
            loan: loan.clone(),
            member_number: self.member_number(loan.member_id),
        }
    }
}

/// MemoryRepository
///
/// A `Repository` held entirely in process memory. Every operation runs under one mutex, which
/// gives it the same all-or-nothing behavior the Postgres transactions provide. Used by the
/// test suites and for running the API without a database.
#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.tables.lock().insert_user(user)
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.tables.lock().users.iter().rev().cloned().collect())
    }

    async fn toggle_user_active(&self, id: Uuid) -> RepoResult<Option<User>> {
        let mut tables = self.tables.lock();
        Ok(tables.user_mut(id).map(|user| {
            user.is_active = !user.is_active;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> RepoResult<Option<User>> {
        let mut tables = self.tables.lock();
        Ok(tables.user_mut(id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn create_member(
        &self,
        user: Option<NewUser>,
        member: NewMember,
    ) -> RepoResult<MemberRegistration> {
        let mut tables = self.tables.lock();

        let user = match user {
            Some(new_user) => Some(tables.insert_user(new_user)?),
            None => None,
        };

        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            user_id: user.as_ref().map(|u| u.id),
            member_number: tables.next_number(NumberKind::Member),
            full_name: member.full_name,
            phone: member.phone,
            national_id: member.national_id,
            date_of_birth: member.date_of_birth,
            address: member.address,
            next_of_kin: member.next_of_kin,
            next_of_kin_phone: member.next_of_kin_phone,
            employment_status: member.employment_status,
            membership_status: member.membership_status,
            share_capital: member.share_capital,
            shares_held: member.shares_held,
            created_at: now,
            updated_at: now,
        };

        let account = SavingsAccount {
            id: Uuid::new_v4(),
            member_id: member.id,
            account_number: tables.next_number(NumberKind::Account),
            account_type: AccountType::Mandatory,
            balance: BigDecimal::zero(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        tables.members.push(member.clone());
        tables.accounts.push(account.clone());

        Ok(MemberRegistration {
            user,
            member,
            account,
        })
    }

    async fn get_member(&self, id: Uuid) -> RepoResult<Option<Member>> {
        Ok(self.tables.lock().members.iter().find(|m| m.id == id).cloned())
    }

    async fn get_member_by_user(&self, user_id: Uuid) -> RepoResult<Option<Member>> {
        Ok(self
            .tables
            .lock()
            .members
            .iter()
            .find(|m| m.user_id == Some(user_id))
            .cloned())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfileRequest,
    ) -> RepoResult<Option<(User, Option<Member>)>> {
        let mut tables = self.tables.lock();
        let now = Utc::now();

        let Some(user) = tables.user_mut(user_id) else {
            return Ok(None);
        };
        if let Some(full_name) = &changes.full_name {
            user.full_name = full_name.clone();
        }
        if changes.phone.is_some() {
            user.phone = changes.phone.clone();
        }
        user.updated_at = now;
        let user = user.clone();

        let member = tables
            .members
            .iter_mut()
            .find(|m| m.user_id == Some(user_id))
            .map(|member| {
                if changes.full_name.is_some() {
                    member.full_name = changes.full_name.clone();
                }
                if changes.phone.is_some() {
                    member.phone = changes.phone.clone();
                }
                if changes.address.is_some() {
                    member.address = changes.address.clone();
                }
                member.updated_at = now;
                member.clone()
            });

        Ok(Some((user, member)))
    }

    async fn set_membership_status(
        &self,
        member_id: Uuid,
        status: MembershipStatus,
    ) -> RepoResult<Option<Member>> {
        let mut tables = self.tables.lock();
        Ok(tables
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .map(|member| {
                member.membership_status = status;
                member.updated_at = Utc::now();
                member.clone()
            }))
    }

    async fn list_members(&self) -> RepoResult<Vec<MemberSummary>> {
        let tables = self.tables.lock();
        Ok(tables
            .members
            .iter()
            .rev()
            .map(|m| {
                let user = m
                    .user_id
                    .and_then(|id| tables.users.iter().find(|u| u.id == id));
                MemberSummary {
                    member_id: m.id,
                    user_id: m.user_id,
                    member_number: m.member_number.clone(),
                    full_name: m
                        .full_name
                        .clone()
                        .or_else(|| user.map(|u| u.full_name.clone())),
                    email: user.map(|u| u.email.clone()),
                    phone: m.phone.clone().or_else(|| user.and_then(|u| u.phone.clone())),
                    membership_status: m.membership_status,
                    share_capital: m.share_capital.clone(),
                    shares_held: m.shares_held,
                    is_active: user.map(|u| u.is_active),
                    created_at: m.created_at,
                }
            })
            .collect())
    }

    async fn list_member_accounts(&self, member_id: Uuid) -> RepoResult<Vec<SavingsAccount>> {
        Ok(self
            .tables
            .lock()
            .accounts
            .iter()
            .filter(|a| a.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn list_accounts(&self) -> RepoResult<Vec<AccountWithMember>> {
        let tables = self.tables.lock();
        Ok(tables
            .accounts
            .iter()
            .rev()
            .map(|a| AccountWithMember {
                account: a.clone(),
                member_number: tables.member_number(a.member_id),
            })
            .collect())
    }

    async fn get_mandatory_account(&self, member_id: Uuid) -> RepoResult<Option<SavingsAccount>> {
        Ok(self
            .tables
            .lock()
            .accounts
            .iter()
            .find(|a| a.member_id == member_id && a.account_type == AccountType::Mandatory)
            .cloned())
    }

    async fn apply_cash_movement(
        &self,
        movement: CashMovement,
    ) -> RepoResult<(Transaction, SavingsAccount)> {
        let mut tables = self.tables.lock();
        let reference_number =
            tables.next_number(NumberKind::for_transaction(movement.transaction_type));

        let account = tables
            .accounts
            .iter_mut()
            .find(|a| {
                a.member_id == movement.member_id
                    && a.account_type == AccountType::Mandatory
                    && a.is_active
            })
            .ok_or(RepoError::NotFound("Savings account"))?;

        match movement.transaction_type {
            TransactionType::Deposit => {
                let balance = &account.balance + &movement.amount;
                if balance >= money_limit() {
                    return Err(RepoError::Constraint("numeric field overflow".to_string()));
                }
                account.balance = balance;
            }
            TransactionType::Withdrawal => {
                if account.balance < movement.amount {
                    return Err(RepoError::InsufficientFunds);
                }
                account.balance -= &movement.amount;
            }
        }
        account.updated_at = Utc::now();
        let account = account.clone();

        let transaction = Transaction {
            id: Uuid::new_v4(),
            member_id: movement.member_id,
            account_id: account.id,
            transaction_type: movement.transaction_type,
            amount: movement.amount,
            balance_after: account.balance.clone(),
            reference_number,
            description: movement.description,
            processed_by: movement.processed_by,
            created_at: Utc::now(),
        };
        tables.transactions.push(transaction.clone());

        Ok((transaction, account))
    }

    async fn list_member_transactions(
        &self,
        member_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Transaction>> {
        Ok(self
            .tables
            .lock()
            .transactions
            .iter()
            .rev()
            .filter(|t| t.member_id == member_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_transactions(&self, limit: i64) -> RepoResult<Vec<LedgerEntry>> {
        let tables = self.tables.lock();
        Ok(tables
            .transactions
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|t| LedgerEntry {
                transaction: t.clone(),
                member_number: tables.member_number(t.member_id),
            })
            .collect())
    }

    async fn create_loan(&self, loan: NewLoan) -> RepoResult<Loan> {
        let mut tables = self.tables.lock();
        if !tables.members.iter().any(|m| m.id == loan.member_id) {
            return Err(RepoError::Constraint(
                "insert on table \"loans\" violates foreign key constraint \"loans_member_id_fkey\""
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let loan = Loan {
            id: Uuid::new_v4(),
            member_id: loan.member_id,
            loan_number: tables.next_number(NumberKind::Loan),
            loan_amount: loan.loan_amount,
            interest_rate: loan.interest_rate,
            loan_period: loan.loan_period,
            purpose: loan.purpose,
            collateral_description: loan.collateral_description,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        tables.loans.push(loan.clone());
        Ok(loan)
    }

    async fn get_loan(&self, id: Uuid) -> RepoResult<Option<Loan>> {
        Ok(self.tables.lock().loans.iter().find(|l| l.id == id).cloned())
    }

    async fn list_member_loans(&self, member_id: Uuid) -> RepoResult<Vec<Loan>> {
        Ok(self
            .tables
            .lock()
            .loans
            .iter()
            .rev()
            .filter(|l| l.member_id == member_id)
            .cloned()
            .collect())
    }

    async fn list_loans(&self, status: Option<LoanStatus>) -> RepoResult<Vec<LoanWithMember>> {
        let tables = self.tables.lock();
        Ok(tables
            .loans
            .iter()
            .rev()
            .filter(|l| status.is_none_or(|s| l.status == s))
            .map(|l| tables.loan_with_member(l))
            .collect())
    }

    async fn list_decided_loans(&self) -> RepoResult<Vec<LoanWithMember>> {
        let tables = self.tables.lock();
        let mut decided: Vec<_> = tables
            .loans
            .iter()
            .filter(|l| matches!(l.status, LoanStatus::Approved | LoanStatus::Rejected))
            .map(|l| tables.loan_with_member(l))
            .collect();
        decided.sort_by(|a, b| b.loan.approved_at.cmp(&a.loan.approved_at));
        Ok(decided)
    }

    async fn approve_loan(
        &self,
        approval: LoanApproval,
    ) -> RepoResult<Option<(Loan, Vec<LoanRepayment>)>> {
        let mut tables = self.tables.lock();

        let Some(loan) = tables
            .loan_mut(approval.loan_id)
            .filter(|l| l.status == LoanStatus::Pending)
        else {
            return Ok(None);
        };
        loan.status = LoanStatus::Approved;
        loan.approved_by = Some(approval.approved_by);
        loan.approved_at = Some(approval.approved_at);
        loan.loan_amount = approval.loan_amount;
        loan.updated_at = Utc::now();
        let loan = loan.clone();

        let repayments: Vec<LoanRepayment> = approval
            .schedule
            .into_iter()
            .map(|installment| LoanRepayment {
                id: Uuid::new_v4(),
                loan_id: loan.id,
                installment_number: installment.installment_number,
                due_date: installment.due_date,
                amount_due: installment.amount_due,
                status: RepaymentStatus::Pending,
                paid_at: None,
                paid_by: None,
                created_at: Utc::now(),
            })
            .collect();
        tables.repayments.extend(repayments.iter().cloned());

        Ok(Some((loan, repayments)))
    }

    async fn reject_loan(
        &self,
        loan_id: Uuid,
        decided_by: Uuid,
        reason: Option<String>,
    ) -> RepoResult<Option<Loan>> {
        let mut tables = self.tables.lock();
        Ok(tables
            .loan_mut(loan_id)
            .filter(|l| l.status == LoanStatus::Pending)
            .map(|loan| {
                let now = Utc::now();
                loan.status = LoanStatus::Rejected;
                loan.approved_by = Some(decided_by);
                loan.approved_at = Some(now);
                loan.rejection_reason = reason;
                loan.updated_at = now;
                loan.clone()
            }))
    }

    async fn disburse_loan(
        &self,
        loan_id: Uuid,
        disbursed_by: Uuid,
        disbursed_at: DateTime<Utc>,
    ) -> RepoResult<Option<Loan>> {
        let mut tables = self.tables.lock();
        Ok(tables
            .loan_mut(loan_id)
            .filter(|l| l.status == LoanStatus::Approved)
            .map(|loan| {
                loan.status = LoanStatus::Active;
                loan.disbursed_by = Some(disbursed_by);
                loan.disbursed_at = Some(disbursed_at);
                loan.updated_at = Utc::now();
                loan.clone()
            }))
    }

    async fn list_repayments(&self, loan_id: Uuid) -> RepoResult<Vec<LoanRepayment>> {
        let mut repayments: Vec<_> = self
            .tables
            .lock()
            .repayments
            .iter()
            .filter(|r| r.loan_id == loan_id)
            .cloned()
            .collect();
        repayments.sort_by_key(|r| r.installment_number);
        Ok(repayments)
    }

    async fn get_repayment(&self, id: Uuid) -> RepoResult<Option<LoanRepayment>> {
        Ok(self
            .tables
            .lock()
            .repayments
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn pay_repayment(
        &self,
        repayment_id: Uuid,
        paid_by: Uuid,
    ) -> RepoResult<Option<(LoanRepayment, Loan)>> {
        let mut tables = self.tables.lock();

        let Some(loan_id) = tables
            .repayments
            .iter()
            .find(|r| r.id == repayment_id && r.status == RepaymentStatus::Pending)
            .map(|r| r.loan_id)
        else {
            return Ok(None);
        };
        if !tables
            .loans
            .iter()
            .any(|l| l.id == loan_id && l.status == LoanStatus::Active)
        {
            return Ok(None);
        }

        let now = Utc::now();
        let mut paid = None;
        for repayment in tables.repayments.iter_mut() {
            if repayment.id == repayment_id {
                repayment.status = RepaymentStatus::Paid;
                repayment.paid_at = Some(now);
                repayment.paid_by = Some(paid_by);
                paid = Some(repayment.clone());
            }
        }
        let Some(repayment) = paid else {
            return Ok(None);
        };

        let settled = !tables
            .repayments
            .iter()
            .any(|r| r.loan_id == loan_id && r.status == RepaymentStatus::Pending);

        let Some(loan) = tables.loan_mut(loan_id) else {
            return Ok(None);
        };
        if settled {
            loan.status = LoanStatus::Repaid;
            loan.updated_at = now;
        }

        Ok(Some((repayment, loan.clone())))
    }

    async fn get_totals(&self, since: DateTime<Utc>) -> RepoResult<PortfolioTotals> {
        let tables = self.tables.lock();
        let count_loans =
            |status: LoanStatus| tables.loans.iter().filter(|l| l.status == status).count() as i64;

        Ok(PortfolioTotals {
            total_members: tables.members.len() as i64,
            total_loans: tables.loans.len() as i64,
            pending_loans: count_loans(LoanStatus::Pending),
            active_loans: count_loans(LoanStatus::Active),
            total_savings: tables
                .accounts
                .iter()
                .fold(BigDecimal::zero(), |acc, a| acc + &a.balance),
            total_share_capital: tables
                .members
                .iter()
                .fold(BigDecimal::zero(), |acc, m| acc + &m.share_capital),
            total_shares_held: tables.members.iter().map(|m| m.shares_held as i64).sum(),
            total_transactions: tables.transactions.len() as i64,
            total_audit_logs: tables.audit_logs.len() as i64,
            recent_audit_logs: tables
                .audit_logs
                .iter()
                .filter(|a| a.created_at >= since)
                .count() as i64,
        })
    }

    async fn record_audit(&self, entry: NewAuditLog) -> RepoResult<()> {
        self.tables.lock().audit_logs.push(AuditLog {
            id: Uuid::new_v4(),
            action: entry.action,
            table_name: entry.table_name,
            record_id: entry.record_id,
            ip_address: entry.ip_address,
            user_id: entry.user_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_audit_logs(&self, limit: i64) -> RepoResult<Vec<AuditLogEntry>> {
        let tables = self.tables.lock();
        Ok(tables
            .audit_logs
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|a| AuditLogEntry {
                id: a.id,
                action: a.action.clone(),
                table_name: a.table_name.clone(),
                record_id: a.record_id,
                ip_address: a.ip_address.clone(),
                created_at: a.created_at,
                user_email: a
                    .user_id
                    .and_then(|id| tables.users.iter().find(|u| u.id == id))
                    .map(|u| u.email.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }
}
