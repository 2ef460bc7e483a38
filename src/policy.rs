//! Role-based authorization.
//!
//! Every protected capability is a `Permission`; the allow-list of roles for each one lives
//! in `Permission::allowed_roles` and nowhere else. Handlers declare the permission they need
//! through `AuthUser::require`.

use crate::models::Role;
use Role::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    ApplyForLoan,
    ViewMemberDashboard,
    ApproveLoan,
    RejectLoan,
    DisburseLoan,
    RecordRepayment,
    ViewLoans,
    ViewLoanDecisions,
    ListMembers,
    EnrollMember,
    ActivateMember,
    RecordDeposit,
    RecordWithdrawal,
    ViewSavingsAccounts,
    ViewLedger,
    ManageUsers,
    ViewSettings,
    ViewAdminReports,
    ViewManagerReports,
    ViewAdminDashboard,
    ViewManagerDashboard,
    ViewAuditorDashboard,
    ViewAuditLogs,
}

impl Permission {
    pub const ALL: [Permission; 24] = [
        Permission::ViewOwnProfile,
        Permission::ApplyForLoan,
        Permission::ViewMemberDashboard,
        Permission::ApproveLoan,
        Permission::RejectLoan,
        Permission::DisburseLoan,
        Permission::RecordRepayment,
        Permission::ViewLoans,
        Permission::ViewLoanDecisions,
        Permission::ListMembers,
        Permission::EnrollMember,
        Permission::ActivateMember,
        Permission::RecordDeposit,
        Permission::RecordWithdrawal,
        Permission::ViewSavingsAccounts,
        Permission::ViewLedger,
        Permission::ManageUsers,
        Permission::ViewSettings,
        Permission::ViewAdminReports,
        Permission::ViewManagerReports,
        Permission::ViewAdminDashboard,
        Permission::ViewManagerDashboard,
        Permission::ViewAuditorDashboard,
        Permission::ViewAuditLogs,
    ];

    /// allowed_roles
    ///
    /// The single source of truth for role-based access.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Permission::ViewOwnProfile => &Role::ALL,
            Permission::ApplyForLoan | Permission::ViewMemberDashboard => &[Member],
            Permission::ApproveLoan | Permission::RejectLoan => &[Manager, CreditOfficer, Admin],
            Permission::DisburseLoan | Permission::RecordRepayment => &[Cashier, Manager, Admin],
            Permission::ViewLoans => &[Admin, Manager, CreditOfficer, Cashier, Auditor],
            Permission::ViewLoanDecisions => &[CreditOfficer, Admin],
            Permission::ListMembers => &[Admin, Manager, Cso, Cashier, CreditOfficer, Auditor],
            Permission::EnrollMember | Permission::ActivateMember => &[Cso, Manager, Admin],
            Permission::RecordDeposit => &[Cashier, Cso, Admin],
            Permission::RecordWithdrawal => &[Cashier, Admin],
            Permission::ViewSavingsAccounts => &[Cso, Admin],
            Permission::ViewLedger
            | Permission::ManageUsers
            | Permission::ViewSettings
            | Permission::ViewAdminReports
            | Permission::ViewAdminDashboard => &[Admin],
            Permission::ViewManagerReports => &[Manager, Admin],
            Permission::ViewManagerDashboard => &[Manager],
            Permission::ViewAuditorDashboard => &[Auditor],
            Permission::ViewAuditLogs => &[Auditor, Admin],
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}
