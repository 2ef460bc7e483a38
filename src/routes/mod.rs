/// Router Module Index
///
/// Splits the portal's endpoints by how they are protected. Authentication is applied as a
/// layer on the authenticated and admin routers; per-role authorization lives in each handler.

/// Routes reachable without a session: health check and self-registration.
pub mod public;

/// Routes that require a resolved `AuthUser`.
pub mod authenticated;

/// The `/api/admin` tree. Also authenticated; handlers require admin permissions.
pub mod admin;
