use crate::{Principal, Role};

/// Top-level surfaces the shell can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Login / landing, for anyone without a live session.
    Entry,
    DonorDashboard,
    NgoDashboard,
    AdminDashboard,
    /// Dead-end holding page for authenticated accounts whose role this
    /// build does not recognize.
    UnknownRole,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Entry => "entry",
            Surface::DonorDashboard => "donor-dashboard",
            Surface::NgoDashboard => "ngo-dashboard",
            Surface::AdminDashboard => "admin-dashboard",
            Surface::UnknownRole => "unknown-role",
        }
    }
}

impl core::fmt::Display for Surface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route an authenticated principal to its home surface.
///
/// - No IO
/// - No panics
/// - Total over [`Role`]: adding a role without extending this match is a
///   compile error, and an unrecognized role lands on the dead-end surface,
///   never on a privileged default.
pub fn resolve_surface(principal: &Principal) -> Surface {
    match &principal.role {
        Role::Donor => Surface::DonorDashboard,
        Role::Ngo => Surface::NgoDashboard,
        Role::Admin => Surface::AdminDashboard,
        Role::Unknown(_) => Surface::UnknownRole,
    }
}
