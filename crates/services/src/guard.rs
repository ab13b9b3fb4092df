use certify_core::model::Role;

use crate::auth::AuthSnapshot;

/// Roles allowed on management pages.
pub static STAFF_ROLES: [Role; 2] = [Role::Admin, Role::Supervisor];

/// Access requirement of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Needs a signed-in user.
    Private,
    /// Needs a signed-in user whose role is in the list.
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Saved credentials are still being checked.
    Loading,
    /// Send to the login page, remembering where the user was headed.
    RedirectToLogin { from: String },
    Unauthorized,
}

#[must_use]
pub fn check(snapshot: &AuthSnapshot, access: Access, path: &str) -> GuardDecision {
    if access == Access::Public {
        return GuardDecision::Allow;
    }
    if snapshot.is_loading() {
        return GuardDecision::Loading;
    }
    let Some(user) = snapshot.user.as_ref().filter(|_| snapshot.has_token) else {
        return GuardDecision::RedirectToLogin {
            from: path.to_string(),
        };
    };
    match access {
        Access::Roles(allowed) if !allowed.contains(&user.role) => GuardDecision::Unauthorized,
        _ => GuardDecision::Allow,
    }
}
