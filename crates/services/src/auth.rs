//! Signed-in user and token lifecycle.

use std::sync::{Arc, PoisonError, RwLock};

use certify_core::forms::LoginForm;
use certify_core::model::{Credentials, Role, User};
use storage::repository::{AuthGateway, CredentialStore, StorageError};
use tracing::{info, warn};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// Saved credentials are being checked.
    #[default]
    Hydrating,
    Anonymous,
    Authenticated,
}

/// Where a user lands after signing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    Assessment,
    Dashboard,
}

impl Landing {
    #[must_use]
    pub fn for_role(role: &Role) -> Self {
        if role.is_staff() {
            Landing::Dashboard
        } else {
            Landing::Assessment
        }
    }
}

/// Point-in-time view of the session for rendering and route guards.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub has_token: bool,
}

impl AuthSnapshot {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Hydrating
    }
}

#[derive(Default)]
struct AuthState {
    status: AuthStatus,
    user: Option<User>,
    credentials: Option<Credentials>,
}

/// Owns the current user and token pair.
///
/// Cloning shares the same underlying state.
#[derive(Clone)]
pub struct AuthSession {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn CredentialStore>,
    state: Arc<RwLock<AuthState>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            store,
            state: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        AuthSnapshot {
            status: state.status,
            user: state.user.clone(),
            has_token: state.credentials.is_some(),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user
    }

    fn set(&self, status: AuthStatus, user: Option<User>, credentials: Option<Credentials>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = status;
        state.user = user;
        state.credentials = credentials;
    }

    fn credentials(&self) -> Option<Credentials> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .credentials
            .clone()
    }

    async fn forget(&self) -> Result<(), AuthError> {
        self.set(AuthStatus::Anonymous, None, None);
        self.store.clear_credentials().await?;
        Ok(())
    }

    /// Restore a session from saved credentials.
    ///
    /// An expired access token is refreshed once; if that fails too the
    /// saved pair is discarded and the session becomes anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` for failures other than rejected tokens.
    pub async fn hydrate(&self) -> Result<Option<User>, AuthError> {
        let Some(saved) = self.store.load_credentials().await? else {
            self.set(AuthStatus::Anonymous, None, None);
            return Ok(None);
        };

        let (user, credentials) = match self.gateway.profile(&saved).await {
            Ok(user) => (user, saved),
            Err(StorageError::Unauthorized) => match self.gateway.refresh(&saved).await {
                Ok(fresh) => {
                    self.store.save_credentials(&fresh).await?;
                    match self.gateway.profile(&fresh).await {
                        Ok(user) => (user, fresh),
                        Err(StorageError::Unauthorized) => {
                            self.forget().await?;
                            return Ok(None);
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                Err(StorageError::Unauthorized) => {
                    info!("saved session expired");
                    self.forget().await?;
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            },
            Err(err) => {
                self.set(AuthStatus::Anonymous, None, None);
                return Err(err.into());
            }
        };

        info!(user = %user.id, role = %user.role, "session restored");
        self.set(AuthStatus::Authenticated, Some(user.clone()), Some(credentials));
        Ok(Some(user))
    }

    /// Validate the form, sign in and persist the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidForm` before any request when the form is
    /// invalid, or `AuthError::Storage` when the server rejects it.
    pub async fn login(&self, form: &LoginForm) -> Result<User, AuthError> {
        form.validate().map_err(AuthError::InvalidForm)?;

        let grant = self
            .gateway
            .login(form.email.trim(), &form.password)
            .await?;
        self.store.save_credentials(&grant.credentials).await?;

        // The profile endpoint is authoritative for role; fall back to the
        // login payload if it is unavailable.
        let user = match self.gateway.profile(&grant.credentials).await {
            Ok(user) => user,
            Err(err) => {
                warn!(%err, "profile fetch after login failed");
                grant.user
            }
        };

        info!(user = %user.id, role = %user.role, "signed in");
        self.set(
            AuthStatus::Authenticated,
            Some(user.clone()),
            Some(grant.credentials),
        );
        Ok(user)
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAuthenticated` without a session; a rejected
    /// refresh signs the user out and returns the storage error.
    pub async fn refresh(&self) -> Result<Credentials, AuthError> {
        let current = self.credentials().ok_or(AuthError::NotAuthenticated)?;
        match self.gateway.refresh(&current).await {
            Ok(fresh) => {
                self.store.save_credentials(&fresh).await?;
                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                state.credentials = Some(fresh.clone());
                Ok(fresh)
            }
            Err(StorageError::Unauthorized) => {
                self.forget().await?;
                Err(StorageError::Unauthorized.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Sign out locally; the server call is best effort.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the saved tokens cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Some(credentials) = self.credentials() {
            if let Err(err) = self.gateway.logout(&credentials).await {
                warn!(%err, "logout request failed");
            }
        }
        self.forget().await?;
        info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::memory::InMemoryRepository;
    use storage::repository::NewUser;

    fn session_with(repo: &InMemoryRepository) -> AuthSession {
        AuthSession::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    fn repo_with_accounts() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for (email, role) in [("ada@example.com", Role::User), ("boss@example.com", Role::Admin)] {
            repo.insert_account(&NewUser {
                name: email.into(),
                email: email.into(),
                password: "secret1".into(),
                role,
            })
            .unwrap();
        }
        repo
    }

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn invalid_form_never_hits_the_gateway() {
        let repo = repo_with_accounts();
        let auth = session_with(&repo);
        let err = auth.login(&form("nope", "123")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidForm(_)));
        assert!(repo.load_credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_persists_tokens_and_lands_by_role() {
        let repo = repo_with_accounts();
        let auth = session_with(&repo);

        let admin = auth
            .login(&form("boss@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(Landing::for_role(&admin.role), Landing::Dashboard);
        assert!(repo.load_credentials().await.unwrap().is_some());

        let snapshot = auth.snapshot();
        assert_eq!(snapshot.status, AuthStatus::Authenticated);
        assert!(snapshot.has_token);
        assert_eq!(Landing::for_role(&Role::User), Landing::Assessment);
    }

    #[tokio::test]
    async fn hydrate_refreshes_expired_access_token() {
        let repo = repo_with_accounts();
        session_with(&repo)
            .login(&form("ada@example.com", "secret1"))
            .await
            .unwrap();
        let saved = repo.load_credentials().await.unwrap().unwrap();
        repo.expire_access_tokens().unwrap();

        let restored = session_with(&repo);
        let user = restored.hydrate().await.unwrap().expect("restored");
        assert_eq!(user.email, "ada@example.com");
        let resaved = repo.load_credentials().await.unwrap().unwrap();
        assert_ne!(resaved, saved);
    }

    #[tokio::test]
    async fn hydrate_without_saved_tokens_is_anonymous() {
        let repo = repo_with_accounts();
        let auth = session_with(&repo);
        assert_eq!(auth.snapshot().status, AuthStatus::Hydrating);
        assert!(auth.hydrate().await.unwrap().is_none());
        assert_eq!(auth.snapshot().status, AuthStatus::Anonymous);
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let repo = repo_with_accounts();
        let auth = session_with(&repo);
        auth.login(&form("ada@example.com", "secret1"))
            .await
            .unwrap();
        auth.refresh().await.unwrap();

        // Rotate the pair behind the session's back so its refresh token is stale.
        let current = repo.load_credentials().await.unwrap().unwrap();
        repo.refresh(&current).await.unwrap();

        assert!(auth.refresh().await.is_err());
        assert_eq!(auth.snapshot().status, AuthStatus::Anonymous);
        assert!(repo.load_credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let repo = repo_with_accounts();
        let auth = session_with(&repo);
        auth.login(&form("ada@example.com", "secret1"))
            .await
            .unwrap();
        auth.logout().await.unwrap();
        assert!(auth.current_user().is_none());
        assert!(repo.load_credentials().await.unwrap().is_none());
        assert!(matches!(
            auth.refresh().await,
            Err(AuthError::NotAuthenticated)
        ));
    }
}
