use std::sync::Arc;

use certify_core::forms::{RegistrationForm, UserForm};
use certify_core::model::{Role, User, UserId};
use storage::repository::{NewUser, UserRepository};
use tracing::info;

use crate::cache::{CacheTag, QueryCache};
use crate::error::UserServiceError;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    cache: QueryCache,
}

impl UserService {
    #[must_use]
    pub fn new(repo: Arc<dyn UserRepository>, cache: QueryCache) -> Self {
        Self { repo, cache }
    }

    /// # Errors
    ///
    /// Returns `UserServiceError` if the listing cannot be fetched.
    pub async fn list(&self, force: bool) -> Result<Arc<Vec<User>>, UserServiceError> {
        self.cache
            .get_or_fetch(CacheTag::User, "all", force, || async {
                self.repo.list_users().await.map_err(UserServiceError::from)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidForm` before any request when the
    /// form is invalid, or a storage error (`Conflict` for a taken email).
    pub async fn create(&self, form: &UserForm) -> Result<User, UserServiceError> {
        form.validate().map_err(UserServiceError::InvalidForm)?;
        let user = self
            .repo
            .create_user(&NewUser {
                name: form.name.trim().to_string(),
                email: form.email.trim().to_string(),
                password: form.password.clone(),
                role: form.role.clone(),
            })
            .await?;
        info!(user = %user.id, role = %user.role, "user created");
        self.cache.invalidate(CacheTag::User);
        Ok(user)
    }

    /// Self-service sign-up; the account always gets the `user` role.
    ///
    /// # Errors
    ///
    /// Returns `UserServiceError::InvalidForm` with the first failing
    /// page's messages, or a storage error (`Conflict` for a taken email).
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, UserServiceError> {
        form.validate_identity()
            .and_then(|()| form.validate_security())
            .map_err(UserServiceError::InvalidForm)?;
        let user = self
            .repo
            .create_user(&NewUser {
                name: form.display_name(),
                email: form.email.trim().to_string(),
                password: form.password.clone(),
                role: Role::User,
            })
            .await?;
        info!(user = %user.id, "account registered");
        self.cache.invalidate(CacheTag::User);
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `UserServiceError` if the delete fails.
    pub async fn delete(&self, id: &UserId) -> Result<(), UserServiceError> {
        self.repo.delete_user(id).await?;
        info!(user = %id, "user deleted");
        self.cache.invalidate(CacheTag::User);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::forms::Field;
    use storage::memory::InMemoryRepository;
    use storage::repository::{AuthGateway, StorageError};

    fn form(email: &str) -> UserForm {
        UserForm {
            name: "Grace".into(),
            email: email.into(),
            password: "secret1".into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_list_delete() {
        let service = UserService::new(Arc::new(InMemoryRepository::new()), QueryCache::new());
        assert!(service.list(false).await.unwrap().is_empty());

        let user = service.create(&form("grace@example.com")).await.unwrap();
        let listed = service.list(false).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "grace@example.com");

        service.delete(&user.id).await.unwrap();
        assert!(service.list(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_and_duplicate_accounts_are_rejected() {
        let service = UserService::new(Arc::new(InMemoryRepository::new()), QueryCache::new());
        match service.create(&form("nope")).await {
            Err(UserServiceError::InvalidForm(errors)) => {
                assert!(errors.get(Field::Email).is_some());
            }
            other => panic!("expected invalid form, got {other:?}"),
        }

        service.create(&form("grace@example.com")).await.unwrap();
        assert!(matches!(
            service.create(&form("GRACE@example.com")).await,
            Err(UserServiceError::Storage(StorageError::Conflict))
        ));
    }

    fn registration() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "Analytical1!".into(),
            confirm_password: "Analytical1!".into(),
            agree_to_terms: true,
        }
    }

    #[tokio::test]
    async fn registered_account_is_a_regular_user_that_can_sign_in() {
        let repo = InMemoryRepository::new();
        let service = UserService::new(Arc::new(repo.clone()), QueryCache::new());

        let user = service.register(&registration()).await.unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.role, Role::User);

        let grant = repo.login("ada@example.com", "Analytical1!").await.unwrap();
        assert_eq!(grant.user.id, user.id);
    }

    #[tokio::test]
    async fn registration_reports_the_first_failing_page() {
        let service = UserService::new(Arc::new(InMemoryRepository::new()), QueryCache::new());

        let mut form = registration();
        form.last_name = "L".into();
        form.agree_to_terms = false;
        match service.register(&form).await {
            Err(UserServiceError::InvalidForm(errors)) => {
                assert!(errors.get(Field::LastName).is_some());
                assert!(errors.get(Field::AgreeToTerms).is_none());
            }
            other => panic!("expected identity errors, got {other:?}"),
        }

        form.last_name = "Lovelace".into();
        match service.register(&form).await {
            Err(UserServiceError::InvalidForm(errors)) => {
                assert!(errors.get(Field::AgreeToTerms).is_some());
            }
            other => panic!("expected security errors, got {other:?}"),
        }
        assert!(service.list(false).await.unwrap().is_empty());
    }
}
