use certify_core::forms::{Field, FormErrors};
use services::AuthError;
use storage::repository::StorageError;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const LOGIN_FAILED: &str = "Login failed";

/// Messages shown on the login page after a failed submit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginErrorsVm {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub banner: Option<&'static str>,
}

impl LoginErrorsVm {
    #[must_use]
    pub fn from_form(errors: &FormErrors) -> Self {
        Self {
            email: errors.get(Field::Email),
            password: errors.get(Field::Password),
            banner: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.banner.is_none()
    }
}

impl From<&AuthError> for LoginErrorsVm {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::InvalidForm(errors) => Self::from_form(errors),
            AuthError::Storage(StorageError::Unauthorized | StorageError::NotFound) => Self {
                banner: Some(INVALID_CREDENTIALS),
                ..Self::default()
            },
            _ => Self {
                banner: Some(LOGIN_FAILED),
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::forms::LoginForm;

    #[test]
    fn field_messages_from_validation() {
        let errors = LoginForm {
            email: "bad".into(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        let vm = LoginErrorsVm::from(&AuthError::InvalidForm(errors));
        assert!(vm.email.is_some());
        assert_eq!(vm.password, Some("Password is required"));
        assert!(vm.banner.is_none());
    }

    #[test]
    fn server_rejections_map_to_banners() {
        let rejected = LoginErrorsVm::from(&AuthError::Storage(StorageError::Unauthorized));
        assert_eq!(rejected.banner, Some(INVALID_CREDENTIALS));

        let offline =
            LoginErrorsVm::from(&AuthError::Storage(StorageError::Connection("down".into())));
        assert_eq!(offline.banner, Some(LOGIN_FAILED));
        assert!(LoginErrorsVm::default().is_empty());
    }
}
