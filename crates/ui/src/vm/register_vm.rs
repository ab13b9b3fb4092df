use certify_core::forms::{FormErrors, PasswordStrength};
use services::UserServiceError;
use storage::repository::StorageError;

pub const EMAIL_TAKEN: &str = "An account with this email already exists";
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// The two pages of the sign-up form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterPage {
    Identity,
    Security,
}

impl RegisterPage {
    #[must_use]
    pub fn subtitle(self) -> &'static str {
        match self {
            RegisterPage::Identity => "Step 1 of 2 - Personal Information",
            RegisterPage::Security => "Step 2 of 2 - Security & Terms",
        }
    }

    #[must_use]
    pub fn progress_pct(self) -> u8 {
        match self {
            RegisterPage::Identity => 50,
            RegisterPage::Security => 100,
        }
    }
}

/// Meter under the password field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrengthVm {
    pub label: &'static str,
    pub width_pct: u8,
    pub missing: Vec<&'static str>,
}

impl From<&PasswordStrength> for StrengthVm {
    fn from(strength: &PasswordStrength) -> Self {
        let label = match strength.score {
            0 | 1 => "Weak",
            2 | 3 => "Medium",
            _ => "Strong",
        };
        Self {
            label,
            width_pct: strength.score.min(5) * 20,
            missing: strength.feedback.clone(),
        }
    }
}

/// Field messages plus an optional banner for server failures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterErrorsVm {
    pub fields: FormErrors,
    pub banner: Option<&'static str>,
}

impl From<&UserServiceError> for RegisterErrorsVm {
    fn from(err: &UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidForm(fields) => Self {
                fields: fields.clone(),
                banner: None,
            },
            UserServiceError::Storage(StorageError::Conflict) => Self {
                banner: Some(EMAIL_TAKEN),
                ..Self::default()
            },
            _ => Self {
                banner: Some(REGISTRATION_FAILED),
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certify_core::forms::{Field, RegistrationForm, password_strength};

    #[test]
    fn meter_follows_rule_count() {
        let weak = StrengthVm::from(&password_strength("abc"));
        assert_eq!(weak.label, "Weak");
        assert_eq!(weak.width_pct, 20);
        assert_eq!(weak.missing.len(), 4);

        assert_eq!(StrengthVm::from(&password_strength("abcdefgh1")).label, "Medium");
        let strong = StrengthVm::from(&password_strength("Abcdefg1!"));
        assert_eq!(strong.label, "Strong");
        assert_eq!(strong.width_pct, 100);
        assert!(strong.missing.is_empty());
    }

    #[test]
    fn service_errors_map_to_fields_or_banner() {
        let invalid = RegistrationForm::default().validate_identity().unwrap_err();
        let vm = RegisterErrorsVm::from(&UserServiceError::InvalidForm(invalid));
        assert_eq!(vm.fields.get(Field::Email), Some("Email is required"));
        assert!(vm.banner.is_none());

        let taken = RegisterErrorsVm::from(&UserServiceError::Storage(StorageError::Conflict));
        assert_eq!(taken.banner, Some(EMAIL_TAKEN));

        let offline = RegisterErrorsVm::from(&UserServiceError::Storage(
            StorageError::Connection("down".into()),
        ));
        assert_eq!(offline.banner, Some(REGISTRATION_FAILED));
    }

    #[test]
    fn page_labels() {
        assert_eq!(RegisterPage::Identity.subtitle(), "Step 1 of 2 - Personal Information");
        assert_eq!(RegisterPage::Security.progress_pct(), 100);
    }
}
