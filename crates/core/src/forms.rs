//! Login and registration form rules.

use std::collections::BTreeMap;

use crate::model::Role;

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    FirstName,
    LastName,
    Email,
    Password,
    ConfirmPassword,
    AgreeToTerms,
}

/// Per-field messages; empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<Field, &'static str>);

impl FormErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    /// Drop the message for `field`, e.g. while the user edits it.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    fn set(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// `local@domain.tld` with no whitespace in any part.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0..=5, one point per satisfied rule.
    pub score: u8,
    /// Unmet rules, in check order.
    pub feedback: Vec<&'static str>,
}

impl PasswordStrength {
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.score >= 3
    }
}

#[must_use]
pub fn password_strength(password: &str) -> PasswordStrength {
    let rules: [(bool, &'static str); 5] = [
        (password.chars().count() >= 8, "At least 8 characters"),
        (password.chars().any(|c| c.is_ascii_lowercase()), "One lowercase letter"),
        (password.chars().any(|c| c.is_ascii_uppercase()), "One uppercase letter"),
        (password.chars().any(|c| c.is_ascii_digit()), "One number"),
        (password.chars().any(|c| !c.is_ascii_alphanumeric()), "One special character"),
    ];

    let mut score = 0;
    let mut feedback = Vec::new();
    for (met, message) in rules {
        if met {
            score += 1;
        } else {
            feedback.push(message);
        }
    }
    PasswordStrength { score, feedback }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns the per-field messages when any rule fails.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        validate_email(&self.email, &mut errors);
        if self.password.is_empty() {
            errors.set(Field::Password, "Password is required");
        } else if self.password.chars().count() < 6 {
            errors.set(Field::Password, "Password must be at least 6 characters");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_to_terms: bool,
}

impl RegistrationForm {
    /// Name and email page.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any rule fails.
    pub fn validate_identity(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.first_name.trim().chars().count() < 2 {
            errors.set(Field::FirstName, "First name must be at least 2 characters");
        }
        if self.last_name.trim().chars().count() < 2 {
            errors.set(Field::LastName, "Last name must be at least 2 characters");
        }
        validate_email(&self.email, &mut errors);
        errors.into_result()
    }

    /// Password and terms page.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any rule fails.
    pub fn validate_security(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.password.is_empty() {
            errors.set(Field::Password, "Password is required");
        } else if !password_strength(&self.password).is_acceptable() {
            errors.set(Field::Password, "Password is too weak");
        }

        if self.confirm_password.is_empty() {
            errors.set(Field::ConfirmPassword, "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.set(Field::ConfirmPassword, "Passwords do not match");
        }

        if !self.agree_to_terms {
            errors.set(
                Field::AgreeToTerms,
                "You must agree to the terms and conditions",
            );
        }
        errors.into_result()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Account created from the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl UserForm {
    /// # Errors
    ///
    /// Returns the per-field messages when any rule fails.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.name.trim().is_empty() {
            errors.set(Field::Name, "Name is required");
        }
        validate_email(&self.email, &mut errors);
        if self.password.chars().count() < 6 {
            errors.set(Field::Password, "Password must be at least 6 characters");
        }
        errors.into_result()
    }
}

fn validate_email(email: &str, errors: &mut FormErrors) {
    if email.is_empty() {
        errors.set(Field::Email, "Email is required");
    } else if !is_valid_email(email) {
        errors.set(Field::Email, "Please enter a valid email");
    }
}
