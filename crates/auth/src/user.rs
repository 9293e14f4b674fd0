//! User accounts: registration and login forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, FieldErrors, UserId};

use crate::password::verify_password;

pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

const REQUIRED: &str = "This field is required.";

/// Small deny-list; enough to stop the obvious ones.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "admin123", "letmein1", "trustno1", "abc12345",
    "passw0rd", "starwars",
];

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// argon2 PHC string; never serialized to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn with_id(self, id: UserId, now: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            date_joined: now,
        }
    }
}

/// Raw sign-up form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// A registration that passed form validation. Username uniqueness is left
/// to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        validate_username(username, &mut errors);

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                validate_password_strength(&self.password2, username, &mut errors);
            }
        }

        errors.into_result()?;
        Ok(Registration {
            username: username.to_string(),
            password: self.password1.clone(),
        })
    }
}

fn validate_username(username: &str, errors: &mut FieldErrors) {
    if username.is_empty() {
        errors.add("username", REQUIRED);
        return;
    }
    let len = username.chars().count();
    if len > USERNAME_MAX_CHARS {
        errors.add(
            "username",
            format!("Ensure this value has at most {USERNAME_MAX_CHARS} characters (it has {len})."),
        );
    }
    if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

fn validate_password_strength(password: &str, username: &str, errors: &mut FieldErrors) {
    let lower = password.to_lowercase();
    let user_lower = username.to_lowercase();

    if user_lower.chars().count() >= 3 && (lower.contains(&user_lower) || user_lower.contains(&lower)) {
        errors.add("password2", "The password is too similar to the username.");
    }
    if password.chars().count() < PASSWORD_MIN_CHARS {
        errors.add(
            "password2",
            format!("This password is too short. It must contain at least {PASSWORD_MIN_CHARS} characters."),
        );
    }
    if COMMON_PASSWORDS.contains(&lower.as_str()) {
        errors.add("password2", "This password is too common.");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password2", "This password is entirely numeric.");
    }
}

/// Raw login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Check a login attempt against the looked-up account (if any).
///
/// Unknown users and wrong passwords produce the same non-field error.
pub fn authenticate(user: Option<User>, form: &LoginForm) -> Result<User, FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.username.trim().is_empty() {
        errors.add("username", REQUIRED);
    }
    if form.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    match user {
        Some(user) if verify_password(&form.password, &user.password_hash) => Ok(user),
        _ => {
            let mut errors = FieldErrors::new();
            errors.add(
                FieldErrors::NON_FIELD,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            Err(errors)
        }
    }
}
