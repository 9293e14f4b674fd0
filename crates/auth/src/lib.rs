//! `stockroom-auth`: user accounts, credentials and sessions.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod password;
pub mod session;
pub mod user;

pub use password::{hash_password, verify_password, PasswordError};
pub use session::{validate_claims, SessionClaims, SessionCodec, SessionError, TokenValidationError};
pub use user::{authenticate, LoginForm, NewUser, Registration, RegistrationForm, User};
