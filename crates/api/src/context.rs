use stockroom_core::UserId;

/// The logged-in user for a request.
///
/// Inserted by the session middleware; present on every route that
/// requires a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: UserId,
    username: String,
}

impl UserContext {
    pub fn new(user_id: UserId, username: String) -> Self {
        Self { user_id, username }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
