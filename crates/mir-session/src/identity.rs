//! Per-connection identity.

use crate::SessionError;

/// The username a connection has proven, set at most once.
///
/// On the login server it's set by a successful password check; on a game
/// server by the first successful credential claim. Once set it never
/// changes for the life of the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    username: Option<String>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the connection to `username`.
    ///
    /// # Errors
    /// [`SessionError::IdentityAlreadySet`] if an identity is already bound,
    /// even when it is the same username.
    pub fn set(&mut self, username: impl Into<String>) -> Result<(), SessionError> {
        if let Some(current) = &self.username {
            return Err(SessionError::IdentityAlreadySet(current.clone()));
        }
        self.username = Some(username.into());
        Ok(())
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.username.is_some()
    }

    /// Returns `true` if the connection is bound to exactly `username`.
    pub fn is(&self, username: &str) -> bool {
        self.username.as_deref() == Some(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_is_unset() {
        let identity = SessionIdentity::new();
        assert!(!identity.is_set());
        assert_eq!(identity.username(), None);
    }

    #[test]
    fn test_set_binds_username() {
        let mut identity = SessionIdentity::new();
        identity.set("pangliang").unwrap();
        assert!(identity.is("pangliang"));
        assert!(!identity.is("pangliang1"));
    }

    #[test]
    fn test_set_twice_is_rejected() {
        let mut identity = SessionIdentity::new();
        identity.set("pangliang").unwrap();

        let err = identity.set("other").unwrap_err();

        assert!(matches!(err, SessionError::IdentityAlreadySet(ref u) if u == "pangliang"));
        assert_eq!(identity.username(), Some("pangliang"));
    }
}
