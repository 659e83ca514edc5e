//! User identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdValidationError {
    /// The id string was empty.
    EmptyId,
    /// The id string was not a valid UUID.
    InvalidId,
}

impl fmt::Display for UserIdValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserIdValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Errors
    ///
    /// Returns [`UserIdValidationError::EmptyId`] for empty input, or
    /// [`UserIdValidationError::InvalidId`] when the input is not a UUID.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Construct a [`UserId`] directly from a UUID.
    ///
    /// Useful when the UUID is already validated (e.g., loaded from database).
    pub fn from_uuid(uuid: Uuid) -> Self {
        let raw = uuid.to_string();
        Self(uuid, raw)
    }

    /// Generate a new random [`UserId`].
    ///
    /// Primarily useful for testing.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    fn from_owned(id: String) -> Result<Self, UserIdValidationError> {
        if id.is_empty() {
            return Err(UserIdValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserIdValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(&id).map_err(|_| UserIdValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.1
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_non_uuid_input() {
        assert_eq!(UserId::new("").unwrap_err(), UserIdValidationError::EmptyId);
        assert_eq!(
            UserId::new("not-a-uuid").unwrap_err(),
            UserIdValidationError::InvalidId
        );
        assert_eq!(
            UserId::new(" 550e8400-e29b-41d4-a716-446655440000").unwrap_err(),
            UserIdValidationError::InvalidId
        );
    }

    #[test]
    fn preserves_the_raw_representation() {
        let raw = "550e8400-e29b-41d4-a716-446655440000";
        let id = UserId::new(raw).expect("valid UUID");
        assert_eq!(id.as_ref(), raw);
        assert_eq!(id.to_string(), raw);
    }
}
