use super::role::Role;
use serde::{Deserialize, Serialize};

/// One message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Turn {
            role,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Copy of this turn with `delta` appended to the content
    pub fn with_delta(&self, delta: &str) -> Self {
        let mut content = String::with_capacity(self.content.len() + delta.len());
        content.push_str(&self.content);
        content.push_str(delta);
        Turn {
            role: self.role,
            content,
        }
    }
}
