/// Sources module
///
/// Everything needed to turn a service identity into an access token:
/// the subject model, the signed assertion, the endpoint exchange and the
/// issuer tying them to the file cache.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub mod assertion;
pub mod exchange;
pub mod issuer;
pub mod legacy_pem;

/// Principal type a token is requested for, sent as the `box_sub_type` claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Enterprise,
    #[default]
    User,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            SubjectKind::Enterprise => "enterprise",
            SubjectKind::User => "user",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Enterprise { enterprise_id: String },
    User { user_id: String },
}

impl Subject {
    pub fn enterprise(enterprise_id: impl Into<String>) -> Self {
        Subject::Enterprise { enterprise_id: enterprise_id.into() }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Subject::User { user_id: user_id.into() }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Enterprise { .. } => SubjectKind::Enterprise,
            Subject::User { .. } => SubjectKind::User,
        }
    }

    /// Identifier placed in the `sub` claim.
    pub fn id(&self) -> &str {
        match self {
            Subject::Enterprise { enterprise_id } => enterprise_id,
            Subject::User { user_id } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_kind_wire_names() {
        assert_eq!(SubjectKind::Enterprise.to_string(), "enterprise");
        assert_eq!(SubjectKind::User.as_str(), "user");
        assert_eq!(SubjectKind::default(), SubjectKind::User);
        assert_eq!(serde_json::to_string(&SubjectKind::Enterprise).unwrap(), "\"enterprise\"");
    }

    #[test]
    fn subject_exposes_kind_and_id() {
        let subject = Subject::enterprise("42");
        assert_eq!(subject.kind(), SubjectKind::Enterprise);
        assert_eq!(subject.id(), "42");
        assert_eq!(Subject::user("7").kind(), SubjectKind::User);
    }
}
