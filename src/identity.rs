//! Resource identifiers.
//!
//! Remote resources are addressed by an opaque [`ResourceHandle`] (a name or
//! a UUID, depending on the kind). Relationship resources — image members
//! and policy bindings/members — are addressed by structured composite
//! identifiers that are only flattened to their `/`-joined string form at
//! the boundary with the declarative engine, and re-split deterministically
//! on the way back in.

use std::fmt;
use std::str::FromStr;

use crate::error::IdentifierError;

/// Opaque identifier naming one remote resource instance.
///
/// Immutable once assigned at creation time; recorded on the local record
/// before any state poll begins so an interrupted operation leaves a
/// recoverable handle behind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Creates a handle from any identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ResourceHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<uuid::Uuid> for ResourceHandle {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of an image-member grant: one project's access to one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMemberId {
    /// The shared image.
    pub image_id: String,
    /// The project granted access.
    pub project_id: String,
}

impl fmt::Display for ImageMemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.image_id, self.project_id)
    }
}

impl FromStr for ImageMemberId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(image_id), Some(project_id)) if !image_id.is_empty() && !project_id.is_empty() => {
                Ok(Self {
                    image_id: image_id.to_string(),
                    project_id: project_id.to_string(),
                })
            }
            _ => Err(IdentifierError::Malformed {
                value: s.to_string(),
                expected: "<image_id>/<project_id>",
            }),
        }
    }
}

/// Identifier of a policy binding: one role's member list within a policy
/// scope. System-scope bindings carry no project segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyBindingId {
    /// Owning project, or `None` for the system policy.
    pub project: Option<String>,
    /// The bound role.
    pub role: String,
}

impl fmt::Display for PolicyBindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}/{}", self.role),
            None => f.write_str(&self.role),
        }
    }
}

impl PolicyBindingId {
    /// Parses a system-scope binding identifier (`<role>`).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if the value is empty or
    /// contains a path separator.
    pub fn parse_system(s: &str) -> Result<Self, IdentifierError> {
        if s.is_empty() || s.contains('/') {
            return Err(IdentifierError::Malformed {
                value: s.to_string(),
                expected: "<role>",
            });
        }
        Ok(Self {
            project: None,
            role: s.to_string(),
        })
    }

    /// Parses a project-scope binding identifier (`<project>/<role>`).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if either segment is missing
    /// or empty.
    pub fn parse_project(s: &str) -> Result<Self, IdentifierError> {
        let mut parts = s.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(project), Some(role)) if !project.is_empty() && !role.is_empty() => Ok(Self {
                project: Some(project.to_string()),
                role: role.to_string(),
            }),
            _ => Err(IdentifierError::Malformed {
                value: s.to_string(),
                expected: "<project>/<role>",
            }),
        }
    }
}

/// Identifier of a single member within a policy binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMemberId {
    /// Owning project, or `None` for the system policy.
    pub project: Option<String>,
    /// The bound role.
    pub role: String,
    /// The member entry.
    pub member: String,
}

impl fmt::Display for PolicyMemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{project}/{}/{}", self.role, self.member),
            None => write!(f, "{}/{}", self.role, self.member),
        }
    }
}

impl PolicyMemberId {
    /// Parses a system-scope member identifier (`<role>/<member>`).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if either segment is missing
    /// or empty.
    pub fn parse_system(s: &str) -> Result<Self, IdentifierError> {
        let mut parts = s.splitn(2, '/');
        match (parts.next(), parts.next()) {
            (Some(role), Some(member)) if !role.is_empty() && !member.is_empty() => Ok(Self {
                project: None,
                role: role.to_string(),
                member: member.to_string(),
            }),
            _ => Err(IdentifierError::Malformed {
                value: s.to_string(),
                expected: "<role>/<member>",
            }),
        }
    }

    /// Parses a project-scope member identifier
    /// (`<project>/<role>/<member>`).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if any segment is missing or
    /// empty.
    pub fn parse_project(s: &str) -> Result<Self, IdentifierError> {
        let mut parts = s.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(role), Some(member))
                if !project.is_empty() && !role.is_empty() && !member.is_empty() =>
            {
                Ok(Self {
                    project: Some(project.to_string()),
                    role: role.to_string(),
                    member: member.to_string(),
                })
            }
            _ => Err(IdentifierError::Malformed {
                value: s.to_string(),
                expected: "<project>/<role>/<member>",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_member_id_round_trip() {
        let id = ImageMemberId {
            image_id: String::from("8e2c"),
            project_id: String::from("web"),
        };
        let encoded = id.to_string();
        assert_eq!(encoded, "8e2c/web");
        assert_eq!(encoded.parse::<ImageMemberId>().unwrap(), id);
    }

    #[test]
    fn test_image_member_id_malformed() {
        assert!("justone".parse::<ImageMemberId>().is_err());
        assert!("/missing".parse::<ImageMemberId>().is_err());
    }

    #[test]
    fn test_policy_member_project_round_trip() {
        let id = PolicyMemberId {
            project: Some(String::from("web")),
            role: String::from("viewer"),
            member: String::from("user:amara"),
        };
        let encoded = id.to_string();
        assert_eq!(encoded, "web/viewer/user:amara");
        assert_eq!(PolicyMemberId::parse_project(&encoded).unwrap(), id);
    }

    #[test]
    fn test_policy_member_system_round_trip() {
        let id = PolicyMemberId {
            project: None,
            role: String::from("admin"),
            member: String::from("serviceAccount:ops"),
        };
        assert_eq!(PolicyMemberId::parse_system(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_policy_member_member_may_contain_separator() {
        // Only the leading segments are split; the member keeps any
        // remaining separators.
        let id = PolicyMemberId::parse_project("web/viewer/group:a/b").unwrap();
        assert_eq!(id.member, "group:a/b");
    }

    #[test]
    fn test_policy_binding_parse() {
        let system = PolicyBindingId::parse_system("viewer").unwrap();
        assert_eq!(system.project, None);
        assert_eq!(system.role, "viewer");
        assert!(PolicyBindingId::parse_system("web/viewer").is_err());

        let project = PolicyBindingId::parse_project("web/viewer").unwrap();
        assert_eq!(project.project.as_deref(), Some("web"));
        assert_eq!(project.role, "viewer");
        assert!(PolicyBindingId::parse_project("viewer").is_err());
    }
}
