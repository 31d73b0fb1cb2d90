//! Interactive session detection
//!
//! Batch-connect sessions run out of a per-session output directory whose
//! last path component is a version 4 UUID. A job whose working directory is
//! such a directory belongs to that session.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::domain::job::SessionId;

/// Session output directory: captures the owning user and the session UUID
static SESSION_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/home/([^/]+)/ondemand/data/sys/dashboard/batch_connect/sys/\w+/output/([0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12})$",
    )
    .expect("static regex")
});

/// Path pattern for one user's interactive session directories
///
/// Matches `/home/<user>/ondemand/data/sys/dashboard/batch_connect/sys/<app>/output/<uuid>`
/// exactly, where `<app>` is one or more word characters and `<uuid>` is a
/// lowercase hyphenated version 4 UUID.
#[derive(Debug, Clone)]
pub struct SessionPattern {
    user: String,
}

impl SessionPattern {
    pub fn for_user(user: &str) -> Self {
        Self {
            user: user.to_string(),
        }
    }

    /// Session a working directory belongs to
    pub fn extract(&self, workdir: &str) -> SessionId {
        SessionId(self.match_uuid(workdir))
    }

    fn match_uuid(&self, workdir: &str) -> Option<Uuid> {
        let caps = SESSION_DIR.captures(workdir)?;
        if &caps[1] != self.user {
            return None;
        }
        Uuid::parse_str(&caps[2]).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "0b1c2d3e-4f50-4a6b-8c7d-9e0f1a2b3c4d";

    fn path(user: &str, app: &str, id: &str) -> String {
        format!(
            "/home/{}/ondemand/data/sys/dashboard/batch_connect/sys/{}/output/{}",
            user, app, id
        )
    }

    #[test]
    fn test_extracts_session_uuid() {
        let pattern = SessionPattern::for_user("alice");
        let session = pattern.extract(&path("alice", "jupyter", UUID));
        assert_eq!(session.0.unwrap().to_string(), UUID);
    }

    #[test]
    fn test_other_user_does_not_match() {
        let pattern = SessionPattern::for_user("alice");
        assert_eq!(pattern.extract(&path("bob", "jupyter", UUID)), SessionId(None));
    }

    #[test]
    fn test_user_is_matched_literally() {
        let pattern = SessionPattern::for_user("a.b");
        assert_eq!(pattern.extract(&path("axb", "rstudio", UUID)), SessionId(None));
        assert!(pattern.extract(&path("a.b", "rstudio", UUID)).0.is_some());
    }

    #[test]
    fn test_rejects_non_v4_and_uppercase() {
        let pattern = SessionPattern::for_user("alice");
        let v1 = "0b1c2d3e-4f50-1a6b-8c7d-9e0f1a2b3c4d";
        assert_eq!(pattern.extract(&path("alice", "app", v1)), SessionId(None));
        let bad_variant = "0b1c2d3e-4f50-4a6b-cc7d-9e0f1a2b3c4d";
        assert_eq!(pattern.extract(&path("alice", "app", bad_variant)), SessionId(None));
        let upper = UUID.to_uppercase();
        assert_eq!(pattern.extract(&path("alice", "app", &upper)), SessionId(None));
    }

    #[test]
    fn test_rejects_trailing_and_nested_paths() {
        let pattern = SessionPattern::for_user("alice");
        let trailing = format!("{}/", path("alice", "app", UUID));
        assert_eq!(pattern.extract(&trailing), SessionId(None));
        assert_eq!(pattern.extract(&path("alice", "a/b", UUID)), SessionId(None));
        assert_eq!(pattern.extract(&path("alice", "", UUID)), SessionId(None));
        assert_eq!(pattern.extract("/home/alice"), SessionId(None));
    }
}
