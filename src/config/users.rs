//! Approver configuration.
//!
//! Approvers are listed in config.toml and can be extended through the
//! `APPROVER_USER_IDS` environment variable (comma-separated Discord user IDs).

use std::collections::HashSet;

/// Set of Discord user IDs with approval capability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApproverList {
    ids: HashSet<String>,
}

impl ApproverList {
    /// Builds a list from IDs, ignoring blanks.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|id| id.as_ref().trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }

    /// Merges configured approvers with those named in `APPROVER_USER_IDS`.
    #[must_use]
    pub fn from_env(configured: &[String]) -> Self {
        let from_env = std::env::var("APPROVER_USER_IDS").unwrap_or_default();
        Self::from_ids(
            configured
                .iter()
                .map(String::as_str)
                .chain(from_env.split(',')),
        )
    }

    /// Whether `user_id` is an approver.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.ids.contains(user_id)
    }

    /// Number of approvers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no approvers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ids_trims_and_skips_blanks() {
        let approvers = ApproverList::from_ids([" 100 ", "", "200", "100"]);
        assert_eq!(approvers.len(), 2);
        assert!(approvers.contains("100"));
        assert!(approvers.contains("200"));
        assert!(!approvers.contains("300"));
    }

    #[test]
    fn test_empty_list() {
        let approvers = ApproverList::from_ids(Vec::<String>::new());
        assert!(approvers.is_empty());
        assert!(!approvers.contains(""));
    }
}
