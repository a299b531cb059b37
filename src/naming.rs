// Copyright (c) 2025 - Cowboy AI, Inc.

//! Resource naming
//!
//! Every resource name is a pure function of
//! `(project, environment, kind, index)`:
//!
//! ```text
//! {project}-{environment}-{kind}[-{index}]
//! ```
//!
//! There is no shared "current name" threaded through the builders, so two
//! declarations can never collide or pick up a stale name however their
//! construction is ordered.
//!
//! # Examples
//!
//! ```rust
//! use edge_infrastructure::naming::{resource_name, NameScope};
//!
//! assert_eq!(resource_name("shop", "prod", "vpc", None), "shop-prod-vpc");
//!
//! let scope = NameScope::new("shop", "prod");
//! assert_eq!(scope.indexed("public", 0), "shop-prod-public-1");
//! ```

use serde_json::{json, Value};

/// Build a resource name; `index` is zero-based and rendered one-based
pub fn resource_name(project: &str, environment: &str, kind: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{}-{}-{}-{}", project, environment, kind, i + 1),
        None => format!("{}-{}-{}", project, environment, kind),
    }
}

/// Project/environment pair that prefixes every resource name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameScope {
    project: String,
    environment: String,
}

impl NameScope {
    pub fn new(project: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Name of a singleton resource of `kind`
    pub fn name(&self, kind: &str) -> String {
        resource_name(&self.project, &self.environment, kind, None)
    }

    /// Name of the `index`-th resource of `kind`
    pub fn indexed(&self, kind: &str, index: usize) -> String {
        resource_name(&self.project, &self.environment, kind, Some(index))
    }

    /// Standard `Name`/`Environment` tag map
    pub fn tags(&self, name: &str) -> Value {
        json!({
            "Name": name,
            "Environment": self.environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_pure() {
        let scope = NameScope::new("shop", "staging");
        let first = scope.indexed("private-assoc", 1);
        let _ = scope.name("vpc");
        let second = scope.indexed("private-assoc", 1);
        assert_eq!(first, second);
        assert_eq!(first, "shop-staging-private-assoc-2");
    }

    #[test]
    fn test_distinct_inputs_give_distinct_names() {
        let scope = NameScope::new("shop", "prod");
        assert_ne!(scope.indexed("public", 0), scope.indexed("public", 1));
        assert_ne!(scope.indexed("public", 0), scope.indexed("private", 0));
        assert_ne!(
            NameScope::new("shop", "prod").name("vpc"),
            NameScope::new("shop", "dev").name("vpc")
        );
    }

    #[test]
    fn test_tags() {
        let scope = NameScope::new("shop", "prod");
        let tags = scope.tags("shop-prod-vpc");
        assert_eq!(tags["Name"], "shop-prod-vpc");
        assert_eq!(tags["Environment"], "prod");
    }
}
