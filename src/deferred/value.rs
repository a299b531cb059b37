// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred - Values Resolved by a Later Provisioning Step
//!
//! A `Deferred<T>` stands for a value that is not guaranteed to exist at
//! declaration time: a subnet id, a load balancer DNS name, the validation
//! options returned by a certificate authority. It remembers which resources
//! it waits on, so the stack can order creation, and resolves only once those
//! resources have produced their outputs.
//!
//! # Mathematical Model
//!
//! ```text
//! Deferred<T> ≅ (Dependencies, () → Result<T>)
//! ```
//!
//! Any computation that needs the value is chained onto it instead of reading
//! it directly:
//!
//! ```rust
//! use edge_infrastructure::deferred::Deferred;
//!
//! let zone = Deferred::known("example.com".to_string());
//! let api = zone.map(|apex| format!("api.{}", apex));
//! assert_eq!(api.resolve().unwrap(), "api.example.com");
//! ```
//!
//! # Functor Laws
//!
//! ```text
//! d.map(|x| x) == d
//! d.map(f).map(g) == d.map(|x| g(f(x)))
//! ```

use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::errors::ProvisionResult;

type Resolver<T> = Arc<dyn Fn() -> ProvisionResult<T> + Send + Sync>;

/// Value that becomes available once its dependencies are provisioned
pub struct Deferred<T> {
    /// Names of the resources whose outputs this value is derived from
    dependencies: BTreeSet<String>,
    /// Produces the value; fails while a dependency is unresolved
    resolver: Resolver<T>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            dependencies: self.dependencies.clone(),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<T> Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deferred<{}>{:?}",
            std::any::type_name::<T>(),
            self.dependencies
        )
    }
}

impl<T: Clone + Send + Sync + 'static> Deferred<T> {
    /// A value that is already known at declaration time
    pub fn known(value: T) -> Self {
        Self {
            dependencies: BTreeSet::new(),
            resolver: Arc::new(move || Ok(value.clone())),
        }
    }

    /// A value produced by `resolver` once `dependencies` exist
    pub fn from_resolver<F>(dependencies: BTreeSet<String>, resolver: F) -> Self
    where
        F: Fn() -> ProvisionResult<T> + Send + Sync + 'static,
    {
        Self {
            dependencies,
            resolver: Arc::new(resolver),
        }
    }

    /// Transform the eventual value
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let resolver = self.resolver;
        Deferred {
            dependencies: self.dependencies,
            resolver: Arc::new(move || resolver().map(&f)),
        }
    }

    /// Transform the eventual value with a step that may itself fail
    pub fn and_then<U, F>(self, f: F) -> Deferred<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(T) -> ProvisionResult<U> + Send + Sync + 'static,
    {
        let resolver = self.resolver;
        Deferred {
            dependencies: self.dependencies,
            resolver: Arc::new(move || resolver().and_then(&f)),
        }
    }

    /// Pair two deferred values; the result waits on both dependency sets
    pub fn zip<U>(self, other: Deferred<U>) -> Deferred<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        let mut dependencies = self.dependencies;
        dependencies.extend(other.dependencies);

        let left = self.resolver;
        let right = other.resolver;
        Deferred {
            dependencies,
            resolver: Arc::new(move || Ok((left()?, right()?))),
        }
    }

    /// Produce the value, failing if a dependency has not been provisioned
    pub fn resolve(&self) -> ProvisionResult<T> {
        (self.resolver)()
    }

    /// The value if it depends on nothing, without touching any resource
    pub fn peek(&self) -> Option<T> {
        if self.is_known() {
            self.resolve().ok()
        } else {
            None
        }
    }

    /// Resource names this value waits on
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Whether the value is available at declaration time
    pub fn is_known(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl From<&str> for Deferred<String> {
    fn from(value: &str) -> Self {
        Deferred::known(value.to_string())
    }
}

impl From<String> for Deferred<String> {
    fn from(value: String) -> Self {
        Deferred::known(value)
    }
}
