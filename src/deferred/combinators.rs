// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred Combinators
//!
//! Free functions for composing several deferred values at once.
//!
//! - `apply2` - Combine two deferred values with a binary function
//! - `all` - Turn a list of deferred values into one deferred list
//!
//! # Examples
//!
//! ```rust
//! use edge_infrastructure::deferred::{all, apply2, Deferred};
//!
//! let name = Deferred::known("alb.example.net".to_string());
//! let zone = Deferred::known("Z123".to_string());
//! let alias = apply2(name, zone, |n, z| format!("{}@{}", n, z));
//! assert_eq!(alias.resolve().unwrap(), "alb.example.net@Z123");
//!
//! let ids = all(vec![Deferred::known(1), Deferred::known(2)]);
//! assert_eq!(ids.resolve().unwrap(), vec![1, 2]);
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use super::value::Deferred;
use crate::errors::ProvisionResult;

/// Combine two deferred values using a binary function
///
/// Convenience wrapper around `Deferred::zip` followed by `map`.
pub fn apply2<T, U, V, F>(a: Deferred<T>, b: Deferred<U>, f: F) -> Deferred<V>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: Fn(T, U) -> V + Send + Sync + 'static,
{
    a.zip(b).map(move |(x, y)| f(x, y))
}

/// Sequence deferred values, preserving order
///
/// The result depends on the union of every element's dependencies and fails
/// with the first element that cannot be resolved.
pub fn all<T>(values: Vec<Deferred<T>>) -> Deferred<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let dependencies: BTreeSet<String> = values
        .iter()
        .flat_map(|value| value.dependencies().iter().cloned())
        .collect();
    let values = Arc::new(values);

    Deferred::from_resolver(dependencies, move || {
        values
            .iter()
            .map(Deferred::resolve)
            .collect::<ProvisionResult<Vec<T>>>()
    })
}
