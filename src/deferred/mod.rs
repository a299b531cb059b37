// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred Values
//!
//! Every construction step in this crate returns a value that is not
//! guaranteed to be resolved at declaration time. Dependent computation is
//! chained onto those values with combinators instead of reading them
//! directly, and the dependency sets they carry are what the stack uses to
//! order resource creation.
//!
//! ```text
//! declare ──→ Deferred<T> ──map/and_then/zip──→ Deferred<U> ──apply──→ T/U
//! ```
//!
//! # Laws
//!
//! ```text
//! map id = id
//! map (g . f) = map g . map f
//! deps(zip a b) = deps(a) ∪ deps(b)
//! ```

pub mod combinators;
pub mod value;

pub use combinators::{all, apply2};
pub use value::Deferred;
