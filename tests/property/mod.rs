// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - address allocation: disjoint, contained, deterministic sub-blocks
//! - zone placement: round-robin spread over at least two zones

mod address_allocation;
mod zone_placement;
