// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address allocation
//!
//! Splits one base block into `public + private` disjoint sub-blocks by
//! extending its prefix with `new_bits` and taking sub-block indices
//! `0..total` in order. The first `public` sub-blocks are public, the rest
//! private.
//!
//! ```rust
//! use edge_infrastructure::domain::AddressBlock;
//! use edge_infrastructure::network::allocate_subnets;
//!
//! let base: AddressBlock = "10.0.0.0/16".parse().unwrap();
//! let plan = allocate_subnets(&base, 7, 2, 2).unwrap();
//! assert_eq!(plan.public[1].to_string(), "10.0.2.0/23");
//! assert_eq!(plan.private[0].to_string(), "10.0.4.0/23");
//! ```

use serde::Serialize;

use crate::domain::AddressBlock;
use crate::errors::{ProvisionError, ProvisionResult};

/// Disjoint public and private sub-blocks of one base block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPlan {
    pub public: Vec<AddressBlock>,
    pub private: Vec<AddressBlock>,
}

impl AddressPlan {
    /// Every sub-block, public first
    pub fn all(&self) -> impl Iterator<Item = &AddressBlock> {
        self.public.iter().chain(self.private.iter())
    }
}

/// Allocate `public + private` sub-blocks of `base` at partition width `new_bits`
///
/// Fails with `Topology` when the request does not fit: more sub-blocks than
/// `2^new_bits`, or a prefix extended past /32.
pub fn allocate_subnets(
    base: &AddressBlock,
    new_bits: u8,
    public: usize,
    private: usize,
) -> ProvisionResult<AddressPlan> {
    let total = public as u64 + private as u64;
    let available = AddressBlock::partition_count(new_bits);
    if total > available {
        return Err(ProvisionError::topology(format!(
            "{} subnets requested but {} split by {} bits yields only {}",
            total, base, new_bits, available
        )));
    }

    let blocks = (0..total)
        .map(|index| base.subnet(new_bits, index))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ProvisionError::topology(format!("cannot partition {}: {}", base, e)))?;

    let (public_blocks, private_blocks) = blocks.split_at(public);
    Ok(AddressPlan {
        public: public_blocks.to_vec(),
        private: private_blocks.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(s: &str) -> AddressBlock {
        s.parse().unwrap()
    }

    #[test]
    fn test_reference_layout() {
        let plan = allocate_subnets(&block("10.0.0.0/16"), 7, 2, 2).unwrap();
        assert_eq!(
            plan,
            AddressPlan {
                public: vec![block("10.0.0.0/23"), block("10.0.2.0/23")],
                private: vec![block("10.0.4.0/23"), block("10.0.6.0/23")],
            }
        );
    }

    #[test]
    fn test_exact_fit() {
        let plan = allocate_subnets(&block("10.0.0.0/24"), 2, 2, 2).unwrap();
        assert_eq!(plan.private[1], block("10.0.0.192/26"));
    }

    #[test]
    fn test_too_many_subnets() {
        let err = allocate_subnets(&block("10.0.0.0/24"), 2, 3, 2).unwrap_err();
        assert!(matches!(err, ProvisionError::Topology(_)));
    }

    #[test]
    fn test_partition_too_deep() {
        let err = allocate_subnets(&block("10.0.0.0/28"), 8, 1, 1).unwrap_err();
        assert!(matches!(err, ProvisionError::Topology(_)));
    }

    #[test]
    fn test_empty_request() {
        let plan = allocate_subnets(&block("10.0.0.0/16"), 4, 0, 0).unwrap();
        assert_eq!(plan.all().count(), 0);
    }
}
