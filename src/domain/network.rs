// Copyright (c) 2025 - Cowboy AI, Inc.
//! Address Block Value Object with Validation Invariants

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Partition of /{prefix} by {new_bits} bits exceeds /32")]
    PartitionTooDeep { prefix: u8, new_bits: u8 },

    #[error("Sub-block index {index} out of range for {count} sub-blocks")]
    IndexOutOfRange { index: u64, count: u64 },
}

/// Contiguous IPv4 address range in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Host bits are zero (the stored address is the network address)
///
/// # Examples
///
/// ```rust
/// use edge_infrastructure::domain::AddressBlock;
///
/// let block: AddressBlock = "10.0.0.0/16".parse().unwrap();
/// let third = block.subnet(7, 2).unwrap();
/// assert_eq!(third.to_string(), "10.0.4.0/23");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressBlock {
    network: u32,
    prefix_len: u8,
}

impl AddressBlock {
    /// Create a block, masking any host bits off the address
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, NetworkError> {
        if prefix_len > 32 {
            return Err(NetworkError::InvalidPrefixLength(prefix_len));
        }

        Ok(Self {
            network: u32::from(address) & Self::mask(prefix_len),
            prefix_len,
        })
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Number of addresses covered by the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// First address as an integer
    pub fn first(&self) -> u64 {
        u64::from(self.network)
    }

    /// Last address as an integer
    pub fn last(&self) -> u64 {
        self.first() + self.size() - 1
    }

    /// Number of sub-blocks produced by partitioning with `new_bits`
    pub fn partition_count(new_bits: u8) -> u64 {
        if new_bits >= 64 {
            u64::MAX
        } else {
            1u64 << new_bits
        }
    }

    /// The `index`-th sub-block obtained by extending the prefix by `new_bits`
    ///
    /// Pure and deterministic: sub-blocks with distinct indices never overlap
    /// and every sub-block lies inside `self`.
    pub fn subnet(&self, new_bits: u8, index: u64) -> Result<Self, NetworkError> {
        let new_prefix = u16::from(self.prefix_len) + u16::from(new_bits);
        if new_prefix > 32 {
            return Err(NetworkError::PartitionTooDeep {
                prefix: self.prefix_len,
                new_bits,
            });
        }

        let count = Self::partition_count(new_bits);
        if index >= count {
            return Err(NetworkError::IndexOutOfRange { index, count });
        }

        let new_prefix = new_prefix as u8;
        let step = 1u64 << (32 - u32::from(new_prefix));
        let network = self.first() + index * step;

        Ok(Self {
            network: network as u32,
            prefix_len: new_prefix,
        })
    }

    /// Whether `other` lies entirely inside this block
    pub fn contains(&self, other: &AddressBlock) -> bool {
        other.first() >= self.first() && other.last() <= self.last()
    }

    /// Whether the two blocks share at least one address
    pub fn overlaps(&self, other: &AddressBlock) -> bool {
        self.first() <= other.last() && other.first() <= self.last()
    }
}

impl fmt::Display for AddressBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix_len)
    }
}

impl FromStr for AddressBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(s.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(s.to_string()))?;

        Self::new(address, prefix_len)
    }
}

impl Serialize for AddressBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AddressBlock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The open IPv4 range, used only for the edge tier and for egress
pub const ANY_IPV4: &str = "0.0.0.0/0";
