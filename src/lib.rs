//! Groups brand logos by perceptual similarity.
//!
//! Logos are fingerprinted with a perceptual hash and grouped greedily:
//! each group is seeded by the first unused logo and takes every later
//! unused logo within a Hamming threshold of that seed.

pub mod config;
pub mod core;
pub mod services;

pub use crate::config::{FetchConfig, GroupingConfig, ResolverConfig};
pub use crate::core::{
    Fingerprint, FingerprintService, Fingerprinted, GroupRecord, HashAlgorithm, LogoItem,
    Partition, SeedGrouper, fingerprint_items, group_fingerprinted,
};
