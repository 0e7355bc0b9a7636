// Similarity-clustering engine: fingerprints, distances, grouping and
// conversion of groups into output rows.

pub mod distance;
pub mod fingerprint;
pub mod grouping;
pub mod materialize;
pub mod pipeline;
pub mod record;

pub use fingerprint::{Fingerprint, FingerprintService, HashAlgorithm};
pub use grouping::{Group, Partition, SeedGrouper};
pub use materialize::{GroupError, materialize};
pub use pipeline::{Fingerprinted, GroupingOutcome, fingerprint_items, group_fingerprinted};
pub use record::{GroupRecord, LogoItem};
