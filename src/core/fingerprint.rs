use crate::config::{ConfigError, GroupingConfig};
use crate::core::distance;
use image::DynamicImage;
use image_hasher::{HashAlg, Hasher, HasherConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Perceptual hash algorithms available for fingerprinting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// Average hash: one bit per cell, set when the cell is brighter than the mean.
    #[default]
    Mean,
    /// Horizontal gradient hash.
    Gradient,
    /// Horizontal and vertical gradient hash.
    DoubleGradient,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Mean => "mean",
            HashAlgorithm::Gradient => "gradient",
            HashAlgorithm::DoubleGradient => "double-gradient",
        }
    }

    /// Number of bits a `hash_size` × `hash_size` grid produces.
    ///
    /// The double gradient hash rounds the grid up to an even side, halves
    /// it and emits one horizontal and one vertical gradient per cell.
    pub fn bit_len(&self, hash_size: u32) -> usize {
        let size = hash_size as usize;
        match self {
            HashAlgorithm::Mean | HashAlgorithm::Gradient => size * size,
            HashAlgorithm::DoubleGradient => {
                let half = size.div_ceil(2);
                2 * half * (half + 1)
            }
        }
    }

    fn hash_alg(self) -> HashAlg {
        match self {
            HashAlgorithm::Mean => HashAlg::Mean,
            HashAlgorithm::Gradient => HashAlg::Gradient,
            HashAlgorithm::DoubleGradient => HashAlg::DoubleGradient,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mean" | "average" => Ok(HashAlgorithm::Mean),
            "gradient" => Ok(HashAlgorithm::Gradient),
            "double-gradient" => Ok(HashAlgorithm::DoubleGradient),
            _ => Err(ConfigError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// Fixed-length perceptual bit signature of one image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: Box<[u8]>,
    bit_len: usize,
}

impl Fingerprint {
    /// Fingerprint using every bit of `bits`.
    pub fn from_bytes(bits: impl Into<Box<[u8]>>) -> Self {
        let bits = bits.into();
        let bit_len = bits.len() * 8;
        Self { bits, bit_len }
    }

    /// Fingerprint whose signature is the first `bit_len` bits of `bits`;
    /// the trailing padding bits must be zero.
    pub fn with_bit_len(bits: impl Into<Box<[u8]>>, bit_len: usize) -> Self {
        let bits = bits.into();
        assert!(
            bit_len <= bits.len() * 8,
            "{} bits do not fit in {} bytes",
            bit_len,
            bits.len()
        );
        Self { bits, bit_len }
    }

    /// 64-bit fingerprint, most significant bit first.
    pub fn from_u64(bits: u64) -> Self {
        Self::from_bytes(bits.to_be_bytes().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Length of the signature in bits, excluding byte padding.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn distance(&self, other: &Fingerprint) -> u32 {
        distance::hamming(self, other)
    }

    pub fn to_hex(&self) -> String {
        self.bits.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Turns decoded logos into fingerprints.
pub struct FingerprintService {
    hasher: Hasher,
    bit_len: usize,
}

impl FingerprintService {
    pub fn new(config: &GroupingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &GroupingConfig) -> Self {
        let hasher = HasherConfig::new()
            .hash_alg(config.algorithm.hash_alg())
            .hash_size(config.hash_size, config.hash_size)
            .to_hasher();
        Self {
            hasher,
            bit_len: config.bit_len(),
        }
    }

    /// Bits in every fingerprint this service produces.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Compute the fingerprint of a single image.
    /// Identical pixels always give identical fingerprints.
    pub fn fingerprint(&self, image: &DynamicImage) -> Fingerprint {
        let hash = self.hasher.hash_image(image);
        Fingerprint::with_bit_len(hash.as_bytes().to_vec(), self.bit_len)
    }
}

impl Default for FingerprintService {
    fn default() -> Self {
        Self::build(&GroupingConfig::default())
    }
}
