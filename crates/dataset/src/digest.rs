//! Digest classification.
//!
//! The algorithm of a digest is decided purely by its length: 32 characters
//! is MD5, 40 is SHA-1 and 64 is SHA-256. No character-set validation is
//! performed; a 32 character string of non-hex characters is still an "MD5"
//! that simply won't be found in the dataset.

use exn::OptionExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Hash algorithms present in the reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha256,
}
impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha256];

    /// Number of characters in a hex-encoded digest of this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            Algorithm::Md5 => 32,
            Algorithm::Sha1 => 40,
            Algorithm::Sha256 => 64,
        }
    }

    /// Logical column name holding digests of this algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
        }
    }
}
impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Figure out which algorithm produced the given digest.
pub fn classify(digest: &str) -> Result<Algorithm> {
    let length = digest.chars().count();
    Algorithm::ALL
        .into_iter()
        .find(|algorithm| algorithm.hex_len() == length)
        .ok_or_raise(|| ErrorKind::InvalidDigestFormat(digest.to_string()))
}

/// A classified digest, canonicalized to uppercase for comparison against
/// the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: Algorithm,
    value: String,
}
impl Digest {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The canonical (uppercase) digest value.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}
impl FromStr for Digest {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self {
            algorithm: classify(s)?,
            value: s.to_uppercase(),
        })
    }
}
impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.value)
    }
}
