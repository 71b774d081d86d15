use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A commit identifier (SHA-1 or SHA-256 digest)
///
/// Ordering is byte order, which matches the lexical order of the
/// lowercase hex form.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CommitHash(Box<[u8]>);

impl CommitHash {
    pub const SHA1_LEN: usize = 20;
    pub const SHA256_LEN: usize = 32;

    /// Parse a hex digest, accepting either case
    pub fn parse(hex_str: &str) -> Result<Self, Error> {
        let bytes = hex::decode(hex_str).map_err(|e| Error::InvalidHash {
            input: hex_str.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes).map_err(|_| Error::InvalidHash {
            input: hex_str.to_string(),
            reason: format!("expected 40 or 64 hex digits, got {}", hex_str.len()),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        match bytes.len() {
            Self::SHA1_LEN | Self::SHA256_LEN => Ok(Self(bytes.into())),
            n => Err(Error::InvalidHash {
                input: hex::encode(bytes),
                reason: format!("expected 20 or 32 bytes, got {}", n),
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// First 12 hex digits, for log output
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }

    pub fn to_oid(&self) -> Result<git2::Oid, git2::Error> {
        git2::Oid::from_bytes(&self.0)
    }
}

impl From<git2::Oid> for CommitHash {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.as_bytes().into())
    }
}

impl FromStr for CommitHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({})", self)
    }
}
