//! Persistent CA serial counter.
//!
//! The file holds the last issued serial as uppercase hex on one line, the
//! format `openssl x509 -CAserial` reads and writes. Both backends share it.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use crate::error::{CaError, Result};
use crate::keystore::{read_text, write_public};

/// A positive certificate serial number, big-endian without leading zeros.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Serial(Vec<u8>);

impl Serial {
    /// Serial from big-endian bytes.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        if start == bytes.len() {
            return Self(vec![0]);
        }
        Self(bytes[start..].to_vec())
    }

    /// Random positive 127-bit starting serial.
    pub fn random() -> Self {
        let value = Uuid::new_v4().as_u128() >> 1;
        Self::from_be_bytes(&value.max(1).to_be_bytes())
    }

    /// Parse hex text, tolerating odd length and surrounding whitespace.
    pub fn parse_hex(text: &str) -> std::result::Result<Self, String> {
        let digits = text.trim();
        if digits.is_empty() {
            return Err("empty serial".to_string());
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|e| e.to_string())?;
        Ok(Self::from_be_bytes(&bytes))
    }

    /// The next serial.
    #[must_use]
    pub fn successor(&self) -> Self {
        let mut bytes = self.0.clone();
        for byte in bytes.iter_mut().rev() {
            let (sum, carry) = byte.overflowing_add(1);
            *byte = sum;
            if !carry {
                return Self(bytes);
            }
        }
        bytes.insert(0, 1);
        Self(bytes)
    }

    /// Big-endian magnitude bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex with an even number of digits.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The keystore's serial counter file.
#[derive(Debug, Clone)]
pub struct SerialCounter {
    path: PathBuf,
}

impl SerialCounter {
    /// Counter backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Last issued serial, if any.
    pub fn current(&self) -> Result<Option<Serial>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = read_text(&self.path)?;
        Serial::parse_hex(&text)
            .map(Some)
            .map_err(|reason| CaError::parse(&self.path, reason))
    }

    /// Reserve the next serial and persist it before it is used.
    pub fn next(&self) -> Result<Serial> {
        let next = match self.current()? {
            Some(last) => last.successor(),
            None => Serial::random().successor(),
        };
        write_public(&self.path, format!("{next}\n").as_bytes())?;
        debug!(serial = %next, path = %self.path.display(), "reserved serial");
        Ok(next)
    }
}
