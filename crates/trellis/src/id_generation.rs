//! Hash-based issue identifiers.
//!
//! Ids look like `{prefix}-{hash}` (e.g. `proj-a3f8`). The hash part is the
//! base36 encoding of a SHA-256 digest over the issue's creation data, and
//! its length grows with the number of stored issues:
//!
//! | issues      | hash length |
//! |-------------|-------------|
//! | 0..=500     | 4           |
//! | 501..=1500  | 5           |
//! | 1501..      | 6           |
//!
//! Collisions are retried with an incrementing nonce; once the nonces run
//! out the length is bumped by one.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_LENGTH: usize = 8;

/// Errors that can occur during ID generation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdGenerationError {
    /// Every nonce collided at every permitted length
    #[error("unable to generate a unique id after {attempts} attempts")]
    CollisionExhausted {
        /// Total attempts made
        attempts: u32,
    },

    /// Prefix is unusable
    #[error("invalid id prefix '{0}': use 1-20 ASCII letters, digits or '-'")]
    InvalidPrefix(String),
}

/// Check that `prefix` is a usable id prefix.
///
/// # Errors
///
/// Returns [`IdGenerationError::InvalidPrefix`] when the prefix is empty,
/// longer than 20 characters, or contains characters other than ASCII
/// alphanumerics and `-`.
pub fn validate_prefix(prefix: &str) -> Result<(), IdGenerationError> {
    let ok = !prefix.is_empty()
        && prefix.len() <= 20
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(IdGenerationError::InvalidPrefix(prefix.to_string()))
    }
}

/// Generates collision-free ids for a single store
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    existing: HashSet<String>,
}

impl IdGenerator {
    /// Generator with no known ids
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            existing: HashSet::new(),
        }
    }

    /// The configured prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Remember an id that already exists (e.g. loaded from disk)
    pub fn register(&mut self, id: impl Into<String>) {
        self.existing.insert(id.into());
    }

    /// Forget an id (its issue was deleted)
    pub fn release(&mut self, id: &str) {
        self.existing.remove(id);
    }

    /// Number of ids currently known
    pub fn len(&self) -> usize {
        self.existing.len()
    }

    /// Whether no ids are known
    pub fn is_empty(&self) -> bool {
        self.existing.is_empty()
    }

    /// Produce a fresh id from the given creation data.
    ///
    /// `seed` should differ between calls (the store passes its creation
    /// sequence), so identical titles still hash differently.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no free id could
    /// be found.
    pub fn generate(&mut self, title: &str, actor: &str, seed: u64) -> Result<String, IdGenerationError> {
        let base_length = adaptive_length(self.existing.len());
        let mut attempts = 0;

        for length in base_length..=MAX_LENGTH {
            if length > base_length {
                warn!(length, "id nonces exhausted, growing id length");
            }
            for nonce in 0..MAX_NONCE {
                attempts += 1;
                let id = self.hash_id(title, actor, seed, nonce, length);
                if self.existing.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "generated id after collision retries");
                    }
                    return Ok(id);
                }
            }
        }

        Err(IdGenerationError::CollisionExhausted { attempts })
    }

    fn hash_id(&self, title: &str, actor: &str, seed: u64, nonce: u32, length: usize) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"|");
        hasher.update(actor.as_bytes());
        hasher.update(b"|");
        hasher.update(seed.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();

        let mut value = digest
            .iter()
            .take(8)
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        format!("{}-{}", self.prefix, encode_base36(&mut value, length))
    }
}

/// Hash length for a store that currently holds `size` issues
pub fn adaptive_length(size: usize) -> usize {
    match size {
        0..=500 => 4,
        501..=1500 => 5,
        _ => 6,
    }
}

/// Encode the low digits of `value` as exactly `length` base36 characters
fn encode_base36(value: &mut u64, length: usize) -> String {
    let mut out = vec![b'0'; length];
    for slot in out.iter_mut().rev() {
        // value % 36 < 36, so the index is always in range
        *slot = BASE36_CHARS[usize::try_from(*value % 36).unwrap_or(0)];
        *value /= 36;
    }
    out.into_iter().map(char::from).collect()
}
