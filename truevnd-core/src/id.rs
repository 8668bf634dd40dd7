use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// AccountId identifies anything that can hold value or authority on the ledger:
// user accounts as well as ledger, list, sheet and controller instances.
// It is a 32 byte long identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 32]);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as a hex string with a prefix of the first 6 bytes
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "acct:{}", prefix)
    }
}

impl Ord for AccountId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for AccountId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        AccountId([0; 32])
    }
}

impl Deref for AccountId {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AccountId {
    pub fn new(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Full hex encoding of the identifier
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Deterministic account identifier for fixtures and demos
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"TRUEVND_Account");
        hasher.update(label.as_bytes());
        AccountId(hasher.finalize().into())
    }

    pub fn create_instance_id(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"TRUEVND_Instance");

        for seed in seeds {
            hasher.update(seed);
        }

        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Verify that a 32-byte array is not a valid point on the ed25519 curve
    ///
    /// Returns true if the bytes do not represent a valid curve point.
    pub fn is_off_curve(bytes: &[u8; 32]) -> bool {
        let Ok(compressed_edwards_y) = CompressedEdwardsY::from_slice(bytes.as_ref()) else {
            return true;
        };
        compressed_edwards_y.decompress().is_none()
    }

    /// Try to find an off-curve instance identifier for the given seeds
    ///
    /// Off-curve identifiers have no private key, so an instance id can never
    /// be claimed by a signing account.
    pub fn try_derive(seeds: &[&[u8]]) -> Option<(AccountId, u8)> {
        for bump in 0..=u8::MAX {
            let id = AccountId::create_instance_id(seeds, bump);
            if AccountId::is_off_curve(&id) {
                return Some((AccountId(id), bump));
            }
        }
        None
    }

    /// Returns true if no key can exist for this identifier
    pub fn is_instance_id(&self) -> bool {
        AccountId::is_off_curve(&self.0)
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }
}
