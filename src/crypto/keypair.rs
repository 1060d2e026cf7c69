//! Solana keypair representation.

use std::fmt;

use ed25519_dalek::SigningKey;

/// Length of the `seed || public key` keypair encoding.
pub const KEYPAIR_LENGTH: usize = 64;

/// A generated keypair together with its public identifier.
#[derive(Clone)]
pub struct Keypair {
    /// Base58 encoding of the 32-byte public key
    public_id: String,
    /// Secret seed followed by the public key (64 bytes)
    bytes: [u8; KEYPAIR_LENGTH],
}

impl Keypair {
    /// Builds a keypair from an ed25519 signing key.
    #[inline]
    pub fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public_id = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();

        Self {
            public_id,
            bytes: signing_key.to_keypair_bytes(),
        }
    }

    /// Derives a keypair from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_signing_key(&SigningKey::from_bytes(&seed))
    }

    /// Assembles a keypair from an already-encoded identifier and raw bytes.
    ///
    /// No consistency check is made between the two.
    pub fn from_parts(public_id: impl Into<String>, bytes: [u8; KEYPAIR_LENGTH]) -> Self {
        Self {
            public_id: public_id.into(),
            bytes,
        }
    }

    /// Returns the public identifier (base58).
    #[inline]
    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    /// Returns the private material as base58 of the 64 keypair bytes.
    pub fn private_material(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }

    /// Consumes the keypair, producing the encoded result handed to callers.
    pub fn into_result(self) -> KeypairResult {
        let private_material = self.private_material();
        KeypairResult {
            public_id: self.public_id,
            private_material,
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_id", &self.public_id)
            .finish_non_exhaustive()
    }
}

/// The winning keypair of a search, in its canonical string encodings.
#[derive(Clone, PartialEq, Eq)]
pub struct KeypairResult {
    /// Base58 public key
    pub public_id: String,
    /// Base58 of the 64-byte keypair (secret)
    pub private_material: String,
}

impl fmt::Debug for KeypairResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairResult")
            .field("public_id", &self.public_id)
            .field("private_material", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032, section 7.1, TEST 1
    const SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn rfc_seed() -> [u8; 32] {
        hex::decode(SEED_HEX).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_deterministic_public_id() {
        let keypair = Keypair::from_seed(rfc_seed());
        assert_eq!(
            keypair.public_id(),
            "FVen3X669xLzsi6N2V91DoiyzHzg1uAgqiT8jZ9nS96Z"
        );
    }

    #[test]
    fn test_private_material_is_seed_and_public_key() {
        let result = Keypair::from_seed(rfc_seed()).into_result();
        assert_eq!(
            result.private_material,
            "49W385L4rePHy6PAaQUovbD2aacgN4HsKXSMeUzRg4fmwXszN91JuMFrQRj3vMDpZuRF3ZknQBuRBoWQJEfXstMw"
        );

        let decoded = bs58::decode(&result.private_material).into_vec().unwrap();
        assert_eq!(decoded.len(), KEYPAIR_LENGTH);
        assert_eq!(&decoded[..32], &rfc_seed());
    }

    #[test]
    fn test_debug_hides_secret() {
        let result = Keypair::from_seed(rfc_seed()).into_result();
        let printed = format!("{:?}", result);
        assert!(printed.contains("FVen3X669xLzsi6N2V91DoiyzHzg1uAgqiT8jZ9nS96Z"));
        assert!(!printed.contains(&result.private_material));

        let printed = format!("{:?}", Keypair::from_seed(rfc_seed()));
        assert!(!printed.contains("bytes"));
    }
}
