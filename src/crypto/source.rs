//! Sources of candidate keypairs.

use ed25519_dalek::SigningKey;

use super::Keypair;

/// Errors raised when a keypair cannot be produced.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("keypair generator unavailable: {0}")]
    Unavailable(String),
}

/// Produces independent, uniformly random keypairs.
///
/// Implementations are shared by every worker of a search, so they must be
/// `Send + Sync` and keep no state that correlates successive calls.
pub trait KeypairSource: Send + Sync {
    /// Draws one fresh keypair.
    fn generate(&self) -> Result<Keypair, SourceError>;
}

/// Ed25519 keypairs drawn from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Source;

impl KeypairSource for Ed25519Source {
    #[inline]
    fn generate(&self) -> Result<Keypair, SourceError> {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Ok(Keypair::from_signing_key(&signing_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_distinct_keypairs() {
        let source = Ed25519Source;
        let a = source.generate().unwrap();
        let b = source.generate().unwrap();
        assert_ne!(a.public_id(), b.public_id());
    }

    #[test]
    fn test_public_id_decodes_to_32_bytes() {
        let keypair = Ed25519Source.generate().unwrap();
        let decoded = bs58::decode(keypair.public_id()).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);

        let result = keypair.into_result();
        let secret = bs58::decode(&result.private_material).into_vec().unwrap();
        assert_eq!(&secret[32..], decoded.as_slice());
    }
}
