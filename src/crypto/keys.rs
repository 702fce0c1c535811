//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve. The signing context is built once,
//! lazily, and never mutated afterwards.

use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

/// Shared read-only secp256k1 context
static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let (secret_key, public_key) = SECP.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Get the public key as a hex string (compressed format)
    ///
    /// This is also the ledger address of the key pair.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Sign a 32-byte digest, returning the DER signature as hex
    pub fn sign(&self, digest: &[u8; 32]) -> String {
        let message = Message::from_digest(*digest);
        let signature = SECP.sign_ecdsa(&message, &self.secret_key);
        hex::encode(&*signature.serialize_der())
    }
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Verify a hex DER signature over a digest for a hex-encoded public key
pub fn verify_signature(
    public_key_hex: &str,
    digest: &[u8; 32],
    signature_hex: &str,
) -> Result<bool, KeyError> {
    let public_key = public_key_from_hex(public_key_hex)?;
    let der = hex::decode(signature_hex).map_err(|_| KeyError::InvalidSignature)?;
    let signature = Signature::from_der(&der).map_err(|_| KeyError::InvalidSignature)?;
    let message = Message::from_digest(*digest);

    Ok(SECP.verify_ecdsa(&message, &signature, &public_key).is_ok())
}
