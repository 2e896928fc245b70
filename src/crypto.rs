//! Cryptographic primitives: digests, proof of work and submission signatures
//!
//! The node only ever talks to signatures through [`SignatureVerifier`] and [`Signer`];
//! the key types below are the default capability shipped with the crate.

pub mod hash;
pub mod pow;

use crate::error::{ChainmeshError, CryptoError, Result};
use ed25519_dalek::Signer as _;
use std::str::FromStr;

/// Every supported scheme produces fixed 64-byte signatures
pub const SIGNATURE_LEN: usize = 64;

/// Verification capability consumed by the node
pub trait SignatureVerifier: Send + Sync {
    /// True if `signature` over `data` was produced by the holder of `public_key`
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Signing capability used by submitters
pub trait Signer: Send + Sync {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Encoded public key that verifiers receive alongside the signature
    fn public_key_bytes(&self) -> Vec<u8>;
}

/// Key types supported by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
    Secp256k1,
}

impl KeyType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Secp256k1 => "secp256k1",
        }
    }
}

impl FromStr for KeyType {
    type Err = ChainmeshError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ed25519" => Ok(KeyType::Ed25519),
            "secp256k1" => Ok(KeyType::Secp256k1),
            other => Err(ChainmeshError::config(format!("unknown key type {other}"))),
        }
    }
}

/// Public key types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(ed25519_dalek::VerifyingKey),
    Secp256k1(k256::PublicKey),
}

impl PublicKey {
    /// Parse wire bytes: 32 bytes are Ed25519, 33 bytes a compressed secp256k1 point
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            32 => {
                let mut array = [0u8; 32];
                array.copy_from_slice(bytes);
                let key = ed25519_dalek::VerifyingKey::from_bytes(&array).map_err(|_| {
                    CryptoError::InvalidPublicKey {
                        reason: "Invalid Ed25519 key".to_string(),
                    }
                })?;
                Ok(PublicKey::Ed25519(key))
            },
            33 => {
                let key = k256::PublicKey::from_sec1_bytes(bytes).map_err(|_| {
                    CryptoError::InvalidPublicKey {
                        reason: "Invalid Secp256k1 key".to_string(),
                    }
                })?;
                Ok(PublicKey::Secp256k1(key))
            },
            n => Err(CryptoError::InvalidPublicKey {
                reason: format!("unsupported key length {n}"),
            }
            .into()),
        }
    }

    /// Get the key as bytes
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Ed25519(key) => key.as_bytes().to_vec(),
            PublicKey::Secp256k1(key) => key.to_sec1_bytes().to_vec(),
        }
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            PublicKey::Ed25519(_) => "Ed25519",
            PublicKey::Secp256k1(_) => "Secp256k1",
        }
    }

    /// Verify a raw 64-byte signature
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool> {
        match self {
            PublicKey::Ed25519(pk) => {
                let bytes: [u8; SIGNATURE_LEN] = signature
                    .try_into()
                    .map_err(|_| CryptoError::InvalidSignature)?;
                let sig = ed25519_dalek::Signature::from_bytes(&bytes);
                use ed25519_dalek::Verifier;
                Ok(pk.verify(message, &sig).is_ok())
            },
            PublicKey::Secp256k1(pk) => {
                let sig = k256::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::InvalidSignature)?;
                use k256::ecdsa::{signature::Verifier, VerifyingKey};
                let verifying_key = VerifyingKey::from(pk);
                Ok(verifying_key.verify(message, &sig).is_ok())
            },
        }
    }
}

/// Private key types
#[derive(Debug, Clone)]
pub enum PrivateKey {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::SecretKey),
}

impl PrivateKey {
    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
            PrivateKey::Secp256k1(key) => PublicKey::Secp256k1(key.public_key()),
        }
    }

    /// Create from hex string
    pub fn from_hex(hex_str: &str, key_type: KeyType) -> Result<Self> {
        let bytes = hex::decode(hex_str).map_err(|_| CryptoError::InvalidPrivateKey {
            reason: "Invalid hex encoding".to_string(),
        })?;

        match key_type {
            KeyType::Ed25519 => {
                let key_bytes: [u8; 32] =
                    bytes.try_into().map_err(|_| CryptoError::InvalidPrivateKey {
                        reason: "Invalid key length for Ed25519".to_string(),
                    })?;
                Ok(PrivateKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                    &key_bytes,
                )))
            },
            KeyType::Secp256k1 => {
                let key = k256::SecretKey::from_slice(&bytes).map_err(|_| {
                    CryptoError::InvalidPrivateKey {
                        reason: "Invalid Secp256k1 key".to_string(),
                    }
                })?;
                Ok(PrivateKey::Secp256k1(key))
            },
        }
    }

    /// Hex encoding of the secret scalar
    pub fn to_hex(&self) -> String {
        match self {
            PrivateKey::Ed25519(key) => hex::encode(key.to_bytes()),
            PrivateKey::Secp256k1(key) => hex::encode(key.to_bytes()),
        }
    }

    /// Produce a raw 64-byte signature
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            PrivateKey::Ed25519(key) => key.sign(message).to_bytes().to_vec(),
            PrivateKey::Secp256k1(key) => {
                use k256::ecdsa::{signature::Signer, SigningKey};
                let signing_key = SigningKey::from(key);
                let signature: k256::ecdsa::Signature = signing_key.sign(message);
                signature.to_bytes().to_vec()
            },
        }
    }
}

/// A private key with its cached public half
#[derive(Debug, Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair
    pub fn generate(key_type: KeyType) -> Self {
        let private_key = utils::generate_private_key(key_type);
        Self::from_private_key(private_key)
    }

    pub fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }
}

impl Signer for KeyPair {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.private_key.sign(data))
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.as_bytes()
    }
}

/// Verifier accepting every key type in [`PublicKey`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVerifier;

impl SignatureVerifier for DefaultVerifier {
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        if signature.len() != SIGNATURE_LEN {
            return false;
        }
        match PublicKey::from_bytes(public_key) {
            Ok(key) => key.verify(data, signature).unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Utility functions for cryptographic operations
pub mod utils {
    use super::*;
    use rand::rngs::OsRng;

    /// Generate a new private key for the specified key type
    pub fn generate_private_key(key_type: KeyType) -> PrivateKey {
        let mut rng = OsRng;
        match key_type {
            KeyType::Ed25519 => PrivateKey::Ed25519(ed25519_dalek::SigningKey::generate(&mut rng)),
            KeyType::Secp256k1 => PrivateKey::Secp256k1(k256::SecretKey::random(&mut rng)),
        }
    }
}
