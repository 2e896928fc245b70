//! Signed payloads carried by `A` and `N` messages
//!
//! Layout: `K`-framed public key sub-message, then a 64-byte signature, then the raw data.

use crate::crypto::{SignatureVerifier, Signer, SIGNATURE_LEN};
use crate::error::{ChainmeshError, Result};
use crate::message::{Message, MessageType};

/// A payload together with the key and signature that vouch for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSubmission {
    public_key: Vec<u8>,
    signature: Vec<u8>,
    data: Vec<u8>,
}

impl SignedSubmission {
    pub fn new(public_key: Vec<u8>, signature: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            public_key,
            signature,
            data,
        }
    }

    /// Sign `data` with `signer`
    pub fn sign(signer: &dyn Signer, data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let signature = signer.sign(&data)?;
        Ok(Self::new(signer.public_key_bytes(), signature, data))
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn verify(&self, verifier: &dyn SignatureVerifier) -> bool {
        verifier.verify(&self.data, &self.signature, &self.public_key)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Message::new(MessageType::PublicKey, self.public_key.clone()).pack();
        buf.extend_from_slice(&self.signature);
        buf.extend_from_slice(&self.data);
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (key_msg, rest) = Message::unpack(payload)?;
        if key_msg.kind() != Some(MessageType::PublicKey) {
            return Err(ChainmeshError::malformed(format!(
                "expected public key sub-message, got tag {:?}",
                key_msg.tag() as char
            )));
        }
        if rest.len() < SIGNATURE_LEN {
            return Err(ChainmeshError::malformed(format!(
                "signature needs {SIGNATURE_LEN} bytes, got {}",
                rest.len()
            )));
        }
        let (signature, data) = rest.split_at(SIGNATURE_LEN);
        Ok(Self::new(
            key_msg.into_payload(),
            signature.to_vec(),
            data.to_vec(),
        ))
    }

    /// Wrap as an application submission (`A`)
    pub fn to_app_message(&self) -> Message {
        Message::new(MessageType::AppBlock, self.encode())
    }
}
