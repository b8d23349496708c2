// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Post-Quantum Signer.
//!
//! ML-DSA-65 (FIPS 204) keypair generated once from the determinism
//! context. Signing is deterministic: the same key and message always
//! produce the same signature. The private key never leaves this module;
//! only the encoded public key is exported.
//!
//! Reproducible key material is a testing convenience. A deployment must
//! not reuse the deterministic seed for production keys.

use core::fmt;

use ml_dsa::{
    EncodedSignature, EncodedVerifyingKey, KeyGen, KeyPair, MlDsa65, VerifyingKey, B32,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, error, info};

use crate::config::SIGNING_CONTEXT;
use crate::determinism::DeterminismContext;
use crate::digest::{digest, Digest};
use crate::error::{KernelError, KernelResult};

/// Encoded ML-DSA-65 verifying key length.
pub const PUBLIC_KEY_LEN: usize = 1952;

/// Encoded ML-DSA-65 signature length.
pub const SIGNATURE_LEN: usize = 3309;

const SELF_TEST_MESSAGE: &[u8] = b"triad-kernel key self-test";

/// Encoded ML-DSA-65 signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        hex::decode(s).ok().map(Self)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes, {})", self.0.len(), digest(&self.0))
    }
}

/// Encoded ML-DSA-65 verifying key, safe to hand to external verifiers.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Length-checked import of an encoded verifying key.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        (bytes.len() == PUBLIC_KEY_LEN).then(|| Self(bytes.to_vec()))
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        Self::from_bytes(&hex::decode(s).ok()?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn fingerprint(&self) -> Digest {
        digest(&self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

macro_rules! hex_serde {
    ($ty:ty, $ctor:expr, $what:literal) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $ctor(&s).ok_or_else(|| serde::de::Error::custom(concat!("invalid ", $what)))
            }
        }
    };
}

hex_serde!(Signature, Signature::from_hex, "signature hex");
hex_serde!(PublicKey, PublicKey::from_hex, "public key hex");

/// Holds the kernel's signing keypair for the process lifetime.
pub struct PqSigner {
    keypair: Box<KeyPair<MlDsa65>>,
    public_key: PublicKey,
    fingerprint: Digest,
}

impl PqSigner {
    /// Generates the keypair from the context and runs a sign/verify self-test.
    pub fn new(ctx: &DeterminismContext) -> KernelResult<Self> {
        let seed = ctx.signing_seed();
        let xi = B32::from(*seed);
        let keypair = Box::new(MlDsa65::key_gen_internal(&xi));

        let public_key = PublicKey(keypair.verifying_key().encode().to_vec());
        let fingerprint = public_key.fingerprint();
        let signer = Self {
            keypair,
            public_key,
            fingerprint,
        };

        let self_test = signer.sign(SELF_TEST_MESSAGE)?;
        if !verify(SELF_TEST_MESSAGE, &self_test, &signer.public_key) {
            error!("signing key failed its self-test");
            return Err(KernelError::KeyMaterialFault(
                "self-test signature did not verify".into(),
            ));
        }

        info!(public_key = %fingerprint, "signing key ready");
        Ok(signer)
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs `message`. Refuses to sign when the key no longer matches the
    /// fingerprint recorded at construction.
    pub fn sign(&self, message: &[u8]) -> KernelResult<Signature> {
        let current = digest(&self.keypair.verifying_key().encode());
        if current != self.fingerprint {
            error!(expected = %self.fingerprint, found = %current, "key material changed");
            return Err(KernelError::KeyMaterialFault(
                "verifying key fingerprint mismatch".into(),
            ));
        }

        let signature = self
            .keypair
            .signing_key()
            .sign_deterministic(message, SIGNING_CONTEXT)
            .map_err(|e| KernelError::KeyMaterialFault(format!("signing failed: {e}")))?;

        debug!(message_len = message.len(), "signed message");
        Ok(Signature(signature.encode().to_vec()))
    }

    /// Replaces the recorded fingerprint so the next `sign` sees key drift.
    #[cfg(test)]
    pub(crate) fn corrupt_fingerprint(&mut self) {
        self.fingerprint = digest(b"not the verifying key");
    }
}

impl fmt::Debug for PqSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PqSigner")
            .field("public_key", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Verifies a kernel signature against an exported public key.
/// Malformed signatures or keys simply fail.
pub fn verify(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(encoded_key) = EncodedVerifyingKey::<MlDsa65>::try_from(public_key.as_bytes()) else {
        return false;
    };
    let Ok(encoded_sig) = EncodedSignature::<MlDsa65>::try_from(signature.as_bytes()) else {
        return false;
    };
    let Some(sig) = ml_dsa::Signature::<MlDsa65>::decode(&encoded_sig) else {
        return false;
    };
    let key = VerifyingKey::<MlDsa65>::decode(&encoded_key);
    key.verify_with_context(message, SIGNING_CONTEXT, &sig)
}
