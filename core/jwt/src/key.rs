// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use jsonwebtoken::jwk::{Jwk, JwkSet};

/// Key material used to sign or verify a token.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Raw HMAC secret
    Secret(Vec<u8>),
    /// PEM encoded RSA or EC key (private for signing, public for verifying)
    Pem(String),
    /// DER encoded RSA or EC key material
    Der(Vec<u8>),
    /// Key extracted from a JWKS
    Jwk(Box<Jwk>),
}

impl Key {
    pub fn secret(secret: impl AsRef<[u8]>) -> Self {
        Key::Secret(secret.as_ref().to_vec())
    }

    pub fn pem(pem: impl Into<String>) -> Self {
        Key::Pem(pem.into())
    }

    pub fn der(der: impl Into<Vec<u8>>) -> Self {
        Key::Der(der.into())
    }

    /// Tag the key with a key identifier, placed in the `kid` header on encode.
    pub fn with_key_id(self, key_id: impl Into<String>) -> SigningKey {
        SigningKey {
            key_id: Some(key_id.into()),
            key: self,
        }
    }

    /// Interpret the key bytes as a JWKS document, if they are one.
    pub(crate) fn as_jwks(&self) -> Option<JwkSet> {
        let bytes = match self {
            Key::Secret(bytes) => bytes.as_slice(),
            Key::Pem(text) => text.as_bytes(),
            Key::Der(_) | Key::Jwk(_) => return None,
        };

        serde_json::from_slice(bytes).ok()
    }
}

impl From<Jwk> for Key {
    fn from(jwk: Jwk) -> Self {
        Key::Jwk(Box::new(jwk))
    }
}

/// A key with an optional key identifier, used for signing.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningKey {
    pub key_id: Option<String>,
    pub key: Key,
}

impl From<Key> for SigningKey {
    fn from(key: Key) -> Self {
        SigningKey { key_id: None, key }
    }
}

impl From<(String, Key)> for SigningKey {
    fn from((key_id, key): (String, Key)) -> Self {
        SigningKey {
            key_id: Some(key_id),
            key,
        }
    }
}

/// Mapping from issuer (`iss` claim) to verification key.
pub type IssuerKeys = HashMap<String, Key>;

/// Where the decoder looks for verification keys.
#[derive(Debug, Clone, PartialEq)]
pub enum KeySource {
    /// A single default key
    Key(Key),
    /// A key set, consulted by the `kid` header
    Jwks(JwkSet),
    /// Keys per issuer, with no default
    Issuers(IssuerKeys),
}

impl From<Key> for KeySource {
    fn from(key: Key) -> Self {
        KeySource::Key(key)
    }
}

impl From<JwkSet> for KeySource {
    fn from(jwks: JwkSet) -> Self {
        KeySource::Jwks(jwks)
    }
}

impl From<IssuerKeys> for KeySource {
    fn from(issuers: IssuerKeys) -> Self {
        KeySource::Issuers(issuers)
    }
}
