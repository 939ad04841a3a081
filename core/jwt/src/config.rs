// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Serde-deserializable encoder and decoder settings.
//!
//! ```yaml
//! algorithm: RS256
//! key_id: signing-key-1
//! key:
//!   file: /etc/jwt/private.pem
//! expiration:
//!   hourly: 1800
//! ```

use std::collections::HashMap;

use jsonwebtoken::jwk::JwkSet;
use serde::Deserialize;

use crate::algorithm::Algorithm;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::errors::JwtError;
use crate::expiration::Expiration;
use crate::key::{Key, SigningKey};

const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// Enum representing key data types
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum KeyData {
    /// HMAC secret
    Secret(String),
    /// PEM encoded key
    Pem(String),
    /// File path to the key. PEM if the content starts with `-----BEGIN`,
    /// otherwise the raw content is used as a secret.
    File(String),
}

impl KeyData {
    pub fn load(&self) -> Result<Key, JwtError> {
        match self {
            KeyData::Secret(secret) => Ok(Key::secret(secret)),
            KeyData::Pem(pem) => Ok(Key::pem(pem.as_str())),
            KeyData::File(path) => {
                let content = read_file(path)?;
                if content.starts_with(PEM_PREFIX) {
                    let pem = String::from_utf8(content)
                        .map_err(|e| JwtError::InvalidKey(format!("{}: {}", path, e)))?;
                    Ok(Key::Pem(pem))
                } else {
                    Ok(Key::Secret(content))
                }
            }
        }
    }
}

/// Source of a JSON Web Key Set
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum JwksData {
    Inline(JwkSet),
    File(String),
}

impl JwksData {
    pub fn load(&self) -> Result<JwkSet, JwtError> {
        match self {
            JwksData::Inline(jwks) => Ok(jwks.clone()),
            JwksData::File(path) => serde_json::from_slice(&read_file(path)?).map_err(|e| {
                JwtError::ConfigError(format!("{} is not a valid JWKS document: {}", path, e))
            }),
        }
    }
}

fn read_file(path: &str) -> Result<Vec<u8>, JwtError> {
    std::fs::read(path).map_err(|source| JwtError::KeyFile {
        path: path.to_string(),
        source,
    })
}

/// Settings for an [`Encoder`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SignerConfig {
    /// Algorithm used for signing the JWT
    pub algorithm: Algorithm,

    /// Placed in the `kid` header of issued tokens
    #[serde(default)]
    pub key_id: Option<String>,

    #[serde(with = "serde_yaml::with::singleton_map")]
    pub key: KeyData,

    /// One of `seconds`, `hourly` or `daily`
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub expiration: Option<Expiration>,
}

impl SignerConfig {
    pub fn new(algorithm: Algorithm, key: KeyData) -> Self {
        SignerConfig {
            algorithm,
            key_id: None,
            key,
            expiration: None,
        }
    }

    pub fn with_key_id(self, key_id: impl Into<String>) -> Self {
        SignerConfig {
            key_id: Some(key_id.into()),
            ..self
        }
    }

    pub fn with_expiration(self, expiration: Expiration) -> Self {
        SignerConfig {
            expiration: Some(expiration),
            ..self
        }
    }

    /// Load the key and create the encoder.
    pub fn build(&self) -> Result<Encoder, JwtError> {
        let key = self.key.load()?;
        let key = match &self.key_id {
            Some(key_id) => key.with_key_id(key_id.clone()),
            None => SigningKey::from(key),
        };

        let encoder = Encoder::with_algorithm(self.algorithm, key);

        tracing::debug!(algorithm = %self.algorithm, kid = ?self.key_id, "encoder configured");

        Ok(match self.expiration {
            Some(expiration) => encoder.with_expiration(expiration),
            None => encoder,
        })
    }
}

/// Settings for a [`Decoder`]. At least one source of keys is required.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct VerifierConfig {
    /// Default verification key
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub key: Option<KeyData>,

    /// Key set for tokens carrying a `kid`
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub jwks: Option<JwksData>,

    /// Verification keys per issuer
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub issuers: HashMap<String, KeyData>,
}

impl VerifierConfig {
    pub fn build(&self) -> Result<Decoder, JwtError> {
        if self.key.is_none() && self.jwks.is_none() && self.issuers.is_empty() {
            return Err(JwtError::ConfigError(
                "at least one of key, jwks or issuers must be set".to_string(),
            ));
        }

        let mut decoder = Decoder::default();

        if let Some(key) = &self.key {
            decoder = decoder.with_default_key(key.load()?);
        }

        if let Some(jwks) = &self.jwks {
            decoder = decoder.with_jwks(jwks.load()?);
        }

        for (issuer, key) in &self.issuers {
            decoder = decoder.with_issuer_key(issuer.clone(), key.load()?);
        }

        tracing::debug!(?decoder, "decoder configured");

        Ok(decoder)
    }
}
