// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;

use crate::algorithm::Algorithm;
use crate::crypto;
use crate::errors::JwtError;
use crate::expiration::{Expiration, current_timestamp};
use crate::key::SigningKey;
use crate::token::{Claims, Header, encode_segment};

/// Issues signed tokens with a fixed algorithm and key.
#[derive(Debug, Clone)]
pub struct Encoder {
    algorithm: Algorithm,
    key: SigningKey,
    expiration: Option<Expiration>,
}

impl Encoder {
    /// Create an encoder for the named algorithm.
    ///
    /// Fails with [`JwtError::AlgorithmNotSupported`] if the name is not one
    /// of the supported algorithms.
    pub fn new(algorithm: &str, key: impl Into<SigningKey>) -> Result<Self, JwtError> {
        Ok(Encoder::with_algorithm(algorithm.parse()?, key))
    }

    pub fn with_algorithm(algorithm: Algorithm, key: impl Into<SigningKey>) -> Self {
        Encoder {
            algorithm,
            key: key.into(),
            expiration: None,
        }
    }

    /// Set the `exp` claim of every issued token from `expiration`.
    pub fn with_expiration(self, expiration: Expiration) -> Self {
        Encoder {
            expiration: Some(expiration),
            ..self
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key.key_id.as_deref()
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        self.encode_at(claims, current_timestamp()?)
    }

    /// Encode as if the current time was `now` (seconds since UNIX epoch).
    pub fn encode_at(&self, claims: &Claims, now: i64) -> Result<String, JwtError> {
        let claims = match self.expiration {
            Some(expiration) => {
                let mut claims = claims.clone();
                claims.insert("exp".to_string(), expiration.deadline(now)?.into());
                Cow::Owned(claims)
            }
            None => Cow::Borrowed(claims),
        };

        let header = Header::new(self.algorithm, self.key.key_id.clone());
        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&*claims)?);

        let signature = crypto::sign(self.algorithm, signing_input.as_bytes(), &self.key.key)?;

        tracing::trace!(algorithm = %self.algorithm, kid = ?self.key.key_id, "token encoded");

        Ok(format!("{}.{}", signing_input, signature))
    }
}

/// Encode and sign `claims` with the named algorithm.
pub fn encode(
    algorithm: &str,
    claims: &Claims,
    key: impl Into<SigningKey>,
) -> Result<String, JwtError> {
    Encoder::new(algorithm, key)?.encode(claims)
}

/// Encode and sign `claims`, setting `exp` from `expiration`.
pub fn encode_with_expiration(
    algorithm: &str,
    claims: &Claims,
    expiration: Expiration,
    key: impl Into<SigningKey>,
) -> Result<String, JwtError> {
    Encoder::new(algorithm, key)?
        .with_expiration(expiration)
        .encode(claims)
}
