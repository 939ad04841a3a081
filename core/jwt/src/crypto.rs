// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Dispatch from an [`Algorithm`] and a [`Key`] to the signature primitives.

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::algorithm::{Algorithm, Family};
use crate::errors::JwtError;
use crate::key::Key;

/// Signs `payload` and returns the base64url encoded signature.
pub(crate) fn sign(algorithm: Algorithm, payload: &[u8], key: &Key) -> Result<String, JwtError> {
    let encoding_key = encoding_key(algorithm, key)?;

    jsonwebtoken::crypto::sign(payload, &encoding_key, algorithm.primitive())
        .map_err(|e| JwtError::InvalidKey(format!("{} signing failed: {}", algorithm, e)))
}

/// Checks `signature` (base64url, as found in the token) over `payload`.
///
/// Never fails: a key that does not fit the algorithm, malformed key
/// material or a malformed signature all count as a mismatch.
pub(crate) fn verify(algorithm: Algorithm, payload: &[u8], signature: &str, key: &Key) -> bool {
    let Some(decoding_key) = decoding_key(algorithm, key) else {
        tracing::debug!(%algorithm, "key does not fit algorithm family");
        return false;
    };

    match jsonwebtoken::crypto::verify(signature, payload, &decoding_key, algorithm.primitive()) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!(%algorithm, error = %e, "signature primitive rejected input");
            false
        }
    }
}

fn encoding_key(algorithm: Algorithm, key: &Key) -> Result<EncodingKey, JwtError> {
    let invalid = |e: jsonwebtoken::errors::Error| {
        JwtError::InvalidKey(format!("failed to load {} key: {}", algorithm, e))
    };

    match (algorithm.family(), key) {
        (Family::Hmac, Key::Secret(secret)) => Ok(EncodingKey::from_secret(secret)),
        (Family::Rsa, Key::Pem(pem)) => EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(invalid),
        (Family::Rsa, Key::Der(der)) => Ok(EncodingKey::from_rsa_der(der)),
        (Family::Ecdsa, Key::Pem(pem)) => {
            EncodingKey::from_ec_pem(pem.as_bytes()).map_err(invalid)
        }
        (Family::Ecdsa, Key::Der(der)) => Ok(EncodingKey::from_ec_der(der)),
        _ => Err(JwtError::AlgorithmNotSupported(format!(
            "{} cannot sign with the provided key",
            algorithm
        ))),
    }
}

fn decoding_key(algorithm: Algorithm, key: &Key) -> Option<DecodingKey> {
    match (algorithm.family(), key) {
        (Family::Hmac, Key::Secret(secret)) => Some(DecodingKey::from_secret(secret)),
        (Family::Rsa, Key::Pem(pem)) => DecodingKey::from_rsa_pem(pem.as_bytes()).ok(),
        (Family::Rsa, Key::Der(der)) => Some(DecodingKey::from_rsa_der(der)),
        (Family::Ecdsa, Key::Pem(pem)) => DecodingKey::from_ec_pem(pem.as_bytes()).ok(),
        (Family::Ecdsa, Key::Der(der)) => Some(DecodingKey::from_ec_der(der)),
        (family, Key::Jwk(jwk)) if jwk_family(jwk) == Some(family) => {
            DecodingKey::from_jwk(jwk).ok()
        }
        _ => None,
    }
}

/// Family a JWK can verify for, judged by its key type.
pub(crate) fn jwk_family(jwk: &Jwk) -> Option<Family> {
    match &jwk.algorithm {
        AlgorithmParameters::OctetKey(_) => Some(Family::Hmac),
        AlgorithmParameters::RSA(_) => Some(Family::Rsa),
        AlgorithmParameters::EllipticCurve(_) => Some(Family::Ecdsa),
        AlgorithmParameters::OctetKeyPair(_) => None,
    }
}
