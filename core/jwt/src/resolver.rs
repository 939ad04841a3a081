// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::{Jwk, JwkSet};

use crate::errors::JwtError;
use crate::key::Key;

/// Resolves the key a token was signed with from a JWKS, given its key ID.
///
/// The decoder consults the resolver only when the token header carries a
/// `kid` and a JWKS is available. Errors are returned to the caller of
/// `decode` unchanged.
pub trait JwksResolver: Send + Sync {
    fn resolve_key(&self, key_id: &str, jwks: &JwkSet) -> Result<Key, JwtError>;
}

/// Default resolver: looks the key ID up in the in-memory key set.
///
/// Example usage:
///
/// ```
/// use slim_jwt::resolver::{JwkSetResolver, JwksResolver};
///
/// let jwks = serde_json::from_str(
///     r#"{"keys":[{"kty":"oct","kid":"k1","k":"c2VjcmV0"}]}"#,
/// ).unwrap();
///
/// let key = JwkSetResolver.resolve_key("k1", &jwks).unwrap();
/// assert!(JwkSetResolver.resolve_key("k2", &jwks).is_err());
/// # let _ = key;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JwkSetResolver;

impl JwkSetResolver {
    /// Make sure the JWK can be turned into a verification key
    fn check_jwk(&self, jwk: &Jwk) -> Result<(), JwtError> {
        DecodingKey::from_jwk(jwk).map(|_| ()).map_err(|e| {
            JwtError::KeyResolution(format!(
                "failed to create {:?} decoding key from JWK: {}",
                jwk.common.key_algorithm, e
            ))
        })
    }
}

impl JwksResolver for JwkSetResolver {
    fn resolve_key(&self, key_id: &str, jwks: &JwkSet) -> Result<Key, JwtError> {
        for jwk in &jwks.keys {
            if jwk.common.key_id.as_deref() == Some(key_id) {
                self.check_jwk(jwk)?;
                return Ok(Key::from(jwk.clone()));
            }
        }

        Err(JwtError::KeyNotFound {
            kid: key_id.to_string(),
        })
    }
}
