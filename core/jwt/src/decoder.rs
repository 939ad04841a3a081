// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Token verification.
//!
//! Decoding runs a fixed sequence of stages over a [`DecodeContext`]:
//!
//! ```text
//! Split -> Parse -> ResolveKey -> Verify -> CheckExpiry -> Done
//! ```
//!
//! Each stage either returns the context, augmented with what it learned, or
//! halts the whole decode with an error. Stages never run out of order and
//! are never retried.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use jsonwebtoken::jwk::JwkSet;

use crate::algorithm::Algorithm;
use crate::crypto;
use crate::errors::JwtError;
use crate::expiration::current_timestamp;
use crate::key::{IssuerKeys, Key, KeySource};
use crate::resolver::{JwkSetResolver, JwksResolver};
use crate::token::{Claims, Header, Segments, decode_segment};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Split,
    Parse,
    ResolveKey,
    Verify,
    CheckExpiry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Split => "split",
            Stage::Parse => "parse",
            Stage::ResolveKey => "resolve_key",
            Stage::Verify => "verify",
            Stage::CheckExpiry => "check_expiry",
        };
        f.write_str(name)
    }
}

/// State accumulated while decoding a single token.
#[derive(Debug)]
struct DecodeContext<'a> {
    token: &'a str,
    now: i64,
    segments: Option<Segments<'a>>,
    header: Option<Header>,
    claims: Option<Claims>,
    key: Option<Cow<'a, Key>>,
}

impl<'a> DecodeContext<'a> {
    fn new(token: &'a str, now: i64) -> Self {
        DecodeContext {
            token,
            now,
            segments: None,
            header: None,
            claims: None,
            key: None,
        }
    }

    fn segments(&self) -> Result<Segments<'a>, JwtError> {
        self.segments
            .ok_or_else(|| JwtError::InvalidToken("token was not split".to_string()))
    }

    fn header(&self) -> Result<&Header, JwtError> {
        self.header
            .as_ref()
            .ok_or_else(|| JwtError::InvalidToken("header was not parsed".to_string()))
    }

    fn claims(&self) -> Result<&Claims, JwtError> {
        self.claims
            .as_ref()
            .ok_or_else(|| JwtError::InvalidToken("claims were not parsed".to_string()))
    }
}

type Step = for<'a> fn(&'a Decoder, DecodeContext<'a>) -> Result<DecodeContext<'a>, JwtError>;

const PIPELINE: [(Stage, Step); 5] = [
    (Stage::Split, Decoder::split),
    (Stage::Parse, Decoder::parse),
    (Stage::ResolveKey, Decoder::resolve_key),
    (Stage::Verify, Decoder::verify_signature),
    (Stage::CheckExpiry, Decoder::check_expiration),
];

/// Verifies tokens against a default key, a JWKS and/or per-issuer keys.
///
/// Key resolution order for each token:
///
/// 1. if the header has a `kid` and a JWKS is available (configured with
///    [`Decoder::with_jwks`], or a default key whose bytes are a JWKS
///    document), the key is resolved from the JWKS and any resolution error
///    is final;
/// 2. otherwise the `iss` claim is looked up in the issuer keys;
/// 3. otherwise the default key is used.
///
/// ```
/// use slim_jwt::{Decoder, Encoder, Key};
///
/// let encoder = Encoder::new("HS256", Key::secret("secret-key")).unwrap();
/// let mut claims = slim_jwt::Claims::new();
/// claims.insert("sub".to_string(), "user-123".into());
///
/// let token = encoder.encode(&claims).unwrap();
/// let decoded = Decoder::new(Key::secret("secret-key")).decode(&token).unwrap();
/// assert_eq!(decoded, claims);
/// ```
#[derive(Clone)]
pub struct Decoder {
    default_key: Option<Key>,
    jwks: Option<JwkSet>,
    issuer_keys: IssuerKeys,
    resolver: Arc<dyn JwksResolver>,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder {
            default_key: None,
            jwks: None,
            issuer_keys: IssuerKeys::new(),
            resolver: Arc::new(JwkSetResolver),
        }
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("default_key", &self.default_key.is_some())
            .field("jwks", &self.jwks.as_ref().map(|jwks| jwks.keys.len()))
            .field("issuers", &self.issuer_keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Decoder {
    pub fn new(source: impl Into<KeySource>) -> Self {
        match source.into() {
            KeySource::Key(key) => Decoder::default().with_default_key(key),
            KeySource::Jwks(jwks) => Decoder::default().with_jwks(jwks),
            KeySource::Issuers(issuer_keys) => Decoder::default().with_issuer_keys(issuer_keys),
        }
    }

    /// Key used when neither the JWKS nor the issuer keys apply.
    pub fn with_default_key(self, key: Key) -> Self {
        Decoder {
            default_key: Some(key),
            ..self
        }
    }

    /// Key set consulted for tokens that carry a `kid` header.
    pub fn with_jwks(self, jwks: JwkSet) -> Self {
        Decoder {
            jwks: Some(jwks),
            ..self
        }
    }

    /// Add keys per issuer, replacing existing entries for the same issuer.
    pub fn with_issuer_keys(mut self, issuer_keys: IssuerKeys) -> Self {
        self.issuer_keys.extend(issuer_keys);
        self
    }

    pub fn with_issuer_key(mut self, issuer: impl Into<String>, key: Key) -> Self {
        self.issuer_keys.insert(issuer.into(), key);
        self
    }

    /// Replace the collaborator used to pick a key out of the JWKS.
    pub fn with_jwks_resolver(self, resolver: impl JwksResolver + 'static) -> Self {
        Decoder {
            resolver: Arc::new(resolver),
            ..self
        }
    }

    /// Verify `token` and return its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        self.decode_at(token, current_timestamp()?)
    }

    /// Verify `token` as if the current time was `now` (seconds since UNIX epoch).
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, JwtError> {
        let context = PIPELINE
            .iter()
            .try_fold(DecodeContext::new(token, now), |context, (stage, step)| {
                tracing::trace!(%stage, "running decode stage");
                step(self, context).inspect_err(|e| {
                    tracing::debug!(%stage, reason = e.reason(), "token rejected");
                })
            })?;

        context.claims.ok_or_else(|| {
            JwtError::InvalidToken("claims missing after decode".to_string())
        })
    }

    fn split<'a>(&'a self, mut context: DecodeContext<'a>) -> Result<DecodeContext<'a>, JwtError> {
        context.segments = Some(Segments::split(context.token)?);
        Ok(context)
    }

    fn parse<'a>(&'a self, mut context: DecodeContext<'a>) -> Result<DecodeContext<'a>, JwtError> {
        let segments = context.segments()?;
        context.header = Some(decode_segment(segments.header, "header")?);
        context.claims = Some(decode_segment(segments.claims, "claims")?);
        Ok(context)
    }

    fn resolve_key<'a>(
        &'a self,
        mut context: DecodeContext<'a>,
    ) -> Result<DecodeContext<'a>, JwtError> {
        let key = {
            let header = context.header()?;
            let claims = context.claims()?;
            self.key_for(header, claims)?
        };

        context.key = Some(key);
        Ok(context)
    }

    fn key_for(&self, header: &Header, claims: &Claims) -> Result<Cow<'_, Key>, JwtError> {
        // Key ID based resolution takes precedence when a JWKS is at hand
        if let Some(kid) = header.kid.as_deref() {
            if let Some(jwks) = &self.jwks {
                return self.resolver.resolve_key(kid, jwks).map(Cow::Owned);
            }

            if let Some(jwks) = self.default_key.as_ref().and_then(Key::as_jwks) {
                return self.resolver.resolve_key(kid, &jwks).map(Cow::Owned);
            }

            tracing::debug!("token has a key ID but no JWKS is configured");
        }

        let issuer_key = claims
            .get("iss")
            .and_then(|iss| iss.as_str())
            .and_then(|iss| self.issuer_keys.get(iss));

        issuer_key
            .or(self.default_key.as_ref())
            .map(Cow::Borrowed)
            .ok_or(JwtError::NoKey)
    }

    fn verify_signature<'a>(
        &'a self,
        context: DecodeContext<'a>,
    ) -> Result<DecodeContext<'a>, JwtError> {
        let segments = context.segments()?;
        let header = context.header()?;
        let key = context.key.as_deref().ok_or(JwtError::NoKey)?;

        // An algorithm outside the registry can never verify
        let valid = match header.alg.parse::<Algorithm>() {
            Ok(algorithm) => crypto::verify(
                algorithm,
                segments.signing_input().as_bytes(),
                segments.signature,
                key,
            ),
            Err(_) => false,
        };

        if !valid {
            return Err(JwtError::InvalidSignature);
        }

        Ok(context)
    }

    fn check_expiration<'a>(
        &'a self,
        context: DecodeContext<'a>,
    ) -> Result<DecodeContext<'a>, JwtError> {
        let exp = context
            .claims()?
            .get("exp")
            .map(expiration_time)
            .transpose()?;

        // Tokens without exp never expire
        if let Some(exp) = exp {
            if exp <= context.now {
                return Err(JwtError::Expired);
            }
        }

        Ok(context)
    }
}

fn expiration_time(exp: &serde_json::Value) -> Result<i64, JwtError> {
    exp.as_i64()
        .or_else(|| exp.as_f64().map(|exp| exp.floor() as i64))
        .ok_or_else(|| JwtError::InvalidToken("exp claim is not a number".to_string()))
}

/// Verify `token` with a single key source.
pub fn decode(token: &str, source: impl Into<KeySource>) -> Result<Claims, JwtError> {
    Decoder::new(source).decode(token)
}

/// Verify `token` with a key source plus keys per issuer.
pub fn decode_with_issuers(
    token: &str,
    source: impl Into<KeySource>,
    issuer_keys: IssuerKeys,
) -> Result<Claims, JwtError> {
    Decoder::new(source)
        .with_issuer_keys(issuer_keys)
        .decode(token)
}
