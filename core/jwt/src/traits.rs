// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Typed signing and verification on top of [`Encoder`] and [`Decoder`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::errors::JwtError;
use crate::token::Claims;

/// Standard JWT Claims structure that includes the registered claims
/// as specified in RFC 7519.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StandardClaims {
    /// Issuer (who issued the JWT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (whom the JWT is about)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience (who the JWT is intended for)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiration time (when the JWT expires)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (when the JWT was issued)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// JWT ID (unique identifier for this JWT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Not before (when the JWT starts being valid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    // Additional custom claims can be added by the user
    #[serde(flatten)]
    pub custom_claims: HashMap<String, serde_json::Value>,
}

/// Trait for signing JWT claims
pub trait Signer {
    /// Signs the claims and returns a JWT token.
    ///
    /// The claims must serialize to a JSON object.
    fn sign<C>(&self, claims: &C) -> Result<String, JwtError>
    where
        C: Serialize;
}

/// Trait for verifying JWT tokens
pub trait Verifier {
    /// Verifies the JWT token and returns the claims if valid.
    ///
    /// The `C` type parameter represents the expected structure of the JWT claims.
    fn verify<C>(&self, token: &str) -> Result<C, JwtError>
    where
        C: DeserializeOwned;
}

impl Signer for Encoder {
    fn sign<C>(&self, claims: &C) -> Result<String, JwtError>
    where
        C: Serialize,
    {
        match serde_json::to_value(claims)? {
            serde_json::Value::Object(claims) => self.encode(&claims),
            other => Err(JwtError::InvalidClaims(format!(
                "claims must be a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }
}

impl Verifier for Decoder {
    fn verify<C>(&self, token: &str) -> Result<C, JwtError>
    where
        C: DeserializeOwned,
    {
        let claims: Claims = self.decode(token)?;
        serde_json::from_value(serde_json::Value::Object(claims))
            .map_err(|e| JwtError::InvalidClaims(e.to_string()))
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
