// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Token wire format: `base64url(header).base64url(claims).signature`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::errors::JwtError;

/// Claims payload of a token.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Value of the `typ` header.
pub const TOKEN_TYPE: &str = "JWT";

/// Nonce length (raw bytes) before hex encoding.
const NONCE_LEN: usize = 16;

/// JOSE header of a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Algorithm name. Kept as text so that tokens carrying an unknown
    /// algorithm still parse and fail at signature verification.
    pub alg: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Key ID, used to pick the key out of a JWKS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Random per-token value, not validated on decode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Header {
    /// Header for a freshly encoded token, with a new random nonce.
    pub(crate) fn new(algorithm: Algorithm, kid: Option<String>) -> Self {
        let nonce: [u8; NONCE_LEN] = rand::random();

        Header {
            alg: algorithm.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
            kid,
            nonce: Some(hex::encode(nonce)),
        }
    }
}

/// Raw segments of a token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segments<'a> {
    pub header: &'a str,
    pub claims: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    pub fn split(token: &'a str) -> Result<Self, JwtError> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(header), Some(claims), Some(signature), None) => Ok(Segments {
                header,
                claims,
                signature,
            }),
            _ => Err(JwtError::InvalidToken(format!(
                "expected 3 segments, found {}",
                token.split('.').count()
            ))),
        }
    }

    /// The signed part of the token, `header.claims`.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.header, self.claims)
    }
}

pub(crate) fn encode_segment<T: Serialize>(value: &T) -> Result<String, JwtError> {
    let json = serde_json::to_vec(value)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub(crate) fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, JwtError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| JwtError::InvalidToken(format!("{} is not valid base64url: {}", what, e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| JwtError::InvalidToken(format!("{} is not a valid JSON object: {}", what, e)))
}

/// Parses the header of a token without verifying it.
///
/// Useful to route a token on its `kid` or `alg` before choosing how to
/// verify it. Nothing in the returned header can be trusted.
pub fn decode_header(token: &str) -> Result<Header, JwtError> {
    let segments = Segments::split(token)?;
    decode_segment(segments.header, "header")
}
