// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JwtError {
    // Token structure
    #[error("invalid token: {0}")]
    InvalidToken(String),

    // Signing / verification
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("algorithm not supported: {0}")]
    AlgorithmNotSupported(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),

    // Key resolution
    #[error("key with ID {kid} not found in JWKS")]
    KeyNotFound { kid: String },
    #[error("key resolution error: {0}")]
    KeyResolution(String),
    #[error("no key available to verify token")]
    NoKey,

    // Claims
    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    // Configuration / generic
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        source: std::io::Error,
    },

    // Time
    #[error("time error: {0}")]
    TimeError(#[from] std::time::SystemTimeError),
    #[error("timestamp out of range: {0}")]
    TimestampRange(#[from] std::num::TryFromIntError),

    // Serialization
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl JwtError {
    /// Short machine readable tag for the error kind.
    pub fn reason(&self) -> &'static str {
        match self {
            JwtError::InvalidToken(_) => "invalid_token",
            JwtError::InvalidSignature => "invalid_signature",
            JwtError::Expired => "expired",
            JwtError::AlgorithmNotSupported(_) => "algorithm_not_supported",
            JwtError::InvalidKey(_) => "invalid_key",
            JwtError::KeyNotFound { .. } => "key_not_found",
            JwtError::KeyResolution(_) => "key_resolution",
            JwtError::NoKey => "no_key",
            JwtError::InvalidClaims(_) => "invalid_claims",
            JwtError::ConfigError(_) | JwtError::KeyFile { .. } => "config_error",
            JwtError::TimeError(_) | JwtError::TimestampRange(_) => "time_error",
            JwtError::JsonError(_) => "json_error",
        }
    }
}
