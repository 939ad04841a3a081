// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Signing and verification of JSON Web Tokens.
//!
//! Tokens are signed with HMAC (`HS256`, `HS384`, `HS512`), RSA PKCS#1 v1.5
//! (`RS256`, `RS384`, `RS512`) or ECDSA P-256 (`ES256`). Verification keys
//! are picked from a JWKS by key ID, from a map keyed by issuer, or from a
//! single default key.
//!
//! ```
//! use slim_jwt::{Claims, Expiration, Key, decode, encode_with_expiration};
//!
//! let mut claims = Claims::new();
//! claims.insert("iss".to_string(), "issuer".into());
//!
//! let token = encode_with_expiration(
//!     "HS256",
//!     &claims,
//!     Expiration::Seconds(60),
//!     Key::secret("secret-key"),
//! )
//! .unwrap();
//!
//! let decoded = decode(&token, Key::secret("secret-key")).unwrap();
//! assert_eq!(decoded["iss"], "issuer");
//! assert!(decoded.contains_key("exp"));
//! ```

pub mod algorithm;
pub mod config;
mod crypto;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod expiration;
pub mod key;
pub mod resolver;
pub mod token;
pub mod traits;

pub use algorithm::Algorithm;
pub use decoder::{Decoder, decode, decode_with_issuers};
pub use encoder::{Encoder, encode, encode_with_expiration};
pub use errors::JwtError;
pub use expiration::Expiration;
pub use key::{IssuerKeys, Key, KeySource, SigningKey};
pub use token::{Claims, Header, decode_header};
