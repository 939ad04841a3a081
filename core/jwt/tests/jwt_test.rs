// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::JwkSet;
use serde_json::json;
use tracing_test::traced_test;

use slim_jwt::config::{KeyData, SignerConfig, VerifierConfig};
use slim_jwt::traits::{Signer, StandardClaims, Verifier};
use slim_jwt::{
    Algorithm, Claims, Decoder, Encoder, Expiration, IssuerKeys, JwtError, Key, decode,
    decode_header, decode_with_issuers, encode, encode_with_expiration,
};

const RSA_PRIVATE: &str = include_str!("testdata/rsa_private.pem");
const RSA_PUBLIC: &str = include_str!("testdata/rsa_public.pem");
const RSA2_PRIVATE: &str = include_str!("testdata/rsa2_private.pem");
const RSA2_PUBLIC: &str = include_str!("testdata/rsa2_public.pem");
const EC_PRIVATE: &str = include_str!("testdata/ec_private.pem");
const EC_PUBLIC: &str = include_str!("testdata/ec_public.pem");

const NOW: i64 = 1_704_104_100;

fn claims() -> Claims {
    json!({
        "iss": "issuer-a",
        "sub": "user-123",
        "roles": ["reader", "writer"],
    })
    .as_object()
    .cloned()
    .unwrap()
}

/// JWK form of `rsa_public.pem`
fn rsa_jwks(kid: &str) -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{
            "kty": "RSA",
            "kid": kid,
            "alg": "RS256",
            "use": "sig",
            "n": "stKuL6wAIy46WW9-q4A-5Ctc1iXNPPcQvH5Y3PMmkU-EG9D-_mrvreC9IRltzfTc9GpIje6act6DlLfeYYi_QAHekqTSTE8Oy-Pj7SI6HxNItLJeqGG_pJjG8XgFIPJ5eSAUytzQ454TCARXQUt23M6p8-wXQ3FJvS9brt3rUF4jc5h9azInOnnPv-uHAk7YDWNjLy2lB7WZg8lQgWO-QoiUjyuZDbE561bxepPPJuEkq-WQQY831Dfpq3NO8WpyMX1hJ-5MxDzghlwn_4I1ErfvCwEZkmqLqS3zp4KYR8rx5Su5mwZ6lNpHnfo5PuSdVxUps_KU1xh3YFRwHAK3Aw",
            "e": "AQAB"
        }]
    }))
    .unwrap()
}

/// JWK form of `ec_public.pem`
fn ec_jwks(kid: &str) -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{
            "kty": "EC",
            "kid": kid,
            "crv": "P-256",
            "x": "KkQ_jfI_-pwPPI7uYuiiHa1JxlypAv-BurvKaht43dY",
            "y": "83vw4dlts8jFX0iDKsro5mM3LHi0MRsZAI_Zm7pmLaA"
        }]
    }))
    .unwrap()
}

/// Signing and verification keys for each algorithm
fn key_pair(algorithm: Algorithm) -> (Key, Key) {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            (Key::secret("secret-key"), Key::secret("secret-key"))
        }
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => {
            (Key::pem(RSA_PRIVATE), Key::pem(RSA_PUBLIC))
        }
        Algorithm::ES256 => (Key::pem(EC_PRIVATE), Key::pem(EC_PUBLIC)),
    }
}

fn tamper(token: &str) -> String {
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    format!("{}.{}", signed, chars.into_iter().collect::<String>())
}

/// Flip one bit in the byte at `index` of the decoded signature.
fn flip_signature_byte(token: &str, index: usize) -> String {
    let (signed, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
    bytes[index] ^= 0x01;
    format!("{}.{}", signed, URL_SAFE_NO_PAD.encode(bytes))
}

#[test]
fn test_round_trip_all_algorithms() {
    for algorithm in Algorithm::ALL {
        let (signing, verifying) = key_pair(algorithm);

        let token = encode(algorithm.as_str(), &claims(), signing).unwrap();
        assert_eq!(decode_header(&token).unwrap().alg, algorithm.as_str());

        let decoded = decode(&token, verifying).unwrap();
        assert_eq!(decoded, claims(), "round trip failed for {}", algorithm);
    }
}

#[test]
fn test_tampered_signature_all_algorithms() {
    for algorithm in Algorithm::ALL {
        let (signing, verifying) = key_pair(algorithm);
        let token = encode(algorithm.as_str(), &claims(), signing).unwrap();

        let err = decode(&tamper(&token), verifying).unwrap_err();
        assert!(
            matches!(err, JwtError::InvalidSignature),
            "{}: unexpected {:?}",
            algorithm,
            err
        );
    }
}

#[test]
fn test_any_signature_byte_is_checked() {
    for algorithm in Algorithm::ALL {
        let (signing, verifying) = key_pair(algorithm);
        let token = encode(algorithm.as_str(), &claims(), signing).unwrap();

        let len = URL_SAFE_NO_PAD
            .decode(token.rsplit_once('.').unwrap().1)
            .unwrap()
            .len();

        for index in [len / 2, len - 1] {
            let err = decode(&flip_signature_byte(&token, index), verifying.clone()).unwrap_err();
            assert!(
                matches!(err, JwtError::InvalidSignature),
                "{} byte {}: unexpected {:?}",
                algorithm,
                index,
                err
            );
        }
    }
}

#[test]
fn test_tampered_claims() {
    let token = encode("HS256", &claims(), Key::secret("secret-key")).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();

    let forged = serde_json::to_vec(&json!({"iss": "issuer-a", "sub": "admin"})).unwrap();
    let forged = URL_SAFE_NO_PAD.encode(forged);
    parts[1] = &forged;

    let err = decode(&parts.join("."), Key::secret("secret-key")).unwrap_err();
    assert!(matches!(err, JwtError::InvalidSignature));
}

#[test]
fn test_wrong_verification_key() {
    let token = encode("RS256", &claims(), Key::pem(RSA_PRIVATE)).unwrap();
    let err = decode(&token, Key::pem(RSA2_PUBLIC)).unwrap_err();
    assert!(matches!(err, JwtError::InvalidSignature));

    let token = encode("RS512", &claims(), Key::pem(RSA2_PRIVATE)).unwrap();
    assert_eq!(decode(&token, Key::pem(RSA2_PUBLIC)).unwrap(), claims());

    // an RSA key cannot verify an HMAC token
    let token = encode("HS256", &claims(), Key::secret("secret-key")).unwrap();
    let err = decode(&token, Key::pem(RSA_PUBLIC)).unwrap_err();
    assert!(matches!(err, JwtError::InvalidSignature));
}

#[test]
#[traced_test]
fn test_malformed_tokens() {
    for token in ["", "a.b", "a.b.c.d", "not-a-token"] {
        let err = decode(token, Key::secret("secret-key")).unwrap_err();
        assert!(
            matches!(err, JwtError::InvalidToken(_)),
            "{:?}: unexpected {:?}",
            token,
            err
        );
    }

    assert!(logs_contain("token rejected"));
}

#[test]
fn test_unsupported_algorithms() {
    for name in ["PS256", "ES384", "EdDSA", "none", "hs256"] {
        let err = encode(name, &claims(), Key::secret("secret-key")).unwrap_err();
        assert!(matches!(err, JwtError::AlgorithmNotSupported(_)), "{}", name);
    }
}

#[test]
fn test_foreign_algorithm_in_header() {
    // well formed token whose header names an algorithm this crate does not support
    let token = encode("HS256", &claims(), Key::secret("secret-key")).unwrap();
    let (_, rest) = token.split_once('.').unwrap();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"PS256","typ":"JWT"}"#);

    let err = decode(&format!("{}.{}", header, rest), Key::secret("secret-key")).unwrap_err();
    assert!(matches!(err, JwtError::InvalidSignature));
}

#[test]
fn test_expiration_boundary() {
    let encoder = Encoder::new("ES256", Key::pem(EC_PRIVATE))
        .unwrap()
        .with_expiration(Expiration::Seconds(60));
    let decoder = Decoder::new(Key::pem(EC_PUBLIC));

    let token = encoder.encode_at(&claims(), NOW).unwrap();

    let decoded = decoder.decode_at(&token, NOW + 59).unwrap();
    assert_eq!(decoded["exp"], json!(NOW + 60));

    assert!(matches!(
        decoder.decode_at(&token, NOW + 60),
        Err(JwtError::Expired)
    ));
    assert!(matches!(
        decoder.decode_at(&token, NOW + 3600),
        Err(JwtError::Expired)
    ));
}

#[test]
fn test_no_exp_never_expires() {
    let token = Encoder::new("HS256", Key::secret("secret-key"))
        .unwrap()
        .encode_at(&claims(), NOW)
        .unwrap();

    let decoded = Decoder::new(Key::secret("secret-key"))
        .decode_at(&token, i64::MAX)
        .unwrap();
    assert!(!decoded.contains_key("exp"));
}

#[test]
fn test_hourly_and_daily_expiration() {
    // NOW is 900 seconds past 2024-01-01T10:00:00Z
    let hourly = Encoder::new("HS256", Key::secret("secret-key"))
        .unwrap()
        .with_expiration(Expiration::Hourly(1800))
        .encode_at(&claims(), NOW)
        .unwrap();
    let decoded = Decoder::new(Key::secret("secret-key"))
        .decode_at(&hourly, NOW)
        .unwrap();
    assert_eq!(decoded["exp"], json!(NOW - 900 + 1800));

    // a daily offset earlier than the current time of day is already expired
    let daily = Encoder::new("HS256", Key::secret("secret-key"))
        .unwrap()
        .with_expiration(Expiration::Daily(3600))
        .encode_at(&claims(), NOW)
        .unwrap();
    let err = Decoder::new(Key::secret("secret-key"))
        .decode_at(&daily, NOW)
        .unwrap_err();
    assert!(matches!(err, JwtError::Expired));
}

#[test]
fn test_encode_with_expiration_replaces_exp() {
    let mut claims = claims();
    claims.insert("exp".to_string(), json!(1));

    let token = encode_with_expiration(
        "RS384",
        &claims,
        Expiration::Seconds(300),
        Key::pem(RSA_PRIVATE),
    )
    .unwrap();

    let decoded = decode(&token, Key::pem(RSA_PUBLIC)).unwrap();
    assert!(decoded["exp"].as_i64().unwrap() > 1);
    assert_eq!(decoded.len(), claims.len());
}

#[test]
fn test_issuer_keys() {
    let mut issuers = IssuerKeys::new();
    issuers.insert("issuer-a".to_string(), Key::pem(RSA_PUBLIC));
    issuers.insert("issuer-b".to_string(), Key::pem(RSA2_PUBLIC));

    let token = encode("RS256", &claims(), Key::pem(RSA_PRIVATE)).unwrap();

    // default key does not match, the issuer key does
    let decoded = decode_with_issuers(&token, Key::pem(RSA2_PUBLIC), issuers.clone()).unwrap();
    assert_eq!(decoded, claims());

    // issuer without a key falls back to the default key
    let mut other = claims();
    other.insert("iss".to_string(), json!("issuer-c"));
    let token = encode("RS256", &other, Key::pem(RSA_PRIVATE)).unwrap();
    assert_eq!(
        decode_with_issuers(&token, Key::pem(RSA_PUBLIC), issuers.clone()).unwrap(),
        other
    );

    // and with no default key there is nothing to verify with
    let err = decode(&token, issuers).unwrap_err();
    assert!(matches!(err, JwtError::NoKey));
}

#[test]
fn test_kid_takes_precedence_over_issuer() {
    let token = encode(
        "RS256",
        &claims(),
        Key::pem(RSA_PRIVATE).with_key_id("rsa-key-1"),
    )
    .unwrap();
    assert_eq!(decode_header(&token).unwrap().kid.as_deref(), Some("rsa-key-1"));

    // the issuer maps to the wrong key, the JWKS has the right one
    let decoder = Decoder::new(rsa_jwks("rsa-key-1")).with_issuer_key("issuer-a", Key::pem(RSA2_PUBLIC));
    assert_eq!(decoder.decode(&token).unwrap(), claims());

    // the JWKS can also be passed as the default key, as JSON text
    let jwks_text = serde_json::to_string(&rsa_jwks("rsa-key-1")).unwrap();
    let mut issuers = IssuerKeys::new();
    issuers.insert("issuer-a".to_string(), Key::pem(RSA2_PUBLIC));
    assert_eq!(
        decode_with_issuers(&token, Key::secret(jwks_text), issuers).unwrap(),
        claims()
    );
}

#[test]
fn test_kid_missing_from_jwks() {
    let token = encode(
        "ES256",
        &claims(),
        Key::pem(EC_PRIVATE).with_key_id("unknown"),
    )
    .unwrap();

    let err = decode(&token, ec_jwks("ec-key-1")).unwrap_err();
    assert!(matches!(err, JwtError::KeyNotFound { ref kid } if kid == "unknown"));
    assert_eq!(err.reason(), "key_not_found");
}

#[test]
fn test_ec_jwk() {
    let token = encode(
        "ES256",
        &claims(),
        Key::pem(EC_PRIVATE).with_key_id("ec-key-1"),
    )
    .unwrap();
    assert_eq!(decode(&token, ec_jwks("ec-key-1")).unwrap(), claims());

    // the JWK is RSA but the token is ECDSA
    let token = encode(
        "ES256",
        &claims(),
        Key::pem(EC_PRIVATE).with_key_id("rsa-key-1"),
    )
    .unwrap();
    let err = decode(&token, rsa_jwks("rsa-key-1")).unwrap_err();
    assert!(matches!(err, JwtError::InvalidSignature));
}

#[test]
fn test_typed_claims() {
    let encoder = Encoder::new("HS384", Key::secret("secret-key"))
        .unwrap()
        .with_expiration(Expiration::Seconds(600));
    let decoder = Decoder::new(Key::secret("secret-key"));

    let claims = StandardClaims {
        iss: Some("issuer-a".to_string()),
        sub: Some("user-123".to_string()),
        ..Default::default()
    };

    let token = encoder.sign(&claims).unwrap();
    let verified: StandardClaims = decoder.verify(&token).unwrap();

    assert_eq!(verified.iss, claims.iss);
    assert_eq!(verified.sub, claims.sub);
    assert!(verified.exp.is_some());
}

#[test]
#[traced_test]
fn test_config_from_yaml() {
    let signer: SignerConfig = serde_yaml::from_str(
        r#"
algorithm: HS512
key_id: hmac-1
key:
  secret: secret-key
expiration:
  daily: 86399
"#,
    )
    .unwrap();

    let verifier: VerifierConfig = serde_yaml::from_str(
        r#"
issuers:
  issuer-a:
    secret: secret-key
"#,
    )
    .unwrap();

    // NOW is 2024-01-01T10:15:00Z, the token expires at 23:59:59
    let token = signer.build().unwrap().encode_at(&claims(), NOW).unwrap();
    let decoder = verifier.build().unwrap();
    let decoded = decoder.decode_at(&token, NOW).unwrap();
    assert_eq!(decoded["sub"], "user-123");
    assert_eq!(decoded["exp"], json!(1_704_067_200 + 86399));
    assert!(matches!(
        decoder.decode_at(&token, 1_704_067_200 + 86399),
        Err(JwtError::Expired)
    ));

    assert!(logs_contain("encoder configured"));

    let wrong = SignerConfig::new(Algorithm::HS512, KeyData::Secret("other".to_string()))
        .build()
        .unwrap()
        .encode_at(&claims(), NOW)
        .unwrap();
    assert!(matches!(
        decoder.decode_at(&wrong, NOW),
        Err(JwtError::InvalidSignature)
    ));
}
