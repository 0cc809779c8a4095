//! ID token validation.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::{AuthError, AuthResult};

/// Signing algorithms accepted from the identity provider.
pub const PROVIDER_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// What a valid ID token must satisfy.
#[derive(Debug, Clone)]
pub struct IdTokenExpectations<'a> {
    /// Expected audience
    pub client_id: &'a str,

    /// Accepted issuers; `None` skips the issuer check
    pub issuers: Option<&'a [String]>,

    /// Nonce sent with the authorization request
    pub nonce: &'a str,

    /// Allowed clock skew for `exp` and `nbf`
    pub clock_skew_secs: u64,

    /// Accepted signing algorithms
    pub algorithms: &'a [Algorithm],
}

/// Validate an ID token and return its claims.
///
/// Checks signature, audience, expiry and not-before (with skew), issuer
/// (when requested) and the nonce.
pub fn validate_id_token(
    token: &str,
    key: &DecodingKey,
    expected: &IdTokenExpectations<'_>,
) -> AuthResult<Map<String, Value>> {
    let header = decode_header(token)?;
    if !expected.algorithms.contains(&header.alg) {
        return Err(AuthError::AuthenticationFailed(format!(
            "unsupported ID token algorithm {:?}",
            header.alg
        )));
    }

    let mut validation = Validation::new(header.alg);
    validation.leeway = expected.clock_skew_secs;
    validation.validate_nbf = true;
    validation.set_audience(&[expected.client_id]);
    if let Some(issuers) = expected.issuers {
        validation.set_issuer(issuers);
    }

    let claims = decode::<Map<String, Value>>(token, key, &validation)?.claims;

    match claims.get("nonce").and_then(Value::as_str) {
        Some(nonce) if nonce == expected.nonce => Ok(claims),
        Some(_) => Err(AuthError::AuthenticationFailed("nonce mismatch".to_string())),
        None => Err(AuthError::AuthenticationFailed("nonce missing from ID token".to_string())),
    }
}

fn left_half<D: Digest>(value: &str) -> String {
    let digest = D::digest(value.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Left-most half of the digest matching `alg`, base64url encoded.
///
/// This is the value carried by `c_hash` and `at_hash`: SHA-256 for the
/// `*256` algorithms, SHA-384 for `*384` and SHA-512 for `*512`.
pub fn left_half_hash(value: &str, alg: Algorithm) -> AuthResult<String> {
    match alg {
        Algorithm::HS256 | Algorithm::RS256 | Algorithm::PS256 | Algorithm::ES256 => {
            Ok(left_half::<Sha256>(value))
        }
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 => {
            Ok(left_half::<Sha384>(value))
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 => Ok(left_half::<Sha512>(value)),
        other => Err(AuthError::AuthenticationFailed(format!(
            "no hash claim digest for {:?}",
            other
        ))),
    }
}

/// Check an optional hash claim (`c_hash`, `at_hash`) against its value.
///
/// A missing claim is accepted.
pub fn verify_hash_claim(
    claims: &Map<String, Value>,
    claim: &str,
    value: &str,
    alg: Algorithm,
) -> AuthResult<()> {
    match claims.get(claim).and_then(Value::as_str) {
        None => Ok(()),
        Some(hash) if hash == left_half_hash(value, alg)? => Ok(()),
        Some(_) => Err(AuthError::AuthenticationFailed(format!("{} mismatch", claim))),
    }
}

/// Like [`verify_hash_claim`], but a missing claim is a failure.
pub fn verify_required_hash_claim(
    claims: &Map<String, Value>,
    claim: &str,
    value: &str,
    alg: Algorithm,
) -> AuthResult<()> {
    if !claims.get(claim).is_some_and(Value::is_string) {
        return Err(AuthError::AuthenticationFailed(format!(
            "{} missing from ID token",
            claim
        )));
    }
    verify_hash_claim(claims, claim, value, alg)
}
