use crate::types::{AppError, Claims, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Why a presented access token was rejected. Never surfaced to clients
/// directly; the request is simply treated as unauthenticated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The presented token was empty or whitespace.
    #[error("token is empty")]
    Empty,
    /// The token's `exp` claim is in the past.
    #[error("token is expired")]
    Expired,
    /// The token does not parse as a JWT.
    #[error("token structure is malformed")]
    Malformed,
    /// Signature or issuer check failed; the token is not trusted.
    #[error("token signature mismatch")]
    SignatureMismatch,
    /// Signed with an algorithm this codec does not accept.
    #[error("token format is unsupported")]
    Unsupported,
}

/// Signs and verifies compact HS256 access tokens.
///
/// The signing key and issuer are fixed at construction and shared
/// process-wide behind an `Arc`; validation is side-effect free.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: i64,
}

impl TokenCodec {
    /// Secret length is validated at config load, before this runs.
    pub fn new(secret: &str, issuer: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl_secs,
        }
    }

    /// Access token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issues a signed access token for a subject and its role names.
    /// Roles are carried as a single comma-joined claim.
    pub fn issue(&self, subject: &str, roles: &[String]) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.join(","),
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp() as usize,
            iss: self.issuer.clone(),
        };

        tracing::debug!("issuing access token for subject '{}'", subject);

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verifies signature, issuer, and expiry in one pass and returns the
    /// claims. Zero leeway: a token one second past `exp` is expired.
    pub fn validate(&self, token: &str) -> std::result::Result<Claims, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Empty);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                    // Wrong issuer means the token was not minted by this
                    // process; treat like an untrusted signature.
                    ErrorKind::InvalidIssuer => TokenError::SignatureMismatch,
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        TokenError::Unsupported
                    }
                    _ => TokenError::Malformed,
                }
            })
    }

    /// Subject projection over already-validated claims.
    pub fn subject_of(claims: &Claims) -> &str {
        &claims.sub
    }

    /// Role-set projection over already-validated claims.
    pub fn roles_of(claims: &Claims) -> Vec<String> {
        claims
            .roles
            .split(',')
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "gatehouse", 900)
    }

    #[test]
    fn test_issue_validate_roundtrip() {
        let codec = codec();
        let roles = vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()];
        let token = codec.issue("alice", &roles).unwrap();

        let claims = codec.validate(&token).unwrap();
        assert_eq!(TokenCodec::subject_of(&claims), "alice");
        assert_eq!(TokenCodec::roles_of(&claims), roles);
        assert_eq!(claims.iss, "gatehouse");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = TokenCodec::new(SECRET, "gatehouse", -1);
        let token = expired.issue("alice", &["ROLE_USER".to_string()]).unwrap();

        assert_eq!(codec().validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = codec();
        let token = codec.issue("alice", &["ROLE_USER".to_string()]).unwrap();

        let dot = token.rfind('.').unwrap();
        let sig_start = dot + 1;
        let first = token.as_bytes()[sig_start];
        let replacement = if first == b'A' { 'B' } else { 'A' };
        let mut tampered = String::with_capacity(token.len());
        tampered.push_str(&token[..sig_start]);
        tampered.push(replacement);
        tampered.push_str(&token[sig_start + 1..]);

        assert_eq!(
            codec.validate(&tampered),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let other = TokenCodec::new("ffffffffffffffffffffffffffffffff", "gatehouse", 900);
        let token = other.issue("alice", &["ROLE_USER".to_string()]).unwrap();

        assert_eq!(codec().validate(&token), Err(TokenError::SignatureMismatch));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = TokenCodec::new(SECRET, "someone-else", 900);
        let token = other.issue("alice", &["ROLE_USER".to_string()]).unwrap();

        assert_eq!(codec().validate(&token), Err(TokenError::SignatureMismatch));
    }

    #[test]
    fn test_empty_and_garbage_tokens_rejected() {
        let codec = codec();
        assert_eq!(codec.validate(""), Err(TokenError::Empty));
        assert_eq!(codec.validate("   "), Err(TokenError::Empty));
        assert_eq!(codec.validate("not.a.jwt"), Err(TokenError::Malformed));
        assert_eq!(codec.validate("single-segment"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_roles_projection_ignores_empty_segments() {
        let codec = codec();
        let token = codec.issue("alice", &[]).unwrap();
        let claims = codec.validate(&token).unwrap();
        assert!(TokenCodec::roles_of(&claims).is_empty());
    }
}
