//! HMAC-SHA256 signed bearer tokens
//!
//! Wire format: `base64url(json claims) + "." + base64url(hmac)`. No external
//! JWT dependency; the claims set is fixed and small. There is no server-side
//! revocation list: a token stays valid until its natural expiry.
//!
//! `verify` deliberately collapses "malformed", "bad signature", and
//! "expired" into one opaque rejection so callers cannot leak which check
//! failed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use sealnote_core::types::TokenClaims;

type HmacSha256 = Hmac<Sha256>;

/// Fixed token lifetime: 7 days
pub const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Issue a signed token asserting `{id, username}` for the next 7 days.
pub fn issue(secret: &[u8], user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        id: user_id,
        username: username.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };
    sign(secret, &claims)
}

/// Verify signature and expiry, returning the embedded claims.
pub fn verify(secret: &[u8], token: &str) -> anyhow::Result<TokenClaims> {
    let (payload, sig) = token.split_once('.').ok_or_else(invalid)?;

    let sig_bytes = URL_SAFE_NO_PAD.decode(sig).map_err(|_| invalid())?;
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("token secret rejected by HMAC: {e}"))?;
    mac.update(payload.as_bytes());
    // Constant-time comparison
    mac.verify_slice(&sig_bytes).map_err(|_| invalid())?;

    let claims_json = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid())?;
    let claims: TokenClaims = serde_json::from_slice(&claims_json).map_err(|_| invalid())?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(invalid());
    }
    Ok(claims)
}

fn sign(secret: &[u8], claims: &TokenClaims) -> anyhow::Result<String> {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("token secret rejected by HMAC: {e}"))?;
    mac.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{payload}.{sig}"))
}

fn invalid() -> anyhow::Error {
    anyhow::anyhow!("invalid or expired token")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-token-secret";

    #[test]
    fn test_issue_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue(SECRET, user_id, "alice").unwrap();
        let claims = verify(SECRET, &token).unwrap();

        assert_eq!(claims.id, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, claims.iat + TOKEN_TTL_SECS);
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = issue(SECRET, Uuid::new_v4(), "alice").unwrap();
        assert!(verify(b"other-secret", &token).is_err());
    }

    #[test]
    fn test_verify_garbage() {
        assert!(verify(SECRET, "").is_err());
        assert!(verify(SECRET, "no-dot-here").is_err());
        assert!(verify(SECRET, "a.b.c").is_err());
        assert!(verify(SECRET, "!!!.???").is_err());
    }

    #[test]
    fn test_verify_expired() {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            id: Uuid::new_v4(),
            username: "alice".into(),
            iat: now - TOKEN_TTL_SECS - 10,
            exp: now - 10,
        };
        let token = sign(SECRET, &claims).unwrap();

        assert!(verify(SECRET, &token).is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = issue(SECRET, Uuid::new_v4(), "alice").unwrap();
        let (payload, sig) = token.split_once('.').unwrap();

        let mut claims: TokenClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
        claims.username = "mallory".into();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        assert!(verify(SECRET, &format!("{forged_payload}.{sig}")).is_err());
    }

    #[test]
    fn test_expired_and_malformed_look_identical() {
        let now = Utc::now().timestamp();
        let expired = sign(
            SECRET,
            &TokenClaims {
                id: Uuid::new_v4(),
                username: "a".into(),
                iat: now - 100,
                exp: now - 1,
            },
        )
        .unwrap();

        let e1 = verify(SECRET, &expired).unwrap_err().to_string();
        let e2 = verify(SECRET, "garbage").unwrap_err().to_string();
        assert_eq!(e1, e2);
    }
}
