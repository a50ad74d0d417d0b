use crate::application_port::*;
use crate::domain_model::SessionId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    // session id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<String>,
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(&cfg.signing_key);
        let decoding_key = DecodingKey::from_secret(&cfg.signing_key);
        JwtHs256Codec {
            cfg,
            encoding_key,
            decoding_key,
        }
    }

    /// Signature and issuer are checked; expiry is left to the caller so that
    /// claims stay readable on expired tokens.
    fn decode_claims(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = false;
        v.leeway = 0;
        v.required_spec_claims.clear();
        v.set_issuer(&[self.cfg.issuer.clone()]);
        let data = decode::<SessionClaims>(token, &self.decoding_key, &v)
            .map_err(|_| AuthError::MalformedToken)?;
        Ok(data.claims)
    }

    fn non_blank(claim: Option<String>) -> Result<String, AuthError> {
        match claim {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AuthError::EmptyClaim),
        }
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        subject: &str,
        session_id: &SessionId,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let exp_dt = iat_dt
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::InternalError("token expiry overflows".to_string()))?;
        let claims = SessionClaims {
            sub: Some(subject.to_string()),
            jti: Some(session_id.to_string()),
            exp: Some(exp_dt.timestamp()),
            iat: Some(iat_dt.timestamp()),
            iss: Some(self.cfg.issuer.clone()),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn subject_of(&self, token: &str) -> Result<String, AuthError> {
        Self::non_blank(self.decode_claims(token)?.sub)
    }

    fn session_id_of(&self, token: &str) -> Result<SessionId, AuthError> {
        Self::non_blank(self.decode_claims(token)?.jti).map(SessionId)
    }

    fn expiry_of(&self, token: &str) -> Result<Option<DateTime<Utc>>, AuthError> {
        let claims = self.decode_claims(token)?;
        Ok(claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single()))
    }

    fn is_structurally_valid(&self, subject: &str, token: &str) -> bool {
        let Ok(claims) = self.decode_claims(token) else {
            return false;
        };
        let subject_matches = claims.sub.as_deref() == Some(subject);
        let active = claims
            .exp
            .is_some_and(|exp| exp > Utc::now().timestamp());
        subject_matches && active
    }

    fn is_expired_by_wall_clock(&self, token: &str) -> Result<bool, AuthError> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(AuthError::MalformedToken);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|_| AuthError::MalformedToken)?;
        let payload: serde_json::Value =
            serde_json::from_slice(&payload).map_err(|_| AuthError::MalformedToken)?;

        let exp = match payload.get("exp") {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.parse::<i64>().ok(),
            _ => None,
        }
        .ok_or(AuthError::InvalidAccessToken)?;

        Ok(exp <= Utc::now().timestamp())
    }
}

pub struct UuidSessionIdGenerator;

impl SessionIdGenerator for UuidSessionIdGenerator {
    #[inline]
    fn generate(&self) -> SessionId {
        SessionId(Uuid::new_v4().to_string())
    }
}
