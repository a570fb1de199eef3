use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::error::{FoodgramError, FoodgramResult};
use crate::schema::Uuid;
use crate::SESSION_LIFETIME_HOURS;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: Uuid,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(user_id: Uuid) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self { user_id, iat, exp }
    }
}

/// Identity of whoever issued the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(Uuid),
}

impl Requester {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Requester::Anonymous => None,
            Requester::User(id) => Some(*id),
        }
    }

    pub fn require(&self) -> FoodgramResult<Uuid> {
        self.user_id().ok_or(FoodgramError::RequestContext)
    }
}

impl From<JwtSessionData> for Requester {
    fn from(session: JwtSessionData) -> Self {
        Requester::User(session.user_id)
    }
}

fn signing_key(secret: &[u8]) -> FoodgramResult<Hmac<Sha256>> {
    Hmac::new_from_slice(secret)
        .map_err(|_| FoodgramError::Session(String::from("Invalid signing key")))
}

pub fn generate_jwt_session(user_id: Uuid, secret: &[u8]) -> FoodgramResult<String> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user_id);

    claims
        .sign_with_key(&key)
        .map_err(|e| FoodgramError::Session(format!("Failed to sign session: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> FoodgramResult<JwtSessionData> {
    let key = signing_key(secret)?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| FoodgramError::RequestContext)?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(FoodgramError::RequestContext);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn issued_session_verifies() {
        let token = generate_jwt_session(7, SECRET).unwrap();
        let session = verify_jwt_session(&token, SECRET).unwrap();

        assert_eq!(Requester::from(session), Requester::User(7));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let token = generate_jwt_session(7, b"another-secret").unwrap();
        assert_eq!(
            verify_jwt_session(&token, SECRET).unwrap_err(),
            FoodgramError::RequestContext
        );
    }

    #[test]
    fn expired_session_is_rejected() {
        let key = signing_key(SECRET).unwrap();
        let claims = JwtSessionData {
            user_id: 7,
            iat: 0,
            exp: 1,
        };
        let token = claims.sign_with_key(&key).unwrap();

        assert!(verify_jwt_session(&token, SECRET).is_err());
    }

    #[test]
    fn anonymous_requester_has_no_context() {
        assert_eq!(
            Requester::Anonymous.require(),
            Err(FoodgramError::RequestContext)
        );
        assert_eq!(Requester::User(3).require(), Ok(3));
    }
}
