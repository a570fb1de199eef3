use std::sync::Arc;

use warp::{reject::Rejection, Filter};

use super::jwt::{verify_jwt_session, Requester};
use crate::SESSION_COOKIE;

/// Resolves the requester from a `Bearer` authorization header or the session cookie.
/// Missing, malformed or expired tokens resolve to `Requester::Anonymous`.
pub fn with_requester(
    secret: Arc<[u8]>,
) -> impl Filter<Extract = (Requester,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .map(move |header: Option<String>, cookie: Option<String>| {
            let token = header
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_string())
                .or(cookie);

            match token {
                Some(token) => match verify_jwt_session(&token, &secret) {
                    Ok(session) => session.into(),
                    Err(_) => {
                        log::trace!("> Ignoring invalid session token");
                        Requester::Anonymous
                    }
                },
                None => Requester::Anonymous,
            }
        })
}
