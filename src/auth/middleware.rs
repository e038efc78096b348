//! Request authentication gate
//!
//! Resolves the session cookie into an authenticated [`Ctx`] or terminates
//! the request: 401 when the token is missing or fails verification, 404
//! when the token is valid but the user no longer exists, 500 when the
//! lookup itself fails.

use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::{Error, Result};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Name of the session cookie carrying the signed token.
pub const SESSION_COOKIE: &str = "jwt";

pub async fn mw_require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    debug!("MIDDLEWARE: require_auth");

    let token = req
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token)
        .ok_or(Error::AuthFailNoToken)?;

    let user_id = state.tokens.verify(&token)?;

    // A valid token for a vanished user is 404, not 401.
    let user = state.auth.get_user(&user_id).await?;

    req.extensions_mut().insert(Ctx::new(user));

    Ok(next.run(req).await)
}

fn session_token(cookie_header: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_among_other_cookies() {
        let header = "theme=dark; jwt=abc.def.ghi; lang=en";
        assert_eq!(session_token(header).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(session_token("theme=dark; lang=en"), None);
    }
}
