use crate::auth::UserInfo;
use crate::error::{Error, Result};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Authenticated request context, inserted by the auth middleware and
/// recovered through the extractor. Carries the resolved user with
/// credentials already stripped.
#[derive(Clone, Debug)]
pub struct Ctx {
    user: UserInfo,
}

impl Ctx {
    pub fn new(user: UserInfo) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Ctx>()
            .cloned()
            .ok_or(Error::AuthFailCtxNotInRequestExt)
    }
}
