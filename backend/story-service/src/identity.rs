/// Actor identity resolution
///
/// Authentication lives upstream: the gateway terminates it and injects the
/// resolved actor into each request as headers (`x-actor-id`,
/// `x-actor-name`, `x-actor-admin`). This module only reads those headers —
/// the identity and the admin flag are opaque inputs here, never computed or
/// cached in ambient state.
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ADMIN_HEADER: &str = "x-actor-admin";

/// The authenticated (or anonymous-visitor) actor behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Authenticated uid or anonymous visitor id.
    pub id: String,
    /// Display label shown alongside published stories.
    pub display_name: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_admin,
        }
    }
}

fn header<'r>(req: &'r HttpRequest, name: &str) -> Option<&'r str> {
    req.headers().get(name).and_then(|h| h.to_str().ok())
}

impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let id = match header(req, ACTOR_ID_HEADER) {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => {
                return ready(Err(ErrorUnauthorized("Missing actor identity")));
            }
        };

        let display_name = header(req, ACTOR_NAME_HEADER)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Anonymous")
            .to_string();

        let is_admin = header(req, ACTOR_ADMIN_HEADER)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        ready(Ok(Actor {
            id,
            display_name,
            is_admin,
        }))
    }
}
