use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::order::{AccountStatus, Principal, Role};
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const USER_STATUS_HEADER: &str = "X-User-Status";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads the principal forwarded by the identity gateway in front of the
/// service. Any missing or malformed header means the request is anonymous.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, AppError> {
    let id: Uuid = header(headers, USER_ID_HEADER)
        .and_then(|v| v.parse().ok())
        .ok_or(AppError::Unauthenticated)?;
    let role: Role = header(headers, USER_ROLE_HEADER)
        .and_then(|v| v.to_ascii_lowercase().parse().ok())
        .ok_or(AppError::Unauthenticated)?;
    let status = match header(headers, USER_STATUS_HEADER) {
        None => AccountStatus::Approved,
        Some(v) => v
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| AppError::Unauthenticated)?,
    };
    Ok(Principal::new(id, role, status))
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = principal_from_headers(req.headers());
        if result.is_err() {
            log::debug!("Rejected unauthenticated request to {}", req.path());
        }
        ready(result)
    }
}
