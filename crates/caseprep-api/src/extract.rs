//! Request extractors.
//!
//! Authentication happens in front of this service; it forwards the
//! verified identity as `x-user-id` and `x-user-role`. JSON bodies are parsed
//! so that rejections use the same error body as every other failure.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use caseprep_core::auth::{Requester, Role};
use caseprep_core::error::DomainError;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role; defaults to member.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedRequester(pub Requester);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, DomainError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| DomainError::Unauthorized(format!("{name} is not valid text")))
        })
        .transpose()
}

/// Reads the requester from `headers`.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` if the user id is missing or not a
/// UUID, or the role is unknown.
pub fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, DomainError> {
    let user_id = header(headers, USER_ID_HEADER)?
        .ok_or_else(|| DomainError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| DomainError::Unauthorized(format!("{USER_ID_HEADER} must be a UUID")))?;
    let role = match header(headers, USER_ROLE_HEADER)? {
        Some(role) => role.parse::<Role>()?,
        None => Role::Member,
    };
    Ok(Requester { user_id, role })
}

impl<S> FromRequestParts<S> for AuthenticatedRequester
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(requester_from_headers(&parts.headers)?))
    }
}

/// A JSON request body whose rejection is a `Validation` error.
#[derive(Debug, Clone, Copy)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            DomainError::Validation(format!("invalid request body: {}", rejection.body_text()))
        })?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::HeaderValue;
    use serde::Deserialize;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_member_is_default_role() {
        let id = Uuid::new_v4();

        let requester =
            requester_from_headers(&headers(&[(USER_ID_HEADER, &id.to_string())])).unwrap();

        assert_eq!(requester, Requester::member(id));
    }

    #[test]
    fn test_admin_role_is_read() {
        let id = Uuid::new_v4();

        let requester = requester_from_headers(&headers(&[
            (USER_ID_HEADER, &id.to_string()),
            (USER_ROLE_HEADER, "admin"),
        ]))
        .unwrap();

        assert_eq!(requester, Requester::admin(id));
    }

    #[test]
    fn test_missing_or_malformed_identity_is_unauthorized() {
        for pairs in [
            vec![],
            vec![(USER_ID_HEADER, "not-a-uuid")],
            vec![
                (USER_ID_HEADER, "6f9619ff-8b86-d011-b42d-00c04fc964ff"),
                (USER_ROLE_HEADER, "superuser"),
            ],
        ] {
            assert!(matches!(
                requester_from_headers(&headers(&pairs)),
                Err(DomainError::Unauthorized(_))
            ));
        }
    }

    #[derive(Debug, Deserialize)]
    struct CompleteBody {
        question_number: u32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body_parses_valid_payload() {
        let request = json_request(r#"{"question_number": 2}"#);

        let JsonBody(body) = JsonBody::<CompleteBody>::from_request(request, &())
            .await
            .unwrap();

        assert_eq!(body.question_number, 2);
    }

    #[tokio::test]
    async fn test_json_body_rejection_is_validation_error() {
        for payload in [r#"{"question_number": "two"}"#, "{not json", "{}"] {
            let result = JsonBody::<CompleteBody>::from_request(json_request(payload), &()).await;

            match result {
                Err(ApiError(DomainError::Validation(message))) => {
                    assert!(message.starts_with("invalid request body"), "{message}");
                }
                other => panic!("expected validation error for {payload}, got {other:?}"),
            }
        }
    }
}
