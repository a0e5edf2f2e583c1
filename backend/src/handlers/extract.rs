//! Extractors that validate their input and reject with the error envelope

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Parse a raw query value; failures name the parameter
pub fn parse_param<T: FromStr>(name: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::invalid_parameter(name))
}

/// JSON body checked with `validator`
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string checked with `validator`
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::MalformedRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct EmailQuery {
        #[validate(email)]
        email: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Body4 {
        #[validate(length(equal = 4))]
        otp: String,
    }

    async fn query(uri: &str) -> Result<ValidatedQuery<EmailQuery>, AppError> {
        let (mut parts, _) = HttpRequest::builder().uri(uri).body(()).unwrap().into_parts();
        ValidatedQuery::<EmailQuery>::from_request_parts(&mut parts, &()).await
    }

    async fn json(body: &str) -> Result<ValidatedJson<Body4>, AppError> {
        let request = HttpRequest::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        ValidatedJson::<Body4>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_query_decoded_once() {
        let ValidatedQuery(q) = query("/verify?email=john%2Bdoe%40gmail.com").await.unwrap();
        assert_eq!(q.email, "john+doe@gmail.com");
    }

    #[tokio::test]
    async fn test_invalid_query_value_is_validation_error() {
        assert!(matches!(query("/x?email=nope").await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_missing_query_value_is_malformed() {
        assert!(matches!(query("/x").await, Err(AppError::MalformedRequest(_))));
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param::<i64>("testId", " 42 ").unwrap(), 42);
        assert!(matches!(
            parse_param::<i32>("amount", "abc"),
            Err(AppError::InvalidParameter { name, expected: None }) if name == "amount"
        ));
    }

    #[tokio::test]
    async fn test_json_body_validated() {
        assert!(json(r#"{"otp":"1234"}"#).await.is_ok());
        assert!(matches!(json(r#"{"otp":"123"}"#).await, Err(AppError::Validation(_))));
        assert!(matches!(json("{not json").await, Err(AppError::MalformedRequest(_))));
    }
}
