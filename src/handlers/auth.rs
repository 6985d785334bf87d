use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};

use crate::domain::identity::RequestContext;
use crate::errors::AppError;
use crate::AppState;

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolves the caller from `Authorization: Bearer <token>` through the
/// configured identity provider. Unknown or expired tokens are rejected
/// with 401.
impl FromRequest for RequestContext {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let state = state.ok_or_else(|| AppError::internal("Internal server error"))?;
            let token = token.ok_or(AppError::Unauthorized)?;

            match state.identity.resolve(&token).await {
                Ok(Some(ctx)) => Ok(ctx),
                Ok(None) => Err(AppError::Unauthorized),
                Err(e) => {
                    log::error!("Session lookup failed: {}", e);
                    Err(AppError::internal("Internal server error"))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn extracts_bearer_token() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc123".to_string()));
    }

    #[test]
    fn ignores_other_schemes_and_blank_tokens() {
        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);

        let blank = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer   "))
            .to_http_request();
        assert_eq!(bearer_token(&blank), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
