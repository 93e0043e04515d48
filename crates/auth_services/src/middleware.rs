use actix_web::{
    Error, HttpMessage, ResponseError, Result,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
};

use crate::jwt::{TokenService, TokenVerification};
use crate::types::{AuthError, Role, TokenClaims};

/// Middleware for handling authentication by verifying JWT tokens
/// and storing their claims on the request.
pub struct AuthMiddleware {
    tokens: TokenService,
}

impl AuthMiddleware {
    /// Creates the middleware around a configured token service.
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

/// Service that implements the authentication middleware logic
pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let tokens = self.tokens.clone();

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty());

            let token = match token {
                Some(token) => token,
                None => {
                    let response = AuthError::MissingToken.error_response();
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let rejection = match tokens.verify_detailed(token) {
                TokenVerification::Valid(claims) => {
                    req.extensions_mut().insert(claims);
                    None
                }
                TokenVerification::Expired => Some(AuthError::TokenExpired),
                TokenVerification::Malformed | TokenVerification::BadSignature => {
                    Some(AuthError::InvalidToken)
                }
            };

            if let Some(error) = rejection {
                let response = error.error_response();
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Custom extractor for the claims of an authenticated request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    /// Role carried by the token, if it names a known role.
    pub fn role(&self) -> Option<Role> {
        self.0.role()
    }

    /// Fails with [`AuthError::Forbidden`] unless the token's role is one of `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AuthError> {
        match self.role() {
            Some(role) if allowed.contains(&role) => Ok(()),
            role => {
                log::warn!(
                    "Access denied for {:?} with role {:?}",
                    self.0.subject(),
                    role
                );
                Err(AuthError::Forbidden)
            }
        }
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<TokenClaims>().cloned();

        ready(claims.map(AuthenticatedUser).ok_or(AuthError::MissingToken))
    }
}
