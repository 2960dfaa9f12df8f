//! 인증된 사용자 컨텍스트
//!
//! 미들웨어가 액세스 토큰을 검증한 뒤 Request Extensions에 저장하는
//! 최소한의 사용자 컨텍스트입니다.

use std::future::{ready, Ready};
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use crate::errors::errors::AppError;

/// 검증된 액세스 토큰에서 추출한 사용자 컨텍스트
///
/// 핸들러 인자로 선언하면 자동으로 추출됩니다.
///
/// # Examples
///
/// ```rust,ignore
/// #[get("/sessions")]
/// async fn list_sessions(user: AuthenticatedUser) -> Result<HttpResponse, AppError> {
///     let sessions = session_service.list(&user.user_id).await?;
///     Ok(HttpResponse::Ok().json(sessions))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// 사용자 ID (액세스 토큰의 sub 클레임)
    pub user_id: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| {
                    AppError::AuthenticationError("유효한 인증 토큰이 필요합니다".to_string())
                }),
        )
    }
}
