//! 애플리케이션 전역에서 사용하는 에러 시스템
//!
//! 인증/세션 백엔드를 위한 통합 에러 처리 시스템입니다.
//! `thiserror`와 `actix_web::ResponseError`를 사용하여 타입 안전하고
//! 일관된 에러 처리를 제공합니다.
//!
//! ## 응답 형식
//!
//! 모든 에러는 `{ "message": "...", "code": "...", ... }` 형태의 JSON으로
//! 변환됩니다. `code`는 클라이언트가 분기 처리할 수 있는 기계 판독용 코드이며,
//! 세션 관련 에러(`TOKEN_MISSING`, `SESSION_TERMINATED`, `SESSION_EXPIRED`)에서
//! 특히 중요합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::errors::errors::AppError;
//!
//! async fn sign_in(email: &str) -> Result<User, AppError> {
//!     let user = user_repo.find_by_email(email).await?
//!         .ok_or(AppError::EmailNotRegistered)?;
//!     Ok(user)
//! }
//! ```

use serde_json::json;
use thiserror::Error;

/// 애플리케이션 전역 에러 타입
///
/// 인증 흐름에서 발생할 수 있는 모든 종류의 에러를 포괄하는 열거형입니다.
/// 자동으로 HTTP 응답으로 변환되어 클라이언트에게 전달됩니다.
#[derive(Error, Debug)]
pub enum AppError {
    /// 입력값 검증 에러 (400 Bad Request)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 이메일/비밀번호 불일치 (401 Unauthorized)
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// 가입되지 않은 이메일 (401 Unauthorized, notRegistered 플래그 포함)
    #[error("Email is not registered")]
    EmailNotRegistered,

    /// 로컬 이메일 미인증 상태 (403 Forbidden, needVerification 플래그 포함)
    ///
    /// 인증 코드 확인 전에는 로그인할 수 없으며, 토큰도 세션도 발급되지 않습니다.
    #[error("Email is not verified yet")]
    EmailNotVerified { email: String },

    /// 소셜 전용 계정에 대한 비밀번호 로그인 시도 (403 Forbidden)
    #[error("Account is linked to third-party providers only")]
    ThirdPartyOnly { providers: Vec<String> },

    /// 이메일 병합이 계정 탈취 위험으로 거부됨 (403 Forbidden)
    #[error("Identity conflict: {0}")]
    IdentityConflict(String),

    /// 외부 프로바이더가 자격 증명을 거부함 (401 Unauthorized)
    #[error("Provider verification failed: {0}")]
    ProviderVerificationFailed(String),

    /// 리프레시 토큰 쿠키 부재 (401 Unauthorized, code=TOKEN_MISSING)
    #[error("Refresh token is missing")]
    TokenMissing,

    /// 액세스 토큰 만료 (401 Unauthorized, code=TOKEN_EXPIRED)
    #[error("Access token has expired")]
    TokenExpired,

    /// 인증 실패 에러 (401 Unauthorized)
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// 세션이 폐기되었거나 다른 기기 로그인으로 밀려남 (403, code=SESSION_TERMINATED)
    #[error("Session has been terminated")]
    SessionTerminated,

    /// 리프레시 토큰의 절대 수명 초과 (403, code=SESSION_EXPIRED)
    #[error("Session has expired")]
    SessionExpired,

    /// 리소스 찾을 수 없음 에러 (404 Not Found)
    #[error("Not found: {0}")]
    NotFound(String),

    /// 충돌/중복 에러 (409 Conflict)
    #[error("Conflict error: {0}")]
    ConflictError(String),

    /// 데이터베이스 관련 에러 (500 Internal Server Error)
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// 외부 서비스 에러 (502 Bad Gateway)
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 내부 서버 에러 (500 Internal Server Error)
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// 클라이언트 분기 처리용 기계 판독 코드를 반환합니다.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::EmailNotVerified { .. } => Some("EMAIL_NOT_VERIFIED"),
            AppError::ThirdPartyOnly { .. } => Some("THIRD_PARTY_ONLY"),
            AppError::IdentityConflict(_) => Some("IDENTITY_CONFLICT"),
            AppError::ProviderVerificationFailed(_) => Some("PROVIDER_VERIFICATION_FAILED"),
            AppError::TokenMissing => Some("TOKEN_MISSING"),
            AppError::TokenExpired => Some("TOKEN_EXPIRED"),
            AppError::SessionTerminated => Some("SESSION_TERMINATED"),
            AppError::SessionExpired => Some("SESSION_EXPIRED"),
            _ => None,
        }
    }
}

impl actix_web::ResponseError for AppError {
    /// HTTP 에러 응답을 생성합니다.
    ///
    /// 각 에러 타입을 적절한 HTTP 상태 코드와 JSON 응답으로 변환합니다.
    /// 일부 에러는 프론트엔드 분기를 위한 추가 플래그를 포함합니다.
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::http::StatusCode;

        let status = match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials(_)
            | AppError::EmailNotRegistered
            | AppError::ProviderVerificationFailed(_)
            | AppError::TokenMissing
            | AppError::TokenExpired
            | AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::EmailNotVerified { .. }
            | AppError::ThirdPartyOnly { .. }
            | AppError::IdentityConflict(_)
            | AppError::SessionTerminated
            | AppError::SessionExpired => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "message": self.to_string() });

        if let Some(code) = self.code() {
            body["code"] = json!(code);
        }

        match self {
            AppError::EmailNotRegistered => {
                body["notRegistered"] = json!(true);
            }
            AppError::EmailNotVerified { email } => {
                body["needVerification"] = json!(true);
                body["email"] = json!(email);
            }
            AppError::ThirdPartyOnly { providers } => {
                body["isThirdPartyUser"] = json!(true);
                body["providers"] = json!(providers);
            }
            _ => {}
        }

        actix_web::HttpResponse::build(status).json(body)
    }
}

/// 편의성을 위한 Result 타입 별칭
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    #[test]
    fn test_validation_error_response() {
        let error = AppError::ValidationError("이메일 형식이 올바르지 않습니다".to_string());
        let response = error.error_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_credentials_is_unauthorized() {
        let error = AppError::InvalidCredentials("비밀번호가 일치하지 않습니다".to_string());
        assert_eq!(error.error_response().status(), StatusCode::UNAUTHORIZED);
        assert!(error.code().is_none());
    }

    #[test]
    fn test_token_missing_code() {
        let error = AppError::TokenMissing;
        assert_eq!(error.error_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.code(), Some("TOKEN_MISSING"));
    }

    #[test]
    fn test_session_terminated_is_forbidden() {
        let error = AppError::SessionTerminated;
        assert_eq!(error.error_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(error.code(), Some("SESSION_TERMINATED"));
    }

    #[test]
    fn test_session_expired_is_forbidden() {
        let error = AppError::SessionExpired;
        assert_eq!(error.error_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(error.code(), Some("SESSION_EXPIRED"));
    }

    #[test]
    fn test_email_not_verified_flags() {
        let error = AppError::EmailNotVerified {
            email: "alice@example.com".to_string(),
        };
        assert_eq!(error.error_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(error.code(), Some("EMAIL_NOT_VERIFIED"));
    }

    #[test]
    fn test_third_party_only_is_forbidden() {
        let error = AppError::ThirdPartyOnly {
            providers: vec!["google".to_string()],
        };
        assert_eq!(error.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_identity_conflict_is_forbidden() {
        let error = AppError::IdentityConflict("이미 다른 소셜 계정과 연결된 이메일입니다".to_string());
        assert_eq!(error.error_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_external_service_error_is_bad_gateway() {
        let error = AppError::ExternalServiceError("LINE 토큰 교환 실패".to_string());
        assert_eq!(error.error_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_error_response() {
        let error = AppError::InternalError("Something went wrong".to_string());
        assert_eq!(
            error.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
