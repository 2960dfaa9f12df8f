//! API 라우트 설정 모듈
//!
//! RESTful API 엔드포인트들을 기능별로 그룹화하여 제공합니다.
//! 인증, 이메일 인증 관련 라우트와 헬스체크 엔드포인트를 포함합니다.
//!
//! # Auth Middleware Usage
//!
//! 라우트 스코프 단위로 인증 레벨을 적용합니다:
//!
//! ```rust,ignore
//! // Protected: Bearer 액세스 토큰 필요. 접두사가 겹치는 스코프는
//! // 더 구체적인 쪽을 먼저 등록한다
//! cfg.service(
//!     web::scope("/api/auth/sessions")
//!         .wrap(AuthMiddleware::required())
//!         .service(handlers::auth::sessions)
//! );
//!
//! // Public: 로그인/가입 자체는 인증 불필요
//! cfg.service(web::scope("/api/auth").service(handlers::auth::signin));
//! ```

use crate::handlers;
use crate::middlewares::AuthMiddleware;
use actix_web::web;
use chrono;
use serde_json::json;

/// 모든 라우트를 설정합니다
///
/// # Arguments
///
/// * `cfg` - Actix-web 서비스 설정 객체
///
/// # Examples
///
/// ```rust,ignore
/// use actix_web::{web, App};
///
/// let app = App::new().configure(configure_all_routes);
/// ```
pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    // Health check endpoint
    cfg.service(health_check);

    configure_auth_routes(cfg);
    configure_verification_routes(cfg);
}

/// 인증 관련 라우트를 설정합니다
///
/// # Available Routes
///
/// ## Public
/// - `POST /api/auth/signup` - 회원가입
/// - `POST /api/auth/signin` - 이메일/비밀번호 로그인
/// - `POST /api/auth/signin/google` - Google ID 토큰 로그인
/// - `POST /api/auth/signin/line` - LINE 인가 코드 로그인
/// - `POST /api/auth/refresh-token` - 액세스 토큰 재발급 (쿠키)
/// - `POST /api/auth/signout` - 로그아웃 (쿠키)
///
/// ## Protected (Bearer 토큰 필요)
/// - `GET /api/auth/sessions` - 활성 세션 목록
fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    // 스코프는 등록 순서대로 접두사 매칭됩니다. "/api/auth"가 먼저
    // 등록되면 "/api/auth/sessions" 요청을 가로채 404가 되므로
    // 더 구체적인 스코프를 먼저 등록해야 합니다.
    cfg.service(
        web::scope("/api/auth/sessions")
            .wrap(AuthMiddleware::required())
            .service(handlers::auth::sessions),
    );

    cfg.service(
        web::scope("/api/auth")
            .service(handlers::auth::signup)
            .service(handlers::auth::signin)
            .service(handlers::auth::signin_google)
            .service(handlers::auth::signin_line)
            .service(handlers::auth::refresh_token)
            .service(handlers::auth::signout),
    );
}

/// 이메일 인증/비밀번호 재설정 라우트를 설정합니다
///
/// # Available Routes
///
/// - `POST /api/verification/send-code` - 인증 코드 발송
/// - `POST /api/verification/verify-code` - 인증 코드 확인
/// - `POST /api/verification/forgot-password` - 재설정 코드 발송
/// - `POST /api/verification/reset-password` - 비밀번호 재설정
fn configure_verification_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/verification")
            .service(handlers::verification::send_code)
            .service(handlers::verification::verify_code)
            .service(handlers::verification::forgot_password)
            .service(handlers::verification::reset_password),
    );
}

/// 서비스 상태를 확인하는 헬스체크 엔드포인트
///
/// 로드밸런서나 모니터링 시스템에서 서비스 상태를 확인하는 데 사용됩니다.
///
/// # Examples
///
/// ```bash
/// curl http://localhost:8080/health
/// ```
#[actix_web::get("/health")]
async fn health_check() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "goaltrack_backend",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_check_returns_ok() {
        let app = test::init_service(App::new().configure(configure_all_routes)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_sessions_route_reaches_auth_middleware() {
        let app = test::init_service(App::new().configure(configure_all_routes)).await;

        // Bearer 토큰 없는 요청은 404(라우트 미도달)가 아니라
        // 미들웨어의 401이어야 한다
        let req = test::TestRequest::get()
            .uri("/api/auth/sessions")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_refresh_token_without_cookie_returns_token_missing() {
        let app = test::init_service(App::new().configure(configure_all_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/refresh-token")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "TOKEN_MISSING");
    }
}
