//! Authentication HTTP Handlers
//!
//! 가입, 로그인(로컬/Google/LINE), 토큰 리프레시, 로그아웃, 활성 세션
//! 조회 엔드포인트를 처리합니다.
//!
//! 액세스 토큰은 응답 본문으로, 리프레시 토큰은 HttpOnly 쿠키로만
//! 전달됩니다.
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie},
    get, post, web, HttpRequest, HttpResponse,
};
use serde_json::json;
use validator::Validate;
use crate::config::CookieConfig;
use crate::domain::dto::auth::request::{
    GoogleSignInRequest, LineSignInRequest, SignInRequest, SignOutQuery, SignUpRequest,
};
use crate::domain::dto::auth::response::{SessionView, UserResponse};
use crate::domain::entities::users::User;
use crate::domain::models::auth::AuthenticatedUser;
use crate::errors::errors::AppError;
use crate::repositories::users::UserRepository;
use crate::services::auth::{ProviderGateway, GoogleAuthService, LineAuthService, RevocationService, SessionService, TokenService};
use crate::services::email::mailer;
use crate::services::users::UserService;

/// 요청의 User-Agent 문자열 (없으면 "unknown device")
fn device_info(req: &HttpRequest) -> String {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown device")
        .to_string()
}

/// 리프레시 토큰 쿠키를 만듭니다.
fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(CookieConfig::name(), token.to_string())
        .http_only(true)
        .secure(CookieConfig::secure())
        .same_site(CookieConfig::same_site())
        .max_age(CookieDuration::days(CookieConfig::max_age_days()))
        .path("/")
        .finish()
}

/// 즉시 만료되는 쿠키로 클라이언트의 리프레시 토큰을 지웁니다.
fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build(CookieConfig::name(), "")
        .http_only(true)
        .secure(CookieConfig::secure())
        .same_site(CookieConfig::same_site())
        .max_age(CookieDuration::seconds(0))
        .path("/")
        .finish()
}

/// 요청 쿠키에서 리프레시 토큰을 꺼냅니다.
fn refresh_token_from(req: &HttpRequest) -> Option<String> {
    req.cookie(CookieConfig::name())
        .map(|c| c.value().to_string())
}

/// 로그인 성공 공통 처리: 세션 수립 + 토큰 발급 + 응답 구성
async fn signed_in_response(user: &User, req: &HttpRequest) -> Result<HttpResponse, AppError> {
    let session_service = SessionService::instance();
    let token_service = TokenService::instance();

    let user_id = user
        .id_string()
        .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

    let session_token = session_service
        .establish(&user_id, &device_info(req))
        .await?;
    let access_token = token_service.mint_access(&user_id)?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&session_token))
        .json(json!({
            "message": "로그인 성공",
            "accessToken": access_token,
            "user": UserResponse::from(user),
        })))
}

/// 회원가입 핸들러
///
/// # Endpoint
/// `POST /api/auth/signup`
#[post("/signup")]
pub async fn signup(payload: web::Json<SignUpRequest>) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user_service = UserService::instance();

    let (user, code) = user_service
        .sign_up(&payload.email, &payload.password, payload.username.clone())
        .await?;

    let email = user.email.clone().unwrap_or_default();
    mailer::instance()
        .send_verification_code(&email, &code)
        .await?;

    log::info!("회원가입 완료, 인증 대기: {}", email);

    Ok(HttpResponse::Created().json(json!({
        "message": "가입이 완료되었습니다. 이메일 인증을 진행해주세요",
        "needVerification": true,
        "user": UserResponse::from(&user),
    })))
}

/// 로컬 로그인 핸들러
///
/// # Endpoint
/// `POST /api/auth/signin`
#[post("/signin")]
pub async fn signin(
    req: HttpRequest,
    payload: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let user = UserService::instance()
        .verify_password(&payload.email, &payload.password)
        .await?;

    log::info!("로컬 로그인: {}", payload.email);

    signed_in_response(&user, &req).await
}

/// Google 로그인 핸들러 (서명된 ID 토큰 검증)
///
/// # Endpoint
/// `POST /api/auth/signin/google`
#[post("/signin/google")]
pub async fn signin_google(
    req: HttpRequest,
    payload: web::Json<GoogleSignInRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let identity = GoogleAuthService::instance()
        .verify_assertion(&payload.token)
        .await?;
    let user = UserService::instance().resolve_external(&identity).await?;

    signed_in_response(&user, &req).await
}

/// LINE 로그인 핸들러 (인가 코드 교환)
///
/// # Endpoint
/// `POST /api/auth/signin/line`
#[post("/signin/line")]
pub async fn signin_line(
    req: HttpRequest,
    payload: web::Json<LineSignInRequest>,
) -> Result<HttpResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let identity = LineAuthService::instance()
        .verify_assertion(&payload.code)
        .await?;
    let user = UserService::instance().resolve_external(&identity).await?;

    signed_in_response(&user, &req).await
}

/// 액세스 토큰 리프레시 핸들러
///
/// 쿠키의 리프레시 토큰으로 새 액세스 토큰을 발급합니다.
/// 쿠키가 없으면 401 `TOKEN_MISSING`, 세션이 폐기되었으면 403
/// `SESSION_TERMINATED`, 절대 수명이 지났으면 403 `SESSION_EXPIRED`를
/// 반환합니다.
///
/// # Endpoint
/// `POST /api/auth/refresh-token`
#[post("/refresh-token")]
pub async fn refresh_token(req: HttpRequest) -> Result<HttpResponse, AppError> {
    let session_token = refresh_token_from(&req).ok_or(AppError::TokenMissing)?;

    let access_token = SessionService::instance()
        .refresh_access_token(&session_token)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "accessToken": access_token })))
}

/// 로그아웃 핸들러
///
/// 세션을 제거하고 프로바이더 토큰을 최선 노력으로 해지합니다.
/// 이미 사라진 세션이어도 200이며, 성공 응답에서 쿠키를 지웁니다.
///
/// # Endpoint
/// `POST /api/auth/signout?allDevices=true|false`
#[post("/signout")]
pub async fn signout(
    req: HttpRequest,
    query: web::Query<SignOutQuery>,
) -> Result<HttpResponse, AppError> {
    let session_token = refresh_token_from(&req).ok_or_else(|| {
        AppError::ValidationError("리프레시 토큰 쿠키가 없습니다".to_string())
    })?;

    RevocationService::instance()
        .sign_out(&session_token, query.all_devices())
        .await?;

    Ok(HttpResponse::Ok()
        .cookie(clear_refresh_cookie())
        .json(json!({ "message": "로그아웃되었습니다" })))
}

/// 활성 세션 목록 조회 핸들러
///
/// # Endpoint
/// `GET /api/auth/sessions` (Bearer 토큰 필요)
#[get("")]
pub async fn sessions(
    req: HttpRequest,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = UserRepository::instance()
        .find_by_id(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

    let current_token = refresh_token_from(&req);
    let views: Vec<SessionView> = user
        .sessions
        .iter()
        .map(|s| SessionView::from_session(s, current_token.as_deref()))
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "sessions": views })))
}
