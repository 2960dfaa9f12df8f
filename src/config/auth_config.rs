//! # Authentication Configuration Module
//!
//! JWT 토큰, 세션 한도, 리프레시 쿠키, OAuth 프로바이더 등
//! 인증 관련 설정을 관리하는 모듈입니다.
//!
//! ## 지원하는 인증 방식
//!
//! 1. **로컬 인증**: 이메일/패스워드 기반 전통적인 인증
//! 2. **Google 로그인**: 서명된 ID 토큰 검증 방식
//! 3. **LINE 로그인**: 인가 코드 교환 방식
//!
//! ## 필수 환경 변수 설정
//!
//! ```bash
//! # JWT
//! export JWT_SECRET="your-super-secret-jwt-key"
//! export JWT_EXPIRATION_HOURS="1"
//!
//! # Google
//! export GOOGLE_CLIENT_ID="123456789-xxxx.apps.googleusercontent.com"
//!
//! # LINE
//! export LINE_CHANNEL_ID="1234567890"
//! export LINE_CHANNEL_SECRET="your-line-channel-secret"
//! export LINE_REDIRECT_URI="https://yourdomain.com/line-callback"
//! ```

use std::env;
use actix_web::cookie::SameSite;
use crate::config::Environment;

/// JSON Web Token (JWT) 관련 설정을 관리하는 구조체
///
/// 액세스 토큰의 서명 키와 만료 시간을 관리합니다.
/// 리프레시 토큰은 JWT가 아닌 불투명 토큰이므로 여기서 다루지 않습니다
/// ([`SessionConfig`] 참고).
pub struct JwtConfig;

impl JwtConfig {
    /// JWT 서명에 사용할 비밀키를 반환합니다.
    ///
    /// # 보안 요구사항
    ///
    /// - 최소 256비트 (32바이트) 길이
    /// - 암호학적으로 안전한 랜덤 생성
    /// - 환경별로 다른 키 사용
    ///
    /// # 기본값
    ///
    /// 환경 변수가 설정되지 않은 경우 "your-secret-key"를 사용하지만,
    /// 이는 개발 환경에서만 안전하며 경고 로그가 출력됩니다.
    pub fn secret() -> String {
        env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET not set, using default (not secure for production!)");
            "your-secret-key".to_string()
        })
    }

    /// JWT 액세스 토큰의 만료 시간을 시간 단위로 반환합니다.
    ///
    /// 액세스 토큰은 서버 측 상태 없이 검증되므로 수명을 짧게 유지합니다.
    /// 만료 후에는 리프레시 쿠키로 재발급받아야 합니다.
    ///
    /// # 기본값
    ///
    /// 1시간
    ///
    /// # 환경 변수 설정
    ///
    /// ```bash
    /// export JWT_EXPIRATION_HOURS="1"
    /// ```
    pub fn expiration_hours() -> i64 {
        env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .unwrap_or(1)
    }
}

/// 세션 저장소 관련 설정을 관리하는 구조체
///
/// 사용자별 동시 세션 한도와 리프레시 토큰의 절대 수명을 관리합니다.
pub struct SessionConfig;

impl SessionConfig {
    /// 사용자당 허용되는 최대 동시 세션(기기) 수를 반환합니다.
    ///
    /// 한도를 초과하는 새 로그인은 가장 오래 사용되지 않은 세션을
    /// 밀어냅니다.
    ///
    /// # 기본값
    ///
    /// 5
    pub fn max_sessions() -> usize {
        env::var("MAX_SESSIONS_PER_USER")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5)
    }

    /// 리프레시 토큰의 절대 만료 기간을 일 단위로 반환합니다.
    ///
    /// 리프레시 사용 시에도 연장되지 않는 절대 수명입니다.
    ///
    /// # 기본값
    ///
    /// 7일
    pub fn refresh_expiration_days() -> i64 {
        env::var("REFRESH_EXPIRATION_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .unwrap_or(7)
    }

    /// 이메일 인증/비밀번호 재설정 코드의 유효 시간을 분 단위로 반환합니다.
    ///
    /// # 기본값
    ///
    /// 10분
    pub fn verification_code_ttl_minutes() -> i64 {
        env::var("VERIFICATION_CODE_TTL_MINUTES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10)
    }
}

/// 리프레시 토큰 쿠키 설정을 관리하는 구조체
///
/// 리프레시 토큰은 HttpOnly 쿠키로만 전달됩니다. 프로덕션에서는
/// 크로스 사이트 프론트엔드를 위해 `Secure` + `SameSite=None`,
/// 개발 환경에서는 `SameSite=Lax`를 사용합니다.
pub struct CookieConfig;

impl CookieConfig {
    /// 리프레시 토큰 쿠키 이름을 반환합니다.
    pub fn name() -> &'static str {
        "refreshToken"
    }

    /// Secure 속성 사용 여부를 반환합니다.
    ///
    /// 프로덕션 환경에서만 true입니다.
    pub fn secure() -> bool {
        Environment::current().is_production()
    }

    /// SameSite 속성을 반환합니다.
    ///
    /// `SameSite=None`은 `Secure`와 함께만 유효하므로 프로덕션에서만
    /// 사용합니다.
    pub fn same_site() -> SameSite {
        if Environment::current().is_production() {
            SameSite::None
        } else {
            SameSite::Lax
        }
    }

    /// 쿠키 Max-Age를 일 단위로 반환합니다.
    ///
    /// 리프레시 토큰의 절대 수명과 동일합니다.
    pub fn max_age_days() -> i64 {
        SessionConfig::refresh_expiration_days()
    }
}

/// Google 로그인 설정을 관리하는 구조체
///
/// 클라이언트가 제출한 Google ID 토큰을 서버에서 직접 검증하기 위한
/// 설정입니다. 검증은 Google 공개 키(JWKS)로 서명을 확인하고
/// audience가 우리 클라이언트 ID와 일치하는지 확인하는 방식입니다.
pub struct GoogleOAuthConfig;

impl GoogleOAuthConfig {
    /// Google OAuth Client ID를 반환합니다.
    ///
    /// ID 토큰의 audience(aud) 검증에 사용됩니다.
    ///
    /// # Panics
    ///
    /// `GOOGLE_CLIENT_ID` 환경 변수가 설정되지 않은 경우 패닉이 발생합니다.
    pub fn client_id() -> String {
        env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set")
    }

    /// Google 공개 키(JWKS) 엔드포인트 URI를 반환합니다.
    ///
    /// # 기본값
    ///
    /// `https://www.googleapis.com/oauth2/v3/certs`
    pub fn jwks_uri() -> String {
        env::var("GOOGLE_JWKS_URI")
            .unwrap_or_else(|_| "https://www.googleapis.com/oauth2/v3/certs".to_string())
    }

    /// ID 토큰에서 허용되는 발급자(iss) 목록을 반환합니다.
    pub fn issuers() -> [&'static str; 2] {
        ["https://accounts.google.com", "accounts.google.com"]
    }

    /// Google 토큰 해지 엔드포인트 URI를 반환합니다.
    ///
    /// # 기본값
    ///
    /// `https://oauth2.googleapis.com/revoke`
    pub fn revoke_uri() -> String {
        env::var("GOOGLE_REVOKE_URI")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/revoke".to_string())
    }
}

/// LINE 로그인 설정을 관리하는 구조체
///
/// LINE은 인가 코드를 서버에서 토큰으로 교환한 뒤 프로필을 조회하는
/// 방식입니다. 채널 시크릿은 서버에서만 사용되며 절대 노출되어서는
/// 안 됩니다.
pub struct LineOAuthConfig;

impl LineOAuthConfig {
    /// LINE 채널 ID를 반환합니다.
    ///
    /// # Panics
    ///
    /// `LINE_CHANNEL_ID` 환경 변수가 설정되지 않은 경우 패닉이 발생합니다.
    pub fn channel_id() -> String {
        env::var("LINE_CHANNEL_ID").expect("LINE_CHANNEL_ID must be set")
    }

    /// LINE 채널 시크릿을 반환합니다.
    ///
    /// # Panics
    ///
    /// `LINE_CHANNEL_SECRET` 환경 변수가 설정되지 않은 경우 패닉이 발생합니다.
    pub fn channel_secret() -> String {
        env::var("LINE_CHANNEL_SECRET").expect("LINE_CHANNEL_SECRET must be set")
    }

    /// 인가 코드 교환 시 사용하는 리디렉션 URI를 반환합니다.
    ///
    /// 코드 발급 시 사용된 값과 정확히 일치해야 교환이 성공합니다.
    ///
    /// # Panics
    ///
    /// `LINE_REDIRECT_URI` 환경 변수가 설정되지 않은 경우 패닉이 발생합니다.
    pub fn redirect_uri() -> String {
        env::var("LINE_REDIRECT_URI").expect("LINE_REDIRECT_URI must be set")
    }

    /// LINE 토큰 교환 엔드포인트 URI를 반환합니다.
    ///
    /// # 기본값
    ///
    /// `https://api.line.me/oauth2/v2.1/token`
    pub fn token_uri() -> String {
        env::var("LINE_TOKEN_URI")
            .unwrap_or_else(|_| "https://api.line.me/oauth2/v2.1/token".to_string())
    }

    /// LINE 프로필 조회 엔드포인트 URI를 반환합니다.
    ///
    /// # 기본값
    ///
    /// `https://api.line.me/v2/profile`
    pub fn profile_uri() -> String {
        env::var("LINE_PROFILE_URI")
            .unwrap_or_else(|_| "https://api.line.me/v2/profile".to_string())
    }

    /// LINE 토큰 해지 엔드포인트 URI를 반환합니다.
    ///
    /// # 기본값
    ///
    /// `https://api.line.me/oauth2/v2.1/revoke`
    pub fn revoke_uri() -> String {
        env::var("LINE_REVOKE_URI")
            .unwrap_or_else(|_| "https://api.line.me/oauth2/v2.1/revoke".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_expiration_default_is_one_hour() {
        if env::var("JWT_EXPIRATION_HOURS").is_err() {
            assert_eq!(JwtConfig::expiration_hours(), 1);
        }
    }

    #[test]
    fn test_session_limits_defaults() {
        if env::var("MAX_SESSIONS_PER_USER").is_err() {
            assert_eq!(SessionConfig::max_sessions(), 5);
        }
        if env::var("REFRESH_EXPIRATION_DAYS").is_err() {
            assert_eq!(SessionConfig::refresh_expiration_days(), 7);
        }
        if env::var("VERIFICATION_CODE_TTL_MINUTES").is_err() {
            assert_eq!(SessionConfig::verification_code_ttl_minutes(), 10);
        }
    }

    #[test]
    fn test_cookie_name() {
        assert_eq!(CookieConfig::name(), "refreshToken");
    }

    #[test]
    fn test_google_issuers() {
        let issuers = GoogleOAuthConfig::issuers();
        assert!(issuers.contains(&"https://accounts.google.com"));
        assert!(issuers.contains(&"accounts.google.com"));
    }
}
