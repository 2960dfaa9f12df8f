//! # LINE Login 인증 서비스
//!
//! 클라이언트가 받아온 인가 코드를 LINE 토큰 엔드포인트에서 교환하고,
//! 프로필 API로 사용자 정보를 조회합니다.
//!
//! ## 인가 코드 플로우
//!
//! ```text
//! 인가 코드 수신
//!   │
//!   ├─ 1. POST /oauth2/v2.1/token (코드 → 액세스 토큰 교환)
//!   ├─ 2. GET  /v2/profile        (프로필 조회)
//!   ├─ 3. id_token에서 이메일 추출 (있는 경우)
//!   └─ 4. 클레임을 정규화된 신원으로 변환
//! ```
//!
//! 토큰 교환이 채널 시크릿과 함께 TLS 채널에서 직접 이루어지므로
//! id_token의 서명은 별도로 재검증하지 않습니다. 이메일 스코프가
//! 없으면 이메일 없는 신원으로 처리됩니다.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use mongodb::bson::DateTime;
use once_cell::sync::Lazy;
use serde::Deserialize;
use crate::config::LineOAuthConfig;
use crate::domain::models::oauth::{NormalizedIdentity, ProviderKind};
use crate::errors::errors::AppError;
use crate::services::auth::ProviderGateway;

/// HTTP 요청 타임아웃
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

static INSTANCE: Lazy<Arc<LineAuthService>> = Lazy::new(|| {
    Arc::new(LineAuthService {
        http: reqwest::Client::new(),
    })
});

/// LINE 토큰 엔드포인트 응답
#[derive(Debug, Deserialize)]
struct LineTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    id_token: Option<String>,
}

/// LINE 프로필 API 응답
#[derive(Debug, Deserialize)]
struct LineProfile {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(rename = "pictureUrl")]
    picture_url: Option<String>,
}

/// LINE id_token에서 꺼내는 클레임 (이메일 전용)
#[derive(Debug, Deserialize)]
struct LineIdClaims {
    email: Option<String>,
}

/// LINE Login 인증 서비스
pub struct LineAuthService {
    http: reqwest::Client,
}

impl LineAuthService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<LineAuthService> {
        INSTANCE.clone()
    }

    /// 인가 코드를 LINE 액세스 토큰으로 교환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ProviderVerificationFailed` - LINE이 코드를 거부 (4xx)
    /// * `AppError::ExternalServiceError` - 통신/파싱 실패
    async fn exchange_code(&self, code: &str) -> Result<LineTokenResponse, AppError> {
        let params = [
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", LineOAuthConfig::redirect_uri()),
            ("client_id", LineOAuthConfig::channel_id()),
            ("client_secret", LineOAuthConfig::channel_secret()),
        ];

        let response = self
            .http
            .post(LineOAuthConfig::token_uri())
            .form(&params)
            .timeout(HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("LINE 토큰 요청 실패: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("LINE 토큰 교환 거부: {} {}", status, error_text);
            return Err(AppError::ProviderVerificationFailed(
                "LINE 인가 코드 검증에 실패했습니다".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "LINE 토큰 엔드포인트 오류: {}",
                status
            )));
        }

        response
            .json::<LineTokenResponse>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("LINE 토큰 응답 파싱 실패: {}", e)))
    }

    /// 액세스 토큰으로 LINE 프로필을 조회합니다.
    async fn fetch_profile(&self, access_token: &str) -> Result<LineProfile, AppError> {
        let response = self
            .http
            .get(LineOAuthConfig::profile_uri())
            .bearer_auth(access_token)
            .timeout(HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("LINE 프로필 요청 실패: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "LINE 프로필 조회 실패: {}",
                response.status()
            )));
        }

        response
            .json::<LineProfile>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("LINE 프로필 파싱 실패: {}", e)))
    }

    /// id_token에서 이메일 클레임을 추출합니다.
    ///
    /// 토큰 교환 직후 TLS 채널로 받은 토큰이므로 서명 검증은 생략하고
    /// 페이로드만 디코드합니다. 실패하면 이메일 없음으로 간주합니다.
    fn email_from_id_token(&self, id_token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::ES256];
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;

        match decode::<LineIdClaims>(id_token, &DecodingKey::from_secret(&[]), &validation) {
            Ok(data) => data.claims.email.map(|e| e.to_lowercase()),
            Err(e) => {
                log::warn!("LINE id_token 디코드 실패: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ProviderGateway for LineAuthService {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Line
    }

    /// LINE 인가 코드를 검증하고 정규화된 신원을 반환합니다.
    async fn verify_assertion(&self, credential: &str) -> Result<NormalizedIdentity, AppError> {
        let token = self.exchange_code(credential).await?;
        let profile = self.fetch_profile(&token.access_token).await?;

        let email = token
            .id_token
            .as_deref()
            .and_then(|t| self.email_from_id_token(t));
        let email_verified = email.is_some();

        let expires_at = token
            .expires_in
            .map(|secs| DateTime::from_millis(DateTime::now().timestamp_millis() + secs * 1000));

        Ok(NormalizedIdentity {
            kind: ProviderKind::Line,
            provider_user_id: profile.user_id,
            email,
            email_verified,
            display_name: profile.display_name,
            avatar_url: profile.picture_url,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
        })
    }

    /// LINE 액세스 토큰을 해지합니다 (최선 노력).
    async fn revoke(&self, access_token: &str) {
        let params = [
            ("access_token", access_token.to_string()),
            ("client_id", LineOAuthConfig::channel_id()),
            ("client_secret", LineOAuthConfig::channel_secret()),
        ];

        let result = self
            .http
            .post(LineOAuthConfig::revoke_uri())
            .form(&params)
            .timeout(HTTP_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("LINE 토큰 해지 완료");
            }
            Ok(response) => {
                log::warn!("LINE 토큰 해지 거부: {}", response.status());
            }
            Err(e) => {
                log::warn!("LINE 토큰 해지 요청 실패: {}", e);
            }
        }
    }
}
