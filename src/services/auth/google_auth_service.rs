//! # Google ID 토큰 검증 서비스
//!
//! 클라이언트가 Google Identity Services로 직접 받은 ID 토큰(JWT)을
//! 서버에서 검증합니다. Authorization Code 교환은 하지 않으며,
//! 서명 검증은 Google JWKS 공개키로 수행합니다.
//!
//! ## 검증 플로우
//!
//! ```text
//! ID 토큰 수신
//!   │
//!   ├─ 1. 헤더에서 kid 추출
//!   ├─ 2. JWKS 캐시에서 공개키 조회 (없거나 오래되면 재요청)
//!   ├─ 3. RS256 서명 + aud(클라이언트 ID) + iss 검증
//!   └─ 4. 클레임을 정규화된 신원으로 변환
//! ```
//!
//! JWKS 응답은 메모리에 1시간 캐시합니다. Google이 키를 회전하면
//! 캐시에 없는 kid가 들어오므로 그때 재요청합니다.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use once_cell::sync::Lazy;
use serde::Deserialize;
use crate::config::GoogleOAuthConfig;
use crate::domain::models::oauth::{NormalizedIdentity, ProviderKind};
use crate::errors::errors::AppError;
use crate::services::auth::ProviderGateway;

/// JWKS 캐시 유효 시간
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// HTTP 요청 타임아웃
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

static INSTANCE: Lazy<Arc<GoogleAuthService>> = Lazy::new(|| {
    Arc::new(GoogleAuthService {
        http: reqwest::Client::new(),
        jwks_cache: RwLock::new(None),
    })
});

/// Google JWKS 엔드포인트 응답
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// JWKS의 개별 RSA 공개키
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// kid → (n, e) 매핑과 조회 시각
struct JwksCache {
    fetched_at: Instant,
    keys: HashMap<String, (String, String)>,
}

/// Google ID 토큰의 클레임
///
/// aud/iss/exp는 jsonwebtoken의 Validation이 검증하므로 여기서는
/// 신원 구성에 필요한 필드만 꺼냅니다.
#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// Google ID 토큰 검증 서비스
pub struct GoogleAuthService {
    http: reqwest::Client,
    jwks_cache: RwLock<Option<JwksCache>>,
}

impl GoogleAuthService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<GoogleAuthService> {
        INSTANCE.clone()
    }

    /// kid에 해당하는 RSA 공개키 구성요소를 반환합니다.
    ///
    /// 캐시가 신선하고 kid가 있으면 네트워크 없이 반환하고,
    /// 그렇지 않으면 JWKS를 다시 받아옵니다.
    async fn rsa_components(&self, kid: &str) -> Result<(String, String), AppError> {
        // std 잠금은 await를 가로질러 잡지 않는다
        {
            let guard = self
                .jwks_cache
                .read()
                .map_err(|_| AppError::InternalError("JWKS 캐시 잠금 오류".to_string()))?;
            if let Some(cache) = guard.as_ref() {
                if cache.fetched_at.elapsed() < JWKS_CACHE_TTL {
                    if let Some(components) = cache.keys.get(kid) {
                        return Ok(components.clone());
                    }
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let keys: HashMap<String, (String, String)> = jwks
            .keys
            .into_iter()
            .map(|k| (k.kid, (k.n, k.e)))
            .collect();

        let components = keys.get(kid).cloned();

        {
            let mut guard = self
                .jwks_cache
                .write()
                .map_err(|_| AppError::InternalError("JWKS 캐시 잠금 오류".to_string()))?;
            *guard = Some(JwksCache {
                fetched_at: Instant::now(),
                keys,
            });
        }

        components.ok_or_else(|| {
            AppError::ProviderVerificationFailed(
                "Google 서명 키를 찾을 수 없습니다".to_string(),
            )
        })
    }

    /// Google JWKS 엔드포인트에서 공개키 목록을 받아옵니다.
    async fn fetch_jwks(&self) -> Result<JwksResponse, AppError> {
        let response = self
            .http
            .get(GoogleOAuthConfig::jwks_uri())
            .timeout(HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google JWKS 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Google JWKS 응답 오류: {}",
                response.status()
            )));
        }

        response
            .json::<JwksResponse>()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Google JWKS 파싱 실패: {}", e)))
    }
}

#[async_trait]
impl ProviderGateway for GoogleAuthService {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    /// Google ID 토큰을 검증하고 정규화된 신원을 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ProviderVerificationFailed` - 서명/aud/iss/만료 검증 실패
    /// * `AppError::ExternalServiceError` - JWKS 조회 실패
    async fn verify_assertion(&self, credential: &str) -> Result<NormalizedIdentity, AppError> {
        let header = decode_header(credential).map_err(|e| {
            AppError::ProviderVerificationFailed(format!("ID 토큰 헤더 파싱 실패: {}", e))
        })?;
        let kid = header.kid.ok_or_else(|| {
            AppError::ProviderVerificationFailed("ID 토큰에 kid가 없습니다".to_string())
        })?;

        let (n, e) = self.rsa_components(&kid).await?;
        let decoding_key = DecodingKey::from_rsa_components(&n, &e).map_err(|e| {
            AppError::InternalError(format!("Google 공개키 구성 실패: {}", e))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[GoogleOAuthConfig::client_id()]);
        validation.set_issuer(&GoogleOAuthConfig::issuers());

        let claims = decode::<GoogleIdClaims>(credential, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                AppError::ProviderVerificationFailed(format!("Google ID 토큰 검증 실패: {}", e))
            })?;

        let display_name = claims
            .name
            .clone()
            .or_else(|| {
                claims
                    .email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "Google 사용자".to_string());

        Ok(NormalizedIdentity {
            kind: ProviderKind::Google,
            provider_user_id: claims.sub,
            email: claims.email.map(|e| e.to_lowercase()),
            email_verified: claims.email_verified.unwrap_or(false),
            display_name,
            avatar_url: claims.picture,
            // ID 토큰 자체가 해지 대상 자격 증명
            access_token: credential.to_string(),
            refresh_token: None,
            expires_at: None,
        })
    }

    /// Google 토큰을 해지합니다 (최선 노력).
    async fn revoke(&self, access_token: &str) {
        let body = format!("token={}", urlencoding::encode(access_token));

        let result = self
            .http
            .post(GoogleOAuthConfig::revoke_uri())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .timeout(HTTP_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                log::info!("Google 토큰 해지 완료");
            }
            Ok(response) => {
                log::warn!("Google 토큰 해지 거부: {}", response.status());
            }
            Err(e) => {
                log::warn!("Google 토큰 해지 요청 실패: {}", e);
            }
        }
    }
}
