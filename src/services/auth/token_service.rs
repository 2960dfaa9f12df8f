//! JWT 액세스 토큰 관리 서비스 구현
//!
//! HMAC-SHA256 서명 기반의 상태 없는 액세스 토큰을 발급하고 검증합니다.
//! 클레임은 사용자 ID(sub)와 발급/만료 시각뿐이며, 발급 후에는 서버 측
//! 조회 없이 검증됩니다. 리프레시 토큰은 이 서비스의 관심사가 아닙니다
//! (세션 저장소의 불투명 토큰 참고).

use std::sync::Arc;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use crate::config::JwtConfig;
use crate::domain::models::token::AccessTokenClaims;
use crate::errors::errors::AppError;

static INSTANCE: Lazy<Arc<TokenService>> = Lazy::new(|| Arc::new(TokenService {}));

/// JWT 액세스 토큰 관리 서비스
pub struct TokenService {
    // 외부 의존성 없음
}

impl TokenService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<TokenService> {
        INSTANCE.clone()
    }

    /// 사용자 ID로 액세스 토큰을 발급합니다.
    ///
    /// # Arguments
    ///
    /// * `user_id` - 사용자 ID (MongoDB ObjectId 문자열)
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 토큰 인코딩 실패
    pub fn mint_access(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(JwtConfig::expiration_hours());

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let secret = JwtConfig::secret();
        let encoding_key = EncodingKey::from_secret(secret.as_ref());

        encode(&Header::default(), &claims, &encoding_key)
            .map_err(|e| AppError::InternalError(format!("JWT 토큰 생성 실패: {}", e)))
    }

    /// 액세스 토큰을 검증하고 클레임을 추출합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::TokenExpired` - 만료된 토큰
    /// * `AppError::AuthenticationError` - 서명/형식이 잘못된 토큰
    pub fn verify_access(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let secret = JwtConfig::secret();
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        let validation = Validation::default();

        decode::<AccessTokenClaims>(token, &decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::AuthenticationError("유효하지 않은 토큰입니다".to_string()),
            })
    }

    /// Bearer 토큰에서 실제 토큰 부분을 추출합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::AuthenticationError` - "Bearer " 접두사가 없는 헤더
    pub fn extract_bearer_token<'a>(&self, auth_header: &'a str) -> Result<&'a str, AppError> {
        if auth_header.starts_with("Bearer ") {
            Ok(&auth_header[7..])
        } else {
            Err(AppError::AuthenticationError(
                "유효하지 않은 인증 헤더 형식입니다".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let service = TokenService {};
        let token = service.mint_access("507f1f77bcf86cd799439011").unwrap();

        let claims = service.verify_access(&token).unwrap();

        assert_eq!(claims.sub, "507f1f77bcf86cd799439011");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService {};

        // 기본 leeway(60초)를 넘겨 과거로 설정
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: "507f1f77bcf86cd799439011".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let secret = JwtConfig::secret();
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap();

        match service.verify_access(&token) {
            Err(AppError::TokenExpired) => {}
            other => panic!("TokenExpired를 기대했으나: {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = TokenService {};
        let token = service.mint_access("507f1f77bcf86cd799439011").unwrap();

        // 서명 끝부분 변조
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

        assert!(matches!(
            service.verify_access(&tampered),
            Err(AppError::AuthenticationError(_))
        ));
    }

    #[test]
    fn test_extract_bearer_token() {
        let service = TokenService {};

        assert_eq!(
            service.extract_bearer_token("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
        assert!(service.extract_bearer_token("Basic abc").is_err());
        assert!(service.extract_bearer_token("abc").is_err());
    }
}
