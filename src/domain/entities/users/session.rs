//! Session Entity Implementation
//!
//! 사용자 문서에 임베드되는 기기별 세션 레코드입니다.
//! 리프레시 토큰은 아무 의미도 담지 않는 불투명 식별자이며,
//! 검증은 오직 저장된 세션 레코드 조회로만 이루어집니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::config::SessionConfig;

/// 기기별 세션 레코드
///
/// 하나의 기기(브라우저)당 하나의 세션이 유지되며,
/// 동일 기기의 재로그인은 기존 레코드를 제자리에서 교체합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// 불투명 리프레시 토큰 (이 세션의 조회 키)
    pub refresh_token: String,
    /// User-Agent의 SHA-256 해시 (기기 식별자)
    pub device_fingerprint: String,
    /// 세션 목록 표시용 원본 User-Agent 문자열
    pub device_info: String,
    /// 마지막 사용 시각 (로그인/리프레시 시 갱신, 퇴출 순서 결정)
    pub last_used_at: DateTime,
    /// 절대 만료 시각 (리프레시로 연장되지 않음)
    pub expires_at: DateTime,
}

impl Session {
    /// 새 세션을 생성합니다.
    ///
    /// 리프레시 토큰을 새로 발급하고 절대 만료 시각을
    /// [`SessionConfig::refresh_expiration_days`] 이후로 설정합니다.
    pub fn new(device_fingerprint: String, device_info: String) -> Self {
        let now = DateTime::now();
        let lifetime_millis = SessionConfig::refresh_expiration_days() * 24 * 60 * 60 * 1000;

        Self {
            refresh_token: Self::mint_refresh_token(),
            device_fingerprint,
            device_info,
            last_used_at: now,
            expires_at: DateTime::from_millis(now.timestamp_millis() + lifetime_millis),
        }
    }

    /// 불투명 리프레시 토큰을 발급합니다.
    ///
    /// UUID v4 두 개를 이어 붙인 64자 16진수 문자열입니다.
    /// 추측 불가능성만이 요구사항이며, 토큰 자체는 어떤 클레임도
    /// 담지 않습니다.
    pub fn mint_refresh_token() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    /// 절대 수명이 지났는지 확인합니다.
    pub fn is_expired(&self) -> bool {
        self.expires_at.timestamp_millis() <= DateTime::now().timestamp_millis()
    }

    /// 마지막 사용 시각을 현재로 갱신합니다.
    ///
    /// 만료 시각은 갱신하지 않습니다.
    pub fn touch(&mut self) {
        self.last_used_at = DateTime::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_refresh_token_is_opaque_and_unique() {
        let a = Session::mint_refresh_token();
        let b = Session::mint_refresh_token();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_new_session_is_not_expired() {
        let session = Session::new("fp".to_string(), "Mozilla/5.0".to_string());
        assert!(!session.is_expired());
    }

    #[test]
    fn test_expired_session() {
        let mut session = Session::new("fp".to_string(), "Mozilla/5.0".to_string());
        session.expires_at = DateTime::from_millis(DateTime::now().timestamp_millis() - 1000);
        assert!(session.is_expired());
    }

    #[test]
    fn test_touch_does_not_extend_expiry() {
        let mut session = Session::new("fp".to_string(), "Mozilla/5.0".to_string());
        let expires_before = session.expires_at;

        session.touch();

        assert_eq!(session.expires_at, expires_before);
    }
}
