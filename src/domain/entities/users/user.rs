//! User Entity Implementation
//!
//! 사용자 애그리게이트의 핵심 구현체입니다.
//! 로컬 인증과 소셜 인증(Google/LINE)을 모두 지원하며, 기기별 세션
//! 목록을 문서 안에 임베드하여 관리합니다.
//!
//! 세션 목록의 불변식(한도 5, LRU 퇴출, 지문 중복 없음)은 이 엔티티의
//! 순수 메서드가 보장하고, 동시성은 리포지토리의 버전 기반 낙관적 잠금이
//! 보장합니다.

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use crate::config::SessionConfig;
use crate::domain::entities::users::session::Session;
use crate::domain::models::oauth::{NormalizedIdentity, ProviderKind, ProviderTokens};

/// 일회용 인증 코드 (이메일 인증, 비밀번호 재설정)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeCode {
    /// 6자리 숫자 코드
    pub code: String,
    /// 코드 만료 시각
    pub expires_at: DateTime,
}

impl OneTimeCode {
    /// 설정된 TTL로 새 코드를 생성합니다.
    pub fn new(code: String) -> Self {
        let ttl_millis = SessionConfig::verification_code_ttl_minutes() * 60 * 1000;
        Self {
            code,
            expires_at: DateTime::from_millis(DateTime::now().timestamp_millis() + ttl_millis),
        }
    }

    /// 코드가 만료되었는지 확인합니다.
    pub fn is_expired(&self) -> bool {
        self.expires_at.timestamp_millis() <= DateTime::now().timestamp_millis()
    }
}

/// 사용자 애그리게이트
///
/// 신원(이메일, 프로바이더 연결), 인증 상태(검증 플래그, 코드),
/// 세션 목록을 하나의 문서로 표현합니다. `version` 필드는 세션/연결
/// 변경 시 낙관적 잠금 필터로 사용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// 표시용 사용자 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// 사용자 이메일 (소문자 정규화, LINE 전용 계정은 없을 수 있음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 해시된 비밀번호 (로컬 프로바이더가 연결된 경우에만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// 연결된 인증 프로바이더 목록 (생성 이후 비어있지 않음)
    pub providers: Vec<ProviderKind>,
    /// 프로바이더별 연결 정보
    #[serde(default)]
    pub provider_tokens: ProviderTokens,
    /// 소셜 프로바이더가 단언한 이메일 소유 여부
    pub is_email_verified: bool,
    /// 로컬 인증 코드 흐름으로 확인된 이메일 소유 여부
    ///
    /// 소셜 단언과 별개의 플래그입니다. 비밀번호 로그인은 이 플래그가
    /// true여야 허용됩니다.
    pub local_email_verified: bool,
    /// 프로필 이미지 URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// 이메일 인증 코드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<OneTimeCode>,
    /// 비밀번호 재설정 코드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_code: Option<OneTimeCode>,
    /// 기기별 세션 목록 (최대 [`SessionConfig::max_sessions`]개)
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// 낙관적 잠금 버전 (세션/연결 쓰기마다 증가)
    #[serde(default)]
    pub version: i64,
    /// 생성 시간
    pub created_at: DateTime,
    /// 수정 시간
    pub updated_at: DateTime,
}

impl User {
    /// 새 로컬 사용자 생성 (이메일/패스워드)
    ///
    /// 이메일 인증 코드 확인 전이므로 `local_email_verified`는 false로
    /// 시작합니다.
    pub fn new_local(email: String, username: String, password_hash: String) -> Self {
        let now = DateTime::now();

        Self {
            id: None,
            username: Some(username),
            email: Some(email.to_lowercase()),
            password_hash: Some(password_hash),
            providers: vec![ProviderKind::Local],
            provider_tokens: ProviderTokens::default(),
            is_email_verified: false,
            local_email_verified: false,
            avatar: None,
            verification_code: None,
            reset_password_code: None,
            sessions: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 새 소셜 사용자 생성
    ///
    /// 프로바이더가 단언한 신원으로 계정을 만듭니다. 이메일이 단언된
    /// 경우 `is_email_verified`가 true로 시작합니다.
    pub fn new_oauth(identity: &NormalizedIdentity) -> Self {
        let now = DateTime::now();

        let mut provider_tokens = ProviderTokens::default();
        provider_tokens.set(identity.kind, identity.to_linkage());

        Self {
            id: None,
            username: Some(identity.display_name.clone()),
            email: identity.email.as_ref().map(|e| e.to_lowercase()),
            password_hash: None,
            providers: vec![identity.kind],
            provider_tokens,
            is_email_verified: identity.email.is_some() && identity.email_verified,
            local_email_verified: false,
            avatar: identity.avatar_url.clone(),
            verification_code: None,
            reset_password_code: None,
            sessions: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// ID 문자열로 변환
    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.to_hex())
    }

    /// 해당 프로바이더가 연결되어 있는지 확인
    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.providers.contains(&kind)
    }

    /// 소셜 전용(로컬 미연결) 계정인지 확인
    pub fn is_third_party_only(&self) -> bool {
        !self.has_provider(ProviderKind::Local)
    }

    /// 비밀번호 인증이 가능한 사용자인지 확인
    pub fn can_authenticate_with_password(&self) -> bool {
        self.has_provider(ProviderKind::Local) && self.password_hash.is_some()
    }

    /// 연결된 외부 프로바이더 이름 목록
    pub fn external_provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.is_external())
            .map(|p| p.as_str().to_string())
            .collect()
    }

    /// 프로바이더 연결 정보를 병합합니다.
    ///
    /// 연결 정보는 통째로 덮어쓰고, 프로바이더 목록에 없으면 추가하며,
    /// 아바타는 비어 있을 때만 백필합니다.
    pub fn link_provider(&mut self, identity: &NormalizedIdentity) {
        self.provider_tokens.set(identity.kind, identity.to_linkage());

        if !self.has_provider(identity.kind) {
            self.providers.push(identity.kind);
        }

        if self.avatar.is_none() {
            self.avatar = identity.avatar_url.clone();
        }

        if identity.email.is_some() && identity.email_verified {
            self.is_email_verified = true;
        }
    }

    /// 리프레시 토큰으로 세션을 조회합니다.
    pub fn find_session(&self, refresh_token: &str) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|s| s.refresh_token == refresh_token)
    }

    /// 세션을 추가하거나 교체합니다. 퇴출된 세션을 반환합니다.
    ///
    /// - 동일한 기기 지문의 세션이 있으면 해당 자리에서 교체합니다
    ///   (목록 길이 불변).
    /// - 한도가 가득 찬 경우 `last_used_at`이 가장 오래된 세션을
    ///   제거합니다. 동률이면 먼저 삽입된(인덱스가 작은) 세션이
    ///   희생됩니다.
    pub fn upsert_session(&mut self, session: Session) -> Option<Session> {
        if let Some(existing) = self
            .sessions
            .iter_mut()
            .find(|s| s.device_fingerprint == session.device_fingerprint)
        {
            *existing = session;
            return None;
        }

        let mut evicted = None;
        if self.sessions.len() >= SessionConfig::max_sessions() {
            // 엄격한 비교(<)라서 동률일 때 앞선 인덱스가 유지되어
            // 먼저 삽입된 세션이 희생자로 남는다
            let mut victim = 0;
            for (i, s) in self.sessions.iter().enumerate() {
                if s.last_used_at < self.sessions[victim].last_used_at {
                    victim = i;
                }
            }
            evicted = Some(self.sessions.remove(victim));
        }

        self.sessions.push(session);
        evicted
    }

    /// 리프레시 토큰과 일치하는 세션을 제거합니다.
    ///
    /// 제거 여부를 반환합니다.
    pub fn remove_session(&mut self, refresh_token: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.refresh_token != refresh_token);
        self.sessions.len() < before
    }

    /// 모든 세션을 제거합니다.
    pub fn clear_sessions(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::DateTime;

    fn session_at(fingerprint: &str, last_used_millis: i64) -> Session {
        let mut session = Session::new(fingerprint.to_string(), format!("agent-{}", fingerprint));
        session.last_used_at = DateTime::from_millis(last_used_millis);
        session
    }

    fn local_user() -> User {
        User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "$2b$04$hash".to_string(),
        )
    }

    #[test]
    fn test_new_local_user_needs_verification() {
        let user = local_user();

        assert!(user.has_provider(ProviderKind::Local));
        assert!(!user.local_email_verified);
        assert!(!user.providers.is_empty());
        assert!(user.can_authenticate_with_password());
    }

    #[test]
    fn test_email_is_lowercased() {
        let user = User::new_local(
            "Alice@Example.COM".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_session_cap_is_never_exceeded() {
        let mut user = local_user();

        for i in 0..10 {
            user.upsert_session(session_at(&format!("fp{}", i), 1000 + i));
            assert!(user.sessions.len() <= 5);
        }

        assert_eq!(user.sessions.len(), 5);
    }

    #[test]
    fn test_sixth_device_evicts_least_recently_used() {
        let mut user = local_user();

        // T1..T5, T3가 가장 오래 전에 사용됨
        user.upsert_session(session_at("fp1", 5000));
        user.upsert_session(session_at("fp2", 4000));
        user.upsert_session(session_at("fp3", 1000));
        user.upsert_session(session_at("fp4", 3000));
        user.upsert_session(session_at("fp5", 2000));

        let evicted = user.upsert_session(session_at("fp6", 6000));

        assert_eq!(evicted.unwrap().device_fingerprint, "fp3");
        assert_eq!(user.sessions.len(), 5);
        assert!(user
            .sessions
            .iter()
            .any(|s| s.device_fingerprint == "fp6"));
        assert!(!user
            .sessions
            .iter()
            .any(|s| s.device_fingerprint == "fp3"));
    }

    #[test]
    fn test_eviction_tie_break_prefers_earlier_insertion() {
        let mut user = local_user();

        // 모두 동일한 last_used_at
        for i in 1..=5 {
            user.upsert_session(session_at(&format!("fp{}", i), 1000));
        }

        let evicted = user.upsert_session(session_at("fp6", 2000));

        // 먼저 삽입된 fp1이 희생
        assert_eq!(evicted.unwrap().device_fingerprint, "fp1");
    }

    #[test]
    fn test_same_fingerprint_replaces_in_place() {
        let mut user = local_user();

        user.upsert_session(session_at("fp1", 1000));
        user.upsert_session(session_at("fp2", 2000));
        let old_token = user.sessions[0].refresh_token.clone();

        let evicted = user.upsert_session(session_at("fp1", 3000));

        assert!(evicted.is_none());
        assert_eq!(user.sessions.len(), 2);
        // 제자리 교체: 순서 유지, 토큰은 새 값
        assert_eq!(user.sessions[0].device_fingerprint, "fp1");
        assert_ne!(user.sessions[0].refresh_token, old_token);
        assert!(user.find_session(&old_token).is_none());
    }

    #[test]
    fn test_full_list_same_fingerprint_does_not_evict() {
        let mut user = local_user();

        for i in 1..=5 {
            user.upsert_session(session_at(&format!("fp{}", i), 1000 + i));
        }

        let evicted = user.upsert_session(session_at("fp3", 9000));

        assert!(evicted.is_none());
        assert_eq!(user.sessions.len(), 5);
    }

    #[test]
    fn test_remove_session_by_token() {
        let mut user = local_user();
        user.upsert_session(session_at("fp1", 1000));
        let token = user.sessions[0].refresh_token.clone();

        assert!(user.remove_session(&token));
        assert!(user.find_session(&token).is_none());
        assert!(!user.remove_session(&token));
    }

    #[test]
    fn test_clear_sessions() {
        let mut user = local_user();
        user.upsert_session(session_at("fp1", 1000));
        user.upsert_session(session_at("fp2", 2000));

        user.clear_sessions();

        assert!(user.sessions.is_empty());
    }

    #[test]
    fn test_link_provider_merges_into_local_account() {
        let mut user = local_user();

        let identity = NormalizedIdentity {
            kind: ProviderKind::Google,
            provider_user_id: "g-123".to_string(),
            email: Some("alice@example.com".to_string()),
            email_verified: true,
            display_name: "Alice".to_string(),
            avatar_url: Some("https://img.example/alice.png".to_string()),
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
        };

        user.link_provider(&identity);

        assert!(user.has_provider(ProviderKind::Local));
        assert!(user.has_provider(ProviderKind::Google));
        assert!(user.is_email_verified);
        assert_eq!(
            user.provider_tokens
                .get(ProviderKind::Google)
                .unwrap()
                .provider_user_id,
            "g-123"
        );
        // 아바타 백필
        assert!(user.avatar.is_some());
    }

    #[test]
    fn test_third_party_only_detection() {
        let identity = NormalizedIdentity {
            kind: ProviderKind::Line,
            provider_user_id: "U-9".to_string(),
            email: None,
            email_verified: false,
            display_name: "Bob".to_string(),
            avatar_url: None,
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            expires_at: None,
        };
        let user = User::new_oauth(&identity);

        assert!(user.is_third_party_only());
        assert!(!user.can_authenticate_with_password());
        assert_eq!(user.external_provider_names(), vec!["line".to_string()]);
        assert!(!user.providers.is_empty());
    }
}
