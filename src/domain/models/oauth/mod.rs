//! 외부 인증 프로바이더 도메인 모델
//!
//! 프로바이더 종류, 계정 연결 정보, 그리고 프로바이더가 단언한
//! 정규화된 신원 표현을 정의합니다.

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// 지원하는 인증 프로바이더 종류
///
/// 사용자 문서의 `providers` 배열과 연결 정보 조회 키로 사용됩니다.
/// 소문자 문자열로 직렬화되어 MongoDB와 API 응답 양쪽에서 동일하게
/// 표현됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 로컬 이메일/패스워드 인증
    Local,
    /// Google 로그인 (ID 토큰 검증 방식)
    Google,
    /// LINE 로그인 (인가 코드 교환 방식)
    Line,
}

impl ProviderKind {
    /// 문자열에서 ProviderKind를 생성합니다.
    ///
    /// # Arguments
    ///
    /// * `s` - 프로바이더 이름 (대소문자 무관)
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "google" => Ok(ProviderKind::Google),
            "line" => Ok(ProviderKind::Line),
            _ => Err(format!("Unsupported auth provider: {}", s)),
        }
    }

    /// ProviderKind를 소문자 문자열로 변환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Local => "local",
            ProviderKind::Google => "google",
            ProviderKind::Line => "line",
        }
    }

    /// 외부(소셜) 프로바이더 여부를 반환합니다.
    pub fn is_external(&self) -> bool {
        !matches!(self, ProviderKind::Local)
    }
}

/// 프로바이더 계정 연결 정보
///
/// 사용자 문서에 임베드되어 프로바이더별 사용자 ID와 토큰 자료를
/// 보관합니다. 프로바이더 인증이 성공할 때마다 통째로 갱신되며,
/// 로그아웃 해지 후에는 토큰 자료만 비우고 `provider_user_id`는
/// 유지합니다 (재로그인 시 프로바이더 ID 조회가 가능해야 하므로).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderLinkage {
    /// 프로바이더가 발급한 사용자 고유 ID
    pub provider_user_id: String,
    /// 프로바이더 액세스 토큰 (해지 후 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// 프로바이더 리프레시 토큰 (발급된 경우에만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// 프로바이더 토큰 만료 시각
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime>,
    /// 프로바이더 프로필의 표시 이름
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ProviderLinkage {
    /// 로그아웃 해지 후 토큰 자료를 비웁니다.
    ///
    /// `provider_user_id`는 유지됩니다.
    pub fn strip_tokens(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.expires_at = None;
    }
}

/// 프로바이더 종류별 연결 정보 컨테이너
///
/// MongoDB 문서 형태를 고정하기 위해 프로바이더별 명시적 필드로
/// 표현하며, [`ProviderKind`] 키 기반의 접근자를 제공합니다.
/// 로컬 인증은 연결 정보가 없습니다 (패스워드 해시가 대신합니다).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderTokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<ProviderLinkage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<ProviderLinkage>,
}

impl ProviderTokens {
    /// 프로바이더 종류로 연결 정보를 조회합니다.
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderLinkage> {
        match kind {
            ProviderKind::Google => self.google.as_ref(),
            ProviderKind::Line => self.line.as_ref(),
            ProviderKind::Local => None,
        }
    }

    /// 프로바이더 종류로 가변 연결 정보를 조회합니다.
    pub fn get_mut(&mut self, kind: ProviderKind) -> Option<&mut ProviderLinkage> {
        match kind {
            ProviderKind::Google => self.google.as_mut(),
            ProviderKind::Line => self.line.as_mut(),
            ProviderKind::Local => None,
        }
    }

    /// 프로바이더 연결 정보를 설정(덮어쓰기)합니다.
    ///
    /// 로컬 프로바이더는 연결 정보를 갖지 않으므로 무시됩니다.
    pub fn set(&mut self, kind: ProviderKind, linkage: ProviderLinkage) {
        match kind {
            ProviderKind::Google => self.google = Some(linkage),
            ProviderKind::Line => self.line = Some(linkage),
            ProviderKind::Local => {}
        }
    }
}

/// 프로바이더가 검증을 마치고 단언한 정규화된 신원
///
/// Google/LINE 게이트웨이의 `verify_assertion`이 반환하는 공통 표현으로,
/// 신원 해석기(IdentityResolver)는 프로바이더 세부 형식을 알 필요 없이
/// 이 구조체만 다룹니다.
#[derive(Debug, Clone)]
pub struct NormalizedIdentity {
    /// 신원을 단언한 프로바이더
    pub kind: ProviderKind,
    /// 프로바이더가 발급한 사용자 고유 ID
    pub provider_user_id: String,
    /// 프로바이더가 전달한 이메일 (없을 수 있음)
    pub email: Option<String>,
    /// 프로바이더가 해당 이메일의 소유를 단언했는지 여부
    ///
    /// false인 이메일은 기존 계정 병합 근거로 사용할 수 없습니다.
    pub email_verified: bool,
    /// 표시 이름
    pub display_name: String,
    /// 프로필 이미지 URL
    pub avatar_url: Option<String>,
    /// 프로바이더 액세스 토큰 (로그아웃 해지에 사용)
    pub access_token: String,
    /// 프로바이더 리프레시 토큰
    pub refresh_token: Option<String>,
    /// 프로바이더 토큰 만료 시각
    pub expires_at: Option<DateTime>,
}

impl NormalizedIdentity {
    /// 사용자 문서에 저장할 연결 정보로 변환합니다.
    pub fn to_linkage(&self) -> ProviderLinkage {
        ProviderLinkage {
            provider_user_id: self.provider_user_id.clone(),
            access_token: Some(self.access_token.clone()),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            display_name: Some(self.display_name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_roundtrip() {
        for s in ["local", "google", "line"] {
            let kind = ProviderKind::from_str(s).unwrap();
            assert_eq!(kind.as_str(), s);
        }

        // 대소문자 무관
        assert_eq!(ProviderKind::from_str("GOOGLE").unwrap(), ProviderKind::Google);
        assert!(ProviderKind::from_str("kakao").is_err());
    }

    #[test]
    fn test_provider_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Line).unwrap();
        assert_eq!(json, "\"line\"");
    }

    #[test]
    fn test_strip_tokens_keeps_provider_user_id() {
        let mut linkage = ProviderLinkage {
            provider_user_id: "U1234".to_string(),
            access_token: Some("at".to_string()),
            refresh_token: Some("rt".to_string()),
            expires_at: Some(DateTime::now()),
            display_name: Some("tester".to_string()),
        };

        linkage.strip_tokens();

        assert_eq!(linkage.provider_user_id, "U1234");
        assert!(linkage.access_token.is_none());
        assert!(linkage.refresh_token.is_none());
        assert!(linkage.expires_at.is_none());
    }

    #[test]
    fn test_provider_tokens_keyed_access() {
        let mut tokens = ProviderTokens::default();
        assert!(tokens.get(ProviderKind::Google).is_none());

        tokens.set(
            ProviderKind::Google,
            ProviderLinkage {
                provider_user_id: "g-1".to_string(),
                access_token: Some("at".to_string()),
                refresh_token: None,
                expires_at: None,
                display_name: None,
            },
        );

        assert_eq!(
            tokens.get(ProviderKind::Google).unwrap().provider_user_id,
            "g-1"
        );
        assert!(tokens.get(ProviderKind::Line).is_none());
        assert!(tokens.get(ProviderKind::Local).is_none());
    }
}
