//! 인증 응답 DTO
//!
//! 클라이언트 계약은 camelCase이며, 비밀번호 해시/세션 토큰 등
//! 민감 정보는 절대 응답에 포함되지 않습니다.

use serde::Serialize;
use crate::domain::entities::users::{Session, User};

/// 사용자 공개 프로필 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub providers: Vec<String>,
    pub is_email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_string().unwrap_or_default(),
            username: user.username.clone(),
            email: user.email.clone(),
            providers: user.providers.iter().map(|p| p.as_str().to_string()).collect(),
            is_email_verified: user.is_email_verified || user.local_email_verified,
            avatar: user.avatar.clone(),
            created_at: user.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// 활성 세션 목록의 항목
///
/// 리프레시 토큰은 노출하지 않고 기기 정보와 최근 사용 시각만
/// 반환합니다.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub device_info: String,
    pub last_used: String,
    pub is_current: bool,
}

impl SessionView {
    /// 세션 레코드를 응답 형태로 변환합니다.
    ///
    /// `current_token`은 요청 쿠키의 리프레시 토큰으로, 현재 기기
    /// 표시에 사용됩니다.
    pub fn from_session(session: &Session, current_token: Option<&str>) -> Self {
        Self {
            device_info: session.device_info.clone(),
            last_used: session
                .last_used_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
            is_current: current_token == Some(session.refresh_token.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "secret-hash".to_string(),
        );

        let response = UserResponse::from(&user);
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(json.contains("alice@example.com"));
        assert!(json.contains("\"providers\":[\"local\"]"));
    }

    #[test]
    fn test_session_view_marks_current_device() {
        let session = Session::new("fp".to_string(), "Mozilla/5.0".to_string());
        let token = session.refresh_token.clone();

        let current = SessionView::from_session(&session, Some(&token));
        let other = SessionView::from_session(&session, Some("different"));
        let anonymous = SessionView::from_session(&session, None);

        assert!(current.is_current);
        assert!(!other.is_current);
        assert!(!anonymous.is_current);

        // 토큰 자체는 응답에 포함되지 않음
        let json = serde_json::to_string(&current).unwrap();
        assert!(!json.contains(&token));
    }
}
