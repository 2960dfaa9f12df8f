//! 인증 요청 DTO
//!
//! validator 파생 매크로로 입력 검증 규칙을 선언합니다.
//! 핸들러는 `payload.validate()` 호출 후 비즈니스 로직으로 진행합니다.

use serde::Deserialize;
use validator::Validate;

/// 회원가입 요청
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    /// 가입 이메일
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,

    /// 비밀번호 (8자 이상)
    #[validate(length(min = 8, message = "비밀번호는 최소 8자 이상이어야 합니다"))]
    pub password: String,

    /// 표시 이름 (생략 시 이메일 로컬 파트 사용)
    #[validate(length(min = 2, max = 30, message = "사용자 이름은 2-30자여야 합니다"))]
    pub username: Option<String>,
}

/// 로컬 로그인 요청
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,

    #[validate(length(min = 1, message = "비밀번호를 입력해주세요"))]
    pub password: String,
}

/// Google 로그인 요청 (서명된 ID 토큰)
#[derive(Debug, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    #[validate(length(min = 1, message = "Google 토큰이 필요합니다"))]
    pub token: String,
}

/// LINE 로그인 요청 (인가 코드)
#[derive(Debug, Deserialize, Validate)]
pub struct LineSignInRequest {
    #[validate(length(min = 1, message = "LINE 인가 코드가 필요합니다"))]
    pub code: String,
}

/// 로그아웃 쿼리 파라미터
#[derive(Debug, Deserialize)]
pub struct SignOutQuery {
    /// "true"인 경우 모든 기기에서 로그아웃
    #[serde(rename = "allDevices")]
    pub all_devices: Option<String>,
}

impl SignOutQuery {
    /// 전체 기기 로그아웃 여부
    pub fn all_devices(&self) -> bool {
        self.all_devices.as_deref() == Some("true")
    }
}

/// 인증 코드 발송 요청
#[derive(Debug, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
}

/// 인증 코드 확인 요청
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyCodeRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,

    #[validate(length(equal = 6, message = "인증 코드는 6자리입니다"))]
    pub code: String,
}

/// 비밀번호 재설정 코드 발송 요청
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,
}

/// 비밀번호 재설정 요청
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "이메일 형식이 올바르지 않습니다"))]
    pub email: String,

    #[validate(length(equal = 6, message = "인증 코드는 6자리입니다"))]
    pub code: String,

    #[serde(rename = "newPassword")]
    #[validate(length(min = 8, message = "비밀번호는 최소 8자 이상이어야 합니다"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_request_validation() {
        let valid = SignUpRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
            username: Some("alice".to_string()),
        };
        assert!(valid.validate().is_ok());

        let bad_email = SignUpRequest {
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
            username: None,
        };
        assert!(bad_email.validate().is_err());

        let short_password = SignUpRequest {
            email: "alice@example.com".to_string(),
            password: "short".to_string(),
            username: None,
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_sign_out_query_flag() {
        let on = SignOutQuery {
            all_devices: Some("true".to_string()),
        };
        let off = SignOutQuery {
            all_devices: Some("false".to_string()),
        };
        let missing = SignOutQuery { all_devices: None };

        assert!(on.all_devices());
        assert!(!off.all_devices());
        assert!(!missing.all_devices());
    }

    #[test]
    fn test_verify_code_length() {
        let valid = VerifyCodeRequest {
            email: "alice@example.com".to_string(),
            code: "123456".to_string(),
        };
        assert!(valid.validate().is_ok());

        let short = VerifyCodeRequest {
            email: "alice@example.com".to_string(),
            code: "123".to_string(),
        };
        assert!(short.validate().is_err());
    }
}
