//! 이메일 인증/비밀번호 재설정 코드 서비스 구현
//!
//! 6자리 숫자 코드의 발급과 확인을 담당합니다. 코드는 10분(설정값)
//! 후 만료되며, 확인에 성공하면 즉시 문서에서 제거됩니다.
//!
//! 코드 필드는 세션 목록과 무관하므로 버전 검사 없는 부분 갱신을
//! 사용합니다.

use std::sync::Arc;
use mongodb::bson::{self, doc};
use once_cell::sync::Lazy;
use crate::config::PasswordConfig;
use crate::domain::entities::users::{OneTimeCode, User};
use crate::domain::models::oauth::ProviderKind;
use crate::errors::errors::AppError;
use crate::repositories::users::UserRepository;
use crate::utils::device::numeric_code;

static INSTANCE: Lazy<Arc<VerificationService>> = Lazy::new(|| {
    Arc::new(VerificationService {
        user_repo: UserRepository::instance(),
    })
});

/// 이메일 인증/비밀번호 재설정 코드 서비스
pub struct VerificationService {
    user_repo: Arc<UserRepository>,
}

impl VerificationService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<VerificationService> {
        INSTANCE.clone()
    }

    /// 이메일 인증 코드를 (재)발급합니다.
    ///
    /// # Returns
    ///
    /// 발송할 6자리 코드
    ///
    /// # Errors
    ///
    /// * `AppError::NotFound` - 가입되지 않은 이메일
    /// * `AppError::ConflictError` - 이미 인증이 끝난 이메일
    pub async fn send_code(&self, email: &str) -> Result<String, AppError> {
        let user = self.require_user(email).await?;

        if user.local_email_verified {
            return Err(AppError::ConflictError(
                "이미 인증된 이메일입니다".to_string(),
            ));
        }

        let code = numeric_code();
        let verification = bson::to_bson(&OneTimeCode::new(code.clone()))
            .map_err(|e| AppError::InternalError(format!("인증 코드 직렬화 실패: {}", e)))?;

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        self.user_repo
            .update(&user_oid, doc! { "verification_code": verification })
            .await?;

        log::info!("이메일 인증 코드 발급: {}", email.to_lowercase());
        Ok(code)
    }

    /// 인증 코드를 확인하고 로컬 이메일을 인증 상태로 전환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 코드 불일치 또는 만료
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        let user = self.require_user(email).await?;

        check_code(user.verification_code.as_ref(), code)?;

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        self.user_repo
            .update(
                &user_oid,
                doc! {
                    "local_email_verified": true,
                    "verification_code": bson::Bson::Null,
                },
            )
            .await?;

        log::info!("✅ 이메일 인증 완료: {}", email.to_lowercase());
        Ok(())
    }

    /// 비밀번호 재설정 코드를 발급합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ThirdPartyOnly` - 로컬 인증 수단이 없는 소셜 전용 계정
    pub async fn forgot_password(&self, email: &str) -> Result<String, AppError> {
        let user = self.require_user(email).await?;

        if !user.has_provider(ProviderKind::Local) {
            return Err(AppError::ThirdPartyOnly {
                providers: user.external_provider_names(),
            });
        }

        let code = numeric_code();
        let reset = bson::to_bson(&OneTimeCode::new(code.clone()))
            .map_err(|e| AppError::InternalError(format!("재설정 코드 직렬화 실패: {}", e)))?;

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        self.user_repo
            .update(&user_oid, doc! { "reset_password_code": reset })
            .await?;

        log::info!("비밀번호 재설정 코드 발급: {}", email.to_lowercase());
        Ok(code)
    }

    /// 재설정 코드를 확인하고 새 비밀번호로 교체합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 코드 불일치 또는 만료
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.require_user(email).await?;

        check_code(user.reset_password_code.as_ref(), code)?;

        let password_hash = bcrypt::hash(new_password, PasswordConfig::bcrypt_cost())
            .map_err(|e| AppError::InternalError(format!("비밀번호 해시 실패: {}", e)))?;

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        self.user_repo
            .update(
                &user_oid,
                doc! {
                    "password_hash": password_hash,
                    "reset_password_code": bson::Bson::Null,
                },
            )
            .await?;

        log::info!("✅ 비밀번호 재설정 완료: {}", email.to_lowercase());
        Ok(())
    }

    async fn require_user(&self, email: &str) -> Result<User, AppError> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("가입되지 않은 이메일입니다".to_string()))
    }
}

/// 제출된 코드를 저장된 코드와 대조합니다.
fn check_code(stored: Option<&OneTimeCode>, submitted: &str) -> Result<(), AppError> {
    let stored = stored.ok_or_else(|| {
        AppError::ValidationError("발급된 인증 코드가 없습니다".to_string())
    })?;

    if stored.is_expired() {
        return Err(AppError::ValidationError(
            "인증 코드가 만료되었습니다".to_string(),
        ));
    }

    if stored.code != submitted {
        return Err(AppError::ValidationError(
            "인증 코드가 일치하지 않습니다".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::DateTime;

    #[test]
    fn test_check_code_accepts_matching_code() {
        let stored = OneTimeCode::new("123456".to_string());
        assert!(check_code(Some(&stored), "123456").is_ok());
    }

    #[test]
    fn test_check_code_rejects_mismatch() {
        let stored = OneTimeCode::new("123456".to_string());
        assert!(matches!(
            check_code(Some(&stored), "654321"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_check_code_rejects_expired() {
        let stored = OneTimeCode {
            code: "123456".to_string(),
            expires_at: DateTime::from_millis(DateTime::now().timestamp_millis() - 1000),
        };
        assert!(matches!(
            check_code(Some(&stored), "123456"),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_check_code_rejects_missing() {
        assert!(matches!(
            check_code(None, "123456"),
            Err(AppError::ValidationError(_))
        ));
    }
}
