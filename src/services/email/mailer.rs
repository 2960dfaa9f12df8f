//! 메일 발송 추상화
//!
//! 인증 코드와 비밀번호 재설정 코드의 발송 창구입니다. 실제 전송은
//! 외부 협력자의 몫이고, 기본 구현은 로그로 발송을 대신합니다.
//! 운영 환경에서는 이 trait 구현을 교체하면 됩니다.

use std::sync::Arc;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use crate::errors::errors::AppError;

static INSTANCE: Lazy<Arc<dyn Mailer>> = Lazy::new(|| Arc::new(LogMailer));

/// 코드 발송 창구
#[async_trait]
pub trait Mailer: Send + Sync {
    /// 이메일 인증 코드를 발송합니다.
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), AppError>;

    /// 비밀번호 재설정 코드를 발송합니다.
    async fn send_password_reset_code(&self, email: &str, code: &str) -> Result<(), AppError>;
}

/// 현재 구성된 Mailer를 반환합니다.
pub fn instance() -> Arc<dyn Mailer> {
    INSTANCE.clone()
}

/// 발송 내용을 로그로 남기는 기본 구현
struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        log::info!("📧 [인증 코드] {} → {}", email, code);
        Ok(())
    }

    async fn send_password_reset_code(&self, email: &str, code: &str) -> Result<(), AppError> {
        log::info!("📧 [재설정 코드] {} → {}", email, code);
        Ok(())
    }
}
