//! 외부 인증 프로바이더 게이트웨이 추상화
//!
//! 신원 해석기와 로그아웃 조정자는 프로바이더별 세부 사항(토큰 형식,
//! 엔드포인트)을 알 필요 없이 이 trait만 사용합니다.

use std::sync::Arc;
use async_trait::async_trait;
use crate::domain::models::oauth::{NormalizedIdentity, ProviderKind};
use crate::errors::errors::AppError;
use crate::services::auth::{GoogleAuthService, LineAuthService};

/// 외부 인증 프로바이더 게이트웨이
///
/// `verify_assertion`은 클라이언트가 제출한 자격 증명(Google ID 토큰,
/// LINE 인가 코드)을 프로바이더 방식대로 검증하고 정규화된 신원을
/// 반환합니다. `revoke`는 최선 노력(best-effort)이며 실패는 로그로만
/// 남기고 절대 호출자에게 전파하지 않습니다.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// 이 게이트웨이가 담당하는 프로바이더
    fn kind(&self) -> ProviderKind;

    /// 클라이언트가 제출한 자격 증명을 검증합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::ProviderVerificationFailed` - 프로바이더가 자격 증명을 거부
    /// * `AppError::ExternalServiceError` - 프로바이더 연결 실패
    async fn verify_assertion(&self, credential: &str) -> Result<NormalizedIdentity, AppError>;

    /// 저장된 프로바이더 토큰을 해지합니다 (최선 노력).
    ///
    /// 실패해도 로그만 남기며, 로그아웃 흐름을 막지 않습니다.
    async fn revoke(&self, access_token: &str);
}

/// 프로바이더 종류에 맞는 게이트웨이를 반환합니다.
///
/// 로컬 프로바이더는 외부 게이트웨이가 없으므로 None입니다.
pub fn gateway_for(kind: ProviderKind) -> Option<Arc<dyn ProviderGateway>> {
    match kind {
        ProviderKind::Google => Some(GoogleAuthService::instance()),
        ProviderKind::Line => Some(LineAuthService::instance()),
        ProviderKind::Local => None,
    }
}
