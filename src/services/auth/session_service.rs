//! 세션 저장소 서비스 구현
//!
//! 사용자 문서에 임베드된 기기별 세션 목록을 관리합니다.
//! 읽고-고치고-쓰는 변경(로그인 시 upsert)은 낙관적 잠금과 제한된
//! 재시도로 보호되고, 단일 원소 제거와 타임스탬프 갱신은 저장소의
//! 원자 연산에 맡깁니다.
//!
//! ## 리프레시 흐름
//!
//! ```text
//! 쿠키의 토큰
//!   ├─ 세션 없음        → SESSION_TERMINATED (403)
//!   ├─ 절대 수명 초과    → 지연 퇴출 후 SESSION_EXPIRED (403)
//!   └─ 유효            → last_used_at 갱신 + 새 액세스 토큰 발급
//! ```
//!
//! 리프레시 토큰 자체는 회전하지 않습니다. 같은 기기의 동시 리프레시가
//! 서로를 로그아웃시키는 문제를 피하기 위한 의도적 결정입니다.

use std::sync::Arc;
use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use crate::domain::entities::users::{Session, User};
use crate::errors::errors::AppError;
use crate::repositories::users::UserRepository;
use crate::services::auth::TokenService;
use crate::utils::device::device_fingerprint;

/// 버전 충돌 시 최대 쓰기 시도 횟수
const MAX_WRITE_ATTEMPTS: usize = 3;

static INSTANCE: Lazy<Arc<SessionService>> = Lazy::new(|| {
    Arc::new(SessionService {
        user_repo: UserRepository::instance(),
        token_service: TokenService::instance(),
    })
});

/// 세션 저장소 서비스
pub struct SessionService {
    user_repo: Arc<UserRepository>,
    token_service: Arc<TokenService>,
}

impl SessionService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<SessionService> {
        INSTANCE.clone()
    }

    /// 로그인 성공 후 기기 세션을 추가/교체하고 리프레시 토큰을 반환합니다.
    ///
    /// 한도 초과 시 LRU 세션이 퇴출됩니다. 동시 로그인으로 버전이
    /// 충돌하면 최신 문서를 다시 읽어 최대 3회까지 재시도합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 재시도가 모두 충돌로 소진됨
    pub async fn establish(&self, user_id: &str, device_info: &str) -> Result<String, AppError> {
        let fingerprint = device_fingerprint(device_info);

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut user = self
                .user_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

            let user_oid = user
                .id
                .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;
            let expected_version = user.version;

            let session = Session::new(fingerprint.clone(), device_info.to_string());
            let refresh_token = session.refresh_token.clone();

            if let Some(evicted) = user.upsert_session(session) {
                log::info!(
                    "세션 한도 초과로 퇴출: 사용자 {}, 기기 {}",
                    user_id,
                    evicted.device_fingerprint
                );
            }

            let set_doc = UserRepository::sessions_set_doc(&user)?;

            match self
                .user_repo
                .update_versioned(&user_oid, expected_version, set_doc)
                .await?
            {
                Some(_) => return Ok(refresh_token),
                None => {
                    log::warn!(
                        "세션 저장 버전 충돌: 사용자 {}, 시도 {}/{}",
                        user_id,
                        attempt,
                        MAX_WRITE_ATTEMPTS
                    );
                }
            }
        }

        Err(AppError::InternalError(
            "동시 로그인 충돌로 세션 저장에 실패했습니다".to_string(),
        ))
    }

    /// 리프레시 토큰으로 세션을 보유한 사용자를 조회합니다.
    pub async fn find_user_by_token(&self, refresh_token: &str) -> Result<Option<User>, AppError> {
        self.user_repo.find_by_refresh_token(refresh_token).await
    }

    /// 리프레시 토큰을 검증하고 새 액세스 토큰을 발급합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::SessionTerminated` - 세션이 폐기/퇴출되어 존재하지 않음
    /// * `AppError::SessionExpired` - 절대 수명 초과 (세션은 지연 퇴출됨)
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let user = self
            .find_user_by_token(refresh_token)
            .await?
            .ok_or(AppError::SessionTerminated)?;

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        let session = user
            .find_session(refresh_token)
            .ok_or(AppError::SessionTerminated)?;

        if session.is_expired() {
            // 지연 퇴출: 만료된 세션은 발견 시점에 제거
            if let Err(e) = self.user_repo.pull_session(&user_oid, refresh_token).await {
                log::warn!("만료 세션 제거 실패: {}", e);
            }
            return Err(AppError::SessionExpired);
        }

        self.user_repo
            .touch_session(&user_oid, refresh_token)
            .await?;

        self.token_service.mint_access(&user_oid.to_hex())
    }

    /// 특정 세션을 제거합니다.
    ///
    /// 제거 여부를 반환합니다. 이미 없는 세션이어도 에러가 아닙니다.
    pub async fn remove(&self, user_id: &ObjectId, refresh_token: &str) -> Result<bool, AppError> {
        self.user_repo.pull_session(user_id, refresh_token).await
    }

    /// 사용자의 모든 세션을 제거합니다.
    pub async fn remove_all(&self, user_id: &ObjectId) -> Result<(), AppError> {
        self.user_repo.clear_sessions(user_id).await
    }
}
