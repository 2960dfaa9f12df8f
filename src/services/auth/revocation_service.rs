//! 로그아웃 조정 서비스 구현
//!
//! 세션 제거와 프로바이더 토큰 해지를 순서대로 수행합니다.
//! 세션 제거가 먼저이고, 프로바이더 해지는 그 다음의 최선 노력입니다.
//! 프로바이더 해지 실패는 로그만 남기고 성공으로 처리되며, 세션 제거의
//! 저장소 오류만 호출자에게 전파됩니다.
//!
//! 로그아웃은 멱등합니다. 이미 사라진 세션의 토큰으로 다시 요청해도
//! 에러가 아닙니다.

use std::sync::Arc;
use mongodb::bson::{self, doc};
use once_cell::sync::Lazy;
use crate::domain::entities::users::User;
use crate::domain::models::oauth::ProviderKind;
use crate::errors::errors::AppError;
use crate::repositories::users::UserRepository;
use crate::services::auth::{gateway_for, ProviderGateway, SessionService};

static INSTANCE: Lazy<Arc<RevocationService>> = Lazy::new(|| {
    Arc::new(RevocationService {
        user_repo: UserRepository::instance(),
        session_service: SessionService::instance(),
    })
});

/// 로그아웃 조정 서비스
pub struct RevocationService {
    user_repo: Arc<UserRepository>,
    session_service: Arc<SessionService>,
}

impl RevocationService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<RevocationService> {
        INSTANCE.clone()
    }

    /// 로그아웃을 수행합니다.
    ///
    /// # Arguments
    ///
    /// * `refresh_token` - 쿠키에서 꺼낸 리프레시 토큰
    /// * `all_devices` - true면 모든 기기 세션을 종료
    ///
    /// # Errors
    ///
    /// * `AppError::DatabaseError` - 세션 제거 중 저장소 오류
    ///
    /// 토큰에 해당하는 세션이 이미 없으면 조용히 성공합니다.
    /// 프로바이더 해지 실패는 로그만 남기고 전파하지 않습니다.
    pub async fn sign_out(&self, refresh_token: &str, all_devices: bool) -> Result<(), AppError> {
        let mut user = match self.session_service.find_user_by_token(refresh_token).await? {
            Some(user) => user,
            None => {
                // 멱등: 이미 퇴출/만료된 세션의 재로그아웃
                log::info!("이미 종료된 세션의 로그아웃 요청");
                return Ok(());
            }
        };

        let user_oid = user
            .id
            .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;

        if all_devices {
            self.session_service.remove_all(&user_oid).await?;
            log::info!("전체 기기 로그아웃: 사용자 {}", user_oid.to_hex());
        } else {
            self.session_service.remove(&user_oid, refresh_token).await?;
            log::info!("단일 기기 로그아웃: 사용자 {}", user_oid.to_hex());
        }

        self.revoke_provider_tokens(&mut user).await;

        Ok(())
    }

    /// 연결된 외부 프로바이더의 토큰을 해지하고, 비워진 토큰 자료를
    /// 문서에 저장합니다 (최선 노력).
    async fn revoke_provider_tokens(&self, user: &mut User) {
        if !revoke_linked_tokens(user, gateway_for).await {
            return;
        }

        // 비워진 토큰 자료 저장. 동시 로그인이 새 토큰을 쓰는 경우
        // 다음 로그인에서 다시 채워지므로 버전 검사 없이 기록한다.
        let Some(user_oid) = user.id else { return };
        match bson::to_bson(&user.provider_tokens) {
            Ok(tokens) => {
                if let Err(e) = self
                    .user_repo
                    .update(&user_oid, doc! { "provider_tokens": tokens })
                    .await
                {
                    log::warn!("프로바이더 토큰 정리 저장 실패: {}", e);
                }
            }
            Err(e) => {
                log::warn!("프로바이더 토큰 직렬화 실패: {}", e);
            }
        }
    }
}

/// 연결된 외부 프로바이더마다 한 번씩 토큰을 해지하고 토큰 자료를
/// 비웁니다.
///
/// `lookup`은 프로바이더 종류에 맞는 게이트웨이를 돌려주는 디스패처로,
/// 운영 코드에서는 [`gateway_for`]입니다.
///
/// # Returns
///
/// 하나라도 토큰 자료를 비웠으면 true
async fn revoke_linked_tokens<F>(user: &mut User, lookup: F) -> bool
where
    F: Fn(ProviderKind) -> Option<Arc<dyn ProviderGateway>>,
{
    let mut stripped_any = false;

    for kind in user.providers.clone() {
        let Some(gateway) = lookup(kind) else {
            continue;
        };

        let Some(linkage) = user.provider_tokens.get_mut(kind) else {
            continue;
        };

        if let Some(access_token) = linkage.access_token.take() {
            gateway.revoke(&access_token).await;
        }
        linkage.strip_tokens();
        stripped_any = true;
    }

    stripped_any
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    use crate::domain::models::oauth::NormalizedIdentity;

    /// 해지 호출 횟수를 세는 게이트웨이
    struct CountingGateway {
        kind: ProviderKind,
        revokes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProviderGateway for CountingGateway {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn verify_assertion(
            &self,
            _credential: &str,
        ) -> Result<NormalizedIdentity, AppError> {
            Err(AppError::InternalError("검증 경로 아님".to_string()))
        }

        async fn revoke(&self, _access_token: &str) {
            self.revokes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn identity(kind: ProviderKind, provider_user_id: &str) -> NormalizedIdentity {
        NormalizedIdentity {
            kind,
            provider_user_id: provider_user_id.to_string(),
            email: None,
            email_verified: false,
            display_name: "tester".to_string(),
            avatar_url: None,
            access_token: "provider-access-token".to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[actix_web::test]
    async fn test_revokes_exactly_once_per_linked_provider() {
        let mut user = User::new_oauth(&identity(ProviderKind::Google, "g-1"));
        user.link_provider(&identity(ProviderKind::Line, "U-1"));

        let google_revokes = Arc::new(AtomicUsize::new(0));
        let line_revokes = Arc::new(AtomicUsize::new(0));
        let google: Arc<dyn ProviderGateway> = Arc::new(CountingGateway {
            kind: ProviderKind::Google,
            revokes: google_revokes.clone(),
        });
        let line: Arc<dyn ProviderGateway> = Arc::new(CountingGateway {
            kind: ProviderKind::Line,
            revokes: line_revokes.clone(),
        });

        let stripped = revoke_linked_tokens(&mut user, |kind| match kind {
            ProviderKind::Google => Some(google.clone()),
            ProviderKind::Line => Some(line.clone()),
            ProviderKind::Local => None,
        })
        .await;

        assert!(stripped);
        assert_eq!(google_revokes.load(Ordering::SeqCst), 1);
        assert_eq!(line_revokes.load(Ordering::SeqCst), 1);

        // 토큰 자료는 비워지고 provider_user_id는 유지된다
        let google_linkage = user.provider_tokens.get(ProviderKind::Google).unwrap();
        let line_linkage = user.provider_tokens.get(ProviderKind::Line).unwrap();
        assert!(google_linkage.access_token.is_none());
        assert!(line_linkage.access_token.is_none());
        assert_eq!(line_linkage.provider_user_id, "U-1");
    }

    #[actix_web::test]
    async fn test_already_stripped_linkage_skips_revoke_call() {
        let mut user = User::new_oauth(&identity(ProviderKind::Google, "g-1"));
        user.provider_tokens
            .get_mut(ProviderKind::Google)
            .unwrap()
            .strip_tokens();

        let revokes = Arc::new(AtomicUsize::new(0));
        let google: Arc<dyn ProviderGateway> = Arc::new(CountingGateway {
            kind: ProviderKind::Google,
            revokes: revokes.clone(),
        });

        let stripped = revoke_linked_tokens(&mut user, |kind| match kind {
            ProviderKind::Google => Some(google.clone()),
            _ => None,
        })
        .await;

        // 해지할 토큰이 없어도 연결 정보 정리는 수행된다
        assert!(stripped);
        assert_eq!(revokes.load(Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn test_local_only_user_has_nothing_to_revoke() {
        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );

        // 로컬 프로바이더는 게이트웨이가 없으므로 루프가 건너뛴다
        let stripped = revoke_linked_tokens(&mut user, gateway_for).await;

        assert!(!stripped);
    }
}
