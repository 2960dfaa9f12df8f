//! 사용자 신원 해석 서비스 구현
//!
//! 로컬 가입과 소셜 로그인 양쪽의 계정 생성/병합/검증을 담당합니다.
//!
//! ## 소셜 신원 해석 순서
//!
//! ```text
//! 정규화된 신원
//!   │
//!   ├─ 1. 프로바이더 사용자 ID로 조회 ── 있음 → 연결 갱신 후 반환
//!   │
//!   ├─ 2. 검증된 이메일로 조회 ──────── 있음 → 병합 게이트 통과 시 연결
//!   │                                         (다른 소셜 연결 시 IDENTITY_CONFLICT)
//!   │
//!   └─ 3. 새 소셜 계정 생성 (이메일 중복 경합 시 1회 재해석)
//! ```
//!
//! 검증되지 않은 이메일은 병합 근거로 쓰지 않습니다. 같은 주소를
//! 주장만 하는 계정이 기존 계정을 가로채는 일을 막기 위해서입니다.

use std::sync::Arc;
use mongodb::bson::{self, doc, Document};
use once_cell::sync::Lazy;
use crate::config::PasswordConfig;
use crate::domain::entities::users::{OneTimeCode, User};
use crate::domain::models::oauth::{NormalizedIdentity, ProviderKind};
use crate::errors::errors::AppError;
use crate::repositories::users::UserRepository;
use crate::utils::device::numeric_code;

/// 버전 충돌 시 최대 쓰기 시도 횟수
const MAX_WRITE_ATTEMPTS: usize = 3;

static INSTANCE: Lazy<Arc<UserService>> = Lazy::new(|| {
    Arc::new(UserService {
        user_repo: UserRepository::instance(),
    })
});

/// 사용자 신원 해석 서비스
pub struct UserService {
    user_repo: Arc<UserRepository>,
}

impl UserService {
    /// 싱글톤 인스턴스를 반환합니다.
    pub fn instance() -> Arc<UserService> {
        INSTANCE.clone()
    }

    /// 외부 프로바이더가 단언한 신원을 사용자로 해석합니다.
    ///
    /// 기존 연결 → 검증된 이메일 병합 → 신규 생성 순서로 시도합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::IdentityConflict` - 이메일이 일치하는 계정에 다른
    ///   소셜 프로바이더가 이미 연결되어 있음
    pub async fn resolve_external(&self, identity: &NormalizedIdentity) -> Result<User, AppError> {
        // 1차 경로: 프로바이더 사용자 ID
        if let Some(user) = self
            .user_repo
            .find_by_provider_user_id(identity.kind, &identity.provider_user_id)
            .await?
        {
            return self.relink(user, identity).await;
        }

        // 2차 경로: 검증된 이메일 병합
        if identity.email_verified {
            if let Some(ref email) = identity.email {
                if let Some(user) = self.user_repo.find_by_email(email).await? {
                    if merge_blocked(&user, identity.kind) {
                        log::warn!(
                            "이메일 병합 거부: {} 계정에 다른 소셜 연결 존재",
                            email
                        );
                        return Err(AppError::IdentityConflict(
                            "이미 다른 소셜 계정과 연결된 이메일입니다".to_string(),
                        ));
                    }

                    log::info!("{} 신원을 기존 계정에 병합: {}", identity.kind.as_str(), email);
                    return self.relink(user, identity).await;
                }
            }
        }

        // 3차 경로: 신규 생성
        match self.user_repo.create(User::new_oauth(identity)).await {
            Ok(user) => {
                log::info!("새 {} 사용자 등록", identity.kind.as_str());
                Ok(user)
            }
            Err(AppError::ConflictError(_)) => {
                // 동일 이메일의 동시 가입 경합. 방금 생긴 문서로 재해석한다.
                log::warn!("소셜 가입 경합 감지, 재해석 시도");
                self.resolve_by_email_once(identity).await
            }
            Err(e) => Err(e),
        }
    }

    /// 생성 경합 후 이메일로 한 번만 재해석합니다.
    async fn resolve_by_email_once(&self, identity: &NormalizedIdentity) -> Result<User, AppError> {
        let email = identity.email.as_ref().ok_or_else(|| {
            AppError::ConflictError("이미 사용 중인 이메일입니다".to_string())
        })?;

        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::InternalError("가입 경합 재해석 실패".to_string()))?;

        if merge_blocked(&user, identity.kind) {
            return Err(AppError::IdentityConflict(
                "이미 다른 소셜 계정과 연결된 이메일입니다".to_string(),
            ));
        }

        self.relink(user, identity).await
    }

    /// 연결 정보를 갱신하고 버전 검사와 함께 저장합니다.
    async fn relink(&self, mut user: User, identity: &NormalizedIdentity) -> Result<User, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let user_oid = user
                .id
                .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;
            let expected_version = user.version;

            user.link_provider(identity);
            let set_doc = linkage_set_doc(&user)?;

            match self
                .user_repo
                .update_versioned(&user_oid, expected_version, set_doc)
                .await?
            {
                Some(updated) => return Ok(updated),
                None => {
                    user = self
                        .user_repo
                        .find_by_id(&user_oid.to_hex())
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound("사용자를 찾을 수 없습니다".to_string())
                        })?;
                }
            }
        }

        Err(AppError::InternalError(
            "동시 쓰기 충돌로 프로바이더 연결에 실패했습니다".to_string(),
        ))
    }

    /// 로컬 회원가입을 처리합니다.
    ///
    /// 같은 이메일의 소셜 전용 계정이 있으면 로컬 프로바이더를 추가하고,
    /// 없으면 새 계정을 만듭니다. 어느 쪽이든 인증 코드가 발급됩니다.
    ///
    /// # Returns
    ///
    /// 저장된 사용자와 발송할 6자리 인증 코드
    ///
    /// # Errors
    ///
    /// * `AppError::ConflictError` - 이미 로컬 가입된 이메일
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        username: Option<String>,
    ) -> Result<(User, String), AppError> {
        let email = email.to_lowercase();
        let code = numeric_code();
        let verification = OneTimeCode::new(code.clone());

        let password_hash = bcrypt::hash(password, PasswordConfig::bcrypt_cost())
            .map_err(|e| AppError::InternalError(format!("비밀번호 해시 실패: {}", e)))?;

        match self.user_repo.find_by_email(&email).await? {
            Some(user) if user.has_provider(ProviderKind::Local) => {
                Err(AppError::ConflictError(
                    "이미 사용 중인 이메일입니다".to_string(),
                ))
            }
            Some(user) => {
                // 소셜 전용 계정에 로컬 인증 수단 추가
                log::info!("소셜 전용 계정에 로컬 프로바이더 추가: {}", email);
                let user = self
                    .add_local_provider(user, password_hash, verification)
                    .await?;
                Ok((user, code))
            }
            None => {
                let mut user = User::new_local(
                    email.clone(),
                    username.unwrap_or_else(|| local_part(&email)),
                    password_hash,
                );
                user.verification_code = Some(verification);

                let user = self.user_repo.create(user).await?;
                log::info!("새 로컬 사용자 등록: {}", email);
                Ok((user, code))
            }
        }
    }

    /// 소셜 전용 계정에 로컬 프로바이더를 추가합니다 (버전 검사 포함).
    async fn add_local_provider(
        &self,
        mut user: User,
        password_hash: String,
        verification: OneTimeCode,
    ) -> Result<User, AppError> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let user_oid = user
                .id
                .ok_or_else(|| AppError::InternalError("사용자 ID가 없습니다".to_string()))?;
            let expected_version = user.version;

            user.password_hash = Some(password_hash.clone());
            user.local_email_verified = false;
            user.verification_code = Some(verification.clone());
            if !user.has_provider(ProviderKind::Local) {
                user.providers.push(ProviderKind::Local);
            }

            let providers = bson::to_bson(&user.providers)
                .map_err(|e| AppError::InternalError(format!("프로바이더 직렬화 실패: {}", e)))?;
            let code = bson::to_bson(&user.verification_code)
                .map_err(|e| AppError::InternalError(format!("인증 코드 직렬화 실패: {}", e)))?;

            let set_doc = doc! {
                "providers": providers,
                "password_hash": &password_hash,
                "local_email_verified": false,
                "verification_code": code,
            };

            match self
                .user_repo
                .update_versioned(&user_oid, expected_version, set_doc)
                .await?
            {
                Some(updated) => return Ok(updated),
                None => {
                    user = self
                        .user_repo
                        .find_by_id(&user_oid.to_hex())
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound("사용자를 찾을 수 없습니다".to_string())
                        })?;
                }
            }
        }

        Err(AppError::InternalError(
            "동시 쓰기 충돌로 가입에 실패했습니다".to_string(),
        ))
    }

    /// 이메일/비밀번호를 검증하고 사용자를 반환합니다.
    ///
    /// # Errors
    ///
    /// * `AppError::EmailNotRegistered` - 가입되지 않은 이메일
    /// * `AppError::ThirdPartyOnly` - 소셜 전용 계정
    /// * `AppError::EmailNotVerified` - 로컬 이메일 미인증
    /// * `AppError::InvalidCredentials` - 비밀번호 불일치
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::EmailNotRegistered)?;

        if !user.can_authenticate_with_password() {
            return Err(AppError::ThirdPartyOnly {
                providers: user.external_provider_names(),
            });
        }

        if !user.local_email_verified {
            return Err(AppError::EmailNotVerified {
                email: user.email.clone().unwrap_or_else(|| email.to_lowercase()),
            });
        }

        let password_hash = user
            .password_hash
            .as_ref()
            .ok_or_else(|| AppError::InternalError("비밀번호 해시가 없습니다".to_string()))?;

        let matches = bcrypt::verify(password, password_hash)
            .map_err(|e| AppError::InternalError(format!("비밀번호 검증 실패: {}", e)))?;

        if !matches {
            return Err(AppError::InvalidCredentials(
                "이메일 또는 비밀번호가 일치하지 않습니다".to_string(),
            ));
        }

        Ok(user)
    }
}

/// 이메일 병합 게이트
///
/// 일치한 계정에 지금 들어온 프로바이더와 *다른* 소셜 프로바이더가
/// 연결되어 있으면 병합을 거부합니다. 로컬 전용 계정이나 같은
/// 프로바이더 재연결은 허용됩니다.
fn merge_blocked(user: &User, incoming: ProviderKind) -> bool {
    user.providers
        .iter()
        .any(|p| p.is_external() && *p != incoming)
}

/// 프로바이더 연결 갱신 시 저장할 필드 문서를 만듭니다.
fn linkage_set_doc(user: &User) -> Result<Document, AppError> {
    let providers = bson::to_bson(&user.providers)
        .map_err(|e| AppError::InternalError(format!("프로바이더 직렬화 실패: {}", e)))?;
    let provider_tokens = bson::to_bson(&user.provider_tokens)
        .map_err(|e| AppError::InternalError(format!("연결 정보 직렬화 실패: {}", e)))?;

    let mut set_doc = doc! {
        "providers": providers,
        "provider_tokens": provider_tokens,
        "is_email_verified": user.is_email_verified,
    };
    if let Some(ref avatar) = user.avatar {
        set_doc.insert("avatar", avatar);
    }

    Ok(set_doc)
}

/// 이메일 앞부분을 기본 사용자 이름으로 사용합니다.
fn local_part(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(kind: ProviderKind) -> NormalizedIdentity {
        NormalizedIdentity {
            kind,
            provider_user_id: "p-1".to_string(),
            email: Some("alice@example.com".to_string()),
            email_verified: true,
            display_name: "Alice".to_string(),
            avatar_url: None,
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_merge_allowed_into_local_only_account() {
        let user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );

        assert!(!merge_blocked(&user, ProviderKind::Google));
        assert!(!merge_blocked(&user, ProviderKind::Line));
    }

    #[test]
    fn test_merge_blocked_by_foreign_provider() {
        let user = User::new_oauth(&identity(ProviderKind::Google));

        // Google 연결 계정에 LINE 병합은 거부
        assert!(merge_blocked(&user, ProviderKind::Line));
        // 같은 프로바이더 재연결은 허용
        assert!(!merge_blocked(&user, ProviderKind::Google));
    }

    #[test]
    fn test_merge_blocked_checks_external_only() {
        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        user.link_provider(&identity(ProviderKind::Google));

        // 로컬+Google 계정에 Google 재로그인 허용, LINE은 거부
        assert!(!merge_blocked(&user, ProviderKind::Google));
        assert!(merge_blocked(&user, ProviderKind::Line));
    }

    #[test]
    fn test_linkage_set_doc_shape() {
        let mut user = User::new_local(
            "alice@example.com".to_string(),
            "alice".to_string(),
            "hash".to_string(),
        );
        user.link_provider(&identity(ProviderKind::Google));

        let set_doc = linkage_set_doc(&user).unwrap();

        assert!(set_doc.contains_key("providers"));
        assert!(set_doc.contains_key("provider_tokens"));
        assert!(set_doc.contains_key("is_email_verified"));
        // 세션 목록은 절대 건드리지 않는다
        assert!(!set_doc.contains_key("sessions"));
    }

    #[test]
    fn test_local_part_fallback_username() {
        assert_eq!(local_part("alice@example.com"), "alice");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}
