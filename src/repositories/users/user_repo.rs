//! # 사용자 리포지토리 구현
//!
//! 사용자 애그리게이트의 데이터 액세스 계층입니다.
//! MongoDB를 주 저장소로 사용하고, Redis를 통한 읽기 캐싱을 지원합니다.
//!
//! ## 쓰기 규칙
//!
//! 세션 목록이나 프로바이더 연결처럼 읽고-고치고-쓰는 변경은 반드시
//! [`UserRepository::update_versioned`]를 통해야 합니다. `{_id, version}`
//! 필터와 `$inc version`으로 낙관적 잠금을 구현하며, 중간에 다른 쓰기가
//! 끼어든 경우 `None`을 반환하므로 호출자는 새로 읽어 재시도합니다.
//!
//! 단일 배열 원소 제거(`$pull`)나 타임스탬프 갱신(positional `$set`)처럼
//! 저장소가 원자적으로 수행하는 연산은 버전 검사 없이 허용됩니다.
//!
//! ## 캐싱 전략
//!
//! - **키 패턴**: `user:{user_id}`, `user:email:{email}`
//! - **TTL**: 10분 (600초)
//! - **무효화**: 모든 쓰기 성공 후 두 키 동시 삭제

use std::sync::Arc;
use mongodb::{
    bson::{self, doc, oid::ObjectId, DateTime, Document},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Collection, IndexModel,
};
use once_cell::sync::Lazy;
use crate::{
    caching::redis::RedisClient,
    core::registry::ServiceLocator,
    db::Database,
    domain::entities::users::User,
    domain::models::oauth::ProviderKind,
    errors::errors::AppError,
};

/// 캐시 TTL (초)
const CACHE_TTL_SECS: usize = 600;

static INSTANCE: Lazy<Arc<UserRepository>> = Lazy::new(|| {
    Arc::new(UserRepository {
        db: ServiceLocator::get::<Database>(),
        redis: ServiceLocator::get::<RedisClient>(),
    })
});

/// 사용자 데이터 액세스 리포지토리
pub struct UserRepository {
    /// MongoDB 데이터베이스 연결
    db: Arc<Database>,
    /// Redis 캐시 클라이언트
    redis: Arc<RedisClient>,
}

impl UserRepository {
    /// 싱글톤 인스턴스를 반환합니다.
    ///
    /// 최초 호출 시 ServiceLocator에서 인프라를 주입받아 생성됩니다.
    pub fn instance() -> Arc<UserRepository> {
        INSTANCE.clone()
    }

    fn collection(&self) -> Collection<User> {
        self.db.get_database().collection::<User>("users")
    }

    /// 이메일 주소로 사용자 조회 (캐시 우선)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = email.to_lowercase();
        let cache_key = format!("user:email:{}", email);

        if let Ok(Some(cached)) = self.redis.get::<User>(&cache_key).await {
            return Ok(Some(cached));
        }

        let user = self
            .collection()
            .find_one(doc! { "email": &email })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if let Some(ref user) = user {
            let _ = self.redis.set_with_expiry(&cache_key, user, CACHE_TTL_SECS).await;
        }

        Ok(user)
    }

    /// ID로 사용자 조회 (캐시 우선)
    ///
    /// # Errors
    ///
    /// * `AppError::ValidationError` - 잘못된 ObjectId 형식
    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let object_id = ObjectId::parse_str(id)
            .map_err(|_| AppError::ValidationError("유효하지 않은 ID 형식입니다".to_string()))?;

        let cache_key = format!("user:{}", id);

        if let Ok(Some(cached)) = self.redis.get::<User>(&cache_key).await {
            return Ok(Some(cached));
        }

        let user = self
            .collection()
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if let Some(ref user) = user {
            let _ = self.redis.set_with_expiry(&cache_key, user, CACHE_TTL_SECS).await;
        }

        Ok(user)
    }

    /// 프로바이더 사용자 ID로 조회
    ///
    /// 소셜 로그인의 1차 조회 경로입니다. 캐싱하지 않습니다
    /// (로그인 시 한 번만 조회되므로).
    pub async fn find_by_provider_user_id(
        &self,
        kind: ProviderKind,
        provider_user_id: &str,
    ) -> Result<Option<User>, AppError> {
        let path = match kind {
            ProviderKind::Google => "provider_tokens.google.provider_user_id",
            ProviderKind::Line => "provider_tokens.line.provider_user_id",
            ProviderKind::Local => return Ok(None),
        };

        let mut filter = Document::new();
        filter.insert(path, provider_user_id);

        self.collection()
            .find_one(filter)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// 리프레시 토큰이 포함된 세션을 가진 사용자 조회
    ///
    /// 불투명 토큰의 유일한 검증 경로입니다. 캐시를 거치지 않습니다
    /// (세션 상태는 항상 최신 문서 기준이어야 하므로).
    pub async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<User>, AppError> {
        self.collection()
            .find_one(doc! { "sessions.refresh_token": refresh_token })
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// 새 사용자 생성
    ///
    /// 이메일이 있는 경우 중복 여부를 사전 검증합니다. 사전 검증을
    /// 통과한 동시 가입 경합은 유니크 인덱스의 E11000으로 잡히며,
    /// 이 역시 `ConflictError`로 보고되어 호출자가 재해석할 수 있습니다.
    pub async fn create(&self, mut user: User) -> Result<User, AppError> {
        if let Some(ref email) = user.email {
            if self.find_by_email(email).await?.is_some() {
                return Err(AppError::ConflictError(
                    "이미 사용 중인 이메일입니다".to_string(),
                ));
            }
        }

        let result = self
            .collection()
            .insert_one(&user)
            .await
            .map_err(insert_error)?;

        user.id = result.inserted_id.as_object_id();

        Ok(user)
    }

    /// 버전 검사와 함께 사용자 문서를 갱신합니다 (낙관적 잠금).
    ///
    /// `{_id, version}` 필터가 일치할 때만 `$set`을 적용하고 버전을
    /// 증가시킵니다.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - 갱신 성공, 갱신된 문서 반환
    /// * `Ok(None)` - 버전 불일치 (다른 쓰기가 선행됨). 호출자는
    ///   새로 읽어 재시도해야 합니다.
    pub async fn update_versioned(
        &self,
        user_id: &ObjectId,
        expected_version: i64,
        mut set_doc: Document,
    ) -> Result<Option<User>, AppError> {
        set_doc.insert("updated_at", DateTime::now());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection()
            .find_one_and_update(
                doc! { "_id": user_id, "version": expected_version },
                doc! { "$set": set_doc, "$inc": { "version": 1 } },
            )
            .with_options(options)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if let Some(ref user) = updated {
            self.invalidate_cache(user).await;
        }

        Ok(updated)
    }

    /// 사용자 정보 부분 갱신 (버전 검사 없음)
    ///
    /// 세션 목록을 건드리지 않는 필드(인증 코드, 비밀번호 해시 등)에만
    /// 사용합니다.
    pub async fn update(&self, user_id: &ObjectId, set_doc: Document) -> Result<Option<User>, AppError> {
        let mut set_doc = set_doc;
        set_doc.insert("updated_at", DateTime::now());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        let updated = self
            .collection()
            .find_one_and_update(doc! { "_id": user_id }, doc! { "$set": set_doc })
            .with_options(options)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        if let Some(ref user) = updated {
            self.invalidate_cache(user).await;
        }

        Ok(updated)
    }

    /// 특정 세션을 원자적으로 제거합니다 (`$pull`).
    ///
    /// 배열 원소 제거는 저장소가 원자적으로 수행하므로 버전 검사가
    /// 필요 없습니다.
    ///
    /// # Returns
    ///
    /// 실제로 제거된 경우 true
    pub async fn pull_session(
        &self,
        user_id: &ObjectId,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .collection()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$pull": { "sessions": { "refresh_token": refresh_token } },
                    "$inc": { "version": 1 },
                    "$set": { "updated_at": DateTime::now() },
                },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let removed = result.modified_count > 0;
        if removed {
            self.invalidate_cache_by_id(user_id).await;
        }

        Ok(removed)
    }

    /// 모든 세션을 제거합니다.
    pub async fn clear_sessions(&self, user_id: &ObjectId) -> Result<(), AppError> {
        self.collection()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$set": { "sessions": [], "updated_at": DateTime::now() },
                    "$inc": { "version": 1 },
                },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        self.invalidate_cache_by_id(user_id).await;

        Ok(())
    }

    /// 세션의 마지막 사용 시각을 갱신합니다 (positional `$set`).
    ///
    /// 타임스탬프만 바꾸는 쓰기라 목록 구조를 해칠 수 없으므로 버전을
    /// 올리지 않습니다. 세션이 이미 사라진 경우 조용히 no-op이 됩니다.
    pub async fn touch_session(
        &self,
        user_id: &ObjectId,
        refresh_token: &str,
    ) -> Result<(), AppError> {
        self.collection()
            .update_one(
                doc! { "_id": user_id, "sessions.refresh_token": refresh_token },
                doc! { "$set": { "sessions.$.last_used_at": DateTime::now() } },
            )
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        self.invalidate_cache_by_id(user_id).await;

        Ok(())
    }

    /// 사용자 관련 캐시 키를 무효화합니다.
    async fn invalidate_cache(&self, user: &User) {
        let mut keys = Vec::with_capacity(2);
        if let Some(id) = user.id_string() {
            keys.push(format!("user:{}", id));
        }
        if let Some(ref email) = user.email {
            keys.push(format!("user:email:{}", email));
        }
        let _ = self.redis.del_multiple(&keys).await;
    }

    /// ID 기반 캐시 키만 무효화합니다.
    ///
    /// 이메일을 모르는 경로에서 사용합니다. 이메일 키는 TTL로
    /// 만료됩니다.
    async fn invalidate_cache_by_id(&self, user_id: &ObjectId) {
        let _ = self.redis.del(&format!("user:{}", user_id.to_hex())).await;
    }

    /// 세션 목록 전체를 `$set`할 문서를 만듭니다.
    ///
    /// [`update_versioned`](Self::update_versioned)와 함께 사용합니다.
    pub fn sessions_set_doc(user: &User) -> Result<Document, AppError> {
        let sessions = bson::to_bson(&user.sessions)
            .map_err(|e| AppError::InternalError(format!("세션 직렬화 실패: {}", e)))?;
        Ok(doc! { "sessions": sessions })
    }

    /// 데이터베이스 인덱스 생성
    ///
    /// 애플리케이션 초기화 시점에 한 번 실행합니다.
    ///
    /// # 생성되는 인덱스
    ///
    /// 1. `email` - unique + sparse (LINE 전용 계정은 이메일이 없음)
    /// 2. `provider_tokens.google.provider_user_id` - unique + sparse
    /// 3. `provider_tokens.line.provider_user_id` - unique + sparse
    /// 4. `created_at` - 내림차순
    pub async fn create_indexes(&self) -> Result<(), AppError> {
        let collection = self.collection();

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        let google_id_index = IndexModel::builder()
            .keys(doc! { "provider_tokens.google.provider_user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("google_provider_user_id_unique".to_string())
                    .build(),
            )
            .build();

        let line_id_index = IndexModel::builder()
            .keys(doc! { "provider_tokens.line.provider_user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .sparse(true)
                    .name("line_provider_user_id_unique".to_string())
                    .build(),
            )
            .build();

        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            )
            .build();

        collection
            .create_indexes([email_index, google_id_index, line_id_index, created_at_index])
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

/// MongoDB E11000 중복 키 코드
const DUPLICATE_KEY_CODE: i32 = 11000;

/// `insert_one` 실패를 애플리케이션 에러로 변환합니다.
///
/// 사전 중복 검증을 통과한 동시 가입 경합은 유니크 인덱스의
/// 중복 키 에러로 나타나므로 `ConflictError`로 구분합니다.
fn insert_error(e: mongodb::error::Error) -> AppError {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) =
        e.kind.as_ref()
    {
        if we.code == DUPLICATE_KEY_CODE {
            return AppError::ConflictError("이미 사용 중인 이메일입니다".to_string());
        }
    }

    AppError::DatabaseError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_error_maps_non_duplicate_to_database_error() {
        let err = mongodb::error::Error::custom("connection reset");
        assert!(matches!(insert_error(err), AppError::DatabaseError(_)));
    }
}
