//! # Service Registry - 싱글톤 의존성 주입 시스템
//!
//! 인프라 컴포넌트(Database, RedisClient)를 위한 전역 싱글톤 컨테이너입니다.
//! Spring Framework의 ApplicationContext 역할을 축소하여 Rust에서 구현한 것으로,
//! `TypeId` 기반의 타입 안전한 조회를 제공합니다.
//!
//! ## 동작 방식
//!
//! ```text
//! 1. 런타임 초기화 (Infrastructure Beans)
//!    ├─ Database, RedisClient 등 인프라 컴포넌트를 main에서 직접 생성
//!    └─ ServiceLocator::set() → 전역 컨테이너에 저장
//!
//! 2. 조회
//!    ├─ 리포지토리/서비스의 once_cell 싱글톤 생성 시점에
//!    └─ ServiceLocator::get::<T>() 로 주입
//! ```
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use crate::core::registry::ServiceLocator;
//! use crate::db::Database;
//!
//! // main에서 등록
//! ServiceLocator::set(Arc::new(Database::new().await?));
//!
//! // 리포지토리에서 조회
//! let db: Arc<Database> = ServiceLocator::get::<Database>();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use once_cell::sync::Lazy;

/// 등록된 인스턴스들의 전역 저장소
static INSTANCES: Lazy<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// 전역 서비스 로케이터
///
/// 애플리케이션 전역에서 공유되는 인프라 컴포넌트의 싱글톤 저장소입니다.
/// 서비스와 리포지토리는 각자의 `instance()` 메서드(once_cell 기반)를 통해
/// 싱글톤으로 관리되며, 이 로케이터는 그들이 공유하는 인프라를 보관합니다.
pub struct ServiceLocator;

impl ServiceLocator {
    /// 인스턴스를 전역 컨테이너에 등록합니다.
    ///
    /// 동일 타입이 이미 등록된 경우 덮어씁니다. 애플리케이션 초기화
    /// 시점(main)에서만 호출해야 합니다.
    pub fn set<T: Any + Send + Sync>(instance: Arc<T>) {
        let mut instances = INSTANCES.write().expect("ServiceLocator lock poisoned");
        instances.insert(TypeId::of::<T>(), instance);
    }

    /// 등록된 인스턴스를 조회합니다.
    ///
    /// # Panics
    ///
    /// 해당 타입이 등록되지 않은 경우 패닉이 발생합니다.
    /// 초기화 순서 버그를 조기에 드러내기 위한 의도된 동작입니다.
    pub fn get<T: Any + Send + Sync>() -> Arc<T> {
        Self::try_get::<T>().unwrap_or_else(|| {
            panic!(
                "ServiceLocator에 등록되지 않은 타입입니다: {}",
                std::any::type_name::<T>()
            )
        })
    }

    /// 등록된 인스턴스를 조회합니다. 등록되지 않은 경우 None을 반환합니다.
    pub fn try_get<T: Any + Send + Sync>() -> Option<Arc<T>> {
        let instances = INSTANCES.read().expect("ServiceLocator lock poisoned");
        instances
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.clone().downcast::<T>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Probe(u32);

    #[test]
    fn test_set_and_get_roundtrip() {
        ServiceLocator::set(Arc::new(Probe(42)));

        let fetched: Arc<Probe> = ServiceLocator::get::<Probe>();
        assert_eq!(*fetched, Probe(42));
    }

    #[test]
    fn test_try_get_unregistered_type() {
        struct NeverRegistered;
        assert!(ServiceLocator::try_get::<NeverRegistered>().is_none());
    }
}
