//! 핵심 인프라 모듈
//!
//! 의존성 주입 컨테이너 등 애플리케이션 전역 인프라를 제공합니다.

pub mod registry;

pub use registry::ServiceLocator;
