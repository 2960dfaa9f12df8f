//! 사용자 서비스 모듈

pub mod user_service;
pub mod verification_service;

pub use user_service::UserService;
pub use verification_service::VerificationService;
