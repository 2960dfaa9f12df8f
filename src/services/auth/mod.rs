//! 인증 서비스 모듈
//!
//! 토큰 발급, 세션 저장소, 외부 프로바이더 게이트웨이, 로그아웃 조정을
//! 제공합니다.

pub mod google_auth_service;
pub mod line_auth_service;
pub mod provider_gateway;
pub mod revocation_service;
pub mod session_service;
pub mod token_service;

pub use google_auth_service::GoogleAuthService;
pub use line_auth_service::LineAuthService;
pub use provider_gateway::{gateway_for, ProviderGateway};
pub use revocation_service::RevocationService;
pub use session_service::SessionService;
pub use token_service::TokenService;
