//! 애플리케이션 설정 모듈
//!
//! 환경 변수 기반의 설정 구조체들을 제공합니다.
//! dotenv로 로드된 환경 변수를 읽어 각 관심사별 설정을 노출합니다.

pub mod auth_config;
pub mod data_config;

pub use auth_config::{CookieConfig, GoogleOAuthConfig, JwtConfig, LineOAuthConfig, SessionConfig};
pub use data_config::{Environment, PasswordConfig, ServerConfig};
