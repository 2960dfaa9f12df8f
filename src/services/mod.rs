//! 비즈니스 로직 서비스 모듈
//!
//! 인증, 사용자, 이메일 발송 서비스를 제공합니다. 모든 서비스는
//! `once_cell` 기반 싱글톤으로 관리되며 `instance()`로 접근합니다.

pub mod auth;
pub mod email;
pub mod users;
