//! 사용자 엔티티 모듈

pub mod session;
pub mod user;

pub use session::Session;
pub use user::{OneTimeCode, User};
