//! 도메인 계층 모듈
//!
//! 엔티티(영속 모델), 도메인 모델, DTO를 제공합니다.

pub mod dto;
pub mod entities;
pub mod models;
