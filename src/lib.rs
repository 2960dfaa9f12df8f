//! 목표 관리 서비스 백엔드: 신원/세션 서브시스템
//!
//! 로컬 이메일 인증과 Google/LINE 소셜 로그인을 하나의 사용자
//! 애그리게이트로 통합하고, 기기별 세션(최대 5개, LRU 퇴출)과
//! JWT 액세스 토큰 / 불투명 리프레시 토큰 발급을 제공합니다.
//!
//! # Features
//!
//! - **신원 해석**: 로컬/Google/LINE 신원을 하나의 계정으로 생성·병합
//! - **세션 저장소**: 사용자 문서 임베드, 한도 5, LRU 퇴출, 낙관적 잠금
//! - **JWT 인증**: HS256 액세스 토큰(1시간) + 쿠키 리프레시 토큰(7일)
//! - **이메일 인증**: 6자리 코드 발급/확인, 비밀번호 재설정
//! - **MongoDB**: 사용자 애그리게이트 영구 저장
//! - **Redis**: 사용자 조회 읽기 캐시
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   HTTP Routes   │ ← REST API 엔드포인트
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Handlers     │ ← 요청/응답 처리
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │    Services     │ ← 비즈니스 로직
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Repositories   │ ← 데이터 액세스
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ MongoDB + Redis │ ← 저장소
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use goaltrack_backend::services::users::UserService;
//! use goaltrack_backend::services::auth::SessionService;
//!
//! // 싱글톤 서비스 인스턴스 가져오기
//! let user_service = UserService::instance();
//! let session_service = SessionService::instance();
//!
//! // 로그인 성공 후 세션 수립 및 리프레시 토큰 발급
//! let user = user_service.verify_password(&email, &password).await?;
//! let refresh = session_service.establish(&user.id_string().unwrap(), &ua).await?;
//! ```

pub mod core;
pub mod config;
pub mod db;
pub mod caching;
pub mod domain;
pub mod repositories;
pub mod services;
pub mod utils;
pub mod routes;
pub mod handlers;
pub mod errors;
pub mod middlewares;
