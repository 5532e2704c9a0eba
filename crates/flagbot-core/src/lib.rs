//! # Flagbot Core
//!
//! 플래그 패턴 트레이딩 봇의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 가격 봉(Bar)과 로컬 극값이 표시된 가격 시리즈
//! - 플래그, 포인트, 의사결정 포인트(FTC/EL/MPL)
//! - 주문 의도 및 포지션 기록
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
