//! 플래그 탐지와 트레이딩을 위한 도메인 모델.

mod bar;
mod decision_point;
mod direction;
mod flag;
mod order;
mod point;

pub use bar::*;
pub use decision_point::*;
pub use direction::*;
pub use flag::*;
pub use order::*;
pub use point::*;
