//! # Flagbot Detector
//!
//! 가격 시리즈에서 플래그 패턴과 의사결정 포인트를 탐지합니다.
//!
//! - [`FlagDetector`]: 로컬 극값을 기준으로 상승/하락 플래그 탐지
//! - [`detect_swing`]: 구간 내 지배적 스윙(FTC/EL) 탐지
//! - [`apply_features`]: DP 사용 여부 특성 추출
//! - [`FlagBook`]: 극점 시각 기준 플래그 중복 제거

pub mod book;
pub mod decision_point;
pub mod features;
pub mod flag_detector;
mod polarity;

pub use book::FlagBook;
pub use decision_point::{build_mpl, detect_swing};
pub use features::{apply_features, link_related};
pub use flag_detector::{DetectionOutcome, FlagDetector, Rejection, RejectedCandidate};
