//! 플래그 탐지기.
//!
//! 로컬 최고점(상승) / 최저점(하락)마다 극점 후보를 세우고, 종료 봉, 반대 극점,
//! 시작 봉, EL 구간을 차례로 찾아 플래그를 만듭니다. 상승과 하락 규칙은 하나의
//! 루틴을 극성만 바꿔 사용합니다.

use crate::decision_point::{build_mpl, detect_swing};
use crate::features::{apply_features, link_related};
use crate::polarity::Polarity;
use flagbot_core::{DetectionConfig, Direction, DpKind, Flag, Point, PriceSeries};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 후보가 플래그가 되지 못한 이유.
///
/// 정상적인 음성 결과이며 에러가 아닙니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// 극점을 넘어서는 봉이 없음
    NoEnd,
    /// 극점과 종료 봉 사이가 최소 기간 이하
    TooShort,
    /// 시작 봉을 찾지 못함
    NoStart,
    /// 더 큰 플래그에 포함되는 부분 플래그
    MinorFlag,
}

/// 거부된 후보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub anchor_index: usize,
    pub polarity: Direction,
    pub reason: Rejection,
}

/// 탐지 결과.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    /// 탐지된 플래그 (상승 후보 먼저, 인덱스 오름차순)
    pub flags: Vec<Flag>,
    /// 거부된 후보
    pub rejections: Vec<RejectedCandidate>,
}

/// 후보 단계의 중간 결과.
struct Skeleton {
    anchor: usize,
    end: usize,
    trough: usize,
    start: usize,
    el_start: Option<usize>,
}

/// 플래그 탐지기.
#[derive(Debug, Clone, Default)]
pub struct FlagDetector {
    config: DetectionConfig,
}

impl FlagDetector {
    /// 새 탐지기를 생성합니다.
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// 시리즈 전체에서 상승/하락 플래그를 탐지합니다.
    ///
    /// 같은 시리즈에 대해 항상 같은 결과를 반환합니다.
    pub fn detect(&self, series: &PriceSeries) -> DetectionOutcome {
        let mut outcome = DetectionOutcome::default();

        for polarity in [Polarity::Up, Polarity::Down] {
            for anchor in 0..series.len() {
                if !polarity.is_anchor(series, anchor) {
                    continue;
                }
                match self.find_skeleton(series, polarity, anchor) {
                    Ok(skeleton) => outcome.flags.push(self.build_flag(series, polarity, skeleton)),
                    Err(reason) => {
                        debug!(anchor, polarity = %polarity.direction(), ?reason, "Flag candidate rejected");
                        outcome.rejections.push(RejectedCandidate {
                            anchor_index: anchor,
                            polarity: polarity.direction(),
                            reason,
                        });
                    }
                }
            }
        }

        info!(
            bars = series.len(),
            flags = outcome.flags.len(),
            rejected = outcome.rejections.len(),
            "Flag detection complete"
        );
        outcome
    }

    fn find_skeleton(
        &self,
        series: &PriceSeries,
        polarity: Polarity,
        anchor: usize,
    ) -> Result<Skeleton, Rejection> {
        let bars = series.bars();
        let pole = polarity.pole(&bars[anchor]);

        // 1. 극점을 처음 넘어서는 봉
        let end = (anchor + 1..bars.len())
            .find(|&j| polarity.beyond(polarity.pole(&bars[j]), pole))
            .ok_or(Rejection::NoEnd)?;

        // 2. 최소 기간
        if end - anchor <= self.config.min_flag_duration {
            return Err(Rejection::TooShort);
        }

        // 3. 반대 극점 (동률이면 마지막)
        let mut trough = anchor;
        for k in anchor..=end {
            if !polarity.beyond(polarity.counter(&bars[k]), polarity.counter(&bars[trough])) {
                trough = k;
            }
        }
        let trough_price = polarity.counter(&bars[trough]);

        // 4. 뒤로 걸으며 시작 봉 탐색 (인덱스 1에서 멈춤)
        let mut start = None;
        for k in (1..anchor).rev() {
            if !polarity.beyond(pole, polarity.pole(&bars[k])) {
                break;
            }
            if polarity.beyond(trough_price, polarity.counter(&bars[k])) {
                start = Some(k);
                break;
            }
        }
        let start = start.ok_or(Rejection::NoStart)?;

        // 5. 부분 플래그 제거
        let minor = (anchor + 1..end)
            .find(|&k| polarity.beyond(polarity.pole(&bars[k]), pole))
            .is_some_and(|k| k < trough);
        if minor {
            return Err(Rejection::MinorFlag);
        }

        // 6. EL 구간 시작: 봉 전체가 극점을 넘어선 첫 봉
        let cleared = (anchor + 1..bars.len()).find(|&k| {
            polarity.beyond(polarity.counter(&bars[k]), pole)
                && polarity.beyond(polarity.pole(&bars[k]), pole)
        });
        let el_start = cleared.filter(|&cleared| {
            let violated = (end..bars.len())
                .find(|&u| polarity.beyond(trough_price, polarity.counter(&bars[u])))
                .is_some_and(|u| u < cleared);
            if violated {
                debug!(anchor, cleared, "EL window invalidated before clearing");
            }
            !violated
        });

        Ok(Skeleton {
            anchor,
            end,
            trough,
            start,
            el_start,
        })
    }

    fn build_flag(&self, series: &PriceSeries, polarity: Polarity, sk: Skeleton) -> Flag {
        let bars = series.bars();
        let direction = if sk.trough != sk.anchor {
            polarity.direction()
        } else {
            Direction::Undefined
        };

        let pole_point = Point::new(polarity.pole(&bars[sk.anchor]), bars[sk.anchor].time, sk.anchor);
        let trough_point = Point::new(polarity.counter(&bars[sk.trough]), bars[sk.trough].time, sk.trough);

        let duration = (sk.end - sk.anchor) as f64;
        let weight = (duration / self.config.weight_divisor).min(self.config.max_weight);
        let length = Some((bars[sk.trough].time - bars[sk.anchor].time).num_minutes().abs());
        let end_time = bars[sk.end].time;

        let mut ftc = detect_swing(series, sk.anchor..sk.end + 1, direction, DpKind::Ftc, direction);
        let mut el = detect_swing(series, sk.start..sk.anchor, direction.opposite(), DpKind::El, direction);
        let mut mpl = build_mpl(direction, &pole_point, &el);

        let flag_range =
            Some((polarity.pole(&bars[sk.anchor]) - polarity.counter(&bars[sk.trough])).abs());
        for dp in [&mut ftc, &mut el, &mut mpl] {
            dp.first_valid_trade_time = Some(end_time);
            dp.parent_weight = weight;
            apply_features(dp, series, sk.end, flag_range, length);
        }
        link_related(&mut ftc, &mut el, &mpl);

        debug!(
            anchor = sk.anchor,
            end = sk.end,
            %direction,
            weight,
            "Flag detected"
        );

        Flag {
            direction,
            pole_point,
            trough_point,
            start_index: sk.start,
            end_index: sk.end,
            start_time: bars[sk.start].time,
            end_time,
            unique_point: bars[sk.anchor].time,
            anchor_index: sk.anchor,
            el_start_index: sk.el_start,
            el_start_time: sk.el_start.map(|i| bars[i].time),
            weight,
            length,
            ftc,
            el,
            mpl,
        }
    }
}
