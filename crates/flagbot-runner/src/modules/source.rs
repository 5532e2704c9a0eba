//! 시세 데이터 소스.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flagbot_core::{Bar, FlagError, FlagResult, Timeframe};
use tokio::sync::RwLock;
use tracing::debug;

/// 시간 오름차순 봉 묶음을 공급하는 데이터 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 최근 `count`개의 봉을 가져옵니다. 비어 있으면 `NoData`.
    async fn fetch(&self, asset: &str, timeframe: Timeframe, count: usize) -> FlagResult<Vec<Bar>>;

    /// 소스 이름.
    fn name(&self) -> &str;
}

/// `{dir}/{asset}_{timeframe}.json` 파일을 읽는 소스.
///
/// 파일은 `{time, high, low}` 객체의 JSON 배열입니다.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 자산/타임프레임의 파일 경로.
    pub fn path_for(&self, asset: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{asset}_{timeframe}.json"))
    }

    /// 봉 파일을 읽습니다.
    pub async fn read_bars(path: &Path) -> FlagResult<Vec<Bar>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FlagError::NoData(format!("{} not found", path.display())));
            }
            Err(e) => return Err(FlagError::Network(format!("{}: {e}", path.display()))),
        };
        serde_json::from_slice(&raw).map_err(|e| FlagError::Data(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl MarketDataSource for JsonFileSource {
    async fn fetch(&self, asset: &str, timeframe: Timeframe, count: usize) -> FlagResult<Vec<Bar>> {
        let path = self.path_for(asset, timeframe);
        let mut bars = Self::read_bars(&path).await?;
        if bars.is_empty() {
            return Err(FlagError::NoData(format!("{asset} {timeframe}: empty file")));
        }
        let skip = bars.len().saturating_sub(count);
        bars.drain(..skip);
        debug!(asset, %timeframe, bars = bars.len(), path = %path.display(), "Bars loaded");
        Ok(bars)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

/// 메모리에 봉을 쌓아 두는 소스 (시뮬레이션/테스트용).
#[derive(Debug, Default)]
pub struct MemorySource {
    bars: RwLock<HashMap<Timeframe, Vec<Bar>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 타임프레임에 봉을 추가합니다.
    pub async fn push(&self, timeframe: Timeframe, bars: impl IntoIterator<Item = Bar>) {
        self.bars.write().await.entry(timeframe).or_default().extend(bars);
    }
}

#[async_trait]
impl MarketDataSource for MemorySource {
    async fn fetch(&self, asset: &str, timeframe: Timeframe, count: usize) -> FlagResult<Vec<Bar>> {
        let guard = self.bars.read().await;
        let bars = guard
            .get(&timeframe)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| FlagError::NoData(format!("{asset} {timeframe}: no bars")))?;
        let skip = bars.len().saturating_sub(count);
        Ok(bars[skip..].to_vec())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bars(n: usize) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 6, 5, 0, 0).unwrap();
        (0..n)
            .map(|i| Bar::new(t0 + Duration::minutes(i as i64), dec!(1.1), dec!(1.0)))
            .collect()
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = std::env::temp_dir().join(format!("flagbot-src-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let source = JsonFileSource::new(&dir);
        let path = source.path_for("EURUSD", Timeframe::M5);
        assert!(path.ends_with("EURUSD_M5.json"));

        tokio::fs::write(&path, serde_json::to_vec(&bars(10)).unwrap())
            .await
            .unwrap();

        let fetched = source.fetch("EURUSD", Timeframe::M5, 4).await.unwrap();
        assert_eq!(fetched.len(), 4);
        assert_eq!(fetched, bars(10)[6..].to_vec());

        let missing = source.fetch("EURUSD", Timeframe::H1, 4).await;
        assert!(matches!(missing, Err(FlagError::NoData(_))));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new();
        assert!(source.fetch("EURUSD", Timeframe::M1, 10).await.unwrap_err().is_skip());

        source.push(Timeframe::M1, bars(3)).await;
        assert_eq!(source.fetch("EURUSD", Timeframe::M1, 10).await.unwrap().len(), 3);
    }
}
