// crates/fm_analysis/src/conditioning.rs

//! 水文条件化阶段
//!
//! 对填洼后的高程面依次执行: D8 流向 -> 汇流累积 -> 累积阈值化
//! 得到河网栅格 -> 借助流向把河网矢量化为简化折线。
//!
//! 每一步输出先持久化再进入下一步 (崩溃恢复检查点)。任何一步
//! 失败对整个阶段是致命的, 错误里带上失败的步骤名; 不存在
//! 可用的部分河网。

use crate::error::{stage, AnalysisResult};
use crate::layers;
use fm_engine::RasterEngine;
use fm_raster::{CacheDir, RasterGrid, StreamNetwork};
use tracing::info;

/// 河网判定阈值: 汇流累积 >= 1000 像元
pub const STREAM_THRESHOLD_CELLS: f64 = 1000.0;

/// 条件化阶段产物
#[derive(Debug)]
pub struct ConditioningProducts {
    /// D8 流向
    pub flow_direction: RasterGrid,
    /// 汇流累积
    pub flow_accumulation: RasterGrid,
    /// 二值河网栅格
    pub streams_raster: RasterGrid,
    /// 河网折线要素
    pub streams: StreamNetwork,
}

/// 执行水文条件化
pub fn condition(
    engine: &dyn RasterEngine,
    cache: &CacheDir,
    filled: &RasterGrid,
) -> AnalysisResult<ConditioningProducts> {
    info!("流向...");
    let flow_direction = engine
        .flow_direction(filled)
        .map_err(stage(layers::FLOW_DIRECTION))?;
    cache.save_raster(layers::FLOW_DIRECTION, &flow_direction)?;

    info!("汇流累积...");
    let flow_accumulation = engine
        .flow_accumulation(&flow_direction)
        .map_err(stage(layers::FLOW_ACCUMULATION))?;
    cache.save_raster(layers::FLOW_ACCUMULATION, &flow_accumulation)?;

    info!("河网阈值化 (累积 >= {STREAM_THRESHOLD_CELLS})...");
    let streams_raster = engine
        .con_threshold(&flow_accumulation, STREAM_THRESHOLD_CELLS)
        .map_err(stage(layers::STREAMS_RASTER))?;
    cache.save_raster(layers::STREAMS_RASTER, &streams_raster)?;

    info!("河网栅格转要素...");
    let streams = engine
        .stream_to_features(&streams_raster, &flow_direction)
        .map_err(stage(layers::STREAM_FEATURES))?;
    cache.save_features(layers::STREAM_FEATURES, &streams)?;
    info!("河网: {} 段, 总长 {:.1} m", streams.len(), streams.total_length());

    Ok(ConditioningProducts {
        flow_direction,
        flow_accumulation,
        streams_raster,
        streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_engine::NativeEngine;
    use fm_raster::GeoTransform;

    fn temp_cache(name: &str) -> CacheDir {
        let dir = std::env::temp_dir()
            .join("fm_analysis_conditioning_test")
            .join(name);
        std::fs::remove_dir_all(&dir).ok();
        CacheDir::open(dir).unwrap()
    }

    /// 向东的斜面, 行宽足以越过阈值
    fn sloped_dem(rows: usize, cols: usize) -> RasterGrid {
        let mut dem = RasterGrid::new(
            rows,
            cols,
            GeoTransform::new(0.0, rows as f64 * 30.0, 30.0),
            -9999.0,
        );
        for row in 0..rows {
            for col in 0..cols {
                dem.set(row, col, (cols - col) as f64);
            }
        }
        dem
    }

    #[test]
    fn test_condition_persists_checkpoints() {
        let engine = NativeEngine::new();
        let cache = temp_cache("checkpoints");
        let dem = sloped_dem(5, 8);
        let filled = engine.fill(&dem, None).unwrap();

        let products = condition(&engine, &cache, &filled).unwrap();

        // 每一步的输出都已持久化
        assert!(cache.exists(layers::FLOW_DIRECTION));
        assert!(cache.exists(layers::FLOW_ACCUMULATION));
        assert!(cache.exists(layers::STREAMS_RASTER));
        assert!(cache.exists(layers::STREAM_FEATURES));

        assert_eq!(products.flow_direction.rows(), 5);
        // 小网格不会达到 1000 像元累积阈值
        assert_eq!(products.streams_raster.valid_count(), 0);
        assert!(products.streams.is_empty());
    }

    #[test]
    fn test_condition_empty_input_names_stage() {
        let engine = NativeEngine::new();
        let cache = temp_cache("empty");
        let empty = RasterGrid::new(0, 0, GeoTransform::default(), -9999.0);

        let err = condition(&engine, &cache, &empty).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(layers::FLOW_DIRECTION));
    }
}
