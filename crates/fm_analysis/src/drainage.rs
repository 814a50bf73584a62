// crates/fm_analysis/src/drainage.rs

//! 排水密度阶段
//!
//! 河网要素在工作区默认分辨率上的线密度。纯函数, 可按
//! (要素身份, 分辨率, 搜索半径) 缓存。

use crate::error::{stage, AnalysisResult};
use crate::layers;
use fm_engine::RasterEngine;
use fm_raster::{GridSpec, RasterGrid, StreamNetwork};

/// 固定搜索半径 (米)
pub const SEARCH_RADIUS_M: f64 = 1000.0;

/// 计算排水密度 (km / km²)
pub fn drainage_density(
    engine: &dyn RasterEngine,
    grid: &GridSpec,
    streams: &StreamNetwork,
) -> AnalysisResult<RasterGrid> {
    engine
        .line_density(streams, grid, SEARCH_RADIUS_M)
        .map_err(stage(layers::DRAINAGE_DENSITY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_engine::NativeEngine;
    use fm_raster::{GeoTransform, Polyline};

    #[test]
    fn test_drainage_density_runs_on_workspace_grid() {
        let engine = NativeEngine::new();
        let grid = GridSpec::new(4, 4, GeoTransform::new(0.0, 120.0, 30.0), -9999.0);
        let streams = StreamNetwork {
            lines: vec![Polyline {
                points: vec![(0.0, 60.0), (120.0, 60.0)],
                grid_code: 1,
            }],
        };

        let density = drainage_density(&engine, &grid, &streams).unwrap();
        assert_eq!(density.rows(), 4);
        assert_eq!(density.cols(), 4);
        // 河道穿过的网格密度为正
        assert!(density.data.iter().any(|&v| v > 0.0));
    }
}
