// crates/fm_analysis/src/preprocess.rs

//! 层预处理编排
//!
//! 为一次分析产出全部派生输入层: 填洼高程、坡度、排水密度、
//! 重采样降水、岩性栅格。
//!
//! # 幂等策略
//!
//! 计算前列出预处理缓存目录内容: 若全部必需层按名称存在, 整个
//! 预处理被跳过, 现有层原样复用 (只看名称, 不做内容校验)。任一
//! 必需层缺失时无条件重跑完整序列并覆盖旧的部分输出, 不做
//! 增量重算。
//!
//! 这是一个正确性取舍: 实现廉价, 但被外部破坏的缓存条目必须由
//! 操作者删除后才会重算; 中途失败会留下部分缓存, 下次调用将
//! 全量重算。

use crate::conditioning;
use crate::drainage;
use crate::error::{stage, AnalysisResult};
use crate::layers;
use fm_engine::{RasterEngine, ResampleMethod, SlopeMethod, SlopeUnits};
use fm_raster::{CacheDir, FeatureSet, RasterGrid, Workspace};
use tracing::info;

/// 岩性栅格化的默认属性字段
pub const LITHOLOGY_VALUE_FIELD: &str = "UNIT_NAME";

/// 预处理原始输入
#[derive(Debug)]
pub struct PreprocessInputs {
    /// 原始高程
    pub dem: RasterGrid,
    /// 原始降水 (任意分辨率)
    pub precipitation: RasterGrid,
    /// 岩性面要素
    pub lithology: FeatureSet,
    /// 岩性属性字段
    pub lithology_field: String,
}

impl PreprocessInputs {
    /// 创建输入, 岩性字段取默认值
    pub fn new(dem: RasterGrid, precipitation: RasterGrid, lithology: FeatureSet) -> Self {
        Self {
            dem,
            precipitation,
            lithology,
            lithology_field: LITHOLOGY_VALUE_FIELD.to_string(),
        }
    }
}

/// 预处理产物 (全部对齐工作区默认网格)
#[derive(Debug)]
pub struct PreprocessedLayers {
    /// 填洼后的高程
    pub filled_dem: RasterGrid,
    /// 坡度 (度)
    pub slope: RasterGrid,
    /// 排水密度 (km/km²)
    pub drainage_density: RasterGrid,
    /// 重采样降水
    pub precipitation: RasterGrid,
    /// 岩性类别栅格
    pub lithology: RasterGrid,
}

/// 执行预处理 (带缓存检查)
pub fn preprocess(
    engine: &dyn RasterEngine,
    workspace: &Workspace,
    inputs: &PreprocessInputs,
) -> AnalysisResult<PreprocessedLayers> {
    let cache = workspace.cache(layers::PREPROCESSING_CACHE)?;

    let listing = cache.list()?;
    info!("预处理缓存内容: {:?}", listing);

    if cache.contains_all(&layers::REQUIRED_LAYERS) {
        info!("全部必需层已存在, 跳过预处理");
        return load_cached(&cache);
    }

    info!("缓存缺层, 运行完整预处理序列");
    run_full(engine, workspace, inputs, &cache)
}

fn load_cached(cache: &CacheDir) -> AnalysisResult<PreprocessedLayers> {
    Ok(PreprocessedLayers {
        filled_dem: cache.load_raster(layers::FILLED_DEM)?,
        slope: cache.load_raster(layers::SLOPE)?,
        drainage_density: cache.load_raster(layers::DRAINAGE_DENSITY)?,
        precipitation: cache.load_raster(layers::PRECIPITATION)?,
        lithology: cache.load_raster(layers::LITHOLOGY)?,
    })
}

fn run_full(
    engine: &dyn RasterEngine,
    workspace: &Workspace,
    inputs: &PreprocessInputs,
    cache: &CacheDir,
) -> AnalysisResult<PreprocessedLayers> {
    // 高程预处理
    info!("高程预处理 (填洼)...");
    let filled_dem = engine
        .fill(&inputs.dem, None)
        .map_err(stage(layers::FILLED_DEM))?;
    cache.save_raster(layers::FILLED_DEM, &filled_dem)?;

    // 水文条件化与河网
    info!("水文条件化...");
    let products = conditioning::condition(engine, cache, &filled_dem)?;

    // 以下分支相互独立; 引擎按单一共享资源串行调用
    info!("坡度...");
    let slope = engine
        .slope(&filled_dem, SlopeUnits::Degrees, SlopeMethod::Planar)
        .map_err(stage(layers::SLOPE))?;
    cache.save_raster(layers::SLOPE, &slope)?;

    info!("排水密度...");
    let drainage_density = drainage::drainage_density(engine, &workspace.grid, &products.streams)?;
    cache.save_raster(layers::DRAINAGE_DENSITY, &drainage_density)?;

    info!("降水重采样...");
    let precipitation = engine
        .resample(&inputs.precipitation, &workspace.grid, ResampleMethod::Bilinear)
        .map_err(stage(layers::PRECIPITATION))?;
    cache.save_raster(layers::PRECIPITATION, &precipitation)?;

    info!("岩性栅格化...");
    let lithology = engine
        .rasterize_features(&inputs.lithology, &inputs.lithology_field, &workspace.grid)
        .map_err(stage(layers::LITHOLOGY))?;
    cache.save_raster(layers::LITHOLOGY, &lithology)?;

    Ok(PreprocessedLayers {
        filled_dem,
        slope,
        drainage_density,
        precipitation,
        lithology,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_engine::{EngineResult, MissingPolicy, NativeEngine};
    use fm_raster::{Feature, GeoTransform, Geometry, GridSpec, StreamNetwork};
    use fm_schema::TransferFunction;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// 统计引擎调用次数的侦察包装
    struct SpyEngine {
        inner: NativeEngine,
        calls: AtomicU64,
    }

    impl SpyEngine {
        fn new() -> Self {
            Self {
                inner: NativeEngine::new(),
                calls: AtomicU64::new(0),
            }
        }

        fn call_count(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RasterEngine for SpyEngine {
        fn fill(&self, dem: &RasterGrid, z_limit: Option<f64>) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.fill(dem, z_limit)
        }
        fn flow_direction(&self, filled: &RasterGrid) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.flow_direction(filled)
        }
        fn flow_accumulation(&self, direction: &RasterGrid) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.flow_accumulation(direction)
        }
        fn con_threshold(&self, raster: &RasterGrid, threshold: f64) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.con_threshold(raster, threshold)
        }
        fn stream_to_features(
            &self,
            streams: &RasterGrid,
            direction: &RasterGrid,
        ) -> EngineResult<StreamNetwork> {
            self.tick();
            self.inner.stream_to_features(streams, direction)
        }
        fn line_density(
            &self,
            network: &StreamNetwork,
            grid: &GridSpec,
            search_radius: f64,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.line_density(network, grid, search_radius)
        }
        fn slope(
            &self,
            dem: &RasterGrid,
            units: SlopeUnits,
            method: SlopeMethod,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.slope(dem, units, method)
        }
        fn resample(
            &self,
            raster: &RasterGrid,
            target: &GridSpec,
            method: ResampleMethod,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.resample(raster, target, method)
        }
        fn rasterize_features(
            &self,
            features: &FeatureSet,
            value_field: &str,
            grid: &GridSpec,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.rasterize_features(features, value_field, grid)
        }
        fn reclassify(
            &self,
            raster: &RasterGrid,
            remap_spec: &str,
            missing: MissingPolicy,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.reclassify(raster, remap_spec, missing)
        }
        fn rescale_by_function(
            &self,
            raster: &RasterGrid,
            function: &TransferFunction,
        ) -> EngineResult<RasterGrid> {
            self.tick();
            self.inner.rescale_by_function(raster, function)
        }
    }

    fn test_workspace(name: &str) -> Workspace {
        let root = std::env::temp_dir()
            .join("fm_analysis_preprocess_test")
            .join(name);
        std::fs::remove_dir_all(&root).ok();
        let grid = GridSpec::new(6, 6, GeoTransform::new(0.0, 180.0, 30.0), -9999.0);
        Workspace::new(root, grid, 32612)
    }

    fn test_inputs(ws: &Workspace) -> PreprocessInputs {
        let mut dem = RasterGrid::new(6, 6, ws.grid.transform, -9999.0);
        for row in 0..6 {
            for col in 0..6 {
                dem.set(row, col, 100.0 - col as f64);
            }
        }

        let mut precip = RasterGrid::new(3, 3, GeoTransform::new(0.0, 180.0, 60.0), -9999.0);
        precip.data.fill(400.0);

        let mut attrs = HashMap::new();
        attrs.insert("UNIT_NAME".to_string(), "Basalt".to_string());
        let lithology = FeatureSet {
            features: vec![Feature {
                geometry: Geometry::Polygon(vec![
                    (0.0, 0.0),
                    (180.0, 0.0),
                    (180.0, 180.0),
                    (0.0, 180.0),
                ]),
                attributes: attrs,
            }],
        };

        PreprocessInputs::new(dem, precip, lithology)
    }

    #[test]
    fn test_preprocess_produces_all_layers() {
        let ws = test_workspace("produce");
        let engine = NativeEngine::new();
        let inputs = test_inputs(&ws);

        let layers_out = preprocess(&engine, &ws, &inputs).unwrap();

        assert_eq!(layers_out.filled_dem.rows(), 6);
        assert_eq!(layers_out.slope.rows(), 6);
        assert_eq!(layers_out.precipitation.rows(), 6);
        assert_eq!(layers_out.lithology.category_index("Basalt"), Some(0));

        let cache = ws.cache(layers::PREPROCESSING_CACHE).unwrap();
        assert!(cache.contains_all(&layers::REQUIRED_LAYERS));
        // 中间产物也在缓存里
        assert!(cache.exists(layers::FLOW_DIRECTION));
        assert!(cache.exists(layers::STREAM_FEATURES));
    }

    #[test]
    fn test_preprocess_idempotent_second_run_no_engine_calls() {
        let ws = test_workspace("idempotent");
        let spy = SpyEngine::new();
        let inputs = test_inputs(&ws);

        preprocess(&spy, &ws, &inputs).unwrap();
        let first_run_calls = spy.call_count();
        assert!(first_run_calls > 0);

        // 第二次运行: 缓存完整, 引擎不被调用
        let layers_out = preprocess(&spy, &ws, &inputs).unwrap();
        assert_eq!(spy.call_count(), first_run_calls);
        assert_eq!(layers_out.filled_dem.rows(), 6);
    }

    #[test]
    fn test_preprocess_missing_layer_triggers_full_rerun() {
        let ws = test_workspace("rerun");
        let spy = SpyEngine::new();
        let inputs = test_inputs(&ws);

        preprocess(&spy, &ws, &inputs).unwrap();
        let first_run_calls = spy.call_count();

        // 删除一个必需层: 全量重算 (不做增量)
        let cache = ws.cache(layers::PREPROCESSING_CACHE).unwrap();
        std::fs::remove_file(cache.path().join(format!("{}.asc", layers::SLOPE))).unwrap();

        preprocess(&spy, &ws, &inputs).unwrap();
        assert_eq!(spy.call_count(), first_run_calls * 2);
        assert!(cache.exists(layers::SLOPE));
    }
}
