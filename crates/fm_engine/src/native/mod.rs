// crates/fm_engine/src/native/mod.rs

//! 内置栅格引擎
//!
//! [`NativeEngine`] 是 [`RasterEngine`](crate::traits::RasterEngine)
//! 的自带实现, 不依赖外部地理处理系统。操作计数用于诊断与测试。

pub mod density;
pub mod hydrology;
pub mod reclass;
pub mod resample;
pub mod streams;
pub mod terrain;

use crate::error::EngineResult;
use crate::traits::{MissingPolicy, RasterEngine, ResampleMethod, SlopeMethod, SlopeUnits};
use fm_raster::{FeatureSet, GridSpec, RasterGrid, StreamNetwork};
use fm_schema::TransferFunction;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// 引擎操作统计
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    /// 按操作名的调用次数
    pub calls: BTreeMap<&'static str, u64>,
}

impl EngineStats {
    /// 全部操作的调用总数
    pub fn total(&self) -> u64 {
        self.calls.values().sum()
    }
}

/// 内置引擎
#[derive(Debug, Default)]
pub struct NativeEngine {
    stats: RwLock<EngineStats>,
}

impl NativeEngine {
    /// 创建引擎
    pub fn new() -> Self {
        Self::default()
    }

    /// 统计快照
    pub fn stats(&self) -> EngineStats {
        self.stats.read().clone()
    }

    fn record(&self, op: &'static str) {
        tracing::debug!("引擎操作: {op}");
        *self.stats.write().calls.entry(op).or_insert(0) += 1;
    }
}

impl RasterEngine for NativeEngine {
    fn fill(&self, dem: &RasterGrid, z_limit: Option<f64>) -> EngineResult<RasterGrid> {
        self.record("Fill");
        hydrology::fill_sinks(dem, z_limit)
    }

    fn flow_direction(&self, filled: &RasterGrid) -> EngineResult<RasterGrid> {
        self.record("FlowDirection");
        hydrology::flow_direction(filled)
    }

    fn flow_accumulation(&self, direction: &RasterGrid) -> EngineResult<RasterGrid> {
        self.record("FlowAccumulation");
        hydrology::flow_accumulation(direction)
    }

    fn con_threshold(&self, raster: &RasterGrid, threshold: f64) -> EngineResult<RasterGrid> {
        self.record("Con");
        streams::con_threshold(raster, threshold)
    }

    fn stream_to_features(
        &self,
        streams_raster: &RasterGrid,
        direction: &RasterGrid,
    ) -> EngineResult<StreamNetwork> {
        self.record("StreamToFeature");
        streams::stream_to_features(streams_raster, direction)
    }

    fn line_density(
        &self,
        network: &StreamNetwork,
        grid: &GridSpec,
        search_radius: f64,
    ) -> EngineResult<RasterGrid> {
        self.record("LineDensity");
        density::line_density(network, grid, search_radius)
    }

    fn slope(
        &self,
        dem: &RasterGrid,
        units: SlopeUnits,
        method: SlopeMethod,
    ) -> EngineResult<RasterGrid> {
        self.record("Slope");
        terrain::slope(dem, units, method)
    }

    fn resample(
        &self,
        raster: &RasterGrid,
        target: &GridSpec,
        method: ResampleMethod,
    ) -> EngineResult<RasterGrid> {
        self.record("Resample");
        resample::resample(raster, target, method)
    }

    fn rasterize_features(
        &self,
        features: &FeatureSet,
        value_field: &str,
        grid: &GridSpec,
    ) -> EngineResult<RasterGrid> {
        self.record("ConvertFeatureToRaster");
        resample::rasterize_features(features, value_field, grid)
    }

    fn reclassify(
        &self,
        raster: &RasterGrid,
        remap_spec: &str,
        missing: MissingPolicy,
    ) -> EngineResult<RasterGrid> {
        self.record("Reclassify");
        reclass::reclassify(raster, remap_spec, missing)
    }

    fn rescale_by_function(
        &self,
        raster: &RasterGrid,
        function: &TransferFunction,
    ) -> EngineResult<RasterGrid> {
        self.record("RescaleByFunction");
        reclass::rescale_by_function(raster, function)
    }
}
