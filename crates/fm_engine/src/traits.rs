// crates/fm_engine/src/traits.rs

//! 栅格引擎抽象
//!
//! [`RasterEngine`] 是分析核心与底层栅格/矢量算法之间的接缝。
//! 每个操作同步执行、返回新的数据对象；失败时携带引擎诊断原文。
//! 上层把引擎视为单一共享外部资源，不假设操作可并发。

use crate::error::EngineResult;
use fm_raster::{FeatureSet, GridSpec, RasterGrid, StreamNetwork};
use fm_schema::TransferFunction;

/// 坡度输出单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeUnits {
    /// 度
    Degrees,
    /// 百分比坡度
    PercentRise,
}

/// 坡度计算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeMethod {
    /// 平面法 (Horn 3x3)
    Planar,
}

/// 重采样方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMethod {
    /// 双线性
    Bilinear,
    /// 最邻近 (类别型数据)
    Nearest,
}

/// 重映射未命中策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    /// 未命中 -> NoData
    Nodata,
    /// 未命中 -> 保留原值
    Keep,
}

/// 栅格/矢量引擎操作集
///
/// 实现方保证每个操作要么返回完整结果、要么返回错误，
/// 不产生部分结果。
pub trait RasterEngine: Send + Sync {
    /// 填洼。`z_limit` 限制最大填充深度，超限的洼地保持原状
    fn fill(&self, dem: &RasterGrid, z_limit: Option<f64>) -> EngineResult<RasterGrid>;

    /// D8 流向, 域边缘强制外流
    fn flow_direction(&self, filled: &RasterGrid) -> EngineResult<RasterGrid>;

    /// 汇流累积 (每个像元的上游像元数)
    fn flow_accumulation(&self, direction: &RasterGrid) -> EngineResult<RasterGrid>;

    /// 条件阈值: 值 >= threshold 置 1, 否则 NoData
    fn con_threshold(&self, raster: &RasterGrid, threshold: f64) -> EngineResult<RasterGrid>;

    /// 河网栅格转简化折线要素, 用流向决定分支拓扑
    fn stream_to_features(
        &self,
        streams: &RasterGrid,
        direction: &RasterGrid,
    ) -> EngineResult<StreamNetwork>;

    /// 线密度 (km / km²), 固定搜索半径 (米)
    fn line_density(
        &self,
        network: &StreamNetwork,
        grid: &GridSpec,
        search_radius: f64,
    ) -> EngineResult<RasterGrid>;

    /// 坡度
    fn slope(
        &self,
        dem: &RasterGrid,
        units: SlopeUnits,
        method: SlopeMethod,
    ) -> EngineResult<RasterGrid>;

    /// 重采样到目标网格
    fn resample(
        &self,
        raster: &RasterGrid,
        target: &GridSpec,
        method: ResampleMethod,
    ) -> EngineResult<RasterGrid>;

    /// 按属性字段把矢量要素转为类别栅格
    fn rasterize_features(
        &self,
        features: &FeatureSet,
        value_field: &str,
        grid: &GridSpec,
    ) -> EngineResult<RasterGrid>;

    /// 按重映射串重分类 (语法见 fm_schema::remap)
    fn reclassify(
        &self,
        raster: &RasterGrid,
        remap_spec: &str,
        missing: MissingPolicy,
    ) -> EngineResult<RasterGrid>;

    /// 按传递函数重缩放
    fn rescale_by_function(
        &self,
        raster: &RasterGrid,
        function: &TransferFunction,
    ) -> EngineResult<RasterGrid>;
}
