// crates/fm_analysis/src/driver.rs

//! 分析驱动
//!
//! 按流域顺序执行: 预处理 -> 逐层分类 -> 加权叠加, 洪水与回灌
//! 两种分析类型各一套模式与权重列, 最后可把两个适宜性面合并为
//! Flood-MAR 综合面。
//!
//! 洪水分析用连续 + 类别模式; 回灌分析用离散 + 类别模式。
//! 每种分析把 `Classified_*` 产物与综合面写入各自的缓存目录。

use crate::classify;
use crate::error::{stage, AnalysisResult};
use crate::layers::{self, schema};
use crate::overlay;
use crate::preprocess::PreprocessedLayers;
use fm_engine::{RasterEngine, ResampleMethod};
use fm_raster::{RasterGrid, Workspace};
use fm_schema::{
    AnalysisKind, CategoricalSchemas, ContinuousSchemas, DiscreteSchemas, LayerWeights,
};
use std::collections::HashMap;
use tracing::info;

/// 洪水分析缓存目录
pub const FLOODING_CACHE: &str = "Flooding";
/// 回灌分析缓存目录
pub const RECHARGE_CACHE: &str = "Recharge";
/// Flood-MAR 合并缓存目录
pub const FLOODMAR_CACHE: &str = "FloodMAR";
/// 洪水适宜性产物名
pub const FLOODING_SUITABILITY: &str = "Flooding_Suitability";
/// 回灌适宜性产物名
pub const RECHARGE_SUITABILITY: &str = "Recharge_Suitability";

/// 洪水分析模式集
#[derive(Debug, Clone, Default)]
pub struct FloodSchemas {
    /// 连续层模式
    pub continuous: ContinuousSchemas,
    /// 类别层模式
    pub categorical: CategoricalSchemas,
}

/// 回灌分析模式集
#[derive(Debug, Clone, Default)]
pub struct RechargeSchemas {
    /// 离散层模式
    pub discrete: DiscreteSchemas,
    /// 类别层模式
    pub categorical: CategoricalSchemas,
}

/// 预处理之外的专题输入层
#[derive(Debug)]
pub struct ThematicInputs {
    /// 植被指数 (连续)
    pub ndvi: RasterGrid,
    /// 土地覆盖 (类别)
    pub lulc: RasterGrid,
    /// 土壤水文组 (类别)
    pub soils: RasterGrid,
    /// 线性构造密度 (连续)
    pub lineaments: RasterGrid,
}

/// 分析驱动
pub struct SuitabilityDriver<'a> {
    engine: &'a dyn RasterEngine,
    workspace: Workspace,
    watershed: String,
}

impl<'a> SuitabilityDriver<'a> {
    /// 创建驱动
    pub fn new(
        engine: &'a dyn RasterEngine,
        workspace: Workspace,
        watershed: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            workspace,
            watershed: watershed.into(),
        }
    }

    /// 工作区
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// 洪水适宜性分析
    pub fn run_flooding(
        &self,
        pre: &PreprocessedLayers,
        thematic: &ThematicInputs,
        schemas: &FloodSchemas,
        weights: &LayerWeights,
    ) -> AnalysisResult<RasterGrid> {
        info!("=== {} 洪水适宜性分析 ===", self.watershed);
        let cache = self.workspace.cache(FLOODING_CACHE)?;
        let snapped = self.snap_thematic(thematic)?;

        info!("分类图层...");
        let mut classified = HashMap::new();

        // 连续层
        for (name, raster) in [
            (schema::DEM, &pre.filled_dem),
            (schema::SLOPE, &pre.slope),
            (schema::LINEAMENTS, &snapped.lineaments),
            (schema::DRAINAGE, &pre.drainage_density),
            (schema::PRECIP, &pre.precipitation),
            (schema::NDVI, &snapped.ndvi),
        ] {
            let out = classify::classify_continuous(self.engine, raster, &schemas.continuous, name)?;
            cache.save_raster(&layers::classified_name(name), &out)?;
            classified.insert(name.to_string(), out);
        }

        // 类别层
        for (name, raster) in [
            (schema::LITHOLOGY, &pre.lithology),
            (schema::SOILS, &snapped.soils),
            (schema::LULC, &snapped.lulc),
        ] {
            let out =
                classify::classify_categorical(self.engine, raster, &schemas.categorical, name)?;
            cache.save_raster(&layers::classified_name(name), &out)?;
            classified.insert(name.to_string(), out);
        }

        info!("栅格计算...");
        let suitability =
            overlay::combine(&classified, &weights.for_analysis(AnalysisKind::Flooding))?;
        cache.save_raster(FLOODING_SUITABILITY, &suitability)?;
        Ok(suitability)
    }

    /// 回灌适宜性分析
    pub fn run_recharge(
        &self,
        pre: &PreprocessedLayers,
        thematic: &ThematicInputs,
        schemas: &RechargeSchemas,
        weights: &LayerWeights,
    ) -> AnalysisResult<RasterGrid> {
        info!("=== {} 回灌适宜性分析 ===", self.watershed);
        let cache = self.workspace.cache(RECHARGE_CACHE)?;
        let snapped = self.snap_thematic(thematic)?;

        info!("分类图层...");
        let mut classified = HashMap::new();

        // 连续取值的层走离散区间分类
        for (name, raster) in [
            (schema::DEM, &pre.filled_dem),
            (schema::SLOPE, &pre.slope),
            (schema::LINEAMENTS, &snapped.lineaments),
            (schema::DRAINAGE, &pre.drainage_density),
            (schema::PRECIP, &pre.precipitation),
            (schema::NDVI, &snapped.ndvi),
        ] {
            let out = classify::classify_discrete(self.engine, raster, &schemas.discrete, name)?;
            cache.save_raster(&layers::classified_name(name), &out)?;
            classified.insert(name.to_string(), out);
        }

        // 类别层
        for (name, raster) in [
            (schema::LITHOLOGY, &pre.lithology),
            (schema::SOILS, &snapped.soils),
            (schema::LULC, &snapped.lulc),
        ] {
            let out =
                classify::classify_categorical(self.engine, raster, &schemas.categorical, name)?;
            cache.save_raster(&layers::classified_name(name), &out)?;
            classified.insert(name.to_string(), out);
        }

        info!("栅格计算...");
        let suitability =
            overlay::combine(&classified, &weights.for_analysis(AnalysisKind::Recharge))?;
        cache.save_raster(RECHARGE_SUITABILITY, &suitability)?;
        Ok(suitability)
    }

    /// Flood-MAR 合并: 读取两个适宜性面, 归一化后相乘
    ///
    /// 依赖洪水与回灌分析的输出; 未运行时报文件不存在。
    pub fn run_flood_mar(&self) -> AnalysisResult<RasterGrid> {
        info!("=== {} Flood-MAR 合并 ===", self.watershed);
        let flood = self
            .workspace
            .cache(FLOODING_CACHE)?
            .load_raster(FLOODING_SUITABILITY)?;
        let recharge = self
            .workspace
            .cache(RECHARGE_CACHE)?
            .load_raster(RECHARGE_SUITABILITY)?;

        let merged = overlay::flood_mar(&flood, &recharge)?;

        let cache = self.workspace.cache(FLOODMAR_CACHE)?;
        let name = format!("{}_FloodMAR", self.watershed);
        cache.save_raster(&name, &merged)?;
        info!("Flood-MAR 产物: {name}");
        Ok(merged)
    }

    /// 专题输入贴齐工作区网格
    fn snap_thematic(&self, thematic: &ThematicInputs) -> AnalysisResult<ThematicInputs> {
        Ok(ThematicInputs {
            ndvi: self.snapped(&thematic.ndvi, ResampleMethod::Bilinear)?,
            lulc: self.snapped(&thematic.lulc, ResampleMethod::Nearest)?,
            soils: self.snapped(&thematic.soils, ResampleMethod::Nearest)?,
            lineaments: self.snapped(&thematic.lineaments, ResampleMethod::Bilinear)?,
        })
    }

    fn snapped(&self, raster: &RasterGrid, method: ResampleMethod) -> AnalysisResult<RasterGrid> {
        if raster.spec().aligned_with(&self.workspace.grid) {
            return Ok(raster.clone());
        }
        self.engine
            .resample(raster, &self.workspace.grid, method)
            .map_err(stage("Snap"))
    }
}
