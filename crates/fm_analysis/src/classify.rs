// crates/fm_analysis/src/classify.rs

//! 重分类引擎
//!
//! 三种可互换的分类模式, 逐层选用:
//!
//! - 离散: 区间表 -> 有序重映射; 不落入任何区间的值送 NoData。
//!   区间重叠在分类时校验并报错, 不按规则顺序静默消解。
//!   注: 界外值送 NoData 是既有行为; 对于略超校准范围的观测值
//!   这可能过于严格, 保持原状待产品侧确认。
//! - 类别: 标签表 -> 精确匹配; 含空格的标签在重映射串里加引号
//!   作为原子记号。未匹配标签送 NoData。
//! - 连续: 传递函数 -> 引擎原生重缩放; domain_min > domain_max
//!   表示反向映射。
//!
//! 三种模式都输出公共适宜性尺度 (0-5) 上的栅格层; 请求模式表中
//! 不存在的层立即报错, 不静默跳过。

use crate::error::{stage, AnalysisResult};
use fm_engine::{MissingPolicy, RasterEngine};
use fm_raster::RasterGrid;
use fm_schema::{remap, CategoricalSchemas, ContinuousSchemas, DiscreteSchemas};
use tracing::{debug, info};

/// 离散分类
pub fn classify_discrete(
    engine: &dyn RasterEngine,
    raster: &RasterGrid,
    schemas: &DiscreteSchemas,
    layer: &str,
) -> AnalysisResult<RasterGrid> {
    schemas.validate(layer)?;
    let rules = schemas.rules_for(layer)?;
    let spec = remap::serialize_ranges(rules);

    info!("以离散分类模式重映射 {layer} 数据...");
    debug!("重映射串: {spec}");

    engine
        .reclassify(raster, &spec, MissingPolicy::Nodata)
        .map_err(stage(format!("Reclassify[{layer}]")))
}

/// 类别分类
pub fn classify_categorical(
    engine: &dyn RasterEngine,
    raster: &RasterGrid,
    schemas: &CategoricalSchemas,
    layer: &str,
) -> AnalysisResult<RasterGrid> {
    let rules = schemas.rules_for(layer)?;
    let spec = remap::serialize_labels(rules)?;

    info!("以类别分类模式重映射 {layer} 数据...");
    debug!("重映射串: {spec}");

    engine
        .reclassify(raster, &spec, MissingPolicy::Nodata)
        .map_err(stage(format!("Reclassify[{layer}]")))
}

/// 连续分类
pub fn classify_continuous(
    engine: &dyn RasterEngine,
    raster: &RasterGrid,
    schemas: &ContinuousSchemas,
    layer: &str,
) -> AnalysisResult<RasterGrid> {
    let function = schemas.function_for(layer)?;

    info!("以连续分类函数重映射 {layer} 数据...");
    debug!("传递函数: {function:?}");

    engine
        .rescale_by_function(raster, function)
        .map_err(stage(format!("RescaleByFunction[{layer}]")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_engine::NativeEngine;
    use fm_raster::GeoTransform;
    use fm_schema::rules::{LabelRule, RangeRule};
    use fm_schema::{SchemaError, TransferFunction};

    fn numeric_grid(values: &[f64]) -> RasterGrid {
        let mut g = RasterGrid::new(1, values.len(), GeoTransform::default(), -9999.0);
        for (col, &v) in values.iter().enumerate() {
            g.set(0, col, v);
        }
        g
    }

    #[test]
    fn test_discrete_classification() {
        let engine = NativeEngine::new();
        let schemas = DiscreteSchemas::from_rules(vec![
            (
                "DEM".to_string(),
                RangeRule {
                    lower: 0.0,
                    upper: 1000.0,
                    class: 5,
                },
            ),
            (
                "DEM".to_string(),
                RangeRule {
                    lower: 1000.0,
                    upper: 3000.0,
                    class: 2,
                },
            ),
        ]);
        let g = numeric_grid(&[500.0, 1500.0, 9000.0]);

        let out = classify_discrete(&engine, &g, &schemas, "DEM").unwrap();
        assert_eq!(out.get(0, 0), Some(5.0));
        assert_eq!(out.get(0, 1), Some(2.0));
        // 界外值 -> NoData
        assert_eq!(out.get(0, 2), None);
    }

    #[test]
    fn test_discrete_overlap_fails_at_classification_time() {
        let engine = NativeEngine::new();
        let schemas = DiscreteSchemas::from_rules(vec![
            (
                "DEM".to_string(),
                RangeRule {
                    lower: 0.0,
                    upper: 1000.0,
                    class: 5,
                },
            ),
            (
                "DEM".to_string(),
                RangeRule {
                    lower: 500.0,
                    upper: 2000.0,
                    class: 2,
                },
            ),
        ]);
        let g = numeric_grid(&[100.0]);

        let err = classify_discrete(&engine, &g, &schemas, "DEM").unwrap_err();
        assert!(err.to_string().contains("重叠"));
    }

    #[test]
    fn test_unknown_layer_is_fatal() {
        let engine = NativeEngine::new();
        let schemas = DiscreteSchemas::from_rules(vec![(
            "DEM".to_string(),
            RangeRule {
                lower: 0.0,
                upper: 1.0,
                class: 1,
            },
        )]);
        let g = numeric_grid(&[0.5]);

        let err = classify_discrete(&engine, &g, &schemas, "Slope").unwrap_err();
        assert!(matches!(
            err,
            crate::error::AnalysisError::Schema(SchemaError::MissingLayer { .. })
        ));
    }

    #[test]
    fn test_categorical_classification_with_spaced_label() {
        let engine = NativeEngine::new();
        let schemas = CategoricalSchemas::from_rules(vec![
            (
                "Lithology".to_string(),
                LabelRule {
                    label: "Early Proterozoic granite".to_string(),
                    class: 1,
                },
            ),
            (
                "Lithology".to_string(),
                LabelRule {
                    label: "Basalt".to_string(),
                    class: 2,
                },
            ),
        ]);

        let mut g = RasterGrid::new(2, 2, GeoTransform::default(), -9999.0);
        g.data.fill(0.0);
        let g = g.with_categories(vec![
            "Basalt".to_string(),
            "Early Proterozoic granite".to_string(),
        ]);

        let out = classify_categorical(&engine, &g, &schemas, "Lithology").unwrap();
        // 全图 Basalt -> 常数 2, 无 NoData
        assert_eq!(out.valid_count(), 4);
        for &v in out.data.iter() {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_continuous_classification_inverted() {
        let engine = NativeEngine::new();
        let schemas = ContinuousSchemas::from_functions(vec![(
            "DEM".to_string(),
            TransferFunction::linear(3000.0, 0.0),
        )]);
        let g = numeric_grid(&[3000.0, 0.0]);

        let out = classify_continuous(&engine, &g, &schemas, "DEM").unwrap();
        // 高海拔低分, 低海拔高分
        assert!((out.get(0, 0).unwrap() - 1.0).abs() < 1e-10);
        assert!((out.get(0, 1).unwrap() - 5.0).abs() < 1e-10);
    }
}
