// crates/fm_analysis/src/overlay.rs

//! 加权叠加组合
//!
//! [`combine`] 对权重表中的每一层求 `Σᵢ wᵢ·layerᵢ`。权重不要求
//! 归一化, 输出不做隐式缩放; 最坏情况下尺度为
//! `(最大等级) * Σ|wᵢ|`。权重表中的层缺少对应分类层是致命配置
//! 错误。
//!
//! [`flood_mar`] 是单独的顶层合并: 先把两个适宜性面各自 min-max
//! 归一到 [0,1] 再相乘。它与线性加权和语义不同, 是独立操作而非
//! 组合器的特例。

use crate::error::{AnalysisError, AnalysisResult};
use fm_raster::RasterGrid;
use fm_schema::SchemaError;
use std::collections::HashMap;
use tracing::info;

/// 加权线性组合
pub fn combine(
    classified: &HashMap<String, RasterGrid>,
    weights: &HashMap<String, f64>,
) -> AnalysisResult<RasterGrid> {
    if weights.is_empty() {
        return Err(AnalysisError::EmptyCombine);
    }

    // 权重表层名排序保证确定性
    let mut names: Vec<&String> = weights.keys().collect();
    names.sort();

    // 权重表中的层必须全部有分类层
    for name in &names {
        if !classified.contains_key(*name) {
            return Err(SchemaError::MissingWeightLayer {
                layer: (*name).clone(),
            }
            .into());
        }
    }

    let expression = names
        .iter()
        .map(|n| format!("({n} * {})", weights[*n]))
        .collect::<Vec<_>>()
        .join(" + ");
    info!("栅格计算表达式: {expression}");

    let first = &classified[names[0]];
    for name in &names[1..] {
        classified[*name].check_aligned(first, "加权叠加输入")?;
    }

    let mut out = RasterGrid::new(first.rows(), first.cols(), first.transform, first.nodata);
    for row in 0..first.rows() {
        for col in 0..first.cols() {
            let mut sum = 0.0;
            let mut valid = true;
            for name in &names {
                match classified[*name].get(row, col) {
                    Some(v) => sum += v * weights[*name],
                    // 任一输入 NoData 则输出 NoData
                    None => {
                        valid = false;
                        break;
                    }
                }
            }
            if valid {
                out.set(row, col, sum);
            }
        }
    }
    Ok(out)
}

/// Flood-MAR 顶层合并: 逐面归一化后相乘
pub fn flood_mar(flood: &RasterGrid, recharge: &RasterGrid) -> AnalysisResult<RasterGrid> {
    flood.check_aligned(recharge, "Flood-MAR 合并输入")?;

    info!("归一化栅格到 0 - 1 区间...");
    let flood_norm = normalize(flood, "Flood_Suitability")?;
    let recharge_norm = normalize(recharge, "Recharge_Suitability")?;

    info!("栅格计算表达式: Flood_Suitability * Recharge_Suitability");
    let mut out = RasterGrid::new(flood.rows(), flood.cols(), flood.transform, flood.nodata);
    for row in 0..flood.rows() {
        for col in 0..flood.cols() {
            if let (Some(a), Some(b)) = (flood_norm.get(row, col), recharge_norm.get(row, col)) {
                out.set(row, col, a * b);
            }
        }
    }
    Ok(out)
}

/// min-max 归一化到 [0,1]
fn normalize(surface: &RasterGrid, name: &str) -> AnalysisResult<RasterGrid> {
    let (min, max) = surface
        .min_max()
        .ok_or_else(|| AnalysisError::DegenerateSurface {
            name: name.to_string(),
        })?;
    let span = max - min;

    let mut out = RasterGrid::new(
        surface.rows(),
        surface.cols(),
        surface.transform,
        surface.nodata,
    );
    for row in 0..surface.rows() {
        for col in 0..surface.cols() {
            if let Some(v) = surface.get(row, col) {
                // 常数面归一为 0
                let n = if span.abs() < 1e-12 {
                    0.0
                } else {
                    (v - min) / span
                };
                out.set(row, col, n);
            }
        }
    }
    Ok(out)
}
