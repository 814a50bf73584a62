// crates/fm_schema/src/weights.rs

//! 层权重表
//!
//! 每层两列权重：洪水适宜性与回灌适宜性各用一列。权重是带符号
//! 实数，不要求归一化；组合器不做任何隐式归一。

use crate::error::{SchemaError, SchemaResult};
use crate::table::{read_table, TableConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 分析类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    /// 洪水适宜性
    Flooding,
    /// 含水层回灌适宜性
    Recharge,
}

impl AnalysisKind {
    /// 显示名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flooding => "Flooding",
            Self::Recharge => "Recharge",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 一行权重
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    /// 洪水权重
    pub flooding: f64,
    /// 回灌权重
    pub recharge: f64,
}

/// 层权重表
#[derive(Debug, Clone, Default)]
pub struct LayerWeights {
    by_layer: HashMap<String, WeightRow>,
    order: Vec<String>,
}

impl LayerWeights {
    /// 从表格文件加载
    ///
    /// 列: `layer,floodingWeight,rechargeWeight`
    pub fn from_csv(path: &Path) -> SchemaResult<Self> {
        let records = read_table(path, &TableConfig::default())?;
        let mut by_layer = HashMap::new();
        let mut order = Vec::new();

        for record in &records {
            let layer = record.field(path, 0)?.to_string();
            let row = WeightRow {
                flooding: record.number(path, 1)?,
                recharge: record.number(path, 2)?,
            };
            if by_layer.insert(layer.clone(), row).is_none() {
                order.push(layer);
            }
        }

        tracing::debug!("载入权重表: {} 层", order.len());
        Ok(Self { by_layer, order })
    }

    /// 手工构建 (测试用)
    pub fn from_rows(rows: impl IntoIterator<Item = (String, WeightRow)>) -> Self {
        let mut by_layer = HashMap::new();
        let mut order = Vec::new();
        for (layer, row) in rows {
            if by_layer.insert(layer.clone(), row).is_none() {
                order.push(layer);
            }
        }
        Self { by_layer, order }
    }

    /// 层列表 (表内顺序)
    pub fn layers(&self) -> &[String] {
        &self.order
    }

    /// 层数
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 取某层某分析类型的权重
    pub fn weight_for(&self, layer: &str, kind: AnalysisKind) -> SchemaResult<f64> {
        let row = self
            .by_layer
            .get(layer)
            .ok_or_else(|| SchemaError::MissingLayer {
                layer: layer.to_string(),
                available: self.order.clone(),
            })?;
        Ok(match kind {
            AnalysisKind::Flooding => row.flooding,
            AnalysisKind::Recharge => row.recharge,
        })
    }

    /// 提取某分析类型的完整权重映射 (丢弃另一列)
    pub fn for_analysis(&self, kind: AnalysisKind) -> HashMap<String, f64> {
        self.by_layer
            .iter()
            .map(|(layer, row)| {
                let w = match kind {
                    AnalysisKind::Flooding => row.flooding,
                    AnalysisKind::Recharge => row.recharge,
                };
                (layer.clone(), w)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("fm_schema_weights_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("weights.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_and_split() {
        let path = write_temp(
            "layer,floodingWeight,rechargeWeight\n\
             DEM,2.0,1.0\nSlope,-1.5,3.0\nNDVI,0.5,0.5\n",
        );
        let weights = LayerWeights::from_csv(&path).unwrap();
        assert_eq!(weights.len(), 3);
        assert_eq!(weights.layers(), &["DEM", "Slope", "NDVI"]);

        assert!((weights.weight_for("Slope", AnalysisKind::Flooding).unwrap() - -1.5).abs() < 1e-10);
        assert!((weights.weight_for("Slope", AnalysisKind::Recharge).unwrap() - 3.0).abs() < 1e-10);

        let recharge = weights.for_analysis(AnalysisKind::Recharge);
        assert_eq!(recharge.len(), 3);
        assert!((recharge["DEM"] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_layer() {
        let weights = LayerWeights::from_rows(vec![(
            "DEM".to_string(),
            WeightRow {
                flooding: 1.0,
                recharge: 1.0,
            },
        )]);
        assert!(matches!(
            weights.weight_for("LULC", AnalysisKind::Flooding),
            Err(SchemaError::MissingLayer { .. })
        ));
    }
}
