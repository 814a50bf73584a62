// crates/fm_schema/src/transfer.rs

//! 连续分类的传递函数
//!
//! 把原始值域 `[domain_min, domain_max]` 重缩放到输出区间
//! (默认 1-5)。`domain_min > domain_max` 表示反向映射：
//! 原始值越低适宜性越高，这是表达 "低值 ⇒ 高分" 的标准手法。
//!
//! 阈值截断优先于曲线：低于下阈值/高于上阈值的原始值直接取
//! 固定输出，与函数形状无关。

use crate::error::{SchemaError, SchemaResult};
use crate::table::{read_table, TableConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 指数曲线曲率
const EXPONENTIAL_SHAPE: f64 = 3.0;
/// 逻辑斯蒂曲线陡度
const LOGISTIC_STEEPNESS: f64 = 10.0;

/// 传递函数形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TfKind {
    /// 线性
    Linear,
    /// 指数 (低端平缓, 高端陡峭)
    Exponential,
    /// 逻辑斯蒂 (S 形)
    Logistic,
}

impl TfKind {
    /// 按名称解析
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "linear" | "tflinear" => Some(Self::Linear),
            "exponential" | "tfexponential" => Some(Self::Exponential),
            "logistic" | "tflogistic" => Some(Self::Logistic),
            _ => None,
        }
    }

    #[inline]
    fn shape(&self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::Exponential => {
                ((EXPONENTIAL_SHAPE * t).exp() - 1.0) / (EXPONENTIAL_SHAPE.exp() - 1.0)
            }
            Self::Logistic => {
                let raw = |x: f64| 1.0 / (1.0 + (-LOGISTIC_STEEPNESS * (x - 0.5)).exp());
                // 归一化使端点精确落在 0/1
                (raw(t) - raw(0.0)) / (raw(1.0) - raw(0.0))
            }
        }
    }
}

/// 传递函数规格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferFunction {
    /// 函数形状
    pub kind: TfKind,
    /// 值域起点 (可大于 domain_max 表示反向映射)
    pub domain_min: f64,
    /// 值域终点
    pub domain_max: f64,
    /// 输出下界
    pub out_min: f64,
    /// 输出上界
    pub out_max: f64,
    /// 下阈值 (原始值低于此值时直接取 value_below)
    pub lower_threshold: Option<f64>,
    /// 下阈值对应输出
    pub value_below: Option<f64>,
    /// 上阈值 (原始值高于此值时直接取 value_above)
    pub upper_threshold: Option<f64>,
    /// 上阈值对应输出
    pub value_above: Option<f64>,
}

impl TransferFunction {
    /// 创建线性函数, 输出默认 1-5
    pub fn linear(domain_min: f64, domain_max: f64) -> Self {
        Self {
            kind: TfKind::Linear,
            domain_min,
            domain_max,
            out_min: 1.0,
            out_max: 5.0,
            lower_threshold: None,
            value_below: None,
            upper_threshold: None,
            value_above: None,
        }
    }

    /// 设置输出区间
    pub fn with_output(mut self, out_min: f64, out_max: f64) -> Self {
        self.out_min = out_min;
        self.out_max = out_max;
        self
    }

    /// 设置下阈值截断
    pub fn with_lower_clamp(mut self, threshold: f64, value: f64) -> Self {
        self.lower_threshold = Some(threshold);
        self.value_below = Some(value);
        self
    }

    /// 设置上阈值截断
    pub fn with_upper_clamp(mut self, threshold: f64, value: f64) -> Self {
        self.upper_threshold = Some(threshold);
        self.value_above = Some(value);
        self
    }

    /// 是否为反向映射
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.domain_min > self.domain_max
    }

    /// 求值
    pub fn evaluate(&self, v: f64) -> f64 {
        if let (Some(threshold), Some(value)) = (self.lower_threshold, self.value_below) {
            if v < threshold {
                return value;
            }
        }
        if let (Some(threshold), Some(value)) = (self.upper_threshold, self.value_above) {
            if v > threshold {
                return value;
            }
        }

        let span = self.domain_max - self.domain_min;
        let t = if span.abs() < 1e-12 {
            0.0
        } else {
            ((v - self.domain_min) / span).clamp(0.0, 1.0)
        };

        self.out_min + self.kind.shape(t) * (self.out_max - self.out_min)
    }
}

/// 按层索引的连续分类模式
#[derive(Debug, Clone, Default)]
pub struct ContinuousSchemas {
    by_layer: BTreeMap<String, TransferFunction>,
}

impl ContinuousSchemas {
    /// 从表格文件加载
    ///
    /// 列: `layer,function,domainMin,domainMax,outputMin,outputMax,`
    /// `lowerThreshold,valueBelowThreshold,upperThreshold,valueAboveThreshold`
    /// (后四列可为空)
    pub fn from_csv(path: &Path) -> SchemaResult<Self> {
        let records = read_table(path, &TableConfig::default())?;
        let mut by_layer = BTreeMap::new();

        for record in &records {
            let layer = record.field(path, 0)?.to_string();
            let func_name = record.field(path, 1)?;
            let kind = TfKind::parse(func_name).ok_or_else(|| {
                SchemaError::Table(fm_foundation::FmError::parse(
                    path,
                    record.line,
                    format!("未知传递函数: {func_name}"),
                ))
            })?;

            let func = TransferFunction {
                kind,
                domain_min: record.number(path, 2)?,
                domain_max: record.number(path, 3)?,
                out_min: record.optional_number(path, 4)?.unwrap_or(1.0),
                out_max: record.optional_number(path, 5)?.unwrap_or(5.0),
                lower_threshold: record.optional_number(path, 6)?,
                value_below: record.optional_number(path, 7)?,
                upper_threshold: record.optional_number(path, 8)?,
                value_above: record.optional_number(path, 9)?,
            };
            by_layer.insert(layer, func);
        }

        tracing::debug!("载入连续模式: {} 层", by_layer.len());
        Ok(Self { by_layer })
    }

    /// 手工构建 (测试用)
    pub fn from_functions(funcs: impl IntoIterator<Item = (String, TransferFunction)>) -> Self {
        Self {
            by_layer: funcs.into_iter().collect(),
        }
    }

    /// 层列表
    pub fn layers(&self) -> Vec<String> {
        self.by_layer.keys().cloned().collect()
    }

    /// 取层函数；未知层报错
    pub fn function_for(&self, layer: &str) -> SchemaResult<&TransferFunction> {
        self.by_layer
            .get(layer)
            .ok_or_else(|| SchemaError::MissingLayer {
                layer: layer.to_string(),
                available: self.layers(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_forward() {
        let f = TransferFunction::linear(0.0, 100.0);
        assert!((f.evaluate(0.0) - 1.0).abs() < 1e-10);
        assert!((f.evaluate(100.0) - 5.0).abs() < 1e-10);
        assert!((f.evaluate(50.0) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_linear_inverted() {
        // domain_min > domain_max: 反向映射
        let f = TransferFunction::linear(3000.0, 0.0);
        assert!(f.is_inverted());
        // domainMin 处取 outputMin
        assert!((f.evaluate(3000.0) - 1.0).abs() < 1e-10);
        // domainMax 处取 outputMax
        assert!((f.evaluate(0.0) - 5.0).abs() < 1e-10);
        // 中点
        assert!((f.evaluate(1500.0) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_inversion_monotonicity() {
        let forward = TransferFunction::linear(0.0, 100.0);
        let inverted = TransferFunction::linear(100.0, 0.0);
        for i in 0..10 {
            let v0 = i as f64 * 10.0;
            let v1 = v0 + 10.0;
            assert!(forward.evaluate(v1) > forward.evaluate(v0));
            assert!(inverted.evaluate(v1) < inverted.evaluate(v0));
        }
    }

    #[test]
    fn test_clamps() {
        let f = TransferFunction::linear(0.0, 100.0)
            .with_lower_clamp(10.0, 0.0)
            .with_upper_clamp(90.0, 5.0);
        assert!((f.evaluate(5.0) - 0.0).abs() < 1e-10);
        assert!((f.evaluate(95.0) - 5.0).abs() < 1e-10);
        // 阈值之间走曲线
        assert!((f.evaluate(50.0) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_domain_clamp() {
        let f = TransferFunction::linear(0.0, 100.0);
        // 值域外贴边
        assert!((f.evaluate(-50.0) - 1.0).abs() < 1e-10);
        assert!((f.evaluate(150.0) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_exponential_endpoints() {
        let f = TransferFunction {
            kind: TfKind::Exponential,
            ..TransferFunction::linear(0.0, 1.0)
        };
        assert!((f.evaluate(0.0) - 1.0).abs() < 1e-10);
        assert!((f.evaluate(1.0) - 5.0).abs() < 1e-10);
        // 指数曲线中点低于线性中点
        assert!(f.evaluate(0.5) < 3.0);
    }

    #[test]
    fn test_logistic_endpoints() {
        let f = TransferFunction {
            kind: TfKind::Logistic,
            ..TransferFunction::linear(0.0, 1.0)
        };
        assert!((f.evaluate(0.0) - 1.0).abs() < 1e-9);
        assert!((f.evaluate(1.0) - 5.0).abs() < 1e-9);
        assert!((f.evaluate(0.5) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TfKind::parse("Linear"), Some(TfKind::Linear));
        assert_eq!(TfKind::parse("TfExponential"), Some(TfKind::Exponential));
        assert_eq!(TfKind::parse("spline"), None);
    }

    #[test]
    fn test_schemas_lookup() {
        let schemas = ContinuousSchemas::from_functions(vec![(
            "DEM".to_string(),
            TransferFunction::linear(3000.0, 900.0),
        )]);
        assert!(schemas.function_for("DEM").is_ok());
        assert!(matches!(
            schemas.function_for("Slope"),
            Err(SchemaError::MissingLayer { .. })
        ));
    }
}
