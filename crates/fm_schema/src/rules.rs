// crates/fm_schema/src/rules.rs

//! 离散与类别分类模式
//!
//! 每条规则把一个取值区间或一个类别标签映射到适宜性等级 (0-5)。
//! 模式按层名索引；查询未知层立即报错，而不是静默返回空集。

use crate::error::{SchemaError, SchemaResult};
use crate::table::{read_table, TableConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 离散区间规则: 值落在 [lower, upper) 时映射到 class
///
/// 末位区间按闭区间处理 (见 [`DiscreteSchemas::rules_for`] 的调用方)，
/// 保证观测最大值可被分类。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    /// 区间下界 (含)
    pub lower: f64,
    /// 区间上界 (不含)
    pub upper: f64,
    /// 输出等级
    pub class: i32,
}

/// 类别标签规则: 标签精确匹配时映射到 class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRule {
    /// 类别标签 (可含空格)
    pub label: String,
    /// 输出等级
    pub class: i32,
}

/// 按层索引的离散分类模式
#[derive(Debug, Clone, Default)]
pub struct DiscreteSchemas {
    by_layer: BTreeMap<String, Vec<RangeRule>>,
}

impl DiscreteSchemas {
    /// 从表格文件加载
    ///
    /// 列: `layer,lowerBound,upperBound,outputClass`
    pub fn from_csv(path: &Path) -> SchemaResult<Self> {
        let records = read_table(path, &TableConfig::default())?;
        let mut by_layer: BTreeMap<String, Vec<RangeRule>> = BTreeMap::new();

        for record in &records {
            let layer = record.field(path, 0)?.to_string();
            let rule = RangeRule {
                lower: record.number(path, 1)?,
                upper: record.number(path, 2)?,
                class: record.integer(path, 3)?,
            };
            by_layer.entry(layer).or_default().push(rule);
        }

        tracing::debug!("载入离散模式: {} 层", by_layer.len());
        Ok(Self { by_layer })
    }

    /// 手工构建 (测试用)
    pub fn from_rules(rules: impl IntoIterator<Item = (String, RangeRule)>) -> Self {
        let mut by_layer: BTreeMap<String, Vec<RangeRule>> = BTreeMap::new();
        for (layer, rule) in rules {
            by_layer.entry(layer).or_default().push(rule);
        }
        Self { by_layer }
    }

    /// 层列表
    pub fn layers(&self) -> Vec<String> {
        self.by_layer.keys().cloned().collect()
    }

    /// 取层规则；未知层报错
    pub fn rules_for(&self, layer: &str) -> SchemaResult<&[RangeRule]> {
        self.by_layer
            .get(layer)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::MissingLayer {
                layer: layer.to_string(),
                available: self.layers(),
            })
    }

    /// 校验层规则合法 (上下界有序且互不重叠)
    ///
    /// 在分类时调用，而不是组合时；重叠区间是模式错误，
    /// 不按规则顺序静默消解。
    pub fn validate(&self, layer: &str) -> SchemaResult<()> {
        let rules = self.rules_for(layer)?;

        for rule in rules {
            if rule.lower >= rule.upper {
                return Err(SchemaError::InvalidRange {
                    layer: layer.to_string(),
                    lower: rule.lower,
                    upper: rule.upper,
                });
            }
        }

        let mut sorted: Vec<&RangeRule> = rules.iter().collect();
        sorted.sort_by(|a, b| a.lower.total_cmp(&b.lower));
        for pair in sorted.windows(2) {
            // 相邻区间共享端点不算重叠 ([a,b) + [b,c))
            if pair[1].lower < pair[0].upper {
                return Err(SchemaError::OverlappingRanges {
                    layer: layer.to_string(),
                    a_lower: pair[0].lower,
                    a_upper: pair[0].upper,
                    b_lower: pair[1].lower,
                    b_upper: pair[1].upper,
                });
            }
        }

        Ok(())
    }
}

/// 按层索引的类别分类模式
#[derive(Debug, Clone, Default)]
pub struct CategoricalSchemas {
    by_layer: BTreeMap<String, Vec<LabelRule>>,
}

impl CategoricalSchemas {
    /// 从表格文件加载
    ///
    /// 列: `layer,label,outputClass`
    pub fn from_csv(path: &Path) -> SchemaResult<Self> {
        let records = read_table(path, &TableConfig::default())?;
        let mut by_layer: BTreeMap<String, Vec<LabelRule>> = BTreeMap::new();

        for record in &records {
            let layer = record.field(path, 0)?.to_string();
            let rule = LabelRule {
                label: record.field(path, 1)?.to_string(),
                class: record.integer(path, 2)?,
            };
            by_layer.entry(layer).or_default().push(rule);
        }

        tracing::debug!("载入类别模式: {} 层", by_layer.len());
        Ok(Self { by_layer })
    }

    /// 手工构建 (测试用)
    pub fn from_rules(rules: impl IntoIterator<Item = (String, LabelRule)>) -> Self {
        let mut by_layer: BTreeMap<String, Vec<LabelRule>> = BTreeMap::new();
        for (layer, rule) in rules {
            by_layer.entry(layer).or_default().push(rule);
        }
        Self { by_layer }
    }

    /// 层列表
    pub fn layers(&self) -> Vec<String> {
        self.by_layer.keys().cloned().collect()
    }

    /// 取层规则；未知层报错
    pub fn rules_for(&self, layer: &str) -> SchemaResult<&[LabelRule]> {
        self.by_layer
            .get(layer)
            .map(Vec::as_slice)
            .ok_or_else(|| SchemaError::MissingLayer {
                layer: layer.to_string(),
                available: self.layers(),
            })
    }
}
