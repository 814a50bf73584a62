// crates/fm_schema/src/lib.rs

//! FloodMAR Schema Layer
//!
//! 分类规则、传递函数、层权重与重映射串语法。
//!
//! # 模块概览
//!
//! - [`rules`]: 离散区间 / 类别标签模式, 按层索引
//! - [`transfer`]: 连续分类的传递函数规格
//! - [`weights`]: 层权重表 (洪水 / 回灌两列)
//! - [`remap`]: 重映射串序列化与解析 (引号语法的唯一实现点)
//! - [`table`]: 分隔符文本表加载
//! - [`error`]: 模式错误 (缺层 / 区间重叠 / 标签无法序列化)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod remap;
pub mod rules;
pub mod table;
pub mod transfer;
pub mod weights;

pub use error::{SchemaError, SchemaResult};
pub use remap::RemapEntry;
pub use rules::{CategoricalSchemas, DiscreteSchemas, LabelRule, RangeRule};
pub use transfer::{ContinuousSchemas, TfKind, TransferFunction};
pub use weights::{AnalysisKind, LayerWeights, WeightRow};
