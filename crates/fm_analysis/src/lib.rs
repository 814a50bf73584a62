// crates/fm_analysis/src/lib.rs

//! FloodMAR Analysis Layer
//!
//! 多准则栅格适宜性分析核心。
//!
//! # 模块概览
//!
//! - [`conditioning`]: 水文条件化 (流向/汇流/河网)
//! - [`drainage`]: 排水密度
//! - [`preprocess`]: 派生层编排与存在即命中缓存
//! - [`classify`]: 离散/类别/连续三种分类模式
//! - [`overlay`]: 加权叠加与 Flood-MAR 归一化乘积合并
//! - [`driver`]: 按流域/分析类型的顶层顺序
//! - [`layers`]: 产物与模式层命名
//!
//! 控制流: 驱动 -> 预处理编排 (产出/校验缓存派生层) -> 重分类
//! 引擎 (每专题层一次) -> 加权叠加 (综合面), 可选 Flood-MAR 合并。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classify;
pub mod conditioning;
pub mod drainage;
pub mod driver;
pub mod error;
pub mod layers;
pub mod overlay;
pub mod preprocess;

pub use driver::{FloodSchemas, RechargeSchemas, SuitabilityDriver, ThematicInputs};
pub use error::{AnalysisError, AnalysisResult};
pub use preprocess::{PreprocessInputs, PreprocessedLayers};
