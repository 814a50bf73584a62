// crates/fm_schema/src/error.rs

//! 分类模式错误类型定义
//!
//! 模式错误一律致命：缺失的层、重叠的离散区间、无法安全序列化的
//! 类别标签都立即上抛，不做任何静默恢复。

use fm_foundation::FmError;
use thiserror::Error;

/// 模式模块结果类型别名
pub type SchemaResult<T> = Result<T, SchemaError>;

/// 分类模式错误
#[derive(Error, Debug)]
pub enum SchemaError {
    /// 请求的层在模式表中不存在
    #[error("分类模式中不存在层: {layer} (可用层: {available:?})")]
    MissingLayer {
        /// 请求的层名
        layer: String,
        /// 模式表中实际存在的层
        available: Vec<String>,
    },

    /// 离散区间重叠
    #[error("层 {layer} 的离散区间重叠: [{a_lower}, {a_upper}) 与 [{b_lower}, {b_upper})")]
    OverlappingRanges {
        /// 层名
        layer: String,
        /// 第一个区间下界
        a_lower: f64,
        /// 第一个区间上界
        a_upper: f64,
        /// 第二个区间下界
        b_lower: f64,
        /// 第二个区间上界
        b_upper: f64,
    },

    /// 区间上下界颠倒
    #[error("层 {layer} 的离散区间无效: 下界 {lower} >= 上界 {upper}")]
    InvalidRange {
        /// 层名
        layer: String,
        /// 下界
        lower: f64,
        /// 上界
        upper: f64,
    },

    /// 类别标签无法安全序列化
    #[error("类别标签无法安全序列化 (含引号定界符): {label:?}")]
    RemapFormat {
        /// 问题标签
        label: String,
    },

    /// 重映射串语法错误
    #[error("重映射串语法错误: {message} (位于 {token:?})")]
    RemapSyntax {
        /// 错误说明
        message: String,
        /// 出错的记号
        token: String,
    },

    /// 权重表条目没有对应的分类层
    #[error("权重表条目没有对应的分类层: {layer}")]
    MissingWeightLayer {
        /// 层名
        layer: String,
    },

    /// 表文件加载失败
    #[error("模式表加载失败: {0}")]
    Table(#[from] FmError),
}

impl From<SchemaError> for FmError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Table(inner) => inner,
            other => FmError::validation(other.to_string()),
        }
    }
}
