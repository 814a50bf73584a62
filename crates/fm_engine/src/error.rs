// crates/fm_engine/src/error.rs

//! 引擎错误类型定义
//!
//! 引擎操作失败对所在阶段是致命的。诊断信息按原文保留，
//! 由调用方在重抛时前置阶段上下文。

use fm_foundation::FmError;
use fm_schema::SchemaError;
use thiserror::Error;

/// 引擎模块结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;

/// 栅格引擎错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 操作执行失败
    #[error("{op} 失败: {message}")]
    OperationFailed {
        /// 操作名
        op: &'static str,
        /// 诊断信息 (原文)
        message: String,
    },

    /// 输入为空
    #[error("{op}: 输入数据为空")]
    EmptyInput {
        /// 操作名
        op: &'static str,
    },

    /// 输入网格不一致
    #[error("{op}: 输入网格不一致: {message}")]
    GridMismatch {
        /// 操作名
        op: &'static str,
        /// 不一致说明
        message: String,
    },

    /// 重映射串错误
    #[error("重映射串错误: {0}")]
    Remap(#[from] SchemaError),
}

impl EngineError {
    /// 操作失败
    pub fn failed(op: &'static str, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            op,
            message: message.into(),
        }
    }

    /// 输入为空
    pub fn empty(op: &'static str) -> Self {
        Self::EmptyInput { op }
    }

    /// 网格不一致
    pub fn grid_mismatch(op: &'static str, message: impl Into<String>) -> Self {
        Self::GridMismatch {
            op,
            message: message.into(),
        }
    }
}

impl From<EngineError> for FmError {
    fn from(err: EngineError) -> Self {
        FmError::internal(err.to_string())
    }
}
