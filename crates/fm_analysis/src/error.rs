// crates/fm_analysis/src/error.rs

//! 分析阶段错误
//!
//! 引擎失败重抛时前置阶段名, 诊断原文保留; 模式错误与栅格层
//! 错误直接透传。核心不做任何重试: 引擎操作昂贵且部分失败
//! 不可幂等, 静默重试可能重复填洼或产生重复缓存条目。

use fm_engine::EngineError;
use fm_foundation::FmError;
use fm_schema::SchemaError;
use thiserror::Error;

/// 分析模块结果类型别名
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// 分析错误
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// 引擎操作失败 (带阶段上下文)
    #[error("Stage {stage} failed: {source}")]
    Engine {
        /// 失败的阶段/产物名
        stage: String,
        /// 引擎诊断 (原文)
        #[source]
        source: EngineError,
    },

    /// 模式错误
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// 栅格层/工作区错误
    #[error("Raster error: {0}")]
    Raster(#[from] FmError),

    /// 组合输入为空
    #[error("Combine requires at least one weighted layer")]
    EmptyCombine,

    /// 组合输入全为 NoData
    #[error("Normalization failed: surface {name} has no valid cells")]
    DegenerateSurface {
        /// 表面名
        name: String,
    },
}

/// 为引擎错误附加阶段上下文的适配器
pub(crate) fn stage(name: impl Into<String>) -> impl FnOnce(EngineError) -> AnalysisError {
    let stage = name.into();
    move |source| AnalysisError::Engine { stage, source }
}
