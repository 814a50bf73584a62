// apps/fm_cli/src/commands/preprocess.rs

//! 层预处理命令
//!
//! 只产出派生输入层, 不做分类与叠加。缓存完整时本命令是空操作。

use anyhow::{Context, Result};
use clap::Args;
use fm_analysis::preprocess;
use fm_engine::NativeEngine;
use std::path::PathBuf;
use tracing::info;

/// 预处理参数
#[derive(Args)]
pub struct PreprocessArgs {
    /// 工作区目录
    #[arg(short, long)]
    pub workspace: PathBuf,

    /// 输入数据目录
    #[arg(short, long)]
    pub data: PathBuf,

    /// 坐标系 EPSG 代码
    #[arg(long, default_value = "32612")]
    pub epsg: u32,
}

/// 执行预处理命令
pub fn execute(args: PreprocessArgs) -> Result<()> {
    info!("=== 层预处理 ===");

    let engine = NativeEngine::new();
    let (workspace, inputs) =
        super::load_preprocess_inputs(&args.data, &args.workspace, args.epsg)?;

    let layers = preprocess::preprocess(&engine, &workspace, &inputs).context("层预处理失败")?;

    info!(
        "派生层就绪: {}x{} 网格, 河网密度最大 {:.3} km/km²",
        layers.filled_dem.rows(),
        layers.filled_dem.cols(),
        layers.drainage_density.min_max().map_or(0.0, |(_, max)| max)
    );
    info!("引擎操作: {} 次", engine.stats().total());

    Ok(())
}
