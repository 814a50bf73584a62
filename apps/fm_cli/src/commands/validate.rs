// apps/fm_cli/src/commands/validate.rs

//! 模式表校验命令
//!
//! 装载全部模式与权重表, 校验离散区间不重叠且类别标签可安全
//! 序列化, 在运行昂贵的引擎操作之前暴露配置错误。

use anyhow::{bail, Context, Result};
use clap::Args;
use fm_schema::{remap, CategoricalSchemas, ContinuousSchemas, DiscreteSchemas, LayerWeights};
use std::path::PathBuf;
use tracing::{info, warn};

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 模式表目录
    #[arg(short, long)]
    pub schemas: PathBuf,

    /// 权重表 (默认 <schemas>/LayerWeights.csv)
    #[arg(long)]
    pub weights: Option<PathBuf>,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== 模式表校验 ===");
    let mut problems = 0usize;

    // 洪水连续模式
    let continuous =
        ContinuousSchemas::from_csv(&args.schemas.join("Flooding_ContinuousSchemas.csv"))
            .context("装载洪水连续模式失败")?;
    info!("洪水连续模式: {} 层", continuous.layers().len());

    // 回灌离散模式: 区间重叠检查
    let discrete = DiscreteSchemas::from_csv(&args.schemas.join("Recharge_DiscreteSchemas.csv"))
        .context("装载回灌离散模式失败")?;
    for layer in discrete.layers() {
        if let Err(e) = discrete.validate(&layer) {
            warn!("离散模式无效: {e}");
            problems += 1;
        }
    }
    info!("回灌离散模式: {} 层", discrete.layers().len());

    // 类别模式: 标签序列化检查
    for file in [
        "Flooding_CategoricalSchemas.csv",
        "Recharge_CategoricalSchemas.csv",
    ] {
        let categorical = CategoricalSchemas::from_csv(&args.schemas.join(file))
            .with_context(|| format!("装载类别模式失败 {file}"))?;
        for layer in categorical.layers() {
            let rules = categorical.rules_for(&layer)?;
            if let Err(e) = remap::serialize_labels(rules) {
                warn!("类别标签无法序列化 ({file}/{layer}): {e}");
                problems += 1;
            }
        }
        info!("{file}: {} 层", categorical.layers().len());
    }

    // 权重表
    let weights_path = args
        .weights
        .clone()
        .unwrap_or_else(|| args.schemas.join("LayerWeights.csv"));
    let weights = LayerWeights::from_csv(&weights_path).context("装载权重表失败")?;
    info!("权重表: {} 层", weights.len());

    if problems > 0 {
        bail!("校验发现 {problems} 个问题");
    }
    info!("校验通过");
    Ok(())
}
