// apps/fm_cli/src/commands/run.rs

//! 运行适宜性分析命令

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fm_analysis::driver::{FloodSchemas, RechargeSchemas, SuitabilityDriver};
use fm_analysis::preprocess;
use fm_engine::NativeEngine;
use fm_schema::{CategoricalSchemas, ContinuousSchemas, DiscreteSchemas, LayerWeights};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// 要运行的分析
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Analysis {
    /// 洪水适宜性
    Flood,
    /// 回灌适宜性
    Recharge,
    /// 只做 Flood-MAR 合并 (要求前两者已运行)
    Floodmar,
    /// 全部: 洪水 -> 回灌 -> 合并
    All,
}

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 分析类型
    #[arg(short, long, value_enum, default_value = "all")]
    pub analysis: Analysis,

    /// 工作区目录 (缓存与产物)
    #[arg(short, long)]
    pub workspace: PathBuf,

    /// 流域名 (用于产物命名)
    #[arg(long, default_value = "SanPedro")]
    pub watershed: String,

    /// 输入数据目录
    #[arg(short, long)]
    pub data: PathBuf,

    /// 模式表目录
    #[arg(short, long)]
    pub schemas: PathBuf,

    /// 权重表 (默认 <schemas>/LayerWeights.csv)
    #[arg(long)]
    pub weights: Option<PathBuf>,

    /// 坐标系 EPSG 代码
    #[arg(long, default_value = "32612")]
    pub epsg: u32,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== FloodMAR 分析启动 ===");
    info!("流域: {}, 分析: {:?}", args.watershed, args.analysis);
    let start = Instant::now();

    let engine = NativeEngine::new();
    let weights_path = args
        .weights
        .clone()
        .unwrap_or_else(|| args.schemas.join("LayerWeights.csv"));
    let weights = LayerWeights::from_csv(&weights_path)
        .with_context(|| format!("装载权重表失败 {}", weights_path.display()))?;

    let (workspace, inputs) =
        super::load_preprocess_inputs(&args.data, &args.workspace, args.epsg)?;
    let driver = SuitabilityDriver::new(&engine, workspace.clone(), &args.watershed);

    if args.analysis != Analysis::Floodmar {
        let pre = preprocess::preprocess(&engine, &workspace, &inputs)
            .context("层预处理失败")?;
        let thematic = super::load_thematic_inputs(&args.data)?;

        if matches!(args.analysis, Analysis::Flood | Analysis::All) {
            let schemas = FloodSchemas {
                continuous: ContinuousSchemas::from_csv(
                    &args.schemas.join("Flooding_ContinuousSchemas.csv"),
                )
                .context("装载洪水连续模式失败")?,
                categorical: CategoricalSchemas::from_csv(
                    &args.schemas.join("Flooding_CategoricalSchemas.csv"),
                )
                .context("装载洪水类别模式失败")?,
            };
            driver
                .run_flooding(&pre, &thematic, &schemas, &weights)
                .context("洪水适宜性分析失败")?;
        }

        if matches!(args.analysis, Analysis::Recharge | Analysis::All) {
            let schemas = RechargeSchemas {
                discrete: DiscreteSchemas::from_csv(
                    &args.schemas.join("Recharge_DiscreteSchemas.csv"),
                )
                .context("装载回灌离散模式失败")?,
                categorical: CategoricalSchemas::from_csv(
                    &args.schemas.join("Recharge_CategoricalSchemas.csv"),
                )
                .context("装载回灌类别模式失败")?,
            };
            driver
                .run_recharge(&pre, &thematic, &schemas, &weights)
                .context("回灌适宜性分析失败")?;
        }
    }

    if matches!(args.analysis, Analysis::Floodmar | Analysis::All) {
        driver.run_flood_mar().context("Flood-MAR 合并失败")?;
    }

    let stats = engine.stats();
    info!("=== 分析完成 ===");
    info!("引擎操作: {} 次", stats.total());
    info!("耗时: {:.2} s", start.elapsed().as_secs_f64());

    Ok(())
}
