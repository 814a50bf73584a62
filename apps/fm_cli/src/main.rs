// apps/fm_cli/src/main.rs

//! FloodMAR 命令行界面
//!
//! 按流域运行洪水/回灌适宜性分析。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**:
//! - 只通过 `&dyn RasterEngine` 使用引擎
//! - 数据装载与参数解析在此层完成, 分析语义全部在 fm_analysis

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// FloodMAR 多准则栅格适宜性分析工具
#[derive(Parser)]
#[command(name = "fm_cli")]
#[command(author = "FloodMAR Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Flood-MAR raster suitability analysis", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行适宜性分析
    Run(commands::run::RunArgs),
    /// 只运行层预处理
    Preprocess(commands::preprocess::PreprocessArgs),
    /// 校验模式表与权重表
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Preprocess(args) => commands::preprocess::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
