// apps/fm_cli/src/commands/mod.rs

//! 子命令与数据装载

pub mod preprocess;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use fm_analysis::preprocess::PreprocessInputs;
use fm_analysis::ThematicInputs;
use fm_raster::{CacheDir, FeatureSet, GridSpec, Workspace};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 数据目录的约定文件名 (不含扩展名)
pub const DEM: &str = "dem";
/// 降水
pub const PRECIPITATION: &str = "precipitation";
/// 岩性要素 (JSON)
pub const LITHOLOGY: &str = "lithology";
/// 植被指数
pub const NDVI: &str = "ndvi";
/// 土地覆盖
pub const LULC: &str = "lulc";
/// 土壤
pub const SOILS: &str = "soils";
/// 线性构造密度
pub const LINEAMENTS: &str = "lineaments";

/// 从 JSON 文件装载面要素集
pub fn load_feature_set(path: &Path) -> Result<FeatureSet> {
    let file =
        File::open(path).with_context(|| format!("无法打开要素文件 {}", path.display()))?;
    let features = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("要素文件解析失败 {}", path.display()))?;
    Ok(features)
}

/// 装载预处理输入, 并从 DEM 推导工作区网格
pub fn load_preprocess_inputs(
    data_dir: &Path,
    workspace_root: &Path,
    epsg: u32,
) -> Result<(Workspace, PreprocessInputs)> {
    let data = CacheDir::open(data_dir)?;

    let dem = data
        .load_raster(DEM)
        .with_context(|| format!("装载 DEM 失败 ({})", data_dir.display()))?;
    let precipitation = data
        .load_raster(PRECIPITATION)
        .context("装载降水数据失败")?;
    let lithology = load_feature_set(&data_dir.join(format!("{LITHOLOGY}.json")))?;

    // 默认网格/对齐基准 = DEM (捕捉栅格)
    let grid: GridSpec = dem.spec();
    let workspace = Workspace::new(workspace_root, grid, epsg);

    Ok((workspace, PreprocessInputs::new(dem, precipitation, lithology)))
}

/// 装载专题输入层
pub fn load_thematic_inputs(data_dir: &Path) -> Result<ThematicInputs> {
    let data = CacheDir::open(data_dir)?;
    Ok(ThematicInputs {
        ndvi: data.load_raster(NDVI).context("装载 NDVI 失败")?,
        lulc: data.load_raster(LULC).context("装载 LULC 失败")?,
        soils: data.load_raster(SOILS).context("装载土壤数据失败")?,
        lineaments: data
            .load_raster(LINEAMENTS)
            .context("装载线性构造密度失败")?,
    })
}
