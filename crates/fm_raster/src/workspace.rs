// crates/fm_raster/src/workspace.rs

//! 工作区与缓存目录
//!
//! [`Workspace`] 是一次分析运行 (一个流域) 的显式上下文：存储根目录、
//! 默认网格规格与坐标系代码。它是不可变值，按需克隆传入各阶段；
//! 嵌套计算需要收窄范围时派生一个新值，而不是修改共享状态。
//!
//! [`CacheDir`] 对应文件地理数据库：按名称存放栅格/矢量产物，
//! 名称存在即视为缓存命中 (不做内容校验)。被外部破坏的缓存条目
//! 需要操作者手工删除后才会重算。

use crate::features::StreamNetwork;
use crate::grid::{GridSpec, RasterGrid};
use crate::io::asc;
use fm_foundation::error::{FmError, FmResult};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// 分析工作区
#[derive(Debug, Clone)]
pub struct Workspace {
    /// 存储根目录
    pub root: PathBuf,
    /// 默认网格规格 (范围/对齐/分辨率)
    pub grid: GridSpec,
    /// 坐标系 EPSG 代码 (例如 32612 = WGS 1984 UTM Zone 12N)
    pub epsg: u32,
}

impl Workspace {
    /// 创建工作区
    pub fn new(root: impl Into<PathBuf>, grid: GridSpec, epsg: u32) -> Self {
        Self {
            root: root.into(),
            grid,
            epsg,
        }
    }

    /// 打开命名缓存目录 (不存在时创建)
    pub fn cache(&self, name: &str) -> FmResult<CacheDir> {
        let path = self.root.join(name);
        CacheDir::open(path)
    }

    /// 派生一个网格收窄后的新工作区
    pub fn with_grid(&self, grid: GridSpec) -> Self {
        Self {
            root: self.root.clone(),
            grid,
            epsg: self.epsg,
        }
    }
}

/// 按名称寻址的产物缓存目录
#[derive(Debug, Clone)]
pub struct CacheDir {
    path: PathBuf,
}

impl CacheDir {
    /// 打开目录，不存在时创建
    pub fn open(path: impl Into<PathBuf>) -> FmResult<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path)
            .map_err(|e| FmError::io_with_source(format!("无法创建缓存目录 {}", path.display()), e))?;
        Ok(Self { path })
    }

    /// 目录路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn raster_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.asc"))
    }

    fn categories_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.cat.json"))
    }

    fn features_path(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.json"))
    }

    /// 指定名称的产物是否存在
    pub fn exists(&self, name: &str) -> bool {
        self.raster_path(name).exists() || self.features_path(name).exists()
    }

    /// 所有名称是否都存在
    pub fn contains_all(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.exists(n))
    }

    /// 列出目录中的产物名称 (去扩展名, 排序)
    pub fn list(&self) -> FmResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let name = if let Some(stem) = file_name.strip_suffix(".asc") {
                stem.to_string()
            } else if let Some(stem) = file_name.strip_suffix(".cat.json") {
                stem.to_string()
            } else if let Some(stem) = file_name.strip_suffix(".json") {
                stem.to_string()
            } else {
                continue;
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// 保存栅格 (类别表另存 sidecar)
    pub fn save_raster(&self, name: &str, grid: &RasterGrid) -> FmResult<()> {
        tracing::debug!("写出栅格 {} -> {}", name, self.path.display());
        asc::write_asc(&self.raster_path(name), grid)?;
        if let Some(categories) = &grid.categories {
            let file = File::create(self.categories_path(name))?;
            serde_json::to_writer(BufWriter::new(file), categories)
                .map_err(|e| FmError::serialization(format!("类别表写出失败 {name}: {e}")))?;
        }
        Ok(())
    }

    /// 载入栅格
    pub fn load_raster(&self, name: &str) -> FmResult<RasterGrid> {
        let mut grid = asc::read_asc(&self.raster_path(name))?;
        let cat_path = self.categories_path(name);
        if cat_path.exists() {
            let file = File::open(&cat_path)?;
            let categories: Vec<String> = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| FmError::serialization(format!("类别表解析失败 {name}: {e}")))?;
            grid = grid.with_categories(categories);
        }
        Ok(grid)
    }

    /// 保存河网要素
    pub fn save_features(&self, name: &str, network: &StreamNetwork) -> FmResult<()> {
        let file = File::create(self.features_path(name))?;
        serde_json::to_writer(BufWriter::new(file), network)
            .map_err(|e| FmError::serialization(format!("要素写出失败 {name}: {e}")))
    }

    /// 载入河网要素
    pub fn load_features(&self, name: &str) -> FmResult<StreamNetwork> {
        let path = self.features_path(name);
        if !path.exists() {
            return Err(FmError::file_not_found(path));
        }
        let file = File::open(&path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| FmError::serialization(format!("要素解析失败 {name}: {e}")))
    }
}
