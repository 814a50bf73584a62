// crates/fm_raster/src/grid.rs

//! 栅格数据管理
//!
//! 提供栅格层的存储和访问。一个 [`RasterGrid`] 是二维数值面 +
//! 仿射变换 + NoData 值，类别型栅格另带类别表
//! (像元值 = 类别表索引)。

use crate::transform::GeoTransform;
use fm_foundation::error::{FmError, FmResult};
use ndarray::Array2;

/// 网格规格：派生层必须与工作区的默认网格对齐
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// 行数
    pub rows: usize,
    /// 列数
    pub cols: usize,
    /// 仿射变换
    pub transform: GeoTransform,
    /// NoData 值
    pub nodata: f64,
}

impl GridSpec {
    /// 创建规格
    pub fn new(rows: usize, cols: usize, transform: GeoTransform, nodata: f64) -> Self {
        Self {
            rows,
            cols,
            transform,
            nodata,
        }
    }

    /// 像素分辨率 (米)
    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size
    }

    /// 与另一规格对齐 (行列数一致且变换近似相等)
    pub fn aligned_with(&self, other: &GridSpec) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self.transform.approx_eq(&other.transform)
    }
}

/// 栅格层
#[derive(Debug, Clone)]
pub struct RasterGrid {
    /// 像元值 (行优先)
    pub data: Array2<f64>,
    /// 仿射变换
    pub transform: GeoTransform,
    /// NoData 值
    pub nodata: f64,
    /// 类别表 (仅类别型栅格, 像元值为索引)
    pub categories: Option<Vec<String>>,
}

impl RasterGrid {
    /// 创建全 NoData 栅格
    pub fn new(rows: usize, cols: usize, transform: GeoTransform, nodata: f64) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), nodata),
            transform,
            nodata,
            categories: None,
        }
    }

    /// 按规格创建常数栅格
    pub fn constant(spec: &GridSpec, value: f64) -> Self {
        Self {
            data: Array2::from_elem((spec.rows, spec.cols), value),
            transform: spec.transform,
            nodata: spec.nodata,
            categories: None,
        }
    }

    /// 从数组创建
    pub fn from_data(data: Array2<f64>, transform: GeoTransform, nodata: f64) -> Self {
        Self {
            data,
            transform,
            nodata,
            categories: None,
        }
    }

    /// 附加类别表
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// 行数
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// 列数
    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// 获取像元值，NoData 返回 None
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let v = *self.data.get((row, col))?;
        if self.is_nodata(v) {
            None
        } else {
            Some(v)
        }
    }

    /// 设置像元值
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        if let Some(cell) = self.data.get_mut((row, col)) {
            *cell = value;
        }
    }

    /// 判断是否为无数据
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || (self.nodata.is_finite() && (value - self.nodata).abs() < 1e-10)
    }

    /// 网格规格
    pub fn spec(&self) -> GridSpec {
        GridSpec::new(self.rows(), self.cols(), self.transform, self.nodata)
    }

    /// 有效像元的最小/最大值，全 NoData 时返回 None
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut seen = false;
        for &v in self.data.iter() {
            if self.is_nodata(v) {
                continue;
            }
            seen = true;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        if seen {
            Some((min, max))
        } else {
            None
        }
    }

    /// 有效像元数量
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| !self.is_nodata(v)).count()
    }

    /// 按类别标签查索引
    pub fn category_index(&self, label: &str) -> Option<usize> {
        self.categories
            .as_ref()
            .and_then(|cats| cats.iter().position(|c| c == label))
    }

    /// 双线性插值 (连续像素坐标)
    ///
    /// 任一参与像元为 NoData 时返回 None。
    pub fn interpolate(&self, row: f64, col: f64) -> Option<f64> {
        if row < 0.0 || col < 0.0 {
            return None;
        }

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = r0 + 1;
        let c1 = c0 + 1;

        if r1 >= self.rows() || c1 >= self.cols() {
            // 贴边时退化为最邻近
            return self.get(r0.min(self.rows() - 1), c0.min(self.cols() - 1));
        }

        let v00 = self.get(r0, c0)?;
        let v01 = self.get(r0, c1)?;
        let v10 = self.get(r1, c0)?;
        let v11 = self.get(r1, c1)?;

        let fc = col - c0 as f64;
        let fr = row - r0 as f64;

        let top = v00 * (1.0 - fc) + v01 * fc;
        let bottom = v10 * (1.0 - fc) + v11 * fc;

        Some(top * (1.0 - fr) + bottom * fr)
    }

    /// 检查与另一栅格网格对齐，否则报错
    pub fn check_aligned(&self, other: &RasterGrid, context: &str) -> FmResult<()> {
        if self.rows() != other.rows()
            || self.cols() != other.cols()
            || !self.transform.approx_eq(&other.transform)
        {
            return Err(FmError::grid_mismatch(format!(
                "{}: {}x{} vs {}x{}",
                context,
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            )));
        }
        Ok(())
    }
}
