// crates/fm_raster/src/transform.rs

//! 地理仿射变换
//!
//! 像素坐标与地理坐标的双向映射。本项目只处理北向上的规则网格，
//! 不支持旋转项。

use serde::{Deserialize, Serialize};

/// 北向上栅格的仿射变换
///
/// `origin_x/origin_y` 为左上角坐标，`cell_size` 为像素边长 (米)。
/// y 方向分辨率恒为 `-cell_size`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// 左上角 x 坐标
    pub origin_x: f64,
    /// 左上角 y 坐标
    pub origin_y: f64,
    /// 像素边长 (正值, 米)
    pub cell_size: f64,
}

impl GeoTransform {
    /// 创建变换
    pub fn new(origin_x: f64, origin_y: f64, cell_size: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            cell_size,
        }
    }

    /// 像素中心的地理坐标
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.cell_size;
        let y = self.origin_y - (row as f64 + 0.5) * self.cell_size;
        (x, y)
    }

    /// 地理坐标转连续像素坐标 (row, col)
    #[inline]
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.origin_x) / self.cell_size;
        let row = (self.origin_y - y) / self.cell_size;
        (row, col)
    }

    /// 网格范围 (min_x, min_y, max_x, max_y)
    pub fn extent(&self, rows: usize, cols: usize) -> (f64, f64, f64, f64) {
        let max_x = self.origin_x + cols as f64 * self.cell_size;
        let min_y = self.origin_y - rows as f64 * self.cell_size;
        (self.origin_x, min_y, max_x, self.origin_y)
    }

    /// 与另一变换近似相等 (容差 1e-6)
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.origin_x - other.origin_x).abs() < 1e-6
            && (self.origin_y - other.origin_y).abs() < 1e-6
            && (self.cell_size - other.cell_size).abs() < 1e-6
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_size: 1.0,
        }
    }
}
