// crates/fm_engine/src/native/terrain.rs

//! 地形派生
//!
//! Horn 3x3 坡度。

use crate::error::{EngineError, EngineResult};
use crate::traits::{SlopeMethod, SlopeUnits};
use fm_raster::RasterGrid;
use ndarray::Array2;
use rayon::prelude::*;

/// 坡度
///
/// 平面法: Horn 八邻元加权差分。邻元缺失 (边缘或 NoData) 时
/// 用中心值补位。
pub fn slope(
    dem: &RasterGrid,
    units: SlopeUnits,
    method: SlopeMethod,
) -> EngineResult<RasterGrid> {
    let rows = dem.rows();
    let cols = dem.cols();
    if rows == 0 || cols == 0 {
        return Err(EngineError::empty("Slope"));
    }
    // 目前只有平面法; 匹配保证新增方法时编译器提醒
    match method {
        SlopeMethod::Planar => {}
    }

    let cell = dem.transform.cell_size;
    let nodata = dem.nodata;

    let compute_row = |row: usize| -> Vec<f64> {
        (0..cols)
            .map(|col| {
                let Some(center) = dem.get(row, col) else {
                    return nodata;
                };
                let sample = |dr: isize, dc: isize| -> f64 {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        return center;
                    }
                    dem.get(nr as usize, nc as usize).unwrap_or(center)
                };

                // Horn 窗口:
                //   a b c
                //   d e f
                //   g h i
                let a = sample(-1, -1);
                let b = sample(-1, 0);
                let c = sample(-1, 1);
                let d = sample(0, -1);
                let f = sample(0, 1);
                let g = sample(1, -1);
                let h = sample(1, 0);
                let i = sample(1, 1);

                let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * cell);
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * cell);
                let rise = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();

                match units {
                    SlopeUnits::Degrees => rise.atan().to_degrees(),
                    SlopeUnits::PercentRise => rise * 100.0,
                }
            })
            .collect()
    };

    let flat: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map_iter(compute_row)
        .collect();
    let data = Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| EngineError::failed("Slope", format!("数组重排失败: {e}")))?;

    Ok(RasterGrid::from_data(data, dem.transform, nodata))
}
