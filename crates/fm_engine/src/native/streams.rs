// crates/fm_engine/src/native/streams.rs

//! 河网提取
//!
//! 累积阈值化与河网栅格矢量化。

use crate::error::{EngineError, EngineResult};
use crate::native::hydrology::d8_offset;
use fm_raster::{Polyline, RasterGrid, StreamNetwork};
use ndarray::Array2;

/// 条件阈值: 值 >= threshold 置 1, 否则 NoData
pub fn con_threshold(raster: &RasterGrid, threshold: f64) -> EngineResult<RasterGrid> {
    if raster.rows() == 0 || raster.cols() == 0 {
        return Err(EngineError::empty("Con"));
    }

    let mut out = RasterGrid::new(raster.rows(), raster.cols(), raster.transform, raster.nodata);
    for ((row, col), &v) in raster.data.indexed_iter() {
        if !raster.is_nodata(v) && v >= threshold {
            out.set(row, col, 1.0);
        }
    }
    Ok(out)
}

/// 河网栅格转折线要素
///
/// 用流向面决定分支拓扑：从每个源头与每个汇合点向下游追踪，
/// 到下一个汇合点或河网终点为止，一段一条折线。输出折线做
/// 共线点简化。
pub fn stream_to_features(
    streams: &RasterGrid,
    direction: &RasterGrid,
) -> EngineResult<StreamNetwork> {
    let rows = streams.rows();
    let cols = streams.cols();
    if rows == 0 || cols == 0 {
        return Err(EngineError::empty("StreamToFeature"));
    }
    if rows != direction.rows() || cols != direction.cols() {
        return Err(EngineError::grid_mismatch(
            "StreamToFeature",
            format!(
                "河网 {}x{} vs 流向 {}x{}",
                rows,
                cols,
                direction.rows(),
                direction.cols()
            ),
        ));
    }

    let is_stream =
        |row: usize, col: usize| streams.get(row, col).map_or(false, |v| v > 0.0);

    let receiver = |row: usize, col: usize| -> Option<(usize, usize)> {
        let code = direction.get(row, col)? as u8;
        let (dr, dc) = d8_offset(code)?;
        let nr = row as isize + dr;
        let nc = col as isize + dc;
        if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
            return None;
        }
        Some((nr as usize, nc as usize))
    };

    // 河网内入度
    let mut indegree = Array2::from_elem((rows, cols), 0u32);
    for row in 0..rows {
        for col in 0..cols {
            if !is_stream(row, col) {
                continue;
            }
            if let Some((nr, nc)) = receiver(row, col) {
                if is_stream(nr, nc) {
                    indegree[[nr, nc]] += 1;
                }
            }
        }
    }

    // 段起点: 源头 (入度 0) 与汇合点 (入度 >= 2)
    let mut starts = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            if is_stream(row, col) && indegree[[row, col]] != 1 {
                starts.push((row, col));
            }
        }
    }

    let mut network = StreamNetwork::new();
    let max_steps = rows * cols;

    for &(start_row, start_col) in &starts {
        let mut points = vec![streams.transform.cell_center(start_row, start_col)];
        let (mut row, mut col) = (start_row, start_col);

        for _ in 0..max_steps {
            let Some((nr, nc)) = receiver(row, col) else {
                break;
            };
            if !is_stream(nr, nc) {
                break;
            }
            points.push(streams.transform.cell_center(nr, nc));
            // 汇合点结束本段 (它自身是下一段的起点)
            if indegree[[nr, nc]] >= 2 {
                break;
            }
            row = nr;
            col = nc;
        }

        if points.len() >= 2 {
            let grid_code = network.len() as i32 + 1;
            network.lines.push(Polyline {
                points: simplify(points),
                grid_code,
            });
        }
    }

    Ok(network)
}

/// 共线点简化: 去掉方向不变的中间顶点
fn simplify(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if points.len() <= 2 {
        return points;
    }
    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let (x0, y0) = out[out.len() - 1];
        let (x1, y1) = points[i];
        let (x2, y2) = points[i + 1];
        let cross = (x1 - x0) * (y2 - y0) - (y1 - y0) * (x2 - x0);
        if cross.abs() > 1e-9 {
            out.push(points[i]);
        }
    }
    out.push(points[points.len() - 1]);
    out
}
