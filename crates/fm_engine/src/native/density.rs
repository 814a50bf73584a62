// crates/fm_engine/src/native/density.rs

//! 线密度
//!
//! 以固定搜索半径统计每个像元邻域内的河道长度, 输出 km/km²。

use crate::error::{EngineError, EngineResult};
use fm_raster::{GridSpec, RasterGrid, StreamNetwork};
use ndarray::Array2;
use rayon::prelude::*;

/// 线密度 (km / km²)
///
/// 先把折线长度按采样点归入像元, 再对每个像元求半径内长度和
/// 除以圆面积。半径单位米。
pub fn line_density(
    network: &StreamNetwork,
    grid: &GridSpec,
    search_radius: f64,
) -> EngineResult<RasterGrid> {
    if grid.rows == 0 || grid.cols == 0 {
        return Err(EngineError::empty("LineDensity"));
    }
    if search_radius <= 0.0 {
        return Err(EngineError::failed(
            "LineDensity",
            format!("搜索半径必须为正: {search_radius}"),
        ));
    }

    let rows = grid.rows;
    let cols = grid.cols;
    let cell = grid.cell_size();

    // 1. 折线长度按像元归集
    let mut length_in_cell = Array2::from_elem((rows, cols), 0.0f64);
    let step = cell / 4.0;
    for line in &network.lines {
        for segment in line.points.windows(2) {
            let (x0, y0) = segment[0];
            let (x1, y1) = segment[1];
            let length = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();
            if length <= 0.0 {
                continue;
            }
            let samples = (length / step).ceil().max(1.0) as usize;
            let piece = length / samples as f64;
            for k in 0..samples {
                let t = (k as f64 + 0.5) / samples as f64;
                let x = x0 + t * (x1 - x0);
                let y = y0 + t * (y1 - y0);
                let (pr, pc) = grid.transform.geo_to_pixel(x, y);
                if pr < 0.0 || pc < 0.0 {
                    continue;
                }
                let (pr, pc) = (pr.floor() as usize, pc.floor() as usize);
                if pr < rows && pc < cols {
                    length_in_cell[[pr, pc]] += piece;
                }
            }
        }
    }

    // 2. 圆形核偏移
    let reach = (search_radius / cell).ceil() as isize;
    let mut kernel: Vec<(isize, isize)> = Vec::new();
    for dr in -reach..=reach {
        for dc in -reach..=reach {
            let dist = ((dr * dr + dc * dc) as f64).sqrt() * cell;
            if dist <= search_radius {
                kernel.push((dr, dc));
            }
        }
    }

    // 3. 核求和 -> km/km²
    let area_km2 = std::f64::consts::PI * search_radius * search_radius / 1.0e6;
    let flat: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            let length_in_cell = &length_in_cell;
            let kernel = &kernel;
            (0..cols).map(move |col| {
                let mut total_m = 0.0;
                for &(dr, dc) in kernel {
                    let nr = row as isize + dr;
                    let nc = col as isize + dc;
                    if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                        continue;
                    }
                    total_m += length_in_cell[[nr as usize, nc as usize]];
                }
                (total_m / 1000.0) / area_km2
            })
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), flat)
        .map_err(|e| EngineError::failed("LineDensity", format!("数组重排失败: {e}")))?;

    Ok(RasterGrid::from_data(data, grid.transform, grid.nodata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_raster::{GeoTransform, Polyline};

    fn spec(rows: usize, cols: usize, cell: f64) -> GridSpec {
        GridSpec::new(
            rows,
            cols,
            GeoTransform::new(0.0, rows as f64 * cell, cell),
            -9999.0,
        )
    }

    #[test]
    fn test_empty_network_zero_density() {
        let network = StreamNetwork::new();
        let d = line_density(&network, &spec(4, 4, 30.0), 1000.0).unwrap();
        for &v in d.data.iter() {
            assert!(v.abs() < 1e-12);
        }
    }

    #[test]
    fn test_total_length_conserved() {
        // 归集到像元的总长度 = 折线总长度
        let network = StreamNetwork {
            lines: vec![Polyline {
                points: vec![(15.0, 45.0), (105.0, 45.0)],
                grid_code: 1,
            }],
        };
        let grid = spec(4, 4, 30.0);
        // 半径覆盖全域时, 每个像元看到全部长度
        let radius = 200.0;
        let d = line_density(&network, &grid, radius).unwrap();
        let area_km2 = std::f64::consts::PI * radius * radius / 1.0e6;
        let expected = (90.0 / 1000.0) / area_km2;
        for &v in d.data.iter() {
            assert!((v - expected).abs() < expected * 1e-9);
        }
    }

    #[test]
    fn test_density_peaks_near_line() {
        let cell = 30.0;
        let grid = spec(9, 9, cell);
        // 中行的水平河道
        let network = StreamNetwork {
            lines: vec![Polyline {
                points: vec![(0.0, 135.0), (270.0, 135.0)],
                grid_code: 1,
            }],
        };
        let d = line_density(&network, &grid, 60.0).unwrap();
        // 河道上的像元密度高于远离河道的像元
        let near = d.get(4, 4).unwrap();
        let far = d.get(0, 4).unwrap();
        assert!(near > far);
    }

    #[test]
    fn test_invalid_radius() {
        let network = StreamNetwork::new();
        assert!(line_density(&network, &spec(2, 2, 30.0), 0.0).is_err());
    }
}
