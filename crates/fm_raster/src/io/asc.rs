// crates/fm_raster/src/io/asc.rs

//! ESRI ASCII 栅格 (.asc) 读写
//!
//! 工作区缓存的默认持久化格式。GeoTIFF 输入由可选的 gdal
//! 特性提供 (见 [`super::geotiff`])。

use crate::grid::RasterGrid;
use crate::transform::GeoTransform;
use fm_foundation::error::{FmError, FmResult};
use ndarray::Array2;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// 写出 .asc 栅格
pub fn write_asc(path: &Path, grid: &RasterGrid) -> FmResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)
        .map_err(|e| FmError::io_with_source(format!("无法创建 {}", path.display()), e))?;
    let mut writer = BufWriter::new(file);

    let rows = grid.rows();
    let cols = grid.cols();
    let (min_x, min_y, _, _) = grid.transform.extent(rows, cols);

    writeln!(writer, "ncols {}", cols)?;
    writeln!(writer, "nrows {}", rows)?;
    writeln!(writer, "xllcorner {}", min_x)?;
    writeln!(writer, "yllcorner {}", min_y)?;
    writeln!(writer, "cellsize {}", grid.transform.cell_size)?;
    writeln!(writer, "NODATA_value {}", grid.nodata)?;

    for row in 0..rows {
        let mut line = String::with_capacity(cols * 12);
        for col in 0..cols {
            if col > 0 {
                line.push(' ');
            }
            let v = grid.data[[row, col]];
            if v.is_nan() {
                line.push_str(&grid.nodata.to_string());
            } else {
                line.push_str(&v.to_string());
            }
        }
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

/// 读入 .asc 栅格
pub fn read_asc(path: &Path) -> FmResult<RasterGrid> {
    if !path.exists() {
        return Err(FmError::file_not_found(path));
    }

    let file = File::open(path)
        .map_err(|e| FmError::io_with_source(format!("无法打开 {}", path.display()), e))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().enumerate();

    let mut cols: Option<usize> = None;
    let mut rows: Option<usize> = None;
    let mut xll = 0.0;
    let mut yll = 0.0;
    let mut cell_size = 1.0;
    let mut nodata = -9999.0;
    let mut data: Vec<f64> = Vec::new();

    // 表头: 6 个键值对
    let mut header_remaining = 6;
    for (idx, line) in &mut lines {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if header_remaining > 0 {
            let mut parts = trimmed.split_whitespace();
            let key = parts
                .next()
                .ok_or_else(|| FmError::parse(path, idx + 1, "缺少表头键"))?
                .to_ascii_lowercase();
            let value = parts
                .next()
                .ok_or_else(|| FmError::parse(path, idx + 1, format!("表头 {key} 缺少值")))?;
            let num: f64 = value
                .parse()
                .map_err(|_| FmError::parse(path, idx + 1, format!("无法解析表头值: {value}")))?;

            match key.as_str() {
                "ncols" => cols = Some(num as usize),
                "nrows" => rows = Some(num as usize),
                "xllcorner" => xll = num,
                "yllcorner" => yll = num,
                "cellsize" => cell_size = num,
                "nodata_value" => nodata = num,
                other => {
                    return Err(FmError::parse(path, idx + 1, format!("未知表头键: {other}")));
                }
            }
            header_remaining -= 1;
            continue;
        }

        for token in trimmed.split_whitespace() {
            let v: f64 = token
                .parse()
                .map_err(|_| FmError::parse(path, idx + 1, format!("无法解析像元值: {token}")))?;
            data.push(v);
        }
    }

    let cols = cols.ok_or_else(|| FmError::parse(path, 1, "缺少 ncols"))?;
    let rows = rows.ok_or_else(|| FmError::parse(path, 2, "缺少 nrows"))?;
    FmError::check_size("asc 像元数", rows * cols, data.len())?;

    let transform = GeoTransform::new(xll, yll + rows as f64 * cell_size, cell_size);
    let array = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| FmError::internal(format!("asc 数组重排失败: {e}")))?;

    Ok(RasterGrid::from_data(array, transform, nodata))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asc_roundtrip() {
        let dir = std::env::temp_dir().join("fm_raster_asc_test");
        let path = dir.join("grid.asc");

        let mut grid = RasterGrid::new(3, 4, GeoTransform::new(100.0, 200.0, 30.0), -9999.0);
        for row in 0..3 {
            for col in 0..4 {
                grid.set(row, col, (row * 4 + col) as f64);
            }
        }
        grid.set(1, 2, -9999.0);

        write_asc(&path, &grid).unwrap();
        let loaded = read_asc(&path).unwrap();

        assert_eq!(loaded.rows(), 3);
        assert_eq!(loaded.cols(), 4);
        assert!(loaded.transform.approx_eq(&grid.transform));
        assert_eq!(loaded.get(0, 3), Some(3.0));
        assert_eq!(loaded.get(1, 2), None);
        assert!((loaded.nodata - -9999.0).abs() < 1e-10);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_asc(Path::new("/nonexistent/grid.asc")).unwrap_err();
        assert!(matches!(err, FmError::FileNotFound { .. }));
    }
}
