// crates/fm_raster/src/io/geotiff.rs

//! GeoTIFF 输入 (可选 gdal 特性)
//!
//! 启用 `gdal` 特性时通过系统 GDAL 库读取任意栅格格式，
//! 未启用时给出占位实现并报错。

use crate::grid::RasterGrid;
use fm_foundation::error::FmResult;
use std::path::Path;

/// 通过 GDAL 打开栅格文件的第一个波段
#[cfg(feature = "gdal")]
pub fn read_geotiff(path: impl AsRef<Path>) -> FmResult<RasterGrid> {
    use crate::transform::GeoTransform;
    use fm_foundation::error::FmError;
    use gdal::Dataset;
    use ndarray::Array2;

    let path = path.as_ref();
    if !path.exists() {
        return Err(FmError::file_not_found(path));
    }

    let dataset = Dataset::open(path)
        .map_err(|e| FmError::io(format!("GDAL 打开失败 {}: {}", path.display(), e)))?;
    let (width, height) = dataset.raster_size();
    let gt = dataset
        .geo_transform()
        .map_err(|e| FmError::io(format!("GDAL 读取地理变换失败: {}", e)))?;

    let band = dataset
        .rasterband(1)
        .map_err(|e| FmError::io(format!("GDAL 读取波段失败: {}", e)))?;
    let nodata = band.no_data_value().unwrap_or(-9999.0);

    let data: Vec<f64> = band
        .read_as::<f64>((0, 0), (width, height), (width, height), None)
        .map_err(|e| FmError::io(format!("GDAL 读取数据失败: {}", e)))?
        .data;

    let transform = GeoTransform::new(gt[0], gt[3], gt[1].abs());
    let array = Array2::from_shape_vec((height, width), data)
        .map_err(|e| FmError::internal(format!("GDAL 数组重排失败: {e}")))?;

    Ok(RasterGrid::from_data(array, transform, nodata))
}

/// 无 GDAL 支持时的占位实现
#[cfg(not(feature = "gdal"))]
pub fn read_geotiff(_path: impl AsRef<Path>) -> FmResult<RasterGrid> {
    Err(fm_foundation::error::FmError::not_implemented(
        "GeoTIFF 读取需要启用 gdal 特性",
    ))
}

#[cfg(all(test, not(feature = "gdal")))]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_errors() {
        assert!(read_geotiff("dem.tif").is_err());
    }
}
