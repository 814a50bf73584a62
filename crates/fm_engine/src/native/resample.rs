// crates/fm_engine/src/native/resample.rs

//! 重采样与要素栅格化

use crate::error::{EngineError, EngineResult};
use crate::traits::ResampleMethod;
use fm_raster::{FeatureSet, Geometry, GridSpec, RasterGrid};
use ndarray::Array2;
use rayon::prelude::*;

/// 重采样到目标网格
///
/// 逐目标像元反算源像元坐标取样。双线性用于连续数据,
/// 最邻近用于类别数据 (类别表原样携带)。
pub fn resample(
    raster: &RasterGrid,
    target: &GridSpec,
    method: ResampleMethod,
) -> EngineResult<RasterGrid> {
    if raster.rows() == 0 || raster.cols() == 0 {
        return Err(EngineError::empty("Resample"));
    }
    if target.rows == 0 || target.cols == 0 {
        return Err(EngineError::grid_mismatch("Resample", "目标网格为空"));
    }

    let nodata = target.nodata;
    let flat: Vec<f64> = (0..target.rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..target.cols).map(move |col| {
                let (x, y) = target.transform.cell_center(row, col);
                let (pr, pc) = raster.transform.geo_to_pixel(x, y);
                let sampled = match method {
                    ResampleMethod::Bilinear => {
                        // 像元中心位于像素坐标 +0.5 处; 边缘半像元按复制处理
                        let ir = (pr - 0.5).clamp(0.0, (raster.rows() - 1) as f64);
                        let ic = (pc - 0.5).clamp(0.0, (raster.cols() - 1) as f64);
                        raster.interpolate(ir, ic)
                    }
                    ResampleMethod::Nearest => {
                        if pr < 0.0 || pc < 0.0 {
                            None
                        } else {
                            raster.get(pr.floor() as usize, pc.floor() as usize)
                        }
                    }
                };
                sampled.unwrap_or(nodata)
            })
        })
        .collect();

    let data = Array2::from_shape_vec((target.rows, target.cols), flat)
        .map_err(|e| EngineError::failed("Resample", format!("数组重排失败: {e}")))?;

    let mut out = RasterGrid::from_data(data, target.transform, nodata);
    if method == ResampleMethod::Nearest {
        out.categories = raster.categories.clone();
    }
    Ok(out)
}

/// 按属性字段把面要素栅格化为类别栅格
///
/// 像元值 = 字段取值在类别表中的索引, 类别表按首次出现顺序建立。
/// 不落在任何面内的像元为 NoData。
pub fn rasterize_features(
    features: &FeatureSet,
    value_field: &str,
    grid: &GridSpec,
) -> EngineResult<RasterGrid> {
    if features.is_empty() {
        return Err(EngineError::empty("ConvertFeatureToRaster"));
    }
    if grid.rows == 0 || grid.cols == 0 {
        return Err(EngineError::grid_mismatch("ConvertFeatureToRaster", "目标网格为空"));
    }

    let categories = features
        .distinct_values(value_field)
        .map_err(|e| EngineError::failed("ConvertFeatureToRaster", e.to_string()))?;

    // (多边形, 类别索引)
    let mut polygons: Vec<(&[(f64, f64)], usize)> = Vec::new();
    for feature in &features.features {
        let Geometry::Polygon(ring) = &feature.geometry else {
            continue;
        };
        let value = feature
            .attribute(value_field)
            .map_err(|e| EngineError::failed("ConvertFeatureToRaster", e.to_string()))?;
        let index = categories
            .iter()
            .position(|c| c == value)
            .unwrap_or_default();
        polygons.push((ring.as_slice(), index));
    }
    if polygons.is_empty() {
        return Err(EngineError::failed(
            "ConvertFeatureToRaster",
            "要素集中没有面几何",
        ));
    }

    let nodata = grid.nodata;
    let flat: Vec<f64> = (0..grid.rows)
        .into_par_iter()
        .flat_map_iter(|row| {
            let polygons = &polygons;
            (0..grid.cols).map(move |col| {
                let (x, y) = grid.transform.cell_center(row, col);
                polygons
                    .iter()
                    .find(|(ring, _)| point_in_polygon(x, y, ring))
                    .map_or(nodata, |&(_, index)| index as f64)
            })
        })
        .collect();

    let data = Array2::from_shape_vec((grid.rows, grid.cols), flat)
        .map_err(|e| EngineError::failed("ConvertFeatureToRaster", format!("数组重排失败: {e}")))?;

    Ok(RasterGrid::from_data(data, grid.transform, nodata).with_categories(categories))
}

/// 射线法点在多边形内判定
fn point_in_polygon(x: f64, y: f64, ring: &[(f64, f64)]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use fm_raster::{Feature, GeoTransform};
    use std::collections::HashMap;

    #[test]
    fn test_bilinear_downscale() {
        // 源: 2x2, cell=60, 值为列号
        let mut src = RasterGrid::new(2, 2, GeoTransform::new(0.0, 120.0, 60.0), -9999.0);
        src.set(0, 0, 0.0);
        src.set(0, 1, 1.0);
        src.set(1, 0, 0.0);
        src.set(1, 1, 1.0);

        // 目标: 4x4, cell=30
        let target = GridSpec::new(4, 4, GeoTransform::new(0.0, 120.0, 30.0), -9999.0);
        let out = resample(&src, &target, ResampleMethod::Bilinear).unwrap();

        // 左列贴近 0, 右列贴近 1, 中间过渡
        assert!(out.get(1, 0).unwrap() < out.get(1, 1).unwrap());
        assert!(out.get(1, 2).unwrap() < out.get(1, 3).unwrap());
        // 源像元中心正上方的目标像元取值介于 0 与 1
        let mid = out.get(1, 1).unwrap();
        assert!(mid >= 0.0 && mid <= 1.0);
    }

    #[test]
    fn test_nearest_keeps_categories() {
        let mut src = RasterGrid::new(2, 2, GeoTransform::new(0.0, 120.0, 60.0), -9999.0);
        src.set(0, 0, 0.0);
        src.set(0, 1, 1.0);
        src.set(1, 0, 1.0);
        src.set(1, 1, 0.0);
        let src = src.with_categories(vec!["A".into(), "B".into()]);

        let target = GridSpec::new(4, 4, GeoTransform::new(0.0, 120.0, 30.0), -9999.0);
        let out = resample(&src, &target, ResampleMethod::Nearest).unwrap();

        assert_eq!(out.categories.as_deref(), Some(&["A".to_string(), "B".to_string()][..]));
        // 左上象限来自源 (0,0)
        assert_eq!(out.get(0, 0), Some(0.0));
        assert_eq!(out.get(0, 3), Some(1.0));
    }

    #[test]
    fn test_point_in_polygon() {
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert!(point_in_polygon(5.0, 5.0, &square));
        assert!(!point_in_polygon(15.0, 5.0, &square));
        assert!(!point_in_polygon(-1.0, -1.0, &square));
    }

    #[test]
    fn test_rasterize_two_units() {
        let mut attrs_a = HashMap::new();
        attrs_a.insert("UNIT_NAME".to_string(), "Basalt".to_string());
        let mut attrs_b = HashMap::new();
        attrs_b.insert("UNIT_NAME".to_string(), "Granite".to_string());

        // 左半 Basalt, 右半 Granite
        let features = FeatureSet {
            features: vec![
                Feature {
                    geometry: Geometry::Polygon(vec![
                        (0.0, 0.0),
                        (60.0, 0.0),
                        (60.0, 120.0),
                        (0.0, 120.0),
                    ]),
                    attributes: attrs_a,
                },
                Feature {
                    geometry: Geometry::Polygon(vec![
                        (60.0, 0.0),
                        (120.0, 0.0),
                        (120.0, 120.0),
                        (60.0, 120.0),
                    ]),
                    attributes: attrs_b,
                },
            ],
        };

        let grid = GridSpec::new(4, 4, GeoTransform::new(0.0, 120.0, 30.0), -9999.0);
        let out = rasterize_features(&features, "UNIT_NAME", &grid).unwrap();

        assert_eq!(
            out.categories.as_deref(),
            Some(&["Basalt".to_string(), "Granite".to_string()][..])
        );
        assert_eq!(out.get(0, 0), Some(0.0));
        assert_eq!(out.get(0, 3), Some(1.0));
        assert_eq!(out.get(3, 1), Some(0.0));
        assert_eq!(out.get(3, 2), Some(1.0));
    }

    #[test]
    fn test_rasterize_empty_features() {
        let features = FeatureSet::default();
        let grid = GridSpec::new(2, 2, GeoTransform::default(), -9999.0);
        assert!(matches!(
            rasterize_features(&features, "UNIT_NAME", &grid),
            Err(EngineError::EmptyInput { .. })
        ));
    }
}
