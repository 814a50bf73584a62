// crates/fm_engine/src/native/reclass.rs

//! 重分类与函数重缩放

use crate::error::{EngineError, EngineResult};
use crate::traits::MissingPolicy;
use fm_raster::RasterGrid;
use fm_schema::remap::{self, RemapEntry};
use fm_schema::TransferFunction;

/// 按重映射串重分类
///
/// 区间条目作用于数值栅格: 值落在 [lower, upper) 映射到等级,
/// 末位区间含上界。标签条目作用于类别栅格: 像元的类别标签精确
/// 匹配时映射。未命中按 `missing` 策略处理。
pub fn reclassify(
    raster: &RasterGrid,
    remap_spec: &str,
    missing: MissingPolicy,
) -> EngineResult<RasterGrid> {
    if raster.rows() == 0 || raster.cols() == 0 {
        return Err(EngineError::empty("Reclassify"));
    }

    let entries = remap::parse(remap_spec)?;
    if entries.is_empty() {
        return Err(EngineError::failed("Reclassify", "重映射串为空"));
    }

    let all_ranges = entries
        .iter()
        .all(|e| matches!(e, RemapEntry::Range { .. }));
    let all_labels = entries
        .iter()
        .all(|e| matches!(e, RemapEntry::Label { .. }));
    if !all_ranges && !all_labels {
        return Err(EngineError::failed(
            "Reclassify",
            "重映射串混用区间与标签条目",
        ));
    }

    let mut out = RasterGrid::new(raster.rows(), raster.cols(), raster.transform, raster.nodata);

    if all_ranges {
        // 末位区间按上界排序确定
        let mut top = f64::NEG_INFINITY;
        for entry in &entries {
            if let RemapEntry::Range { upper, .. } = entry {
                top = top.max(*upper);
            }
        }

        for ((row, col), &v) in raster.data.indexed_iter() {
            if raster.is_nodata(v) {
                continue;
            }
            let mut mapped = None;
            for entry in &entries {
                let RemapEntry::Range {
                    lower,
                    upper,
                    class,
                } = entry
                else {
                    unreachable!()
                };
                let hit = v >= *lower
                    && (v < *upper || ((*upper - top).abs() < 1e-12 && v <= *upper));
                if hit {
                    mapped = Some(*class as f64);
                    break;
                }
            }
            apply(&mut out, row, col, v, mapped, missing);
        }
    } else {
        let categories = raster.categories.as_ref().ok_or_else(|| {
            EngineError::failed("Reclassify", "标签重映射要求类别栅格 (缺少类别表)")
        })?;

        for ((row, col), &v) in raster.data.indexed_iter() {
            if raster.is_nodata(v) {
                continue;
            }
            let label = categories.get(v as usize).map(String::as_str);
            let mapped = label.and_then(|lbl| {
                entries.iter().find_map(|entry| {
                    let RemapEntry::Label { label: rule, class } = entry else {
                        unreachable!()
                    };
                    (rule == lbl).then_some(*class as f64)
                })
            });
            apply(&mut out, row, col, v, mapped, missing);
        }
    }

    Ok(out)
}

#[inline]
fn apply(
    out: &mut RasterGrid,
    row: usize,
    col: usize,
    original: f64,
    mapped: Option<f64>,
    missing: MissingPolicy,
) {
    match (mapped, missing) {
        (Some(class), _) => out.set(row, col, class),
        (None, MissingPolicy::Keep) => out.set(row, col, original),
        (None, MissingPolicy::Nodata) => {}
    }
}

/// 按传递函数重缩放
///
/// 有效像元逐个通过函数求值, NoData 原样保留。
pub fn rescale_by_function(
    raster: &RasterGrid,
    function: &TransferFunction,
) -> EngineResult<RasterGrid> {
    if raster.rows() == 0 || raster.cols() == 0 {
        return Err(EngineError::empty("RescaleByFunction"));
    }

    let mut out = RasterGrid::new(raster.rows(), raster.cols(), raster.transform, raster.nodata);
    for ((row, col), &v) in raster.data.indexed_iter() {
        if raster.is_nodata(v) {
            continue;
        }
        out.set(row, col, function.evaluate(v));
    }
    Ok(out)
}
