// crates/fm_analysis/src/layers.rs

//! 层与产物命名
//!
//! 缓存产物名与模式表层名是两套命名: 前者是文件名, 后者是
//! 分类/权重表的键。

/// 预处理缓存目录名
pub const PREPROCESSING_CACHE: &str = "LayerPreprocessing";

/// 填洼后的高程面
pub const FILLED_DEM: &str = "Filled_DEM";
/// 坡度
pub const SLOPE: &str = "Slope";
/// 排水密度
pub const DRAINAGE_DENSITY: &str = "Drainage_Density";
/// 重采样后的降水
pub const PRECIPITATION: &str = "Precipitation";
/// 岩性栅格
pub const LITHOLOGY: &str = "Lithology";

/// 流向 (中间产物)
pub const FLOW_DIRECTION: &str = "Flow_Direction";
/// 汇流累积 (中间产物)
pub const FLOW_ACCUMULATION: &str = "Flow_Accumulation";
/// 河网栅格 (中间产物)
pub const STREAMS_RASTER: &str = "Streams_Raster";
/// 河网要素 (中间产物)
pub const STREAM_FEATURES: &str = "Stream_Features";

/// 缓存命中判定所需的派生层 (不含中间产物)
pub const REQUIRED_LAYERS: [&str; 5] = [
    FILLED_DEM,
    SLOPE,
    DRAINAGE_DENSITY,
    PRECIPITATION,
    LITHOLOGY,
];

/// 模式表层名
pub mod schema {
    /// 高程
    pub const DEM: &str = "DEM";
    /// 坡度
    pub const SLOPE: &str = "Slope";
    /// 线性构造密度
    pub const LINEAMENTS: &str = "Lineaments";
    /// 排水密度
    pub const DRAINAGE: &str = "Drainage";
    /// 降水
    pub const PRECIP: &str = "Precip";
    /// 植被指数
    pub const NDVI: &str = "NDVI";
    /// 岩性
    pub const LITHOLOGY: &str = "Lithology";
    /// 土壤
    pub const SOILS: &str = "Soils";
    /// 土地覆盖
    pub const LULC: &str = "LULC";
}

/// 分类产物名
pub fn classified_name(schema_layer: &str) -> String {
    match schema_layer {
        schema::LINEAMENTS => "Classified_LineamentDensity".to_string(),
        schema::DRAINAGE => "Classified_DrainageDensity".to_string(),
        schema::PRECIP => "Classified_Precipitation".to_string(),
        other => format!("Classified_{other}"),
    }
}
