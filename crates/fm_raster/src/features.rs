// crates/fm_raster/src/features.rs

//! 矢量要素
//!
//! 河网折线 ([`StreamNetwork`]) 与带属性的面要素集 ([`FeatureSet`])。
//! 要素一经写出即视为不可变，与栅格层遵循相同的所有权规则。

use fm_foundation::error::{FmError, FmResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一条河道折线
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    /// 顶点序列 (地理坐标)
    pub points: Vec<(f64, f64)>,
    /// 河段编号
    pub grid_code: i32,
}

impl Polyline {
    /// 折线长度 (米)
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| {
                let (x0, y0) = w[0];
                let (x1, y1) = w[1];
                ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
            })
            .sum()
    }
}

/// 河网要素集
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamNetwork {
    /// 河段折线
    pub lines: Vec<Polyline>,
}

impl StreamNetwork {
    /// 空河网
    pub fn new() -> Self {
        Self::default()
    }

    /// 河段数
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 总长度 (米)
    pub fn total_length(&self) -> f64 {
        self.lines.iter().map(Polyline::length).sum()
    }
}

/// 几何类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Geometry {
    /// 闭合多边形外环 (顶点不重复首尾)
    Polygon(Vec<(f64, f64)>),
    /// 折线
    Line(Vec<(f64, f64)>),
}

/// 带属性的矢量要素
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// 几何
    pub geometry: Geometry,
    /// 属性字段
    pub attributes: HashMap<String, String>,
}

impl Feature {
    /// 取属性值，缺失时报错
    pub fn attribute(&self, field: &str) -> FmResult<&str> {
        self.attributes
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| FmError::missing_config(format!("要素属性字段 {field}")))
    }
}

/// 矢量要素集
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    /// 要素列表
    pub features: Vec<Feature>,
}

impl FeatureSet {
    /// 要素数
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 收集指定字段的去重取值，保持首次出现顺序
    pub fn distinct_values(&self, field: &str) -> FmResult<Vec<String>> {
        let mut seen = Vec::new();
        for feature in &self.features {
            let value = feature.attribute(field)?;
            if !seen.iter().any(|s| s == value) {
                seen.push(value.to_string());
            }
        }
        Ok(seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_length() {
        let line = Polyline {
            points: vec![(0.0, 0.0), (3.0, 4.0)],
            grid_code: 1,
        };
        assert!((line.length() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_network_total_length() {
        let net = StreamNetwork {
            lines: vec![
                Polyline {
                    points: vec![(0.0, 0.0), (1.0, 0.0)],
                    grid_code: 1,
                },
                Polyline {
                    points: vec![(0.0, 0.0), (0.0, 2.0)],
                    grid_code: 2,
                },
            ],
        };
        assert!((net.total_length() - 3.0).abs() < 1e-10);
        assert_eq!(net.len(), 2);
    }

    #[test]
    fn test_distinct_values() {
        let mut attrs_a = HashMap::new();
        attrs_a.insert("UNIT_NAME".to_string(), "Basalt".to_string());
        let mut attrs_b = HashMap::new();
        attrs_b.insert("UNIT_NAME".to_string(), "Granite".to_string());
        let mut attrs_c = HashMap::new();
        attrs_c.insert("UNIT_NAME".to_string(), "Basalt".to_string());

        let fs = FeatureSet {
            features: vec![
                Feature {
                    geometry: Geometry::Polygon(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
                    attributes: attrs_a,
                },
                Feature {
                    geometry: Geometry::Polygon(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]),
                    attributes: attrs_b,
                },
                Feature {
                    geometry: Geometry::Polygon(vec![(1.0, 1.0), (2.0, 1.0), (2.0, 2.0)]),
                    attributes: attrs_c,
                },
            ],
        };

        let values = fs.distinct_values("UNIT_NAME").unwrap();
        assert_eq!(values, vec!["Basalt".to_string(), "Granite".to_string()]);
    }

    #[test]
    fn test_missing_attribute() {
        let feature = Feature {
            geometry: Geometry::Line(vec![(0.0, 0.0), (1.0, 1.0)]),
            attributes: HashMap::new(),
        };
        assert!(feature.attribute("UNIT_NAME").is_err());
    }
}
