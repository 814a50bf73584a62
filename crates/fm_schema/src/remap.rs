// crates/fm_schema/src/remap.rs

//! 重映射串序列化
//!
//! 栅格引擎的 `reclassify` 接收一个文本重映射串。本模块是该
//! 契约的唯一实现点，序列化与解析互逆。
//!
//! # 语法
//!
//! ```text
//! spec     := entry (';' entry)*
//! entry    := range | label
//! range    := NUMBER ' ' NUMBER ' ' INT        # [lower, upper) -> class
//! label    := token ' ' INT                     # label -> class
//! token    := BARE | '\'' 任意非引号字符 '\''    # 含空格的标签必须加引号
//! ```
//!
//! 含空格的标签加单引号后是一个原子记号；标签本身含单引号时
//! 无法安全序列化，报 [`SchemaError::RemapFormat`]。

use crate::error::{SchemaError, SchemaResult};
use crate::rules::{LabelRule, RangeRule};

/// 解析后的重映射条目
#[derive(Debug, Clone, PartialEq)]
pub enum RemapEntry {
    /// 区间条目
    Range {
        /// 下界 (含)
        lower: f64,
        /// 上界 (不含; 末位条目按闭区间处理)
        upper: f64,
        /// 输出等级
        class: i32,
    },
    /// 标签条目
    Label {
        /// 类别标签
        label: String,
        /// 输出等级
        class: i32,
    },
}

/// 序列化离散区间规则
pub fn serialize_ranges(rules: &[RangeRule]) -> String {
    rules
        .iter()
        .map(|r| format!("{} {} {}", r.lower, r.upper, r.class))
        .collect::<Vec<_>>()
        .join(";")
}

/// 序列化类别标签规则
///
/// 含空格的标签加单引号；标签本身含引号定界符时报错并指明标签。
pub fn serialize_labels(rules: &[LabelRule]) -> SchemaResult<String> {
    let mut parts = Vec::with_capacity(rules.len());
    for rule in rules {
        parts.push(format!("{} {}", quote_label(&rule.label)?, rule.class));
    }
    Ok(parts.join(";"))
}

fn quote_label(label: &str) -> SchemaResult<String> {
    if label.contains('\'') {
        return Err(SchemaError::RemapFormat {
            label: label.to_string(),
        });
    }
    if label.contains(' ') {
        Ok(format!("'{label}'"))
    } else {
        Ok(label.to_string())
    }
}

/// 解析重映射串
pub fn parse(spec: &str) -> SchemaResult<Vec<RemapEntry>> {
    let mut entries = Vec::new();
    for raw_entry in spec.split(';') {
        let raw_entry = raw_entry.trim();
        if raw_entry.is_empty() {
            continue;
        }
        entries.push(parse_entry(raw_entry)?);
    }
    Ok(entries)
}

fn parse_entry(raw: &str) -> SchemaResult<RemapEntry> {
    let tokens = tokenize(raw)?;
    match tokens.as_slice() {
        [a, b, c] => {
            // 三个记号且前两个是数值 => 区间条目
            if let (Ok(lower), Ok(upper)) = (a.text.parse::<f64>(), b.text.parse::<f64>()) {
                if !a.quoted && !b.quoted {
                    let class = parse_class(c)?;
                    return Ok(RemapEntry::Range {
                        lower,
                        upper,
                        class,
                    });
                }
            }
            Err(SchemaError::RemapSyntax {
                message: "区间条目的前两个记号必须是数值".to_string(),
                token: raw.to_string(),
            })
        }
        [label, class] => Ok(RemapEntry::Label {
            label: label.text.clone(),
            class: parse_class(class)?,
        }),
        _ => Err(SchemaError::RemapSyntax {
            message: format!("条目应含 2 或 3 个记号, 实际 {}", tokens.len()),
            token: raw.to_string(),
        }),
    }
}

fn parse_class(token: &Token) -> SchemaResult<i32> {
    token.text.parse().map_err(|_| SchemaError::RemapSyntax {
        message: "输出等级必须是整数".to_string(),
        token: token.text.clone(),
    })
}

struct Token {
    text: String,
    quoted: bool,
}

/// 按空白切分，单引号内的空白不切分
fn tokenize(raw: &str) -> SchemaResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut was_quoted = false;

    for ch in raw.chars() {
        match ch {
            '\'' => {
                if in_quote {
                    in_quote = false;
                    was_quoted = true;
                } else {
                    in_quote = true;
                }
            }
            c if c.is_whitespace() && !in_quote => {
                if !current.is_empty() || was_quoted {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted: was_quoted,
                    });
                    was_quoted = false;
                }
            }
            c => current.push(c),
        }
    }

    if in_quote {
        return Err(SchemaError::RemapSyntax {
            message: "引号未闭合".to_string(),
            token: raw.to_string(),
        });
    }
    if !current.is_empty() || was_quoted {
        tokens.push(Token {
            text: current,
            quoted: was_quoted,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_ranges() {
        let rules = vec![
            RangeRule {
                lower: 0.0,
                upper: 1000.0,
                class: 5,
            },
            RangeRule {
                lower: 1000.0,
                upper: 2000.0,
                class: 3,
            },
        ];
        assert_eq!(serialize_ranges(&rules), "0 1000 5;1000 2000 3");
    }

    #[test]
    fn test_range_roundtrip() {
        let rules = vec![
            RangeRule {
                lower: -5.5,
                upper: 0.0,
                class: 1,
            },
            RangeRule {
                lower: 0.0,
                upper: 12.25,
                class: 4,
            },
        ];
        let spec = serialize_ranges(&rules);
        let parsed = parse(&spec).unwrap();
        assert_eq!(
            parsed,
            vec![
                RemapEntry::Range {
                    lower: -5.5,
                    upper: 0.0,
                    class: 1
                },
                RemapEntry::Range {
                    lower: 0.0,
                    upper: 12.25,
                    class: 4
                },
            ]
        );
    }

    #[test]
    fn test_label_roundtrip_with_spaces() {
        // 含空格的标签引号包裹后解析必须还原原标签
        let rules = vec![
            LabelRule {
                label: "Early Proterozoic granite".to_string(),
                class: 1,
            },
            LabelRule {
                label: "Basalt".to_string(),
                class: 2,
            },
        ];
        let spec = serialize_labels(&rules).unwrap();
        assert_eq!(spec, "'Early Proterozoic granite' 1;Basalt 2");

        let parsed = parse(&spec).unwrap();
        assert_eq!(
            parsed,
            vec![
                RemapEntry::Label {
                    label: "Early Proterozoic granite".to_string(),
                    class: 1
                },
                RemapEntry::Label {
                    label: "Basalt".to_string(),
                    class: 2
                },
            ]
        );
    }

    #[test]
    fn test_label_with_quote_rejected() {
        let rules = vec![LabelRule {
            label: "O'Brien formation".to_string(),
            class: 3,
        }];
        let err = serialize_labels(&rules).unwrap_err();
        match err {
            SchemaError::RemapFormat { label } => assert_eq!(label, "O'Brien formation"),
            other => panic!("期望 RemapFormat, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_numeric_label_stays_label() {
        // 两记号条目永远是标签条目, 即使标签看起来像数值
        let parsed = parse("42 3").unwrap();
        assert_eq!(
            parsed,
            vec![RemapEntry::Label {
                label: "42".to_string(),
                class: 3
            }]
        );
    }

    #[test]
    fn test_unclosed_quote() {
        assert!(matches!(
            parse("'Basalt 2"),
            Err(SchemaError::RemapSyntax { .. })
        ));
    }

    #[test]
    fn test_bad_entry_length() {
        assert!(parse("1 2 3 4").is_err());
        assert!(parse("lonely").is_err());
    }
}
