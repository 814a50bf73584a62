// crates/fm_schema/src/table.rs

//! 表格文本加载
//!
//! 模式表与权重表都是简单的分隔符文本，支持：
//! - 表头行
//! - 可配置分隔符
//! - 注释行跳过
//! - 带文件/行号上下文的解析错误

use fm_foundation::error::{FmError, FmResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 表格加载配置
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// 是否有表头行
    pub has_header: bool,
    /// 分隔符
    pub delimiter: char,
    /// 注释行前缀（以此开头的行将被跳过）
    pub comment_prefix: Option<char>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ',',
            comment_prefix: Some('#'),
        }
    }
}

impl TableConfig {
    /// 创建制表符分隔的配置
    pub fn tab_separated() -> Self {
        Self {
            delimiter: '\t',
            ..Default::default()
        }
    }
}

/// 一条记录：行号 + 字段
#[derive(Debug, Clone)]
pub struct Record {
    /// 源文件行号 (1 起)
    pub line: usize,
    /// 字段值 (已去首尾空白)
    pub fields: Vec<String>,
}

impl Record {
    /// 取字段，越界时报错
    pub fn field(&self, path: &Path, index: usize) -> FmResult<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| FmError::parse(path, self.line, format!("缺少第{}列", index + 1)))
    }

    /// 取数值字段
    pub fn number(&self, path: &Path, index: usize) -> FmResult<f64> {
        let raw = self.field(path, index)?;
        raw.parse().map_err(|_| {
            FmError::parse(path, self.line, format!("第{}列无法解析为数值: {raw}", index + 1))
        })
    }

    /// 取可选数值字段 (空串 = None)
    pub fn optional_number(&self, path: &Path, index: usize) -> FmResult<Option<f64>> {
        match self.fields.get(index).map(String::as_str) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                FmError::parse(path, self.line, format!("第{}列无法解析为数值: {raw}", index + 1))
            }),
        }
    }

    /// 取整数字段
    pub fn integer(&self, path: &Path, index: usize) -> FmResult<i32> {
        let raw = self.field(path, index)?;
        // 模式表里常见 "5.0" 风格的整数
        let as_float: f64 = raw.parse().map_err(|_| {
            FmError::parse(path, self.line, format!("第{}列无法解析为整数: {raw}", index + 1))
        })?;
        if as_float.fract().abs() > 1e-9 {
            return Err(FmError::parse(
                path,
                self.line,
                format!("第{}列不是整数: {raw}", index + 1),
            ));
        }
        Ok(as_float as i32)
    }
}

/// 读取表格文件
///
/// 返回数据记录 (表头行已剥离)。空行与注释行被跳过。
pub fn read_table(path: &Path, config: &TableConfig) -> FmResult<Vec<Record>> {
    if !path.exists() {
        return Err(FmError::file_not_found(path));
    }

    let file = File::open(path)
        .map_err(|e| FmError::io_with_source(format!("无法打开 {}", path.display()), e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut header_skipped = !config.has_header;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(prefix) = config.comment_prefix {
            if trimmed.starts_with(prefix) {
                continue;
            }
        }
        if !header_skipped {
            header_skipped = true;
            continue;
        }

        let fields: Vec<String> = trimmed
            .split(config.delimiter)
            .map(|s| s.trim().to_string())
            .collect();
        records.push(Record {
            line: idx + 1,
            fields,
        });
    }

    Ok(records)
}
