//! 带表头的分隔文本表格，支持按列并集合并新行

use crate::error::{PersistError, PersistResult};
use crate::persistence::lock::write_atomic;
use serde_json::Value as JsonValue;
use std::path::Path;

/// 内存中的整张表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// 读取 CSV 文件；文件不存在时返回空表
    pub fn read(path: &Path) -> PersistResult<Self> {
        Self::read_with_delimiter(path, b',')
    }

    pub fn read_with_delimiter(path: &Path, delimiter: u8) -> PersistResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|e| PersistError::csv(path, e))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| PersistError::csv(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PersistError::csv(path, e))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// 整表写入（临时文件 + rename）
    pub fn write(&self, path: &Path) -> PersistResult<()> {
        self.write_with_delimiter(path, b',')
    }

    pub fn write_with_delimiter(&self, path: &Path, delimiter: u8) -> PersistResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        if !self.headers.is_empty() {
            writer
                .write_record(&self.headers)
                .map_err(|e| PersistError::csv(path, e))?;
        }
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| PersistError::csv(path, e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| PersistError::write(path, e.into_error()))?;
        write_atomic(path, &bytes)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// 某一列的所有值
    pub fn column<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a str> + 'a {
        let index = self.column_index(column);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|i| row.get(i)).map(String::as_str))
    }

    /// 按列并集追加一行
    ///
    /// 新列追加到表头末尾，旧行在新列上补空串；新行缺的列同样补空串
    pub fn merge_row(&mut self, cells: &[(String, String)]) {
        for (name, _) in cells {
            if self.column_index(name).is_none() {
                self.headers.push(name.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mut row = vec![String::new(); self.headers.len()];
        for (name, value) in cells {
            if let Some(i) = self.column_index(name) {
                row[i] = value.clone();
            }
        }
        self.rows.push(row);
    }
}

/// JSON 值在表格里的文本形式：字符串原样、Null 为空、其他用 JSON 文本
pub fn cell_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
