//! 表格的 JSON 镜像：对象数组，字段与表格列一致

use crate::error::{PersistError, PersistResult};
use crate::persistence::lock::write_atomic;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// 读取镜像；文件不存在或为空时返回空数组
pub fn read_mirror(path: &Path) -> PersistResult<Vec<Map<String, JsonValue>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| PersistError::read(path, e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: JsonValue = serde_json::from_str(&content).map_err(|e| PersistError::json(path, e))?;
    let JsonValue::Array(items) = value else {
        return Err(PersistError::MalformedMirror {
            path: path.display().to_string(),
        });
    };

    items
        .into_iter()
        .map(|item| match item {
            JsonValue::Object(map) => Ok(map),
            _ => Err(PersistError::MalformedMirror {
                path: path.display().to_string(),
            }),
        })
        .collect()
}

/// 追加对象并补齐字段并集，缺失字段填空串
pub fn merge_objects(
    existing: &mut Vec<Map<String, JsonValue>>,
    new_objects: Vec<Map<String, JsonValue>>,
) {
    existing.extend(new_objects);

    let mut all_keys: Vec<String> = Vec::new();
    for object in existing.iter() {
        for key in object.keys() {
            if !all_keys.contains(key) {
                all_keys.push(key.clone());
            }
        }
    }

    for object in existing.iter_mut() {
        for key in &all_keys {
            object
                .entry(key.clone())
                .or_insert_with(|| JsonValue::String(String::new()));
        }
    }
}

pub fn write_mirror(path: &Path, objects: &[Map<String, JsonValue>]) -> PersistResult<()> {
    let bytes = serde_json::to_vec_pretty(objects).map_err(|e| PersistError::json(path, e))?;
    write_atomic(path, &bytes)
}
