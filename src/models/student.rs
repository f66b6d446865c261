//! 学生名单条目及其规范化

use crate::error::PayloadError;
use crate::models::key::{canonical_key, key_from_fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 学生名单条目
///
/// `paper_id` 是学生与分数之间的权威关联键；`id` 按
/// paper_id → id → 学号 的顺序回退解析，仅用于选中状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: String,
    pub paper_id: String,
    pub name: String,
    pub student_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// 规范化一条学生记录
///
/// # 返回
/// - `Ok(Some(_))`: 记录有效
/// - `Ok(None)`: 记录缺少试卷关联（id 或 paper_id 为空），按约定丢弃
/// - `Err(_)`: 形状无法识别
pub fn normalize_student(raw: &Value) -> Result<Option<Student>, PayloadError> {
    if !raw.is_object() {
        return Err(PayloadError::NotAnObject {
            entity: "学生",
            found: crate::logger::truncate_text(&raw.to_string(), 40),
        });
    }

    let paper_id = key_from_fields(raw, &["paper_id", "paperId"]);
    let student_no = key_from_fields(raw, &["student_no", "studentNo", "student_number"]);
    let id = paper_id
        .clone()
        .or_else(|| raw.get("id").and_then(canonical_key))
        .or_else(|| student_no.clone());

    // 没有试卷关联的学生无法对上任何分数，直接丢弃
    let (Some(id), Some(paper_id)) = (id, paper_id) else {
        return Ok(None);
    };

    let name = key_from_fields(raw, &["name", "student_name", "studentName"]).unwrap_or_default();
    let status = key_from_fields(raw, &["status"]);

    Ok(Some(Student {
        id,
        paper_id,
        name,
        student_no: student_no.unwrap_or_default(),
        status,
    }))
}
