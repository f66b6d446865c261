//! 单个 (学生, 题目) 的作答详情

use crate::error::PayloadError;
use crate::models::key::{key_from_fields, parse_score};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 作答详情
///
/// 选中学生或题目发生变化时整体替换，属于瞬态数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerDetail {
    pub question_id: String,
    pub paper_id: String,
    /// 学生作答内容
    pub content: String,
    /// 详情里附带的已评分数（可能还没有）
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    /// 改分理由
    pub reason: Option<String>,
}

/// 规范化详情载荷
///
/// 详情接口的 data 偶尔直接是作答字符串，这里统一成对象处理
pub fn normalize_answer_detail(
    raw: &Value,
    question_id: &str,
    paper_id: &str,
) -> Result<AnswerDetail, PayloadError> {
    if let Some(content) = raw.as_str() {
        return Ok(AnswerDetail {
            question_id: question_id.to_string(),
            paper_id: paper_id.to_string(),
            content: content.to_string(),
            score: None,
            max_score: None,
            reason: None,
        });
    }

    if !raw.is_object() {
        return Err(PayloadError::NotAnObject {
            entity: "作答详情",
            found: crate::logger::truncate_text(&raw.to_string(), 40),
        });
    }

    let content =
        key_from_fields(raw, &["answer", "content", "student_answer"]).unwrap_or_default();
    let score = raw
        .get("score")
        .or_else(|| raw.get("grading_score"))
        .and_then(parse_score);
    let max_score = raw
        .get("max_score")
        .or_else(|| raw.get("maxScore"))
        .and_then(parse_score);
    let reason = key_from_fields(raw, &["reason", "alter_reason"]);

    Ok(AnswerDetail {
        question_id: question_id.to_string(),
        paper_id: paper_id.to_string(),
        content,
        score,
        max_score,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_detail_object() {
        let detail = normalize_answer_detail(
            &json!({"answer": "论点明确……", "score": "45", "max_score": 60}),
            "q1",
            "p1",
        )
        .expect("详情应当有效");
        assert_eq!(detail.content, "论点明确……");
        assert_eq!(detail.score, Some(45.0));
        assert_eq!(detail.max_score, Some(60.0));
    }

    #[test]
    fn test_normalize_detail_bare_string() {
        let detail = normalize_answer_detail(&json!("作答原文"), "q1", "p1").unwrap();
        assert_eq!(detail.content, "作答原文");
        assert_eq!(detail.score, None);
    }

    #[test]
    fn test_normalize_detail_rejects_array() {
        assert!(normalize_answer_detail(&json!([1, 2]), "q1", "p1").is_err());
    }
}
