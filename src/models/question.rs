//! 题目条目及其规范化

use crate::error::PayloadError;
use crate::models::key::{key_from_fields, parse_score};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// 客观题（选择题）
    Choice,
    /// 主观题（作文、简答等，需要人工复核）
    Subjective,
}

impl QuestionKind {
    /// 后端只对选择题给出明确类型，其余一律按主观题处理
    pub fn from_raw(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("choice") {
            QuestionKind::Choice
        } else {
            QuestionKind::Subjective
        }
    }

    /// 打分接口要求回传的类型字面量
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::Subjective => "subjective",
        }
    }
}

/// 题目条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub title: String,
    /// 题目列表接口可能不带满分，之后由分数汇总载荷回填
    pub max_score: Option<f64>,
    pub answer: String,
    pub word_count: Option<u64>,
}

impl Question {
    /// 回填满分，已有值时不覆盖
    pub fn backfill_max_score(&mut self, max_score: f64) {
        if self.max_score.is_none() {
            self.max_score = Some(max_score);
        }
    }
}

/// 规范化一条题目记录
pub fn normalize_question(raw: &Value) -> Result<Question, PayloadError> {
    if !raw.is_object() {
        return Err(PayloadError::NotAnObject {
            entity: "题目",
            found: crate::logger::truncate_text(&raw.to_string(), 40),
        });
    }

    let id = key_from_fields(raw, &["id", "question_id", "questionId"]).ok_or(
        PayloadError::MissingField {
            entity: "题目",
            field: "id",
        },
    )?;

    let kind = raw
        .get("type")
        .or_else(|| raw.get("question_type"))
        .and_then(|v| v.as_str())
        .map(QuestionKind::from_raw)
        .unwrap_or(QuestionKind::Subjective);

    let title = key_from_fields(raw, &["title", "question_title", "stem"]).unwrap_or_default();
    let max_score = raw
        .get("max_score")
        .or_else(|| raw.get("maxScore"))
        .or_else(|| raw.get("full_score"))
        .and_then(parse_score);
    let answer = key_from_fields(raw, &["answer", "reference_answer"]).unwrap_or_default();
    let word_count = raw
        .get("word_count")
        .or_else(|| raw.get("wordCount"))
        .and_then(|v| v.as_u64());

    Ok(Question {
        id,
        kind,
        title,
        max_score,
        answer,
        word_count,
    })
}
