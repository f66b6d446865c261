//! 分数表
//!
//! 题目ID → 试卷键 → 已评分数。由"题目 → 每生评分条目"的嵌套载荷
//! 摊平得到；所有键在入库边界统一为规范化字符串，查询不再需要同时
//! 试原始形式和字符串形式。

use crate::error::PayloadError;
use crate::models::key::{canonical_key, key_from_fields, parse_score};
use crate::models::student::Student;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// 分数表
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入分数，覆盖已有条目（提交成功后的乐观更新走这里）
    pub fn insert(&mut self, question_id: &str, paper_key: &str, score: f64) {
        self.scores
            .entry(question_id.to_string())
            .or_default()
            .insert(paper_key.to_string(), score);
    }

    /// 回填分数，已有条目时不覆盖（详情载荷的本地回填走这里）
    ///
    /// # 返回
    /// 是否真正写入
    pub fn backfill(&mut self, question_id: &str, paper_key: &str, score: f64) -> bool {
        let entry = self.scores.entry(question_id.to_string()).or_default();
        if entry.contains_key(paper_key) {
            false
        } else {
            entry.insert(paper_key.to_string(), score);
            true
        }
    }

    pub fn get(&self, question_id: &str, paper_key: &str) -> Option<f64> {
        self.scores.get(question_id)?.get(paper_key).copied()
    }

    pub fn contains(&self, question_id: &str, paper_key: &str) -> bool {
        self.get(question_id, paper_key).is_some()
    }

    /// 全表条目数（用于日志）
    pub fn len(&self) -> usize {
        self.scores.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}

/// 分数汇总载荷摊平后的结果
#[derive(Debug, Clone, Default)]
pub struct ScoreSummary {
    pub map: ScoreMap,
    /// 题目ID → 满分，用于回填题目列表里缺失的满分
    pub max_scores: HashMap<String, f64>,
    /// 从按试卷键组织的评分条目里合成的权威名单
    pub roster: Vec<Student>,
}

/// 摊平"题目 → 每生评分条目"的嵌套载荷
///
/// 规则：
/// - 分数只有解析成有限数才入表
/// - 满分每题只取一次
/// - 带试卷键的条目按首次出现的顺序合成权威名单（去重）
pub fn flatten_question_scores(payload: &Value) -> Result<ScoreSummary, PayloadError> {
    let items = payload.as_array().ok_or(PayloadError::NotAnArray {
        entity: "分数汇总",
    })?;

    let mut summary = ScoreSummary::default();
    let mut seen_papers: HashSet<String> = HashSet::new();

    for item in items {
        let Some(question_id) = key_from_fields(item, &["question_id", "questionId", "id"]) else {
            // 没有题目ID的汇总项无从归属，跳过
            continue;
        };

        if let Some(max_score) = item
            .get("max_score")
            .or_else(|| item.get("maxScore"))
            .or_else(|| item.get("full_score"))
            .and_then(parse_score)
        {
            summary.max_scores.entry(question_id.clone()).or_insert(max_score);
        }

        let entries = item
            .get("student_list")
            .or_else(|| item.get("students"))
            .or_else(|| item.get("grading_list"))
            .or_else(|| item.get("list"))
            .and_then(|v| v.as_array());

        let Some(entries) = entries else { continue };

        for entry in entries {
            let Some(paper_key) = key_from_fields(entry, &["paper_id", "paperId"]) else {
                continue;
            };

            if let Some(score) = entry
                .get("score")
                .or_else(|| entry.get("grading_score"))
                .and_then(parse_score)
            {
                summary.map.insert(&question_id, &paper_key, score);
            }

            // 权威名单以试卷键为准，学生ID直接用试卷键
            if seen_papers.insert(paper_key.clone()) {
                summary.roster.push(Student {
                    id: paper_key.clone(),
                    paper_id: paper_key.clone(),
                    name: key_from_fields(entry, &["name", "student_name"]).unwrap_or_default(),
                    student_no: key_from_fields(entry, &["student_no", "studentNo"])
                        .unwrap_or_default(),
                    status: entry.get("status").and_then(canonical_key),
                });
            }
        }
    }

    Ok(summary)
}
