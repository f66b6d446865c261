//! 复核状态 - 纯内存对账
//!
//! 持有名单、题目、分数表、选中状态四块数据，负责三路独立加载结果
//! 的合并与派生查询。本层不持有任何资源，不发请求，方便单测。

use crate::models::{AnswerDetail, Question, ScoreMap, ScoreSummary, Student};
use std::collections::BTreeSet;

/// 当前选中题目的评分进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionStats {
    pub total: usize,
    pub graded: usize,
    pub ungraded: usize,
}

/// 复核状态
#[derive(Debug, Default)]
pub struct ReviewState {
    students: Vec<Student>,
    questions: Vec<Question>,
    score_map: ScoreMap,
    current_student_id: Option<String>,
    current_question_id: Option<String>,
    answer_detail: Option<AnswerDetail>,
}

impl ReviewState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 只读访问 ==========

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn score_map(&self) -> &ScoreMap {
        &self.score_map
    }

    pub fn answer_detail(&self) -> Option<&AnswerDetail> {
        self.answer_detail.as_ref()
    }

    pub fn current_student(&self) -> Option<&Student> {
        let id = self.current_student_id.as_deref()?;
        self.students.iter().find(|s| s.id == id)
    }

    pub fn current_question(&self) -> Option<&Question> {
        let id = self.current_question_id.as_deref()?;
        self.questions.iter().find(|q| q.id == id)
    }

    /// 当前选中 (试卷键, 题目ID)，详情请求的定位参数
    pub fn current_pair_ids(&self) -> Option<(String, String)> {
        let student = self.current_student()?;
        let question = self.current_question()?;
        Some((student.paper_id.clone(), question.id.clone()))
    }

    // ========== 三路加载结果的落地 ==========

    /// 落地学生名单；之前选中的学生不在新名单里时选第一个
    pub fn apply_roster(&mut self, students: Vec<Student>) {
        self.students = students;
        self.fix_student_selection();
    }

    pub fn clear_roster(&mut self) {
        self.students.clear();
        self.current_student_id = None;
    }

    /// 落地题目列表；选中状态同名单规则
    pub fn apply_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.fix_question_selection();
    }

    pub fn clear_questions(&mut self) {
        self.questions.clear();
        self.current_question_id = None;
    }

    /// 落地分数汇总：替换分数表、回填满分、名单对账
    ///
    /// 名单对账是条件合并而不是无条件覆盖：评分载荷按试卷键合成的
    /// 权威名单，只有与现有名单的试卷键集合不一致时才替换——名单
    /// 请求先到后到都能收敛到同一结果，集合一致时不产生选中抖动。
    ///
    /// # 返回
    /// 名单是否被替换
    pub fn apply_score_summary(&mut self, summary: ScoreSummary) -> bool {
        self.score_map = summary.map;

        for question in &mut self.questions {
            if let Some(max) = summary.max_scores.get(&question.id) {
                question.backfill_max_score(*max);
            }
        }

        let authoritative: BTreeSet<&str> =
            summary.roster.iter().map(|s| s.paper_id.as_str()).collect();
        if authoritative.is_empty() {
            // 评分载荷里一个试卷键都没有，不足以当权威名单
            return false;
        }
        let held: BTreeSet<&str> = self.students.iter().map(|s| s.paper_id.as_str()).collect();
        if held == authoritative {
            return false;
        }

        // 替换名单，按试卷键尽量保住当前选择
        let current_paper = self.current_student().map(|s| s.paper_id.clone());
        self.students = summary.roster;
        self.current_student_id = current_paper
            .and_then(|p| self.students.iter().find(|s| s.paper_id == p))
            .map(|s| s.id.clone());
        self.fix_student_selection();
        true
    }

    pub fn clear_score_map(&mut self) {
        self.score_map.clear();
    }

    // ========== 派生查询 ==========

    /// 按试卷键解析某学生在某题上的已评分数
    ///
    /// `question_id` 缺省时取当前选中题目；任何必要输入缺失都返回 None
    pub fn resolve_score(&self, student: &Student, question_id: Option<&str>) -> Option<f64> {
        let question_id = question_id.or(self.current_question_id.as_deref())?;
        if student.paper_id.is_empty() {
            return None;
        }
        self.score_map.get(question_id, &student.paper_id)
    }

    /// 当前选中 (学生, 题目) 的已评分数
    pub fn resolve_current_score(&self) -> Option<f64> {
        self.resolve_score(self.current_student()?, None)
    }

    /// 当前选中题目的评分进度：扫名单对分数表
    pub fn stats(&self) -> Option<QuestionStats> {
        let question_id = self.current_question_id.as_deref()?;
        let total = self.students.len();
        let graded = self
            .students
            .iter()
            .filter(|s| self.score_map.contains(question_id, &s.paper_id))
            .count();
        Some(QuestionStats {
            total,
            graded,
            ungraded: total - graded,
        })
    }

    /// 整个批次的进度：(已评, 未评) 的 (学生, 题目) 对数
    pub fn batch_progress(&self) -> (usize, usize) {
        let mut graded = 0;
        let mut ungraded = 0;
        for question in &self.questions {
            for student in &self.students {
                if self.score_map.contains(&question.id, &student.paper_id) {
                    graded += 1;
                } else {
                    ungraded += 1;
                }
            }
        }
        (graded, ungraded)
    }

    // ========== 本地更新 ==========

    /// 提交成功后的乐观更新：写分数表并同步当前详情
    pub fn apply_submitted_score(&mut self, question_id: &str, paper_id: &str, new_score: f64) {
        self.score_map.insert(question_id, paper_id, new_score);
        if let Some(detail) = self.answer_detail.as_mut() {
            if detail.question_id == question_id && detail.paper_id == paper_id {
                detail.score = Some(new_score);
            }
        }
    }

    /// 用详情里附带的分数回填分数表（幂等，不覆盖已有条目）
    ///
    /// # 返回
    /// 是否真正写入
    pub fn backfill_from_detail(&mut self, detail: &AnswerDetail) -> bool {
        match detail.score {
            Some(score) => self
                .score_map
                .backfill(&detail.question_id, &detail.paper_id, score),
            None => false,
        }
    }

    pub fn set_answer_detail(&mut self, detail: Option<AnswerDetail>) {
        self.answer_detail = detail;
    }

    /// 更新当前详情里的改分理由
    pub fn set_detail_reason(&mut self, reason: &str) {
        if let Some(detail) = self.answer_detail.as_mut() {
            detail.reason = Some(reason.to_string());
        }
    }

    // ========== 选中与导航 ==========

    /// 按ID选中学生
    ///
    /// # 返回
    /// 选中状态是否发生变化（未知ID不改变选中）
    pub fn select_student(&mut self, id: &str) -> bool {
        if !self.students.iter().any(|s| s.id == id) {
            return false;
        }
        if self.current_student_id.as_deref() == Some(id) {
            return false;
        }
        self.current_student_id = Some(id.to_string());
        true
    }

    /// 按ID选中题目
    pub fn select_question(&mut self, id: &str) -> bool {
        if !self.questions.iter().any(|q| q.id == id) {
            return false;
        }
        if self.current_question_id.as_deref() == Some(id) {
            return false;
        }
        self.current_question_id = Some(id.to_string());
        true
    }

    /// 切换到名单顺序里的下一个学生；已在末尾时不动
    pub fn next_student(&mut self) -> Option<&Student> {
        let index = self.current_index()?;
        if index + 1 >= self.students.len() {
            return None;
        }
        self.current_student_id = Some(self.students[index + 1].id.clone());
        self.students.get(index + 1)
    }

    /// 切换到名单顺序里的上一个学生；已在开头时不动
    pub fn prev_student(&mut self) -> Option<&Student> {
        let index = self.current_index()?;
        let prev_index = index.checked_sub(1)?;
        self.current_student_id = Some(self.students[prev_index].id.clone());
        self.students.get(prev_index)
    }

    /// 当前学生在名单里的位置
    pub fn current_index(&self) -> Option<usize> {
        let id = self.current_student_id.as_deref()?;
        self.students.iter().position(|s| s.id == id)
    }

    fn fix_student_selection(&mut self) {
        let still_there = self
            .current_student_id
            .as_deref()
            .map(|id| self.students.iter().any(|s| s.id == id))
            .unwrap_or(false);
        if !still_there {
            self.current_student_id = self.students.first().map(|s| s.id.clone());
        }
    }

    fn fix_question_selection(&mut self) {
        let still_there = self
            .current_question_id
            .as_deref()
            .map(|id| self.questions.iter().any(|q| q.id == id))
            .unwrap_or(false);
        if !still_there {
            self.current_question_id = self.questions.first().map(|q| q.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{flatten_question_scores, normalize_question, normalize_student};
    use serde_json::json;

    fn student(id: &str, paper_id: &str) -> Student {
        normalize_student(&json!({"id": id, "paper_id": paper_id}))
            .unwrap()
            .unwrap()
    }

    fn question(id: &str, max_score: Option<f64>) -> Question {
        normalize_question(&json!({"id": id, "max_score": max_score})).unwrap()
    }

    fn two_student_state() -> ReviewState {
        let mut state = ReviewState::new();
        state.apply_roster(vec![student("1", "p1"), student("2", "p2")]);
        state.apply_questions(vec![question("q1", Some(60.0))]);
        state
    }

    #[test]
    fn test_submit_updates_exactly_one_entry() {
        // 规格里的算例：p1 提交 45 分，p2 不受影响
        let mut state = two_student_state();
        assert_eq!(state.current_student().unwrap().id, "1");

        state.apply_submitted_score("q1", "p1", 45.0);

        let p1 = student("1", "p1");
        let p2 = student("2", "p2");
        assert_eq!(state.resolve_score(&p1, Some("q1")), Some(45.0));
        assert_eq!(state.resolve_score(&p2, Some("q1")), None);
        // 不需要重新拉取就能读到新分数
        assert_eq!(state.resolve_current_score(), Some(45.0));
    }

    #[test]
    fn test_resolve_score_defaults_to_current_question() {
        let mut state = two_student_state();
        state.apply_submitted_score("q1", "p2", 30.0);
        assert_eq!(state.resolve_score(&student("2", "p2"), None), Some(30.0));

        // 没有选中题目也没有显式题目ID时返回 None
        let mut empty = ReviewState::new();
        empty.apply_roster(vec![student("1", "p1")]);
        assert_eq!(empty.resolve_score(&student("1", "p1"), None), None);
    }

    #[test]
    fn test_roster_replaced_only_when_paper_key_sets_differ() {
        let mut state = two_student_state();
        state.select_student("2");

        // 集合一致：不替换、不产生选中抖动
        let same = flatten_question_scores(&json!([
            {"question_id": "q1", "student_list": [
                {"paper_id": "p1", "score": 10},
                {"paper_id": "p2", "score": 20}
            ]}
        ]))
        .unwrap();
        assert!(!state.apply_score_summary(same));
        assert_eq!(state.current_student().unwrap().paper_id, "p2");

        // 集合不同：替换，按试卷键保住当前选择
        let different = flatten_question_scores(&json!([
            {"question_id": "q1", "student_list": [
                {"paper_id": "p2", "score": 20},
                {"paper_id": "p3", "score": 30}
            ]}
        ]))
        .unwrap();
        assert!(state.apply_score_summary(different));
        assert_eq!(state.students().len(), 2);
        assert_eq!(state.current_student().unwrap().paper_id, "p2");
    }

    #[test]
    fn test_score_summary_before_roster_converges() {
        // 分数汇总先到：权威名单直接落地
        let mut state = ReviewState::new();
        state.apply_questions(vec![question("q1", None)]);
        let summary = flatten_question_scores(&json!([
            {"question_id": "q1", "max_score": 60, "student_list": [
                {"paper_id": "p1", "score": 45},
                {"paper_id": "p2"}
            ]}
        ]))
        .unwrap();
        assert!(state.apply_score_summary(summary));
        assert_eq!(state.students().len(), 2);
        assert_eq!(state.current_student().unwrap().paper_id, "p1");

        // 名单请求后到：覆盖成规范化名单，分数表不受影响
        state.apply_roster(vec![student("1", "p1"), student("2", "p2")]);
        assert_eq!(state.resolve_score(&student("1", "p1"), Some("q1")), Some(45.0));
    }

    #[test]
    fn test_max_score_backfill_from_summary() {
        let mut state = ReviewState::new();
        state.apply_questions(vec![question("q1", Some(60.0)), question("q2", None)]);
        let summary = flatten_question_scores(&json!([
            {"question_id": "q1", "max_score": 100, "student_list": [{"paper_id": "p1", "score": 1}]},
            {"question_id": "q2", "max_score": 40, "student_list": [{"paper_id": "p1", "score": 2}]}
        ]))
        .unwrap();
        state.apply_score_summary(summary);
        // 已有满分不被覆盖，缺失的被回填
        assert_eq!(state.questions()[0].max_score, Some(60.0));
        assert_eq!(state.questions()[1].max_score, Some(40.0));
    }

    #[test]
    fn test_next_student_at_end_is_noop() {
        let mut state = two_student_state();
        state.select_student("2");
        assert!(state.next_student().is_none());
        assert_eq!(state.current_student().unwrap().id, "2");
    }

    #[test]
    fn test_prev_student_at_start_is_noop() {
        let mut state = two_student_state();
        assert!(state.prev_student().is_none());
        assert_eq!(state.current_student().unwrap().id, "1");
    }

    #[test]
    fn test_selection_fixed_when_student_disappears() {
        let mut state = two_student_state();
        state.select_student("2");
        state.apply_roster(vec![student("3", "p3")]);
        assert_eq!(state.current_student().unwrap().id, "3");

        state.apply_roster(vec![]);
        assert!(state.current_student().is_none());
    }

    #[test]
    fn test_backfill_from_detail_is_idempotent() {
        let mut state = two_student_state();
        let detail = crate::models::normalize_answer_detail(
            &json!({"answer": "……", "score": 33}),
            "q1",
            "p1",
        )
        .unwrap();
        assert!(state.backfill_from_detail(&detail));
        assert!(!state.backfill_from_detail(&detail));

        // 已有条目不被详情覆盖
        state.apply_submitted_score("q1", "p2", 50.0);
        let detail2 = crate::models::normalize_answer_detail(
            &json!({"answer": "……", "score": 10}),
            "q1",
            "p2",
        )
        .unwrap();
        assert!(!state.backfill_from_detail(&detail2));
        assert_eq!(state.resolve_score(&student("2", "p2"), Some("q1")), Some(50.0));
    }

    #[test]
    fn test_stats_scans_roster_against_score_map() {
        let mut state = two_student_state();
        state.apply_submitted_score("q1", "p1", 45.0);
        let stats = state.stats().unwrap();
        assert_eq!(stats, QuestionStats { total: 2, graded: 1, ungraded: 1 });
    }

    #[test]
    fn test_optimistic_update_syncs_open_detail() {
        let mut state = two_student_state();
        let detail = crate::models::normalize_answer_detail(&json!({"answer": "……"}), "q1", "p1")
            .unwrap();
        state.set_answer_detail(Some(detail));
        state.apply_submitted_score("q1", "p1", 45.0);
        assert_eq!(state.answer_detail().unwrap().score, Some(45.0));
    }
}
