//! 复核会话 - 编排层
//!
//! 核心职责：把"人工复核一个阅卷批次"的完整流程串起来
//!
//! 流程顺序：
//! 1. 三路独立加载（名单 / 题目 / 分数汇总）→ 状态对账
//! 2. 选中 (学生, 题目) → 拉作答详情（被取代的请求直接取消）
//! 3. 提交打分 → 乐观更新 → 可选自动切换下一个学生
//!
//! 加载失败的策略：对应的状态清空为空值（绝不留陈旧数据），记一条
//! 日志，错误原样返回给调用方；不重试。

pub mod state;

use crate::client::{ReviewApiClient, ScoreUpdate};
use crate::config::Config;
use crate::error::{AppResult, BusinessError, PayloadError};
use crate::models::{
    flatten_question_scores, normalize_answer_detail, normalize_question, normalize_student,
    AnswerDetail, Question, Student,
};
use futures::future::{AbortHandle, Abortable, Aborted};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

pub use state::{QuestionStats, ReviewState};

/// 复核会话
///
/// - 持有客户端和状态，对外暴露加载、选中、打分三类操作
/// - 详情请求在途时如果选中变化，旧请求被取消而不是等它回来再丢弃
pub struct ReviewSession {
    client: ReviewApiClient,
    config: Config,
    state: ReviewState,
    detail_abort: Option<AbortHandle>,
    submitting: Arc<AtomicBool>,
}

/// 提交标志的还原守卫
///
/// 提交中的 future 可能被调用方半途丢弃（比如外面包了一层超时），
/// 标志必须随守卫一起放下，否则后续提交会被永远拒掉
struct SubmitGuard(Arc<AtomicBool>);

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReviewSession {
    /// 创建新的复核会话
    pub fn new(client: ReviewApiClient, config: Config) -> Self {
        Self {
            client,
            config,
            state: ReviewState::new(),
            detail_abort: None,
            submitting: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    // ========== 三路顶层加载 ==========

    /// 加载学生名单
    ///
    /// # 返回
    /// 入册的学生数
    pub async fn load_roster(&mut self) -> AppResult<usize> {
        match self.fetch_roster().await {
            Ok(students) => {
                let kept = students.len();
                self.state.apply_roster(students);
                info!("✓ 学生名单加载完成: {} 人", kept);
                Ok(kept)
            }
            Err(e) => {
                self.state.clear_roster();
                error!("❌ 学生名单加载失败: {}", e);
                Err(e)
            }
        }
    }

    /// 加载题目列表
    pub async fn load_questions(&mut self) -> AppResult<usize> {
        match self.fetch_questions().await {
            Ok(questions) => {
                let kept = questions.len();
                self.state.apply_questions(questions);
                info!("✓ 题目列表加载完成: {} 道", kept);
                Ok(kept)
            }
            Err(e) => {
                self.state.clear_questions();
                error!("❌ 题目列表加载失败: {}", e);
                Err(e)
            }
        }
    }

    /// 加载分数汇总并摊平入表
    ///
    /// 汇总载荷同时承担名单对账：按试卷键合成的权威名单与现有名单
    /// 不一致时替换现有名单
    pub async fn load_score_map(&mut self) -> AppResult<usize> {
        let payload = match self.client.question_score_list(&self.config.grading_id).await {
            Ok(payload) => payload,
            Err(e) => {
                self.state.clear_score_map();
                error!("❌ 分数汇总加载失败: {}", e);
                return Err(e.into());
            }
        };

        let summary = match flatten_question_scores(&payload) {
            Ok(summary) => summary,
            Err(e) => {
                self.state.clear_score_map();
                error!("❌ 分数汇总无法识别: {}", e);
                return Err(e.into());
            }
        };

        let entries = summary.map.len();
        let replaced = self.state.apply_score_summary(summary);
        info!("✓ 分数表加载完成: {} 条", entries);
        if replaced {
            warn!(
                "📋 名单与评分载荷不一致，已按权威名单替换 ({} 人)",
                self.state.students().len()
            );
        }
        Ok(entries)
    }

    /// 依次执行三路加载
    ///
    /// 任何一路失败不拦住其余两路；返回第一个遇到的错误
    pub async fn load_all(&mut self) -> AppResult<()> {
        let mut first_err = None;
        if let Err(e) = self.load_roster().await {
            first_err.get_or_insert(e);
        }
        if let Err(e) = self.load_questions().await {
            first_err.get_or_insert(e);
        }
        if let Err(e) = self.load_score_map().await {
            first_err.get_or_insert(e);
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ========== 选中与导航 ==========

    /// 按ID选中学生；选中变化会取消在途的详情请求
    pub fn select_student(&mut self, id: &str) -> bool {
        let changed = self.state.select_student(id);
        if changed {
            self.cancel_detail_fetch();
        }
        changed
    }

    /// 按ID选中题目
    pub fn select_question(&mut self, id: &str) -> bool {
        let changed = self.state.select_question(id);
        if changed {
            self.cancel_detail_fetch();
        }
        changed
    }

    /// 切换到下一个学生（末尾时不动）
    pub fn next_student(&mut self) -> Option<String> {
        self.cancel_detail_fetch();
        self.state.next_student().map(|s| s.id.clone())
    }

    /// 切换到上一个学生（开头时不动）
    pub fn prev_student(&mut self) -> Option<String> {
        self.cancel_detail_fetch();
        self.state.prev_student().map(|s| s.id.clone())
    }

    // ========== 作答详情 ==========

    /// 拉取当前选中 (学生, 题目) 的作答详情
    ///
    /// 发起前先取消上一个在途请求（"最后一次请求胜出"靠取消保证，
    /// 不靠时间戳比较）。详情里附带的分数会幂等回填分数表。
    ///
    /// 本方法跨 await 持有 `&mut self`，所以"在途时选中变化"只会以
    /// 两种形式出现：调用方丢弃本次 future（之后的 select_* 会取消
    /// 遗留的句柄），或把会话放进任务、通过保存的 AbortHandle 取消
    /// ——后一种情况命中下面的 `Aborted` 分支。
    pub async fn refresh_answer_detail(&mut self) -> AppResult<Option<AnswerDetail>> {
        self.cancel_detail_fetch();

        let Some((paper_id, question_id)) = self.state.current_pair_ids() else {
            self.state.set_answer_detail(None);
            return Ok(None);
        };

        let (abort_handle, registration) = AbortHandle::new_pair();
        self.detail_abort = Some(abort_handle);

        let client = self.client.clone();
        let grading_id = self.config.grading_id.clone();
        let fetch_paper = paper_id.clone();
        let fetch_question = question_id.clone();
        let fetch = Abortable::new(
            async move {
                client
                    .grading_detail(&grading_id, &fetch_paper, &fetch_question)
                    .await
            },
            registration,
        );

        match fetch.await {
            // 选中已经变化，这个响应作废，状态保持不动；
            // 句柄已经消费过，不能留在原地
            Err(Aborted) => {
                self.detail_abort = None;
                Ok(None)
            }
            Ok(Err(e)) => {
                self.detail_abort = None;
                self.state.set_answer_detail(None);
                warn!("⚠️ 作答详情加载失败: {}", e);
                Err(e.into())
            }
            Ok(Ok(raw)) => {
                self.detail_abort = None;
                let detail = match normalize_answer_detail(&raw, &question_id, &paper_id) {
                    Ok(detail) => detail,
                    Err(e) => {
                        self.state.set_answer_detail(None);
                        warn!("⚠️ 作答详情无法识别: {}", e);
                        return Err(e.into());
                    }
                };
                if self.state.backfill_from_detail(&detail) {
                    debug!("详情分数已回填: 题目 {} 试卷 {}", question_id, paper_id);
                }
                self.state.set_answer_detail(Some(detail.clone()));
                Ok(Some(detail))
            }
        }
    }

    // ========== 打分提交 ==========

    /// 提交打分
    ///
    /// 成功后乐观更新分数表和当前详情，并在开启自动切换时选中下一个
    /// 学生（已是最后一个时不动）。失败时错误原样抛回，调用方可以
    /// 保留输入不清空。
    pub async fn submit_score(&mut self, new_score: f64) -> AppResult<()> {
        if self.submitting.swap(true, Ordering::AcqRel) {
            return Err(BusinessError::SubmitInFlight.into());
        }
        // 无论正常返回还是 future 被丢弃，守卫析构时都会放下标志
        let _submit_guard = SubmitGuard(Arc::clone(&self.submitting));

        let (student, question) = match (self.state.current_student(), self.state.current_question())
        {
            (Some(s), Some(q)) => (s, q),
            _ => return Err(BusinessError::NoSelection.into()),
        };

        if !new_score.is_finite() {
            return Err(BusinessError::ScoreNotFinite { score: new_score }.into());
        }
        let max_score = question.max_score;
        if new_score < 0.0 || max_score.is_some_and(|max| new_score > max) {
            return Err(BusinessError::ScoreOutOfRange {
                score: new_score,
                max: max_score.unwrap_or(f64::INFINITY),
            }
            .into());
        }

        let paper_id = student.paper_id.clone();
        let question_id = question.id.clone();
        let kind = question.kind;
        let old_score = self.state.resolve_score(student, Some(&question_id));

        let update = ScoreUpdate::new(
            &self.config.grading_id,
            &paper_id,
            &question_id,
            kind,
            old_score,
            new_score,
        );

        let result = self.client.update_score(&update).await;

        match result {
            Ok(()) => {
                self.state
                    .apply_submitted_score(&question_id, &paper_id, new_score);
                info!(
                    "✓ 打分已提交: 题目 {} 试卷 {} {:?} → {}",
                    question_id, paper_id, old_score, new_score
                );
                if self.config.auto_advance {
                    sleep(Duration::from_millis(self.config.auto_advance_delay_ms)).await;
                    if let Some(next_id) = self.next_student() {
                        info!("➡️ 自动切换到下一个学生: {}", next_id);
                    }
                }
                Ok(())
            }
            Err(e) => {
                error!("❌ 打分提交失败: {}", e);
                Err(e.into())
            }
        }
    }

    /// 提交改分理由
    pub async fn submit_alter_reason(&mut self, reason: &str) -> AppResult<()> {
        let Some((paper_id, question_id)) = self.state.current_pair_ids() else {
            return Err(BusinessError::NoSelection.into());
        };

        match self
            .client
            .alter_reason(&self.config.grading_id, &paper_id, &question_id, reason)
            .await
        {
            Ok(()) => {
                self.state.set_detail_reason(reason);
                info!("✓ 改分理由已提交: 题目 {} 试卷 {}", question_id, paper_id);
                Ok(())
            }
            Err(e) => {
                error!("❌ 改分理由提交失败: {}", e);
                Err(e.into())
            }
        }
    }

    fn cancel_detail_fetch(&mut self) {
        if let Some(handle) = self.detail_abort.take() {
            handle.abort();
        }
    }

    // ========== 内部取数 ==========

    async fn fetch_roster(&self) -> AppResult<Vec<Student>> {
        let payload = self.client.student_list(&self.config.grading_id).await?;
        let items = payload.as_array().ok_or(PayloadError::NotAnArray {
            entity: "学生名单",
        })?;

        let mut students = Vec::new();
        let mut dropped = 0usize;
        for item in items {
            match normalize_student(item) {
                Ok(Some(student)) => students.push(student),
                Ok(None) => dropped += 1,
                Err(e) => {
                    warn!("⚠️ 跳过无法识别的学生记录: {}", e);
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            info!("已丢弃 {} 条缺少试卷关联的学生记录", dropped);
        }
        Ok(students)
    }

    async fn fetch_questions(&self) -> AppResult<Vec<Question>> {
        let payload = self.client.exam_question_list(&self.config.exam_id).await?;
        let items = payload.as_array().ok_or(PayloadError::NotAnArray {
            entity: "题目列表",
        })?;

        let mut questions = Vec::new();
        for item in items {
            match normalize_question(item) {
                Ok(question) => questions.push(question),
                Err(e) => warn!("⚠️ 跳过无法识别的题目记录: {}", e),
            }
        }
        Ok(questions)
    }
}
