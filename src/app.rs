use crate::client::ReviewApiClient;
use crate::config::Config;
use crate::logger;
use crate::session::ReviewSession;
use anyhow::{Context, Result};
use tracing::{error, info};

/// 应用主结构
///
/// 把一个阅卷批次完整加载进来，按题目汇报复核进度。
/// 加载失败不致命：对应的数据留空，继续汇报能汇报的部分。
pub struct App {
    session: ReviewSession,
    verbose_logging: bool,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        config
            .validate()
            .context("缺少必要配置（GRADING_ID / EXAM_ID）")?;

        logger::log_startup(&config);

        let client = ReviewApiClient::new(&config);
        let verbose_logging = config.verbose_logging;

        Ok(Self {
            session: ReviewSession::new(client, config),
            verbose_logging,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<()> {
        // 三路加载；任何一路失败只记日志，不中断
        if let Err(e) = self.session.load_all().await {
            error!("⚠️ 部分数据加载失败: {}", e);
        }

        let state = self.session.state();
        if state.questions().is_empty() && state.students().is_empty() {
            anyhow::bail!("批次数据为空，无法汇报进度");
        }

        // 逐题汇报评分进度
        let question_ids: Vec<String> =
            state.questions().iter().map(|q| q.id.clone()).collect();
        for question_id in question_ids {
            self.session.select_question(&question_id);
            let state = self.session.state();
            let Some(stats) = state.stats() else { continue };
            let title = state
                .current_question()
                .map(|q| logger::truncate_text(&q.title, 20))
                .unwrap_or_default();
            info!(
                "📄 题目 {} {} — 已评 {}/{} (未评 {})",
                question_id, title, stats.graded, stats.total, stats.ungraded
            );

            if self.verbose_logging {
                self.log_question_scores(&question_id);
            }
        }

        let state = self.session.state();
        let (graded, ungraded) = state.batch_progress();
        logger::print_final_stats(
            state.questions().len(),
            state.students().len(),
            graded,
            ungraded,
        );

        Ok(())
    }

    /// 详细模式：逐个学生列出当前题目的分数
    fn log_question_scores(&self, question_id: &str) {
        let state = self.session.state();
        for student in state.students() {
            match state.resolve_score(student, Some(question_id)) {
                Some(score) => info!("    {} ({}): {}", student.name, student.paper_id, score),
                None => info!("    {} ({}): 未评", student.name, student.paper_id),
            }
        }
    }
}
