/// 阅卷 API 客户端
///
/// 封装所有与阅卷后端相关的调用逻辑
use crate::config::Config;
use crate::error::ApiError;
use crate::models::QuestionKind;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// 阅卷 API 客户端
///
/// 持有唯一的 HTTP 资源，只暴露六个接口的调用能力，
/// 不认识名单/题目如何取舍，也不处理业务流程
#[derive(Clone)]
pub struct ReviewApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

/// 打分更新请求体
#[derive(Debug, Clone, Serialize)]
pub struct ScoreUpdate {
    pub grading_id: String,
    pub paper_id: String,
    pub question_id: String,
    pub question_type: &'static str,
    pub old_score: Option<f64>,
    pub new_score: f64,
}

impl ScoreUpdate {
    pub fn new(
        grading_id: &str,
        paper_id: &str,
        question_id: &str,
        kind: QuestionKind,
        old_score: Option<f64>,
        new_score: f64,
    ) -> Self {
        Self {
            grading_id: grading_id.to_string(),
            paper_id: paper_id.to_string(),
            question_id: question_id.to_string(),
            question_type: kind.as_str(),
            old_score,
            new_score,
        }
    }
}

impl ReviewApiClient {
    /// 创建新的阅卷客户端
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        }
    }

    /// 学生名单（按阅卷批次）
    pub async fn student_list(&self, grading_id: &str) -> Result<Value, ApiError> {
        self.get("exam-question/student-list", &[("grading_id", grading_id)])
            .await
    }

    /// 题目列表（按考试）
    pub async fn exam_question_list(&self, exam_id: &str) -> Result<Value, ApiError> {
        self.get("exam-question/exam-question-list", &[("exam_id", exam_id)])
            .await
    }

    /// 每题评分汇总（按阅卷批次）
    pub async fn question_score_list(&self, grading_id: &str) -> Result<Value, ApiError> {
        self.get("exam-question/question-list", &[("grading_id", grading_id)])
            .await
    }

    /// 单个 (学生, 题目) 的作答详情
    pub async fn grading_detail(
        &self,
        grading_id: &str,
        paper_id: &str,
        question_id: &str,
    ) -> Result<Value, ApiError> {
        self.get(
            "exam-question/grading",
            &[
                ("grading_id", grading_id),
                ("paper_id", paper_id),
                ("question_id", question_id),
            ],
        )
        .await
    }

    /// 提交打分更新
    pub async fn update_score(&self, update: &ScoreUpdate) -> Result<(), ApiError> {
        let endpoint = "exam-question/grading/score-update";
        let body = serde_json::to_value(update)?;
        debug!("打分更新 Payload: {}", body);
        self.put(endpoint, &body).await?;
        Ok(())
    }

    /// 提交改分理由
    pub async fn alter_reason(
        &self,
        grading_id: &str,
        paper_id: &str,
        question_id: &str,
        reason: &str,
    ) -> Result<(), ApiError> {
        let body = json!({
            "grading_id": grading_id,
            "paper_id": paper_id,
            "question_id": question_id,
            "reason": reason,
        });
        self.put("exam-question/grading/alter-reason", &body).await?;
        Ok(())
    }

    // ========== 通用请求封装 ==========

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| Self::request_failed(endpoint, e))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| Self::request_failed(endpoint, e))?;

        let data = Self::unwrap_envelope(endpoint, envelope)?;
        if data.is_null() {
            return Err(ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            });
        }
        Ok(data)
    }

    async fn put(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::request_failed(endpoint, e))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| Self::request_failed(endpoint, e))?;

        // 更新类接口的 data 允许为 null
        Self::unwrap_envelope(endpoint, envelope)
    }

    fn request_failed(endpoint: &str, source: reqwest::Error) -> ApiError {
        ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            source,
        }
    }

    /// 拆开 `{ code, message, data }` 信封，code 为 "200" 才算成功
    fn unwrap_envelope(endpoint: &str, mut envelope: Value) -> Result<Value, ApiError> {
        if !Self::is_success_code(envelope.get("code")) {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                code: envelope
                    .get("code")
                    .map(|c| c.as_str().map(str::to_string).unwrap_or_else(|| c.to_string())),
                message: envelope
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string),
            });
        }
        Ok(envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    /// 后端按约定返回字符串 "200"，个别旧接口返回数字 200，两者等价
    fn is_success_code(code: Option<&Value>) -> bool {
        match code {
            Some(Value::String(s)) => s == "200",
            Some(Value::Number(n)) => n.as_u64() == Some(200),
            _ => false,
        }
    }
}
