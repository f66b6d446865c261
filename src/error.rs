//! 错误类型定义
//!
//! 按来源分组：API 调用、载荷解析、业务规则、配置

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 远端载荷解析错误
    #[error("载荷错误: {0}")]
    Payload(#[from] PayloadError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应（code 不是 200）
    #[error("API返回错误响应 ({endpoint}): code={code:?}, message={message:?}")]
    BadResponse {
        endpoint: String,
        code: Option<String>,
        message: Option<String>,
    },
    /// API 返回空结果（data 缺失或为 null）
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    JsonParseFailed(#[from] serde_json::Error),
}

/// 远端载荷解析错误
///
/// 规范化函数不做静默兜底：无法识别的形状必须显式报告
#[derive(Debug, Error)]
pub enum PayloadError {
    /// 记录不是 JSON 对象
    #[error("{entity} 记录不是对象: {found}")]
    NotAnObject {
        entity: &'static str,
        found: String,
    },
    /// 记录缺少必填字段
    #[error("{entity} 记录缺少字段 {field}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
    /// 顶层载荷不是数组
    #[error("{entity} 载荷不是数组")]
    NotAnArray { entity: &'static str },
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 当前没有选中的学生或题目
    #[error("当前没有选中的学生或题目")]
    NoSelection,
    /// 上一次提交尚未完成
    #[error("上一次打分提交尚未完成")]
    SubmitInFlight,
    /// 分数超出范围
    #[error("分数 {score} 超出范围 [0, {max}]")]
    ScoreOutOfRange { score: f64, max: f64 },
    /// 分数不是有限数值
    #[error("分数不是有效数值: {score}")]
    ScoreNotFinite { score: f64 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 阅卷链接无法解析
    #[error("阅卷链接无法解析 ({url}): {reason}")]
    InvalidReviewUrl { url: String, reason: String },
    /// 阅卷链接缺少必要参数
    #[error("阅卷链接缺少参数 {param}: {url}")]
    MissingUrlParam { url: String, param: &'static str },
    /// 必要配置项为空
    #[error("配置项 {name} 为空")]
    MissingValue { name: &'static str },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
