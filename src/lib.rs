//! # Manual Review
//!
//! 考试阅卷批次的人工复核客户端
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Client）
//! - `client/` - 持有 HTTP 资源，只暴露六个阅卷接口的调用能力
//! - `ReviewApiClient` - 信封拆解（code == "200" 才算成功）
//!
//! ### ② 模型层（Models）
//! - `models/` - 实体类型 + 每实体一个显式规范化函数
//! - `canonical_key` - 入库边界统一键形式，消灭双重查表
//!
//! ### ③ 状态层（State）
//! - `session/state` - 纯内存对账：三路加载结果的合并、选中状态、
//!   分数解析、评分进度
//!
//! ### ④ 编排层（Session / App）
//! - `session/` - `ReviewSession`：加载、详情取消、打分提交、自动切换
//! - `app` - 整批次加载与进度汇报

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod session;

// 重新导出常用类型
pub use app::App;
pub use client::{ReviewApiClient, ScoreUpdate};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{AnswerDetail, Question, QuestionKind, ScoreMap, Student};
pub use session::{QuestionStats, ReviewSession, ReviewState};
