//! 实体模型与规范化
//!
//! 远端载荷全部按 `serde_json::Value` 接收，每个实体各有一个显式的
//! 规范化函数；认不出的形状显式报错，不做静默兜底。

pub mod answer_detail;
pub mod key;
pub mod question;
pub mod score_map;
pub mod student;

pub use answer_detail::{normalize_answer_detail, AnswerDetail};
pub use key::{canonical_key, parse_score};
pub use question::{normalize_question, Question, QuestionKind};
pub use score_map::{flatten_question_scores, ScoreMap, ScoreSummary};
pub use student::{normalize_student, Student};
