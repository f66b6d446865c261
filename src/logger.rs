/// 日志工具模块
///
/// 提供 tracing 初始化和输出格式的辅助函数
use crate::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 默认级别 info，可通过 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 人工复核打分模式");
    info!("📋 阅卷批次: {}  考试: {}", config.grading_id, config.exam_id);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `total_questions`: 题目总数
/// - `total_students`: 学生总数
/// - `graded`: 已有分数的 (学生, 题目) 数
/// - `ungraded`: 仍缺分数的 (学生, 题目) 数
pub fn print_final_stats(total_questions: usize, total_students: usize, graded: usize, ungraded: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批次复核进度");
    info!(
        "统计时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 题目: {} 道  学生: {} 人", total_questions, total_students);
    info!("✅ 已评: {}", graded);
    info!("❌ 未评: {}", ungraded);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }
}
