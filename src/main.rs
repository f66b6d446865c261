use anyhow::Result;
use manual_review::{logger, App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 加载配置：优先取命令行传入的阅卷链接，否则全部走环境变量
    let config = match std::env::args().nth(1) {
        Some(review_url) => Config::from_review_url(&review_url)?,
        None => Config::from_env(),
    };

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
