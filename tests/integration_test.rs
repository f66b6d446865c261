use manual_review::{logger, Config, ReviewApiClient, ReviewSession};

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_load_full_session() {
    // 初始化日志
    logger::init();

    // 加载配置（GRADING_ID / EXAM_ID / REVIEW_TOKEN 从环境变量来）
    let config = Config::from_env();
    config.validate().expect("缺少 GRADING_ID / EXAM_ID");

    let client = ReviewApiClient::new(&config);
    let mut session = ReviewSession::new(client, config);

    session.load_all().await.expect("批次数据加载失败");

    let state = session.state();
    assert!(!state.students().is_empty(), "名单不应为空");
    assert!(!state.questions().is_empty(), "题目不应为空");
    println!(
        "名单 {} 人，题目 {} 道，分数 {} 条",
        state.students().len(),
        state.questions().len(),
        state.score_map().len()
    );
}

#[tokio::test]
#[ignore]
async fn test_fetch_answer_detail() {
    logger::init();

    let config = Config::from_env();
    config.validate().expect("缺少 GRADING_ID / EXAM_ID");

    let client = ReviewApiClient::new(&config);
    let mut session = ReviewSession::new(client, config);

    session.load_all().await.expect("批次数据加载失败");

    // 默认选中第一个学生、第一道题
    let detail = session
        .refresh_answer_detail()
        .await
        .expect("作答详情加载失败")
        .expect("应当选中了学生和题目");

    println!(
        "题目 {} 试卷 {} 分数 {:?}",
        detail.question_id, detail.paper_id, detail.score
    );
}

#[tokio::test]
#[ignore]
async fn test_student_list_endpoint() {
    logger::init();

    let config = Config::from_env();
    let client = ReviewApiClient::new(&config);

    let payload = client
        .student_list(&config.grading_id)
        .await
        .expect("学生名单接口应当可达");
    assert!(payload.is_array(), "data 应当是数组");
}
