use crate::error::ConfigError;
use url::Url;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 阅卷 API 基础地址
    pub api_base_url: String,
    /// 阅卷 API 访问令牌（Bearer）
    pub api_token: String,
    /// 阅卷批次ID
    pub grading_id: String,
    /// 考试ID
    pub exam_id: String,
    /// 打分成功后是否自动切换到下一个学生
    pub auto_advance: bool,
    /// 自动切换前的停顿（毫秒）
    pub auto_advance_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://tps-yuejuan-api.staff.xdf.cn".to_string(),
            api_token: String::new(),
            grading_id: String::new(),
            exam_id: String::new(),
            auto_advance: true,
            auto_advance_delay_ms: 300,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("REVIEW_API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("REVIEW_TOKEN").unwrap_or(default.api_token),
            grading_id: std::env::var("GRADING_ID").unwrap_or(default.grading_id),
            exam_id: std::env::var("EXAM_ID").unwrap_or(default.exam_id),
            auto_advance: std::env::var("AUTO_ADVANCE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_advance),
            auto_advance_delay_ms: std::env::var("AUTO_ADVANCE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_advance_delay_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 从阅卷页面链接中解析 grading_id / exam_id
    ///
    /// 阅卷控制台的页面地址形如
    /// `https://.../manual-review?grading_id=123&exam_id=456`，
    /// 直接粘贴链接即可定位批次，其余配置仍取自环境变量。
    pub fn from_review_url(review_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(review_url).map_err(|e| ConfigError::InvalidReviewUrl {
            url: review_url.to_string(),
            reason: e.to_string(),
        })?;

        let mut grading_id = None;
        let mut exam_id = None;
        // 控制台是 hash 路由，查询串可能挂在 fragment 里
        let fragment_query = parsed
            .fragment()
            .and_then(|f| f.split_once('?'))
            .map(|(_, q)| q.to_string());
        let pairs = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(
                url::form_urlencoded::parse(fragment_query.as_deref().unwrap_or("").as_bytes())
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            );
        for (key, value) in pairs {
            match key.as_str() {
                "grading_id" => grading_id = Some(value),
                "exam_id" => exam_id = Some(value),
                _ => {}
            }
        }

        let grading_id = grading_id.filter(|v| !v.is_empty()).ok_or(ConfigError::MissingUrlParam {
            url: review_url.to_string(),
            param: "grading_id",
        })?;
        let exam_id = exam_id.filter(|v| !v.is_empty()).ok_or(ConfigError::MissingUrlParam {
            url: review_url.to_string(),
            param: "exam_id",
        })?;

        Ok(Self {
            grading_id,
            exam_id,
            ..Self::from_env()
        })
    }

    /// 校验定位一个阅卷批次所需的配置是否齐全
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grading_id.is_empty() {
            return Err(ConfigError::MissingValue { name: "grading_id" });
        }
        if self.exam_id.is_empty() {
            return Err(ConfigError::MissingValue { name: "exam_id" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_review_url() {
        let config = Config::from_review_url(
            "https://tps-yuejuan.staff.xdf.cn/manual-review?grading_id=g-77&exam_id=e-12",
        )
        .expect("标准链接应当可以解析");
        assert_eq!(config.grading_id, "g-77");
        assert_eq!(config.exam_id, "e-12");
    }

    #[test]
    fn test_from_review_url_hash_route() {
        // 控制台实际使用 hash 路由，参数挂在 fragment 里
        let config = Config::from_review_url(
            "https://tps-yuejuan.staff.xdf.cn/#/manual-review?grading_id=g-88&exam_id=e-34",
        )
        .expect("hash 路由链接应当可以解析");
        assert_eq!(config.grading_id, "g-88");
        assert_eq!(config.exam_id, "e-34");
    }

    #[test]
    fn test_from_review_url_missing_param() {
        let result =
            Config::from_review_url("https://tps-yuejuan.staff.xdf.cn/manual-review?exam_id=e-12");
        assert!(matches!(
            result,
            Err(ConfigError::MissingUrlParam { param: "grading_id", .. })
        ));
    }

    #[test]
    fn test_validate_requires_ids() {
        let config = Config {
            grading_id: "g-1".to_string(),
            exam_id: "e-1".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert!(Config::default().validate().is_err());
    }
}
