//! 标识符规范化
//!
//! 后端的 id 字段同一接口里时而是数字、时而是字符串。入库边界统一
//! 规范化成字符串键，后续查表就不需要同时试原始形式和字符串形式。

use serde_json::Value;

/// 把一个松散类型的标识符规范化为字符串键
///
/// - 字符串：去掉首尾空白，空串视为缺失
/// - 整数：十进制渲染
/// - 整值浮点（如 3.0）：按整数渲染，与数字 3、字符串 "3" 落到同一个键
/// - 其他类型视为缺失
pub fn canonical_key(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(f.to_string())
                }
            }
        }
        _ => None,
    }
}

/// 从对象的一串候选字段名中取出第一个能规范化成键的值
pub fn key_from_fields(raw: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|f| raw.get(f).and_then(canonical_key))
}

/// 解析分数值，只接受能转成有限数的数字或数字字符串
pub fn parse_score(raw: &Value) -> Option<f64> {
    let score = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    score.is_finite().then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_key_number_and_string_collide() {
        assert_eq!(canonical_key(&json!(3)), Some("3".to_string()));
        assert_eq!(canonical_key(&json!(3.0)), Some("3".to_string()));
        assert_eq!(canonical_key(&json!("3")), Some("3".to_string()));
    }

    #[test]
    fn test_canonical_key_rejects_empty_and_non_scalar() {
        assert_eq!(canonical_key(&json!("")), None);
        assert_eq!(canonical_key(&json!("   ")), None);
        assert_eq!(canonical_key(&json!(null)), None);
        assert_eq!(canonical_key(&json!([1])), None);
    }

    #[test]
    fn test_parse_score_finite_only() {
        assert_eq!(parse_score(&json!(45)), Some(45.0));
        assert_eq!(parse_score(&json!("45.5")), Some(45.5));
        assert_eq!(parse_score(&json!("abc")), None);
        assert_eq!(parse_score(&json!(null)), None);
        // JSON 本身写不出 NaN，但字符串形式可能混进来
        assert_eq!(parse_score(&json!("NaN")), None);
        assert_eq!(parse_score(&json!("inf")), None);
    }
}
