//! 规则字段提取工具
//! 从原始JSON规则对象中容错提取必要字段与标签

use serde_json::Value;

use super::model::SimplifiedRule;
use crate::error::{TagSyncError, TsResult};

/// 规则字段提取工具
pub struct RuleFieldExtractor;

impl RuleFieldExtractor {
    /// 提取精简规则（id/isDefault/name）
    /// 字段缺失或类型不符时按零值处理，仅在整体不是JSON对象时报错
    pub fn simplified(rule: &Value) -> TsResult<SimplifiedRule> {
        let obj = rule.as_object().ok_or_else(|| {
            TagSyncError::InvalidInput(format!("规则数据不是JSON对象：{}", rule))
        })?;

        Ok(SimplifiedRule {
            id: obj
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_default: obj
                .get("isDefault")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            name: obj
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// 提取规则标签列表（非字符串项直接丢弃）
    pub fn tags(rule: &Value) -> Vec<String> {
        rule.get("tags")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 判断规则标签是否命中过滤关键字（子串匹配，大小写不敏感）
    /// 过滤列表为空时视为全部命中
    pub fn matches_tag_filters(rule_tags: &[String], tag_filters: &[String]) -> bool {
        if tag_filters.is_empty() {
            return true;
        }

        rule_tags.iter().any(|tag| {
            let lower_tag = tag.to_lowercase();
            tag_filters
                .iter()
                .any(|filter| lower_tag.contains(&filter.to_lowercase()))
        })
    }
}
