//! 工作流数据模型定义
//! 仅存储各阶段产物数据，无任何业务逻辑，支持序列化/反序列化

use serde::{Deserialize, Serialize};

/// 远程规则的精简投影（仅保留必要字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedRule {
    pub id: String,
    pub is_default: bool,
    pub name: String,
}

/// 分页拉取阶段汇总结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult {
    pub total_rules: usize,
    pub total_pages: usize,
    pub rules: Vec<SimplifiedRule>,
}

/// 规则清单中的单条期望规则
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// 规则清单文件内容
/// 缺失字段按零值处理（与历史清单文件保持兼容）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
    #[serde(default)]
    pub total_rules: usize,
    #[serde(default)]
    pub processed_rules: usize,
    #[serde(default)]
    pub failed_rules: Vec<String>,
    #[serde(default)]
    pub rules: Vec<InputRule>,
}

/// 匹配结果单项：远程身份 + 清单期望标签
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedRule {
    // 来自远程列举结果
    pub id: String,
    // 以下来自清单
    pub name: String,
    pub tags: Vec<String>,
    pub is_default: bool,
}

/// 匹配阶段汇总结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub total_matches: usize,
    pub total_input_rules: usize,
    pub total_result_rules: usize,
    pub matched_rules: Vec<MatchedRule>,
}

/// 单条规则打标结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggingResult {
    pub rule_id: String,
    pub rule_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub old_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaggingResult {
    /// 以失败态快速创建（用于拉取/更新出错时记录）
    pub fn failure(rule_id: &str, rule_name: &str, error: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            success: false,
            old_tags: Vec::new(),
            new_tags: Vec::new(),
            error: Some(error),
        }
    }
}

/// 批量打标汇总结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTaggingResult {
    pub total_rules: usize,
    pub successful_tags: usize,
    pub failed_tags: usize,
    pub results: Vec<TaggingResult>,
    pub skipped_rules: Vec<String>,
}
