//! 远程API响应/载荷数据模型
//! 仅存储接口数据，无任何业务逻辑

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 规则列表接口响应（单页）
/// 规则对象以原始JSON形式保留，由上层做逐条容错投影
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRulesResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// 规则更新载荷（仅携带 tags 字段，其余字段不触碰）
#[derive(Debug, Clone, Serialize)]
pub struct RuleUpdatePayload {
    pub tags: Vec<String>,
}
