//! 规则匹配阶段
//! 加载本地规则清单，与远程列举结果按复合键（name + isDefault）配对

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use super::model::{InputData, InputRule, MatchResult, MatchedRule, PaginatedResult, SimplifiedRule};
use crate::error::{TagSyncError, TsResult};
use crate::output::{OUTPUT_DIR, ResultWriter};

/// 规则匹配器
pub struct RuleMatcher;

impl RuleMatcher {
    /// 执行完整匹配流程（清单加载 + 匹配 + 结果落盘 + 汇总输出）
    pub async fn run(
        input_filename: &str,
        listed: &PaginatedResult,
    ) -> TsResult<MatchResult> {
        info!("加载规则清单文件：{}", input_filename);
        let input_data = Self::load_manifest(input_filename).await?;

        info!("开始规则匹配...");
        let match_result = Self::match_rules(&input_data, listed);

        // 落盘失败只告警，不中断流程
        if let Err(e) = ResultWriter::save(&match_result, "MatchResult", OUTPUT_DIR).await {
            warn!("匹配结果落盘失败：{}", e);
        }

        println!("{}", Self::format_match_summary(&match_result));

        Ok(match_result)
    }

    /// 加载并解析规则清单文件
    /// 文件不存在、不可读、为空或JSON非法均为致命错误
    pub async fn load_manifest(filename: &str) -> TsResult<InputData> {
        if !Path::new(filename).exists() {
            return Err(TagSyncError::ManifestError(format!(
                "文件 {} 不存在",
                filename
            )));
        }

        let data = tokio::fs::read(filename).await.map_err(|e| {
            TagSyncError::ManifestError(format!("读取文件 {} 失败：{}", filename, e))
        })?;

        if data.is_empty() {
            return Err(TagSyncError::ManifestError(format!(
                "文件 {} 为空",
                filename
            )));
        }

        let input_data: InputData = serde_json::from_slice(&data).map_err(|e| {
            TagSyncError::ManifestError(format!("解析文件 {} 的JSON失败：{}", filename, e))
        })?;

        debug!(
            "清单解析完成：totalRules={}，processedRules={}，规则条数={}",
            input_data.total_rules,
            input_data.processed_rules,
            input_data.rules.len()
        );

        Ok(input_data)
    }

    /// 按复合键匹配清单规则与远程规则
    /// 两侧均以 name + "_" + isDefault 建索引，键重复时后者覆盖前者（并告警）；
    /// 未匹配的条目两侧都静默丢弃
    pub fn match_rules(input_data: &InputData, listed: &PaginatedResult) -> MatchResult {
        let mut match_result = MatchResult {
            total_input_rules: input_data.rules.len(),
            total_result_rules: listed.rules.len(),
            ..Default::default()
        };

        // 清单侧索引：键 -> 清单内下标（重复键保留最后一条）
        let mut input_index: HashMap<String, usize> = HashMap::new();
        for (i, rule) in input_data.rules.iter().enumerate() {
            if let Some(prev) = input_index.insert(Self::composite_key(&rule.name, rule.is_default), i)
            {
                warn!(
                    "清单中复合键重复（name={}，isDefault={}），第{}条覆盖第{}条",
                    rule.name,
                    rule.is_default,
                    i + 1,
                    prev + 1
                );
            }
        }

        // 远程侧索引：键 -> 精简规则（重复键保留最后一条）
        let mut result_index: HashMap<String, &SimplifiedRule> = HashMap::new();
        for rule in &listed.rules {
            if result_index
                .insert(Self::composite_key(&rule.name, rule.is_default), rule)
                .is_some()
            {
                warn!(
                    "远程列举结果中复合键重复（name={}，isDefault={}），后者覆盖前者",
                    rule.name, rule.is_default
                );
            }
        }

        debug!("清单侧索引条数：{}", input_index.len());
        debug!("远程侧索引条数：{}", result_index.len());

        // 按清单文件顺序输出匹配结果（仅索引中的胜出条目参与匹配）
        for (i, input_rule) in input_data.rules.iter().enumerate() {
            let key = Self::composite_key(&input_rule.name, input_rule.is_default);
            if input_index.get(&key) != Some(&i) {
                continue;
            }

            if let Some(result_rule) = result_index.get(&key) {
                match_result.matched_rules.push(Self::pair(input_rule, result_rule));
            }
        }

        match_result.total_matches = match_result.matched_rules.len();
        match_result
    }

    /// 复合键：name + "_" + isDefault
    fn composite_key(name: &str, is_default: bool) -> String {
        format!("{}_{}", name, is_default)
    }

    /// 组合匹配项：远程id + 清单的名称/期望标签
    fn pair(input_rule: &InputRule, result_rule: &SimplifiedRule) -> MatchedRule {
        MatchedRule {
            id: result_rule.id.clone(),
            name: input_rule.name.clone(),
            tags: input_rule.tags.clone(),
            is_default: input_rule.is_default,
        }
    }

    /// 格式化匹配汇总
    pub fn format_match_summary(match_result: &MatchResult) -> String {
        let match_rate = if match_result.total_input_rules > 0 {
            match_result.total_matches as f64 / match_result.total_input_rules as f64 * 100.0
        } else {
            0.0
        };

        format!(
            "\n=== 规则匹配汇总 ===\n清单规则总数: {}\n远程规则总数: {}\n匹配成功数: {}\n匹配率: {:.2}%\n",
            match_result.total_input_rules,
            match_result.total_result_rules,
            match_result.total_matches,
            match_rate,
        )
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input_rule(name: &str, is_default: bool, tags: &[&str]) -> InputRule {
        InputRule {
            id: None,
            is_default,
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn listed_rule(id: &str, name: &str, is_default: bool) -> SimplifiedRule {
        SimplifiedRule {
            id: id.to_string(),
            is_default,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_match_combines_remote_id_with_input_tags() {
        // 测试场景：复合键命中时，远程id与清单期望标签组合成匹配项
        let input = InputData {
            rules: vec![input_rule("R1", false, &["a", "b"])],
            ..Default::default()
        };
        let listed = PaginatedResult {
            rules: vec![listed_rule("x1", "R1", false)],
            ..Default::default()
        };

        let result = RuleMatcher::match_rules(&input, &listed);
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.total_input_rules, 1);
        assert_eq!(result.total_result_rules, 1);

        let matched = &result.matched_rules[0];
        assert_eq!(matched.id, "x1");
        assert_eq!(matched.name, "R1");
        assert_eq!(matched.tags, vec!["a".to_string(), "b".to_string()]);
        assert!(!matched.is_default);
    }

    #[test]
    fn test_match_requires_both_key_fields() {
        // 测试场景：name 相同但 isDefault 不同不算匹配
        let input = InputData {
            rules: vec![input_rule("R1", true, &["a"])],
            ..Default::default()
        };
        let listed = PaginatedResult {
            rules: vec![listed_rule("x1", "R1", false)],
            ..Default::default()
        };

        let result = RuleMatcher::match_rules(&input, &listed);
        assert_eq!(result.total_matches, 0);
        assert!(result.matched_rules.is_empty());
    }

    #[test]
    fn test_match_duplicate_key_last_wins() {
        // 测试场景：清单中复合键重复时，最后一条生效且只产生一个匹配
        let input = InputData {
            rules: vec![
                input_rule("R1", false, &["old"]),
                input_rule("R1", false, &["new"]),
            ],
            ..Default::default()
        };
        let listed = PaginatedResult {
            rules: vec![listed_rule("x1", "R1", false)],
            ..Default::default()
        };

        let result = RuleMatcher::match_rules(&input, &listed);
        assert_eq!(result.total_matches, 1);
        assert_eq!(result.matched_rules[0].tags, vec!["new".to_string()]);
    }

    #[test]
    fn test_match_preserves_manifest_order() {
        // 测试场景：多条匹配按清单文件顺序输出
        let input = InputData {
            rules: vec![
                input_rule("B", false, &[]),
                input_rule("A", false, &[]),
                input_rule("C", true, &[]),
            ],
            ..Default::default()
        };
        let listed = PaginatedResult {
            rules: vec![
                listed_rule("ida", "A", false),
                listed_rule("idb", "B", false),
                listed_rule("idc", "C", true),
            ],
            ..Default::default()
        };

        let result = RuleMatcher::match_rules(&input, &listed);
        let names: Vec<&str> = result.matched_rules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_match_empty_manifest_is_not_error() {
        // 测试场景：空清单匹配数为0，不报错
        let input = InputData::default();
        let listed = PaginatedResult {
            rules: vec![listed_rule("x1", "R1", false)],
            ..Default::default()
        };

        let result = RuleMatcher::match_rules(&input, &listed);
        assert_eq!(result.total_matches, 0);
        assert_eq!(result.total_input_rules, 0);
    }

    #[test]
    fn test_match_rate_formatting() {
        // 测试场景：清单为空时匹配率按0处理，避免除零
        let summary = RuleMatcher::format_match_summary(&MatchResult::default());
        assert!(summary.contains("匹配率: 0.00%"));
    }

    #[tokio::test]
    async fn test_load_manifest_missing_file() {
        // 测试场景：文件不存在报清单错误
        let err = RuleMatcher::load_manifest("no_such_manifest.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no_such_manifest.json"));
    }

    #[tokio::test]
    async fn test_load_manifest_empty_file() {
        // 测试场景：空文件报清单错误
        let file = NamedTempFile::new().unwrap();
        let err = RuleMatcher::load_manifest(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("为空"));
    }

    #[tokio::test]
    async fn test_load_manifest_invalid_json() {
        // 测试场景：JSON非法报清单错误
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = RuleMatcher::load_manifest(file.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }

    #[tokio::test]
    async fn test_load_manifest_valid_file() {
        // 测试场景：合法清单正常解析，缺失字段按零值处理
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"totalRules":2,"rules":[{"name":"R1","isDefault":false,"tags":["a"]}]}"#,
        )
        .unwrap();

        let input = RuleMatcher::load_manifest(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(input.total_rules, 2);
        assert_eq!(input.processed_rules, 0);
        assert_eq!(input.rules.len(), 1);
        assert_eq!(input.rules[0].name, "R1");
    }
}
