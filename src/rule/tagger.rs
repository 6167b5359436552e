//! 规则打标阶段
//! 对每条匹配规则：拉取现有标签 -> 按策略合并/覆盖 -> 提交更新，
//! 单条失败只记录不中断，汇总为批量结果

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::extract::RuleFieldExtractor;
use super::model::{BatchTaggingResult, MatchResult, MatchedRule, TaggingResult};
use crate::client::SecurityRuleApi;
use crate::config::TaggingConfig;
use crate::error::TsResult;
use crate::output::{OUTPUT_DIR, ResultWriter};

/// 规则打标器
pub struct RuleTagger;

impl RuleTagger {
    /// 执行完整打标流程（批量打标 + 结果落盘 + 汇总输出）
    pub async fn run(
        api: &Arc<dyn SecurityRuleApi>,
        match_result: &MatchResult,
        config: &TaggingConfig,
    ) -> TsResult<BatchTaggingResult> {
        info!("开始规则打标流程...");

        let batch_result = Self::tag_rules(api, match_result, config).await;

        // 落盘失败只告警，不中断流程
        if let Err(e) = ResultWriter::save(&batch_result, "TaggingResult", OUTPUT_DIR).await {
            warn!("打标结果落盘失败：{}", e);
        }

        println!("{}", Self::format_tagging_summary(&batch_result, config));

        Ok(batch_result)
    }

    /// 批量打标
    /// 无期望标签的规则直接跳过；其余在信号量限宽的并发池中执行，
    /// 结果按匹配顺序回填，计数在池清空后聚合
    pub async fn tag_rules(
        api: &Arc<dyn SecurityRuleApi>,
        match_result: &MatchResult,
        config: &TaggingConfig,
    ) -> BatchTaggingResult {
        let mut batch_result = BatchTaggingResult {
            total_rules: match_result.matched_rules.len(),
            ..Default::default()
        };

        if config.dry_run {
            println!("🔍 试运行模式 - 不会发起实际变更");
        }
        info!(
            "开始为 {} 条规则打标（并发上限 {}）...",
            batch_result.total_rules, config.max_concurrency
        );

        // 1. 分流：无期望标签的规则记入跳过名单，不发起任何远程调用
        let mut attempted: Vec<(usize, MatchedRule)> = Vec::new();
        for (i, matched) in match_result.matched_rules.iter().enumerate() {
            if matched.tags.is_empty() {
                info!("  ⏭️  规则 {} 无期望标签，跳过", matched.id);
                batch_result.skipped_rules.push(matched.id.clone());
            } else {
                attempted.push((i, matched.clone()));
            }
        }

        // 2. 信号量限宽并发执行，保留提交顺序号用于回填
        let total = batch_result.total_rules;
        let attempted_count = attempted.len();
        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        let mut join_set = JoinSet::new();

        for (order, (i, matched)) in attempted.into_iter().enumerate() {
            let api = Arc::clone(api);
            let config = config.clone();
            let semaphore = Arc::clone(&semaphore);

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        // 信号量只在本函数内创建，不会被关闭；兜底记为失败
                        return (
                            order,
                            TaggingResult::failure(&matched.id, &matched.name, "并发调度失败".to_string()),
                        );
                    }
                };

                info!(
                    "处理规则 {}/{}: {} (ID: {})",
                    i + 1,
                    total,
                    matched.name,
                    matched.id
                );
                let result = Self::tag_single_rule(api.as_ref(), &matched, &config).await;
                (order, result)
            });
        }

        let mut slots: Vec<Option<TaggingResult>> = vec![None; attempted_count];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((order, result)) => slots[order] = Some(result),
                Err(e) => warn!("打标任务异常退出：{}", e),
            }
        }

        // 3. 按原顺序聚合计数
        for result in slots.into_iter().flatten() {
            if result.success {
                batch_result.successful_tags += 1;
                if config.dry_run {
                    info!("  ✅ 试运行通过，规则 {} 将写入标签：{:?}", result.rule_id, result.new_tags);
                } else {
                    info!("  ✅ 规则 {} 打标成功：{:?}", result.rule_id, result.new_tags);
                }
            } else {
                batch_result.failed_tags += 1;
                warn!(
                    "  ❌ 规则 {} 打标失败：{}",
                    result.rule_id,
                    result.error.as_deref().unwrap_or("未知错误")
                );
            }
            batch_result.results.push(result);
        }

        batch_result
    }

    /// 为单条规则打标
    /// 拉取失败直接记失败且不尝试更新；试运行只计算不提交
    pub async fn tag_single_rule(
        api: &dyn SecurityRuleApi,
        matched: &MatchedRule,
        config: &TaggingConfig,
    ) -> TaggingResult {
        // 1. 拉取现有标签
        let existing_tags = match Self::fetch_existing_tags(api, &matched.id).await {
            Ok(tags) => tags,
            Err(e) => {
                return TaggingResult::failure(
                    &matched.id,
                    &matched.name,
                    format!("获取现有标签失败：{}", e),
                );
            }
        };

        // 2. 按策略计算新标签集
        let new_tags = Self::merge_tags(&existing_tags, &matched.tags, config);

        let mut result = TaggingResult {
            rule_id: matched.id.clone(),
            rule_name: matched.name.clone(),
            success: false,
            old_tags: existing_tags,
            new_tags: new_tags.clone(),
            error: None,
        };

        // 3. 试运行：不发起更新调用，直接记成功
        if config.dry_run {
            result.success = true;
            return result;
        }

        // 4. 提交更新（仅 tags 字段）
        match api.update_rule_tags(&matched.id, &new_tags).await {
            Ok(_) => result.success = true,
            Err(e) => result.error = Some(format!("更新规则失败：{}", e)),
        }

        result
    }

    /// 获取规则现有标签
    async fn fetch_existing_tags(
        api: &dyn SecurityRuleApi,
        rule_id: &str,
    ) -> TsResult<Vec<String>> {
        let rule = api.get_rule(rule_id).await?;
        Ok(RuleFieldExtractor::tags(&rule))
    }

    /// 按配置策略合并标签
    /// 覆盖模式：期望标签去掉排除项，现有标签全部丢弃；
    /// 追加模式：现有标签去重打底，再补充未出现且未被排除的期望标签（保持首见顺序）
    pub fn merge_tags(
        existing_tags: &[String],
        desired_tags: &[String],
        config: &TaggingConfig,
    ) -> Vec<String> {
        if config.overwrite_tags {
            return desired_tags
                .iter()
                .filter(|tag| !config.excluded_tags.contains(tag))
                .cloned()
                .collect();
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut merged = Vec::new();

        for tag in existing_tags {
            if seen.insert(tag.as_str()) {
                merged.push(tag.clone());
            }
        }

        for tag in desired_tags {
            if !config.excluded_tags.contains(tag) && seen.insert(tag.as_str()) {
                merged.push(tag.clone());
            }
        }

        merged
    }

    /// 格式化打标汇总
    pub fn format_tagging_summary(
        batch_result: &BatchTaggingResult,
        config: &TaggingConfig,
    ) -> String {
        let mode = if config.dry_run { "DRY RUN" } else { "LIVE" };

        let success_rate = if batch_result.total_rules > 0 {
            batch_result.successful_tags as f64 / batch_result.total_rules as f64 * 100.0
        } else {
            0.0
        };

        format!(
            "\n=== 规则打标汇总 ({}) ===\n处理规则总数: {}\n打标成功: {}\n打标失败: {}\n跳过规则: {}\n成功率: {:.2}%\n",
            mode,
            batch_result.total_rules,
            batch_result.successful_tags,
            batch_result.failed_tags,
            batch_result.skipped_rules.len(),
            success_rate,
        )
    }
}
