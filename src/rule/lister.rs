//! 规则列举阶段
//! 分页拉取远程规则，按标签关键字过滤并投影为精简记录

use tracing::{info, warn};

use super::extract::RuleFieldExtractor;
use super::model::PaginatedResult;
use crate::client::SecurityRuleApi;
use crate::config::PaginationConfig;
use crate::error::{TagSyncError, TsResult};
use crate::output::{OUTPUT_DIR, ResultWriter};

/// 规则列举器
pub struct RuleLister;

impl RuleLister {
    /// 执行完整列举流程（分页拉取 + 结果落盘）
    /// 落盘失败只告警，不中断流程
    pub async fn run(
        api: &dyn SecurityRuleApi,
        config: &PaginationConfig,
    ) -> TsResult<PaginatedResult> {
        let result = Self::paginate(api, config).await?;

        if let Err(e) = ResultWriter::save(&result, "ListRulesResult", OUTPUT_DIR).await {
            warn!("列举结果落盘失败：{}", e);
        }

        Ok(result)
    }

    /// 分页拉取循环
    /// 终止条件：空页 / 短页（返回条数小于页大小）/ 达到最大页数，先到先停
    pub async fn paginate(
        api: &dyn SecurityRuleApi,
        config: &PaginationConfig,
    ) -> TsResult<PaginatedResult> {
        let mut result = PaginatedResult::default();
        let mut page_number: i64 = 0;
        // 命中过滤关键字的规则计数
        let mut filtered_counter: usize = 0;

        loop {
            info!(
                "拉取第 {} 页（每页 {} 条）...",
                page_number + 1,
                config.page_size
            );

            let response = api
                .list_rules(config.page_size, page_number)
                .await
                .map_err(|e| TagSyncError::ListError {
                    page: page_number,
                    message: e.to_string(),
                })?;

            let data = response.data;
            if data.is_empty() {
                info!("没有更多数据，停止分页");
                break;
            }

            // 逐条处理：过滤 + 投影（单条解析失败仅告警跳过）
            let page_total = data.len();
            for rule in &data {
                let rule_tags = RuleFieldExtractor::tags(rule);
                if !RuleFieldExtractor::matches_tag_filters(&rule_tags, &config.tag_filters) {
                    continue;
                }

                match RuleFieldExtractor::simplified(rule) {
                    Ok(simplified) => {
                        result.rules.push(simplified);
                        filtered_counter += 1;
                    }
                    Err(e) => {
                        warn!("第 {} 页存在无法解析的规则，已跳过：{}", page_number + 1, e);
                    }
                }
            }

            result.total_rules += page_total;
            info!("第 {} 页拉取到 {} 条规则", page_number + 1, page_total);

            // 短页即最后一页
            if (page_total as i64) < config.page_size {
                info!("已到最后一页（返回条数小于页大小）");
                break;
            }

            page_number += 1;
            result.total_pages += 1;

            // 页数上限检查
            if config.max_pages > 0 && page_number >= config.max_pages {
                info!("达到最大页数限制（{}），停止分页", config.max_pages);
                break;
            }
        }

        // 配置了过滤关键字时，总数按命中数上报
        if !config.tag_filters.is_empty() {
            result.total_rules = filtered_counter;
        }

        Ok(result)
    }
}
