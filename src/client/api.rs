//! Datadog 安全监控规则API客户端
//! 凭证与站点按值传入构造函数，不读取也不回写进程环境变量

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::model::{ListRulesResponse, RuleUpdatePayload};
use crate::config::ApiConfig;
use crate::error::{TagSyncError, TsResult};

/// 规则接口路径
const RULES_PATH: &str = "/api/v2/security_monitoring/rules";

/// 安全监控规则API操作集合
/// 以特质抽象调用面，便于测试时注入假实现
#[async_trait]
pub trait SecurityRuleApi: Send + Sync {
    /// 按页号拉取一页规则
    async fn list_rules(&self, page_size: i64, page_number: i64) -> TsResult<ListRulesResponse>;

    /// 按ID获取单条规则（原始JSON）
    async fn get_rule(&self, rule_id: &str) -> TsResult<Value>;

    /// 更新单条规则的标签（仅提交 tags 字段）
    async fn update_rule_tags(&self, rule_id: &str, tags: &[String]) -> TsResult<Value>;
}

/// 基于 reqwest 的生产实现
#[derive(Debug, Clone)]
pub struct RuleApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
    app_key: String,
}

impl RuleApiClient {
    /// 创建客户端（带超时配置）
    pub fn new(config: ApiConfig) -> TsResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .build()?;
        let base_url = Url::parse(&format!("https://api.{}", config.site))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            app_key: config.app_key,
        })
    }

    /// 拼接接口完整URL
    fn endpoint(&self, path: &str) -> TsResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// 发送请求并统一处理错误
    /// label 为调用点显式标注的接口名，用于日志与错误信息
    async fn send(
        &self,
        label: &str,
        request: reqwest::RequestBuilder,
    ) -> TsResult<reqwest::Response> {
        let response = request
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key)
            .header("User-Agent", concat!("rstagsync/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| {
                error!("调用 [{}] 网络请求失败：{}", label, e);
                TagSyncError::HttpError(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("调用 [{}] 返回状态码 {}，响应体：{}", label, status, body);
            return Err(TagSyncError::ApiError {
                label: label.to_string(),
                message: format!("状态码 {}，响应：{}", status, body),
            });
        }

        debug!("调用 [{}] 成功，状态码 {}", label, status);
        Ok(response)
    }
}

#[async_trait]
impl SecurityRuleApi for RuleApiClient {
    async fn list_rules(&self, page_size: i64, page_number: i64) -> TsResult<ListRulesResponse> {
        let url = self.endpoint(RULES_PATH)?;
        let request = self.client.get(url).query(&[
            ("page[size]", page_size.to_string()),
            ("page[number]", page_number.to_string()),
        ]);

        let response = self.send("ListSecurityMonitoringRules", request).await?;
        Ok(response.json::<ListRulesResponse>().await?)
    }

    async fn get_rule(&self, rule_id: &str) -> TsResult<Value> {
        let url = self.endpoint(&format!("{}/{}", RULES_PATH, rule_id))?;

        let response = self
            .send("GetSecurityMonitoringRule", self.client.get(url))
            .await?;
        Ok(response.json::<Value>().await?)
    }

    async fn update_rule_tags(&self, rule_id: &str, tags: &[String]) -> TsResult<Value> {
        let url = self.endpoint(&format!("{}/{}", RULES_PATH, rule_id))?;
        let payload = RuleUpdatePayload {
            tags: tags.to_vec(),
        };

        let response = self
            .send(
                "UpdateSecurityMonitoringRule",
                self.client.put(url).json(&payload),
            )
            .await?;
        Ok(response.json::<Value>().await?)
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        // 测试场景：站点域名拼接出规则接口完整URL
        let client = RuleApiClient::new(ApiConfig {
            site: "datadoghq.com".to_string(),
            api_key: "k".to_string(),
            app_key: "a".to_string(),
            http_timeout: 30,
        })
        .unwrap();

        let url = client.endpoint(RULES_PATH).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.datadoghq.com/api/v2/security_monitoring/rules"
        );

        let url = client
            .endpoint(&format!("{}/{}", RULES_PATH, "abc-123"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.datadoghq.com/api/v2/security_monitoring/rules/abc-123"
        );
    }

    #[test]
    fn test_update_payload_shape() {
        // 测试场景：更新载荷只序列化 tags 字段
        let payload = RuleUpdatePayload {
            tags: vec!["env:prod".to_string()],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({ "tags": ["env:prod"] }));
    }
}
