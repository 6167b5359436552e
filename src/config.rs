//! 全局配置管理,从环境变量读取所有可配置项
//! 支持可选 .env 文件（仅对尚未设置的变量生效）

use std::env;

use tracing::info;

use crate::error::{TagSyncError, TsResult};

/// 默认站点域名
pub const DEFAULT_SITE: &str = "datadoghq.com";

/// 远程API访问配置
/// 按值传入客户端构造函数，不回写进程环境变量
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // 站点域名（如 datadoghq.com）
    pub site: String,
    // API Key
    pub api_key: String,
    // Application Key
    pub app_key: String,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
}

/// 分页拉取配置
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    // 每页规则数
    pub page_size: i64,
    // 最大页数（0 表示不限制）
    pub max_pages: i64,
    // 可选标签过滤关键字（使用处大小写不敏感）
    pub tag_filters: Vec<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 0,
            tag_filters: Vec::new(),
        }
    }
}

/// 规则打标配置
#[derive(Debug, Clone)]
pub struct TaggingConfig {
    // true 时仅模拟打标，不发起实际更新调用
    pub dry_run: bool,
    // true 时覆盖现有标签；false 时在现有标签上追加
    pub overwrite_tags: bool,
    // 任何标签写入都要排除的标签（如系统标签）
    pub excluded_tags: Vec<String>,
    // 打标阶段最大并发API调用数
    pub max_concurrency: usize,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            overwrite_tags: false,
            excluded_tags: Vec::new(),
            max_concurrency: 5,
        }
    }
}

/// 全局配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api: ApiConfig,
    // 规则清单文件路径
    pub input_rule_filename: String,
    pub pagination: PaginationConfig,
    pub tagging: TaggingConfig,
}

impl SyncConfig {
    /// 从环境变量加载配置（默认尝试加载 ./.env）
    pub fn from_env() -> TsResult<Self> {
        Self::from_env_with(".env")
    }

    /// 从环境变量加载配置，.env 文件路径可指定
    /// 校验必填凭证，缺失时返回配置错误
    pub fn from_env_with(env_file: &str) -> TsResult<Self> {
        // 1. 尝试加载 .env 文件（可选，已设置的环境变量不会被覆盖）
        if let Err(e) = dotenvy::from_filename(env_file) {
            info!("未加载 {} 文件：{}", env_file, e);
        }

        // 2. 逐项解析（解析失败回退默认值）
        let pagination = PaginationConfig {
            page_size: parse_i64(env::var("PAGE_SIZE").ok(), 100),
            max_pages: parse_i64(env::var("MAX_PAGES").ok(), 0),
            tag_filters: parse_list(env::var("TAG_FILTERS").ok()),
        };

        let tagging = TaggingConfig {
            dry_run: parse_bool(env::var("DRYRUN").ok(), false),
            overwrite_tags: parse_bool(env::var("OVERWRITE_TAGS").ok(), false),
            excluded_tags: parse_list(env::var("INCLUDED_TAGS").ok()),
            max_concurrency: parse_concurrency(env::var("MAX_CONCURRENCY").ok(), 5),
        };

        let input_rule_filename = env::var("INPUT")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "input.json".to_string());

        // 3. 校验必填凭证
        let api_key = env::var("DD_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            return Err(TagSyncError::ConfigError(
                "缺少必填环境变量 DD_API_KEY".to_string(),
            ));
        }
        let app_key = env::var("DD_APP_KEY").unwrap_or_default();
        if app_key.is_empty() {
            return Err(TagSyncError::ConfigError(
                "缺少必填环境变量 DD_APP_KEY".to_string(),
            ));
        }

        // 4. 站点未设置时回退默认值
        let mut site = env::var("DD_SITE").unwrap_or_default();
        if site.is_empty() {
            site = DEFAULT_SITE.to_string();
            info!("DD_SITE 未设置，使用默认站点：{}", site);
        }

        Ok(Self {
            api: ApiConfig {
                site,
                api_key,
                app_key,
                http_timeout: parse_u64(env::var("HTTP_TIMEOUT").ok(), 30),
            },
            input_rule_filename,
            pagination,
            tagging,
        })
    }
}

// ===== 环境变量解析辅助 =====

/// 解析整数，值缺失或非法时返回默认值
fn parse_i64(raw: Option<String>, default: i64) -> i64 {
    raw.filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}

/// 解析无符号整数，值缺失或非法时返回默认值
fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// 解析并发数，仅接受正整数，否则返回默认值
fn parse_concurrency(raw: Option<String>, default: usize) -> usize {
    raw.filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// 解析布尔值（兼容 1/0、t/f、true/false，大小写不敏感）
fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim) {
        Some("1") => true,
        Some("0") => false,
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "t" => true,
            "false" | "f" => false,
            _ => default,
        },
        None => default,
    }
}

/// 解析逗号分隔列表，逐项去除空白并丢弃空项
fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i64_with_default() {
        // 测试场景：缺失/非法值回退默认，合法值正常解析
        assert_eq!(parse_i64(None, 100), 100);
        assert_eq!(parse_i64(Some("".to_string()), 100), 100);
        assert_eq!(parse_i64(Some("abc".to_string()), 100), 100);
        assert_eq!(parse_i64(Some("25".to_string()), 100), 25);
    }

    #[test]
    fn test_parse_concurrency_rejects_zero() {
        // 测试场景：0 和负数不是合法并发数，回退默认值
        assert_eq!(parse_concurrency(Some("0".to_string()), 5), 5);
        assert_eq!(parse_concurrency(Some("-3".to_string()), 5), 5);
        assert_eq!(parse_concurrency(Some("8".to_string()), 5), 8);
    }

    #[test]
    fn test_parse_bool_variants() {
        // 测试场景：兼容多种布尔写法，非法值回退默认
        assert!(parse_bool(Some("true".to_string()), false));
        assert!(parse_bool(Some("TRUE".to_string()), false));
        assert!(parse_bool(Some("1".to_string()), false));
        assert!(!parse_bool(Some("f".to_string()), true));
        assert!(!parse_bool(Some("0".to_string()), true));
        assert!(parse_bool(Some("maybe".to_string()), true));
        assert!(!parse_bool(None, false));
    }

    #[test]
    fn test_parse_list_trims_and_drops_empty() {
        // 测试场景：逗号分隔列表去空白、丢空项
        assert_eq!(
            parse_list(Some(" a , b ,, c ".to_string())),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(parse_list(Some("  ,  ".to_string())).is_empty());
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn test_default_configs() {
        // 测试场景：默认值与约定一致
        let p = PaginationConfig::default();
        assert_eq!(p.page_size, 100);
        assert_eq!(p.max_pages, 0);
        assert!(p.tag_filters.is_empty());

        let t = TaggingConfig::default();
        assert!(!t.dry_run);
        assert!(!t.overwrite_tags);
        assert_eq!(t.max_concurrency, 5);
    }
}
