//! rstagsync - Datadog 安全监控规则标签同步工具

// 导出全局错误类型
pub use self::error::{TagSyncError, TsResult};

// 导出配置模块
pub use self::config::{ApiConfig, PaginationConfig, SyncConfig, TaggingConfig};

// 导出API客户端核心接口
pub use self::client::{ListRulesResponse, RuleApiClient, RuleUpdatePayload, SecurityRuleApi};

// 导出规则模块核心接口
pub use self::rule::{
    SimplifiedRule, PaginatedResult, InputRule, InputData, MatchedRule, MatchResult,
    TaggingResult, BatchTaggingResult,
    RuleFieldExtractor, RuleLister, RuleMatcher, RuleTagger,
};

// 导出结果持久化接口
pub use self::output::{OUTPUT_DIR, ResultWriter};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod client;
pub mod rule;
pub mod output;
