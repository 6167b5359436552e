//! 规则模块：列举、匹配、打标三阶段核心逻辑与数据模型
pub mod model;
pub mod extract;
pub mod lister;
pub mod matcher;
pub mod tagger;

// 导出核心接口
pub use self::model::{
    SimplifiedRule, PaginatedResult, InputRule, InputData, MatchedRule, MatchResult,
    TaggingResult, BatchTaggingResult,
};
pub use self::extract::RuleFieldExtractor;
pub use self::lister::RuleLister;
pub use self::matcher::RuleMatcher;
pub use self::tagger::RuleTagger;
