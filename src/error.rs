//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum TagSyncError {
    // 配置相关错误
    #[error("配置错误：{0}")]
    ConfigError(String),

    // 规则列举相关错误
    #[error("拉取第{page}页规则失败：{message}")]
    ListError { page: i64, message: String },

    // 清单加载/匹配相关错误
    #[error("规则清单加载失败：{0}")]
    ManifestError(String),

    // 打标相关错误
    #[error("规则打标失败：{0}")]
    TagError(String),

    // 远程API相关错误
    #[error("API调用 [{label}] 失败：{message}")]
    ApiError { label: String, message: String },

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

// 全局Result类型
pub type TsResult<T> = Result<T, TagSyncError>;
