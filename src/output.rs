//! 结果持久化模块
//! 将各阶段结果以带时间戳的JSON文件写入输出目录

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::debug;

use crate::error::TsResult;

/// 默认输出目录
pub const OUTPUT_DIR: &str = "output";

/// 结果写盘工具
pub struct ResultWriter;

impl ResultWriter {
    /// 生成带时间戳的文件名：<时间戳>_<前缀>.<扩展名>
    pub fn timestamped_filename(prefix: &str, extension: &str) -> String {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        format!("{}_{}.{}", timestamp, prefix, extension)
    }

    /// 序列化结果并写入输出目录（两空格缩进的美化JSON）
    /// 输出目录不存在时自动创建
    pub async fn save<T: Serialize>(
        result: &T,
        prefix: &str,
        output_dir: &str,
    ) -> TsResult<PathBuf> {
        let filename = Self::timestamped_filename(prefix, "json");
        let path = if output_dir.is_empty() {
            PathBuf::from(filename)
        } else {
            Path::new(output_dir).join(filename)
        };

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let formatted = serde_json::to_string_pretty(result)?;
        tokio::fs::write(&path, formatted).await?;

        debug!("结果已写入：{}", path.display());
        Ok(path)
    }
}
