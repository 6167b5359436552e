//! rstagsync 命令行入口
//! 执行流程：
//! 1. 解析命令行参数并初始化日志
//! 2. 加载配置（环境变量 + 可选 .env 文件）
//! 3. 分页列举远程安全监控规则
//! 4. 与本地规则清单匹配
//! 5. 批量打标并输出汇总

use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rstagsync::{RuleApiClient, RuleLister, RuleMatcher, RuleTagger, SecurityRuleApi, SyncConfig};

/// 命令行参数（均为对环境变量配置的覆盖项）
#[derive(Debug, Parser)]
#[command(name = "rstagsync", version, about = "Datadog 安全监控规则标签同步工具")]
struct Cli {
    /// 规则清单文件路径（覆盖 INPUT）
    #[arg(long)]
    input: Option<String>,

    /// 试运行模式，只计算不提交（覆盖 DRYRUN）
    #[arg(long)]
    dry_run: bool,

    /// .env 文件路径
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// 输出调试日志
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    // ========== 1. 命令行解析与日志初始化 ==========
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // ========== 2. 加载配置 ==========
    let mut config = match SyncConfig::from_env_with(&cli.env_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置错误：{}", e);
            process::exit(1);
        }
    };

    // 应用命令行覆盖项
    if let Some(input) = cli.input {
        config.input_rule_filename = input;
    }
    if cli.dry_run {
        config.tagging.dry_run = true;
    }

    // ========== 3. 构建API客户端 ==========
    // 凭证与站点按值传入，不回写进程环境变量
    let api: Arc<dyn SecurityRuleApi> = match RuleApiClient::new(config.api.clone()) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            eprintln!("配置错误：{}", e);
            process::exit(1);
        }
    };

    // ========== 4. 分页列举规则 ==========
    println!("开始分页拉取安全监控规则...");
    let list_result = match RuleLister::run(api.as_ref(), &config.pagination).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("列举错误：{}", e);
            process::exit(1);
        }
    };

    // ========== 5. 与清单匹配 ==========
    let match_result = match RuleMatcher::run(&config.input_rule_filename, &list_result).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("规则匹配错误：{}", e);
            process::exit(1);
        }
    };

    // ========== 6. 批量打标 ==========
    println!("\n=== 开始规则打标 ===");
    let tagging_result = match RuleTagger::run(&api, &match_result, &config.tagging).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("规则打标错误：{}", e);
            process::exit(1);
        }
    };

    println!(
        "✅ {} 条规则打标流程完成！详情见 {} 目录。",
        tagging_result.successful_tags,
        rstagsync::OUTPUT_DIR
    );
}
