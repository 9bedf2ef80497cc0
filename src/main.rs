use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use proxy_core_ping::api;
use proxy_core_ping::check::{ProbeOutcome, ProbeResult};
use proxy_core_ping::config::Config;
use proxy_core_ping::engine::BuiltinEngine;
use proxy_core_ping::lifecycle;
use proxy_core_ping::ui::ProgressTracker;
use std::path::Path;

/// 代理引擎控制与延迟探测工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 配置文件路径
    #[arg(short = 'f', long, default_value = "config/config.yaml")]
    config: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 详细输出
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动长期运行实例，Ctrl-C 后停止
    Run {
        /// 引擎配置（文件路径或内联 JSON）
        #[arg(short = 'c', long)]
        core_config: String,

        /// 资源目录
        #[arg(short = 'd', long)]
        data_dir: Option<String>,

        /// 内存上限（字节），大于 0 时开启强制释放
        #[arg(long)]
        max_memory: Option<i64>,
    },

    /// 显示引擎版本
    Version,

    /// 经专用实例测量延迟
    Ping {
        /// 一个或多个引擎配置
        #[arg(required = true)]
        core_configs: Vec<String>,

        /// 资源目录
        #[arg(short = 'd', long)]
        data_dir: Option<String>,

        /// 超时时间（秒）
        #[arg(short = 't', long)]
        timeout: Option<u64>,

        /// 测试地址
        #[arg(short = 'u', long)]
        url: Option<String>,

        /// 是否显示进度条
        #[arg(long)]
        progress: Option<bool>,
    },

    /// 分配空闲端口
    FreePorts {
        #[arg(default_value_t = 1)]
        count: i32,
    },

    /// 规范化 UUID
    Uuid {
        text: String,

        /// 把任意短文本映射为 UUID
        #[arg(long)]
        derive: bool,
    },
}

fn load_config(path: &str) -> Config {
    if !Path::new(path).exists() {
        log::debug!("配置文件不存在，使用默认配置: {}", path);
        return Config::default();
    }

    match Config::load_from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️  配置文件加载失败: {}，使用默认配置", e);
            Config::default()
        }
    }
}

fn describe(result: &ProbeResult) -> String {
    match result.outcome {
        ProbeOutcome::Measured(ms) if result.diagnostic.is_empty() => format!("✅ {}ms", ms),
        ProbeOutcome::Measured(ms) => format!("✅ {}ms (部分失败: {})", ms, result.diagnostic),
        ProbeOutcome::TimedOut => format!("❌ 超时 ({})", result.diagnostic),
        ProbeOutcome::SetupFailed => format!("❌ 启动失败 ({})", result.diagnostic),
    }
}

fn run_ping(config: &Config, core_configs: &[String]) -> Result<()> {
    config.validate()?;

    let tracker = ProgressTracker::new(config, core_configs.len() as u64);
    let engine = BuiltinEngine::new();

    for core_config in core_configs {
        let result = api::block_on(lifecycle::ping(
            &engine,
            &config.data_dir,
            core_config,
            config.get_timeout_duration(),
            &config.test_url,
        ));
        tracker.record(core_config, &result);
        tracker.println(format!("{}: {}  [{}]", core_config, describe(&result), result));
    }

    tracker.finalize();

    if core_configs.len() > 1 {
        let stats = tracker.get_stats();
        println!(
            "可用: {}/{} ({:.1}%)",
            stats.reachable,
            stats.total,
            stats.success_rate()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 设置日志级别
    unsafe {
        if args.verbose {
            std::env::set_var("RUST_LOG", "debug");
        } else {
            std::env::set_var("RUST_LOG", &args.log_level);
        }
    }
    env_logger::init();

    let mut config = load_config(&args.config);

    match args.command {
        Command::Run {
            core_config,
            data_dir,
            max_memory,
        } => {
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if let Some(max_memory) = max_memory {
                config.max_memory = max_memory;
            }

            let err = api::run(&config.data_dir, &core_config, config.max_memory);
            if !err.is_empty() {
                return Err(anyhow!(err));
            }
            println!("🚀 实例已启动 (v{})，按 Ctrl-C 停止", api::version());

            api::block_on(tokio::signal::ctrl_c())?;

            let err = api::stop();
            if !err.is_empty() {
                return Err(anyhow!(err));
            }
            println!("✅ 实例已停止");
        }
        Command::Version => println!("{}", api::version()),
        Command::Ping {
            core_configs,
            data_dir,
            timeout,
            url,
            progress,
        } => {
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if let Some(timeout) = timeout {
                config.timeout = timeout;
            }
            if let Some(url) = url {
                config.test_url = url;
            }
            if let Some(progress) = progress {
                config.print_progress = progress;
            }
            run_ping(&config, &core_configs)?;
        }
        Command::FreePorts { count } => {
            let ports = api::free_ports(count);
            if ports.is_empty() {
                return Err(anyhow!("failed to allocate {} free ports", count));
            }
            println!("{}", ports);
        }
        Command::Uuid { text, derive } => {
            if derive {
                println!("{}", api::derive_uuid(&text));
            } else {
                println!("{}", api::custom_uuid(&text));
            }
        }
    }

    Ok(())
}
