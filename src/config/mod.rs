use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // 引擎环境
    pub data_dir: String,
    pub max_memory: i64,

    // 探测参数
    pub test_url: String,
    /// 超时时间（秒），0 表示不限时
    pub timeout: u64,

    // 进度显示
    pub print_progress: bool,

    // 日志配置
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            max_memory: 0,
            test_url: "https://www.google.com/generate_204".to_string(),
            timeout: 5,
            print_progress: true,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get_timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout)
    }

    /// 测试地址必须是 http/https 的绝对 URL
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.test_url)
            .map_err(|e| anyhow!("invalid test url {}: {}", self.test_url, e))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(anyhow!("unsupported test url scheme: {}", scheme)),
        }
    }
}
