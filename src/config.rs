//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//! Environment overrides: HOST, PORT, DATABASE_URL / 环境变量覆盖

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration / 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Natural language query configuration / 自然语言查询配置
    #[serde(default)]
    pub query: QueryConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Database configuration / 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
    /// Database file path (relative to data_dir) / 数据库文件路径
    pub db_file: String,
    /// Pool size / 连接池大小
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Query configuration / 查询配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Longest accepted natural language query, in characters / 查询最大长度
    pub max_query_length: usize,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            db_file: "strings.db".to_string(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_query_length: 512,
        }
    }
}

impl AppConfig {
    /// Get the full database URL / 获取完整的数据库URL
    pub fn get_database_url(&self) -> String {
        let db_path = Path::new(&self.database.data_dir).join(&self.database.db_file);
        format!("sqlite:{}?mode=rwc", db_path.to_string_lossy())
    }

    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.database.data_dir)
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply HOST / PORT overrides / 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::var("HOST").ok(), std::env::var("PORT").ok());
    }

    fn apply_overrides(&mut self, host: Option<String>, port: Option<String>) {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = port {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {:?}", port),
            }
        }
    }
}

/// Get the default config file path / 获取配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}
