// secure_share_client/src/config.rs

//! `SecureShare` 实时客户端配置管理模块。
//!
//! 本模块负责定义实时客户端所需的核心配置参数 (`RealtimeConfig` 结构体)，
//! 提供加载、保存这些配置到持久化存储 (JSON 文件) 的功能，
//! 并处理默认配置的生成。它还包含了相关的单元测试以确保配置管理的健壮性。

use log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// 主实时通道在服务端的固定路径。
pub const SOCKET_PATH: &str = "/ws/secure-file/";

/// 遗留通知通道在服务端的固定路径。
pub const LEGACY_NOTIFICATIONS_PATH: &str = "/ws/notifications/";

/// 实时客户端配置结构体定义，对应于配置文件中的内容。
///
/// 此结构体封装了连接管理器、保活、重连退避、通知展示与遗留通道
/// 所需的各项参数。通过 `Serialize` / `Deserialize`，`RealtimeConfig`
/// 的实例可以方便地从 JSON 文件加载或保存到 JSON 文件。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RealtimeConfig {
    /// 服务端主机 (含端口)，例如 `"share.example.com"` 或 `"localhost:8000"`。
    /// WebSocket URL 由此派生，路径固定为 [`SOCKET_PATH`] / [`LEGACY_NOTIFICATIONS_PATH`]。
    pub host: String,

    /// 页面是否通过 TLS 加载。为 `true` 时使用 `wss:` 方案，否则使用 `ws:`，
    /// 与页面自身的加密状态保持一致。
    pub use_tls: bool,

    /// 应用的日志记录级别。
    /// 有效值通常包括 (但不限于): `"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`。
    pub log_level: String,

    /// 重连尝试次数上限。达到上限后连接管理器进入终态 `Unavailable`，
    /// 不再自动重连，直到外部再次显式调用 `connect()`。
    pub max_reconnect_attempts: u32,

    /// 首次重连前的基础延迟，单位毫秒。
    pub base_reconnect_delay_ms: u64,

    /// 每次重连失败后延迟的增长系数 (指数退避)。
    pub reconnect_backoff_factor: f64,

    /// 重连延迟的上限 (毫秒)。`None` 表示不设上限。
    /// 在默认的 5 次尝试内不会触及，但防止上调次数上限后延迟无界增长。
    pub max_reconnect_delay_ms: Option<u64>,

    /// 保活 Ping 的发送间隔，单位毫秒。仅在连接处于 Open 状态时发送。
    pub keepalive_interval_ms: u64,

    /// 通知的自动消失时限，单位毫秒。持久化通知 (如降级提示) 不受此限。
    pub notification_ttl_ms: u64,

    /// 遗留通知通道断开后的固定重试间隔，单位毫秒 (无退避增长、无次数上限)。
    pub legacy_retry_delay_ms: u64,

    /// 视口可见度阈值。文件条目的可见比例达到该值视为"正在查看"，
    /// 跌破该值视为结束查看。
    pub visibility_threshold: f64,
}

/// 为 `RealtimeConfig` 提供默认值实现。
///
/// 当无法从配置文件加载现有配置 (例如首次启动，或配置文件损坏/丢失时)，
/// `RealtimeConfig::default()` 将被调用以生成一套基础的、可工作的默认配置参数。
impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8000".to_string(), // 默认服务端主机 (指向本地开发服务)
            use_tls: false,                     // 本地开发默认不走 TLS
            log_level: "info".to_string(),      // 默认日志级别设置为 "info"
            max_reconnect_attempts: 5,          // 最多自动重连 5 次
            base_reconnect_delay_ms: 3000,      // 首次重连延迟 3 秒
            reconnect_backoff_factor: 1.5,      // 每次失败后延迟 ×1.5
            max_reconnect_delay_ms: Some(60_000), // 延迟上限 60 秒
            keepalive_interval_ms: 30_000,      // 每 30 秒发送一次保活 Ping
            notification_ttl_ms: 10_000,        // 通知 10 秒后自动消失
            legacy_retry_delay_ms: 5_000,       // 遗留通道固定 5 秒重试
            visibility_threshold: 0.5,          // 可见比例达到 50% 视为正在查看
        }
    }
}

impl RealtimeConfig {
    // 根据 TLS 状态选择 URL 方案
    fn scheme(&self) -> &'static str {
        if self.use_tls { "wss" } else { "ws" }
    }

    /// 派生主实时通道的完整 WebSocket URL。
    pub fn socket_url(&self) -> String {
        format!("{}://{}{}", self.scheme(), self.host, SOCKET_PATH)
    }

    /// 派生遗留通知通道的完整 WebSocket URL。
    pub fn legacy_url(&self) -> String {
        format!("{}://{}{}", self.scheme(), self.host, LEGACY_NOTIFICATIONS_PATH)
    }

    /// 基础重连延迟。
    pub fn base_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.base_reconnect_delay_ms)
    }

    /// 重连延迟上限。
    pub fn max_reconnect_delay(&self) -> Option<Duration> {
        self.max_reconnect_delay_ms.map(Duration::from_millis)
    }

    /// 保活 Ping 间隔。
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// 通知自动消失时限。
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    /// 遗留通道固定重试间隔。
    pub fn legacy_retry_delay(&self) -> Duration {
        Duration::from_millis(self.legacy_retry_delay_ms)
    }
}

/// 加载实时客户端配置。
///
/// 此函数的核心逻辑是：
/// 1. 检查给定路径上的配置文件是否存在。
/// 2. 如果存在，读取其内容并使用 `serde_json` 反序列化为 `RealtimeConfig` 实例。
/// 3. 如果不存在，创建一个包含默认值的实例，调用 [`save_config`] 将其写入
///    该路径 (以便后续启动时可以加载)，然后返回这个默认配置。
///
/// # 参数
/// * `path`: 配置文件的完整路径。
///
/// # 返回值
/// * `Result<RealtimeConfig, String>`: 成功时返回配置实例；
///   文件读取、JSON 解析或默认配置写入失败时返回描述性错误信息。
pub fn load_config(path: &Path) -> Result<RealtimeConfig, String> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("读取配置文件 '{}' 失败: {}", path.display(), e))?;
        let config: RealtimeConfig = serde_json::from_str(&content)
            .map_err(|e| format!("解析配置文件 '{}' 的内容失败: {}", path.display(), e))?;
        Ok(config)
    } else {
        info!("配置文件 '{}' 未找到，将使用默认配置参数创建新文件。", path.display());
        let default_config = RealtimeConfig::default();
        save_config(path, &default_config)?;
        Ok(default_config)
    }
}

/// 保存实时客户端配置。
///
/// 将给定的 `RealtimeConfig` 序列化为人类可读的 JSON (`to_string_pretty`)
/// 并写入指定路径。写入前会确保父目录存在，不存在时递归创建。
///
/// # 返回值
/// * `Result<(), String>`: 序列化或写入失败时返回描述性错误信息。
pub fn save_config(path: &Path, config: &RealtimeConfig) -> Result<(), String> {
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.exists() {
            fs::create_dir_all(parent_dir)
                .map_err(|e| format!("创建配置目录 '{}' 失败: {}", parent_dir.display(), e))?;
        }
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("序列化实时客户端配置到 JSON 字符串失败: {}", e))?;
    fs::write(path, content)
        .map_err(|e| format!("写入配置文件 '{}' 失败: {}", path.display(), e))?;

    info!("实时客户端配置已成功保存至: '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // 辅助函数：为每个测试生成互不冲突的临时配置文件路径
    fn temp_config_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("secure_share_client_test_{}_{}.json", name, std::process::id()))
    }

    #[test]
    /// 测试默认配置的各项参数与协议约定一致。
    fn test_default_config_values() {
        let config = RealtimeConfig::default();
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.base_reconnect_delay_ms, 3000);
        assert_eq!(config.reconnect_backoff_factor, 1.5);
        assert_eq!(config.keepalive_interval_ms, 30_000);
        assert_eq!(config.notification_ttl_ms, 10_000);
        assert_eq!(config.legacy_retry_delay_ms, 5_000);
        assert_eq!(config.visibility_threshold, 0.5);
    }

    #[test]
    /// 测试 WebSocket URL 派生：方案跟随 TLS 状态，路径为固定值。
    fn test_url_derivation_follows_tls_flag() {
        let mut config = RealtimeConfig::default();
        config.host = "share.example.com".to_string();

        config.use_tls = false;
        assert_eq!(config.socket_url(), "ws://share.example.com/ws/secure-file/");
        assert_eq!(config.legacy_url(), "ws://share.example.com/ws/notifications/");

        config.use_tls = true;
        assert_eq!(config.socket_url(), "wss://share.example.com/ws/secure-file/");
        assert_eq!(config.legacy_url(), "wss://share.example.com/ws/notifications/");
    }

    #[test]
    /// 测试配置的保存与重新加载往返，字段应保持一致。
    fn test_save_then_load_roundtrip() {
        let path = temp_config_path("roundtrip");
        let mut config = RealtimeConfig::default();
        config.host = "files.internal:9001".to_string();
        config.max_reconnect_attempts = 7;
        config.max_reconnect_delay_ms = None;

        save_config(&path, &config).expect("保存配置失败");
        let loaded = load_config(&path).expect("重新加载配置失败");
        assert_eq!(loaded.host, "files.internal:9001");
        assert_eq!(loaded.max_reconnect_attempts, 7);
        assert_eq!(loaded.max_reconnect_delay_ms, None);

        let _ = fs::remove_file(&path); // 清理临时文件
    }

    #[test]
    /// 测试配置文件缺失时自动创建默认配置文件并返回默认值。
    fn test_load_missing_file_creates_default() {
        let path = temp_config_path("missing");
        let _ = fs::remove_file(&path); // 确保起始状态下文件不存在

        let loaded = load_config(&path).expect("加载缺失配置应回退到默认值");
        assert_eq!(loaded.base_reconnect_delay_ms, RealtimeConfig::default().base_reconnect_delay_ms);
        assert!(path.exists(), "默认配置文件应已被创建");

        let _ = fs::remove_file(&path);
    }
}
