// secure_share_client/src/ws_client/mod.rs

//! WebSocket 客户端连接管理模块。
//!
//! 本模块 (`ws_client`) 及其子模块 (`service`) 提供与实时服务端
//! 建立和维持 WebSocket 连接的核心逻辑，包括：
//! - **连接生命周期管理**: 显式的 `connect()` / `disconnect()`，
//!   自动重连与退避，状态机 (见 [`ConnectionState`])。
//! - **消息收发**: 连接建立后发送认证消息、周期性保活 Ping、
//!   将入站帧解码并交给分发注册表。
//! - **活动发布**: 本地文件的查看/编辑活动作为出站 `file_activity` 帧发布。

use serde::Serialize;
use std::fmt;

pub mod service;

pub use service::RealtimeClientService;

/// 连接管理器的状态机。
///
/// 状态迁移：
/// - `Closed` → `Connecting`: 显式调用 `connect()`。
/// - `Connecting` → `Open`: 握手成功。
/// - `Connecting` → `Reconnecting` / `Unavailable`: 握手失败，
///   退避策略未耗尽 / 已耗尽。
/// - `Open` → `Closed`: 连接结束 (意外断开或显式 `disconnect()`)。
/// - 意外断开后 `Closed` → `Reconnecting` → `Connecting`: 自动重连。
/// - `Unavailable` 是终态：不再自动重连，直到再次显式调用 `connect()`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// 正在建立连接 (握手进行中)。
    Connecting,
    /// 连接已建立且可收发消息。
    Open,
    /// 无活动连接。实例的初始状态，也是断开后的中间状态。
    Closed,
    /// 连接已断开，正在等待退避延迟后重连。
    Reconnecting,
    /// 重连尝试已耗尽的终态。需要显式 `connect()` 才能恢复。
    Unavailable,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Unavailable => "unavailable",
        };
        write!(f, "{}", label)
    }
}
