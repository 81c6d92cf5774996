// secure_share_client/src/lib.rs

//! `secure_share_client` 是 `SecureShare` 文件分享应用的实时客户端核心。
//!
//! 它负责与服务端的 WebSocket 实时通道交互：维持一条自动重连的长连接、
//! 在连接上收发类型化消息、把入站消息分发给内建组件与外部订阅者，
//! 并维护由服务端广播驱动的展示状态 (在场指示器、在线状态、通知)。
//!
//! 主要模块：
//! - [`ws_client`]: 连接管理器 ([`RealtimeClientService`]) 与连接状态机。
//! - [`dispatch`]: 入站消息分发注册表 (订阅/撤销/内建处理)。
//! - [`activity`]: 文件在场活动与用户在线状态跟踪，含可见度跨阈值判定。
//! - [`notify`]: 通知展示器 (自动消失、幂等撤销、降级提示)。
//! - [`legacy`]: 遗留通知通道监听器 (固定间隔重试)。
//! - [`reconnect`]: 主通道的指数退避重连策略。
//! - [`config`]: 配置结构体与加载/保存。
//! - [`token`]: 会话令牌存储抽象。
//!
//! 消息类型与线上编解码定义在 `realtime_ws_utils`，
//! Payload 结构体定义在 `common_models`。

pub mod activity;
pub mod config;
pub mod dispatch;
pub mod legacy;
pub mod notify;
pub mod reconnect;
pub mod token;
pub mod ws_client;

pub use activity::{ActivityIndicator, ActivityTracker, VisibilityTransition};
pub use config::{RealtimeConfig, load_config, save_config};
pub use dispatch::{DispatchRegistry, MessageHandler, Subscription};
pub use legacy::LegacyNotificationListener;
pub use notify::{Notice, NotificationPresenter};
pub use reconnect::ReconnectPolicy;
pub use token::{InMemoryTokenStore, TokenStore};
pub use ws_client::{ConnectionState, RealtimeClientService};

// 线上消息类型在公共 API 中直接复用底层定义
pub use realtime_ws_utils::message::{InboundMessage, MessageKind, OutboundMessage};
