//! `realtime_ws_utils` 是一个提供 WebSocket 通信实用功能的 Rust Crate。
//! 它旨在简化 `SecureShare` 实时客户端的 WebSocket 通信实现，特别关注与
//! `common_models` 一起使用时的消息编解码 (扁平 JSON 帧，`"type"` 字段区分类型)。
//!
//! 主要模块包括：
//! - `message`: 定义消息类型标签 (`MessageKind`) 与出站/入站消息联合类型
//!   (`OutboundMessage` / `InboundMessage`) 及其编解码。
//! - `error`: 定义库中使用的统一错误类型 `WsError`。
//! - `client`: 提供 WebSocket 客户端传输层 (连接、收发)。
//! - `server`: 提供 WebSocket 服务器端传输层，供集成测试扮演黑盒对端使用。

pub mod client;
pub mod error;
pub mod message;
pub mod server;
