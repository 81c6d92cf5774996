// realtime_ws_utils/src/client/mod.rs

//! WebSocket 客户端模块。
//!
//! 本模块 (`client`) 及其子模块 (`transport`) 共同构成了 `realtime_ws_utils` 库中
//! 用于实现 WebSocket 客户端功能的核心组件。
//!
//! 主要职责包括：
//! - **连接建立**: 提供连接到远程 WebSocket 服务器的机制。
//! - **消息传输**: 管理通过 WebSocket 连接发送和接收消息的逻辑。
//! - **传输层抽象**: 封装底层 WebSocket 库 (`tokio-tungstenite`) 的细节，
//!   提供一个更简洁、更易于使用的 API 给上层应用 (如连接管理器)。

pub mod transport; // 公开 transport 子模块，其中包含主要的客户端传输层逻辑
