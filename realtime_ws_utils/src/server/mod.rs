// realtime_ws_utils/src/server/mod.rs

//! WebSocket 服务端模块。
//!
//! 本模块 (`server`) 及其子模块 (`transport`) 提供 `realtime_ws_utils` 库中
//! 与 WebSocket 服务器端功能相关的组件。
//!
//! 在本项目中，真实的服务端点是一个黑盒对端；此模块的服务器实现
//! 主要供集成测试在本地扮演该对端使用 (接受连接、按测试脚本收发帧)。
//!
//! 主要职责包括：
//! - **服务器启动与监听**: 在指定网络地址上启动 WebSocket 服务器并监听传入连接。
//! - **连接管理**: 处理新的客户端连接请求，包括 WebSocket 握手过程，
//!   并为每个连接创建独立的处理任务。

pub mod transport; // 公开 transport 子模块，其中包含了服务器端传输层实现
