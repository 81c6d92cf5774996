//! `common_models` 公共模型库 crate。
//!
//! 本 crate 集中定义了在 `SecureShare` 实时客户端各个 Rust 组件
//! (`realtime_ws_utils` 传输层、`secure_share_client` 客户端核心)
//! 之间共享的核心数据结构和枚举类型。
//!
//! 主要包含以下类型的模型：
//! - **WebSocket 消息负载 (`ws_payloads`)**: 客户端与服务端之间通过 WebSocket
//!   通信时传输的各类消息的 Payload 结构体及其类型常量，
//!   例如认证、Ping/Pong、文件活动、通知、用户在线状态、文件变更等。
//! - **通用枚举 (`enums`)**: 定义了项目中广泛使用的枚举类型，
//!   如文件活动动作 (`FileActivityAction`)、用户在线状态 (`UserOnlineStatus`)，
//!   以保证类型安全和一致性。
//!
//! 设计原则：
//! - **共享性**: 所有在此 crate 中定义的模型都旨在被多个其他 crate 共享使用。
//! - **序列化/反序列化**: 所有模型 (结构体和枚举) 都必须派生 `serde::Serialize`
//!   和 `serde::Deserialize` traits，以便能够轻松地在 JSON 线上格式之间转换。
//! - **可调试性与克隆**: 所有模型也必须派生 `Debug` 和 `Clone` traits，
//!   以方便调试输出和创建副本。

// 声明并公开项目中的各个模块
pub mod enums;       // 项目中通用的枚举类型定义
pub mod ws_payloads; // WebSocket 通信中使用的各种消息负载结构体

// 常用类型的便捷再导出
pub use enums::{FileActivityAction, UserOnlineStatus};
