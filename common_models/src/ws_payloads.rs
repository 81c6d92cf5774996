//! 包含 WebSocket 通信中使用的各种 Payload 结构体定义。
//!
//! 线上帧为扁平 JSON 对象，由 `"type"` 字段区分消息类型，其余字段即为
//! 对应 Payload 的内容 (字段名在线上为 camelCase)。本模块为每一种已知
//! 消息类型定义一个 Payload 结构体和一个类型常量字符串；编解码器
//! (`realtime_ws_utils::message`) 负责在完整帧与这些结构体之间转换。
//!
//! 根据项目约定，所有共享模型都必须派生 `Serialize`, `Deserialize`, `Debug`, `Clone`。

use crate::enums::{FileActivityAction, UserOnlineStatus};
use serde::{Deserialize, Serialize};

/// `authenticate` 消息的类型常量。连接建立后客户端发送，用于将连接绑定到会话。
pub const AUTHENTICATE_MESSAGE_TYPE: &str = "authenticate";

/// `ping` 消息的类型常量。客户端周期性发送，用于保活。
pub const PING_MESSAGE_TYPE: &str = "ping";

/// `pong` 消息的类型常量。服务端对 `ping` 的回复，仅用于延迟诊断。
pub const PONG_MESSAGE_TYPE: &str = "pong";

/// `file_activity` 消息的类型常量。双向：本端发布活动，远端活动驱动在场指示器。
pub const FILE_ACTIVITY_MESSAGE_TYPE: &str = "file_activity";

/// `notification` 消息的类型常量。服务端推送的用户可见通知。
pub const NOTIFICATION_MESSAGE_TYPE: &str = "notification";

/// `user_status` 消息的类型常量。好友在线状态变更广播。
pub const USER_STATUS_MESSAGE_TYPE: &str = "user_status";

/// `file_update` 消息的类型常量。文件变更广播。
pub const FILE_UPDATE_MESSAGE_TYPE: &str = "file_update";

/// 认证 Payload。连接建立后作为第一条业务消息发送，
/// 携带本地凭证存储中的会话令牌。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthenticatePayload {
    /// 会话令牌。由认证子系统颁发，此处仅透传。
    pub token: String,
}

/// 保活 Ping Payload。
///
/// `timestamp` 为发送时刻的 UTC 毫秒时间戳，服务端会在 `pong` 中原样回显，
/// 客户端据此计算往返延迟。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PingPayload {
    /// 发送时刻 (UTC 毫秒)。
    pub timestamp: i64,
}

/// Pong Payload。`timestamp` 为对应 `ping` 中的时间戳原样回显。
///
/// Pong 仅用于延迟诊断：它不重置保活定时器，缺失也不视为连接故障。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PongPayload {
    /// 对应 `ping` 携带的时间戳 (UTC 毫秒)。
    pub timestamp: i64,
}

/// 文件活动 Payload。
///
/// 出站时仅携带 `fileId` / `action` / `timestamp`；入站 (远端用户的活动)
/// 额外携带 `userId` 与 `username`，用于渲染在场指示器。
/// 同一 `(fileId, userId)` 最多存在一个指示器：新的动作覆盖旧的，
/// `end` 动作将其移除。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileActivityPayload {
    /// 活动针对的文件资源 id。
    pub file_id: String,
    /// 活动动作 (view / edit / end)。
    pub action: FileActivityAction,
    /// 活动发生时刻 (UTC 毫秒)。出站时由客户端填写。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// 活动发起用户的 id。仅入站帧携带。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 活动发起用户的显示名。仅入站帧携带。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// 通知 Payload。
///
/// 注意 `type` 字段的双重角色：在主通道上它是外层消息类型 `"notification"`；
/// 而在遗留通知通道上，帧直接以业务类别 (如 `"file_shared"`, `"comment_added"`)
/// 作为 `type`。两种形态都映射到本结构体，`kind` 仅用于通知的样式分类。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    /// 通知类别，来自帧的 `type` 字段，用于展示层选择样式。缺失时为空字符串。
    #[serde(rename = "type", default)]
    pub kind: String,
    /// 展示给用户的通知文本。
    pub message: String,
    /// 通知产生时刻。主通道为 UTC 毫秒整数，遗留通道历史上也出现过
    /// ISO 字符串，因此这里保留原始 JSON 值且展示层不依赖它。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

/// 用户在线状态 Payload。服务端在好友上线/下线时广播。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusPayload {
    /// 状态发生变化的用户 id。
    pub user_id: String,
    /// 该用户的新状态。
    pub status: UserOnlineStatus,
}

/// 文件变更 Payload。当某文件被修改时由服务端广播给相关用户。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileUpdatePayload {
    /// 被变更的文件资源 id。
    pub file_id: String,
    /// 变更动作描述 (例如 `"updated"`)。
    pub action: String,
    /// 执行变更的用户显示名。
    pub by: String,
    /// 变更发生时刻 (UTC 毫秒)。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// 服务端标记：变更是否由当前连接对应的用户发起。
    /// 为 `true` 时客户端不应重复提示自己。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_current_user: Option<bool>,
    /// 被变更文件的显示名，用于拼装提示文案。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 测试 `FileActivityPayload` 的线上字段名为 camelCase，
    /// 且出站形态 (无 userId/username) 不会序列化出空字段。
    fn test_file_activity_payload_wire_field_names() {
        let outbound = FileActivityPayload {
            file_id: "f1".to_string(),
            action: FileActivityAction::View,
            timestamp: Some(1_700_000_000_000),
            user_id: None,
            username: None,
        };

        let json = serde_json::to_string(&outbound).expect("FileActivityPayload 序列化失败");
        assert!(json.contains("\"fileId\":\"f1\""), "线上字段名应为 fileId，实际: {}", json);
        assert!(json.contains("\"action\":\"view\""));
        assert!(!json.contains("userId"), "出站帧不应携带 userId 字段，实际: {}", json);

        // 入站形态：带 userId/username 的帧应能完整还原
        let inbound_json = r#"{"fileId":"42","action":"edit","userId":"u9","username":"Alice"}"#;
        let inbound: FileActivityPayload =
            serde_json::from_str(inbound_json).expect("入站 FileActivityPayload 反序列化失败");
        assert_eq!(inbound.action, FileActivityAction::Edit);
        assert_eq!(inbound.user_id.as_deref(), Some("u9"));
        assert_eq!(inbound.username.as_deref(), Some("Alice"));
        assert_eq!(inbound.timestamp, None);
    }

    #[test]
    /// 测试 `NotificationPayload` 对两种时间戳形态 (毫秒整数 / ISO 字符串) 的容忍度。
    fn test_notification_payload_tolerates_timestamp_shapes() {
        // 主通道形态：type 为外层消息类型，timestamp 为毫秒整数
        let socket_json = r#"{"type":"notification","message":"File shared","timestamp":1700000000000}"#;
        let socket_payload: NotificationPayload =
            serde_json::from_str(socket_json).expect("主通道通知帧反序列化失败");
        assert_eq!(socket_payload.kind, "notification");
        assert_eq!(socket_payload.message, "File shared");

        // 遗留通道形态：type 为业务类别，timestamp 为 ISO 字符串
        let legacy_json = r#"{"type":"file_shared","message":"Bob shared a file","timestamp":"2025-01-01T00:00:00Z"}"#;
        let legacy_payload: NotificationPayload =
            serde_json::from_str(legacy_json).expect("遗留通道通知帧反序列化失败");
        assert_eq!(legacy_payload.kind, "file_shared");
        assert!(legacy_payload.timestamp.is_some());

        // 完全缺失 type/timestamp 的最小帧也应可接受
        let minimal: NotificationPayload =
            serde_json::from_str(r#"{"message":"hi"}"#).expect("最小通知帧反序列化失败");
        assert_eq!(minimal.kind, "");
        assert_eq!(minimal.timestamp, None);
    }

    #[test]
    /// 测试 `FileUpdatePayload` 的 `byCurrentUser` 标志与可选字段的缺省行为。
    fn test_file_update_payload_by_current_user_flag() {
        let json = r#"{"fileId":"f7","action":"updated","by":"alice","timestamp":1700000000000,"byCurrentUser":true,"fileName":"report.pdf"}"#;
        let payload: FileUpdatePayload = serde_json::from_str(json).expect("FileUpdatePayload 反序列化失败");
        assert_eq!(payload.by_current_user, Some(true));
        assert_eq!(payload.file_name.as_deref(), Some("report.pdf"));

        // 服务端未标记 byCurrentUser 时应为 None (调用方按"非本人"处理)
        let sparse: FileUpdatePayload =
            serde_json::from_str(r#"{"fileId":"f8","action":"updated","by":"bob"}"#).unwrap();
        assert_eq!(sparse.by_current_user, None);
        assert_eq!(sparse.timestamp, None);
    }

    #[test]
    /// 测试 Ping/Pong Payload 的时间戳回显往返。
    fn test_ping_pong_payload_roundtrip() {
        let ping = PingPayload { timestamp: 1000 };
        let json = serde_json::to_string(&ping).unwrap();
        assert_eq!(json, r#"{"timestamp":1000}"#);

        // 服务端回显同一时间戳
        let pong: PongPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(pong.timestamp, ping.timestamp);
    }
}
