// realtime_ws_utils/src/message.rs

//! 定义 WebSocket 通信中使用的核心消息类型与编解码逻辑。
//!
//! 线上协议为扁平 JSON 文本帧：每帧是一个 JSON 对象，由 `"type"` 字段区分
//! 消息类型，其余字段为该类型对应的 Payload 内容 (结构体定义见
//! `common_models::ws_payloads`)。本模块提供：
//! - `MessageKind`: 封闭的消息类型标签枚举，未知类型折叠到 `Custom` 变体，
//!   作为分发注册表的键使用。
//! - `OutboundMessage`: 客户端可发送的消息联合类型及其编码 (`encode`)。
//!   编码时注入 `"type"` 字段；缺少类型的帧会被拒绝，绝不会发出。
//! - `InboundMessage`: 服务端可下发的消息联合类型及其解码 (`decode`)。
//!   解码失败返回错误 (调用方记录日志并丢弃该帧)；`"type"` 缺失时
//!   使用哨兵值 `"unknown"`；未知类型保留原始 JSON 进入 `Custom` 变体。

use crate::error::WsError;
use common_models::ws_payloads::{
    AUTHENTICATE_MESSAGE_TYPE, AuthenticatePayload, FILE_ACTIVITY_MESSAGE_TYPE,
    FILE_UPDATE_MESSAGE_TYPE, FileActivityPayload, FileUpdatePayload, NOTIFICATION_MESSAGE_TYPE,
    NotificationPayload, PING_MESSAGE_TYPE, PONG_MESSAGE_TYPE, PingPayload, PongPayload,
    USER_STATUS_MESSAGE_TYPE, UserStatusPayload,
};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// 当入站帧缺失 `"type"` 字段时使用的哨兵类型字符串。
pub const UNKNOWN_MESSAGE_TYPE: &str = "unknown";

/// 消息类型标签。
///
/// 这是对线上 `"type"` 字符串的封闭枚举表示：所有已知类型都有独立变体，
/// 任何其他字符串 (包括哨兵 `"unknown"`) 折叠到 `Custom`。
/// 派生 `Hash`/`Eq`，可直接作为分发注册表 (HashMap) 的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `authenticate` — 连接绑定会话 (出站)。
    Authenticate,
    /// `ping` — 保活 (出站)。
    Ping,
    /// `pong` — 保活回复，仅用于延迟诊断 (入站)。
    Pong,
    /// `file_activity` — 文件在场活动 (双向)。
    FileActivity,
    /// `notification` — 用户可见通知 (入站)。
    Notification,
    /// `user_status` — 用户在线状态变更 (入站)。
    UserStatus,
    /// `file_update` — 文件变更广播 (入站)。
    FileUpdate,
    /// 其他任意类型字符串，保留扩展性。
    Custom(String),
}

impl MessageKind {
    /// 从线上 `"type"` 字符串解析消息类型标签。未知字符串映射到 `Custom`。
    pub fn from_type_str(message_type: &str) -> MessageKind {
        match message_type {
            AUTHENTICATE_MESSAGE_TYPE => MessageKind::Authenticate,
            PING_MESSAGE_TYPE => MessageKind::Ping,
            PONG_MESSAGE_TYPE => MessageKind::Pong,
            FILE_ACTIVITY_MESSAGE_TYPE => MessageKind::FileActivity,
            NOTIFICATION_MESSAGE_TYPE => MessageKind::Notification,
            USER_STATUS_MESSAGE_TYPE => MessageKind::UserStatus,
            FILE_UPDATE_MESSAGE_TYPE => MessageKind::FileUpdate,
            other => MessageKind::Custom(other.to_string()),
        }
    }

    /// 返回此标签对应的线上 `"type"` 字符串。
    pub fn as_type_str(&self) -> &str {
        match self {
            MessageKind::Authenticate => AUTHENTICATE_MESSAGE_TYPE,
            MessageKind::Ping => PING_MESSAGE_TYPE,
            MessageKind::Pong => PONG_MESSAGE_TYPE,
            MessageKind::FileActivity => FILE_ACTIVITY_MESSAGE_TYPE,
            MessageKind::Notification => NOTIFICATION_MESSAGE_TYPE,
            MessageKind::UserStatus => USER_STATUS_MESSAGE_TYPE,
            MessageKind::FileUpdate => FILE_UPDATE_MESSAGE_TYPE,
            MessageKind::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_type_str())
    }
}

/// 客户端可发送的出站消息联合类型。
///
/// 已知出站类型使用强类型 Payload；`Custom` 变体允许上层组件发送
/// 协议之外的扩展消息 (Payload 必须是 JSON 对象，且类型字符串非空)。
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// 认证消息，连接建立后发送。
    Authenticate(AuthenticatePayload),
    /// 保活 Ping。
    Ping(PingPayload),
    /// 本地用户的文件活动 (view / edit / end)。
    FileActivity(FileActivityPayload),
    /// 扩展消息：任意类型字符串 + JSON 对象 Payload。
    Custom {
        /// 线上 `"type"` 字段的值。不得为空。
        message_type: String,
        /// 帧的其余字段，必须为 JSON 对象。
        payload: Value,
    },
}

impl OutboundMessage {
    /// 返回此消息的线上类型字符串。
    pub fn message_type(&self) -> &str {
        match self {
            OutboundMessage::Authenticate(_) => AUTHENTICATE_MESSAGE_TYPE,
            OutboundMessage::Ping(_) => PING_MESSAGE_TYPE,
            OutboundMessage::FileActivity(_) => FILE_ACTIVITY_MESSAGE_TYPE,
            OutboundMessage::Custom { message_type, .. } => message_type.as_str(),
        }
    }

    /// 返回此消息的类型标签。
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_type_str(self.message_type())
    }

    /// 将消息编码为线上 JSON 文本帧。
    ///
    /// 编码流程：将 Payload 序列化为 JSON 对象，再注入 `"type"` 字段。
    /// 每一个出站帧都必须携带类型：`Custom` 的类型字符串为空、或其
    /// Payload 不是 JSON 对象时，返回 `WsError::SerializationError`，
    /// 该帧不会被发送。
    pub fn encode(&self) -> Result<String, WsError> {
        let message_type = self.message_type();
        if message_type.is_empty() {
            return Err(WsError::SerializationError(
                "出站消息缺少类型字符串，已拒绝编码".to_string(),
            ));
        }

        let payload_value = match self {
            OutboundMessage::Authenticate(p) => to_object_value(p)?,
            OutboundMessage::Ping(p) => to_object_value(p)?,
            OutboundMessage::FileActivity(p) => to_object_value(p)?,
            OutboundMessage::Custom { payload, .. } => match payload {
                Value::Object(map) => map.clone(),
                other => {
                    return Err(WsError::SerializationError(format!(
                        "扩展消息 '{}' 的 Payload 必须为 JSON 对象，实际为: {}",
                        message_type, other
                    )));
                }
            },
        };

        let mut frame = payload_value;
        frame.insert("type".to_string(), Value::String(message_type.to_string()));
        serde_json::to_string(&Value::Object(frame))
            .map_err(|e| WsError::SerializationError(format!("编码出站帧失败: {}", e)))
    }
}

// 将强类型 Payload 序列化为 JSON 对象映射。Payload 结构体都是具名字段结构体，
// 序列化结果必然为对象；此处仍做防御性校验以便错误信息清晰。
fn to_object_value<T: Serialize>(payload: &T) -> Result<serde_json::Map<String, Value>, WsError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| WsError::SerializationError(format!("序列化出站 Payload 失败: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(WsError::SerializationError(format!(
            "出站 Payload 序列化结果不是 JSON 对象: {}",
            other
        ))),
    }
}

/// 服务端可下发的入站消息联合类型。
///
/// 已知入站类型被解码为强类型 Payload；其余类型 (含缺失 `"type"` 的
/// 哨兵 `"unknown"`) 保留完整原始 JSON 进入 `Custom` 变体，
/// 供上层按需解释。
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// 保活回复，`timestamp` 为对应 Ping 的回显。
    Pong(PongPayload),
    /// 远端用户的文件活动。
    FileActivity(FileActivityPayload),
    /// 用户可见通知。
    Notification(NotificationPayload),
    /// 用户在线状态变更。
    UserStatus(UserStatusPayload),
    /// 文件变更广播。
    FileUpdate(FileUpdatePayload),
    /// 未知或扩展类型，保留完整帧内容。
    Custom {
        /// 帧的 `"type"` 字段值；缺失时为哨兵 `"unknown"`。
        message_type: String,
        /// 完整的原始帧 (JSON 对象)。
        payload: Value,
    },
}

impl InboundMessage {
    /// 返回此消息的类型标签。
    ///
    /// 注意 `Custom` 变体也通过 `MessageKind::from_type_str` 归一化，
    /// 因此若服务端意外下发 `"ping"` 等出站方向的类型，
    /// 其标签仍是对应的已知变体，保证注册表查找的一致性。
    pub fn kind(&self) -> MessageKind {
        match self {
            InboundMessage::Pong(_) => MessageKind::Pong,
            InboundMessage::FileActivity(_) => MessageKind::FileActivity,
            InboundMessage::Notification(_) => MessageKind::Notification,
            InboundMessage::UserStatus(_) => MessageKind::UserStatus,
            InboundMessage::FileUpdate(_) => MessageKind::FileUpdate,
            InboundMessage::Custom { message_type, .. } => {
                MessageKind::from_type_str(message_type)
            }
        }
    }

    /// 将接收到的文本帧解码为 `InboundMessage`。
    ///
    /// - 文本不是合法 JSON 对象 → `WsError::DeserializationError`
    ///   (调用方记录日志并丢弃，该帧绝不会到达订阅者)。
    /// - `"type"` 缺失或不是字符串 → 使用哨兵 `"unknown"`，帧进入 `Custom`。
    /// - 已知类型但字段不符合 Payload 结构 → `WsError::DeserializationError`。
    pub fn decode(text: &str) -> Result<InboundMessage, WsError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            WsError::DeserializationError(format!("入站帧不是合法 JSON: {}, 原始文本: '{}'", e, text))
        })?;
        if !value.is_object() {
            return Err(WsError::DeserializationError(format!(
                "入站帧不是 JSON 对象: '{}'",
                text
            )));
        }

        let message_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_MESSAGE_TYPE)
            .to_string();

        let decoded = match message_type.as_str() {
            PONG_MESSAGE_TYPE => InboundMessage::Pong(decode_payload(&message_type, &value)?),
            FILE_ACTIVITY_MESSAGE_TYPE => {
                InboundMessage::FileActivity(decode_payload(&message_type, &value)?)
            }
            NOTIFICATION_MESSAGE_TYPE => {
                InboundMessage::Notification(decode_payload(&message_type, &value)?)
            }
            USER_STATUS_MESSAGE_TYPE => {
                InboundMessage::UserStatus(decode_payload(&message_type, &value)?)
            }
            FILE_UPDATE_MESSAGE_TYPE => {
                InboundMessage::FileUpdate(decode_payload(&message_type, &value)?)
            }
            _ => InboundMessage::Custom {
                message_type,
                payload: value,
            },
        };
        Ok(decoded)
    }
}

// 从完整帧对象解码指定类型的 Payload。帧中的 "type" 字段会被 Payload
// 结构体忽略 (NotificationPayload 例外，它通过 rename 捕获该字段作为类别)。
fn decode_payload<T: serde::de::DeserializeOwned>(
    message_type: &str,
    frame: &Value,
) -> Result<T, WsError> {
    serde_json::from_value(frame.clone()).map_err(|e| {
        WsError::DeserializationError(format!(
            "类型为 '{}' 的入站帧 Payload 解码失败: {}, 原始帧: {}",
            message_type, e, frame
        ))
    })
}
