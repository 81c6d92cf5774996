//! 通用枚举模块。
//!
//! 本模块定义了在 `SecureShare` 实时客户端各个组件之间共享的通用枚举类型。
//! 这些枚举旨在提供类型安全，并确保对于如文件活动动作、用户在线状态等概念
//! 在整个系统中有一致的表示。
//!
//! 所有在此模块中定义的枚举都应派生 `Serialize`, `Deserialize`, `Debug`, `Clone`,
//! `PartialEq`, `Eq`, `Hash` (如果适合作为 HashMap/HashSet 的键)
//! 以支持数据交换、调试、实例复制、比较和集合操作。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 表示用户针对某个文件资源正在进行的活动动作。
///
/// 此枚举用于 `file_activity` 消息的 `action` 字段：
/// 客户端在本地用户开始查看/编辑文件时向服务端发布对应动作，
/// 同时根据远端用户的动作在界面上维护"在场指示器"。
/// 线上序列化为小写字符串 (`"view"` / `"edit"` / `"end"`)，与服务端约定一致。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileActivityAction {
    /// 用户正在查看该文件 (例如文件条目在视口中可见)。
    View,
    /// 用户正在编辑该文件。
    Edit,
    /// 用户已结束对该文件的活动。收到此动作意味着应移除
    /// 对应 `(文件, 用户)` 的在场指示器。
    End,
}

// 为 FileActivityAction 实现 Display trait，输出线上使用的小写形式
impl fmt::Display for FileActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileActivityAction::View => "view",
            FileActivityAction::Edit => "edit",
            FileActivityAction::End => "end",
        };
        write!(f, "{}", s)
    }
}

/// 表示某个用户当前的在线状态。
///
/// 此枚举用于 `user_status` 消息的 `status` 字段，驱动好友列表等处的
/// 在线状态指示。线上序列化为小写字符串 (`"online"` / `"offline"`)。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserOnlineStatus {
    /// 用户在线。
    Online,
    /// 用户离线。
    Offline,
}

impl fmt::Display for UserOnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserOnlineStatus::Online => "online",
            UserOnlineStatus::Offline => "offline",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 测试 `FileActivityAction` 的线上序列化形式是否为约定的小写字符串。
    fn test_file_activity_action_wire_format() {
        assert_eq!(serde_json::to_string(&FileActivityAction::View).unwrap(), "\"view\"");
        assert_eq!(serde_json::to_string(&FileActivityAction::Edit).unwrap(), "\"edit\"");
        assert_eq!(serde_json::to_string(&FileActivityAction::End).unwrap(), "\"end\"");

        // 反序列化也应接受同样的小写形式
        let action: FileActivityAction = serde_json::from_str("\"edit\"").unwrap();
        assert_eq!(action, FileActivityAction::Edit);
    }

    #[test]
    /// 测试 `UserOnlineStatus` 的序列化/反序列化与 Display 输出的一致性。
    fn test_user_online_status_wire_format_and_display() {
        assert_eq!(serde_json::to_string(&UserOnlineStatus::Online).unwrap(), "\"online\"");
        let status: UserOnlineStatus = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(status, UserOnlineStatus::Offline);

        // Display 输出与线上形式一致，便于直接拼接日志或 CSS 类名
        assert_eq!(UserOnlineStatus::Online.to_string(), "online");
        assert_eq!(FileActivityAction::End.to_string(), "end");
    }
}
