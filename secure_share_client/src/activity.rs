// secure_share_client/src/activity.rs

//! 文件在场活动与用户在线状态跟踪。
//!
//! 本模块维护两类由服务端广播驱动的展示状态：
//! - **在场指示器**: 远端用户正在查看/编辑哪些文件。同一 `(文件, 用户)`
//!   组合最多存在一个指示器，新的动作覆盖旧的，`end` 动作将其移除。
//! - **用户在线状态**: 好友的 online/offline 花名册。
//!
//! 此外提供本地视口可见度的跨阈值判定 (`visibility_transition`)：
//! 只有可见比例跨越阈值的那一刻才产生事件，持续可见或持续不可见
//! 不会重复触发。实际的出站 `file_activity` 发送由连接管理器完成。

use common_models::enums::{FileActivityAction, UserOnlineStatus};
use common_models::ws_payloads::FileActivityPayload;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock as StdRwLock;

/// 一个远端用户在某文件上的在场指示器。
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityIndicator {
    /// 指示器所属的文件 id。
    pub file_id: String,
    /// 活动用户的 id。
    pub user_id: String,
    /// 活动用户的显示名。服务端未携带时回退为用户 id。
    pub username: String,
    /// 该用户当前的动作 (view 或 edit；end 不会出现在指示器中)。
    pub action: FileActivityAction,
}

/// 本地文件条目可见度的跨阈值事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTransition {
    /// 可见比例从阈值之下升至阈值之上：开始查看。
    BecameVisible,
    /// 可见比例从阈值之上降至阈值之下：结束查看。
    BecameHidden,
}

/// 在场活动与在线状态跟踪器。
///
/// 所有方法都通过内部锁保证线程安全，可在分发回调与 UI 读取之间共享
/// (`Arc<ActivityTracker>`)。
pub struct ActivityTracker {
    /// 键为 `(file_id, user_id)`，保证同一组合只有一个指示器。
    indicators: StdRwLock<HashMap<(String, String), ActivityIndicator>>,
    /// 好友在线状态花名册。
    roster: StdRwLock<HashMap<String, UserOnlineStatus>>,
    /// 当前可见比例达标的本地文件集合，用于跨阈值判定。
    visible_files: StdRwLock<HashSet<String>>,
    visibility_threshold: f64,
}

impl ActivityTracker {
    /// 创建跟踪器。`visibility_threshold` 为"正在查看"的可见比例阈值。
    pub fn new(visibility_threshold: f64) -> Self {
        Self {
            indicators: StdRwLock::new(HashMap::new()),
            roster: StdRwLock::new(HashMap::new()),
            visible_files: StdRwLock::new(HashSet::new()),
            visibility_threshold,
        }
    }

    /// 应用一条远端用户的 `file_activity` 帧。
    ///
    /// - 缺少 `userId` 的帧无法归属到用户，记录警告后忽略。
    /// - `end` 动作移除对应指示器 (不存在时无效果)。
    /// - `view` / `edit` 动作插入或覆盖指示器，后到者为准。
    pub fn apply_remote(&self, payload: &FileActivityPayload) {
        let user_id = match payload.user_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warn!(
                    "[SecureShare] (活动跟踪器) 收到缺少 userId 的 file_activity 帧 (文件: '{}', 动作: {})，已忽略。",
                    payload.file_id, payload.action
                );
                return;
            }
        };
        let key = (payload.file_id.clone(), user_id.clone());

        let Ok(mut indicators) = self.indicators.write() else { return };
        match payload.action {
            FileActivityAction::End => {
                if indicators.remove(&key).is_some() {
                    debug!(
                        "[SecureShare] (活动跟踪器) 用户 '{}' 结束了对文件 '{}' 的活动，指示器已移除。",
                        user_id, payload.file_id
                    );
                }
            }
            FileActivityAction::View | FileActivityAction::Edit => {
                let username = payload
                    .username
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| user_id.clone());
                debug!(
                    "[SecureShare] (活动跟踪器) 用户 '{}' ({}) 正在对文件 '{}' 执行 {}。",
                    username, user_id, payload.file_id, payload.action
                );
                indicators.insert(
                    key,
                    ActivityIndicator {
                        file_id: payload.file_id.clone(),
                        user_id,
                        username,
                        action: payload.action,
                    },
                );
            }
        }
    }

    /// 返回某文件上当前所有的在场指示器。
    pub fn indicators_for_file(&self, file_id: &str) -> Vec<ActivityIndicator> {
        match self.indicators.read() {
            Ok(indicators) => indicators
                .values()
                .filter(|indicator| indicator.file_id == file_id)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// 当前在场指示器的总数 (跨所有文件)。
    pub fn indicator_count(&self) -> usize {
        self.indicators.read().map(|i| i.len()).unwrap_or(0)
    }

    /// 应用一条 `user_status` 帧，更新花名册中该用户的状态。
    pub fn update_user_status(&self, user_id: &str, status: UserOnlineStatus) {
        debug!("[SecureShare] (活动跟踪器) 用户 '{}' 的在线状态变更为: {}", user_id, status);
        if let Ok(mut roster) = self.roster.write() {
            roster.insert(user_id.to_string(), status);
        }
    }

    /// 查询某用户最近广播的在线状态。从未出现过的用户返回 `None`。
    pub fn user_status(&self, user_id: &str) -> Option<UserOnlineStatus> {
        self.roster.read().ok().and_then(|roster| roster.get(user_id).copied())
    }

    /// 上报本地某文件条目的最新可见比例，返回跨阈值事件 (若有)。
    ///
    /// 只有比例跨越阈值的那一次调用才返回 `Some`：
    /// 达标且此前未达标 → `BecameVisible`；跌破且此前达标 → `BecameHidden`；
    /// 其余情况 (状态未变化) 返回 `None`。
    pub fn visibility_transition(&self, file_id: &str, ratio: f64) -> Option<VisibilityTransition> {
        let Ok(mut visible) = self.visible_files.write() else { return None };
        let is_visible = ratio >= self.visibility_threshold;
        let was_visible = visible.contains(file_id);

        match (was_visible, is_visible) {
            (false, true) => {
                visible.insert(file_id.to_string());
                Some(VisibilityTransition::BecameVisible)
            }
            (true, false) => {
                visible.remove(file_id);
                Some(VisibilityTransition::BecameHidden)
            }
            _ => None,
        }
    }
}
