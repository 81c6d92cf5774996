// secure_share_client/src/notify.rs

//! 通知展示器。
//!
//! 本模块维护当前活动的通知列表：每条通知获得进程内单调递增的 id，
//! 非持久化通知在配置的时限后自动消失，手动撤销是幂等操作。
//! 展示器只管理通知的生命周期与数据，不负责实际渲染 —— 宿主 UI
//! 通过 [`NotificationPresenter::active_notices`] 读取当前列表。

use chrono::{DateTime, Utc};
use common_models::ws_payloads::NotificationPayload;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

/// 降级提示通知的类别标识。
pub const DEGRADED_NOTICE_KIND: &str = "websocket-error";

/// 降级提示的用户可见文案 (实时功能不可用，建议刷新页面)。
pub const DEGRADED_NOTICE_MESSAGE: &str =
    "Real-time features are currently unavailable. Please refresh the page to try again.";

/// 一条活动中的通知。
#[derive(Debug, Clone)]
pub struct Notice {
    /// 进程内单调递增的通知 id，即使通知已消失也不会复用。
    pub id: u64,
    /// 通知类别 (如 `"file_shared"`, `"comment_added"`, `"info"`)，
    /// 供展示层选择样式；未知类别使用默认样式。
    pub kind: String,
    /// 展示给用户的文本。
    pub message: String,
    /// 持久化通知不会自动消失，只能显式撤销 (如连接降级提示)。
    pub persistent: bool,
    /// 通知的创建时刻。
    pub created_at: DateTime<Utc>,
}

/// 通知展示器。
///
/// 内部以 `BTreeMap<u64, Notice>` 维护活动通知 (按 id 升序即创建顺序)，
/// 自动消失通过为每条非持久化通知派生一个 Tokio 延时任务实现。
/// 撤销先于延时任务触发时，延时任务的移除操作落空，不产生任何效果。
pub struct NotificationPresenter {
    next_id: AtomicU64,
    active: Arc<StdMutex<BTreeMap<u64, Notice>>>,
    ttl: Duration,
}

impl NotificationPresenter {
    /// 创建展示器。`ttl` 为非持久化通知的自动消失时限。
    pub fn new(ttl: Duration) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: Arc::new(StdMutex::new(BTreeMap::new())),
            ttl,
        }
    }

    // 统一的插入路径：分配 id、入表，非持久化通知安排自动消失任务。
    fn insert(&self, kind: String, message: String, persistent: bool) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notice = Notice {
            id,
            kind,
            message,
            persistent,
            created_at: Utc::now(),
        };
        info!(
            "[SecureShare] (通知展示器) 展示通知 #{} (类别: '{}', 持久化: {}): {}",
            id, notice.kind, persistent, notice.message
        );

        if let Ok(mut active) = self.active.lock() {
            active.insert(id, notice);
        }

        if !persistent {
            let active = Arc::clone(&self.active);
            let ttl = self.ttl;
            tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Ok(mut active) = active.lock() {
                    if active.remove(&id).is_some() {
                        debug!("[SecureShare] (通知展示器) 通知 #{} 已到时限，自动消失。", id);
                    }
                }
            });
        }
        id
    }

    /// 展示一条来自服务端的通知，返回其 id。
    ///
    /// 通知类别取自 Payload 的 `kind` 字段 (线上 `type`)；
    /// 通知按配置的时限自动消失。
    pub fn display(&self, payload: &NotificationPayload) -> u64 {
        self.insert(payload.kind.clone(), payload.message.clone(), false)
    }

    /// 展示连接降级提示：持久化通知，不自动消失，
    /// 告知用户实时功能当前不可用、建议刷新页面。
    pub fn show_degraded_notice(&self) -> u64 {
        self.insert(
            DEGRADED_NOTICE_KIND.to_string(),
            DEGRADED_NOTICE_MESSAGE.to_string(),
            true,
        )
    }

    /// 撤销指定 id 的通知。幂等：通知已消失或 id 不存在时返回 `false`，无其他效果。
    pub fn dismiss(&self, id: u64) -> bool {
        match self.active.lock() {
            Ok(mut active) => {
                let removed = active.remove(&id).is_some();
                if removed {
                    debug!("[SecureShare] (通知展示器) 通知 #{} 已被撤销。", id);
                }
                removed
            }
            Err(_) => false,
        }
    }

    /// 当前所有活动通知的快照，按创建顺序排列。
    pub fn active_notices(&self) -> Vec<Notice> {
        match self.active.lock() {
            Ok(active) => active.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}
