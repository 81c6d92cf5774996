// secure_share_client/src/dispatch.rs

//! 入站消息分发注册表。
//!
//! 连接管理器把每条解码成功的入站消息交给本模块分发。分发分两步：
//! 1. **内建处理**: 通知、文件活动、用户状态、文件变更四类消息先由
//!    内建组件 (通知展示器、活动跟踪器) 处理，保证核心展示状态
//!    不依赖外部订阅。
//! 2. **订阅回调**: 按消息类型标签查找外部注册的处理器，按注册顺序
//!    依次调用。单个处理器 panic 会被捕获并记录，不影响其余处理器
//!    和连接本身。
//!
//! [`DispatchRegistry::on`] 返回 [`Subscription`] 凭据，
//! 撤销订阅必须通过该凭据 ([`DispatchRegistry::off`])，
//! 避免按函数身份比较带来的歧义。

use crate::activity::ActivityTracker;
use crate::notify::NotificationPresenter;
use common_models::ws_payloads::NotificationPayload;
use log::{debug, error, warn};
use realtime_ws_utils::message::{InboundMessage, MessageKind};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock as StdRwLock};

/// 外部消息处理器的类型别名。处理器在分发线程上同步执行，
/// 必须是 `Send + Sync` 且不可长时间阻塞。
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync + 'static>;

// 注册表内部条目：处理器连同其订阅 id。
struct HandlerEntry {
    id: u64,
    handler: MessageHandler,
}

/// 订阅凭据。由 [`DispatchRegistry::on`] 返回，
/// 用于之后通过 [`DispatchRegistry::off`] 精确撤销对应的处理器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    kind: MessageKind,
    id: u64,
}

impl Subscription {
    /// 此订阅关注的消息类型标签。
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }
}

/// 入站消息分发注册表。
pub struct DispatchRegistry {
    handlers: StdRwLock<HashMap<MessageKind, Vec<HandlerEntry>>>,
    next_subscription_id: AtomicU64,
    activity: Arc<ActivityTracker>,
    presenter: Arc<NotificationPresenter>,
}

impl DispatchRegistry {
    /// 创建注册表，绑定内建处理所需的活动跟踪器与通知展示器。
    pub fn new(activity: Arc<ActivityTracker>, presenter: Arc<NotificationPresenter>) -> Self {
        Self {
            handlers: StdRwLock::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
            activity,
            presenter,
        }
    }

    /// 注册一个针对指定消息类型的处理器，返回订阅凭据。
    ///
    /// 同一类型可注册多个处理器，分发时按注册顺序依次调用。
    pub fn on<F>(&self, kind: MessageKind, handler: F) -> Subscription
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let id = self.next_subscription_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.handlers.write() {
            handlers
                .entry(kind.clone())
                .or_default()
                .push(HandlerEntry { id, handler: Arc::new(handler) });
        }
        debug!("[SecureShare] (分发注册表) 已为类型 '{}' 注册处理器 (订阅 #{})。", kind, id);
        Subscription { kind, id }
    }

    /// 按订阅凭据撤销处理器。幂等：凭据已撤销或从未存在时返回 `false`。
    pub fn off(&self, subscription: &Subscription) -> bool {
        let Ok(mut handlers) = self.handlers.write() else { return false };
        let Some(entries) = handlers.get_mut(&subscription.kind) else { return false };

        let before = entries.len();
        entries.retain(|entry| entry.id != subscription.id);
        let removed = entries.len() < before;
        if entries.is_empty() {
            handlers.remove(&subscription.kind);
        }
        if removed {
            debug!(
                "[SecureShare] (分发注册表) 已撤销类型 '{}' 的订阅 #{}。",
                subscription.kind, subscription.id
            );
        }
        removed
    }

    /// 分发一条入站消息：先执行内建处理，再调用该类型的外部处理器。
    ///
    /// 没有任何处理器的消息被静默丢弃 (debug 日志)，不是错误。
    pub fn dispatch(&self, message: &InboundMessage) {
        self.run_builtin(message);

        let kind = message.kind();
        // 快照式取出处理器列表，避免在回调执行期间持锁
        // (处理器内部可能再调用 on/off)。
        let snapshot: Vec<(u64, MessageHandler)> = match self.handlers.read() {
            Ok(handlers) => handlers
                .get(&kind)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| (entry.id, Arc::clone(&entry.handler)))
                        .collect()
                })
                .unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        if snapshot.is_empty() {
            debug!("[SecureShare] (分发注册表) 类型 '{}' 没有外部订阅者。", kind);
            return;
        }

        for (id, handler) in snapshot {
            // 单个处理器 panic 不得拖垮其余处理器或接收循环
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(message))) {
                error!(
                    "[SecureShare] (分发注册表) 类型 '{}' 的订阅 #{} 处理器发生 panic: {:?}",
                    kind, id, panic
                );
            }
        }
    }

    // 内建处理：核心展示状态的更新不依赖外部订阅。
    fn run_builtin(&self, message: &InboundMessage) {
        match message {
            InboundMessage::Notification(payload) => {
                self.presenter.display(payload);
            }
            InboundMessage::FileActivity(payload) => {
                self.activity.apply_remote(payload);
            }
            InboundMessage::UserStatus(payload) => {
                self.activity.update_user_status(&payload.user_id, payload.status);
            }
            InboundMessage::FileUpdate(payload) => {
                // 本人发起的变更不重复提示自己
                if payload.by_current_user == Some(true) {
                    debug!(
                        "[SecureShare] (分发注册表) 文件 '{}' 的变更由当前用户发起，跳过提示。",
                        payload.file_id
                    );
                    return;
                }
                let file_name = payload.file_name.as_deref().unwrap_or(&payload.file_id);
                self.presenter.display(&NotificationPayload {
                    kind: "info".to_string(),
                    message: format!("File \"{}\" was updated by {}", file_name, payload.by),
                    timestamp: None,
                });
            }
            InboundMessage::Pong(_) => {
                // Pong 的延迟计算在连接管理器内完成，这里无内建动作
            }
            InboundMessage::Custom { message_type, .. } => {
                warn!(
                    "[SecureShare] (分发注册表) 收到未知类型 '{}' 的入站消息，仅转发给订阅者 (若有)。",
                    message_type
                );
            }
        }
    }

    /// 活动跟踪器访问器 (供宿主读取在场指示器等状态)。
    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    /// 通知展示器访问器。
    pub fn presenter(&self) -> &Arc<NotificationPresenter> {
        &self.presenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_models::enums::FileActivityAction;
    use common_models::ws_payloads::{FileActivityPayload, FileUpdatePayload};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn registry() -> DispatchRegistry {
        DispatchRegistry::new(
            Arc::new(ActivityTracker::new(0.5)),
            Arc::new(NotificationPresenter::new(Duration::from_secs(60))),
        )
    }

    fn notification(message: &str) -> InboundMessage {
        InboundMessage::Notification(NotificationPayload {
            kind: "file_shared".to_string(),
            message: message.to_string(),
            timestamp: None,
        })
    }

    // 注意：通知展示会派生自动消失任务，因此涉及通知的用例需要 Tokio 运行时。
    #[tokio::test]
    /// 测试同一类型的多个处理器按注册顺序调用。
    async fn test_handlers_run_in_registration_order() {
        let registry = registry();
        let order = Arc::new(StdMutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        registry.on(MessageKind::Notification, move |_| o1.lock().unwrap().push(1));
        let o2 = Arc::clone(&order);
        registry.on(MessageKind::Notification, move |_| o2.lock().unwrap().push(2));

        registry.dispatch(&notification("hello"));
        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    /// 测试处理器 panic 被隔离：后续处理器仍然执行。
    async fn test_panicking_handler_does_not_block_others() {
        let registry = registry();
        let reached = Arc::new(StdMutex::new(false));

        registry.on(MessageKind::Notification, |_| panic!("订阅者内部故障"));
        let r = Arc::clone(&reached);
        registry.on(MessageKind::Notification, move |_| *r.lock().unwrap() = true);

        registry.dispatch(&notification("still delivered"));
        assert!(*reached.lock().unwrap(), "panic 之后注册的处理器仍应被调用");
    }

    #[tokio::test]
    /// 测试通过订阅凭据撤销处理器，且撤销是幂等的。
    async fn test_off_removes_handler_via_subscription() {
        let registry = registry();
        let count = Arc::new(StdMutex::new(0u32));

        let c = Arc::clone(&count);
        let subscription = registry.on(MessageKind::Notification, move |_| *c.lock().unwrap() += 1);

        registry.dispatch(&notification("one"));
        assert!(registry.off(&subscription));
        registry.dispatch(&notification("two"));

        assert_eq!(*count.lock().unwrap(), 1, "撤销后处理器不应再被调用");
        assert!(!registry.off(&subscription), "重复撤销应返回 false");
    }

    #[test]
    /// 测试未知类型且无订阅者的消息被静默丢弃 (不 panic、不产生通知)。
    fn test_unknown_kind_without_subscribers_is_dropped() {
        let registry = registry();
        registry.dispatch(&InboundMessage::Custom {
            message_type: "mystery".to_string(),
            payload: json!({"type": "mystery"}),
        });
        assert!(registry.presenter().active_notices().is_empty());
    }

    #[test]
    /// 测试内建处理先于外部订阅者执行：订阅者回调中已能看到更新后的状态。
    fn test_builtin_runs_before_subscribers() {
        let registry = registry();
        let seen = Arc::new(StdMutex::new(0usize));

        let activity = Arc::clone(registry.activity());
        let s = Arc::clone(&seen);
        registry.on(MessageKind::FileActivity, move |_| {
            *s.lock().unwrap() = activity.indicators_for_file("42").len();
        });

        registry.dispatch(&InboundMessage::FileActivity(FileActivityPayload {
            file_id: "42".to_string(),
            action: FileActivityAction::View,
            timestamp: None,
            user_id: Some("u9".to_string()),
            username: Some("Alice".to_string()),
        }));
        assert_eq!(*seen.lock().unwrap(), 1, "订阅者应看到内建处理已插入的指示器");
    }

    #[tokio::test]
    /// 测试 file_update 的内建提示：他人变更产生通知，本人变更跳过。
    async fn test_file_update_builtin_notification_skips_own_changes() {
        let registry = registry();

        registry.dispatch(&InboundMessage::FileUpdate(FileUpdatePayload {
            file_id: "f7".to_string(),
            action: "updated".to_string(),
            by: "alice".to_string(),
            timestamp: None,
            by_current_user: Some(true),
            file_name: Some("report.pdf".to_string()),
        }));
        assert!(registry.presenter().active_notices().is_empty(), "本人变更不应产生提示");

        registry.dispatch(&InboundMessage::FileUpdate(FileUpdatePayload {
            file_id: "f7".to_string(),
            action: "updated".to_string(),
            by: "alice".to_string(),
            timestamp: None,
            by_current_user: None,
            file_name: Some("report.pdf".to_string()),
        }));
        let notices = registry.presenter().active_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "File \"report.pdf\" was updated by alice");
    }
}
