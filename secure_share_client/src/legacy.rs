// secure_share_client/src/legacy.rs

//! 遗留通知通道监听器。
//!
//! 部署中存在第二个只收不发的 WebSocket 端点 (`/ws/notifications/`)，
//! 其帧形态为扁平 JSON，`type` 字段直接是业务类别 (如 `"file_shared"`,
//! `"comment_added"`) 而非外层消息类型。本监听器把这些帧作为通知交给
//! 通知展示器，其余内容一律忽略。
//!
//! 与主通道不同，此通道使用固定间隔重试：断开后等待固定时长再重连，
//! 无退避增长、无次数上限，也不参与主通道的状态机与降级提示。
//! 主通道与遗留通道可能各自投递一次同一事件的通知；
//! 展示层不做跨通道去重 (至多各展示一次)。

use crate::notify::NotificationPresenter;
use common_models::ws_payloads::NotificationPayload;
use log::{debug, error, info, warn};
use realtime_ws_utils::client::transport::{connect_client, receive_message};
use realtime_ws_utils::error::WsError;
use realtime_ws_utils::message::InboundMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tokio::task::JoinHandle;

/// 遗留通知通道监听器。
pub struct LegacyNotificationListener {
    presenter: Arc<NotificationPresenter>,
    retry_delay: Duration,
    task_handle: TokioMutex<Option<JoinHandle<()>>>,
}

impl LegacyNotificationListener {
    /// 创建监听器。`retry_delay` 为断开后的固定重试间隔。
    pub fn new(presenter: Arc<NotificationPresenter>, retry_delay: Duration) -> Self {
        Self {
            presenter,
            retry_delay,
            task_handle: TokioMutex::new(None),
        }
    }

    /// 启动监听循环。已有循环在运行时先将其终止再重新启动。
    pub async fn start(&self, url: String) {
        let mut handle_guard = self.task_handle.lock().await;
        if let Some(old) = handle_guard.take() {
            info!("[SecureShare] (遗留通道) 发现旧的监听任务，正在终止...");
            old.abort();
        }

        let presenter = Arc::clone(&self.presenter);
        let retry_delay = self.retry_delay;
        *handle_guard = Some(tokio::spawn(run_legacy_loop(url, presenter, retry_delay)));
    }

    /// 停止监听循环。
    pub async fn stop(&self) {
        if let Some(handle) = self.task_handle.lock().await.take() {
            handle.abort();
            info!("[SecureShare] (遗留通道) 监听任务已停止。");
        }
    }
}

// 监听主循环：连接 → 接收 → 断开 → 固定延迟后重试，永不放弃。
async fn run_legacy_loop(url: String, presenter: Arc<NotificationPresenter>, retry_delay: Duration) {
    loop {
        info!("[SecureShare] (遗留通道) 正在连接到 {} ...", url);
        match connect_client(url.clone()).await {
            Ok(mut connection) => {
                info!("[SecureShare] (遗留通道) 连接已建立，开始接收通知。");
                loop {
                    match receive_message(&mut connection.ws_receiver).await {
                        Some(Ok(message)) => handle_legacy_message(&presenter, message),
                        Some(Err(WsError::DeserializationError(detail))) => {
                            warn!("[SecureShare] (遗留通道) 丢弃一条无法解码的帧: {}", detail);
                        }
                        Some(Err(WsError::Message(detail))) => {
                            warn!("[SecureShare] (遗留通道) 丢弃一条非预期的消息: {}", detail);
                        }
                        Some(Err(e)) => {
                            error!("[SecureShare] (遗留通道) 接收时发生传输层错误: {}", e);
                            break;
                        }
                        None => {
                            info!("[SecureShare] (遗留通道) 连接已由对端关闭。");
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                error!("[SecureShare] (遗留通道) 连接 {} 失败: {}", url, e);
            }
        }

        debug!("[SecureShare] (遗留通道) 将在 {:?} 后重试连接。", retry_delay);
        tokio::time::sleep(retry_delay).await;
    }
}

// 遗留通道的帧解释：业务类别帧 (type 为类别) 落入 Custom 变体，
// 尝试按通知 Payload 还原；恰好匹配已知类型的帧按原义处理或忽略。
fn handle_legacy_message(presenter: &Arc<NotificationPresenter>, message: InboundMessage) {
    match message {
        InboundMessage::Notification(payload) => {
            presenter.display(&payload);
        }
        InboundMessage::Custom { message_type, payload } => {
            match serde_json::from_value::<NotificationPayload>(payload) {
                Ok(notification) => {
                    presenter.display(&notification);
                }
                Err(e) => {
                    debug!(
                        "[SecureShare] (遗留通道) 类型为 '{}' 的帧不具备通知结构，已忽略: {}",
                        message_type, e
                    );
                }
            }
        }
        other => {
            debug!("[SecureShare] (遗留通道) 忽略类型为 '{}' 的非通知消息。", other.kind());
        }
    }
}
