// secure_share_client/src/ws_client/service.rs

//! 实时客户端核心服务：连接生命周期、保活、收发与分发的枢纽。
//!
//! [`RealtimeClientService`] 是本 Crate 的中心组件。它持有配置、令牌存储、
//! 分发注册表、活动跟踪器与通知展示器，并管理与服务端的 WebSocket 连接：
//!
//! - `connect()` 启动连接生命周期任务：建立连接 → 发送认证 → 启动保活 →
//!   进入接收循环；意外断开后按退避策略自动重连，耗尽后进入 `Unavailable`
//!   终态并展示降级提示。
//! - `disconnect()` 显式断开：终止所有后台任务，不触发自动重连。
//! - `send()` 及各活动发布便捷方法仅在连接处于 `Open` 状态时发送，
//!   否则返回 `false` (发送结果不保证服务端已处理，仅表示已写入连接)。
//!
//! 服务的各字段均为 `Arc` 共享，克隆后移入后台任务，
//! 这使得服务自身可以被宿主以 `Arc<RealtimeClientService>` 长期持有。

use crate::activity::{ActivityTracker, VisibilityTransition};
use crate::config::RealtimeConfig;
use crate::dispatch::DispatchRegistry;
use crate::notify::NotificationPresenter;
use crate::reconnect::ReconnectPolicy;
use crate::token::TokenStore;
use crate::ws_client::ConnectionState;
use chrono::Utc;
use common_models::enums::FileActivityAction;
use common_models::ws_payloads::{AuthenticatePayload, FileActivityPayload, PingPayload};
use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use log::{debug, error, info, warn};
use realtime_ws_utils::client::transport::{ClientWsStream, connect_client, receive_message};
use realtime_ws_utils::error::WsError;
use realtime_ws_utils::message::{InboundMessage, OutboundMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex as TokioMutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message as TungsteniteMessage;

/// WebSocket 发送通道的类型别名。
///
/// 发送端从连接中拆分出来单独存储，业务发送与保活任务共用；
/// `Option` 为 `None` 表示当前没有活动连接。
type WsSendChannel = Arc<TokioMutex<Option<SplitSink<ClientWsStream, TungsteniteMessage>>>>;

// 连接生命周期任务所需的共享状态集合。
// 服务把各 Arc 字段克隆进此结构体后移入后台任务。
#[derive(Clone)]
struct ConnectionShared {
    config: RealtimeConfig,
    dispatch: Arc<DispatchRegistry>,
    presenter: Arc<NotificationPresenter>,
    token_store: Arc<dyn TokenStore>,
    connection_state: Arc<RwLock<ConnectionState>>,
    ws_send_channel: WsSendChannel,
    reconnect_policy: Arc<TokioMutex<ReconnectPolicy>>,
    keepalive_task_handle: Arc<TokioMutex<Option<JoinHandle<()>>>>,
    manual_disconnect: Arc<AtomicBool>,
    last_latency_ms: Arc<RwLock<Option<i64>>>,
}

/// 实时客户端核心服务。
pub struct RealtimeClientService {
    config: RealtimeConfig,
    dispatch: Arc<DispatchRegistry>,
    activity: Arc<ActivityTracker>,
    presenter: Arc<NotificationPresenter>,
    token_store: Arc<dyn TokenStore>,
    connection_state: Arc<RwLock<ConnectionState>>,
    ws_send_channel: WsSendChannel,
    reconnect_policy: Arc<TokioMutex<ReconnectPolicy>>,
    connection_task_handle: Arc<TokioMutex<Option<JoinHandle<()>>>>,
    keepalive_task_handle: Arc<TokioMutex<Option<JoinHandle<()>>>>,
    manual_disconnect: Arc<AtomicBool>,
    last_latency_ms: Arc<RwLock<Option<i64>>>,
}

impl RealtimeClientService {
    /// 创建服务实例。实例创建时不建立任何连接 (初始状态为 `Closed`)，
    /// 需要显式调用 [`connect`](Self::connect)。
    pub fn new(config: RealtimeConfig, token_store: Arc<dyn TokenStore>) -> Self {
        let activity = Arc::new(ActivityTracker::new(config.visibility_threshold));
        let presenter = Arc::new(NotificationPresenter::new(config.notification_ttl()));
        let dispatch = Arc::new(DispatchRegistry::new(
            Arc::clone(&activity),
            Arc::clone(&presenter),
        ));
        let reconnect_policy = ReconnectPolicy::new(
            config.base_reconnect_delay(),
            config.reconnect_backoff_factor,
            config.max_reconnect_attempts,
            config.max_reconnect_delay(),
        );

        Self {
            config,
            dispatch,
            activity,
            presenter,
            token_store,
            connection_state: Arc::new(RwLock::new(ConnectionState::Closed)),
            ws_send_channel: Arc::new(TokioMutex::new(None)),
            reconnect_policy: Arc::new(TokioMutex::new(reconnect_policy)),
            connection_task_handle: Arc::new(TokioMutex::new(None)),
            keepalive_task_handle: Arc::new(TokioMutex::new(None)),
            manual_disconnect: Arc::new(AtomicBool::new(false)),
            last_latency_ms: Arc::new(RwLock::new(None)),
        }
    }

    /// 启动连接生命周期。
    ///
    /// 若已存在旧的生命周期任务 (例如前一次 `connect()` 已进入 `Unavailable`
    /// 终态)，先将其终止，然后重置退避策略并从头开始。
    /// 此方法只负责启动后台任务，连接结果通过状态机观察。
    pub async fn connect(&self) -> Result<(), String> {
        // 终止可能存在的旧生命周期任务
        if let Some(old_handle) = self.connection_task_handle.lock().await.take() {
            info!("[SecureShare] (连接管理器) 发现旧的连接生命周期任务，正在终止...");
            old_handle.abort();
        }
        if let Some(old_keepalive) = self.keepalive_task_handle.lock().await.take() {
            old_keepalive.abort();
        }
        *self.ws_send_channel.lock().await = None; // 旧连接的发送端一并丢弃

        self.manual_disconnect.store(false, Ordering::SeqCst);
        self.reconnect_policy.lock().await.reset();
        *self.connection_state.write().await = ConnectionState::Connecting;

        let shared = ConnectionShared {
            config: self.config.clone(),
            dispatch: Arc::clone(&self.dispatch),
            presenter: Arc::clone(&self.presenter),
            token_store: Arc::clone(&self.token_store),
            connection_state: Arc::clone(&self.connection_state),
            ws_send_channel: Arc::clone(&self.ws_send_channel),
            reconnect_policy: Arc::clone(&self.reconnect_policy),
            keepalive_task_handle: Arc::clone(&self.keepalive_task_handle),
            manual_disconnect: Arc::clone(&self.manual_disconnect),
            last_latency_ms: Arc::clone(&self.last_latency_ms),
        };

        let handle = tokio::spawn(run_connection_lifecycle(shared));
        *self.connection_task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// 显式断开连接。终止生命周期任务与保活任务，关闭发送通道，
    /// 状态回到 `Closed`。显式断开不触发自动重连。
    pub async fn disconnect(&self) -> Result<(), String> {
        info!("[SecureShare] (连接管理器) 收到显式断开请求。");
        self.manual_disconnect.store(true, Ordering::SeqCst);

        if let Some(keepalive) = self.keepalive_task_handle.lock().await.take() {
            keepalive.abort();
        }

        // 尝试礼貌地关闭发送端；失败也不影响断开流程
        if let Some(mut sender) = self.ws_send_channel.lock().await.take() {
            if let Err(e) = sender.close().await {
                debug!("[SecureShare] (连接管理器) 关闭发送通道时出错 (忽略): {}", e);
            }
        }

        if let Some(handle) = self.connection_task_handle.lock().await.take() {
            handle.abort();
        }

        *self.connection_state.write().await = ConnectionState::Closed;
        *self.last_latency_ms.write().await = None;
        info!("[SecureShare] (连接管理器) 已断开，状态回到 closed。");
        Ok(())
    }

    /// 发送一条出站消息。
    ///
    /// 仅在连接处于 `Open` 状态时发送；其他状态下记录警告并返回 `false`，
    /// 消息被丢弃 (不排队)。返回 `true` 仅表示消息已写入连接，
    /// 不保证服务端已处理。
    pub async fn send(&self, message: OutboundMessage) -> bool {
        let state = *self.connection_state.read().await;
        if state != ConnectionState::Open {
            warn!(
                "[SecureShare] (连接管理器) 连接当前为 {} 状态，类型为 '{}' 的出站消息已丢弃。",
                state,
                message.message_type()
            );
            return false;
        }
        send_on_channel(&self.ws_send_channel, &message).await
    }

    /// 发布本地用户对某文件的活动 (view 或 edit)。
    pub async fn start_file_activity(&self, file_id: &str, action: FileActivityAction) -> bool {
        self.send_local_activity(file_id, action).await
    }

    /// 发布本地用户结束对某文件的活动。
    pub async fn end_file_activity(&self, file_id: &str) -> bool {
        self.send_local_activity(file_id, FileActivityAction::End).await
    }

    async fn send_local_activity(&self, file_id: &str, action: FileActivityAction) -> bool {
        let payload = FileActivityPayload {
            file_id: file_id.to_string(),
            action,
            timestamp: Some(Utc::now().timestamp_millis()),
            user_id: None, // 出站帧不携带用户身份，由服务端按连接补全
            username: None,
        };
        self.send(OutboundMessage::FileActivity(payload)).await
    }

    /// 上报本地某文件条目的最新可见比例。
    ///
    /// 可见比例跨越阈值时自动发布对应的活动帧：
    /// 升至阈值之上 → `view` 活动开始；跌破阈值 → `end`。
    /// 状态未跨越阈值时不发送任何帧。返回是否有帧被成功写入连接。
    pub async fn update_file_visibility(&self, file_id: &str, ratio: f64) -> bool {
        match self.activity.visibility_transition(file_id, ratio) {
            Some(VisibilityTransition::BecameVisible) => {
                self.start_file_activity(file_id, FileActivityAction::View).await
            }
            Some(VisibilityTransition::BecameHidden) => self.end_file_activity(file_id).await,
            None => false,
        }
    }

    /// 当前连接状态。
    pub async fn state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }

    /// 已消耗的重连尝试次数 (连接成功后归零)。
    pub async fn reconnect_attempts(&self) -> u32 {
        self.reconnect_policy.lock().await.attempts()
    }

    /// 最近一次保活往返的延迟 (毫秒)。连接断开后清空。
    pub async fn last_latency_ms(&self) -> Option<i64> {
        *self.last_latency_ms.read().await
    }

    /// 分发注册表访问器，供宿主注册消息处理器。
    pub fn dispatch(&self) -> &Arc<DispatchRegistry> {
        &self.dispatch
    }

    /// 活动跟踪器访问器，供宿主读取在场指示器与在线状态。
    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    /// 通知展示器访问器，供宿主读取/撤销活动通知。
    pub fn presenter(&self) -> &Arc<NotificationPresenter> {
        &self.presenter
    }
}

// 连接生命周期主循环：连接 → 会话 → 断开 → 退避重连，直到显式断开或策略耗尽。
async fn run_connection_lifecycle(shared: ConnectionShared) {
    let url = shared.config.socket_url();
    loop {
        *shared.connection_state.write().await = ConnectionState::Connecting;
        info!("[SecureShare] (连接任务) 正在连接到 {} ...", url);

        match connect_client(url.clone()).await {
            Ok(connection) => {
                run_session(&shared, connection).await;
            }
            Err(e) => {
                error!("[SecureShare] (连接任务) 连接 {} 失败: {}", url, e);
                *shared.connection_state.write().await = ConnectionState::Closed;
            }
        }

        if shared.manual_disconnect.load(Ordering::SeqCst) {
            debug!("[SecureShare] (连接任务) 检测到显式断开标志，生命周期任务结束。");
            break;
        }

        // 安排下一次重连或进入终态
        let next_delay = {
            let mut policy = shared.reconnect_policy.lock().await;
            policy.next_delay()
        };
        match next_delay {
            Some(delay) => {
                *shared.connection_state.write().await = ConnectionState::Reconnecting;
                let attempts = shared.reconnect_policy.lock().await.attempts();
                warn!(
                    "[SecureShare] (连接任务) 连接已断开，将在 {:?} 后进行第 {}/{} 次重连...",
                    delay, attempts, shared.config.max_reconnect_attempts
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                *shared.connection_state.write().await = ConnectionState::Unavailable;
                error!(
                    "[SecureShare] (连接任务) 重连尝试已耗尽 ({} 次)，进入 unavailable 终态。",
                    shared.config.max_reconnect_attempts
                );
                shared.presenter.show_degraded_notice();
                break;
            }
        }
    }
}

// 单次连接会话：认证、保活、接收循环，直到连接结束。
async fn run_session(
    shared: &ConnectionShared,
    connection: realtime_ws_utils::client::transport::ClientConnection,
) {
    let realtime_ws_utils::client::transport::ClientConnection { ws_sender, mut ws_receiver } =
        connection;

    // 连接成功：重置退避，存入发送端，进入 Open
    shared.reconnect_policy.lock().await.reset();
    *shared.ws_send_channel.lock().await = Some(ws_sender);
    *shared.connection_state.write().await = ConnectionState::Open;
    info!("[SecureShare] (连接任务) 连接已建立，状态进入 open。");

    // 有令牌时立即发送认证消息；无令牌则保持未认证状态
    match shared.token_store.get_token() {
        Some(token) => {
            let auth = OutboundMessage::Authenticate(AuthenticatePayload { token });
            if send_on_channel(&shared.ws_send_channel, &auth).await {
                info!("[SecureShare] (连接任务) 认证消息已发送。");
            }
        }
        None => {
            debug!("[SecureShare] (连接任务) 当前无会话令牌，跳过认证消息。");
        }
    }

    // 启动保活任务
    {
        let keepalive = tokio::spawn(run_keepalive_loop(
            Arc::clone(&shared.ws_send_channel),
            Arc::clone(&shared.connection_state),
            shared.config.keepalive_interval(),
        ));
        let mut handle_guard = shared.keepalive_task_handle.lock().await;
        if let Some(old) = handle_guard.replace(keepalive) {
            old.abort();
        }
    }

    // 接收循环
    loop {
        match receive_message(&mut ws_receiver).await {
            Some(Ok(message)) => {
                if let InboundMessage::Pong(pong) = &message {
                    let latency = Utc::now().timestamp_millis() - pong.timestamp;
                    *shared.last_latency_ms.write().await = Some(latency);
                    debug!("[SecureShare] (连接任务) 收到 pong，往返延迟约 {} 毫秒。", latency);
                }
                shared.dispatch.dispatch(&message);
            }
            Some(Err(WsError::DeserializationError(detail))) => {
                // 非法帧只丢弃本帧，连接继续
                warn!("[SecureShare] (连接任务) 丢弃一条无法解码的入站帧: {}", detail);
            }
            Some(Err(WsError::Message(detail))) => {
                warn!("[SecureShare] (连接任务) 丢弃一条非预期的入站消息: {}", detail);
            }
            Some(Err(e)) => {
                error!("[SecureShare] (连接任务) 接收循环发生传输层错误: {}", e);
                break;
            }
            None => {
                info!("[SecureShare] (连接任务) 连接已由对端关闭或流结束。");
                break;
            }
        }
    }

    // 会话收尾：终止保活，清空发送端与延迟，回到 Closed
    if let Some(keepalive) = shared.keepalive_task_handle.lock().await.take() {
        keepalive.abort();
    }
    *shared.ws_send_channel.lock().await = None;
    *shared.last_latency_ms.write().await = None;
    *shared.connection_state.write().await = ConnectionState::Closed;
}

// 保活循环：按固定间隔发送 ping，连接不再为 Open 时退出。
async fn run_keepalive_loop(
    channel: WsSendChannel,
    state: Arc<RwLock<ConnectionState>>,
    interval: std::time::Duration,
) {
    loop {
        tokio::time::sleep(interval).await;
        if *state.read().await != ConnectionState::Open {
            debug!("[SecureShare] (保活任务) 连接不再处于 open 状态，保活循环退出。");
            break;
        }
        let ping = OutboundMessage::Ping(PingPayload { timestamp: Utc::now().timestamp_millis() });
        if !send_on_channel(&channel, &ping).await {
            warn!("[SecureShare] (保活任务) 保活 ping 发送失败，保活循环退出。");
            break;
        }
        debug!("[SecureShare] (保活任务) 已发送保活 ping。");
    }
}

// 经由共享发送通道发送一条出站消息。编码失败或通道为空时返回 false。
async fn send_on_channel(channel: &WsSendChannel, message: &OutboundMessage) -> bool {
    let frame = match message.encode() {
        Ok(frame) => frame,
        Err(e) => {
            error!(
                "[SecureShare] (连接管理器) 编码类型为 '{}' 的出站消息失败: {}",
                message.message_type(),
                e
            );
            return false;
        }
    };

    let mut guard = channel.lock().await;
    match guard.as_mut() {
        Some(sender) => match sender.send(TungsteniteMessage::Text(frame)).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    "[SecureShare] (连接管理器) 发送类型为 '{}' 的出站消息失败: {}",
                    message.message_type(),
                    e
                );
                false
            }
        },
        None => {
            warn!(
                "[SecureShare] (连接管理器) 发送通道为空，类型为 '{}' 的出站消息已丢弃。",
                message.message_type()
            );
            false
        }
    }
}
