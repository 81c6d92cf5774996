// realtime_ws_utils/src/client/transport.rs

//! 客户端 WebSocket 传输层核心逻辑。
//!
//! 本模块提供了 `realtime_ws_utils` 库中用于客户端 WebSocket 通信的主要功能。
//! 它包括建立与服务器的连接、发送 `OutboundMessage`、接收并解码 `InboundMessage`，
//! 以及处理底层连接事件的抽象。其设计旨在简化客户端应用程序
//! (如 `secure_share_client` 的连接管理器) 与 WebSocket 服务器的异步交互。

use crate::error::WsError;
use crate::message::{InboundMessage, OutboundMessage};
use futures_util::{
    SinkExt,   // 为 Sink (如 SplitSink) 提供额外的方法，如 send()
    StreamExt, // 为 Stream (如 SplitStream) 提供额外的方法，如 next()
    stream::{SplitSink, SplitStream}, // 用于将 WebSocket 流拆分为发送端和接收端
};
use log::{debug, error, info};
use tokio_tungstenite::{
    WebSocketStream,
    connect_async,
    tungstenite::Error as TungsteniteError,
    tungstenite::protocol::Message, // 底层 WebSocket 消息枚举 (Text, Binary, Ping, Pong, Close)
};
use url::Url;

/// `ClientWsStream` 类型别名，代表一个可能经过 TLS 加密的 TCP WebSocket 流。
/// 这是 `tokio-tungstenite` 库在客户端连接成功后返回的典型流类型。
pub type ClientWsStream = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// `ClientConnection` 结构体代表一个活动的客户端 WebSocket 连接。
///
/// 它封装了与服务器进行通信所需的发送端 (`SplitSink`) 和接收端 (`SplitStream`)。
/// 实例在成功连接到服务器后创建。连接管理器通常会将发送端单独存储
/// (以便保活任务与业务发送共用)，并在接收循环中轮询接收端。
pub struct ClientConnection {
    /// 用于向 WebSocket 服务器异步发送消息的 `Sink` (发送端)。
    pub ws_sender: SplitSink<ClientWsStream, Message>,
    /// 用于从 WebSocket 服务器异步接收消息的 `Stream` (接收端)。
    pub ws_receiver: SplitStream<ClientWsStream>,
}

impl ClientConnection {
    /// 异步向 WebSocket 服务器发送一个 `OutboundMessage`。
    ///
    /// 该方法首先将消息编码为线上 JSON 帧 (注入 `"type"` 字段)，
    /// 然后通过 WebSocket 连接以文本帧发送出去。
    ///
    /// # Arguments
    /// * `message` - 对要发送的 `OutboundMessage` 的引用。
    ///
    /// # Returns
    /// * `Result<(), WsError>` - 编码或发送失败时返回相应的 `WsError`。
    pub async fn send_message(&mut self, message: &OutboundMessage) -> Result<(), WsError> {
        let frame = message.encode()?;
        debug!("客户端：准备发送消息: {}", frame);
        self.ws_sender.send(Message::Text(frame)).await?;
        debug!("客户端：消息已成功发送 (类型: {})", message.message_type());
        Ok(())
    }
}

/// 异步连接到指定的 WebSocket 服务器。
///
/// 此函数尝试解析给定的 URL 字符串，然后使用 `tokio-tungstenite` 的 `connect_async`
/// 建立与服务器的 WebSocket 连接。如果连接和握手成功，它会将返回的 `WebSocketStream`
/// 分割成发送端和接收端，并封装在 `ClientConnection` 结构体中返回。
///
/// # Arguments
/// * `url_str` - WebSocket 服务器的完整 URL 字符串
///   (例如 "ws://127.0.0.1:8080/ws/secure-file/" 或 "wss://example.com/ws/secure-file/")。
///
/// # Returns
/// * `Result<ClientConnection, WsError>` - 连接成功时返回包含发送和接收端的
///   `ClientConnection`；URL 解析失败、连接失败或握手出错时返回相应的 `WsError`。
pub async fn connect_client(url_str: String) -> Result<ClientConnection, WsError> {
    info!("客户端：开始尝试连接到 WebSocket 服务器，URL: {}", url_str);
    let parsed_url = Url::parse(&url_str)
        .map_err(|e| WsError::InvalidUrl(format!("无效的 WebSocket URL '{}': {}", url_str, e)))?;

    match connect_async(parsed_url.as_str()).await {
        Ok((ws_stream, response)) => {
            info!("客户端：已成功连接到 {} (HTTP 状态码: {})", url_str, response.status());
            let (ws_sender, ws_receiver) = ws_stream.split();
            Ok(ClientConnection { ws_sender, ws_receiver })
        }
        Err(e) => {
            error!("客户端：连接到 {} 失败，错误: {}", url_str, e);
            Err(WsError::WebSocketProtocolError(e))
        }
    }
}

/// 从给定的 WebSocket 接收流中异步接收并尝试解码一个 `InboundMessage`。
///
/// 此函数处理单个传入的 WebSocket 消息事件。它会跳过非业务相关的控制帧
/// (Ping/Pong 由底层库自动处理)。收到文本帧时，按线上协议解码为
/// `InboundMessage`；解码失败返回 `Some(Err(..))`，由调用方记录并丢弃
/// (非法帧绝不会进入分发流程)。收到 Close 帧或流结束时返回 `None`。
///
/// **注意：** 此函数设计为处理单个消息的接收和解码。在一个持续的客户端
/// 会话中，调用方需要在循环中重复调用此函数来处理所有传入消息。
///
/// # Returns
/// * `Option<Result<InboundMessage, WsError>>`:
///     - `Some(Ok(message))`: 成功接收并解码了一条消息。
///     - `Some(Err(ws_error))`: 接收或解码过程中发生错误。
///     - `None`: WebSocket 连接已关闭。
pub async fn receive_message(
    ws_receiver: &mut SplitStream<ClientWsStream>,
) -> Option<Result<InboundMessage, WsError>> {
    // 内部循环用于跳过那些不映射到应用层消息的底层控制帧。
    loop {
        match ws_receiver.next().await {
            Some(msg_result) => match msg_result {
                Ok(msg) => match msg {
                    Message::Text(text) => {
                        debug!("客户端：收到原始文本消息，内容: '{}'", text);
                        break Some(InboundMessage::decode(&text));
                    }
                    Message::Binary(bin) => {
                        debug!("客户端：收到原始二进制消息，长度: {} 字节", bin.len());
                        // 本协议只使用文本帧，二进制帧视为错误
                        break Some(Err(WsError::Message(
                            "客户端收到了非预期的 WebSocket 二进制消息".to_string(),
                        )));
                    }
                    Message::Ping(ping_data) => {
                        // Ping 帧由 tokio-tungstenite 自动回复 Pong，应用层无需处理
                        debug!("客户端：收到 Ping 控制帧，数据: {:?} (由底层库自动处理)", ping_data);
                    }
                    Message::Pong(pong_data) => {
                        // 底层 Pong 控制帧与应用层的 "pong" 消息无关，跳过
                        debug!("客户端：收到 Pong 控制帧，数据: {:?}", pong_data);
                    }
                    Message::Close(close_frame) => {
                        debug!("客户端：收到 Close 控制帧，详细信息: {:?}", close_frame);
                        break None; // 连接已结束
                    }
                    Message::Frame(_) => {
                        debug!("客户端：收到一个非预期的底层原始 Frame 类型消息，正在跳过。");
                    }
                },
                Err(e) => match e {
                    TungsteniteError::ConnectionClosed | TungsteniteError::AlreadyClosed => {
                        debug!("客户端：连接已关闭 (在 ws_receiver.next() 期间检测到)。");
                        break None;
                    }
                    _ => {
                        error!("客户端：从 WebSocket 流接收消息时发生底层错误: {}", e);
                        break Some(Err(WsError::WebSocketProtocolError(e)));
                    }
                },
            },
            None => {
                debug!("客户端：WebSocket 接收流已结束 (ws_receiver.next() 返回 None)。");
                break None;
            }
        }
    }
}
