// realtime_ws_utils/src/server/transport.rs

//! 包含服务端 WebSocket 监听、接受连接和通信逻辑。
//!
//! 本库的使用场景中服务端是一个黑盒对端 (真实服务由后端提供)；
//! 此传输层主要供集成测试使用，用来在本地扮演那个对端：
//! 接受连接、读写原始 JSON 文本帧、按测试脚本关闭连接。

use crate::error::WsError;
use log::{error, info};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async};

/// `WsStream` 是一个类型别名，代表经过 WebSocket 握手后的 TCP 流。
pub type WsStream = WebSocketStream<TcpStream>;

/// `ServerTransport` 结构体负责处理 WebSocket 服务端的监听和连接接受。
pub struct ServerTransport;

impl ServerTransport {
    /// 启动 WebSocket 服务器并开始监听指定的地址。
    ///
    /// 对于每一个成功建立的 WebSocket 连接，都会在独立的 Tokio 任务中调用
    /// `on_connect` 回调函数进行处理。这个服务器会持续运行，
    /// 直到发生不可恢复的错误 (例如 TCP 监听器绑定失败) 或其所在任务被中止。
    ///
    /// # Arguments
    /// * `addr`: 服务器监听的 `SocketAddr` (例如 "127.0.0.1:8080")。
    /// * `on_connect`: 新的 WebSocket 连接建立时被调用的回调函数，
    ///   接收建立的 `WsStream` 与对端 `SocketAddr`。
    ///   必须是 `async` 的，并且 `Send + Sync + Clone + 'static`，
    ///   因为它会在一个新的 Tokio 任务中为每个连接执行。
    ///
    /// # Returns
    /// * `Result<(), WsError>`: 监听器启动失败时返回错误；否则此函数将无限期运行。
    pub async fn start<F, Fut>(addr: SocketAddr, on_connect: F) -> Result<(), WsError>
    where
        F: Fn(WsStream, SocketAddr) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&addr).await.map_err(WsError::IoError)?;
        info!("WebSocket 服务器正在监听地址: {}", addr);

        // 无限循环以接受新的连接
        loop {
            match listener.accept().await {
                Ok((tcp_stream, peer_addr)) => {
                    info!("从 {} 接受了新的 TCP 连接", peer_addr);
                    let on_connect_callback = on_connect.clone();

                    // 为每个连接创建一个新的 Tokio 任务来处理握手和后续逻辑
                    tokio::spawn(async move {
                        match accept_async(tcp_stream).await {
                            Ok(ws_stream) => {
                                info!("与 {} 的 WebSocket 握手成功", peer_addr);
                                on_connect_callback(ws_stream, peer_addr).await;
                            }
                            Err(e) => {
                                // 握手失败只影响此连接，记录后终止该连接的任务
                                error!("与 {} 的 WebSocket 握手失败: {}", peer_addr, e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("接受 TCP 连接失败: {}。服务器将继续运行。", e);
                }
            }
        }
    }
}
