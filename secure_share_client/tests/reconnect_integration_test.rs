// secure_share_client/tests/reconnect_integration_test.rs

//! 重连耗尽集成测试：服务端不可达时，连接管理器按退避策略重试，
//! 耗尽后进入 unavailable 终态并展示持久化的降级提示。

use log::LevelFilter;
use secure_share_client::notify::DEGRADED_NOTICE_KIND;
use secure_share_client::token::InMemoryTokenStore;
use secure_share_client::ws_client::{ConnectionState, RealtimeClientService};
use secure_share_client::RealtimeConfig;
use std::sync::Arc;
use tokio::time::{Duration, sleep, timeout};

fn init_test_logger() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Info)
        .is_test(true)
        .try_init();
}

// 绑定随机端口再释放，得到一个当前无人监听的地址
async fn dead_addr() -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("无法绑定到随机端口");
    let addr = listener.local_addr().expect("无法获取本地监听地址");
    drop(listener);
    addr
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconnect_exhaustion_enters_unavailable_with_degraded_notice() {
    init_test_logger();

    let addr = dead_addr().await;
    let mut config = RealtimeConfig::default();
    config.host = addr.to_string();
    config.max_reconnect_attempts = 3;
    config.base_reconnect_delay_ms = 30; // 测试用的短退避序列
    config.reconnect_backoff_factor = 1.5;

    let service = RealtimeClientService::new(config, Arc::new(InMemoryTokenStore::new()));
    service.connect().await.expect("启动连接生命周期失败");

    // 等待退避耗尽 (30 + 45 + 67.5 毫秒加上若干次连接失败的耗时)
    timeout(Duration::from_secs(5), async {
        loop {
            if service.state().await == ConnectionState::Unavailable {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("等待进入 unavailable 终态超时");

    assert_eq!(service.reconnect_attempts().await, 3, "应恰好消耗全部重连尝试");

    // 降级提示：持久化、类别为 websocket-error
    let notices = service.presenter().active_notices();
    assert_eq!(notices.len(), 1, "应恰好展示一条降级提示");
    assert_eq!(notices[0].kind, DEGRADED_NOTICE_KIND);
    assert!(notices[0].persistent, "降级提示应为持久化通知");

    // 终态稳定：不再有新的重连活动
    sleep(Duration::from_millis(300)).await;
    assert_eq!(service.state().await, ConnectionState::Unavailable);
    assert_eq!(service.reconnect_attempts().await, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_explicit_connect_leaves_unavailable_state() {
    init_test_logger();

    let addr = dead_addr().await;
    let mut config = RealtimeConfig::default();
    config.host = addr.to_string();
    config.max_reconnect_attempts = 1;
    config.base_reconnect_delay_ms = 20;

    let service = RealtimeClientService::new(config, Arc::new(InMemoryTokenStore::new()));
    service.connect().await.expect("启动连接生命周期失败");

    timeout(Duration::from_secs(5), async {
        loop {
            if service.state().await == ConnectionState::Unavailable {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("等待进入 unavailable 终态超时");

    let first_round_notices = service.presenter().active_notices().len();
    assert_eq!(first_round_notices, 1);

    // 再次显式 connect() 应重置退避并重新走完整的重连流程，
    // 耗尽后再次进入终态并追加一条降级提示。
    service.connect().await.expect("重新启动连接生命周期失败");
    timeout(Duration::from_secs(5), async {
        loop {
            if service.presenter().active_notices().len() == 2 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("等待第二轮重连耗尽超时");

    assert_eq!(service.state().await, ConnectionState::Unavailable);
    assert_eq!(service.reconnect_attempts().await, 1, "第二轮应重新从零开始计数");

    let _ = service.disconnect().await;
}
