//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::net::TcpListener;

use hdconnect::{router, AppState, Config, DeliveryError, Mailer, OutboundEmail};

/// Mailer that records every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail_with_status: Option<u16>,
}

impl RecordingMailer {
    pub fn failing(status: u16) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with_status: Some(status),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send<'a>(
        &'a self,
        email: &'a OutboundEmail,
    ) -> BoxFuture<'a, Result<String, DeliveryError>> {
        async move {
            if let Some(status) = self.fail_with_status {
                return Err(DeliveryError::Rejected {
                    status,
                    body: "provider down".to_string(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push(email.clone());
            Ok(format!("test-{}", sent.len()))
        }
        .boxed()
    }
}

/// HTTP client that never routes loopback traffic through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Serve the application on an ephemeral port.
pub async fn spawn_app(config: Config, mailer: Arc<dyn Mailer>) -> SocketAddr {
    spawn_state(AppState::new(config, mailer)).await
}

/// Serve a prebuilt state on an ephemeral port.
pub async fn spawn_state(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}
