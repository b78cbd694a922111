use crate::auth::controller::AuthController;
use crate::constants::{BAD_REQUEST, REQUEST_READ_TIMEOUT, REQUEST_TIMEOUT};
use crate::error::CustomError;
use crate::req::Method::{GET, POST};
use crate::req::Request;
use crate::trade::controller::TradeController;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot::Receiver;
use tokio::time::timeout;

pub struct Server {
    auth: Arc<AuthController>,
    trade: Arc<TradeController>,
    addr: String,
}

impl Server {
    pub fn new(auth: Arc<AuthController>, trade: Arc<TradeController>, addr: String) -> Self {
        Self { auth, trade, addr }
    }

    pub async fn start(&self, mut shutdown_rx: Receiver<()>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;
        tracing::info!("Server running on http://{}", self.addr);

        loop {
            tokio::select! {
                conn = listener.accept() => {
                    let (mut stream, peer) = match conn {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!("unable to accept: {}", e);
                            continue;
                        }
                    };

                    let auth = Arc::clone(&self.auth);
                    let trade = Arc::clone(&self.trade);

                    tokio::spawn(async move {
                        let (reader, writer) = stream.split();
                        if let Err(e) = Self::handle_client(reader, writer, &auth, &trade).await {
                            tracing::warn!(%peer, "Connection error: {:#}", e);
                        }
                    });
                }
                // Shutdown signal check
                _ = &mut shutdown_rx => {
                    tracing::info!("Shutting down server...");
                    break;
                }
            }
        }
        Ok(())
    }

    pub async fn handle_client<Reader, Writer>(
        reader: Reader,
        mut writer: Writer,
        auth: &AuthController,
        trade: &TradeController,
    ) -> Result<()>
    where
        Reader: AsyncRead + Unpin,
        Writer: AsyncWrite + Unpin,
    {
        let received = timeout(REQUEST_READ_TIMEOUT, Request::new(reader)).await;
        let (status_line, content) = match received {
            Err(_) => {
                tracing::debug!("Request not received in {:?}", REQUEST_READ_TIMEOUT);
                (REQUEST_TIMEOUT.to_string(), "request timeout".to_string())
            }
            Ok(Ok(request)) => Self::route(&request, auth, trade).await,
            Ok(Err(e)) => match e.downcast::<CustomError>() {
                Ok(e) => e.into_response(),
                Err(e) => {
                    tracing::debug!("Malformed request: {:#}", e);
                    (BAD_REQUEST.to_string(), "malformed request".to_string())
                }
            },
        };

        writer
            .write_all(format!("{}{}", status_line, content).as_bytes())
            .await
            .context("Failed to write")?;
        writer.shutdown().await.context("Failed to close")
    }

    async fn route(
        request: &Request,
        auth: &AuthController,
        trade: &TradeController,
    ) -> (String, String) {
        tracing::debug!(method = ?request.method, path = %request.path, "request");
        match (&request.method, request.path.as_str()) {
            (POST, "/login") => auth.login(request).await,
            (POST, "/register") => auth.register(request).await,
            (GET | POST, "/logout") => auth.logout(request).await,
            (_, "/login" | "/register") => CustomError::MethodNotAllowed.into_response(),
            (_, path) if TradeController::serves(path) => match auth.authenticate(request).await {
                Ok(user) => trade.handle(request, &user).await,
                Err(e) => e.into_response(),
            },
            _ => CustomError::NotFound.into_response(),
        }
    }
}
