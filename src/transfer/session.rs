//! Secure transfer session trait and FTPS implementation.
//!
//! The pipeline talks to the remote filesystem through the narrow
//! [`TransferSession`] seam; the production implementation wraps an
//! explicit-TLS FTP stream. The control connection is inherently
//! serial, so the session guards the stream with a mutex and callers
//! are free to dispatch operations concurrently.

use async_trait::async_trait;
use std::path::Path;
use suppaftp::async_native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{AsyncNativeTlsConnector, AsyncNativeTlsFtpStream, FtpError, Status};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::azure::PublishEndpoint;
use crate::error::{PublishError, Result, TransferError};

/// An established secure transfer session.
#[async_trait]
pub trait TransferSession: Send + Sync {
    /// Creates a remote directory.
    async fn make_dir(&self, path: &str) -> Result<()>;

    /// Uploads a local file to the given remote path.
    async fn put_file(&self, local: &Path, remote: &str) -> Result<()>;

    /// Ends the session.
    async fn close(&self) -> Result<()>;
}

/// Establishes transfer sessions against a publish endpoint.
#[async_trait]
pub trait TransferConnector: Send + Sync {
    /// Opens a session to the endpoint.
    async fn connect(&self, endpoint: &PublishEndpoint) -> Result<Box<dyn TransferSession>>;
}

/// Connector for explicit-TLS FTP endpoints.
#[derive(Debug, Default)]
pub struct FtpsConnector;

impl FtpsConnector {
    /// Creates a new FTPS connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferConnector for FtpsConnector {
    async fn connect(&self, endpoint: &PublishEndpoint) -> Result<Box<dyn TransferSession>> {
        let address = format!("{}:{}", endpoint.host, endpoint.port);
        info!("Opening FTPS session to {address}");

        let connect_err = |e: FtpError| {
            PublishError::Transfer(TransferError::Connect {
                host: endpoint.host.clone(),
                message: e.to_string(),
            })
        };

        let stream = AsyncNativeTlsFtpStream::connect(&address)
            .await
            .map_err(connect_err)?;

        let mut stream = stream
            .into_secure(
                AsyncNativeTlsConnector::from(TlsConnector::new()),
                &endpoint.host,
            )
            .await
            .map_err(connect_err)?;

        let username = endpoint.username.as_deref().ok_or_else(|| {
            PublishError::Transfer(TransferError::session(
                "no deployment username available; set SITEWRIGHT_DEPLOYMENT_USER",
            ))
        })?;
        let password = endpoint.password.as_deref().ok_or_else(|| {
            PublishError::Transfer(TransferError::session(
                "no deployment password available; set SITEWRIGHT_DEPLOYMENT_PASSWORD",
            ))
        })?;

        stream.login(username, password).await.map_err(|e| {
            PublishError::Transfer(TransferError::Connect {
                host: endpoint.host.clone(),
                message: format!("login failed: {e}"),
            })
        })?;

        stream
            .transfer_type(FileType::Binary)
            .await
            .map_err(|e| PublishError::Transfer(TransferError::session(e.to_string())))?;

        debug!("FTPS session established");

        Ok(Box::new(FtpsSession {
            stream: Mutex::new(stream),
        }))
    }
}

/// An open explicit-TLS FTP session.
pub struct FtpsSession {
    /// Control connection; FTP transfers are serial per connection.
    stream: Mutex<suppaftp::AsyncNativeTlsFtpStream>,
}

#[async_trait]
impl TransferSession for FtpsSession {
    async fn make_dir(&self, path: &str) -> Result<()> {
        let mut stream = self.stream.lock().await;

        match stream.mkdir(path).await {
            Ok(()) => Ok(()),
            // 550 on MKD: the directory is already there from an earlier
            // publish; a genuinely unusable path fails on upload instead.
            Err(FtpError::UnexpectedResponse(ref response))
                if response.status == Status::FileUnavailable =>
            {
                debug!("Remote directory '{path}' already exists");
                Ok(())
            }
            Err(e) => Err(PublishError::Transfer(TransferError::MakeDir {
                path: path.to_string(),
                message: e.to_string(),
            })),
        }
    }

    async fn put_file(&self, local: &Path, remote: &str) -> Result<()> {
        let content = tokio::fs::read(local).await?;
        let mut reader = futures::io::Cursor::new(content);

        let mut stream = self.stream.lock().await;
        stream.put_file(remote, &mut reader).await.map_err(|e| {
            PublishError::Transfer(TransferError::Upload {
                remote: remote.to_string(),
                message: e.to_string(),
            })
        })?;

        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut stream = self.stream.lock().await;
        stream
            .quit()
            .await
            .map_err(|e| PublishError::Transfer(TransferError::session(e.to_string())))?;

        debug!("FTPS session closed");
        Ok(())
    }
}
