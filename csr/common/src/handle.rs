use nameth::NamedEnumValues as _;
use nameth::nameth;
use tokio::sync::oneshot;
use tracing::info;
use tracing::warn;

/// A handle to a server running in the background.
///
/// Dropping the handle or explicitly calling [ServerHandle::stop] stops the server.
#[must_use]
pub struct ServerHandle<R> {
    shutdown_tx: Option<oneshot::Sender<String>>,
    terminated_rx: Option<oneshot::Receiver<R>>,
}

/// The signals given to the server when the [ServerHandle] is created.
pub struct ServerSignals<R> {
    /// Resolves when the server must shutdown.
    pub shutdown: ShutdownSignal,

    /// The server reports it has fully terminated through this channel.
    pub terminated: oneshot::Sender<R>,
}

pub struct ShutdownSignal(oneshot::Receiver<String>);

impl ShutdownSignal {
    /// Waits until the [ServerHandle] is stopped or dropped.
    pub async fn wait(self) {
        match self.0.await {
            Ok(reason) => info!("Server shutdown: {reason}"),
            Err(oneshot::error::RecvError { .. }) => warn!("Server handle dropped!"),
        }
    }
}

impl<R> ServerHandle<R> {
    /// Creates a new [ServerHandle].
    ///
    /// This method should be called by the server on startup, it also returns
    /// the signals that the server uses to observe shutdown and report termination.
    pub fn new() -> (ServerSignals<R>, Self) {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (terminated_tx, terminated_rx) = oneshot::channel();
        let handle = Self {
            shutdown_tx: Some(shutdown_tx),
            terminated_rx: Some(terminated_rx),
        };
        let signals = ServerSignals {
            shutdown: ShutdownSignal(shutdown_rx),
            terminated: terminated_tx,
        };
        (signals, handle)
    }

    /// Stops the server and returns the result of stopping the server.
    pub async fn stop(mut self, reason: impl std::fmt::Display) -> Result<R, ServerStopError> {
        let shutdown_tx = self
            .shutdown_tx
            .take()
            .ok_or(ServerStopError::NotRunning)?;
        shutdown_tx
            .send(reason.to_string())
            .map_err(|_| ServerStopError::NotRunning)?;
        self.stopped().await
    }

    /// Waits for the server to terminate, without requesting a shutdown.
    pub async fn stopped(mut self) -> Result<R, ServerStopError> {
        let terminated_rx = self
            .terminated_rx
            .take()
            .ok_or(ServerStopError::ShutdownError)?;
        terminated_rx
            .await
            .map_err(|_| ServerStopError::ShutdownError)
    }
}

impl<R> Drop for ServerHandle<R> {
    fn drop(&mut self) {
        if self.terminated_rx.is_some() && !std::thread::panicking() {
            warn!("The server was not shutdown");
        }
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum ServerStopError {
    #[error("[{n}] The server was not running", n = self.name())]
    NotRunning,

    #[error("[{n}] The server did not fully shutdown", n = self.name())]
    ShutdownError,
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::ServerHandle;
    use super::ServerSignals;
    use super::ServerStopError;

    #[tokio::test]
    async fn stop() -> Result<(), Box<dyn Error>> {
        let (ServerSignals { shutdown, terminated }, handle) = ServerHandle::new();
        tokio::spawn(async move {
            shutdown.wait().await;
            let _: Result<(), &str> = terminated.send("done");
        });
        assert_eq!("done", handle.stop("End of test").await?);
        Ok(())
    }

    #[tokio::test]
    async fn not_terminated() {
        let (signals, handle) = ServerHandle::<()>::new();
        drop(signals);
        let error = handle.stop("End of test").await.unwrap_err();
        assert!(matches!(error, ServerStopError::NotRunning));
        assert_eq!("[NotRunning] The server was not running", error.to_string());
    }
}
