use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::pin::Pin;
use std::sync::Arc;

use axum_server::Handle;
use csr_gateway_common::handle::ServerHandle;
use csr_gateway_common::handle::ServerSignals;
use csr_gateway_common::tracing::EnableTracingError;
use futures::FutureExt;
use futures::future::Shared;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use tokio::sync::oneshot;
use tracing::Instrument as _;
use tracing::Span;
use tracing::debug;
use tracing::info;
use tracing::warn;

use self::service_config::CsrServiceConfig;
use self::sessions::CsrSessions;

mod app;
pub mod generate_csr;
pub mod issue_certificate;
pub mod service_config;
pub mod sessions;


/// Name of the response header that carries the [SessionId](sessions::SessionId)
/// of a generated certificate request.
pub const SESSION_ID_HEADER: &str = "x-csr-session-id";

pub struct Server<C: CsrServiceConfig> {
    shutdown: Shared<Pin<Box<dyn Future<Output = ()> + Send>>>,
    config: C,
    authority: C::Authority,
    sessions: CsrSessions,
}

impl<C: CsrServiceConfig> Server<C> {
    pub async fn run(config: C) -> Result<(Arc<Self>, ServerHandle<()>), ServerError> {
        if config.enable_tracing() {
            csr_gateway_common::tracing::enable_tracing()?;
        }

        let (
            ServerSignals {
                shutdown,
                terminated: terminated_tx,
            },
            handle,
        ) = ServerHandle::new();
        let shutdown: Pin<Box<dyn Future<Output = ()> + Send>> = Box::pin(shutdown.wait());

        let authority = config.authority();
        debug!("Certificate authority: {authority:?}");

        let server = Arc::new(Self {
            shutdown: shutdown.shared(),
            sessions: CsrSessions::new(config.session_ttl()),
            authority,
            config,
        });

        let (host, port) = (server.config.host(), server.config.port());
        let socket_addrs = (host, port).to_socket_addrs();
        let socket_addrs = socket_addrs.map_err(|error| ServerError::ToSocketAddrs {
            host: host.to_owned(),
            port,
            error,
        })?;

        let mut terminated = vec![];

        for socket_addr in socket_addrs {
            debug!("Setup server on {socket_addr}");
            let task = server.clone().run_endpoint(socket_addr, Span::current());
            let (terminated_tx, terminated_rx) = oneshot::channel();
            terminated.push(terminated_rx);
            tokio::spawn(async move {
                match task.await {
                    Ok(()) => (),
                    Err(error) => warn!("Failed {error}"),
                }
                let _: Result<(), ()> = terminated_tx.send(());
            });
        }

        {
            use futures::future::join_all;
            let all_terminated = join_all(terminated);
            tokio::spawn(
                async move {
                    let _: Vec<Result<(), oneshot::error::RecvError>> = all_terminated.await;
                    let _: Result<(), ()> = terminated_tx.send(());
                }
                .in_current_span(),
            );
        }

        info!("Server started on {host}:{port}");
        Ok((server, handle))
    }

    async fn run_endpoint(
        self: Arc<Self>,
        socket_addr: SocketAddr,
        span: Span,
    ) -> Result<(), RunServerError> {
        let app = self.make_app(span);

        let handle = Handle::new();
        let axum_server = axum_server::bind(socket_addr).handle(handle.clone());

        let shutdown = self.shutdown.clone();
        tokio::spawn(
            async move {
                let () = shutdown.await;
                handle.shutdown();
            }
            .in_current_span(),
        );

        debug!("Serving...");
        let () = axum_server
            .serve(app.into_make_service())
            .await
            .map_err(RunServerError::Serve)?;
        debug!("Serving: done");
        Ok(())
    }

    pub fn sessions(&self) -> &CsrSessions {
        &self.sessions
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("[{n}] {0}", n = self.name())]
    EnableTracing(#[from] EnableTracingError),

    #[error("[{n}] Failed to get socket address for {host}:{port}: {error}", n = self.name())]
    ToSocketAddrs {
        host: String,
        port: u16,
        error: std::io::Error,
    },
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum RunServerError {
    #[error("[{n}] {0}", n = self.name())]
    Serve(std::io::Error),
}
