use std::future::ready;
use std::sync::Arc;

use axum::Router;
use axum::routing::any;
use axum::routing::get;
use tower_http::trace::DefaultMakeSpan;
use tower_http::trace::TraceLayer;
use tracing::Instrument as _;
use tracing::Level;
use tracing::Span;

use super::Server;
use super::service_config::CsrServiceConfig;

impl<C: CsrServiceConfig> Server<C> {
    pub(super) fn make_app(self: &Arc<Self>, span: Span) -> Router {
        let generate_csr = {
            let server = self.clone();
            let span = span.clone();
            move || {
                let server = server.clone();
                server.generate_csr().instrument(span.clone())
            }
        };
        let issue_certificate = {
            let server = self.clone();
            move |query| {
                let server = server.clone();
                server.issue_certificate(query).instrument(span.clone())
            }
        };
        Router::new()
            .route("/status", get(|| ready("UP")))
            .route("/generate-csr", any(generate_csr))
            .route("/issue-certificate", any(issue_certificate))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().level(Level::TRACE)),
            )
    }
}
