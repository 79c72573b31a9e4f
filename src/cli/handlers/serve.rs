use super::HandlerContext;
use crate::api::{AppState, router};
use crate::error::{Result, TicketboardError};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Flags of `ticketboard serve`
#[derive(Debug, Default, Clone)]
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub in_memory: bool,
}

/// Run the HTTP API until Ctrl-C
pub fn handle_serve(ctx: &HandlerContext, options: ServeOptions) -> Result<()> {
    let mut server = ctx.config.server.clone();
    if let Some(host) = options.host {
        server.host = host;
    }
    if let Some(port) = options.port {
        server.port = port;
    }

    ctx.runtime()?.block_on(async {
        let repo = ctx.open_store(options.in_memory).await?;
        let app = router(AppState::new(repo, ctx.config.pagination.clone()), &server);

        let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
        let address = listener.local_addr()?;
        info!(%address, in_memory = options.in_memory, "ticketboard listening");

        if ctx.formatter.is_json() {
            ctx.formatter.print_json(&json!({
                "status": "listening",
                "address": address.to_string(),
                "in_memory": options.in_memory,
            }))?;
        } else {
            ctx.formatter.success(&format!("Listening on http://{address}"));
            ctx.formatter.info("Press Ctrl-C to stop");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server stopped");
        Ok::<(), TicketboardError>(())
    })
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
