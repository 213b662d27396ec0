//! Fixture HTTP server for attachment and PDF fetches.
//!
//! Saves fetch their attachments over real HTTP, so tests stand up a tiny
//! axum server on an ephemeral loopback port.

use std::net::SocketAddr;

use axum::{http::header, response::IntoResponse, routing::get, Router};

pub const ATTACHMENT_HTML: &str =
    "<html><head><title>Title</title></head><body>Body</body></html>";

/// Minimal single-page PDF; enough for content-type sniffing.
pub const PDF_BYTES: &[u8] =
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

pub struct FixtureServer {
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl FixtureServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(router: Router) -> FixtureServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fixture server");
    let addr = listener.local_addr().expect("Fixture server address");
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fixture server");
    });
    FixtureServer { addr, handle }
}

/// Server with `/attachment` (HTML) and `/test.pdf` (PDF) routes.
pub async fn attachment_server() -> FixtureServer {
    let router = Router::new()
        .route(
            "/attachment",
            get(|| async {
                ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], ATTACHMENT_HTML)
                    .into_response()
            }),
        )
        .route(
            "/test.pdf",
            get(|| async {
                ([(header::CONTENT_TYPE, "application/pdf")], PDF_BYTES).into_response()
            }),
        );
    serve(router).await
}
