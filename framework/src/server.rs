use crate::config::ServerConfig;
use crate::http::{collect_body, BodyError, HttpResponse, Request};
use crate::pipeline::Pipeline;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// HTTP/1 server running a [`Pipeline`]
pub struct Server {
    pipeline: Pipeline,
    config: ServerConfig,
}

impl Server {
    pub fn new(pipeline: Pipeline, config: ServerConfig) -> Self {
        Self { pipeline, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until Ctrl-C
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.config.address()).await?;
        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve connections from `listener` until `shutdown` completes
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn serve<S>(
        self,
        listener: TcpListener,
        shutdown: S,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        S: Future<Output = ()>,
    {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!("Server running on http://{}", addr);

        let pipeline = Arc::new(self.pipeline);
        let max_body_size = self.config.max_body_size;
        tokio::pin!(shutdown);

        loop {
            let (stream, remote) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let pipeline = pipeline.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let pipeline = pipeline.clone();
                    async move {
                        Ok::<_, Infallible>(handle_request(pipeline, req, max_body_size).await)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(%remote, error = %err, "error serving connection");
                }
            });
        }
    }
}

async fn handle_request(
    pipeline: Arc<Pipeline>,
    req: hyper::Request<hyper::body::Incoming>,
    max_body_size: usize,
) -> hyper::Response<Full<Bytes>> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let (parts, body) = req.into_parts();
    let response = match collect_body(body, max_body_size).await {
        Ok(bytes) => {
            let request = Request::new(http::Request::from_parts(parts, bytes));
            pipeline.handle(request).await
        }
        Err(BodyError::TooLarge) => HttpResponse::json(serde_json::json!({
            "error": format!("Request body exceeds {} bytes", max_body_size)
        }))
        .status(413),
        Err(BodyError::Read(e)) => {
            HttpResponse::json(serde_json::json!({ "error": format!("Failed to read body: {}", e) }))
                .status(400)
        }
    };

    tracing::info!(
        %method,
        path = %path,
        status = response.status_code(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response.into_hyper()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ApplicationBuilder, ServiceCollection};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn roundtrip(raw: String, max_body_size: usize) -> String {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello").unwrap();

        let mut app = ApplicationBuilder::new(ServiceCollection::new());
        app.use_static_files(dir.path());
        let config = ServerConfig::builder()
            .port(0)
            .max_body_size(max_body_size)
            .build();
        let server = Server::new(app.build(), config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        let _ = stop.send(());
        handle.await.unwrap().unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_pipeline_response() {
        let response = roundtrip(
            "GET /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
            1024,
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 200 OK"), "{}", response);
        assert!(response.ends_with("hello"));
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let response = roundtrip(
            "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_string(),
            1024,
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 404"), "{}", response);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let body = "x".repeat(64);
        let response = roundtrip(
            format!(
                "POST /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            ),
            16,
        )
        .await;

        assert!(response.starts_with("HTTP/1.1 413"), "{}", response);
    }
}
