use super::{Middleware, Next};
use crate::http::{HttpResponse, Request, Response};
use async_trait::async_trait;
use http::Method;
use std::path::{Path, PathBuf};

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("mjs", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("txt", "text/plain; charset=utf-8"),
    ("xml", "application/xml"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("eot", "application/vnd.ms-fontobject"),
    ("pdf", "application/pdf"),
];

/// Serves files under the web root for `GET` and `HEAD` requests
///
/// Requests that do not name an existing file with a known extension are
/// passed on unchanged.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root
    ///
    /// Returns `None` for `.`/`..` segments, backslashes, drive prefixes and
    /// empty paths.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        let mut segments = 0;
        for segment in request_path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') || segment.contains(':') {
                return None;
            }
            path.push(segment);
            segments += 1;
        }
        (segments > 0).then_some(path)
    }
}

/// Content type for a file extension, if it is one we serve
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

#[async_trait]
impl Middleware for StaticFiles {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let method = request.method();
        if method != Method::GET && method != Method::HEAD {
            return next(request).await;
        }

        let file = match self.resolve(request.path()) {
            Some(file) => file,
            None => return next(request).await,
        };
        let content_type = match content_type_for(&file) {
            Some(content_type) => content_type,
            None => return next(request).await,
        };

        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => {}
            _ => return next(request).await,
        }

        match tokio::fs::read(&file).await {
            Ok(contents) => {
                tracing::debug!(file = %file.display(), "serving static file");
                let response = HttpResponse::bytes(content_type, contents);
                if request.method() == Method::HEAD {
                    Ok(response.without_body())
                } else {
                    Ok(response)
                }
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "failed to read static file");
                next(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{into_boxed, BoxFuture, MiddlewareChain};
    use bytes::Bytes;
    use std::sync::Arc;

    fn fallback() -> Next {
        Arc::new(|_request: Request| -> BoxFuture<Response> {
            Box::pin(async { Ok(HttpResponse::text("fallback").status(404)) })
        })
    }

    fn request(method: Method, uri: &str) -> Request {
        Request::new(
            http::Request::builder()
                .method(method)
                .uri(uri)
                .body(Bytes::new())
                .unwrap(),
        )
    }

    fn site() -> (tempfile::TempDir, MiddlewareChain) {
        let dir = tempfile::tempdir().unwrap();
        let web_root = dir.path().join("wwwroot");
        std::fs::create_dir_all(web_root.join("css")).unwrap();
        std::fs::write(web_root.join("css/site.css"), "body { color: red; }").unwrap();
        std::fs::write(web_root.join("notes.unknown"), "?").unwrap();
        std::fs::write(dir.path().join("appsettings.Db.json"), "{}").unwrap();

        let mut chain = MiddlewareChain::new();
        chain.push(into_boxed(StaticFiles::new(web_root)));
        (dir, chain)
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let (_dir, chain) = site();
        let response = chain
            .execute(request(Method::GET, "/css/site.css"), fallback())
            .await
            .unwrap();

        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header_value("content-type"), Some("text/css; charset=utf-8"));
        assert_eq!(response.body().as_ref(), b"body { color: red; }");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, chain) = site();
        let response = chain
            .execute(request(Method::HEAD, "/css/site.css"), fallback())
            .await
            .unwrap();

        assert_eq!(response.status_code(), 200);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_falls_through() {
        let (_dir, chain) = site();
        for (method, uri) in [
            (Method::GET, "/css/missing.css"),
            (Method::GET, "/notes.unknown"),
            (Method::POST, "/css/site.css"),
            (Method::GET, "/"),
        ] {
            let response = chain.execute(request(method, uri), fallback()).await.unwrap();
            assert_eq!(response.body().as_ref(), b"fallback", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_refuses_traversal() {
        let (_dir, chain) = site();
        let response = chain
            .execute(request(Method::GET, "/../appsettings.Db.json"), fallback())
            .await
            .unwrap();

        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body().as_ref(), b"fallback");
    }

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(content_type_for(Path::new("a/b.PNG")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("a/b")), None);
        assert_eq!(content_type_for(Path::new("a/b.exe")), None);
    }
}
