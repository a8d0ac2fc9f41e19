use super::body::{parse_form, parse_json};
use super::ParamError;
use crate::container::Container;
use crate::error::FrameworkError;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// HTTP request with its body already buffered
///
/// Route values (`controller`, `action`, `id`, or attribute route parameters)
/// are available through [`Request::param`]. Once the request reaches MVC
/// dispatch it also carries the application container, so handlers can
/// [`resolve`](Request::resolve) services.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    services: Option<Arc<Container>>,
}

impl Request {
    pub fn new(inner: http::Request<Bytes>) -> Self {
        let (parts, body) = inner.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            services: None,
        }
    }

    /// Shorthand for a body-less request, mostly useful in tests
    pub fn get(uri: &str) -> Self {
        let inner = http::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Bytes::new())
            .unwrap_or_else(|_| http::Request::new(Bytes::new()));
        Self::new(inner)
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn with_services(mut self, services: Arc<Container>) -> Self {
        self.services = Some(services);
        self
    }

    /// Get the request method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the raw query string
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get a route parameter by name (e.g., /users/{id})
    /// Returns Err(ParamError) if the parameter is missing, enabling use of `?` operator
    pub fn param(&self, name: &str) -> Result<&str, ParamError> {
        self.params
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| ParamError {
                param_name: name.to_string(),
            })
    }

    /// Parse a route parameter, e.g. `let id: i32 = req.param_as("id")?;`
    pub fn param_as<T: std::str::FromStr>(&self, name: &str) -> Result<T, FrameworkError> {
        let raw = self.param(name)?;
        raw.parse::<T>()
            .map_err(|_| FrameworkError::param_parse(raw, std::any::type_name::<T>()))
    }

    /// Get all route parameters
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get all headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the Content-Type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parse the request body as JSON
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// #[derive(Deserialize)]
    /// struct CreateStudent { first_name: String, last_name: String, user_id: String }
    ///
    /// pub async fn store(req: Request) -> Response {
    ///     let data: CreateStudent = req.json()?;
    ///     // ...
    /// }
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_json(&self.body)
    }

    /// Parse the request body as form-urlencoded
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_form(&self.body)
    }

    /// Parse the request body based on Content-Type header
    ///
    /// - `application/x-www-form-urlencoded` -> Form parsing
    /// - Otherwise -> JSON parsing (default)
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        match self.content_type() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => self.form(),
            _ => self.json(),
        }
    }

    /// The application container, once the request reached MVC dispatch
    pub fn services(&self) -> Option<&Arc<Container>> {
        self.services.as_ref()
    }

    /// Resolve a service from the application container
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, FrameworkError> {
        self.services
            .as_ref()
            .ok_or_else(FrameworkError::service_not_found::<T>)?
            .resolve::<T>()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("params", &self.params)
            .finish()
    }
}
