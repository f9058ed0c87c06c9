//! Request timing middleware.

use std::time::Instant;

use axum::{
  extract::Request,
  http::HeaderValue,
  middleware::Next,
  response::Response,
};
use tracing::info;

pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Stamp every response with its handling time in seconds and log it.
pub async fn process_time(request: Request, next: Next) -> Response {
  let method = request.method().clone();
  let path = request.uri().path().to_owned();
  let started = Instant::now();

  let mut response = next.run(request).await;

  let elapsed = started.elapsed().as_secs_f64();
  if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
    response.headers_mut().insert(PROCESS_TIME_HEADER, value);
  }
  info!(
    %method,
    path = %path,
    status = response.status().as_u16(),
    seconds = elapsed,
    "request handled"
  );
  response
}
