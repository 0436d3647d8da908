use color_eyre::{eyre::eyre, Result};

use super::error::FetchError;
use super::types::Post;
use crate::sync::RequestKey;

/// HTTP client for the posts feed
#[derive(Clone)]
pub struct PostsClient {
  http: reqwest::Client,
}

impl PostsClient {
  pub fn new() -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!("postview/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http })
  }

  /// GET the request key and decode a JSON array of posts.
  pub async fn fetch_posts(&self, key: &RequestKey) -> Result<Vec<Post>, FetchError> {
    let response = self.http.get(key.as_str()).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::HttpStatus {
        status: status.as_u16(),
      });
    }

    let body = response.bytes().await?;
    let posts = serde_json::from_slice(&body)?;
    Ok(posts)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  fn http_response(status_line: &str, body: &str) -> String {
    format!(
      "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      status_line,
      body.len(),
      body
    )
  }

  /// Serve one canned response and return the URL to request.
  async fn serve_once(response: String) -> RequestKey {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 2048];
      let _ = socket.read(&mut buf).await;
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
    });

    RequestKey::new(format!("http://{}/posts", addr))
  }

  #[tokio::test]
  async fn test_fetch_posts_success() {
    let body = r#"[{"userId":1,"id":1,"title":"first","body":"hello"},{"userId":1,"id":2,"title":"second","body":"world"}]"#;
    let key = serve_once(http_response("200 OK", body)).await;

    let posts = PostsClient::new().unwrap().fetch_posts(&key).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[1].title, "second");
  }

  #[tokio::test]
  async fn test_non_success_status_is_http_error() {
    let key = serve_once(http_response("503 Service Unavailable", "")).await;

    let err = PostsClient::new()
      .unwrap()
      .fetch_posts(&key)
      .await
      .unwrap_err();
    assert_eq!(err, FetchError::HttpStatus { status: 503 });
  }

  #[tokio::test]
  async fn test_malformed_body_is_parse_error() {
    let key = serve_once(http_response("200 OK", r#"{"not":"an array"}"#)).await;

    let err = PostsClient::new()
      .unwrap()
      .fetch_posts(&key)
      .await
      .unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
  }

  #[tokio::test]
  async fn test_refused_connection_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let key = RequestKey::new(format!("http://{}/posts", addr));
    let err = PostsClient::new()
      .unwrap()
      .fetch_posts(&key)
      .await
      .unwrap_err();
    assert!(err.is_network());
  }
}
