pub mod client;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::PostsClient;
pub use endpoint::Endpoint;
pub use error::FetchError;
pub use types::{OwnerId, Post};
