pub mod client;
pub mod error;
pub mod formats;
pub mod types;

pub use client::YouTubeClient;
pub use error::YouTubeError;
