//! Adapter for backends reached through a chat-style streaming proxy
//! (`/api/gemini`, `/api/openai`, `/api/claude`).

mod decode;
mod provider;
mod serde_api;
mod structured;
mod transport;
mod types;

pub use provider::ProxyProvider;
pub use transport::{ProxyTransport, ReqwestProxyTransport};
pub use types::{BodyFormat, ProxyByteStream, ProxyRequest, ProxyResponse};
