// redirectctl-api: async client for the Microsoft identity platform token
// endpoint and the Graph `applications` collection.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{ClientCredentials, Credential, DEFAULT_GRANT_TYPE, DEFAULT_SCOPE, TokenClient};
pub use client::GraphClient;
pub use error::Error;
pub use models::{
    Application, ApplicationRecord, ImplicitGrantRecord, ImplicitGrantSettings, WebRecord,
    WebSettings,
};
pub use transport::{TlsMode, TransportConfig};
