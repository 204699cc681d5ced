mod client;
pub mod output_parse;
mod types;

pub use client::ProviderClient;
pub use types::{
    ProviderError, ProviderKind, ProviderRequest, ProviderResponse, TextGenerator,
};
