//! Identity Config

use clap::Args;

/// Bearer tokens accepted for customer requests.
#[derive(Debug, Args)]
pub struct IdentityConfig {
    /// Comma separated `token=subject` pairs
    #[arg(
        long,
        env = "CUSTOMER_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub customer_tokens: Vec<String>,
}
