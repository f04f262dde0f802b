//! Shared argument types used across multiple commands.

use clap::ValueEnum;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// The (user, consent) pair that addresses one record.
#[derive(clap::Args, Clone, Debug)]
pub struct PairArgs {
    /// Subject identifier, e.g. an email address
    #[arg(long = "user")]
    pub user_id: String,

    /// Consent or form identifier, e.g. `form_1`
    #[arg(long = "consent")]
    pub consent_id: String,
}
