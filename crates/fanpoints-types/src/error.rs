/// Failure to parse a wire value into one of the shared enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown role: {0}")]
    Role(String),
    #[error("unknown campaign status: {0}")]
    CampaignStatus(String),
}
