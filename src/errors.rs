/// Failures this plugin can report. Everything else degrades to "no rewrite".
#[derive(Debug, thiserror::Error)]
pub enum EmotionError {
    #[error("Invalid emotion plugin configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error("withComponent() does not accept spread arguments")]
    WithComponentSpread,
}
