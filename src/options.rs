use serde::Deserialize;

use crate::errors::EmotionError;

/// Plugin configuration as passed by the host, e.g.
/// `["emotion_swc_plugin", { "sourceMap": true, "instances": ["./emotion"] }]`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmotionOptions {
    /// Extra module paths that re-export an emotion instance.
    pub instances: Vec<String>,
    /// `None` enables the optimization when the file imports `jsx` from `@emotion/core`.
    pub css_prop_optimization: Option<bool>,
    pub source_map: bool,
    pub auto_label: bool,
}

impl EmotionOptions {
    pub fn from_json(config: &str) -> Result<Self, EmotionError> {
        Ok(serde_json::from_str(config)?)
    }
}
