//! Prompt generator types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One generated video idea.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PromptIdea {
    /// Full generation prompt, one paragraph
    pub prompt: String,
    /// Short social caption
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// what_if, contrast, emotional, numbers or negative
    #[serde(default)]
    pub hook_type: String,
}

/// What to ask the generator for.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBrief {
    pub count: usize,
    pub theme: Option<String>,
    pub style: Option<String>,
    pub include_dialogue: bool,
    /// Earlier prompts the generator must not repeat
    pub past_prompts: Vec<String>,
}

impl Default for PromptBrief {
    fn default() -> Self {
        Self {
            count: 1,
            theme: None,
            style: None,
            include_dialogue: false,
            past_prompts: Vec::new(),
        }
    }
}

impl PromptBrief {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_dialogue(mut self, include: bool) -> Self {
        self.include_dialogue = include;
        self
    }

    pub fn avoiding(mut self, past_prompts: Vec<String>) -> Self {
        self.past_prompts = past_prompts;
        self
    }
}
