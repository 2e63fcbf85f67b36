//! Chat messages and response parsing.

use serde_json::Value;
use tracing::warn;

use crate::error::{PromptError, PromptResult};
use crate::types::{PromptBrief, PromptIdea};

/// Past prompts listed back to the model.
pub const PAST_PROMPT_LIMIT: usize = 100;

/// Past prompts longer than this are cut and suffixed with `...`.
pub const PAST_PROMPT_CHARS: usize = 150;

pub const SYSTEM_PROMPT: &str = r#"You write prompts for an AI text-to-video model that produces short vertical clips for social feeds.

Every clip must stop the scroll in its first half second: open on motion, contrast or a close-up face, then build to a visual payoff that needs no explanation.

Rotate hook types across clips: what_if (an impossible scenario), contrast (before/after, expectation/reality), emotional (animals, warmth, comic timing), numbers (a concrete count or time), negative (the mistake everyone makes).

Prompt rules:
- One paragraph of 4 to 8 sentences, present tense.
- Order: shot type, lighting, action, character, camera movement, sound.
- Name the camera move (slow dolly in, tracking shot, crane up, static) and the focus (shallow depth of field, rack focus).
- Describe lighting and mood concretely (golden hour, rim light, low-key, film grain).
- Always describe ambient sound and one sound effect or music cue.
- Show emotion through expression and posture, never by naming it.
- Keep physics simple and the cast small.
- Never mention text, subtitles or anything that should be absent.

Pacing for a 10 second clip: hook in the first 2 seconds, development until 7, payoff at the end.

Reply with a JSON array only."#;

/// One bullet per past prompt, newest 100 only, long ones cut.
pub fn format_past_prompts(past: &[String]) -> String {
    let start = past.len().saturating_sub(PAST_PROMPT_LIMIT);
    past[start..]
        .iter()
        .map(|p| {
            if p.chars().count() > PAST_PROMPT_CHARS {
                let cut: String = p.chars().take(PAST_PROMPT_CHARS).collect();
                format!("- {}...", cut)
            } else {
                format!("- {}", p)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// User message for `brief`.
pub fn build_user_message(brief: &PromptBrief) -> String {
    let mut message = format!(
        "Generate {} short-form video prompt(s).\n\n",
        brief.count
    );

    if let Some(theme) = &brief.theme {
        message.push_str(&format!("Theme: {}\n", theme));
    }
    message.push_str(&format!(
        "Style: {}\n",
        brief.style.as_deref().unwrap_or("cinematic")
    ));
    message.push_str(if brief.include_dialogue {
        "Dialogue: a character speaks within the first 1-2 seconds\n"
    } else {
        "Dialogue: none\n"
    });

    if !brief.past_prompts.is_empty() {
        message.push_str("\nAlready used, do not repeat these concepts:\n");
        message.push_str(&format_past_prompts(&brief.past_prompts));
        message.push('\n');
    }

    message.push_str(
        r#"
Each concept must be new and use a different hook type from the others.

Return a JSON array:
[
  {
    "prompt": "full video prompt, one paragraph",
    "caption": "punchy caption with emoji, under 100 characters",
    "hashtags": ["relevant", "tags"],
    "hook_type": "what_if|contrast|emotional|numbers|negative"
  }
]"#,
    );

    message
}

/// Strip a Markdown code fence around the JSON payload, if any.
pub fn extract_json_block(content: &str) -> &str {
    let body = if let Some((_, rest)) = content.split_once("```json") {
        rest
    } else if let Some((_, rest)) = content.split_once("```") {
        rest
    } else {
        return content.trim();
    };

    body.split("```").next().unwrap_or(body).trim()
}

/// Parse the model reply into ideas. Entries without a `prompt` are dropped.
pub fn parse_ideas(content: &str) -> PromptResult<Vec<PromptIdea>> {
    let value: Value = serde_json::from_str(extract_json_block(content))?;
    let Value::Array(items) = value else {
        return Err(PromptError::invalid_response("expected a JSON array of prompts"));
    };

    let mut ideas = Vec::with_capacity(items.len());
    for item in items {
        let has_prompt = item
            .get("prompt")
            .and_then(Value::as_str)
            .is_some_and(|p| !p.trim().is_empty());
        if !has_prompt {
            warn!("Dropping prompt entry without a prompt");
            continue;
        }
        match serde_json::from_value::<PromptIdea>(item) {
            Ok(idea) => ideas.push(idea),
            Err(e) => warn!("Dropping malformed prompt entry: {}", e),
        }
    }

    Ok(ideas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block("```json\n[1]\n```"), "[1]");
        assert_eq!(extract_json_block("Here:\n```\n[2]\n```\nthanks"), "[2]");
        assert_eq!(extract_json_block("  [3] "), "[3]");
    }

    #[test]
    fn test_parse_ideas_drops_entries_without_prompt() {
        let content = r#"```json
[
  {"prompt": "A knight orders at a drive-thru.", "caption": "🐴", "hashtags": ["history"], "hook_type": "what_if"},
  {"caption": "no prompt here"},
  "stray string",
  {"prompt": "Cat judges a cucumber."}
]
```"#;
        let ideas = parse_ideas(content).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].hashtags, vec!["history"]);
        assert_eq!(ideas[1].caption, "");
    }

    #[test]
    fn test_parse_ideas_rejects_non_array() {
        assert!(matches!(
            parse_ideas(r#"{"prompt": "x"}"#),
            Err(PromptError::InvalidResponse(_))
        ));
        assert!(matches!(parse_ideas("not json"), Err(PromptError::Json(_))));
    }

    #[test]
    fn test_past_prompts_limited_and_truncated() {
        let mut past: Vec<String> = (0..120).map(|i| format!("prompt {i}")).collect();
        past.push("x".repeat(200));

        let formatted = format_past_prompts(&past);
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "- prompt 21");
        assert_eq!(lines[99], format!("- {}...", "x".repeat(150)));
    }

    #[test]
    fn test_user_message_mentions_brief() {
        let brief = PromptBrief::new(3)
            .with_theme("historical figures in modern settings")
            .with_dialogue(true)
            .avoiding(vec!["old idea".into()]);
        let message = build_user_message(&brief);

        assert!(message.starts_with("Generate 3 short-form"));
        assert!(message.contains("Theme: historical figures in modern settings"));
        assert!(message.contains("Style: cinematic"));
        assert!(message.contains("- old idea"));
    }
}
