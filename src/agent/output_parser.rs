//! Parser for ReAct-formatted model output.

use std::sync::OnceLock;

use regex::Regex;

const FINAL_ANSWER: &str = "Final Answer:";
const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
/// Observation used when the parse error itself is not useful to the model.
pub const GENERIC_INVALID: &str = "Invalid or incomplete response";

/// What the model decided to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    Action {
        tool: String,
        input: String,
        /// The full model text, replayed in the scratchpad
        log: String,
    },
    Finish {
        answer: String,
    },
}

/// Model output that fits neither an action nor a final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Full description of what went wrong
    pub message: String,
    /// Text to feed back to the model as the observation
    pub observation: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid action regex")
    })
}

fn action_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*:").expect("valid action regex"))
}

fn action_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").expect("valid input regex"))
}

/// Parse one model completion.
pub fn parse(text: &str) -> Result<ParsedOutput, ParseError> {
    let final_pos = text.find(FINAL_ANSWER);

    if let Some(caps) = action_re().captures(text) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or_default();
        if let Some(final_pos) = final_pos {
            // An answer written before a hallucinated action still counts.
            if final_pos < whole {
                let start = final_pos + FINAL_ANSWER.len();
                let end = text[start..]
                    .find("\n\n")
                    .map(|i| start + i)
                    .unwrap_or(text.len());
                return Ok(ParsedOutput::Finish {
                    answer: text[start..end].trim().to_string(),
                });
            }
            return Err(ParseError {
                message: format!(
                    "Parsing LLM output produced both a final answer and a parse-able action: {}",
                    text
                ),
                observation: GENERIC_INVALID.to_string(),
            });
        }

        let tool = caps.get(1).map(|m| m.as_str()).unwrap_or_default().trim();
        let input = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return Ok(ParsedOutput::Action {
            tool: tool.to_string(),
            input: input.trim_matches(' ').trim_matches('"').to_string(),
            log: text.to_string(),
        });
    }

    if let Some(final_pos) = final_pos {
        let answer = text[final_pos + FINAL_ANSWER.len()..]
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default();
        return Ok(ParsedOutput::Finish {
            answer: answer.trim().to_string(),
        });
    }

    let message = format!("Could not parse LLM output: `{}`", text);
    let observation = if !action_only_re().is_match(text) {
        MISSING_ACTION
    } else if !action_input_re().is_match(text) {
        MISSING_ACTION_INPUT
    } else {
        GENERIC_INVALID
    };
    Err(ParseError {
        message,
        observation: observation.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_and_strips_quotes() {
        let text = " I should look this up.\nAction: wikipedia\nAction Input: \"machine learning\"";
        assert_eq!(
            parse(text).unwrap(),
            ParsedOutput::Action {
                tool: "wikipedia".to_string(),
                input: "machine learning".to_string(),
                log: text.to_string(),
            }
        );
    }

    #[test]
    fn parses_numbered_action_lines() {
        let text = "Action 1: Search\nAction 1 Input: rust borrow checker\n";
        match parse(text).unwrap() {
            ParsedOutput::Action { tool, input, .. } => {
                assert_eq!(tool, "Search");
                assert_eq!(input, "rust borrow checker\n");
            }
            other => panic!("expected action, got {:?}", other),
        }
    }

    #[test]
    fn parses_final_answer() {
        let text = " I now know the final answer\nFinal Answer: ML is a branch of AI.\n";
        assert_eq!(
            parse(text).unwrap(),
            ParsedOutput::Finish {
                answer: "ML is a branch of AI.".to_string()
            }
        );
    }

    #[test]
    fn final_answer_before_hallucinated_action_wins() {
        let text = "Final Answer: 42\n\nAction: Search\nAction Input: more";
        assert_eq!(
            parse(text).unwrap(),
            ParsedOutput::Finish {
                answer: "42".to_string()
            }
        );
    }

    #[test]
    fn action_then_final_answer_is_an_error() {
        let text = "Action: Search\nAction Input: x\nObservation: y\nFinal Answer: z";
        let err = parse(text).unwrap_err();
        assert!(err.message.starts_with("Parsing LLM output produced both"));
        assert_eq!(err.observation, GENERIC_INVALID);
    }

    #[test]
    fn missing_action_is_reported() {
        let err = parse("I am not sure what to do.").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION);
        assert_eq!(err.message, "Could not parse LLM output: `I am not sure what to do.`");
    }

    #[test]
    fn missing_action_input_is_reported() {
        let err = parse("Thought: search it\nAction: Search").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION_INPUT);
    }
}
