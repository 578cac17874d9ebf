//! Zero-shot ReAct prompt.
//!
//! The template has no chat-history slot: the model sees one question and its
//! own scratchpad of tool calls for the current run.

use crate::session::Message;
use crate::tools::ToolRegistry;

/// One completed tool round, replayed into the next prompt.
#[derive(Debug, Clone)]
pub struct ScratchpadEntry {
    /// Model text that led to the action, as generated
    pub log: String,
    pub observation: String,
}

/// Build the full prompt for one model call.
pub fn build_prompt(input: &str, tools: &ToolRegistry, scratchpad: &[ScratchpadEntry]) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tool_names = tools.names().join(", ");

    format!(
        r#"Answer the following questions as best you can. You have access to the following tools:

{tool_descriptions}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {input}
Thought:{scratchpad}"#,
        tool_descriptions = tool_descriptions,
        tool_names = tool_names,
        input = input,
        scratchpad = render_scratchpad(scratchpad),
    )
}

/// Previous steps in the `Observation:` / `Thought:` layout the model continues from.
pub fn render_scratchpad(entries: &[ScratchpadEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}\nObservation: {}\nThought:", e.log, e.observation))
        .collect()
}

/// Render a transcript into the single question string the agent receives.
///
/// Every message is passed, oldest first, one `role: content` line each.
pub fn render_transcript(transcript: &[Message]) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;

    #[test]
    fn prompt_lists_tools_and_question() {
        let tools = ToolRegistry::standard(&ToolSettings::default()).unwrap();
        let prompt = build_prompt("What is ML?", &tools, &[]);
        assert!(prompt.contains("should be one of [Search, arxiv, wikipedia]"));
        assert!(prompt.contains("\nwikipedia: A wrapper around Wikipedia."));
        assert!(prompt.ends_with("Question: What is ML?\nThought:"));
    }

    #[test]
    fn scratchpad_replays_steps() {
        let entries = vec![ScratchpadEntry {
            log: " I should search.\nAction: Search\nAction Input: ML".to_string(),
            observation: "ML is a field".to_string(),
        }];
        assert_eq!(
            render_scratchpad(&entries),
            " I should search.\nAction: Search\nAction Input: ML\nObservation: ML is a field\nThought:"
        );
    }

    #[test]
    fn transcript_renders_every_message_in_order() {
        let transcript = vec![
            Message::assistant("Hi"),
            Message::user("What is ML?"),
        ];
        assert_eq!(render_transcript(&transcript), "assistant: Hi\nuser: What is ML?");
    }
}
