//! The system prompt that teaches the model the step protocol.

use termagent_config::IdentityConfig;
use termagent_core::tool::ToolRegistry;

const PREAMBLE: &str = "\
You are a careful assistant that solves the user's query by reasoning in \
small steps and calling tools when you need facts from the user's machine \
or the outside world.

Work in this order:
1. think: reason about the query. Think at least twice before acting.
2. action: when a tool is needed, name it and give its input.
3. observe: wait for the tool result, which arrives as an observe step.
4. output: once you are confident, give the final answer.
If a tool fails, think about why and try again with a corrected input.";

const RULES: &str = "\
Rules:
- Every response is exactly one JSON object and nothing else.
- The object has the fields \"step\", \"tool\", \"input\" and \"content\".
- \"step\" is one of \"think\", \"action\", \"observe\", \"output\".
- An action step needs \"tool\" and \"input\"; every other step needs \"content\".
- Only call the tools listed above.
- After an action, wait for the observe step before doing anything else.
- Use plain text in \"content\", without markdown.";

const EXAMPLES: &str = r#"Example 1 (weather):
User: what is weather of Patiala?
{"step": "think", "tool": "", "input": "", "content": "The user wants the weather in Patiala."}
{"step": "think", "tool": "", "input": "", "content": "getWeatherInfo with Patiala as input will answer this."}
{"step": "action", "tool": "getWeatherInfo", "input": "Patiala", "content": ""}
{"step": "observe", "tool": "", "input": "", "content": "Patiala has 30°C temperature."}
{"step": "output", "tool": "", "input": "", "content": "It is currently 30°C in Patiala."}

Example 2 (a command that needs correcting):
User: list files
{"step": "think", "tool": "", "input": "", "content": "The user wants the files in the current folder."}
{"step": "action", "tool": "executeCommand", "input": "list", "content": ""}
{"step": "observe", "tool": "", "input": "", "content": "Tool execution failed: executeCommand: exit code 127: sh: 1: list: not found"}
{"step": "think", "tool": "", "input": "", "content": "'list' is not a command. 'ls' lists files."}
{"step": "action", "tool": "executeCommand", "input": "ls", "content": ""}
{"step": "observe", "tool": "", "input": "", "content": "Cargo.toml\nsrc"}
{"step": "output", "tool": "", "input": "", "content": "The folder contains Cargo.toml and src."}"#;

/// Build the default system prompt, listing every registered tool.
pub fn default_system_prompt(tools: &ToolRegistry) -> String {
    let tool_lines: Vec<String> = tools
        .descriptions()
        .into_iter()
        .map(|(_, description)| format!("- {description}"))
        .collect();

    format!(
        "{PREAMBLE}\n\nAvailable tools:\n{}\n\n{RULES}\n\n{EXAMPLES}\n",
        tool_lines.join("\n")
    )
}

/// The configured override, or the default prompt when none is set.
pub fn system_prompt(identity: &IdentityConfig, tools: &ToolRegistry) -> String {
    match identity.system_prompt_override.as_deref() {
        Some(custom) if !custom.trim().is_empty() => custom.to_string(),
        _ => default_system_prompt(tools),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termagent_config::ToolsConfig;

    #[test]
    fn default_prompt_lists_registered_tools() {
        let registry = termagent_tools::default_registry(&ToolsConfig::default());
        let prompt = default_system_prompt(&registry);
        assert!(prompt.contains("- getWeatherInfo("));
        assert!(prompt.contains("- executeCommand("));
        assert!(prompt.contains("exactly one JSON object"));
    }

    #[test]
    fn empty_registry_has_no_tool_lines() {
        let prompt = default_system_prompt(&ToolRegistry::new());
        assert!(!prompt.contains("- getWeatherInfo("));
    }

    #[test]
    fn override_wins_unless_blank() {
        let registry = ToolRegistry::new();
        let custom = IdentityConfig {
            system_prompt_override: Some("Answer in JSON only.".into()),
        };
        assert_eq!(system_prompt(&custom, &registry), "Answer in JSON only.");

        let blank = IdentityConfig {
            system_prompt_override: Some("   ".into()),
        };
        assert_eq!(
            system_prompt(&blank, &registry),
            default_system_prompt(&registry)
        );
    }
}
