use manole_tools::ToolDef;

pub const TOOL_CALL_START: &str = "⟪tool_call_start⟫";
pub const TOOL_CALL_END: &str = "⟪tool_call_end⟫";

/// Fixed system prompt: enumerates the known tools, names `respond` as
/// the explicit termination tool, and prohibits fabrication (spec.md
/// §4.10).
pub fn system_prompt(tools: &[ToolDef]) -> String {
    let mut out = String::from(
        "You answer questions about the user's own files using the tools below. \
         Never fabricate facts, file names, or numbers that did not come from a tool result. \
         When you are ready to give the final answer, you must call the `respond` tool — \
         do not just write the answer as plain text.\n\nTools:\n",
    );
    for tool in tools {
        out.push_str(&format!("- {}: {}\n", tool.name, tool.description));
    }
    out.push_str(&format!(
        "\nTo call a tool, write exactly:\n{TOOL_CALL_START}tool_name(key=value, ...){TOOL_CALL_END}\n\
         Argument values are quoted strings, integers, None, True, or False. \
         Alternatively you may reply with a JSON object: {{\"name\": \"tool_name\", \"params\": {{...}}}}."
    ));
    out
}

pub const FINAL_ANSWER_PROMPT: &str = "Give a concise final answer based on the information above.";

pub const GENERATE_MAX_TOKENS: usize = 512;
