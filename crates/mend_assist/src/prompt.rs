//! Prompt composition and reply cleanup.

/// Build the repair prompt sent through the generate endpoint.
pub fn fix_prompt(error_message: &str, code: &str) -> String {
    format!(
        "The following Python code fails with this error:\n\
         {error_message}\n\n\
         ```python\n{code}\n```\n\n\
         Reply with the corrected code only, in a single ```python block.",
        error_message = error_message.trim(),
        code = code.trim_end(),
    )
}

/// Pull code out of an assistant reply.
///
/// Returns the body of the first fenced block when there is one, otherwise
/// the trimmed reply.
pub fn extract_code(reply: &str) -> String {
    let Some(start) = reply.find("```") else {
        return reply.trim().to_string();
    };
    let after_fence = &reply[start + 3..];
    // Skip the info string (```python).
    let body = match after_fence.find('\n') {
        Some(newline) => &after_fence[newline + 1..],
        None => return reply.trim().to_string(),
    };
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };

    let mut code = body.trim_end().to_string();
    code.push('\n');
    code
}
