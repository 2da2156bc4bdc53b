//! Prompt construction.
//!
//! A fixed system instruction describing the commit style, and a per-request
//! user instruction wrapping the (already truncated) diff.

pub mod truncate;

pub use truncate::{truncate_diff, TRUNCATION_MARKER};

use crate::models::GenerateOptions;

/// Commit style contract sent as the system message on every request.
pub const SYSTEM_PROMPT: &str = "\
You are a commit message generator that strictly follows the Conventional Commits specification.

## Output Format
<type>(<scope>): <description>

[optional body]

## Commit Types
- feat: A new feature
- fix: A bug fix
- docs: Documentation only changes
- style: Changes that do not affect the meaning of the code (formatting)
- refactor: A code change that neither fixes a bug nor adds a feature
- perf: A code change that improves performance
- test: Adding missing tests or correcting existing tests
- chore: Changes to the build process or auxiliary tools

## Rules
1. Subject line MUST be max 72 characters
2. Use imperative mood: \"add\" not \"added\" or \"adds\"
3. Do NOT end subject line with a period
4. Scope is optional but recommended
5. Body should explain WHAT and WHY, not HOW
6. Analyze the diff to understand the actual changes made

## Examples
feat(auth): add OAuth2 login support
fix(api): handle null response from user endpoint
refactor(utils): simplify date formatting logic
";

/// Build the user message for one request.
///
/// The diff is embedded verbatim inside a `diff` fence.
pub fn build_user_prompt(diff: &str, options: &GenerateOptions) -> String {
    let body_directive = if options.include_body {
        "Include a short body after a blank line explaining what changed and why."
    } else {
        "Write only the subject line, without a body."
    };

    format!(
        "Analyze the following git diff and generate a commit message.\n\
         Language: {language}\n\
         {body_directive}\n\
         \n\
         ```diff\n\
         {diff}\n\
         ```\n\
         \n\
         Generate ONLY the commit message, nothing else.\n",
        language = options.language.prompt_name(),
    )
}
