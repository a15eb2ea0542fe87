//! Prompt assembly for commit drafting.

const RULES: &str = "\
You are a git command generator. Generate ONLY the complete git commit command, nothing else.

STRICT OUTPUT RULES:
1. Output ONLY the git commit command
2. NO explanations, NO extra text before or after
3. NO markdown, NO code blocks, NO quotes around the command
4. Start directly with: git commit

COMMAND FORMAT:
- Single change: git commit -m 'type(scope): description'
- Multiple changes: git commit -m '1. change description' -m '2. another change' -m '3. more changes'
- Use numbered list for multiple changes (1. 2. 3. etc.)
- Types: feat, fix, refactor, chore, perf, ci, build, docs, style, test
- Use imperative mood (add, fix, update - not added, fixed, updated)
- Use single quotes around each message";

/// A commit-drafting prompt built from a staged diff and optional custom
/// instructions.
#[derive(Debug, Clone)]
pub struct CommitPrompt {
    diff: String,
    instructions: String,
}

impl CommitPrompt {
    pub fn new(diff: impl Into<String>) -> Self {
        Self {
            diff: diff.into(),
            instructions: String::new(),
        }
    }

    /// Attach user instructions. Whitespace-only instructions are treated
    /// as absent.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Render the full prompt text sent to the backend.
    pub fn render(&self) -> String {
        let custom = if self.instructions.trim().is_empty() {
            String::new()
        } else {
            format!("CUSTOM INSTRUCTIONS: {}\n\n", self.instructions)
        };
        format!(
            "{RULES}\n\n{custom}Git diff:\n{}\n\nGenerate git commit command now:",
            self.diff
        )
    }
}
