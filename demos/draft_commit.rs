//! Draft a commit command for the staged diff, streaming the draft to the
//! terminal as it generates.
//!
//! Backend selection follows the environment: set `COMMIT_LLM_BACKEND` to
//! `ollama`, `openai` or `custom`, or just run it with a local server up.
//! An optional first argument is passed through as custom instructions.

use std::io::Write;
use std::process::Command;

use commit_llm::{BackendFactory, CommitPrompt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let output = Command::new("git").args(["diff", "--cached"]).output()?;
    let diff = String::from_utf8(output.stdout)?;
    if diff.trim().is_empty() {
        eprintln!("No staged changes. Stage something first with git add.");
        return Ok(());
    }

    let instructions = std::env::args().nth(1).unwrap_or_default();
    let prompt = CommitPrompt::new(diff)
        .with_instructions(instructions)
        .render();

    let backend = BackendFactory::from_env()?;
    let generation = backend.stream(&prompt).await?;

    let draft = generation
        .text_with(|chunk| {
            print!("{chunk}");
            let _ = std::io::stdout().flush();
        })
        .await?;

    println!("\n\nDraft:\n{draft}");
    Ok(())
}
