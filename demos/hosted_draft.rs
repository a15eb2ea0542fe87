//! Draft a commit command through the hosted chat-completions API, buffered.

use std::process::Command;

use commit_llm::{Backend, CommitPrompt, OpenAIBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let api_key =
        std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY environment variable not set");
    let model = std::env::var("COMMIT_LLM_MODEL").unwrap_or_default();

    let output = Command::new("git").args(["diff", "--cached"]).output()?;
    let diff = String::from_utf8(output.stdout)?;
    if diff.trim().is_empty() {
        eprintln!("No staged changes. Stage something first with git add.");
        return Ok(());
    }

    let prompt = CommitPrompt::new(diff).render();
    let backend = OpenAIBackend::new(api_key, model)?;
    let draft = backend.complete(&prompt).await?;

    println!("{draft}");
    Ok(())
}
