//! List the models installed on the local generation server.

use commit_llm::OllamaBackend;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let backend = OllamaBackend::new(String::new())?;
    if !backend.available().await {
        eprintln!("Local generation server is not running.");
        return Ok(());
    }

    for model in backend.models().await {
        println!("{}\t{} bytes", model.name, model.size);
    }
    Ok(())
}
