//! Prints the Gemini models visible to the configured API key.

use anyhow::Result;
use clap::Parser;
use medscan_ai::{
    config,
    llm::{GeminiClient, LlmClient, ModelInfo},
};

#[derive(Debug, Parser)]
#[command(name = "list-models", about = "List Gemini models available to the API key")]
struct Args {
    /// Print the full metadata of every model
    #[arg(short, long)]
    verbose: bool,
}

fn summary(model: &ModelInfo) -> String {
    match &model.display_name {
        Some(display) => format!("{} ({})", model.name, display),
        None => model.name.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load().await?;
    let client = GeminiClient::new(&config.llm)?;

    println!("Listing available models...\n");
    let models = client.list_models().await?;

    for (index, model) in models.iter().enumerate() {
        if args.verbose {
            println!("----- MODEL #{} -----", index + 1);
            println!("{}", serde_json::to_string_pretty(model)?);
            println!();
        } else {
            println!("{}", summary(model));
        }
    }
    println!("Total models: {}", models.len());

    Ok(())
}
