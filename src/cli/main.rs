use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use product_describer::client::DescriptionClient;
use product_describer::config::Config;
use product_describer::description::{self, GeneratedDescription};
use product_describer::files::{self, FileHandle};
use product_describer::form::DescriptionForm;
use product_describer::tone::Tone;

#[derive(Parser, Debug)]
#[command(
    name = "product-describer",
    version,
    about = "Generate product descriptions from product photos"
)]
struct Cli {
    /// Image files or directories to upload
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Writing tone: professional, casual, luxury or technical
    #[arg(short, long)]
    tone: Option<Tone>,

    /// Description service base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Send each image on its own to the single-image endpoint
    #[arg(long)]
    single: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.service.base_url = url;
    }
    let tone = cli.tone.unwrap_or(config.form.default_tone);

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = files::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No image files found in the specified paths.");
    }
    let selected = images
        .iter()
        .map(|p| FileHandle::from_path(p))
        .collect::<Result<Vec<_>>>()?;

    log::info!(
        "Uploading {} image(s) to {} ({tone})",
        selected.len(),
        config.service.base_url
    );

    let client = DescriptionClient::from_config(&config.service)?;

    let results = if cli.single {
        generate_one_by_one(&client, selected, tone).await?
    } else {
        let mut form: DescriptionForm<()> = DescriptionForm::new(tone);
        form.add_files(selected, &mut |_: &FileHandle| ());
        form.submit(&client).await;
        if let Some(err) = form.last_error() {
            anyhow::bail!("{err}");
        }
        form.results().to_vec()
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&results).context("Failed to serialize results")?
        );
    } else {
        for card in description::cards(&results) {
            println!("{}", card.render_text());
        }
    }

    log::info!("Done: {} description(s)", results.len());
    Ok(())
}

/// One request per image against the single-image endpoint. Stops at the
/// first failure.
async fn generate_one_by_one(
    client: &DescriptionClient,
    selected: Vec<FileHandle>,
    tone: Tone,
) -> Result<Vec<GeneratedDescription>> {
    let total = selected.len();
    let mut results = Vec::with_capacity(total);
    for (i, file) in selected.into_iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, total, file.name);
        let name = file.name.clone();
        let desc = client
            .generate_single(file, tone)
            .await
            .with_context(|| format!("Failed to describe {name}"))?;
        results.push(desc);
    }
    Ok(results)
}
