use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::description::GeneratedDescription;
use crate::files::FileHandle;
use crate::tone::Tone;

/// Path of the batch endpoint: one description per uploaded image.
pub const GENERATE_MULTIPLE_PATH: &str = "/generate-multiple";
/// Path of the single-image endpoint.
pub const GENERATE_SINGLE_PATH: &str = "/generate-single";

/// Why a generation request failed.
///
/// The form handles every variant the same way (log, keep the previous
/// results, clear the loading flag); the variants only change the message
/// shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request could not be built or sent, or the connection failed
    /// (DNS, refused, timeout).
    #[error("could not reach the description service: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-2xx status.
    #[error("description service returned {status}: {body}")]
    Server {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The body was not JSON or did not have the expected shape.
    #[error("unexpected response from the description service: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn uploaded images into descriptions.
///
/// [`DescriptionClient`] is the HTTP implementation; tests plug in fakes.
#[async_trait::async_trait]
pub trait DescriptionService: Send + Sync {
    /// Send every file plus the tone in one request and return the
    /// descriptions in the order the service produced them.
    async fn generate(
        &self,
        files: Vec<FileHandle>,
        tone: Tone,
    ) -> Result<Vec<GeneratedDescription>, GenerateError>;
}

/// HTTP client for the description service.
///
/// # Example
///
/// ```rust,no_run
/// use product_describer::client::{DescriptionClient, DescriptionService};
/// use product_describer::files::FileHandle;
/// use product_describer::tone::Tone;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = DescriptionClient::new("http://localhost:8000", None)?;
/// let file = FileHandle::from_path("mug.jpg".as_ref())?;
/// let descriptions = client.generate(vec![file], Tone::Casual).await?;
/// println!("{}", descriptions[0].generated_description);
/// # Ok(())
/// # }
/// ```
pub struct DescriptionClient {
    base_url: String,
    client: Client,
}

impl DescriptionClient {
    /// Create a client for `base_url` (scheme + host, e.g.
    /// `http://localhost:8000`). `timeout` bounds the whole request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        Self::new(&config.base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Describe one image through the single-image endpoint.
    pub async fn generate_single(
        &self,
        file: FileHandle,
        tone: Tone,
    ) -> Result<GeneratedDescription, GenerateError> {
        let form = Form::new()
            .part("image", file_part(file)?)
            .text("tone", tone.as_str());
        let text = self.post(GENERATE_SINGLE_PATH, form).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn post(&self, path: &str, form: Form) -> Result<String, GenerateError> {
        let url = format!("{}{path}", self.base_url);
        log::debug!("POST {url}");

        let resp = self.client.post(&url).multipart(form).send().await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(GenerateError::Server { status, body: text });
        }
        log::debug!("Raw service response:\n{text}");
        Ok(text)
    }
}

#[async_trait::async_trait]
impl DescriptionService for DescriptionClient {
    async fn generate(
        &self,
        files: Vec<FileHandle>,
        tone: Tone,
    ) -> Result<Vec<GeneratedDescription>, GenerateError> {
        let count = files.len();
        let form = build_form(files, tone)?;
        log::info!("Requesting {tone} descriptions for {count} image(s)");

        let text = self.post(GENERATE_MULTIPLE_PATH, form).await?;
        let descriptions: Vec<GeneratedDescription> = serde_json::from_str(&text)?;
        log::info!("Received {} description(s)", descriptions.len());
        Ok(descriptions)
    }
}

/// Build the upload body: one `images` part per file, in order, then the
/// `tone` field.
pub fn build_form(files: Vec<FileHandle>, tone: Tone) -> Result<Form, GenerateError> {
    let mut form = Form::new();
    for file in files {
        form = form.part("images", file_part(file)?);
    }
    Ok(form.text("tone", tone.as_str()))
}

fn file_part(file: FileHandle) -> Result<Part, GenerateError> {
    let part = Part::bytes(file.bytes).file_name(file.name);
    Ok(part.mime_str(&file.content_type)?)
}
