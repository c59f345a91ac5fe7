//! # product-describer
//!
//! Upload product photos, choose a writing tone, and get generated product
//! descriptions back from a description service over HTTP.
//!
//! ## Quick Start
//!
//! [`form::DescriptionForm`] holds the whole form state: the selected files
//! (each with a preview handle), the tone, the loading flag and the last
//! results. Drive it with any [`client::DescriptionService`]:
//!
//! ```rust,no_run
//! use product_describer::client::DescriptionClient;
//! use product_describer::config::Config;
//! use product_describer::files::{collect_images, FileHandle};
//! use product_describer::form::DescriptionForm;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(Some("config.json".as_ref()))?;
//!     let client = DescriptionClient::from_config(&config.service)?;
//!
//!     let files = collect_images(&[PathBuf::from("./catalog")])
//!         .iter()
//!         .map(|p| FileHandle::from_path(p))
//!         .collect::<anyhow::Result<Vec<_>>>()?;
//!
//!     // No previews outside a UI.
//!     let mut form: DescriptionForm<()> = DescriptionForm::new(config.form.default_tone);
//!     form.add_files(files, &mut |_: &FileHandle| ());
//!     form.submit(&client).await;
//!
//!     if let Some(err) = form.last_error() {
//!         eprintln!("Generation failed: {err}");
//!     }
//!     for card in form.cards() {
//!         print!("{}", card.render_text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Wire Format
//!
//! `POST {base_url}/generate-multiple` with a multipart body: one `images`
//! part per file and one `tone` field. The response is a JSON array of
//! [`description::GeneratedDescription`].
//!
//! ## Modules
//!
//! - [`form`] — form state and submission lifecycle
//! - [`selection`] — selected files and their preview handles
//! - [`client`] — HTTP transport and error types
//! - [`description`] — response model and result cards
//! - [`tone`] — writing tone options
//! - [`files`] — reading and collecting image files
//! - [`config`] — configuration loading/saving

pub mod client;
pub mod config;
pub mod description;
pub mod files;
pub mod form;
pub mod selection;
pub mod tone;
