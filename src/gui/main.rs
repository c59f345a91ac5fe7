#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;

use product_describer::client::{DescriptionClient, DescriptionService, GenerateError};
use product_describer::config::Config;
use product_describer::description::{DescriptionCard, GeneratedDescription};
use product_describer::files::{collect_images, FileHandle, IMAGE_EXTENSIONS};
use product_describer::form::{DescriptionForm, Ticket};
use product_describer::tone::Tone;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 760.0])
        .with_min_inner_size([600.0, 480.0])
        .with_drag_and_drop(true);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Product Description Generator",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

// ── Messages sent from background tasks to the UI ───────────────────

enum BgMessage {
    /// The generation request for `ticket` finished.
    Generated {
        ticket: Ticket,
        outcome: Result<Vec<GeneratedDescription>, GenerateError>,
    },
}

/// A preview texture; dropping it frees the texture.
type Preview = Option<egui::TextureHandle>;

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Form,
    Settings,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    ctx: egui::Context,
    config: Config,
    config_path: Option<PathBuf>,
    form: DescriptionForm<Preview>,
    tab: Tab,
    status: String,
    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
    /// The in-flight generation request, aborted on teardown.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Tokio runtime for async tasks.
    rt: tokio::runtime::Runtime,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let (tx, rx) = mpsc::channel();
        let config = Config::load(None).unwrap_or_default();
        let form = DescriptionForm::new(config.form.default_tone);

        Self {
            ctx: cc.egui_ctx.clone(),
            config,
            config_path: None,
            form,
            tab: Tab::Form,
            status: "Ready — drop images or click Open Files".into(),
            rx,
            tx,
            task: None,
            rt: tokio::runtime::Runtime::new().expect("Failed to create tokio runtime"),
        }
    }

    fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let mut selected = Vec::new();
        for path in collect_images(&paths) {
            match FileHandle::from_path(&path) {
                Ok(file) => selected.push(file),
                Err(e) => {
                    log::warn!("{e:#}");
                    self.status = format!("Error: {e}");
                }
            }
        }
        if selected.is_empty() {
            return;
        }

        let ctx = self.ctx.clone();
        self.form
            .add_files(selected, &mut |file: &FileHandle| load_preview(&ctx, file));
        self.status = format!("{} image(s) selected", self.form.selection().len());
    }

    fn open_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
        {
            self.add_paths(paths);
        }
    }

    fn start_generation(&mut self) {
        if !self.form.can_submit() {
            return;
        }
        let client = match DescriptionClient::from_config(&self.config.service) {
            Ok(c) => c,
            Err(e) => {
                self.status = format!("Error: {e}");
                return;
            }
        };
        let Some(submission) = self.form.begin_submit() else {
            return;
        };
        self.status = "Generating...".into();

        let tx = self.tx.clone();
        let ctx = self.ctx.clone();
        self.task = Some(self.rt.spawn(async move {
            let outcome = client.generate(submission.files, submission.tone).await;
            // The receiver is gone once the window has closed.
            let _ = tx.send(BgMessage::Generated {
                ticket: submission.ticket,
                outcome,
            });
            ctx.request_repaint();
        }));
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Generated { ticket, outcome } => {
                    if !self.form.complete(ticket, outcome) {
                        continue;
                    }
                    self.task = None;
                    self.status = match self.form.last_error() {
                        Some(_) => "Generation failed".into(),
                        None => format!("{} description(s) generated", self.form.results().len()),
                    };
                }
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.form.abandon();
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages();

        // Handle dropped files
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw.dropped_files.iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.add_paths(dropped);
        }

        // ── Top bar ─────────────────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Product Description Generator");
                ui.separator();

                if ui.selectable_label(self.tab == Tab::Form, "📷 Generate").clicked() {
                    self.tab = Tab::Form;
                }
                if ui.selectable_label(self.tab == Tab::Settings, "⚙ Settings").clicked() {
                    self.tab = Tab::Settings;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.form.is_loading() {
                        ui.spinner();
                    }
                    ui.label(&self.status);
                });
            });
        });

        match self.tab {
            Tab::Form => self.show_form_tab(ctx),
            Tab::Settings => self.show_settings_tab(ctx),
        }
    }
}

/// Decode a selected file into a thumbnail texture. Files the `image` crate
/// cannot decode get no preview.
fn load_preview(ctx: &egui::Context, file: &FileHandle) -> Preview {
    let img = match image::load_from_memory(&file.bytes) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("No preview for {}: {e}", file.name);
            return None;
        }
    };
    let img = img.thumbnail(400, 400);
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    let pixels = rgba.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    Some(ctx.load_texture(&file.name, color_image, egui::TextureOptions::LINEAR))
}

// ── Form tab ────────────────────────────────────────────────────────

impl App {
    fn show_form_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_tone_selector(ui);
                    ui.add_space(12.0);
                    self.show_upload_area(ui);
                    ui.add_space(12.0);
                    self.show_selected_files(ui);

                    let button = egui::Button::new(
                        egui::RichText::new(self.form.submit_label()).strong(),
                    )
                    .min_size(egui::vec2(ui.available_width(), 36.0));
                    if ui.add_enabled(self.form.can_submit(), button).clicked() {
                        self.start_generation();
                    }

                    if let Some(err) = self.form.last_error().map(str::to_owned) {
                        ui.add_space(8.0);
                        ui.horizontal_wrapped(|ui| {
                            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), format!("⚠ {err}"));
                            if ui.small_button("Dismiss").clicked() {
                                self.form.dismiss_error();
                            }
                        });
                    }

                    if self.form.cards().next().is_some() {
                        ui.add_space(16.0);
                        ui.heading("Generated Descriptions");
                        ui.add_space(4.0);
                        for card in self.form.cards() {
                            show_card(ui, &card);
                            ui.add_space(8.0);
                        }
                    }
                });
        });
    }

    fn show_tone_selector(&mut self, ui: &mut egui::Ui) {
        let mut tone = self.form.tone();
        ui.label(egui::RichText::new("Writing Tone").strong());
        egui::ComboBox::from_id_salt("tone")
            .selected_text(tone.label())
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for option in Tone::ALL {
                    ui.selectable_value(&mut tone, option, option.label());
                }
            });
        if tone != self.form.tone() {
            self.form.set_tone(tone);
        }
    }

    fn show_upload_area(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Upload Product Images").strong());
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                if ui.button("📂 Open Files").clicked() {
                    self.open_files();
                }
                ui.label(
                    egui::RichText::new("Drop files here or click to upload")
                        .color(egui::Color32::GRAY),
                );
                ui.add_space(8.0);
            });
        });
    }

    fn show_selected_files(&mut self, ui: &mut egui::Ui) {
        if self.form.selection().is_empty() {
            return;
        }

        let mut remove = None;
        let mut clear = false;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Selected Files:").strong().size(15.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                clear = ui.small_button("🗑 Clear All").clicked();
            });
        });

        let cell_width = (ui.available_width() / 2.0 - 12.0).max(120.0);
        egui::Grid::new("selected_files")
            .num_columns(2)
            .spacing([12.0, 12.0])
            .show(ui, |ui| {
                for (i, entry) in self.form.selection().iter().enumerate() {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(cell_width);
                        ui.vertical(|ui| {
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(&entry.file().name).small());
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.small_button("✕").on_hover_text("Remove image").clicked() {
                                            remove = Some(i);
                                        }
                                    },
                                );
                            });
                            if let Some(tex) = entry.preview() {
                                let size = tex.size_vec2();
                                let scale = (192.0 / size.y).min(cell_width / size.x).min(1.0);
                                ui.image(egui::load::SizedTexture::new(tex.id(), size * scale));
                            } else {
                                ui.label(
                                    egui::RichText::new("No preview")
                                        .italics()
                                        .color(egui::Color32::GRAY),
                                );
                            }
                        });
                    });
                    if i % 2 == 1 {
                        ui.end_row();
                    }
                }
            });
        ui.add_space(12.0);

        if clear {
            self.form.clear_files();
            self.status = "Ready — drop images or click Open Files".into();
        } else if let Some(i) = remove {
            self.form.remove_file(i);
            self.status = format!("{} image(s) selected", self.form.selection().len());
        }
    }
}

fn show_card(ui: &mut egui::Ui, card: &DescriptionCard<'_>) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(card.title()).strong());
        ui.add_space(4.0);
        ui.label(card.text);

        if let Some(original) = card.original {
            ui.label(
                egui::RichText::new(format!("Original: {original}"))
                    .italics()
                    .color(egui::Color32::GRAY),
            );
        }

        ui.add_space(8.0);
        ui.label(egui::RichText::new("Key Highlights:").strong());
        for highlight in card.highlights {
            ui.label(format!("  • {highlight}"));
        }

        if let Some(price) = card.price_range {
            ui.add_space(8.0);
            ui.label(
                egui::RichText::new(format!("Suggested Price Range: {price}"))
                    .small()
                    .color(egui::Color32::GRAY),
            );
        }
    });
}

// ── Settings tab ────────────────────────────────────────────────────

impl App {
    fn show_settings_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Configuration");
                ui.add_space(8.0);

                // Config file path
                ui.horizontal(|ui| {
                    ui.label("Config file:");
                    if let Some(ref path) = self.config_path {
                        ui.label(path.display().to_string());
                    } else {
                        ui.label("(default)");
                    }
                    if ui.button("Load...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            match Config::load(Some(&path)) {
                                Ok(c) => {
                                    self.config = c;
                                    self.config_path = Some(path);
                                    self.status = "Config loaded".into();
                                }
                                Err(e) => {
                                    self.status = format!("Failed to load config: {e}");
                                }
                            }
                        }
                    }
                    if ui.button("Save").clicked() {
                        let path = self.config_path.as_deref();
                        match self.config.save(path) {
                            Ok(()) => self.status = "Config saved".into(),
                            Err(e) => self.status = format!("Failed to save config: {e}"),
                        }
                    }
                });

                ui.add_space(16.0);
                ui.separator();

                // ── Service ─────────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Description Service");
                ui.add_space(4.0);

                egui::Grid::new("service_settings")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Base URL:");
                        ui.text_edit_singleline(&mut self.config.service.base_url);
                        ui.end_row();

                        ui.label("Timeout (s):");
                        ui.add(egui::DragValue::new(&mut self.config.service.timeout_secs).range(0..=3600));
                        ui.end_row();
                    });
                ui.label(
                    egui::RichText::new("A timeout of 0 waits indefinitely.")
                        .small()
                        .color(egui::Color32::GRAY),
                );

                ui.add_space(16.0);
                ui.separator();

                // ── Form ────────────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Form");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    ui.label("Default tone:");
                    let tone = &mut self.config.form.default_tone;
                    egui::ComboBox::from_id_salt("default_tone")
                        .selected_text(tone.label())
                        .show_ui(ui, |ui| {
                            for option in Tone::ALL {
                                ui.selectable_value(tone, option, option.label());
                            }
                        });
                });
            });
        });
    }
}
