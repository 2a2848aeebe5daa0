//! Main label application
//!
//! Implements the egui App trait: form on the left, live preview in the
//! centre, batch queue on the right, export status at the bottom.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use egui::{Color32, RichText, Vec2};
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::export::{ExportOutcome, ExportSequencer};
use crate::label::LabelRenderer;
use crate::render::{RasterOptions, Rasterizer};
use crate::utils::time::now_millis;

use super::state::{AppState, ExportKind, ExportStatus};

/// Oversampling of the on-screen preview
const PREVIEW_SCALE: u32 = 2;

/// Width of the form and queue columns
const SIDE_PANEL_WIDTH: f32 = 260.0;

const BUTTON_HEIGHT: f32 = 40.0;

/// Finished export reported back from the runtime
struct ExportEvent {
    kind: ExportKind,
    result: Result<ExportOutcome>,
}

/// Main label application
pub struct LabelApp {
    /// Form, queue and status
    state: AppState,

    renderer: Arc<LabelRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    sequencer: ExportSequencer,

    /// Runtime running the exports
    runtime: Handle,
    events_tx: Sender<ExportEvent>,
    events_rx: Receiver<ExportEvent>,

    /// Preview texture, re-rendered when a field changes
    preview_texture: Option<egui::TextureHandle>,
    preview_dirty: bool,
    preview_error: Option<String>,
}

impl LabelApp {
    /// Create new label application
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        renderer: Arc<LabelRenderer>,
        rasterizer: Arc<dyn Rasterizer>,
        sequencer: ExportSequencer,
        runtime: Handle,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        info!(
            "Label app initialized: {}px label, output dir {}",
            renderer.size(),
            sequencer.settings().output_dir.display()
        );

        Self {
            state: AppState::new(),
            renderer,
            rasterizer,
            sequencer,
            runtime,
            events_tx,
            events_rx,
            preview_texture: None,
            preview_dirty: true,
            preview_error: None,
        }
    }

    /// Re-render and upload the preview for the current form values
    fn refresh_preview(&mut self, ctx: &egui::Context) {
        self.preview_dirty = false;

        let options = RasterOptions {
            scale: PREVIEW_SCALE,
            background: self.sequencer.settings().raster.background,
        };
        let form = &self.state.form;
        let image = match self
            .renderer
            .render(&form.username, &form.password)
            .and_then(|surface| self.rasterizer.rasterize(&surface, &options))
        {
            Ok(image) => image,
            Err(e) => {
                warn!("Preview failed: {}", e);
                self.preview_error = Some(e.to_string());
                return;
            }
        };
        self.preview_error = None;

        let size = [image.width() as usize, image.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, image.as_raw());

        if let Some(ref mut texture) = self.preview_texture {
            texture.set(color_image, egui::TextureOptions::LINEAR);
        } else {
            self.preview_texture = Some(ctx.load_texture(
                "label_preview",
                color_image,
                egui::TextureOptions::LINEAR,
            ));
        }
    }

    fn start_single_export(&mut self, ctx: &egui::Context) {
        let username = self.state.form.username.clone();
        let password = self.state.form.password.clone();
        self.spawn_export(ctx, ExportKind::Single, move |sequencer| async move {
            sequencer.export_single(&username, &password).await
        });
    }

    fn start_batch_export(&mut self, ctx: &egui::Context) {
        let labels = self.state.batch_snapshot();
        info!("Starting batch export of {} label(s)", labels.len());
        self.spawn_export(ctx, ExportKind::Batch, move |sequencer| async move {
            sequencer.export_batch(&labels).await
        });
    }

    fn spawn_export<F, Fut>(&mut self, ctx: &egui::Context, kind: ExportKind, job: F)
    where
        F: FnOnce(ExportSequencer) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<ExportOutcome>> + Send + 'static,
    {
        self.state.status = ExportStatus::Running(kind);
        let sequencer = self.sequencer.clone();
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();

        self.runtime.spawn(async move {
            let result = job(sequencer).await;
            if tx.send(ExportEvent { kind, result }).is_err() {
                warn!("Export finished after the window closed");
            }
            ctx.request_repaint();
        });
    }

    /// Apply finished exports to the status line
    fn poll_export_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.state.status = match event.result {
                Ok(ExportOutcome::Saved { path, pages }) => ExportStatus::Saved {
                    kind: event.kind,
                    path,
                    pages,
                },
                Ok(ExportOutcome::Skipped) => ExportStatus::Idle,
                Err(e) => {
                    error!("{:?} export failed: {}", event.kind, e);
                    ExportStatus::Failed(e.to_string())
                }
            };
        }
    }

    fn section_caption(ui: &mut egui::Ui, text: &str) {
        ui.label(RichText::new(text).small().strong().color(Color32::from_rgb(0x9C, 0xA3, 0xAF)));
    }

    fn render_form_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(12.0);
        Self::section_caption(ui, "CREDENCIAL DE USUÁRIO");
        let username = ui.add(
            egui::TextEdit::singleline(&mut self.state.form.username)
                .hint_text("Ex: jeandsds")
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);
        Self::section_caption(ui, "SENHA PROVISÓRIA");
        let password = ui.add(
            egui::TextEdit::singleline(&mut self.state.form.password)
                .hint_text("Ex: Sk@tesk804")
                .desired_width(f32::INFINITY),
        );
        if username.changed() || password.changed() {
            self.preview_dirty = true;
        }

        ui.add_space(16.0);
        let button_size = Vec2::new(ui.available_width(), BUTTON_HEIGHT);

        let single = egui::Button::new("Gerar PDF Individual").min_size(button_size);
        if ui.add_enabled(self.state.can_export_single(), single).clicked() {
            let ctx = ui.ctx().clone();
            self.start_single_export(&ctx);
        }

        let add = egui::Button::new("Adicionar ao Lote").min_size(button_size);
        if ui.add(add).clicked() && self.state.add_to_batch().is_some() {
            self.preview_dirty = true;
        }

        ui.add_space(16.0);
        ui.separator();
        ui.vertical_centered(|ui| Self::section_caption(ui, "EXPORTAÇÃO"));

        let batch = egui::Button::new("Salvar Lote em PDF").min_size(button_size);
        if ui.add_enabled(self.state.can_export_batch(), batch).clicked() {
            let ctx = ui.ctx().clone();
            self.start_batch_export(&ctx);
        }
    }

    fn render_queue_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            Self::section_caption(ui, "FILA DE LOTE");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(format!("{} ITENS", self.state.queue.len()))
                        .small()
                        .strong()
                        .color(Color32::from_rgb(0x02, 0x84, 0xC7)),
                );
            });
        });
        ui.separator();

        if self.state.queue.is_empty() {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(RichText::new("Aguardando itens...").italics().color(Color32::GRAY));
            });
            return;
        }

        let now = now_millis();
        let mut to_remove: Option<Uuid> = None;
        egui::ScrollArea::vertical().show(ui, |ui| {
            for item in self.state.queue.list() {
                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.add(egui::Label::new(RichText::new(item.username()).strong()).truncate())
                            .on_hover_text(queued_ago(item.timestamp(), now));
                        ui.label(
                            RichText::new(format!("#{}", item.short_id()))
                                .small()
                                .color(Color32::GRAY),
                        );
                    });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Remover").clicked() {
                            to_remove = Some(item.id());
                        }
                    });
                });
                ui.separator();
            }
        });

        if let Some(id) = to_remove {
            self.state.remove_from_batch(id);
        }
    }

    fn render_preview(&self, ui: &mut egui::Ui) {
        let side = self.renderer.size() as f32;
        ui.vertical_centered(|ui| {
            ui.add_space(16.0);
            if let Some(ref texture) = self.preview_texture {
                ui.image(egui::ImageSource::Texture(egui::load::SizedTexture::new(
                    texture.id(),
                    Vec2::splat(side),
                )));
            }
            if let Some(ref message) = self.preview_error {
                ui.label(RichText::new(message).color(Color32::from_rgb(0xEF, 0x44, 0x44)));
            }
            ui.add_space(12.0);
            ui.label(
                RichText::new(format!(
                    "FORMATO {}CM (1:1)",
                    self.sequencer.settings().page.cm_tag()
                ))
                .small()
                .strong()
                .color(Color32::GRAY),
            );
        });
    }

    fn status_color(&self) -> Color32 {
        match self.state.status {
            ExportStatus::Saved { .. } => Color32::from_rgb(0x16, 0xA3, 0x4A),
            ExportStatus::Warning(_) => Color32::from_rgb(0xD9, 0x77, 0x06),
            ExportStatus::Failed(_) => Color32::from_rgb(0xEF, 0x44, 0x44),
            _ => Color32::GRAY,
        }
    }
}

/// Hover text for a queue item added at `timestamp`
fn queued_ago(timestamp: i64, now: i64) -> String {
    let secs = (now - timestamp).max(0) / 1000;
    if secs < 60 {
        format!("Adicionado há {}s", secs)
    } else {
        format!("Adicionado há {} min", secs / 60)
    }
}

impl eframe::App for LabelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export_events();
        if self.preview_dirty {
            self.refresh_preview(ctx);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Gerador de Etiquetas Pro").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format!(
                            "PADRÃO: {}CM",
                            self.sequencer.settings().page.cm_tag()
                        ))
                        .small()
                        .strong(),
                    );
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(RichText::new(self.state.status.message()).color(self.status_color()));
        });

        egui::SidePanel::left("form")
            .resizable(false)
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| self.render_form_panel(ui));

        egui::SidePanel::right("queue")
            .resizable(false)
            .exact_width(SIDE_PANEL_WIDTH)
            .show(ctx, |ui| self.render_queue_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.render_preview(ui));

        if self.state.status.is_running() {
            ctx.request_repaint();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_ago() {
        assert_eq!(queued_ago(1_000, 1_000), "Adicionado há 0s");
        assert_eq!(queued_ago(1_000, 43_500), "Adicionado há 42s");
        assert_eq!(queued_ago(0, 185_000), "Adicionado há 3 min");
        // Clock stepped backwards
        assert_eq!(queued_ago(5_000, 1_000), "Adicionado há 0s");
    }
}
