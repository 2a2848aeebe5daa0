//! Export sequencer
//!
//! Individual export: render, rasterize, one full-bleed page, save.
//! Batch export: one document, one offscreen surface, items processed
//! strictly one after another in queue order.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use tracing::{debug, info};

use crate::batch::CredentialLabel;
use crate::config::LabelConfig;
use crate::document::{DocumentAssembler, DocumentBackend, PageFormat};
use crate::error::Result;
use crate::label::{LabelRenderer, LabelSurface};
use crate::render::{RasterOptions, Rasterizer};
use crate::utils::time::now_millis;

use super::filename::{batch_filename, single_filename, unused_path};
use super::offscreen::OffscreenSurface;

/// Export parameters resolved from the configuration
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub page: PageFormat,
    pub raster: RasterOptions,
    pub settle_timeout: Duration,
    pub output_dir: PathBuf,
    pub single_prefix: String,
    pub fallback_name: String,
    pub batch_prefix: String,
}

impl ExportSettings {
    pub fn from_config(config: &LabelConfig) -> Self {
        Self {
            page: config.page.format(),
            raster: config.raster.options(),
            settle_timeout: config.export.settle_timeout(),
            output_dir: config.export.output_dir.clone(),
            single_prefix: config.export.single_prefix.clone(),
            fallback_name: config.export.fallback_name.clone(),
            batch_prefix: config.export.batch_prefix.clone(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Guard declined: empty field or empty queue
    Skipped,
    /// Document written
    Saved { path: PathBuf, pages: usize },
}

/// Orchestrates renderer, rasterizer and document backend
#[derive(Clone)]
pub struct ExportSequencer {
    renderer: Arc<LabelRenderer>,
    rasterizer: Arc<dyn Rasterizer>,
    backend: Arc<dyn DocumentBackend>,
    settings: ExportSettings,
}

impl ExportSequencer {
    pub fn new(
        renderer: Arc<LabelRenderer>,
        rasterizer: Arc<dyn Rasterizer>,
        backend: Arc<dyn DocumentBackend>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            renderer,
            rasterizer,
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export the current form values as a one-page document.
    ///
    /// Skipped when either value is empty or whitespace-only.
    pub async fn export_single(&self, username: &str, password: &str) -> Result<ExportOutcome> {
        if username.trim().is_empty() || password.trim().is_empty() {
            debug!("Individual export skipped: empty field");
            return Ok(ExportOutcome::Skipped);
        }

        let renderer = self.renderer.clone();
        let (user, pass) = (username.to_string(), password.to_string());
        let surface = tokio::task::spawn_blocking(move || renderer.render(&user, &pass)).await??;

        let filename = single_filename(
            &self.settings.single_prefix,
            username,
            &self.settings.fallback_name,
        );
        self.export_surface(Arc::new(surface), &filename).await
    }

    /// Rasterize an already rendered surface onto a single page saved as `filename`
    pub async fn export_surface(&self, surface: Arc<LabelSurface>, filename: &str) -> Result<ExportOutcome> {
        let format = self.settings.page;
        let image = self.rasterize(surface).await?;

        let mut document = self.backend.new_document(format);
        document.add_image(&image, format.full_bleed())?;

        let path = self.save(document, filename).await?;

        info!("Label saved to {}", path.display());
        Ok(ExportOutcome::Saved { path, pages: 1 })
    }

    /// Export every label, one page each, in the given order.
    ///
    /// Skipped when `labels` is empty. The labels are only read. Nothing is
    /// written if any item fails.
    pub async fn export_batch(&self, labels: &[CredentialLabel]) -> Result<ExportOutcome> {
        if labels.is_empty() {
            debug!("Batch export skipped: queue is empty");
            return Ok(ExportOutcome::Skipped);
        }

        let format = self.settings.page;
        let mut document = self.backend.new_document(format);
        let mut offscreen = OffscreenSurface::new(self.renderer.clone(), self.settings.settle_timeout);

        for (index, label) in labels.iter().enumerate() {
            let mut mounted = offscreen.mount(label.username(), label.password());
            let surface = mounted.rendered().await?;
            let image = self.rasterize(surface).await?;

            // The first label goes on the document's initial page
            if index > 0 {
                document.add_page(format);
            }
            document.add_image(&image, format.full_bleed())?;
            mounted.unmount();

            debug!(
                "Batch page {}/{} done (#{})",
                index + 1,
                labels.len(),
                label.short_id()
            );
        }

        let pages = document.page_count();
        let filename = batch_filename(&self.settings.batch_prefix, &format.cm_tag(), now_millis());
        let path = self.save(document, &filename).await?;
        drop(offscreen);

        info!("Batch of {} label(s) saved to {}", pages, path.display());
        Ok(ExportOutcome::Saved { path, pages })
    }

    async fn rasterize(&self, surface: Arc<LabelSurface>) -> Result<RgbImage> {
        let rasterizer = self.rasterizer.clone();
        let options = self.settings.raster;
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&surface, &options)).await?
    }

    /// Save into the output directory, next to any file already using `filename`
    async fn save(&self, document: Box<dyn DocumentAssembler>, filename: &str) -> Result<PathBuf> {
        let dir = self.settings.output_dir.clone();
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(&dir)?;
            }
            let path = unused_path(&dir, &filename);
            document.save(&path)?;
            Ok(path)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use image::Rgb;
    use lopdf::Document;
    use parking_lot::Mutex;

    use super::*;
    use crate::batch::BatchQueue;
    use crate::config::LayoutConfig;
    use crate::document::assembler::PageRect;
    use crate::document::PdfBackend;
    use crate::error::ExportError;
    use crate::render::{FontBook, LabelRasterizer};

    /// One page as seen by the recording backend
    #[derive(Debug, Clone, PartialEq)]
    struct RecordedPage {
        format: PageFormat,
        /// QR payloads of the surface rasterized for this page
        payloads: Vec<String>,
        placements: Vec<PageRect>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedDocument {
        path: PathBuf,
        pages: Vec<RecordedPage>,
    }

    /// Rasterizer that encodes the surface's payloads as the image width so
    /// the backend can map images back to labels
    #[derive(Default)]
    struct RecordingRasterizer {
        surfaces: Mutex<Vec<Vec<String>>>,
    }

    impl Rasterizer for RecordingRasterizer {
        fn rasterize(&self, surface: &LabelSurface, _options: &RasterOptions) -> Result<RgbImage> {
            let mut surfaces = self.surfaces.lock();
            surfaces.push(surface.payloads().iter().map(|s| s.to_string()).collect());
            Ok(RgbImage::from_pixel(surfaces.len() as u32, 1, Rgb([0, 0, 0])))
        }
    }

    struct RecordingDocument {
        rasterizer: Arc<RecordingRasterizer>,
        saved: Arc<Mutex<Vec<RecordedDocument>>>,
        pages: Vec<RecordedPage>,
    }

    impl DocumentAssembler for RecordingDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn add_page(&mut self, format: PageFormat) {
            self.pages.push(RecordedPage {
                format,
                payloads: Vec::new(),
                placements: Vec::new(),
            });
        }

        fn add_image(&mut self, image: &RgbImage, rect: PageRect) -> Result<()> {
            let index = image.width() as usize - 1;
            let payloads = self.rasterizer.surfaces.lock()[index].clone();
            let page = self.pages.last_mut().ok_or(ExportError::NoPage)?;
            page.payloads = payloads;
            page.placements.push(rect);
            Ok(())
        }

        fn save(self: Box<Self>, path: &Path) -> Result<()> {
            self.saved.lock().push(RecordedDocument {
                path: path.to_path_buf(),
                pages: self.pages,
            });
            Ok(())
        }
    }

    struct RecordingBackend {
        rasterizer: Arc<RecordingRasterizer>,
        saved: Arc<Mutex<Vec<RecordedDocument>>>,
    }

    impl DocumentBackend for RecordingBackend {
        fn new_document(&self, format: PageFormat) -> Box<dyn DocumentAssembler> {
            let mut document = RecordingDocument {
                rasterizer: self.rasterizer.clone(),
                saved: self.saved.clone(),
                pages: Vec::new(),
            };
            document.add_page(format);
            Box::new(document)
        }
    }

    fn renderer() -> Arc<LabelRenderer> {
        let fonts = Arc::new(FontBook::embedded().unwrap());
        Arc::new(LabelRenderer::new(LayoutConfig::default(), fonts))
    }

    fn settings(output_dir: PathBuf) -> ExportSettings {
        ExportSettings {
            settle_timeout: Duration::from_secs(10),
            output_dir,
            ..ExportSettings::default()
        }
    }

    fn recording() -> (ExportSequencer, Arc<Mutex<Vec<RecordedDocument>>>, PathBuf) {
        let rasterizer = Arc::new(RecordingRasterizer::default());
        let saved = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            rasterizer: rasterizer.clone(),
            saved: saved.clone(),
        };
        let dir = temp_dir();
        let sequencer = ExportSequencer::new(
            renderer(),
            rasterizer,
            Arc::new(backend),
            settings(dir.clone()),
        );
        (sequencer, saved, dir)
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("labels-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_single_skips_empty_fields() {
        let (sequencer, saved, _dir) = recording();
        for (u, p) in [("", "pw"), ("user", ""), ("  ", "pw"), ("user", "\t")] {
            assert_eq!(sequencer.export_single(u, p).await.unwrap(), ExportOutcome::Skipped);
        }
        assert!(saved.lock().is_empty());
    }

    #[tokio::test]
    async fn test_single_export_one_full_bleed_page() {
        let (sequencer, saved, dir) = recording();
        let outcome = sequencer.export_single("jeandsds", "Sk@tesk804").await.unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Saved {
                path: dir.join("etiqueta-jeandsds.pdf"),
                pages: 1
            }
        );

        let saved = saved.lock();
        assert_eq!(saved.len(), 1);
        let page = &saved[0].pages[0];
        assert_eq!(saved[0].pages.len(), 1);
        assert_eq!(page.format, PageFormat::label_square());
        assert_eq!(page.payloads, vec!["jeandsds", "Sk@tesk804"]);
        assert_eq!(page.placements, vec![PageFormat::label_square().full_bleed()]);
    }

    #[tokio::test]
    async fn test_single_export_sanitizes_filename() {
        let (sequencer, _saved, dir) = recording();
        let outcome = sequencer.export_single("../x y", "pw").await.unwrap();
        assert_eq!(
            outcome,
            ExportOutcome::Saved {
                path: dir.join("etiqueta-x_y.pdf"),
                pages: 1
            }
        );
    }

    #[tokio::test]
    async fn test_batch_skips_empty_queue() {
        let (sequencer, saved, _dir) = recording();
        assert_eq!(sequencer.export_batch(&[]).await.unwrap(), ExportOutcome::Skipped);
        assert!(saved.lock().is_empty());
    }

    #[tokio::test]
    async fn test_batch_pages_follow_queue_order() {
        let (sequencer, saved, _dir) = recording();
        let mut queue = BatchQueue::new();
        queue.add("alice", "pw1");
        queue.add("bob", "pw2");
        queue.add("carol", "pw3");
        let before: Vec<CredentialLabel> = queue.list().to_vec();

        let outcome = sequencer.export_batch(queue.list()).await.unwrap();
        let ExportOutcome::Saved { path, pages } = outcome else {
            panic!("batch export was skipped");
        };
        assert_eq!(pages, 3);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("lote-etiquetas-10x10-"));
        assert!(name.ends_with(".pdf"));

        let saved = saved.lock();
        let document = &saved[0];
        assert_eq!(document.pages.len(), 3);
        let order: Vec<Vec<String>> = document.pages.iter().map(|p| p.payloads.clone()).collect();
        assert_eq!(
            order,
            vec![
                vec!["carol".to_string(), "pw3".to_string()],
                vec!["bob".to_string(), "pw2".to_string()],
                vec!["alice".to_string(), "pw1".to_string()],
            ]
        );
        for page in &document.pages {
            assert_eq!(page.format, PageFormat::label_square());
            assert_eq!(page.placements.len(), 1);
        }

        // Export never touches the queue
        assert_eq!(queue.list(), before.as_slice());
    }

    #[tokio::test]
    async fn test_batch_failure_saves_nothing() {
        let (sequencer, saved, _dir) = recording();
        let mut queue = BatchQueue::new();
        queue.add(&"x".repeat(4000), "pw");
        queue.add("bob", "pw2");

        let err = sequencer.export_batch(queue.list()).await.unwrap_err();
        assert!(matches!(err, ExportError::QrEncoding(_)));
        assert!(saved.lock().is_empty());
    }

    #[tokio::test]
    async fn test_batch_with_default_timing_waits_for_long_payloads() {
        let (mut sequencer, saved, dir) = recording();
        sequencer.settings = ExportSettings {
            output_dir: dir,
            ..ExportSettings::default()
        };
        assert_eq!(sequencer.settings().settle_timeout, Duration::from_millis(150));

        // Fits level H, but takes a while to encode and lay out
        let long = "p".repeat(1200);
        let mut queue = BatchQueue::new();
        queue.add("alice", &long);
        queue.add("bob", &long);

        let single = sequencer.export_single("alice", &long).await.unwrap();
        assert!(matches!(single, ExportOutcome::Saved { pages: 1, .. }));

        let batch = sequencer.export_batch(queue.list()).await.unwrap();
        assert!(matches!(batch, ExportOutcome::Saved { pages: 2, .. }));

        let saved = saved.lock();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].pages[0].payloads, vec!["bob".to_string(), long.clone()]);
        assert_eq!(saved[1].pages[1].payloads, vec!["alice".to_string(), long]);
    }

    #[tokio::test]
    async fn test_end_to_end_pdf() {
        let fonts = Arc::new(FontBook::embedded().unwrap());
        let renderer = Arc::new(LabelRenderer::new(LayoutConfig::default(), fonts.clone()));
        let dir = temp_dir();
        let mut settings = settings(dir.clone());
        settings.raster.scale = 1;
        let sequencer = ExportSequencer::new(
            renderer,
            Arc::new(LabelRasterizer::new(fonts)),
            Arc::new(PdfBackend),
            settings,
        );

        let mut queue = BatchQueue::new();
        queue.add("alice", "pw1");
        queue.add("bob", "pw2");
        let names: Vec<&str> = queue.list().iter().map(|l| l.username()).collect();
        assert_eq!(names, vec!["bob", "alice"]);

        let ExportOutcome::Saved { path, pages } = sequencer.export_batch(queue.list()).await.unwrap() else {
            panic!("batch export was skipped");
        };
        assert_eq!(pages, 2);
        assert!(path.starts_with(&dir));

        let loaded = Document::load(&path).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
        assert_eq!(queue.len(), 2);

        let ExportOutcome::Saved { path: single, .. } = sequencer.export_single("alice", "pw1").await.unwrap() else {
            panic!("single export was skipped");
        };
        assert_eq!(single, dir.join("etiqueta-alice.pdf"));
        assert_eq!(Document::load(&single).unwrap().get_pages().len(), 1);
        let first = std::fs::read(&single).unwrap();

        // Same username again lands next to the first file
        let ExportOutcome::Saved { path: again, .. } = sequencer.export_single("alice", "pw2").await.unwrap() else {
            panic!("single export was skipped");
        };
        assert_eq!(again, dir.join("etiqueta-alice-1.pdf"));
        assert_eq!(std::fs::read(&single).unwrap(), first);
        assert_eq!(Document::load(&again).unwrap().get_pages().len(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
