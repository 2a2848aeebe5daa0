//! Application state
//!
//! Form fields and batch queue, owned by one explicit container that lives
//! as long as the window. Nothing here is persisted.

use std::path::PathBuf;

use uuid::Uuid;

use crate::batch::{BatchQueue, CredentialLabel};

/// The two form fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub username: String,
    pub password: String,
}

impl FormState {
    /// Both fields hold something besides whitespace
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.username.clear();
        self.password.clear();
    }
}

/// Which export is running or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Single,
    Batch,
}

/// Status line shown under the panels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExportStatus {
    #[default]
    Idle,
    Running(ExportKind),
    Saved {
        kind: ExportKind,
        path: PathBuf,
        pages: usize,
    },
    Warning(String),
    Failed(String),
}

impl ExportStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ExportStatus::Running(_))
    }

    /// Text for the status line
    pub fn message(&self) -> String {
        match self {
            ExportStatus::Idle => String::new(),
            ExportStatus::Running(ExportKind::Single) => "Gerando PDF...".to_string(),
            ExportStatus::Running(ExportKind::Batch) => "Gerando lote...".to_string(),
            ExportStatus::Saved { kind: ExportKind::Single, path, .. } => {
                format!("Etiqueta salva com sucesso: {}", path.display())
            }
            ExportStatus::Saved { kind: ExportKind::Batch, path, pages } => {
                format!("Lote com {} etiquetas salvo: {}", pages, path.display())
            }
            ExportStatus::Warning(message) => message.clone(),
            ExportStatus::Failed(message) => format!("Erro: {}", message),
        }
    }
}

/// Everything the window mutates
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub form: FormState,
    pub queue: BatchQueue,
    pub status: ExportStatus,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the form values and clear the form.
    ///
    /// Leaves the form untouched and sets a warning when a field is empty.
    pub fn add_to_batch(&mut self) -> Option<Uuid> {
        let added = self
            .queue
            .add(&self.form.username, &self.form.password)
            .map(|label| label.id());
        match added {
            Some(_) => self.form.clear(),
            None => self.status = ExportStatus::Warning("Preencha usuário e senha.".to_string()),
        }
        added
    }

    pub fn remove_from_batch(&mut self, id: Uuid) -> bool {
        self.queue.remove(id)
    }

    /// Copy of the queue taken when an export starts
    pub fn batch_snapshot(&self) -> Vec<CredentialLabel> {
        self.queue.list().to_vec()
    }

    pub fn can_export_single(&self) -> bool {
        self.form.is_complete() && !self.status.is_running()
    }

    pub fn can_export_batch(&self) -> bool {
        !self.queue.is_empty() && !self.status.is_running()
    }
}
