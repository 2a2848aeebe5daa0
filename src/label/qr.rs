//! QR encoding
//!
//! Wraps the `qrcode` crate and exposes the module matrix only. The caller
//! paints the modules itself, at whatever resolution it needs.

use qrcode::{Color, EcLevel, QrCode};
use tracing::{debug, warn};

use crate::error::{ExportError, Result};

/// Error-correction level, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum QrLevel {
    Low,
    Medium,
    Quartile,
    #[default]
    High,
}

impl QrLevel {
    fn ec_level(self) -> EcLevel {
        match self {
            QrLevel::Low => EcLevel::L,
            QrLevel::Medium => EcLevel::M,
            QrLevel::Quartile => EcLevel::Q,
            QrLevel::High => EcLevel::H,
        }
    }

    /// Next weaker level, if any
    fn weaker(self) -> Option<Self> {
        match self {
            QrLevel::High => Some(QrLevel::Quartile),
            QrLevel::Quartile => Some(QrLevel::Medium),
            QrLevel::Medium => Some(QrLevel::Low),
            QrLevel::Low => None,
        }
    }
}

/// Square grid of dark/light modules, without quiet zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
    level: QrLevel,
}

impl QrMatrix {
    /// Modules per side
    pub fn width(&self) -> usize {
        self.width
    }

    /// Level the payload was actually encoded at
    #[cfg(test)]
    pub fn level(&self) -> QrLevel {
        self.level
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }
}

/// Payload handed to the encoder: a single space stands in for an empty value
pub fn qr_payload(value: &str) -> &str {
    if value.is_empty() {
        " "
    } else {
        value
    }
}

/// Encode `payload` at `level`, stepping down to weaker levels when it does not fit.
pub fn encode(payload: &str, level: QrLevel) -> Result<QrMatrix> {
    let payload = qr_payload(payload);
    let mut current = level;

    loop {
        match QrCode::with_error_correction_level(payload.as_bytes(), current.ec_level()) {
            Ok(code) => {
                if current != level {
                    debug!("QR payload of {} bytes encoded at {:?}", payload.len(), current);
                }
                let dark = code
                    .to_colors()
                    .into_iter()
                    .map(|c| c == Color::Dark)
                    .collect();
                return Ok(QrMatrix {
                    width: code.width(),
                    dark,
                    level: current,
                });
            }
            Err(e) => match current.weaker() {
                Some(weaker) => current = weaker,
                None => {
                    warn!("QR payload of {} bytes does not fit: {}", payload.len(), e);
                    return Err(ExportError::QrEncoding(e.to_string()));
                }
            },
        }
    }
}
