//! QR artifact rendering for tickets.
//!
//! The payload is a small JSON document scanned by the check-in tooling,
//! so the field names are part of the wire contract (camelCase). Encoding
//! uses error-correction level H and renders black-on-white with a
//! 1-module quiet zone at a fixed target width.

use std::io::Cursor;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde::Serialize;
use uuid::Uuid;

/// Target edge length of the rendered artifact in pixels. The actual
/// output is the largest whole-module multiple that fits.
pub const QR_TARGET_WIDTH: u32 = 512;

/// JSON payload embedded in every ticket QR code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketQrPayload {
    pub ticket_number: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub event_name: String,
    pub user_name: String,
    pub date: DateTime<Utc>,
    pub check_in_url: String,
}

/// Deep link scanned at the door; resolves to the check-in flow for the
/// given ticket number.
pub fn check_in_url(base: &str, ticket_number: &str) -> String {
    format!("{}/check-in/{}", base.trim_end_matches('/'), ticket_number)
}

/// Render the payload to a PNG and wrap it as a base64 data URL — the
/// inline artifact form stored on the ticket row.
pub fn render_data_url(payload: &TicketQrPayload) -> Result<String, anyhow::Error> {
    let png = render_png(payload)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

/// Render the payload to raw PNG bytes — the form mirrored to object
/// storage.
pub fn render_png(payload: &TicketQrPayload) -> Result<Vec<u8>, anyhow::Error> {
    let json = serde_json::to_string(payload).context("serialize QR payload")?;
    let code = QrCode::with_error_correction_level(json.as_bytes(), EcLevel::H)
        .context("encode QR payload")?;

    let width = code.width();
    let colors = code.to_colors();

    // 1-module quiet zone on every side.
    let modules = width as u32 + 2;
    let scale = (QR_TARGET_WIDTH / modules).max(1);
    let size = scale * modules;

    let mut img = GrayImage::from_pixel(size, size, Luma([0xFF]));
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = (i % width) as u32 + 1;
        let my = (i / width) as u32 + 1;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(mx * scale + dx, my * scale + dy, Luma([0x00]));
            }
        }
    }

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode QR PNG")?;
    Ok(buf)
}
