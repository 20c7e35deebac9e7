//! PDF painter
//!
//! Paints an [`InvoiceLayout`] onto A4 pages. With a TrueType face configured
//! the text is drawn verbatim, currency symbol included; otherwise the
//! built-in Helvetica faces are used and text is mapped through [`pdf_safe`].
//! Coordinates are in millimetres from the bottom-left corner; a new page is
//! started whenever the next block would cross the bottom margin.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};
use tracing::warn;

use core_kernel::Money;

use crate::error::DocumentError;
use crate::format::pdf_safe;
use crate::layout::InvoiceLayout;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 14.0;
const LINE_HEIGHT: f32 = 5.5;
const LAYER_NAME: &str = "Invoice";

/// Money as `INR 2500`, for faces that cannot draw currency symbols
fn money_text(money: &Money) -> String {
    money.with_prefix(&format!("{} ", money.currency().code()))
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Set when an embedded face covers the full text
    unicode: bool,
    /// Baseline of the next line
    y: f32,
}

impl Canvas {
    fn new(title: &str, font: Option<&[u8]>) -> Result<Self, DocumentError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        let layer = doc.get_page(page).get_layer(layer);

        let embedded = font.and_then(|bytes| match doc.add_external_font(bytes) {
            Ok(face) => Some(face),
            Err(e) => {
                warn!(error = %e, "Invoice font unusable, falling back to Helvetica");
                None
            }
        });
        let (regular, bold, unicode) = match embedded {
            Some(face) => (face.clone(), face, true),
            None => {
                let regular = doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))?;
                let bold = doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))?;
                (regular, bold, false)
            }
        };

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            unicode,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn money(&self, money: &Money) -> String {
        if self.unicode {
            money.to_string()
        } else {
            money_text(money)
        }
    }

    /// Starts a new page if `height` more millimetres do not fit
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        let text = if self.unicode { text.to_string() } else { pdf_safe(text) };
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn line(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        self.reserve(LINE_HEIGHT);
        self.text_at(text, size, x, self.y, bold);
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn rule(&mut self) {
        self.reserve(2.0);
        self.layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(self.y + 3.5)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(self.y + 3.5)), false),
            ],
            is_closed: false,
        });
    }

    fn filled_box(&self, x: f32, y: f32, width: f32, height: f32, grey: f32) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(grey, grey, grey, None)));
        self.layer.add_rect(
            Rect::new(Mm(x), Mm(y), Mm(x + width), Mm(y + height)).with_mode(PaintMode::Fill),
        );
        self.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }

    fn finish(self) -> Result<Vec<u8>, DocumentError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| DocumentError::Pdf(e.to_string()))
    }
}

/// Turns layouts into PDF bytes
#[derive(Debug, Clone, Default)]
pub struct PdfPainter {
    logo_path: Option<PathBuf>,
    font_path: Option<PathBuf>,
}

impl PdfPainter {
    pub fn new(logo_path: Option<PathBuf>) -> Self {
        Self {
            logo_path,
            font_path: None,
        }
    }

    /// Embeds a TrueType face, e.g. one with the rupee sign, for all text
    pub fn with_font(mut self, font_path: Option<PathBuf>) -> Self {
        self.font_path = font_path;
        self
    }

    pub fn paint(&self, layout: &InvoiceLayout) -> Result<Vec<u8>, DocumentError> {
        let font = self.font_path.as_deref().and_then(read_font);
        let title = format!("{} {}", layout.title, layout.summary.invoice_number);
        let mut canvas = Canvas::new(&title, font.as_deref())?;

        // Header band
        if let Some(path) = &self.logo_path {
            self.draw_logo(&canvas, path);
        }
        canvas.text_at(&layout.title, 20.0, PAGE_WIDTH - MARGIN - 30.0, PAGE_HEIGHT - 22.0, true);

        // Summary panel, right-aligned grey box
        let box_x = 110.0;
        let box_top = PAGE_HEIGHT - 30.0;
        canvas.filled_box(box_x, box_top - 42.0, PAGE_WIDTH - MARGIN - box_x, 42.0, 0.94);
        let summary = &layout.summary;
        let summary_lines = [
            summary.status_marker.clone(),
            format!("Payment reference: {}", summary.payment_reference),
            format!("Invoice #: {}", summary.invoice_number),
            format!("Invoice date: {}", summary.invoice_date),
            format!("Due date: {}", summary.due_date),
            format!("Total payable: {}", canvas.money(&summary.total_payable)),
        ];
        let mut y = box_top - 6.0;
        for (i, text) in summary_lines.iter().enumerate() {
            canvas.text_at(text, 9.0, box_x + 4.0, y, i == 0);
            y -= 6.0;
        }

        // Party block
        canvas.y = box_top - 50.0;
        let party = &layout.party;
        canvas.line(&party.name, 11.0, MARGIN, true);
        canvas.line(&party.address, 10.0, MARGIN, false);
        canvas.line(&party.email, 10.0, MARGIN, false);
        canvas.line(&party.phone, 10.0, MARGIN, false);
        canvas.gap(6.0);

        // Address table
        let rows = layout.addresses.iter().map(|c| c.lines.len()).max().unwrap_or(0) + 1;
        canvas.reserve(rows as f32 * LINE_HEIGHT);
        let column_width = (PAGE_WIDTH - 2.0 * MARGIN) / layout.addresses.len().max(1) as f32;
        let top = canvas.y;
        for (i, column) in layout.addresses.iter().enumerate() {
            let x = MARGIN + column_width * i as f32;
            canvas.text_at(&column.heading, 10.0, x, top, true);
            for (row, text) in column.lines.iter().enumerate() {
                canvas.text_at(text, 9.0, x, top - LINE_HEIGHT * (row + 1) as f32, false);
            }
        }
        canvas.y = top - rows as f32 * LINE_HEIGHT;
        canvas.gap(6.0);

        // Order information
        canvas.line("Order information", 12.0, MARGIN, true);
        canvas.reserve(LINE_HEIGHT);
        canvas.text_at(&format!("Order date: {}", layout.order.order_date), 10.0, MARGIN, canvas.y, false);
        canvas.text_at(&format!("Order #: {}", layout.order.order_number), 10.0, 105.0, canvas.y, false);
        canvas.gap(LINE_HEIGHT + 6.0);

        // Line items
        canvas.line("Invoice details", 12.0, MARGIN, true);
        let columns = [MARGIN, MARGIN + 88.0, MARGIN + 106.0, MARGIN + 141.0];
        canvas.reserve(LINE_HEIGHT * 2.0);
        for (x, heading) in columns.iter().zip(["Description", "Qty", "Unit price", "Item subtotal"]) {
            canvas.text_at(heading, 10.0, *x, canvas.y, true);
        }
        canvas.gap(LINE_HEIGHT);
        canvas.rule();
        for item in &layout.line_items {
            canvas.reserve(LINE_HEIGHT);
            canvas.text_at(&item.description, 10.0, columns[0], canvas.y, false);
            canvas.text_at(&item.quantity.to_string(), 10.0, columns[1], canvas.y, false);
            canvas.text_at(&canvas.money(&item.unit_price), 10.0, columns[2], canvas.y, false);
            canvas.text_at(&canvas.money(&item.subtotal), 10.0, columns[3], canvas.y, false);
            canvas.gap(LINE_HEIGHT);
        }
        canvas.gap(6.0);

        // Total
        canvas.reserve(LINE_HEIGHT);
        canvas.text_at("Invoice total", 12.0, MARGIN, canvas.y, false);
        canvas.text_at(&canvas.money(&layout.total), 12.0, columns[3], canvas.y, true);
        canvas.gap(LINE_HEIGHT + 14.0);

        // Footer
        for text in &layout.footer {
            canvas.line(text, 8.0, MARGIN, false);
        }

        canvas.finish()
    }

    /// Draws the logo at the top left; a missing or unreadable file is skipped
    fn draw_logo(&self, canvas: &Canvas, path: &Path) {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Logo missing, skipping");
                return;
            }
        };
        let image = PngDecoder::new(BufReader::new(file))
            .map_err(|e| e.to_string())
            .and_then(|decoder| Image::try_from(decoder).map_err(|e| e.to_string()));
        match image {
            Ok(image) => image.add_to_layer(
                canvas.layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(MARGIN)),
                    translate_y: Some(Mm(PAGE_HEIGHT - 32.0)),
                    dpi: Some(300.0),
                    ..Default::default()
                },
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Logo unreadable, skipping"),
        }
    }
}

/// Reads the configured face; a missing file falls back to Helvetica
fn read_font(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invoice font missing, falling back to Helvetica");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_text_uses_iso_code() {
        let money = Money::new(rust_decimal_macros::dec!(2500), core_kernel::Currency::INR);
        assert_eq!(money_text(&money), "INR 2500");
    }
}
