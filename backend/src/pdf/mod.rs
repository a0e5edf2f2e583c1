//! Single page A4 report rendering on top of `printpdf`
//!
//! Coordinates are PDF points measured from the bottom-left corner of the page.

pub mod test_result;

pub use test_result::{generate_test_result, TestResultInput};

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Pt,
};

use crate::error::{AppError, AppResult};

const A4_WIDTH_MM: f32 = 210.0;
const A4_HEIGHT_MM: f32 = 297.0;
/// A4 height in points
pub const PAGE_HEIGHT: f32 = 842.0;
pub const PAGE_WIDTH: f32 = 595.0;

const MARGIN: f32 = 100.0;
const FONT_SIZE: f32 = 12.0;
const TITLE_SIZE: f32 = 20.0;
const LINE_SPACING: f32 = 20.0;
const ROW_HEIGHT: f32 = 20.0;
const CELL_MARGIN: f32 = 10.0;
const TEXT_BASELINE: f32 = 5.0;
const COLUMN_WIDTH: f32 = 110.0;

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::Pdf(e.to_string())
}

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

/// A one page document being drawn
pub struct ReportPage {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl ReportPage {
    pub fn new(title: &str) -> AppResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
        })
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, pt(x), pt(y), font);
    }

    fn line(&self, from: (f32, f32), to: (f32, f32)) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(pt(from.0), pt(from.1)), false),
                (Point::new(pt(to.0), pt(to.1)), false),
            ],
            is_closed: false,
        });
    }

    /// Brand header on the right, title on the left
    pub fn header(&self, title: &str) {
        let top = PAGE_HEIGHT - 50.0;
        self.text("MEDFAST", 24.0, PAGE_WIDTH - MARGIN - 150.0 + 20.0, top - 35.0, true);
        self.text(title, TITLE_SIZE, MARGIN, top - 75.0, true);
    }

    /// One line per entry, going down from `top`
    pub fn info_lines(&self, lines: &[String], top: f32) {
        for (i, line) in lines.iter().enumerate() {
            self.text(line, FONT_SIZE, MARGIN, top - i as f32 * LINE_SPACING, false);
        }
    }

    /// Header row plus content rows, with a full grid; returns the y below the table
    pub fn table(&self, headers: &[&str], rows: &[[String; 4]], top: f32) -> f32 {
        let column_x = |i: usize| MARGIN + i as f32 * COLUMN_WIDTH + CELL_MARGIN;

        for (i, header) in headers.iter().enumerate() {
            self.text(header, FONT_SIZE, column_x(i), top + TEXT_BASELINE, true);
        }

        let mut y = top - ROW_HEIGHT;
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                self.text(cell, FONT_SIZE, column_x(i), y + TEXT_BASELINE, false);
            }
            y -= ROW_HEIGHT;
        }

        self.layer.set_outline_thickness(1.0);
        let width = COLUMN_WIDTH * headers.len() as f32;
        let bottom = y + ROW_HEIGHT;

        // Row separators including the header row, then column separators
        let grid_top = top + ROW_HEIGHT;
        for i in 0..=rows.len() + 1 {
            let line_y = grid_top - i as f32 * ROW_HEIGHT;
            self.line((MARGIN, line_y), (MARGIN + width, line_y));
        }
        for i in 0..=headers.len() {
            let x = MARGIN + i as f32 * COLUMN_WIDTH;
            self.line((x, grid_top), (x, bottom));
        }

        bottom
    }

    pub fn signature(&self, y: f32) {
        self.text("Doctor's Signature:", FONT_SIZE, MARGIN, y - 40.0, false);
        self.line((MARGIN, y - 90.0), (MARGIN + 200.0, y - 90.0));
    }

    pub fn finish(self) -> AppResult<Vec<u8>> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }
}
