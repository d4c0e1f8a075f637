//! Invoice rendering: the PDF attachment and the HTML email body.

use crate::{
    entities::{billing, customer},
    errors::ServiceError,
};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use rust_decimal::Decimal;
use std::{borrow::Cow, fmt};
use tracing::error;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 8.0;
const QUANTITY_COLUMN_MM: f32 = MARGIN_MM + 100.0;
const SUBTOTAL_COLUMN_MM: f32 = MARGIN_MM + 130.0;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Line of the rendered invoice.
#[derive(Debug, Clone)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Two decimals with thousands separators, e.g. `1,234.50`.
pub fn format_amount(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Number, date and bill-to block printed above the line items.
pub fn invoice_header_lines(billing: &billing::Model, customer: &customer::Model) -> [String; 4] {
    [
        format!("Invoice Number: {}", billing.invoice_number),
        format!(
            "Invoice Date: {}",
            billing.billed_date.format("%Y-%m-%d %H:%M UTC")
        ),
        format!("Bill To: {}", customer.name),
        format!("Email: {}", customer.email),
    ]
}

fn pdf_error<E: fmt::Debug>(err: E) -> ServiceError {
    error!(error = ?err, "Invoice PDF rendering failed");
    ServiceError::InternalError(format!("Failed to render invoice PDF: {:?}", err))
}

/// A4 invoice: header block, one row per line item, then the total. Rows
/// continue on a new page when the current one is full.
pub fn render_invoice_pdf(
    billing: &billing::Model,
    customer: &customer::Model,
    lines: &[InvoiceLine],
) -> Result<Vec<u8>, ServiceError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {}", billing.invoice_number),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Invoice",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut layer = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT_MM - MARGIN_MM;

    layer.use_text("Invoice", TITLE_SIZE, Mm(MARGIN_MM), Mm(y), &bold);
    y -= LINE_HEIGHT_MM + 2.0;

    let [number, date, bill_to, email] = invoice_header_lines(billing, customer);
    for (text, gap_after) in [(number, 0.0), (date, 4.0), (bill_to, 0.0), (email, 6.0)] {
        layer.use_text(text, BODY_SIZE, Mm(MARGIN_MM), Mm(y), &regular);
        y -= LINE_HEIGHT_MM + gap_after;
    }

    let columns = [
        ("Item", MARGIN_MM),
        ("Quantity", QUANTITY_COLUMN_MM),
        ("Subtotal", SUBTOTAL_COLUMN_MM),
    ];
    for (heading, x) in columns {
        layer.use_text(heading, BODY_SIZE, Mm(x), Mm(y), &bold);
    }
    y -= LINE_HEIGHT_MM;

    for line in lines {
        if y < MARGIN_MM + LINE_HEIGHT_MM {
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Invoice");
            layer = doc.get_page(next_page).get_layer(next_layer);
            y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
        layer.use_text(line.name.as_str(), BODY_SIZE, Mm(MARGIN_MM), Mm(y), &regular);
        layer.use_text(
            line.quantity.to_string(),
            BODY_SIZE,
            Mm(QUANTITY_COLUMN_MM),
            Mm(y),
            &regular,
        );
        layer.use_text(
            format_amount(line.subtotal),
            BODY_SIZE,
            Mm(SUBTOTAL_COLUMN_MM),
            Mm(y),
            &regular,
        );
        y -= LINE_HEIGHT_MM;
    }

    if y < MARGIN_MM + 2.0 * LINE_HEIGHT_MM {
        let (next_page, next_layer) =
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Invoice");
        layer = doc.get_page(next_page).get_layer(next_layer);
        y = PAGE_HEIGHT_MM - MARGIN_MM;
    } else {
        y -= 6.0;
    }
    layer.use_text("Total", BODY_SIZE, Mm(MARGIN_MM), Mm(y), &bold);
    layer.use_text(
        format_amount(billing.amount),
        BODY_SIZE,
        Mm(SUBTOTAL_COLUMN_MM),
        Mm(y),
        &bold,
    );

    doc.save_to_bytes().map_err(pdf_error)
}

/// Short HTML message used as the email body.
pub fn render_invoice_email_body(billing: &billing::Model, customer: &customer::Model) -> String {
    let name = customer.name.trim();
    let greeting: Cow<'_, str> = if name.is_empty() {
        "valued customer".into()
    } else {
        html_escape::encode_text(name)
    };
    format!(
        "<p>Dear {},</p>\
<p>Thank you for your order. Please find your invoice <strong>{}</strong> attached.</p>\
<p><strong>Amount Due:</strong> {}</p>\
<p>Please settle the payment at your earliest convenience.</p>\
<p>Best regards,<br/>MTO Billing Team</p>",
        greeting,
        html_escape::encode_text(&billing.invoice_number),
        format_amount(billing.amount)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::customer::CustomerRole;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn billing() -> billing::Model {
        billing::Model {
            id: 1,
            sales_order_id: 7,
            invoice_number: "INV-2025-0042".into(),
            amount: dec!(1234.5),
            billed_date: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    fn customer() -> customer::Model {
        let now = Utc::now();
        customer::Model {
            id: 3,
            name: "Dept. of <Physics>".into(),
            email: "physics@example.edu".into(),
            role: CustomerRole::Department,
            phone: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn lines(count: usize) -> Vec<InvoiceLine> {
        (0..count)
            .map(|i| InvoiceLine {
                name: format!("Lab Coat size {}", i),
                quantity: 2,
                subtotal: dec!(61.7),
            })
            .collect()
    }

    #[test]
    fn amounts_are_grouped_with_two_decimals() {
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(12.5)), "12.50");
        assert_eq!(format_amount(dec!(1234.5)), "1,234.50");
        assert_eq!(format_amount(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_amount(dec!(-950)), "-950.00");
    }

    #[test]
    fn header_names_invoice_and_customer() {
        let header = invoice_header_lines(&billing(), &customer());
        assert_eq!(header[0], "Invoice Number: INV-2025-0042");
        assert_eq!(header[1], "Invoice Date: 2025-03-14 09:30 UTC");
        assert_eq!(header[2], "Bill To: Dept. of <Physics>");
        assert_eq!(header[3], "Email: physics@example.edu");
    }

    #[test]
    fn renders_a_pdf_document() {
        let pdf = render_invoice_pdf(&billing(), &customer(), &lines(2)).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(pdf.windows(5).any(|w| w == b"%%EOF"));
    }

    #[test]
    fn long_invoices_spill_onto_more_pages() {
        let short = render_invoice_pdf(&billing(), &customer(), &lines(1)).unwrap();
        let long = render_invoice_pdf(&billing(), &customer(), &lines(90)).unwrap();
        assert!(long.starts_with(b"%PDF-"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn email_body_mentions_invoice_and_amount() {
        let body = render_invoice_email_body(&billing(), &customer());
        assert!(body.starts_with("<p>Dear Dept. of &lt;Physics&gt;,</p>"));
        assert!(body.contains("<strong>INV-2025-0042</strong>"));
        assert!(body.contains("1,234.50"));
    }
}
