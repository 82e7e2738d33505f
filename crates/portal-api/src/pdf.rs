//! PDF statement rendering
//!
//! Statements are rendered straight from the queried rows: no clock reads,
//! no randomness, so the same rows always produce byte-identical output.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use portal_core::domain::{InstallmentSchedule, LeadFile, Receipt, User};
use portal_shared::decimal::{format_amount_grouped, parse_amount};

use crate::error::ApiError;

// A4 portrait, in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 43.0;
const BODY_FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 16.0;

const COMPANY_NAME: &str = "Optiven Limited";

/// Accumulates text and rules page by page; a page break re-draws the
/// company header.
struct StatementBuilder {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl StatementBuilder {
    fn new() -> Self {
        let mut builder = Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        };
        builder.page_header();
        builder
    }

    fn page_header(&mut self) {
        self.y = PAGE_HEIGHT - MARGIN - 20.0;
        let x = PAGE_WIDTH / 2.0 - COMPANY_NAME.len() as f32 * 5.0;
        self.text("F2", 20.0, x, self.y, COMPANY_NAME);
        self.y -= 30.0;
    }

    fn break_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.page_header();
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN {
            self.break_page();
        }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, value: &str) {
        self.current.push(Operation::new("BT", vec![]));
        self.current
            .push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.current
            .push(Operation::new("Td", vec![x.into(), y.into()]));
        self.current
            .push(Operation::new("Tj", vec![Object::string_literal(value)]));
        self.current.push(Operation::new("ET", vec![]));
    }

    fn rule(&mut self, y: f32) {
        self.current.push(Operation::new("w", vec![0.5_f32.into()]));
        self.current
            .push(Operation::new("m", vec![MARGIN.into(), y.into()]));
        self.current.push(Operation::new(
            "l",
            vec![(PAGE_WIDTH - MARGIN).into(), y.into()],
        ));
        self.current.push(Operation::new("S", vec![]));
    }

    fn title(&mut self, value: &str) {
        let x = PAGE_WIDTH / 2.0 - value.len() as f32 * 4.0;
        self.text("F2", 16.0, x, self.y, value);
        self.y -= 24.0;
    }

    fn detail_line(&mut self, value: &str) {
        self.ensure_room(LINE_HEIGHT);
        self.text("F1", 12.0, MARGIN, self.y, value);
        self.y -= LINE_HEIGHT;
    }

    fn table_header(&mut self, columns: &[(f32, &str)]) {
        self.ensure_room(LINE_HEIGHT * 2.0);
        for (x, label) in columns {
            self.text("F2", BODY_FONT_SIZE, *x, self.y, label);
        }
        self.rule(self.y - 4.0);
        self.y -= LINE_HEIGHT;
    }

    fn table_row(&mut self, columns: &[(f32, &str)], cells: &[String]) {
        self.ensure_room(LINE_HEIGHT);
        for ((x, _), cell) in columns.iter().zip(cells) {
            self.text("F1", BODY_FONT_SIZE, *x, self.y, cell);
        }
        self.y -= LINE_HEIGHT;
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    fn finish(mut self) -> Result<Vec<u8>, ApiError> {
        self.pages.push(std::mem::take(&mut self.current));

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        let page_count = self.pages.len();
        for operations in self.pages {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| ApiError::Internal(format!("failed to encode PDF content: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| ApiError::Internal(format!("failed to write PDF: {}", e)))?;
        Ok(bytes)
    }
}

const SCHEDULE_COLUMNS: [(f32, &str); 7] = [
    (MARGIN, "No."),
    (MARGIN + 30.0, "Due Date"),
    (MARGIN + 105.0, "Installment"),
    (MARGIN + 185.0, "Amount Paid"),
    (MARGIN + 265.0, "Remaining"),
    (MARGIN + 345.0, "Penalties"),
    (MARGIN + 425.0, "Paid"),
];

/// Tabular payment schedule for one lead file.
pub fn installment_schedule_statement(
    user: &User,
    lead_file: &LeadFile,
    schedules: &[InstallmentSchedule],
) -> Result<Vec<u8>, ApiError> {
    let mut builder = StatementBuilder::new();

    builder.title("Payment Schedule");
    builder.detail_line(&format!("Customer Number: {}", user.customer_number));
    builder.detail_line(&format!("Property: {}", lead_file.plot_number));
    builder.detail_line(&format!("Lead File: {}", lead_file.lead_file_no));
    builder.gap(10.0);

    builder.table_header(&SCHEDULE_COLUMNS);
    for schedule in schedules {
        let due_date = schedule
            .due_date
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_else(|| "-".to_string());
        let cells = [
            schedule.installment_no.to_string(),
            due_date,
            format_amount_grouped(parse_amount(&schedule.installment_amount)),
            format_amount_grouped(parse_amount(&schedule.amount_paid)),
            format_amount_grouped(parse_amount(&schedule.remaining_amount)),
            format_amount_grouped(schedule.penalties_accrued as f64),
            schedule.paid.clone(),
        ];
        builder.table_row(&SCHEDULE_COLUMNS, &cells);
    }

    let total_remaining: f64 = schedules
        .iter()
        .map(|s| parse_amount(&s.remaining_amount))
        .sum();
    builder.gap(10.0);
    builder.detail_line(&format!(
        "Total Outstanding: KES {}",
        format_amount_grouped(total_remaining)
    ));

    builder.finish()
}

/// Single-receipt statement.
pub fn receipt_statement(lead_file: &LeadFile, receipt: &Receipt) -> Result<Vec<u8>, ApiError> {
    let mut builder = StatementBuilder::new();

    builder.title("Receipt");
    builder.detail_line(&format!("Receipt No: {}", receipt.receipt_no));
    builder.detail_line(&format!("Date: {}", receipt.date_posted));
    builder.detail_line(&format!("Customer: {}", receipt.customer_name));
    builder.detail_line(&format!("Customer Number: {}", receipt.customer_id));
    builder.detail_line(&format!("Project: {}", receipt.project_name));
    builder.detail_line(&format!("Plot: {}", lead_file.plot_number));
    builder.detail_line(&format!("Transaction Type: {}", receipt.transaction_type));
    builder.gap(10.0);
    builder.detail_line(&format!(
        "Amount: KES {}",
        format_amount_grouped(receipt.amount_lcy)
    ));

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 1,
            customer_number: "C1001".to_string(),
            email: "a@x".to_string(),
            phone_number: String::new(),
            password: String::new(),
            verified: true,
            user_type: "individual".to_string(),
            push_token: None,
            last_logout_at: None,
            created_at: Utc::now(),
        }
    }

    fn lead_file() -> LeadFile {
        LeadFile {
            lead_file_no: "LF-9".to_string(),
            lead_file_status_dropped: "No".to_string(),
            plot_number: "PLT-17".to_string(),
            project_number: "EPR-2".to_string(),
            customer_id: "C1001".to_string(),
            customer_name: "Jane Plot".to_string(),
            purchase_price: 500000.0,
            selling_price: "500,000.00".to_string(),
            total_paid: 100000.0,
            no_of_installments: "10".to_string(),
            installment_amount: "50,000.00".to_string(),
            title_status: "Processing".to_string(),
            booking_date: None,
        }
    }

    fn schedule(no: i32) -> InstallmentSchedule {
        InstallmentSchedule {
            is_id: no,
            member_no: "C1001".to_string(),
            leadfile_no: "LF-9".to_string(),
            installment_no: no,
            installment_amount: "50,000.00".to_string(),
            remaining_amount: "25,000.00".to_string(),
            due_date: None,
            paid: "No".to_string(),
            plot_no: "PLT-17".to_string(),
            plot_name: "Acacia Gardens".to_string(),
            amount_paid: "25,000.00".to_string(),
            penalties_accrued: 0,
        }
    }

    fn receipt() -> Receipt {
        Receipt {
            id: 11,
            receipt_no: "R-11".to_string(),
            date_posted: "2024-03-01".to_string(),
            customer_id: "C1001".to_string(),
            customer_name: "Jane Plot".to_string(),
            lead_file_no: "LF-9".to_string(),
            plot_no: "PLT-17".to_string(),
            project_name: "Acacia Gardens".to_string(),
            transaction_type: "Installment".to_string(),
            amount_lcy: 50000.0,
            kind: "Posted".to_string(),
            payment_date1: "2024-03-01 09:30:00".to_string(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn schedule_statement_is_a_pdf_with_the_rows() {
        let schedules: Vec<_> = (1..=3).map(schedule).collect();
        let bytes =
            installment_schedule_statement(&user(), &lead_file(), &schedules).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"Optiven Limited"));
        assert!(contains(&bytes, b"PLT-17"));
        assert!(contains(&bytes, b"50,000.00"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let schedules: Vec<_> = (1..=5).map(schedule).collect();
        let a = installment_schedule_statement(&user(), &lead_file(), &schedules).unwrap();
        let b = installment_schedule_statement(&user(), &lead_file(), &schedules).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn long_schedules_paginate() {
        let schedules: Vec<_> = (1..=80).map(schedule).collect();
        let bytes =
            installment_schedule_statement(&user(), &lead_file(), &schedules).unwrap();
        // More rows than fit one A4 page: the page tree must have grown.
        assert!(contains(&bytes, b"/Count 3") || contains(&bytes, b"/Count 2"));
    }

    #[test]
    fn receipt_statement_carries_the_amount() {
        let bytes = receipt_statement(&lead_file(), &receipt()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, b"R-11"));
        assert!(contains(&bytes, b"50,000.00"));
    }

    #[test]
    fn empty_schedule_still_renders() {
        let bytes = installment_schedule_statement(&user(), &lead_file(), &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
