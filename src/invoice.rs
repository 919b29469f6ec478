//! Fixed-layout plain-text invoice.
//!
//! Rendering is a pure function of [`InvoiceData`]; the invoice number is
//! derived from the enrollment itself so repeated renders are byte-identical.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

const WIDTH: usize = 56;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct InvoiceData {
    pub institute_name: String,
    pub enrollment_id: Uuid,
    pub student_name: String,
    pub course_title: String,
    #[schema(value_type = String)]
    pub amount_paid: Decimal,
    pub currency: String,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub enrollment_date: DateTime<Utc>,
}

impl InvoiceData {
    pub fn invoice_number(&self) -> String {
        build_invoice_number(self.enrollment_id, self.enrollment_date)
    }

    pub fn file_name(&self) -> String {
        format!("{}.txt", self.invoice_number())
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(WIDTH);
        let thin = "-".repeat(WIDTH);
        let mut out = String::new();

        out.push_str(&rule);
        out.push('\n');
        out.push_str(&center(&self.institute_name));
        out.push_str(&center("INVOICE"));
        out.push_str(&rule);
        out.push('\n');

        push_row(&mut out, "Invoice No", &self.invoice_number());
        push_row(
            &mut out,
            "Date",
            &self.enrollment_date.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        out.push_str(&thin);
        out.push('\n');

        push_row(&mut out, "Student", &self.student_name);
        push_row(&mut out, "Course", &self.course_title);
        push_row(
            &mut out,
            "Amount Paid",
            &format!("{} {:.2}", self.currency, self.amount_paid),
        );
        push_row(&mut out, "Payment ID", self.payment_id.as_deref().unwrap_or("-"));
        push_row(&mut out, "Order ID", self.order_id.as_deref().unwrap_or("-"));
        out.push_str(&thin);
        out.push('\n');
        out.push_str(&center("Thank you for enrolling."));
        out.push_str(&rule);
        out.push('\n');

        out
    }
}

fn push_row(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!("{label:<14}: {value}\n"));
}

fn center(text: &str) -> String {
    format!("{:^width$}\n", text, width = WIDTH)
}

fn build_invoice_number(enrollment_id: Uuid, enrolled_at: DateTime<Utc>) -> String {
    let date = enrolled_at.format("%Y%m%d");
    let suffix = enrollment_id.simple().to_string();
    format!("INV-{}-{}", date, &suffix[..8].to_uppercase())
}
