//! CRM lead file (a customer's purchase of one plot)

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeadFile {
    pub lead_file_no: String,
    pub lead_file_status_dropped: String,
    pub plot_number: String,
    pub project_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub purchase_price: f64,
    pub selling_price: String,
    pub total_paid: f64,
    pub no_of_installments: String,
    pub installment_amount: String,
    pub title_status: String,
    #[sqlx(rename = "Booking_date")]
    pub booking_date: Option<NaiveDateTime>,
}

impl LeadFile {
    pub fn is_dropped(&self) -> bool {
        self.lead_file_status_dropped != "No"
    }
}
