//! Ledger receipt (read-only, posted payments)

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Receipt {
    pub id: i32,
    #[sqlx(rename = "Receipt_No")]
    pub receipt_no: String,
    #[sqlx(rename = "Date_Posted")]
    pub date_posted: String,
    #[sqlx(rename = "Customer_Id")]
    pub customer_id: String,
    #[sqlx(rename = "Customer_Name")]
    pub customer_name: String,
    #[sqlx(rename = "Lead_file_no")]
    pub lead_file_no: String,
    #[sqlx(rename = "Plot_NO")]
    pub plot_no: String,
    #[sqlx(rename = "Project_Name")]
    pub project_name: String,
    #[sqlx(rename = "Transaction_type")]
    pub transaction_type: String,
    #[sqlx(rename = "Amount_LCY")]
    pub amount_lcy: f64,
    #[sqlx(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: String,
    #[sqlx(rename = "PAYMENT_DATE1")]
    pub payment_date1: String,
}
