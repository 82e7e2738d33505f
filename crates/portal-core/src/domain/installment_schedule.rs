//! CRM installment schedule row
//!
//! Balance columns are decimal strings, possibly with thousands separators.
//! The payment core owns the invariant
//! `amount_paid + remaining_amount = installment_amount` (within one unit)
//! and `paid = "Yes"` exactly when nothing remains.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InstallmentSchedule {
    #[sqlx(rename = "IS_id")]
    pub is_id: i32,
    pub member_no: String,
    pub leadfile_no: String,
    pub installment_no: i32,
    pub installment_amount: String,
    #[sqlx(rename = "remaining_Amount")]
    pub remaining_amount: String,
    pub due_date: Option<NaiveDateTime>,
    pub paid: String,
    #[sqlx(rename = "plot_No")]
    pub plot_no: String,
    #[sqlx(rename = "plot_Name")]
    pub plot_name: String,
    #[sqlx(rename = "amount_Paid")]
    pub amount_paid: String,
    pub penalties_accrued: i32,
}
