//! MySQL CRM store
//!
//! The CRM schema is mastered elsewhere; column names (including casing) are
//! used exactly as they exist upstream. Writes are limited to the customer
//! OTP fields and the installment balance columns.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::MySqlPool;
use tracing::{error, info};

use portal_core::domain::{Customer, InstallmentSchedule, LeadFile};
use portal_core::error::DomainError;
use portal_core::repositories::CrmStore;

const CUSTOMER_COLUMNS: &str =
    "customer_no, customer_name, phone, primary_email, otp, otp_generated_at";

const LEAD_FILE_COLUMNS: &str = "lead_file_no, lead_file_status_dropped, plot_number, \
                                 project_number, customer_id, customer_name, purchase_price, \
                                 selling_price, total_paid, no_of_installments, \
                                 installment_amount, title_status, Booking_date";

const SCHEDULE_COLUMNS: &str = "IS_id, member_no, leadfile_no, installment_no, \
                                installment_amount, remaining_Amount, due_date, paid, \
                                plot_No, plot_Name, amount_Paid, penalties_accrued";

pub struct MySqlCrmStore {
    pool: MySqlPool,
}

impl MySqlCrmStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for MySqlCrmStore {
    async fn find_customer(
        &self,
        customer_no: &str,
        primary_email: &str,
    ) -> Result<Option<Customer>, DomainError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer \
             WHERE customer_no = ? AND primary_email = ?"
        ))
        .bind(customer_no)
        .bind(primary_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding customer: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_customer_by_number(
        &self,
        customer_no: &str,
    ) -> Result<Option<Customer>, DomainError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE customer_no = ?"
        ))
        .bind(customer_no)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding customer by number: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn store_customer_otp(
        &self,
        customer_no: &str,
        otp: &str,
        generated_at: NaiveDateTime,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE customer SET otp = ?, otp_generated_at = ? WHERE customer_no = ?")
            .bind(otp)
            .bind(generated_at)
            .bind(customer_no)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error storing customer OTP: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn clear_customer_otp(&self, customer_no: &str) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE customer SET otp = NULL, otp_generated_at = NULL WHERE customer_no = ?",
        )
        .bind(customer_no)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error clearing customer OTP: {}", e);
            DomainError::Database(e.to_string())
        })?;
        Ok(())
    }

    async fn active_lead_files(
        &self,
        customer_number: &str,
    ) -> Result<Vec<LeadFile>, DomainError> {
        sqlx::query_as::<_, LeadFile>(&format!(
            "SELECT {LEAD_FILE_COLUMNS} FROM lead_files \
             WHERE customer_id = ? AND lead_file_status_dropped = 'No'"
        ))
        .bind(customer_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing lead files: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_active_lead_file(
        &self,
        lead_file_no: &str,
        customer_number: &str,
    ) -> Result<Option<LeadFile>, DomainError> {
        sqlx::query_as::<_, LeadFile>(&format!(
            "SELECT {LEAD_FILE_COLUMNS} FROM lead_files \
             WHERE lead_file_no = ? AND customer_id = ? AND lead_file_status_dropped = 'No'"
        ))
        .bind(lead_file_no)
        .bind(customer_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding lead file: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn installment_schedules(
        &self,
        member_no: &str,
        leadfile_no: &str,
    ) -> Result<Vec<InstallmentSchedule>, DomainError> {
        sqlx::query_as::<_, InstallmentSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM installment_schedule \
             WHERE member_no = ? AND leadfile_no = ? ORDER BY due_date ASC"
        ))
        .bind(member_no)
        .bind(leadfile_no)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing installment schedules: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_installment_schedule(
        &self,
        is_id: i32,
    ) -> Result<Option<InstallmentSchedule>, DomainError> {
        sqlx::query_as::<_, InstallmentSchedule>(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM installment_schedule WHERE IS_id = ?"
        ))
        .bind(is_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding installment schedule: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn update_installment_balance(
        &self,
        is_id: i32,
        amount_paid: &str,
        remaining_amount: &str,
        paid: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE installment_schedule \
             SET amount_Paid = ?, remaining_Amount = ?, paid = ? \
             WHERE IS_id = ?",
        )
        .bind(amount_paid)
        .bind(remaining_amount)
        .bind(paid)
        .bind(is_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating installment balance: {}", e);
            DomainError::Database(e.to_string())
        })?;

        info!(
            "installment schedule {} updated: paid={} remaining={}",
            is_id, amount_paid, remaining_amount
        );
        Ok(())
    }
}
