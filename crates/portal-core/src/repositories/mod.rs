//! Store traits: typed access to the three logical databases
//!
//! Portal is app-owned, CRM is read-mostly (OTP fields and installment
//! balances are the only writes), Ledger is read-only.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::{
    Campaign, Customer, InstallmentSchedule, LeadFile, MpesaPayment, NewMpesaPayment, NewReferral,
    NewUser, Notification, PasswordReset, PaymentStatus, Project, Receipt, Referral, User,
};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PortalStore: Send + Sync {
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, DomainError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn find_user_by_customer_number(
        &self,
        customer_number: &str,
    ) -> Result<Option<User>, DomainError>;
    async fn create_user(&self, user: &NewUser) -> Result<User, DomainError>;
    async fn update_user_password(&self, user_id: u64, password_hash: &str)
        -> Result<(), DomainError>;
    async fn update_last_logout(
        &self,
        user_id: u64,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    async fn update_push_token(&self, user_id: u64, push_token: &str) -> Result<(), DomainError>;

    async fn create_password_reset(
        &self,
        user_id: u64,
        otp: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
    async fn latest_password_reset(
        &self,
        user_id: u64,
    ) -> Result<Option<PasswordReset>, DomainError>;
    async fn delete_password_reset(&self, id: u64) -> Result<(), DomainError>;

    async fn create_mpesa_payment(
        &self,
        payment: &NewMpesaPayment,
    ) -> Result<MpesaPayment, DomainError>;
    async fn find_mpesa_payment(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<MpesaPayment>, DomainError>;
    /// Conditional transition out of Pending. Returns true only for the one
    /// caller whose update actually flipped the row; duplicate callbacks see
    /// false and must not touch the installment.
    async fn mark_payment_if_pending(
        &self,
        checkout_request_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, DomainError>;
    /// Compensation for a failed reconciliation: put the row back so a later
    /// sweep or duplicate callback can reapply it.
    async fn reset_payment_to_pending(
        &self,
        checkout_request_id: &str,
    ) -> Result<(), DomainError>;
    async fn successful_payments(
        &self,
        customer_number: &str,
        plot_number: &str,
    ) -> Result<Vec<MpesaPayment>, DomainError>;

    async fn create_notification(
        &self,
        user_id: u64,
        title: &str,
        body: &str,
        data: &str,
    ) -> Result<(), DomainError>;
    async fn notifications_for_user(&self, user_id: u64)
        -> Result<Vec<Notification>, DomainError>;

    async fn create_referral(&self, referral: &NewReferral) -> Result<Referral, DomainError>;
    async fn referrals_for_customer(
        &self,
        customer_number: &str,
    ) -> Result<Vec<Referral>, DomainError>;

    async fn monthly_featured_campaign(
        &self,
        month: i32,
        year: i32,
    ) -> Result<Option<Campaign>, DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmStore: Send + Sync {
    async fn find_customer(
        &self,
        customer_no: &str,
        primary_email: &str,
    ) -> Result<Option<Customer>, DomainError>;
    async fn find_customer_by_number(
        &self,
        customer_no: &str,
    ) -> Result<Option<Customer>, DomainError>;
    async fn store_customer_otp(
        &self,
        customer_no: &str,
        otp: &str,
        generated_at: NaiveDateTime,
    ) -> Result<(), DomainError>;
    async fn clear_customer_otp(&self, customer_no: &str) -> Result<(), DomainError>;

    async fn active_lead_files(
        &self,
        customer_number: &str,
    ) -> Result<Vec<LeadFile>, DomainError>;
    async fn find_active_lead_file(
        &self,
        lead_file_no: &str,
        customer_number: &str,
    ) -> Result<Option<LeadFile>, DomainError>;

    async fn installment_schedules(
        &self,
        member_no: &str,
        leadfile_no: &str,
    ) -> Result<Vec<InstallmentSchedule>, DomainError>;
    async fn find_installment_schedule(
        &self,
        is_id: i32,
    ) -> Result<Option<InstallmentSchedule>, DomainError>;
    async fn update_installment_balance(
        &self,
        is_id: i32,
        amount_paid: &str,
        remaining_amount: &str,
        paid: &str,
    ) -> Result<(), DomainError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn posted_receipts(
        &self,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Vec<Receipt>, DomainError>;
    async fn posted_installment_receipts(
        &self,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Vec<Receipt>, DomainError>;
    async fn find_posted_receipt(
        &self,
        receipt_id: i32,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Option<Receipt>, DomainError>;
    async fn posted_receipts_for_lead_files(
        &self,
        customer_id: &str,
        lead_file_nos: &[String],
    ) -> Result<Vec<Receipt>, DomainError>;
    async fn projects_by_epr_ids(
        &self,
        epr_ids: &[String],
    ) -> Result<Vec<Project>, DomainError>;
}
