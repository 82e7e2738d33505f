//! Domain entities
//!
//! CRM and Ledger entities keep their upstream column names (including the
//! odd casing); those schemas are mastered elsewhere and read/written as-is.

mod campaign;
mod customer;
mod installment_schedule;
mod lead_file;
mod notification;
mod password_reset;
mod payment;
mod project;
mod receipt;
mod referral;
mod user;

pub use campaign::Campaign;
pub use customer::Customer;
pub use installment_schedule::InstallmentSchedule;
pub use lead_file::LeadFile;
pub use notification::Notification;
pub use password_reset::PasswordReset;
pub use payment::{MpesaPayment, NewMpesaPayment, PaymentStatus};
pub use project::Project;
pub use receipt::Receipt;
pub use referral::{NewReferral, Referral};
pub use user::{NewUser, User};
