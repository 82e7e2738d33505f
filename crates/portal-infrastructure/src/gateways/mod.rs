//! Outbound gateway clients (Daraja, Expo push, SMTP)

pub mod daraja;
pub mod expo;
pub mod smtp;

pub use daraja::DarajaClient;
pub use expo::ExpoPushClient;
pub use smtp::SmtpOtpMailer;
