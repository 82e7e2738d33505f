//! Registration flow: customer verification, OTP check, account creation
//!
//! Identity is pre-provisioned in the CRM; a portal account may only be
//! created once the caller proves control of the registered email via OTP.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};
use tracing::{info, warn};

use portal_security::otp::generate_otp;
use portal_security::password::PasswordService;

use crate::domain::{Customer, NewUser};
use crate::error::DomainError;
use crate::gateways::OtpMailer;
use crate::repositories::{CrmStore, PortalStore};
use crate::services::OTP_VALIDITY_MINUTES;

pub struct RegistrationService {
    crm: Arc<dyn CrmStore>,
    portal: Arc<dyn PortalStore>,
    mailer: Arc<dyn OtpMailer>,
}

impl RegistrationService {
    pub fn new(
        crm: Arc<dyn CrmStore>,
        portal: Arc<dyn PortalStore>,
        mailer: Arc<dyn OtpMailer>,
    ) -> Self {
        Self {
            crm,
            portal,
            mailer,
        }
    }

    /// Confirms the customer exists in the CRM and sends a registration OTP.
    pub async fn verify_user(
        &self,
        customer_number: &str,
        email: &str,
    ) -> Result<(), DomainError> {
        let customer = self.lookup_customer(customer_number, email).await?;

        let otp = generate_otp();
        self.crm
            .store_customer_otp(&customer.customer_no, &otp, Utc::now().naive_utc())
            .await?;

        self.mailer.send_otp(&customer.primary_email, &otp).await?;

        info!("registration OTP issued for customer {}", customer_number);
        Ok(())
    }

    /// Checks the registration OTP without creating anything.
    pub async fn verify_otp(
        &self,
        customer_number: &str,
        email: &str,
        otp: &str,
    ) -> Result<(), DomainError> {
        let customer = self.lookup_customer(customer_number, email).await?;
        validate_customer_otp(&customer, otp, Utc::now().naive_utc())
    }

    /// Creates the portal account once the OTP checks out, then clears the
    /// OTP fields on the customer.
    pub async fn complete_registration(
        &self,
        customer_number: &str,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        let customer = self.lookup_customer(customer_number, email).await?;
        validate_customer_otp(&customer, otp, Utc::now().naive_utc())?;

        if self.portal.find_user_by_email(email).await?.is_some() {
            warn!("registration conflict: user already exists for {}", email);
            return Err(DomainError::Conflict(
                "User already exists. Please log in or use the forgot password option."
                    .to_string(),
            ));
        }

        let password_hash = PasswordService::hash(new_password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = NewUser {
            customer_number: customer_number.to_string(),
            email: email.to_string(),
            phone_number: customer.phone.clone(),
            password: password_hash,
            user_type: "individual".to_string(),
        };
        self.portal.create_user(&user).await?;

        self.crm.clear_customer_otp(&customer.customer_no).await?;

        info!("registration completed for customer {}", customer_number);
        Ok(())
    }

    async fn lookup_customer(
        &self,
        customer_number: &str,
        email: &str,
    ) -> Result<Customer, DomainError> {
        self.crm
            .find_customer(customer_number, email)
            .await?
            .ok_or_else(|| {
                warn!("no CRM customer for number {}", customer_number);
                DomainError::NotFound(
                    "No matching customer found. Please verify your details or contact support."
                        .to_string(),
                )
            })
    }
}

/// OTP equality plus the ten-minute validity window.
pub(crate) fn validate_customer_otp(
    customer: &Customer,
    otp: &str,
    now: NaiveDateTime,
) -> Result<(), DomainError> {
    let (stored, generated_at) = match (&customer.otp, customer.otp_generated_at) {
        (Some(stored), Some(generated_at)) if !stored.is_empty() => (stored, generated_at),
        _ => {
            return Err(DomainError::Unauthenticated(
                "The OTP is missing or not properly set. Please request a new OTP.".to_string(),
            ))
        }
    };

    if otp != stored {
        return Err(DomainError::Unauthenticated(
            "The OTP is incorrect. Please try again or request a new one.".to_string(),
        ));
    }

    if now > generated_at + Duration::minutes(OTP_VALIDITY_MINUTES) {
        return Err(DomainError::Unauthenticated(
            "The OTP has expired. Please request a new OTP.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::gateways::MockOtpMailer;
    use crate::repositories::{MockCrmStore, MockPortalStore};
    use mockall::predicate::eq;

    fn customer_with_otp(otp: &str, generated_at: NaiveDateTime) -> Customer {
        Customer {
            customer_no: "C1001".to_string(),
            customer_name: "Jane Plot".to_string(),
            phone: "254700000001".to_string(),
            primary_email: "a@x".to_string(),
            otp: Some(otp.to_string()),
            otp_generated_at: Some(generated_at),
        }
    }

    #[test]
    fn otp_within_window_is_accepted() {
        let now = Utc::now().naive_utc();
        let customer = customer_with_otp("314159", now - Duration::minutes(5));
        assert!(validate_customer_otp(&customer, "314159", now).is_ok());
    }

    #[test]
    fn wrong_otp_is_rejected() {
        let now = Utc::now().naive_utc();
        let customer = customer_with_otp("314159", now);
        let err = validate_customer_otp(&customer, "000000", now).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn otp_older_than_ten_minutes_is_rejected() {
        let now = Utc::now().naive_utc();
        let customer = customer_with_otp("314159", now - Duration::minutes(11));
        let err = validate_customer_otp(&customer, "314159", now).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn missing_otp_is_rejected() {
        let mut customer = customer_with_otp("314159", Utc::now().naive_utc());
        customer.otp = None;
        let err =
            validate_customer_otp(&customer, "314159", Utc::now().naive_utc()).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn verify_user_stores_and_mails_otp() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_customer()
            .with(eq("C1001"), eq("a@x"))
            .returning(|_, _| Ok(Some(customer_with_otp("", Utc::now().naive_utc()))));
        crm.expect_store_customer_otp()
            .withf(|no, otp, _| no == "C1001" && otp.len() == 6)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let portal = MockPortalStore::new();
        let mut mailer = MockOtpMailer::new();
        mailer
            .expect_send_otp()
            .withf(|email, otp| email == "a@x" && otp.chars().all(|c| c.is_ascii_digit()))
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = RegistrationService::new(Arc::new(crm), Arc::new(portal), Arc::new(mailer));
        svc.verify_user("C1001", "a@x").await.unwrap();
    }

    #[tokio::test]
    async fn verify_user_rejects_unknown_customer() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_customer().returning(|_, _| Ok(None));
        let svc = RegistrationService::new(
            Arc::new(crm),
            Arc::new(MockPortalStore::new()),
            Arc::new(MockOtpMailer::new()),
        );
        let err = svc.verify_user("C9", "x@y").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn complete_registration_creates_user_and_clears_otp() {
        let now = Utc::now().naive_utc();
        let mut crm = MockCrmStore::new();
        crm.expect_find_customer()
            .returning(move |_, _| Ok(Some(customer_with_otp("314159", now))));
        crm.expect_clear_customer_otp()
            .with(eq("C1001"))
            .times(1)
            .returning(|_| Ok(()));
        let mut portal = MockPortalStore::new();
        portal.expect_find_user_by_email().returning(|_| Ok(None));
        portal
            .expect_create_user()
            .withf(|u| {
                u.customer_number == "C1001"
                    && u.email == "a@x"
                    && u.user_type == "individual"
                    && u.password != "pw!"
            })
            .times(1)
            .returning(|u| {
                Ok(User {
                    id: 1,
                    customer_number: u.customer_number.clone(),
                    email: u.email.clone(),
                    phone_number: u.phone_number.clone(),
                    password: u.password.clone(),
                    verified: true,
                    user_type: u.user_type.clone(),
                    push_token: None,
                    last_logout_at: None,
                    created_at: Utc::now(),
                })
            });

        let svc = RegistrationService::new(
            Arc::new(crm),
            Arc::new(portal),
            Arc::new(MockOtpMailer::new()),
        );
        svc.complete_registration("C1001", "a@x", "314159", "pw!")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn complete_registration_with_wrong_otp_creates_nothing() {
        let now = Utc::now().naive_utc();
        let mut crm = MockCrmStore::new();
        crm.expect_find_customer()
            .returning(move |_, _| Ok(Some(customer_with_otp("314159", now))));
        let mut portal = MockPortalStore::new();
        portal.expect_create_user().times(0);

        let svc = RegistrationService::new(
            Arc::new(crm),
            Arc::new(portal),
            Arc::new(MockOtpMailer::new()),
        );
        let err = svc
            .complete_registration("C1001", "a@x", "000000", "pw!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn complete_registration_conflicts_on_existing_user() {
        let now = Utc::now().naive_utc();
        let mut crm = MockCrmStore::new();
        crm.expect_find_customer()
            .returning(move |_, _| Ok(Some(customer_with_otp("314159", now))));
        let mut portal = MockPortalStore::new();
        portal.expect_find_user_by_email().returning(|email| {
            Ok(Some(User {
                id: 1,
                customer_number: "C1001".to_string(),
                email: email.to_string(),
                phone_number: String::new(),
                password: String::new(),
                verified: true,
                user_type: "individual".to_string(),
                push_token: None,
                last_logout_at: None,
                created_at: Utc::now(),
            }))
        });

        let svc = RegistrationService::new(
            Arc::new(crm),
            Arc::new(portal),
            Arc::new(MockOtpMailer::new()),
        );
        let err = svc
            .complete_registration("C1001", "a@x", "314159", "pw!")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
