//! Payment orchestration: STK push initiation and callback reconciliation
//!
//! Initiation writes the correlation row only after the gateway accepts the
//! push, so a 200 to the client guarantees the row exists when the callback
//! lands. The callback endpoint always acknowledges, which makes idempotence
//! this side's problem: the status row transitions out of Pending via a
//! conditional update, and only the caller that actually flipped it touches
//! the installment balance.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use portal_shared::decimal::{format_amount, parse_amount};

use crate::domain::{InstallmentSchedule, MpesaPayment, NewMpesaPayment, PaymentStatus, User};
use crate::error::DomainError;
use crate::gateways::{PaymentGateway, StkPushAck, StkPushOrder};
use crate::repositories::{CrmStore, PortalStore};
use crate::services::NotificationService;

const PAYMENT_UPDATE_TITLE: &str = "Payment Update";
const PAYMENT_FAILED_TITLE: &str = "Payment Failed";

/// Validated initiation input.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentCommand {
    pub amount: u64,
    pub phone_number: String,
    pub installment_schedule_id: i32,
    pub customer_number: String,
    pub plot_number: String,
}

/// Callback envelope as delivered by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
}

pub struct PaymentService {
    portal: Arc<dyn PortalStore>,
    crm: Arc<dyn CrmStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: Arc<NotificationService>,
}

impl PaymentService {
    pub fn new(
        portal: Arc<dyn PortalStore>,
        crm: Arc<dyn CrmStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            portal,
            crm,
            gateway,
            notifications,
        }
    }

    /// Initiate an STK push for an installment owned by `user`.
    pub async fn initiate(
        &self,
        user: &User,
        cmd: &InitiatePaymentCommand,
    ) -> Result<StkPushAck, DomainError> {
        if cmd.amount == 0 {
            return Err(DomainError::Validation("Invalid amount format".to_string()));
        }
        if !is_valid_msisdn(&cmd.phone_number) {
            return Err(DomainError::Validation(
                "Invalid phone number format".to_string(),
            ));
        }
        if cmd.customer_number != user.customer_number {
            return Err(DomainError::Validation(
                "Customer number does not match the authenticated user".to_string(),
            ));
        }

        let installment = self
            .crm
            .find_installment_schedule(cmd.installment_schedule_id)
            .await?
            .ok_or_else(|| {
                DomainError::Validation("Unknown installment schedule".to_string())
            })?;
        if installment.member_no != user.customer_number {
            return Err(DomainError::Validation(
                "Installment schedule does not belong to the authenticated user".to_string(),
            ));
        }

        let order = StkPushOrder {
            amount: cmd.amount,
            phone_number: cmd.phone_number.clone(),
            account_reference: cmd.plot_number.clone(),
            description: "Payment of Installment".to_string(),
        };

        let ack = self.gateway.stk_push(&order).await?;

        let payment = NewMpesaPayment {
            checkout_request_id: ack.checkout_request_id.clone(),
            installment_schedule_id: cmd.installment_schedule_id,
            customer_number: cmd.customer_number.clone(),
            phone_number: cmd.phone_number.clone(),
            amount: cmd.amount.to_string(),
            plot_number: cmd.plot_number.clone(),
        };
        self.portal.create_mpesa_payment(&payment).await?;

        info!(
            "STK push initiated, checkout_request_id={}",
            ack.checkout_request_id
        );
        Ok(ack)
    }

    /// Process a gateway callback. Errors are for the caller's logs only; the
    /// HTTP handler acknowledges 200 no matter what.
    pub async fn handle_callback(&self, callback: &StkCallback) -> Result<(), DomainError> {
        let payment = match self
            .portal
            .find_mpesa_payment(&callback.checkout_request_id)
            .await?
        {
            Some(payment) => payment,
            None => {
                // Unknown correlation ids are benign: sandbox noise, replays
                // of rows initiated elsewhere.
                info!(
                    "callback for unknown checkout_request_id {}, ignoring",
                    callback.checkout_request_id
                );
                return Ok(());
            }
        };

        if callback.result_code == 0 {
            self.apply_success(&payment).await
        } else {
            self.apply_failure(&payment, callback).await
        }
    }

    async fn apply_success(&self, payment: &MpesaPayment) -> Result<(), DomainError> {
        let flipped = self
            .portal
            .mark_payment_if_pending(&payment.checkout_request_id, PaymentStatus::Success)
            .await?;
        if !flipped {
            info!(
                "duplicate success callback for {}, already settled",
                payment.checkout_request_id
            );
            return Ok(());
        }

        let installment = match self
            .crm
            .find_installment_schedule(payment.installment_schedule_id)
            .await
        {
            Ok(Some(installment)) => installment,
            Ok(None) => {
                error!(
                    "installment schedule {} missing for payment {}",
                    payment.installment_schedule_id, payment.checkout_request_id
                );
                self.reset_to_pending(&payment.checkout_request_id).await;
                return Err(DomainError::Internal(
                    "installment schedule missing during reconciliation".to_string(),
                ));
            }
            Err(e) => {
                self.reset_to_pending(&payment.checkout_request_id).await;
                return Err(e);
            }
        };

        let settlement = reconcile(
            parse_amount(&installment.installment_amount),
            parse_amount(&installment.amount_paid),
            parse_amount(&payment.amount),
        );

        if let Err(e) = self
            .crm
            .update_installment_balance(
                installment.is_id,
                &settlement.amount_paid,
                &settlement.remaining_amount,
                settlement.paid_flag,
            )
            .await
        {
            error!(
                "failed to update installment {} for payment {}: {}",
                installment.is_id, payment.checkout_request_id, e
            );
            self.reset_to_pending(&payment.checkout_request_id).await;
            return Err(e);
        }

        info!(
            "payment {} reconciled: paid={} remaining={}",
            payment.checkout_request_id, settlement.amount_paid, settlement.remaining_amount
        );

        let body = settlement_message(payment, &installment, &settlement);
        let data = json!({
            "checkout_request_id": payment.checkout_request_id,
            "plot_number": payment.plot_number,
            "status": PaymentStatus::Success.as_str(),
        })
        .to_string();
        self.notifications
            .notify_customer(&payment.customer_number, PAYMENT_UPDATE_TITLE, &body, &data)
            .await
    }

    async fn apply_failure(
        &self,
        payment: &MpesaPayment,
        callback: &StkCallback,
    ) -> Result<(), DomainError> {
        let flipped = self
            .portal
            .mark_payment_if_pending(&payment.checkout_request_id, PaymentStatus::Failed)
            .await?;
        if !flipped {
            info!(
                "duplicate failure callback for {}, already settled",
                payment.checkout_request_id
            );
            return Ok(());
        }

        warn!(
            "payment {} failed: result_code={} desc={}",
            payment.checkout_request_id, callback.result_code, callback.result_desc
        );

        let data = json!({
            "checkout_request_id": payment.checkout_request_id,
            "plot_number": payment.plot_number,
            "status": PaymentStatus::Failed.as_str(),
        })
        .to_string();
        self.notifications
            .notify_customer(
                &payment.customer_number,
                PAYMENT_FAILED_TITLE,
                "Your M-PESA payment failed or was cancelled.",
                &data,
            )
            .await
    }

    async fn reset_to_pending(&self, checkout_request_id: &str) {
        if let Err(e) = self
            .portal
            .reset_payment_to_pending(checkout_request_id)
            .await
        {
            error!(
                "failed to reset payment {} to pending after reconciliation error: {}",
                checkout_request_id, e
            );
        }
    }
}

/// 2547XXXXXXXX: twelve digits, Kenyan mobile prefix.
pub(crate) fn is_valid_msisdn(phone: &str) -> bool {
    phone.len() == 12 && phone.starts_with("2547") && phone.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, PartialEq)]
pub(crate) struct Settlement {
    pub amount_paid: String,
    pub remaining_amount: String,
    pub paid_flag: &'static str,
    pub remaining: f64,
}

/// Apply a payment to an installment balance. Sub-cent residue counts as
/// settled; overpayment clamps the remainder to zero.
pub(crate) fn reconcile(
    installment_amount: f64,
    current_paid: f64,
    payment_amount: f64,
) -> Settlement {
    let new_paid = current_paid + payment_amount;
    let mut remaining = (installment_amount - new_paid).max(0.0);
    if remaining < 0.005 {
        remaining = 0.0;
    }
    Settlement {
        amount_paid: format_amount(new_paid),
        remaining_amount: format_amount(remaining),
        paid_flag: if remaining == 0.0 { "Yes" } else { "No" },
        remaining,
    }
}

fn settlement_message(
    payment: &MpesaPayment,
    installment: &InstallmentSchedule,
    settlement: &Settlement,
) -> String {
    if settlement.remaining == 0.0 {
        format!(
            "Your M-PESA payment of KES {} was received. Installment {} for plot {} is now fully settled.",
            payment.amount, installment.installment_no, payment.plot_number
        )
    } else {
        format!(
            "Your M-PESA payment of KES {} was received. Remaining balance on installment {} is KES {}.",
            payment.amount, installment.installment_no, settlement.remaining_amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::{MockPaymentGateway, MockPushSender};
    use crate::repositories::{MockCrmStore, MockPortalStore};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn user() -> User {
        User {
            id: 7,
            customer_number: "C1001".to_string(),
            email: "a@x".to_string(),
            phone_number: "254712345678".to_string(),
            password: String::new(),
            verified: true,
            user_type: "individual".to_string(),
            push_token: None,
            last_logout_at: None,
            created_at: Utc::now(),
        }
    }

    fn schedule() -> InstallmentSchedule {
        InstallmentSchedule {
            is_id: 42,
            member_no: "C1001".to_string(),
            leadfile_no: "LF-9".to_string(),
            installment_no: 3,
            installment_amount: "10,000.00".to_string(),
            remaining_amount: "6,000.00".to_string(),
            due_date: None,
            paid: "No".to_string(),
            plot_no: "PLT-17".to_string(),
            plot_name: "Acacia Gardens".to_string(),
            amount_paid: "4,000.00".to_string(),
            penalties_accrued: 0,
        }
    }

    fn pending_payment(amount: &str) -> MpesaPayment {
        MpesaPayment {
            id: 1,
            checkout_request_id: "ws_CO_1".to_string(),
            installment_schedule_id: 42,
            customer_number: "C1001".to_string(),
            phone_number: "254712345678".to_string(),
            amount: amount.to_string(),
            plot_number: "PLT-17".to_string(),
            status: "Pending".to_string(),
            created_at: Utc::now(),
        }
    }

    fn callback(result_code: i64) -> StkCallback {
        StkCallback {
            merchant_request_id: "m-1".to_string(),
            checkout_request_id: "ws_CO_1".to_string(),
            result_code,
            result_desc: String::new(),
        }
    }

    fn cmd() -> InitiatePaymentCommand {
        InitiatePaymentCommand {
            amount: 6000,
            phone_number: "254712345678".to_string(),
            installment_schedule_id: 42,
            customer_number: "C1001".to_string(),
            plot_number: "PLT-17".to_string(),
        }
    }

    fn ack() -> StkPushAck {
        StkPushAck {
            merchant_request_id: "m-1".to_string(),
            checkout_request_id: "ws_CO_1".to_string(),
            response_code: "0".to_string(),
            response_description: "Success. Request accepted for processing".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        }
    }

    /// Notification service whose store expects exactly `records` rows with
    /// the given title, for a user without a push token.
    fn notifications(records: usize, title: &'static str) -> Arc<NotificationService> {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_user_by_customer_number()
            .returning(|_| Ok(Some(user())));
        portal
            .expect_create_notification()
            .withf(move |user_id, got_title, _, _| *user_id == 7 && got_title == title)
            .times(records)
            .returning(|_, _, _, _| Ok(()));
        Arc::new(NotificationService::new(
            Arc::new(portal),
            Arc::new(MockPushSender::new()),
        ))
    }

    fn silent_notifications() -> Arc<NotificationService> {
        let mut portal = MockPortalStore::new();
        portal.expect_find_user_by_customer_number().times(0);
        Arc::new(NotificationService::new(
            Arc::new(portal),
            Arc::new(MockPushSender::new()),
        ))
    }

    #[tokio::test]
    async fn initiate_persists_row_after_gateway_accepts() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule()
            .with(eq(42))
            .returning(|_| Ok(Some(schedule())));
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_stk_push()
            .withf(|order| {
                order.amount == 6000
                    && order.account_reference == "PLT-17"
                    && order.phone_number == "254712345678"
            })
            .times(1)
            .returning(|_| Ok(ack()));
        let mut portal = MockPortalStore::new();
        portal
            .expect_create_mpesa_payment()
            .withf(|p| {
                p.checkout_request_id == "ws_CO_1" && p.amount == "6000" && p.customer_number == "C1001"
            })
            .times(1)
            .returning(|p| {
                Ok(MpesaPayment {
                    id: 1,
                    checkout_request_id: p.checkout_request_id.clone(),
                    installment_schedule_id: p.installment_schedule_id,
                    customer_number: p.customer_number.clone(),
                    phone_number: p.phone_number.clone(),
                    amount: p.amount.clone(),
                    plot_number: p.plot_number.clone(),
                    status: "Pending".to_string(),
                    created_at: Utc::now(),
                })
            });

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(gateway),
            silent_notifications(),
        );
        let ack = svc.initiate(&user(), &cmd()).await.unwrap();
        assert_eq!(ack.checkout_request_id, "ws_CO_1");
    }

    #[tokio::test]
    async fn initiate_rejects_bad_phone_before_touching_gateway() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_stk_push().times(0);

        let svc = PaymentService::new(
            Arc::new(MockPortalStore::new()),
            Arc::new(MockCrmStore::new()),
            Arc::new(gateway),
            silent_notifications(),
        );

        for phone in ["0712345678", "25471234567", "2547123456789", "2541234567ab", "254812345678"] {
            let mut bad = cmd();
            bad.phone_number = phone.to_string();
            let err = svc.initiate(&user(), &bad).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{}", phone);
        }
    }

    #[tokio::test]
    async fn initiate_rejects_zero_amount() {
        let svc = PaymentService::new(
            Arc::new(MockPortalStore::new()),
            Arc::new(MockCrmStore::new()),
            Arc::new(MockPaymentGateway::new()),
            silent_notifications(),
        );
        let mut bad = cmd();
        bad.amount = 0;
        assert!(matches!(
            svc.initiate(&user(), &bad).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn initiate_rejects_foreign_installment() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule().returning(|_| {
            let mut s = schedule();
            s.member_no = "C2002".to_string();
            Ok(Some(s))
        });
        let svc = PaymentService::new(
            Arc::new(MockPortalStore::new()),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            silent_notifications(),
        );
        assert!(matches!(
            svc.initiate(&user(), &cmd()).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn gateway_rejection_leaves_no_row() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule()
            .returning(|_| Ok(Some(schedule())));
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_stk_push()
            .returning(|_| Err(DomainError::Upstream("Invalid Access Token".to_string())));
        let mut portal = MockPortalStore::new();
        portal.expect_create_mpesa_payment().times(0);

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(gateway),
            silent_notifications(),
        );
        assert!(matches!(
            svc.initiate(&user(), &cmd()).await.unwrap_err(),
            DomainError::Upstream(_)
        ));
    }

    #[tokio::test]
    async fn success_callback_reconciles_balance() {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_mpesa_payment()
            .with(eq("ws_CO_1"))
            .returning(|_| Ok(Some(pending_payment("6000"))));
        portal
            .expect_mark_payment_if_pending()
            .with(eq("ws_CO_1"), eq(PaymentStatus::Success))
            .times(1)
            .returning(|_, _| Ok(true));
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule()
            .with(eq(42))
            .returning(|_| Ok(Some(schedule())));
        crm.expect_update_installment_balance()
            .with(eq(42), eq("10000.00"), eq("0.00"), eq("Yes"))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            notifications(1, PAYMENT_UPDATE_TITLE),
        );
        svc.handle_callback(&callback(0)).await.unwrap();
    }

    #[tokio::test]
    async fn partial_payment_leaves_installment_open() {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_mpesa_payment()
            .returning(|_| Ok(Some(pending_payment("2500"))));
        portal
            .expect_mark_payment_if_pending()
            .returning(|_, _| Ok(true));
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule()
            .returning(|_| Ok(Some(schedule())));
        crm.expect_update_installment_balance()
            .with(eq(42), eq("6500.00"), eq("3500.00"), eq("No"))
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            notifications(1, PAYMENT_UPDATE_TITLE),
        );
        svc.handle_callback(&callback(0)).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_success_callback_is_a_noop() {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_mpesa_payment()
            .returning(|_| Ok(Some(pending_payment("6000"))));
        // Second delivery loses the conditional update.
        portal
            .expect_mark_payment_if_pending()
            .returning(|_, _| Ok(false));
        let mut crm = MockCrmStore::new();
        crm.expect_update_installment_balance().times(0);
        crm.expect_find_installment_schedule().times(0);

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            silent_notifications(),
        );
        svc.handle_callback(&callback(0)).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_checkout_request_is_benign() {
        let mut portal = MockPortalStore::new();
        portal.expect_find_mpesa_payment().returning(|_| Ok(None));
        portal.expect_mark_payment_if_pending().times(0);

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(MockCrmStore::new()),
            Arc::new(MockPaymentGateway::new()),
            silent_notifications(),
        );
        svc.handle_callback(&callback(0)).await.unwrap();
    }

    #[tokio::test]
    async fn failure_callback_flips_status_and_notifies() {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_mpesa_payment()
            .returning(|_| Ok(Some(pending_payment("6000"))));
        portal
            .expect_mark_payment_if_pending()
            .with(eq("ws_CO_1"), eq(PaymentStatus::Failed))
            .times(1)
            .returning(|_, _| Ok(true));
        // The installment must not move on a failed payment.
        let mut crm = MockCrmStore::new();
        crm.expect_update_installment_balance().times(0);
        crm.expect_find_installment_schedule().times(0);

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            notifications(1, PAYMENT_FAILED_TITLE),
        );
        svc.handle_callback(&callback(1032)).await.unwrap();
    }

    #[tokio::test]
    async fn failed_installment_write_resets_status_to_pending() {
        let mut portal = MockPortalStore::new();
        portal
            .expect_find_mpesa_payment()
            .returning(|_| Ok(Some(pending_payment("6000"))));
        portal
            .expect_mark_payment_if_pending()
            .returning(|_, _| Ok(true));
        portal
            .expect_reset_payment_to_pending()
            .with(eq("ws_CO_1"))
            .times(1)
            .returning(|_| Ok(()));
        let mut crm = MockCrmStore::new();
        crm.expect_find_installment_schedule()
            .returning(|_| Ok(Some(schedule())));
        crm.expect_update_installment_balance()
            .returning(|_, _, _, _| Err(DomainError::Database("lost connection".to_string())));

        let svc = PaymentService::new(
            Arc::new(portal),
            Arc::new(crm),
            Arc::new(MockPaymentGateway::new()),
            silent_notifications(),
        );
        assert!(svc.handle_callback(&callback(0)).await.is_err());
    }

    #[test]
    fn reconcile_holds_balance_invariant() {
        for (total, paid, pay) in [
            (10000.0, 4000.0, 6000.0),
            (10000.0, 4000.0, 2500.0),
            (10000.0, 0.0, 10000.0),
            (1500.5, 1000.25, 250.0),
        ] {
            let s = reconcile(total, paid, pay);
            let amount_paid = parse_amount(&s.amount_paid);
            let remaining = parse_amount(&s.remaining_amount);
            assert!(
                (amount_paid + remaining - total).abs() <= 0.01
                    || amount_paid >= total,
                "invariant broke for total={} paid={} pay={}",
                total,
                paid,
                pay
            );
            assert_eq!(s.paid_flag == "Yes", remaining == 0.0);
        }
    }

    #[test]
    fn reconcile_clamps_overpayment_to_zero_remaining() {
        let s = reconcile(10000.0, 4000.0, 9000.0);
        assert_eq!(s.amount_paid, "13000.00");
        assert_eq!(s.remaining_amount, "0.00");
        assert_eq!(s.paid_flag, "Yes");
    }

    #[test]
    fn msisdn_validation() {
        assert!(is_valid_msisdn("254712345678"));
        assert!(!is_valid_msisdn("0712345678"));
        assert!(!is_valid_msisdn("254112345678"));
        assert!(!is_valid_msisdn("2547123456789"));
        assert!(!is_valid_msisdn("25471234567a"));
    }

    #[test]
    fn callback_envelope_deserializes() {
        let raw = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_1",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {"Item": []}
                }
            }
        }"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(raw).unwrap();
        let cb = envelope.body.stk_callback;
        assert_eq!(cb.checkout_request_id, "ws_CO_1");
        assert_eq!(cb.result_code, 0);
    }
}
