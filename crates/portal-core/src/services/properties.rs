//! Authorization-filtered property reads
//!
//! Every operation starts from the caller's customer number and the
//! non-dropped filter. Ownership violations surface as NotAuthorized, never
//! NotFound, so plot existence does not leak.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use tracing::warn;

use crate::domain::{InstallmentSchedule, LeadFile, Project, Receipt, User};
use crate::error::DomainError;
use crate::repositories::{CrmStore, LedgerStore, PortalStore};

pub struct PropertyService {
    crm: Arc<dyn CrmStore>,
    ledger: Arc<dyn LedgerStore>,
    portal: Arc<dyn PortalStore>,
}

/// One row of the merged transactions view: posted ledger receipts plus
/// successful portal M-PESA payments.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionEntry {
    pub id: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
}

impl PropertyService {
    pub fn new(
        crm: Arc<dyn CrmStore>,
        ledger: Arc<dyn LedgerStore>,
        portal: Arc<dyn PortalStore>,
    ) -> Self {
        Self {
            crm,
            ledger,
            portal,
        }
    }

    pub async fn properties(&self, user: &User) -> Result<Vec<LeadFile>, DomainError> {
        self.crm.active_lead_files(&user.customer_number).await
    }

    /// The ownership gate every per-plot operation goes through.
    pub async fn require_owned_lead_file(
        &self,
        user: &User,
        lead_file_no: &str,
    ) -> Result<LeadFile, DomainError> {
        self.crm
            .find_active_lead_file(lead_file_no, &user.customer_number)
            .await?
            .ok_or_else(|| {
                warn!(
                    "user {} denied access to lead file {}",
                    user.id, lead_file_no
                );
                DomainError::NotAuthorized
            })
    }

    pub async fn installment_schedule(
        &self,
        user: &User,
        lead_file_no: &str,
    ) -> Result<(LeadFile, Vec<InstallmentSchedule>), DomainError> {
        let lead_file = self.require_owned_lead_file(user, lead_file_no).await?;
        let schedules = self
            .crm
            .installment_schedules(&user.customer_number, lead_file_no)
            .await?;
        Ok((lead_file, schedules))
    }

    pub async fn transactions(
        &self,
        user: &User,
        lead_file_no: &str,
    ) -> Result<Vec<TransactionEntry>, DomainError> {
        let lead_file = self.require_owned_lead_file(user, lead_file_no).await?;

        let receipts = self
            .ledger
            .posted_installment_receipts(&user.customer_number, lead_file_no)
            .await?;
        let payments = self
            .portal
            .successful_payments(&user.customer_number, &lead_file.plot_number)
            .await?;

        let mut entries: Vec<TransactionEntry> = receipts
            .iter()
            .map(|receipt| {
                let (date, time) = split_payment_date(&receipt.payment_date1);
                TransactionEntry {
                    id: receipt.id.to_string(),
                    date,
                    time,
                    kind: receipt.transaction_type.clone(),
                    amount: receipt.amount_lcy,
                }
            })
            .collect();

        entries.extend(payments.iter().map(|payment| TransactionEntry {
            id: payment.checkout_request_id.clone(),
            date: payment.created_at.format("%Y-%m-%d").to_string(),
            time: payment.created_at.format("%H:%M").to_string(),
            kind: "M-PESA".to_string(),
            amount: portal_shared::decimal::parse_amount(&payment.amount),
        }));

        entries.sort_by(|a, b| (b.date.as_str(), b.time.as_str()).cmp(&(a.date.as_str(), a.time.as_str())));
        Ok(entries)
    }

    pub async fn receipts(
        &self,
        user: &User,
        lead_file_no: &str,
    ) -> Result<Vec<Receipt>, DomainError> {
        self.require_owned_lead_file(user, lead_file_no).await?;
        self.ledger
            .posted_receipts(&user.customer_number, lead_file_no)
            .await
    }

    pub async fn receipt(
        &self,
        user: &User,
        lead_file_no: &str,
        receipt_id: i32,
    ) -> Result<(LeadFile, Receipt), DomainError> {
        let lead_file = self.require_owned_lead_file(user, lead_file_no).await?;
        let receipt = self
            .ledger
            .find_posted_receipt(receipt_id, &user.customer_number, lead_file_no)
            .await?
            .ok_or(DomainError::NotAuthorized)?;
        Ok((lead_file, receipt))
    }

    pub async fn title_status(
        &self,
        user: &User,
        lead_file_no: &str,
    ) -> Result<String, DomainError> {
        let lead_file = self.require_owned_lead_file(user, lead_file_no).await?;
        Ok(lead_file.title_status)
    }

    /// The distinct projects behind the caller's active plots.
    pub async fn projects(&self, user: &User) -> Result<Vec<Project>, DomainError> {
        let lead_files = self.crm.active_lead_files(&user.customer_number).await?;
        let mut epr_ids: Vec<String> = lead_files
            .into_iter()
            .map(|lf| lf.project_number)
            .collect();
        epr_ids.sort();
        epr_ids.dedup();
        if epr_ids.is_empty() {
            return Ok(vec![]);
        }
        self.ledger.projects_by_epr_ids(&epr_ids).await
    }

    /// Sum of posted receipt amounts across the caller's active plots.
    pub async fn total_spent(&self, user: &User) -> Result<f64, DomainError> {
        let lead_files = self.crm.active_lead_files(&user.customer_number).await?;
        let lead_file_nos: Vec<String> =
            lead_files.into_iter().map(|lf| lf.lead_file_no).collect();
        if lead_file_nos.is_empty() {
            return Ok(0.0);
        }
        let receipts = self
            .ledger
            .posted_receipts_for_lead_files(&user.customer_number, &lead_file_nos)
            .await?;
        Ok(receipts.iter().map(|r| r.amount_lcy).sum())
    }
}

/// Ledger payment dates arrive as RFC3339 or `YYYY-MM-DD HH:MM:SS`; anything
/// else is passed through as-is with an empty time.
fn split_payment_date(raw: &str) -> (String, String) {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return (
            parsed.format("%Y-%m-%d").to_string(),
            parsed.format("%H:%M").to_string(),
        );
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return (
            parsed.format("%Y-%m-%d").to_string(),
            parsed.format("%H:%M").to_string(),
        );
    }
    (raw.to_string(), String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MockCrmStore, MockLedgerStore, MockPortalStore};
    use chrono::Utc;
    use mockall::predicate::eq;

    fn user() -> User {
        User {
            id: 1,
            customer_number: "C1".to_string(),
            email: "u1@x".to_string(),
            phone_number: String::new(),
            password: String::new(),
            verified: true,
            user_type: "individual".to_string(),
            push_token: None,
            last_logout_at: None,
            created_at: Utc::now(),
        }
    }

    fn lead_file(no: &str, customer: &str) -> LeadFile {
        LeadFile {
            lead_file_no: no.to_string(),
            lead_file_status_dropped: "No".to_string(),
            plot_number: "PLT-17".to_string(),
            project_number: "EPR-2".to_string(),
            customer_id: customer.to_string(),
            customer_name: "Jane Plot".to_string(),
            purchase_price: 500000.0,
            selling_price: "500,000.00".to_string(),
            total_paid: 100000.0,
            no_of_installments: "10".to_string(),
            installment_amount: "50,000.00".to_string(),
            title_status: "Processing".to_string(),
            booking_date: None,
        }
    }

    #[tokio::test]
    async fn foreign_lead_file_is_not_authorized() {
        let mut crm = MockCrmStore::new();
        // The store filters by owner, so a foreign lead file comes back None.
        crm.expect_find_active_lead_file()
            .with(eq("LF-OTHER"), eq("C1"))
            .returning(|_, _| Ok(None));

        let svc = PropertyService::new(
            Arc::new(crm),
            Arc::new(MockLedgerStore::new()),
            Arc::new(MockPortalStore::new()),
        );
        let err = svc
            .require_owned_lead_file(&user(), "LF-OTHER")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized));
    }

    #[tokio::test]
    async fn installment_schedule_requires_ownership_first() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_active_lead_file()
            .returning(|_, _| Ok(None));
        crm.expect_installment_schedules().times(0);

        let svc = PropertyService::new(
            Arc::new(crm),
            Arc::new(MockLedgerStore::new()),
            Arc::new(MockPortalStore::new()),
        );
        assert!(svc.installment_schedule(&user(), "LF-9").await.is_err());
    }

    #[tokio::test]
    async fn transactions_merge_receipts_and_mpesa_rows() {
        let mut crm = MockCrmStore::new();
        crm.expect_find_active_lead_file()
            .returning(|no, customer| Ok(Some(lead_file(no, customer))));
        let mut ledger = MockLedgerStore::new();
        ledger.expect_posted_installment_receipts().returning(|_, _| {
            Ok(vec![Receipt {
                id: 11,
                receipt_no: "R-11".to_string(),
                date_posted: "2024-03-01".to_string(),
                customer_id: "C1".to_string(),
                customer_name: "Jane Plot".to_string(),
                lead_file_no: "LF-9".to_string(),
                plot_no: "PLT-17".to_string(),
                project_name: "Acacia Gardens".to_string(),
                transaction_type: "Installment".to_string(),
                amount_lcy: 50000.0,
                kind: "Posted".to_string(),
                payment_date1: "2024-03-01 09:30:00".to_string(),
            }])
        });
        let mut portal = MockPortalStore::new();
        portal.expect_successful_payments().returning(|_, _| {
            Ok(vec![crate::domain::MpesaPayment {
                id: 1,
                checkout_request_id: "ws_CO_1".to_string(),
                installment_schedule_id: 42,
                customer_number: "C1".to_string(),
                phone_number: "254712345678".to_string(),
                amount: "6000".to_string(),
                plot_number: "PLT-17".to_string(),
                status: "Success".to_string(),
                created_at: "2024-04-02T10:00:00Z".parse().unwrap(),
            }])
        });

        let svc = PropertyService::new(Arc::new(crm), Arc::new(ledger), Arc::new(portal));
        let entries = svc.transactions(&user(), "LF-9").await.unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first: the M-PESA payment from April precedes the March receipt.
        assert_eq!(entries[0].kind, "M-PESA");
        assert_eq!(entries[0].amount, 6000.0);
        assert_eq!(entries[1].id, "11");
        assert_eq!(entries[1].date, "2024-03-01");
        assert_eq!(entries[1].time, "09:30");
    }

    #[tokio::test]
    async fn projects_deduplicates_epr_ids() {
        let mut crm = MockCrmStore::new();
        crm.expect_active_lead_files().returning(|customer| {
            let mut a = lead_file("LF-1", customer);
            a.project_number = "EPR-2".to_string();
            let mut b = lead_file("LF-2", customer);
            b.project_number = "EPR-2".to_string();
            Ok(vec![a, b])
        });
        let mut ledger = MockLedgerStore::new();
        ledger
            .expect_projects_by_epr_ids()
            .withf(|ids| ids == ["EPR-2".to_string()])
            .times(1)
            .returning(|_| Ok(vec![]));

        let svc = PropertyService::new(
            Arc::new(crm),
            Arc::new(ledger),
            Arc::new(MockPortalStore::new()),
        );
        svc.projects(&user()).await.unwrap();
    }

    #[tokio::test]
    async fn total_spent_sums_posted_amounts() {
        let mut crm = MockCrmStore::new();
        crm.expect_active_lead_files()
            .returning(|customer| Ok(vec![lead_file("LF-1", customer)]));
        let mut ledger = MockLedgerStore::new();
        ledger
            .expect_posted_receipts_for_lead_files()
            .returning(|_, _| {
                Ok(vec![
                    Receipt {
                        id: 1,
                        receipt_no: "R-1".to_string(),
                        date_posted: String::new(),
                        customer_id: "C1".to_string(),
                        customer_name: String::new(),
                        lead_file_no: "LF-1".to_string(),
                        plot_no: String::new(),
                        project_name: String::new(),
                        transaction_type: "Installment".to_string(),
                        amount_lcy: 30000.0,
                        kind: "Posted".to_string(),
                        payment_date1: String::new(),
                    },
                    Receipt {
                        id: 2,
                        receipt_no: "R-2".to_string(),
                        date_posted: String::new(),
                        customer_id: "C1".to_string(),
                        customer_name: String::new(),
                        lead_file_no: "LF-1".to_string(),
                        plot_no: String::new(),
                        project_name: String::new(),
                        transaction_type: "Deposit".to_string(),
                        amount_lcy: 20000.0,
                        kind: "Posted".to_string(),
                        payment_date1: String::new(),
                    },
                ])
            });

        let svc = PropertyService::new(
            Arc::new(crm),
            Arc::new(ledger),
            Arc::new(MockPortalStore::new()),
        );
        assert_eq!(svc.total_spent(&user()).await.unwrap(), 50000.0);
    }

    #[test]
    fn payment_date_splitting() {
        assert_eq!(
            split_payment_date("2024-03-01 09:30:00"),
            ("2024-03-01".to_string(), "09:30".to_string())
        );
        assert_eq!(
            split_payment_date("2024-03-01T09:30:00Z"),
            ("2024-03-01".to_string(), "09:30".to_string())
        );
        assert_eq!(
            split_payment_date("bad-date"),
            ("bad-date".to_string(), String::new())
        );
    }
}
