//! MySQL Ledger store (read-only receipts and projects)
//!
//! Table and column names follow the upstream ledger schema as-is, including
//! the `Recipts` spelling.

use async_trait::async_trait;
use sqlx::{MySqlPool, QueryBuilder};
use tracing::error;

use portal_core::domain::{Project, Receipt};
use portal_core::error::DomainError;
use portal_core::repositories::LedgerStore;

const RECEIPT_COLUMNS: &str = "id, Receipt_No, Date_Posted, Customer_Id, Customer_Name, \
                               Lead_file_no, Plot_NO, Project_Name, Transaction_type, \
                               Amount_LCY, Type, PAYMENT_DATE1";

const PROJECT_COLUMNS: &str =
    "project_id, name, link, visibility, EPR_id, description, banner, is_featured";

pub struct MySqlLedgerStore {
    pool: MySqlPool,
}

impl MySqlLedgerStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for MySqlLedgerStore {
    async fn posted_receipts(
        &self,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Vec<Receipt>, DomainError> {
        sqlx::query_as::<_, Receipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM Recipts \
             WHERE Lead_file_no = ? AND Customer_Id = ? AND Type = 'Posted'"
        ))
        .bind(lead_file_no)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing receipts: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn posted_installment_receipts(
        &self,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Vec<Receipt>, DomainError> {
        sqlx::query_as::<_, Receipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM Recipts \
             WHERE Lead_file_no = ? AND Customer_Id = ? AND Type = 'Posted' \
               AND Transaction_type = 'Installment' \
             ORDER BY PAYMENT_DATE1 DESC"
        ))
        .bind(lead_file_no)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing installment receipts: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_posted_receipt(
        &self,
        receipt_id: i32,
        customer_id: &str,
        lead_file_no: &str,
    ) -> Result<Option<Receipt>, DomainError> {
        sqlx::query_as::<_, Receipt>(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM Recipts \
             WHERE id = ? AND Lead_file_no = ? AND Customer_Id = ? AND Type = 'Posted'"
        ))
        .bind(receipt_id)
        .bind(lead_file_no)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding receipt: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn posted_receipts_for_lead_files(
        &self,
        customer_id: &str,
        lead_file_nos: &[String],
    ) -> Result<Vec<Receipt>, DomainError> {
        if lead_file_nos.is_empty() {
            return Ok(vec![]);
        }

        let mut query = QueryBuilder::new(format!(
            "SELECT {RECEIPT_COLUMNS} FROM Recipts \
             WHERE Customer_Id = "
        ));
        query.push_bind(customer_id);
        query.push(" AND Type = 'Posted' AND Lead_file_no IN (");
        let mut separated = query.separated(", ");
        for lead_file_no in lead_file_nos {
            separated.push_bind(lead_file_no);
        }
        query.push(")");

        query
            .build_query_as::<Receipt>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing receipts for lead files: {}", e);
                DomainError::Database(e.to_string())
            })
    }

    async fn projects_by_epr_ids(&self, epr_ids: &[String]) -> Result<Vec<Project>, DomainError> {
        if epr_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut query = QueryBuilder::new(format!(
            "SELECT {PROJECT_COLUMNS} FROM Projects WHERE EPR_id IN ("
        ));
        let mut separated = query.separated(", ");
        for epr_id in epr_ids {
            separated.push_bind(epr_id);
        }
        query.push(") ORDER BY name ASC");

        query
            .build_query_as::<Project>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error listing projects: {}", e);
                DomainError::Database(e.to_string())
            })
    }
}
