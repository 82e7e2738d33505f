//! MySQL Portal store (app-owned tables)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use tracing::{error, info};

use portal_core::domain::{
    Campaign, MpesaPayment, NewMpesaPayment, NewReferral, Notification, PasswordReset,
    PaymentStatus, Referral, User,
};
use portal_core::error::DomainError;
use portal_core::repositories::PortalStore;

const USER_COLUMNS: &str = "id, customer_number, email, phone_number, password, \
                            verified, user_type, push_token, last_logout_at, created_at";

const PAYMENT_COLUMNS: &str = "id, checkout_request_id, installment_schedule_id, \
                               customer_number, phone_number, amount, plot_number, \
                               status, created_at";

pub struct MySqlPortalStore {
    pool: MySqlPool,
}

impl MySqlPortalStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_user_by_id(&self, id: u64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl PortalStore for MySqlPortalStore {
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>, DomainError> {
        self.fetch_user_by_id(id).await.map_err(|e| {
            error!("Database error finding user by id: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user by email: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_user_by_customer_number(
        &self,
        customer_number: &str,
    ) -> Result<Option<User>, DomainError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE customer_number = ?"
        ))
        .bind(customer_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user by customer number: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn create_user(
        &self,
        user: &portal_core::domain::NewUser,
    ) -> Result<User, DomainError> {
        info!("Creating user with email: {}", user.email);

        let result = sqlx::query(
            r#"
            INSERT INTO users (customer_number, email, phone_number, password, verified, user_type)
            VALUES (?, ?, ?, ?, TRUE, ?)
            "#,
        )
        .bind(&user.customer_number)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.password)
        .bind(&user.user_type)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating user: {}", e);
            let msg = e.to_string();
            if msg.contains("Duplicate entry") || msg.contains("unique") {
                DomainError::Conflict(format!("User already exists for {}", user.email))
            } else {
                DomainError::Database(msg)
            }
        })?;

        let created = self
            .fetch_user_by_id(result.last_insert_id())
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?
            .ok_or_else(|| {
                DomainError::Internal("user row missing immediately after insert".to_string())
            })?;

        info!("User created successfully: {}", created.id);
        Ok(created)
    }

    async fn update_user_password(
        &self,
        user_id: u64,
        password_hash: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating password: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn update_last_logout(
        &self,
        user_id: u64,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET last_logout_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error recording logout: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn update_push_token(&self, user_id: u64, push_token: &str) -> Result<(), DomainError> {
        sqlx::query("UPDATE users SET push_token = ? WHERE id = ?")
            .bind(push_token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error saving push token: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn create_password_reset(
        &self,
        user_id: u64,
        otp: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO password_resets (user_id, otp, otp_generated_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(otp)
        .bind(generated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating password reset: {}", e);
            DomainError::Database(e.to_string())
        })?;
        Ok(())
    }

    async fn latest_password_reset(
        &self,
        user_id: u64,
    ) -> Result<Option<PasswordReset>, DomainError> {
        sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, otp, otp_generated_at, created_at
            FROM password_resets
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading password reset: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn delete_password_reset(&self, id: u64) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM password_resets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting password reset: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn create_mpesa_payment(
        &self,
        payment: &NewMpesaPayment,
    ) -> Result<MpesaPayment, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO mpesa_payments
                (checkout_request_id, installment_schedule_id, customer_number,
                 phone_number, amount, plot_number, status)
            VALUES (?, ?, ?, ?, ?, ?, 'Pending')
            "#,
        )
        .bind(&payment.checkout_request_id)
        .bind(payment.installment_schedule_id)
        .bind(&payment.customer_number)
        .bind(&payment.phone_number)
        .bind(&payment.amount)
        .bind(&payment.plot_number)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating M-PESA payment: {}", e);
            DomainError::Database(e.to_string())
        })?;

        sqlx::query_as::<_, MpesaPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM mpesa_payments WHERE id = ?"
        ))
        .bind(result.last_insert_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error reading back M-PESA payment: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn find_mpesa_payment(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<MpesaPayment>, DomainError> {
        sqlx::query_as::<_, MpesaPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM mpesa_payments WHERE checkout_request_id = ?"
        ))
        .bind(checkout_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding M-PESA payment: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn mark_payment_if_pending(
        &self,
        checkout_request_id: &str,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        // The conditional WHERE makes duplicate callbacks lose the race: only
        // one update ever observes status = 'Pending'.
        let result = sqlx::query(
            "UPDATE mpesa_payments SET status = ? \
             WHERE checkout_request_id = ? AND status = 'Pending'",
        )
        .bind(status.as_str())
        .bind(checkout_request_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating M-PESA payment status: {}", e);
            DomainError::Database(e.to_string())
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn reset_payment_to_pending(
        &self,
        checkout_request_id: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE mpesa_payments SET status = 'Pending' WHERE checkout_request_id = ?")
            .bind(checkout_request_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error resetting M-PESA payment status: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn successful_payments(
        &self,
        customer_number: &str,
        plot_number: &str,
    ) -> Result<Vec<MpesaPayment>, DomainError> {
        sqlx::query_as::<_, MpesaPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM mpesa_payments \
             WHERE customer_number = ? AND plot_number = ? AND status = 'Success' \
             ORDER BY created_at DESC"
        ))
        .bind(customer_number)
        .bind(plot_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing successful payments: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn create_notification(
        &self,
        user_id: u64,
        title: &str,
        body: &str,
        data: &str,
    ) -> Result<(), DomainError> {
        sqlx::query("INSERT INTO notifications (user_id, title, body, data) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(title)
            .bind(body)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating notification: {}", e);
                DomainError::Database(e.to_string())
            })?;
        Ok(())
    }

    async fn notifications_for_user(
        &self,
        user_id: u64,
    ) -> Result<Vec<Notification>, DomainError> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, body, data, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing notifications: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn create_referral(&self, referral: &NewReferral) -> Result<Referral, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO referrals
                (referrer_id, referred_name, referred_email, property_id, status, amount_paid)
            VALUES (?, ?, ?, ?, 'Pending', 0)
            "#,
        )
        .bind(&referral.referrer_id)
        .bind(&referral.referred_name)
        .bind(&referral.referred_email)
        .bind(&referral.property_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating referral: {}", e);
            DomainError::Database(e.to_string())
        })?;

        sqlx::query_as::<_, Referral>(
            "SELECT id, referrer_id, referred_name, referred_email, property_id, status, \
             amount_paid FROM referrals WHERE id = ?",
        )
        .bind(result.last_insert_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error reading back referral: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn referrals_for_customer(
        &self,
        customer_number: &str,
    ) -> Result<Vec<Referral>, DomainError> {
        sqlx::query_as::<_, Referral>(
            "SELECT id, referrer_id, referred_name, referred_email, property_id, status, \
             amount_paid FROM referrals WHERE referrer_id = ? ORDER BY id DESC",
        )
        .bind(customer_number)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing referrals: {}", e);
            DomainError::Database(e.to_string())
        })
    }

    async fn monthly_featured_campaign(
        &self,
        month: i32,
        year: i32,
    ) -> Result<Option<Campaign>, DomainError> {
        sqlx::query_as::<_, Campaign>(
            r#"
            SELECT id, title, description, banner_image_url, month, year, featured, link, created_at
            FROM campaigns
            WHERE month = ? AND year = ? AND featured = TRUE
            LIMIT 1
            "#,
        )
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading monthly campaign: {}", e);
            DomainError::Database(e.to_string())
        })
    }
}
