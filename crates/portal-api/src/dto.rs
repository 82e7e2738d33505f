//! Request DTOs and input validation

use serde::Deserialize;
use validator::Validate;

use crate::error::ApiError;

/// Run `validator` rules and turn failures into a 400.
pub fn validated<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(payload)
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyUserRequest {
    #[validate(length(min = 1, message = "Customer number is required"))]
    pub customer_number: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "Customer number is required"))]
    pub customer_number: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteRegistrationRequest {
    #[validate(length(min = 1, message = "Customer number is required"))]
    pub customer_number: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpResetRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InitiateMpesaPaymentRequest {
    #[validate(range(min = 1, message = "Invalid amount format"))]
    pub amount: u64,
    #[validate(length(equal = 12, message = "Invalid phone number format"))]
    pub phone_number: String,
    pub installment_schedule_id: i32,
    #[validate(length(min = 1, message = "Customer number is required"))]
    pub customer_number: String,
    #[validate(length(min = 1, message = "Plot number is required"))]
    pub plot_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SavePushTokenRequest {
    #[validate(length(min = 1, message = "Push token is required"))]
    pub push_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub user_id: u64,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReferralRequest {
    #[validate(length(min = 1, message = "Referred name is required"))]
    pub referred_name: String,
    #[validate(email)]
    pub referred_email: String,
    #[serde(default)]
    pub property_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_rejects_bad_email() {
        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: "pw!".to_string(),
        };
        assert!(validated(request).is_err());
    }

    #[test]
    fn otp_must_be_exactly_six_characters() {
        for otp in ["12345", "1234567", ""] {
            let request = VerifyOtpRequest {
                customer_number: "C1001".to_string(),
                email: "a@x.com".to_string(),
                otp: otp.to_string(),
            };
            assert!(validated(request).is_err(), "otp {:?}", otp);
        }

        let request = VerifyOtpRequest {
            customer_number: "C1001".to_string(),
            email: "a@x.com".to_string(),
            otp: "314159".to_string(),
        };
        assert!(validated(request).is_ok());
    }

    #[test]
    fn payment_request_rejects_zero_amount_and_short_phone() {
        let request = InitiateMpesaPaymentRequest {
            amount: 0,
            phone_number: "254712345678".to_string(),
            installment_schedule_id: 42,
            customer_number: "C1001".to_string(),
            plot_number: "PLT-17".to_string(),
        };
        assert!(validated(request).is_err());

        let request = InitiateMpesaPaymentRequest {
            amount: 6000,
            phone_number: "0712345678".to_string(),
            installment_schedule_id: 42,
            customer_number: "C1001".to_string(),
            plot_number: "PLT-17".to_string(),
        };
        assert!(validated(request).is_err());
    }
}
