//! One-time code generation
//!
//! Codes gate account registration, so they come from the OS-seeded CSPRNG
//! rather than a time-seeded generator.

use rand::Rng;

pub const OTP_LENGTH: usize = 6;

/// Generate a 6-digit numeric OTP.
pub fn generate_otp() -> String {
    let mut rng = rand::rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_numeric_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otps_vary() {
        let samples: std::collections::HashSet<String> =
            (0..50).map(|_| generate_otp()).collect();
        // 50 draws from a million values colliding down to 1 would mean a
        // broken generator.
        assert!(samples.len() > 1);
    }
}
