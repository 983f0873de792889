use argon2::password_hash::rand_core::{OsRng, RngCore};

pub const OTP_LEN: usize = 6;
/// Wrong guesses allowed before the outstanding code is discarded.
pub const MAX_OTP_ATTEMPTS: u64 = 5;

/// Uniformly random six-digit code, zero-padded.
pub fn generate_code() -> String {
    const BOUND: u32 = u32::MAX - (u32::MAX % 1_000_000);
    loop {
        let n = OsRng.next_u32();
        if n < BOUND {
            return format!("{:0width$}", n % 1_000_000, width = OTP_LEN);
        }
    }
}

pub fn otp_key(email: &str) -> String {
    format!("otp:{email}")
}

pub fn otp_attempts_key(email: &str) -> String {
    format!("otp_attempts:{email}")
}
