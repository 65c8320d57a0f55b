//! Verification code generation.

use rand::RngCore;
use rand::rngs::OsRng;

use crate::otp::error::OtpError;

/// Number of digits in every generated code.
pub const CODE_LENGTH: usize = 6;

const CODE_SPACE: u32 = 1_000_000;

// Largest multiple of CODE_SPACE that fits in a u32; draws at or above it
// are rejected so every code is equally likely.
const REJECTION_ZONE: u32 = u32::MAX - (u32::MAX % CODE_SPACE);

/// Draws a uniformly distributed 6-digit code (`000000`..=`999999`) from the
/// operating system's entropy source.
///
/// # Errors
///
/// Returns [`OtpError::EntropyUnavailable`] if the OS cannot supply random
/// bytes. Callers should treat this as fatal.
///
/// # Example
///
/// ```rust
/// let code = otp_store::generate_code()?;
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// # Ok::<(), otp_store::OtpError>(())
/// ```
pub fn generate_code() -> Result<String, OtpError> {
    generate_code_with(&mut OsRng)
}

/// Same as [`generate_code`], drawing from the supplied generator.
pub fn generate_code_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, OtpError> {
    let mut buf = [0u8; 4];
    loop {
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| OtpError::EntropyUnavailable(e.to_string()))?;
        let draw = u32::from_le_bytes(buf);
        if draw < REJECTION_ZONE {
            return Ok(format_code(draw % CODE_SPACE));
        }
    }
}

fn format_code(value: u32) -> String {
    format!("{value:0width$}", width = CODE_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Yields a fixed sequence of u32 words, then fails.
    struct ScriptedRng {
        words: Vec<u32>,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }

        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!()
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            if self.words.is_empty() {
                return Err(rand::Error::new(std::io::Error::other("exhausted")));
            }
            let word = self.words.remove(0);
            dest.copy_from_slice(&word.to_le_bytes());
            Ok(())
        }
    }

    #[test]
    fn test_generated_code_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let code = generate_code_with(&mut rng).unwrap();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_leading_zeros_are_kept() {
        let mut rng = ScriptedRng { words: vec![42] };
        assert_eq!(generate_code_with(&mut rng).unwrap(), "000042");

        let mut rng = ScriptedRng { words: vec![0] };
        assert_eq!(generate_code_with(&mut rng).unwrap(), "000000");
    }

    #[test]
    fn test_draws_in_rejection_zone_are_redrawn() {
        let mut rng = ScriptedRng {
            words: vec![u32::MAX, REJECTION_ZONE, 1_999_999],
        };
        assert_eq!(generate_code_with(&mut rng).unwrap(), "999999");
    }

    #[test]
    fn test_entropy_failure_is_reported() {
        let mut rng = ScriptedRng { words: vec![] };
        assert!(matches!(
            generate_code_with(&mut rng),
            Err(OtpError::EntropyUnavailable(_))
        ));
    }

    #[test]
    fn test_os_entropy_generates_codes() {
        let code = generate_code().unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
    }

    #[test]
    fn test_leading_digit_is_not_biased() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut leading_zero = 0;
        let draws = 20_000;
        for _ in 0..draws {
            if generate_code_with(&mut rng).unwrap().starts_with('0') {
                leading_zero += 1;
            }
        }
        // Expect ~10%; a 100000..=999999 generator would never produce one.
        assert!(leading_zero > draws / 20, "only {leading_zero} leading zeros");
        assert!(leading_zero < draws / 5, "{leading_zero} leading zeros");
    }
}
