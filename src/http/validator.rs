//! Adapter from the `validator` crate to [`Error`].

use validator::Validate;

use crate::http::error::Error;

/// Runs derive-based struct validation and reports failures as
/// `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Returns a bad-request error carrying the validator's message when
    /// `payload` fails any of its rules.
    pub fn validate<T: Validate + ?Sized>(&self, payload: &T) -> Result<(), Error> {
        payload
            .validate()
            .map_err(|errors| Error::bad_request(errors.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[derive(Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
        #[validate(length(min = 8))]
        password: String,
    }

    #[test]
    fn test_valid_payload_passes() {
        let payload = Signup {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        };
        assert!(Validator::new().validate(&payload).is_ok());
    }

    #[test]
    fn test_invalid_payload_is_bad_request() {
        let payload = Signup {
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let err = Validator::new().validate(&payload).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let message = err.public_message();
        assert!(message.contains("email"), "{message}");
        assert!(message.contains("password"), "{message}");
    }
}
