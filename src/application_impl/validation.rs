use crate::application_port::*;

pub const SUBJECT_MAX_LEN: usize = 64;

fn require_non_blank(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(())
}

pub fn validate_log_in_request(subject: &str, secret: &str) -> Result<LogInInput, AuthError> {
    require_non_blank("subject", subject)?;
    require_non_blank("secret", secret)?;
    if subject.chars().count() > SUBJECT_MAX_LEN {
        return Err(AuthError::InvalidInput(format!(
            "subject must be at most {SUBJECT_MAX_LEN} characters"
        )));
    }

    Ok(LogInInput {
        subject: subject.to_string(),
        secret: secret.to_string(),
    })
}

pub fn validate_refresh_request(refresh_token: &str) -> Result<&str, AuthError> {
    require_non_blank("refreshToken", refresh_token)?;
    Ok(refresh_token)
}
