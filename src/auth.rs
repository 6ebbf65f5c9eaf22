use std::sync::OnceLock;

use entity::prelude::{LoginRequest, RegisterRequest};
use regex::Regex;

use crate::error::ClientError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const PASSWORD_TOO_SHORT: &str = "Password should be at least 8 characters long";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

fn require(value: &str, field: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), ClientError> {
    require(email, "Email")?;
    if !email_pattern().is_match(email.trim()) {
        return Err(ClientError::Validation("Please enter a valid email address".to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    /// Rejects the form before anything is sent to the backend.
    pub fn validate(&self) -> Result<RegisterRequest, ClientError> {
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::Validation(PASSWORD_TOO_SHORT.to_string()));
        }
        require(&self.name, "Name")?;
        check_email(&self.email)?;

        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ClientError> {
        check_email(&self.email)?;
        require(&self.password, "Password")?;

        Ok(LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}
