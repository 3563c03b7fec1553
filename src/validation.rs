//! Checks applied to form input before it is sent

use crate::error::Error;

const MIN_PHONE_LEN: usize = 7;

pub(crate) fn require_non_empty(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// At least one of email and phone number must be given; given ones must be
/// well-formed.
pub(crate) fn require_contact(email: Option<&str>, phone_number: Option<&str>) -> Result<(), Error> {
    let email = email.map(str::trim).filter(|value| !value.is_empty());
    let phone_number = phone_number.map(str::trim).filter(|value| !value.is_empty());

    if email.is_none() && phone_number.is_none() {
        return Err(Error::validation(
            "At least one contact method (email or phone number) is required",
        ));
    }
    if let Some(email) = email {
        check_email(email)?;
    }
    if let Some(phone_number) = phone_number {
        if phone_number.chars().count() < MIN_PHONE_LEN {
            return Err(Error::validation("Phone number is too short"));
        }
    }
    Ok(())
}

pub(crate) fn check_email(email: &str) -> Result<(), Error> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(Error::validation(format!("Invalid email address: {}", email)));
    }
    Ok(())
}
