//! Built-in schemas for the registration wizard, the single-page register
//! form and the login form.

use shared::domain::{Address, RegistrationPayload};

use crate::{
    record::AccumulatedRecord,
    validation::{FieldSpec, Schema, ZipFormat},
};

#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub title: String,
    pub schema: Schema,
}

impl StepDefinition {
    pub fn new(title: impl Into<String>, schema: Schema) -> Self {
        Self {
            title: title.into(),
            schema,
        }
    }
}

pub fn personal_info_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::new("fullName").required("Full Name is required"))
        .field(
            FieldSpec::new("email")
                .required("Email is required")
                .email("Email is invalid"),
        )
        .field(FieldSpec::new("dateOfBirth").required("Date of Birth is required"))
}

pub fn address_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::new("streetAddress").required("Street Address is required"))
        .field(FieldSpec::new("city").required("City is required"))
        .field(FieldSpec::new("state").required("State is required"))
        .field(
            FieldSpec::new("zipCode")
                .required("Zip Code is required")
                .zip(ZipFormat::FiveOrPlusFour, "Zip Code is invalid"),
        )
}

pub fn account_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::new("username").required("Username is required"))
        .field(
            FieldSpec::new("password")
                .required("Password is required")
                .min_length(8, "Password must be at least 8 characters")
                .strong_password(
                    "Password must contain one uppercase, one lowercase, one number, and one special character",
                ),
        )
}

/// Personal info, address, account: the three wizard screens in order.
pub fn registration_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("Personal Info", personal_info_schema()),
        StepDefinition::new("Address", address_schema()),
        StepDefinition::new("Account Info", account_schema()),
    ]
}

/// Everything on one page, address fields nested under `address.`.
pub fn register_form_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::new("fullName").required("Full name is required"))
        .field(
            FieldSpec::new("email")
                .required("Email is required")
                .email("Invalid email"),
        )
        .field(
            FieldSpec::new("dateOfBirth")
                .required("Date of birth is required")
                .date("Date of birth must be a valid date")
                .not_in_future("Date of birth cannot be in the future"),
        )
        .field(FieldSpec::new("address.street").required("Street is required"))
        .field(FieldSpec::new("address.city").required("City is required"))
        .field(FieldSpec::new("address.state").required("State is required"))
        .field(
            FieldSpec::new("address.zipCode")
                .required("Zip code is required")
                .zip(ZipFormat::FiveDigits, "Zip code must be 5 digits"),
        )
        .field(
            FieldSpec::new("username")
                .required("Username is required")
                .min_length(4, "Username must be at least 4 characters"),
        )
        .field(
            FieldSpec::new("password")
                .required("Password is required")
                .min_length(8, "Password must be at least 8 characters")
                .strong_password(
                    "Password must contain uppercase, lowercase, number, and special character",
                ),
        )
}

pub fn login_schema() -> Schema {
    Schema::new()
        .field(FieldSpec::new("username").required("Username is required"))
        .field(FieldSpec::new("password").required("Password is required"))
}

/// Builds the `POST /users` body from either the wizard field names or the
/// single-page form's dotted address names.
pub fn registration_payload(record: &AccumulatedRecord) -> RegistrationPayload {
    let pick = |primary: &str, alternate: &str| {
        if record.contains(primary) {
            record.text(primary)
        } else {
            record.text(alternate)
        }
    };

    RegistrationPayload {
        full_name: record.text("fullName"),
        email: record.text("email"),
        date_of_birth: record.text("dateOfBirth"),
        address: Address {
            street: pick("streetAddress", "address.street"),
            city: pick("city", "address.city"),
            state: pick("state", "address.state"),
            zip_code: pick("zipCode", "address.zipCode"),
        },
        username: record.text("username"),
        password: record.text("password"),
    }
}

/// Maps a `POST /users` field path back to the wizard field that collected
/// it, so server-side field errors land next to the right input.
pub fn wizard_field_name(payload_field: &str) -> &str {
    match payload_field {
        "address.street" => "streetAddress",
        "address.city" => "city",
        "address.state" => "state",
        "address.zipCode" => "zipCode",
        other => other,
    }
}
