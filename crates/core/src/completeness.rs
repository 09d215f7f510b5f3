//! Order completeness evaluation.
//!
//! An order is ready for admin review only when the patient demographics,
//! clinical details, supporting documents, signature and (for insured
//! orders) insurance details are all present. The evaluator reports every
//! missing item by a stable key that the portal maps to a form field.

use chrono::NaiveDate;

use crate::types::Timestamp;

/// Payment method value that waives the insurance requirements.
pub const PAYMENT_METHOD_CASH: &str = "cash";

/// Snapshot of every field that participates in the completeness check.
#[derive(Debug, Clone, Default)]
pub struct CompletenessInput {
    pub patient_first_name: Option<String>,
    pub patient_last_name: Option<String>,
    pub patient_dob: Option<NaiveDate>,
    pub patient_sex: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_address: Option<String>,
    pub product: Option<String>,
    pub wound_location: Option<String>,
    pub icd10_primary: Option<String>,
    pub wound_length_cm: Option<f64>,
    pub wound_width_cm: Option<f64>,
    pub id_card_path: Option<String>,
    pub ins_card_path: Option<String>,
    pub aob_path: Option<String>,
    pub rx_note_path: Option<String>,
    pub sign_name: Option<String>,
    pub signed_at: Option<Timestamp>,
    pub payment_method: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_member_id: Option<String>,
}

/// Result of a completeness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completeness {
    pub is_complete: bool,
    pub missing_fields: Vec<String>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Evaluate an order, returning the missing field keys in form order.
pub fn evaluate(input: &CompletenessInput) -> Completeness {
    let mut missing: Vec<&'static str> = Vec::new();

    let text_checks: [(&Option<String>, &'static str); 5] = [
        (&input.patient_first_name, "patient_first_name"),
        (&input.patient_last_name, "patient_last_name"),
        (&input.patient_sex, "patient_sex"),
        (&input.patient_phone, "patient_phone"),
        (&input.patient_address, "patient_address"),
    ];
    for (value, key) in &text_checks[..2] {
        if blank(value) {
            missing.push(key);
        }
    }
    if input.patient_dob.is_none() {
        missing.push("patient_dob");
    }
    for (value, key) in &text_checks[2..] {
        if blank(value) {
            missing.push(key);
        }
    }

    if blank(&input.product) {
        missing.push("product");
    }
    if blank(&input.wound_location) {
        missing.push("wound_location");
    }
    if blank(&input.icd10_primary) {
        missing.push("icd10_primary");
    }
    if input.wound_length_cm.is_none() {
        missing.push("wound_length_cm");
    }
    if input.wound_width_cm.is_none() {
        missing.push("wound_width_cm");
    }

    let documents = [
        (&input.id_card_path, "patient_id_card"),
        (&input.ins_card_path, "insurance_card"),
        (&input.aob_path, "assignment_of_benefits"),
        (&input.rx_note_path, "clinical_documentation"),
    ];
    for (value, key) in documents {
        if blank(value) {
            missing.push(key);
        }
    }

    if blank(&input.sign_name) {
        missing.push("physician_signature");
    }
    if input.signed_at.is_none() {
        missing.push("signature_date");
    }

    if input.payment_method.as_deref() != Some(PAYMENT_METHOD_CASH) {
        if blank(&input.insurance_provider) {
            missing.push("insurance_provider");
        }
        if blank(&input.insurance_member_id) {
            missing.push("insurance_member_id");
        }
    }

    Completeness {
        is_complete: missing.is_empty(),
        missing_fields: missing.into_iter().map(String::from).collect(),
    }
}
