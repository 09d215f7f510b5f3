//! Message bodies for patient SMS, webhook replies and email.

use crate::email::OutgoingEmail;

// ---------------------------------------------------------------------------
// Delivery confirmation
// ---------------------------------------------------------------------------

pub fn delivery_confirmation_sms(first_name: &str, order_id: i64, url: &str) -> String {
    format!("Hi {first_name}, CollagenDirect here. Please confirm delivery of your order #{order_id}: {url}")
}

pub fn delivery_confirmation_email(
    to: &str,
    patient_first_name: &str,
    physician_name: &str,
    order_id: i64,
    url: &str,
) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("CollagenDirect Order Delivery Confirmation - Order #{order_id}"),
        body: format!(
            "Hi {patient_first_name},\n\n\
             Your wound care supplies ordered by Dr. {physician_name} have been delivered.\n\n\
             Please confirm that you received them:\n{url}\n\n\
             If you did not receive your order, please contact your physician's office.\n\n\
             CollagenDirect"
        ),
    }
}

/// Thank-you reply after an SMS keyword confirmation.
pub fn delivery_reply_confirmed(first_name: &str) -> String {
    format!(
        "Thank you {first_name}! Your delivery confirmation has been recorded. \
         If you have any questions, please contact your physician's office."
    )
}

pub const DELIVERY_REPLY_NO_PENDING: &str =
    "Thank you for your message. If you need assistance, please contact your physician's office.";

pub const DELIVERY_REPLY_INSTRUCTIONS: &str =
    "To confirm delivery of your wound care supplies, please reply with \"YES\" or \"DELIVERED\". Thank you!";

pub const DELIVERY_REPLY_ERROR: &str = "Thank you for your message. We encountered an error \
    processing your confirmation. Please try again or contact your physician's office.";

// ---------------------------------------------------------------------------
// Wound photos
// ---------------------------------------------------------------------------

/// Manual photo request with an upload link.
pub fn photo_request_sms(first_name: &str, upload_url: &str) -> String {
    format!(
        "Hi {first_name}! Please send a photo of your wound by replying to this text message \
         with the photo attached.\n\nOr use this link:\n{upload_url}\n\nReply STOP to opt out."
    )
}

/// Scheduled prompt sent by the photo-prompt sweep.
pub fn photo_prompt_sms(first_name: &str, physician_last_name: Option<&str>) -> String {
    let doctor = match physician_last_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("Dr. {name} would like"),
        None => "Your doctor would like".to_string(),
    };
    format!(
        "Hi {first_name}! {doctor} an update on your wound healing progress.\n\n\
         Please reply to this message with a photo of your wound.\n\n\
         Tap the camera icon to attach a photo. Thank you!"
    )
}

pub fn photo_received_sms(first_name: &str) -> String {
    format!("Photo received, {first_name}! Your doctor will review it shortly. Thank you!")
}

pub fn attach_photo_hint_sms(first_name: &str) -> String {
    format!(
        "Hi {first_name}! Please attach a photo when you reply. \
         Tap the camera icon to take a photo or choose from your gallery."
    )
}

pub const PATIENT_NOT_FOUND_SMS: &str =
    "We couldn't find your patient record. Please contact your doctor's office.";

pub const UNSUPPORTED_MEDIA_SMS: &str =
    "Please send a photo (JPEG, PNG, or HEIC format). Video and other file types are not supported.";

pub const PHOTO_RECEIVE_ERROR_SMS: &str =
    "There was an error receiving your photo. Please try sending it again.";

pub const PHOTO_SAVE_ERROR_SMS: &str =
    "There was an error saving your photo. Please contact your doctor's office.";

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

pub fn password_reset_email(to: &str, first_name: &str, reset_url: &str, ttl_minutes: i64) -> OutgoingEmail {
    let greeting = if first_name.trim().is_empty() { "there" } else { first_name };
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your CollagenDirect password".to_string(),
        body: format!(
            "Hi {greeting},\n\n\
             Reset your password here:\n{reset_url}\n\n\
             This link expires in {ttl_minutes} minutes. If you did not request a reset, \
             you can ignore this email."
        ),
    }
}

// ---------------------------------------------------------------------------
// Physician digest
// ---------------------------------------------------------------------------

/// One order line in the physician status digest.
#[derive(Debug, Clone)]
pub struct DigestLine {
    pub order_id: i64,
    pub patient_name: String,
    pub product: Option<String>,
    pub status: String,
    pub tracking: Option<String>,
}

pub fn physician_digest_email(to: &str, physician_name: &str, lines: &[DigestLine]) -> OutgoingEmail {
    let count = lines.len();
    let plural = if count == 1 { "" } else { "s" };

    let mut body = format!(
        "Dear Dr. {physician_name},\n\nYou have {count} order update{plural} from CollagenDirect:\n\n"
    );
    for line in lines {
        body.push_str(&format!(
            "- Order #{} | {} | {} | {}",
            line.order_id,
            line.patient_name,
            line.product.as_deref().unwrap_or("-"),
            line.status.replace('_', " "),
        ));
        if let Some(tracking) = &line.tracking {
            body.push_str(&format!(" | Tracking: {tracking}"));
        }
        body.push('\n');
    }
    body.push_str("\nCollagenDirect");

    OutgoingEmail {
        to: to.to_string(),
        subject: format!("CollagenDirect: {count} Patient Order Update{plural}"),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_sms_names_patient_order_and_link() {
        let sms = delivery_confirmation_sms("Ada", 42, "https://x.test/confirm-delivery?token=t");
        assert_eq!(
            sms,
            "Hi Ada, CollagenDirect here. Please confirm delivery of your order #42: \
             https://x.test/confirm-delivery?token=t"
        );
    }

    #[test]
    fn prompt_falls_back_to_generic_doctor() {
        assert!(photo_prompt_sms("Ada", Some("Hopper")).contains("Dr. Hopper would like"));
        assert!(photo_prompt_sms("Ada", Some("  ")).contains("Your doctor would like"));
        assert!(photo_prompt_sms("Ada", None).starts_with("Hi Ada! Your doctor"));
    }

    #[test]
    fn digest_subject_pluralizes() {
        let line = DigestLine {
            order_id: 7,
            patient_name: "Ada Lovelace".to_string(),
            product: None,
            status: "delivered".to_string(),
            tracking: Some("1Z999AA10123456784".to_string()),
        };
        let one = physician_digest_email("doc@example.com", "Grace Hopper", std::slice::from_ref(&line));
        assert_eq!(one.subject, "CollagenDirect: 1 Patient Order Update");
        assert!(one.body.contains("Order #7 | Ada Lovelace | - | delivered | Tracking: 1Z999AA10123456784"));

        let two = physician_digest_email("doc@example.com", "Grace Hopper", &[line.clone(), line]);
        assert_eq!(two.subject, "CollagenDirect: 2 Patient Order Updates");
    }

    #[test]
    fn reset_email_greets_unknown_name_generically() {
        let email = password_reset_email("a@b.test", "", "https://x.test/portal/reset", 15);
        assert!(email.body.starts_with("Hi there,"));
        assert!(email.body.contains("expires in 15 minutes"));
    }
}
