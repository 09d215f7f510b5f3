//! Server-rendered HTML pages for patients and users without a portal session:
//! password reset forms, delivery confirmation results and the photo upload form.
//!
//! Every interpolated value goes through [`escape_html`].

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

/// Escape text for inclusion in HTML element bodies and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A rendered page with its status code.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub title: String,
    /// Pre-escaped body markup.
    pub body: String,
}

impl Page {
    fn new(status: StatusCode, title: &str, body: String) -> Self {
        Self {
            status,
            title: title.to_string(),
            body,
        }
    }

    /// A heading plus one paragraph of (escaped) text.
    pub fn message(status: StatusCode, title: &str, text: &str) -> Self {
        Self::new(
            status,
            title,
            format!(
                "<h1>{}</h1><p>{}</p>",
                escape_html(title),
                escape_html(text)
            ),
        )
    }

    pub fn render(&self) -> String {
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>{} | CollagenDirect</title></head>\
             <body><main class=\"card\">{}</main></body></html>",
            escape_html(&self.title),
            self.body
        )
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        (self.status, Html(self.render())).into_response()
    }
}

// ---------------------------------------------------------------------------
// Password reset
// ---------------------------------------------------------------------------

/// Posts `{email}` as JSON to the reset request endpoint.
pub fn forgot_password() -> Page {
    Page::new(
        StatusCode::OK,
        "Forgot Password",
        r#"<h1>Forgot Password</h1>
<p>Enter your account email and we will send you a reset link.</p>
<form id="forgot"><label>Email <input type="email" name="email" required></label>
<button type="submit">Send reset link</button></form>
<p id="result" role="status"></p>
<script>
document.getElementById('forgot').addEventListener('submit', async (e) => {
  e.preventDefault();
  await fetch('/api/v1/auth/request-reset', {method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({email: e.target.email.value})});
  document.getElementById('result').textContent =
    'If that email is registered, a reset link is on its way.';
});
</script>"#
            .to_string(),
    )
}

/// Posts `{selector, token, password, confirm}` as JSON to the reset endpoint.
pub fn reset_password(selector: &str, token: &str) -> Page {
    Page::new(
        StatusCode::OK,
        "Reset Password",
        format!(
            r#"<h1>Reset Password</h1>
<form id="reset">
<input type="hidden" name="selector" value="{selector}">
<input type="hidden" name="token" value="{token}">
<label>New password <input type="password" name="password" required minlength="8"></label>
<label>Confirm password <input type="password" name="confirm" required minlength="8"></label>
<button type="submit">Set password</button></form>
<p id="result" role="status"></p>
<script>
document.getElementById('reset').addEventListener('submit', async (e) => {{
  e.preventDefault();
  const f = e.target;
  const res = await fetch('/api/v1/auth/reset-password', {{method: 'POST',
    headers: {{'Content-Type': 'application/json'}},
    body: JSON.stringify({{selector: f.selector.value, token: f.token.value,
      password: f.password.value, confirm: f.confirm.value}})}});
  const body = await res.json();
  document.getElementById('result').textContent =
    res.ok ? 'Your password has been updated. You can now sign in.' : body.error;
}});
</script>"#,
            selector = escape_html(selector),
            token = escape_html(token),
        ),
    )
}

// ---------------------------------------------------------------------------
// Delivery confirmation
// ---------------------------------------------------------------------------

pub fn delivery_confirmed(patient_first_name: &str, order_id: i64) -> Page {
    Page::message(
        StatusCode::OK,
        "Delivery Confirmed",
        &format!(
            "Thank you, {patient_first_name}! We have recorded that order #{order_id} was delivered."
        ),
    )
}

/// Confirmation page for the email link, naming the prescribing physician.
pub fn delivery_confirmed_with_physician(
    patient_name: &str,
    physician_name: &str,
    order_id: i64,
) -> Page {
    Page::message(
        StatusCode::OK,
        "Delivery Confirmed",
        &format!(
            "Thank you, {patient_name}! Delivery of order #{order_id} from Dr. {physician_name} is confirmed."
        ),
    )
}

pub fn already_confirmed() -> Page {
    Page::message(
        StatusCode::OK,
        "Already Confirmed",
        "This delivery has already been confirmed. No further action is needed.",
    )
}

pub fn link_expired() -> Page {
    Page::message(
        StatusCode::GONE,
        "Link Expired",
        "This confirmation link has expired. Please contact us if you have questions about your order.",
    )
}

pub fn missing_token() -> Page {
    Page::message(
        StatusCode::BAD_REQUEST,
        "Invalid Link",
        "This link is missing its confirmation code.",
    )
}

pub fn unknown_link() -> Page {
    Page::message(
        StatusCode::NOT_FOUND,
        "Invalid Link",
        "We could not find this link. It may have been mistyped.",
    )
}

pub fn server_error() -> Page {
    Page::message(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something Went Wrong",
        "We could not process your request. Please try again later.",
    )
}

// ---------------------------------------------------------------------------
// Photo upload
// ---------------------------------------------------------------------------

/// Multipart upload form for a photo request token.
pub fn upload_form(token: &str, wound_location: Option<&str>) -> Page {
    let location = wound_location
        .map(|w| format!("<p>Wound location: {}</p>", escape_html(w)))
        .unwrap_or_default();
    Page::new(
        StatusCode::OK,
        "Upload Wound Photo",
        format!(
            r#"<h1>Upload Wound Photo</h1>{location}
<form method="post" action="/upload/{token}" enctype="multipart/form-data">
<label>Photo <input type="file" name="photo" accept="image/jpeg,image/png,image/heic,image/heif" required></label>
<label>Notes <textarea name="notes" maxlength="1000"></textarea></label>
<button type="submit">Upload</button></form>"#,
            token = escape_html(token),
        ),
    )
}

pub fn upload_complete() -> Page {
    Page::message(
        StatusCode::OK,
        "Photo Received",
        "Thank you! Your wound photo was received and will be reviewed by your care team.",
    )
}

pub fn upload_link_expired() -> Page {
    Page::message(
        StatusCode::GONE,
        "Link Expired",
        "This upload link has expired or was already used.",
    )
}
