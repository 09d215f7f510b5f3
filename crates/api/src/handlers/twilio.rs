//! Messaging provider webhooks.
//!
//! Both endpoints take the provider's form-encoded POST and always answer
//! 200 with TwiML. Errors are logged and turned into an apology (delivery
//! replies) or an empty acknowledgement (MMS, where the outcome is sent as a
//! separate SMS).

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::Form;
use serde::Deserialize;
use woundcare_core::delivery::{matches_confirmation_keyword, CONFIRMATION_WINDOW_DAYS};
use woundcare_core::phone::{mask, match_candidates};
use woundcare_db::repositories::{DeliveryConfirmationRepo, OrderRepo};
use woundcare_notify::templates;

use super::trimmed;
use crate::services::photo_intake::{process_mms, InboundMedia, InboundMms};
use crate::state::AppState;
use crate::twiml::Twiml;

/// Fields of an inbound message webhook. Other provider fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct InboundMessageForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "NumMedia")]
    pub num_media: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url0: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type0: Option<String>,
}

impl InboundMessageForm {
    fn media_count(&self) -> u32 {
        self.num_media
            .as_deref()
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// POST /api/v1/twilio/delivery-confirmation-reply
pub async fn delivery_confirmation_reply(
    State(state): State<AppState>,
    form: Result<Form<InboundMessageForm>, FormRejection>,
) -> Twiml {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed delivery reply webhook");
            return Twiml::message(templates::DELIVERY_REPLY_ERROR);
        }
    };
    let (Some(from), Some(body)) = (trimmed(form.from), trimmed(form.body)) else {
        return Twiml::message(templates::DELIVERY_REPLY_ERROR);
    };

    match handle_delivery_reply(&state, &from, &body).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(phone = %mask(&from), error = %e, "Delivery reply handling failed");
            Twiml::message(templates::DELIVERY_REPLY_ERROR)
        }
    }
}

/// POST /api/v1/twilio/receive-mms
pub async fn receive_mms(
    State(state): State<AppState>,
    form: Result<Form<InboundMessageForm>, FormRejection>,
) -> Twiml {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed MMS webhook");
            return Twiml::empty();
        }
    };
    let media_count = form.media_count();
    let Some(from) = trimmed(form.from) else {
        return Twiml::empty();
    };

    let media = if media_count > 0 {
        trimmed(form.media_url0).map(|url| InboundMedia {
            url,
            content_type: form.media_content_type0.unwrap_or_default(),
        })
    } else {
        None
    };
    let message = InboundMms {
        from,
        body: form.body.unwrap_or_default(),
        media,
    };

    match process_mms(&state, &message).await {
        Ok(outcome) => {
            tracing::debug!(phone = %mask(&message.from), ?outcome, "Inbound MMS processed");
        }
        Err(e) => {
            tracing::error!(phone = %mask(&message.from), error = %e, "Inbound MMS failed");
        }
    }
    Twiml::empty()
}

async fn handle_delivery_reply(
    state: &AppState,
    from: &str,
    body: &str,
) -> Result<Twiml, sqlx::Error> {
    let candidates = match_candidates(from);
    let Some(pending) = DeliveryConfirmationRepo::find_pending_for_phones(
        &state.pool,
        &candidates,
        CONFIRMATION_WINDOW_DAYS,
    )
    .await?
    else {
        tracing::info!(phone = %mask(from), "Delivery reply with no pending confirmation");
        return Ok(Twiml::message(templates::DELIVERY_REPLY_NO_PENDING));
    };

    if !matches_confirmation_keyword(body) {
        return Ok(Twiml::message(templates::DELIVERY_REPLY_INSTRUCTIONS));
    }

    if !DeliveryConfirmationRepo::confirm_sms_reply(&state.pool, pending.id, body).await? {
        return Ok(Twiml::message(templates::DELIVERY_REPLY_NO_PENDING));
    }

    let first_name = OrderRepo::delivery_context(&state.pool, pending.order_id)
        .await?
        .map(|ctx| ctx.patient_first_name)
        .unwrap_or_default();
    tracing::info!(order_id = pending.order_id, "Delivery confirmed by SMS reply");
    Ok(Twiml::message(&templates::delivery_reply_confirmed(
        &first_name,
    )))
}
