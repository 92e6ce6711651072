/**
 * Contact Route
 * Forwards inquiry form submissions to the studio inbox
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::content::{lists::non_blank, required};
use crate::error::{respond, ApiError, ValidationErrors};
use crate::mail::OutboundEmail;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: Option<String>,
    /// Event date as typed by the visitor.
    pub date: Option<String>,
    /// Email address or phone number.
    pub contact: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: &'static str,
}

impl ContactRequest {
    fn into_email(self) -> Result<OutboundEmail, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", self.name);
        let contact = required(&mut errors, "contact", self.contact);
        let message = required(&mut errors, "message", self.message);
        errors.into_result()?;

        let date = non_blank(self.date).unwrap_or_else(|| "-".to_string());
        let service = non_blank(self.service).unwrap_or_else(|| "-".to_string());

        let body = format!(
            "Name: {}\nDate: {}\nContact: {}\nService: {}\n\n{}\n",
            name, date, contact, service, message
        );

        Ok(OutboundEmail {
            subject: format!("New inquiry from {}", name),
            body,
            reply_to: contact.contains('@').then(|| contact.clone()),
        })
    }
}

/// POST /api/contact
pub async fn send_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let email = request.into_email()?;

    state
        .mailer
        .send(&email)
        .await
        .map_err(|e| ApiError::Mail(e.to_string()))?;

    tracing::info!(subject = %email.subject, "contact inquiry relayed");
    Ok(respond(
        StatusCode::OK,
        ContactResponse {
            message: "Email sent successfully",
        },
    ))
}
