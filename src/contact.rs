//! Contact form pipeline: validation, inquiry folding, outbound email.
//!
//! Failures fall into exactly three categories so the UI can react precisely:
//! field-level validation errors surface next to the relevant input, a send
//! failure surfaces a general submission error, and anything else collapses
//! into a single unexpected-error fallback. The outbound email is only sent
//! after validation passes - there is no partial side effect.

use crate::config::Config;
use crate::inquiry::{parse_inquiry_param, InquiryItem};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// A submitted contact form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactSubmission {
    #[validate(length(min = 1, message = "Name is required"))]
    #[serde(default)]
    pub name: String,

    #[validate(email(message = "Enter a valid email address"))]
    #[serde(default)]
    pub email: String,

    #[validate(length(min = 1, message = "Message is required"))]
    #[serde(default)]
    pub message: String,

    /// Raw inquiry-list value carried over from the products page
    #[serde(default)]
    pub inquiry: Option<String>,
}

/// One validation failure, attached to a specific input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The three failure categories of a contact submission.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("email delivery failed: {0}")]
    Send(String),

    #[error("unexpected error")]
    Unexpected(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct SendEmailRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
    reply_to: String,
}

/// Client for the outbound transactional email API.
#[derive(Debug, Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    to: String,
}

impl EmailClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            http,
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
            to: config.email_to.clone(),
        })
    }

    /// Send one email through the HTTP API.
    async fn send(&self, subject: &str, html: &str, reply_to: &str) -> Result<(), ContactError> {
        let request = SendEmailRequest {
            from: self.from.clone(),
            to: vec![self.to.clone()],
            subject: subject.to_string(),
            html: html.to_string(),
            reply_to: reply_to.to_string(),
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ContactError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContactError::Send(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }
}

/// Validate a submission, returning field-level errors in a stable order.
pub fn validate_submission(submission: &ContactSubmission) -> Result<(), ContactError> {
    match submission.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut fields: Vec<FieldError> = errors
                .field_errors()
                .iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| FieldError {
                        field: field.to_string(),
                        message: error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string()),
                    })
                })
                .collect();
            fields.sort_by(|a, b| a.field.cmp(&b.field));
            Err(ContactError::Validation(fields))
        }
    }
}

/// Process a contact submission end to end: validate, compose, send.
pub async fn submit_contact(
    client: &EmailClient,
    submission: &ContactSubmission,
) -> Result<(), ContactError> {
    validate_submission(submission)?;

    let inquiry_items = parse_inquiry_param(submission.inquiry.as_deref());
    let html = compose_email_html(submission, &inquiry_items);
    let subject = if inquiry_items.is_empty() {
        format!("Contact form: {}", submission.name)
    } else {
        format!(
            "Quote request ({} products): {}",
            inquiry_items.len(),
            submission.name
        )
    };

    client.send(&subject, &html, &submission.email).await?;

    info!(
        "Contact submission delivered (inquiry items: {})",
        inquiry_items.len()
    );
    Ok(())
}

/// Compose the notification email body.
fn compose_email_html(submission: &ContactSubmission, inquiry: &[InquiryItem]) -> String {
    let mut html = format!(
        "<h2>New contact submission</h2>\
         <p><b>Name:</b> {}</p>\
         <p><b>Email:</b> {}</p>\
         <p><b>Message:</b></p><p>{}</p>",
        escape_html(&submission.name),
        escape_html(&submission.email),
        escape_html(&submission.message).replace('\n', "<br/>")
    );

    if !inquiry.is_empty() {
        html.push_str("<h3>Requested products</h3><ul>");
        for item in inquiry {
            html.push_str(&format!(
                "<li>{} ({})</li>",
                escape_html(&item.name),
                escape_html(&item.id)
            ));
        }
        html.push_str("</ul>");
    }

    html
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
