//! Transactional email via SMTP with Askama HTML/text templates.
//!
//! Order confirmations and password resets. Sending is best-effort from the
//! caller's point of view: a failed send is logged upstream and never rolls
//! back the operation that triggered it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use thockshop_core::Email;

use crate::config::MailConfig;
use crate::models::order::Order;

/// A rendered order line for the confirmation email.
struct OrderEmailLine {
    title: String,
    quantity: i32,
    line_total: String,
}

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    lines: &'a [OrderEmailLine],
    total: String,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_number: &'a str,
    lines: &'a [OrderEmailLine],
    total: String,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    reset_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    reset_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay configuration is invalid.
    pub fn new(config: &MailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send an order confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be rendered, built or sent.
    pub async fn send_order_confirmation(
        &self,
        to: &Email,
        order: &Order,
    ) -> Result<(), MailError> {
        let lines: Vec<OrderEmailLine> = order
            .items
            .iter()
            .map(|item| OrderEmailLine {
                title: format!("{} ({})", item.product_title, item.variant_title),
                quantity: item.quantity,
                line_total: item
                    .price
                    .times(u32::try_from(item.quantity).unwrap_or(0))
                    .to_string(),
            })
            .collect();
        let total = order.total.to_string();

        let html = OrderConfirmationHtml {
            order_number: &order.order_number,
            lines: &lines,
            total: total.clone(),
        }
        .render()?;
        let text = OrderConfirmationText {
            order_number: &order.order_number,
            lines: &lines,
            total,
        }
        .render()?;

        self.send_multipart(
            to.as_str(),
            &format!("Your Thockshop order {}", order.order_number),
            &text,
            &html,
        )
        .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be rendered, built or sent.
    pub async fn send_password_reset(&self, to: &Email, reset_url: &str) -> Result<(), MailError> {
        let html = PasswordResetHtml { reset_url }.render()?;
        let text = PasswordResetText { reset_url }.render()?;

        self.send_multipart(to.as_str(), "Reset your Thockshop password", &text, &html)
            .await
    }

    /// Build and send a multipart (text + HTML) message.
    async fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_owned()),
                    ),
            )?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
