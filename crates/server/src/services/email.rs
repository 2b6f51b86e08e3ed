//! Email service for verification and password-reset codes.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Without SMTP
//! settings the service logs each code instead, which is enough for local
//! development.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::services::otp::OTP_TTL_MINUTES;

#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    code: &'a str,
    ttl_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<Mailer>,
}

impl EmailService {
    /// Create a new email service. `None` selects log-only delivery.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&SmtpConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("SMTP not configured; one-time codes will be logged, not emailed");
            return Ok(Self { mailer: None });
        };

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(Mailer {
                transport,
                from_address: config.from_address.clone(),
            }),
        })
    }

    /// Send an account verification code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let ttl_minutes = OTP_TTL_MINUTES;
        let html = VerificationCodeEmailHtml { code, ttl_minutes }.render()?;
        let text = VerificationCodeEmailText { code, ttl_minutes }.render()?;

        self.deliver(to, "Your Live MART Verification Code", code, &text, &html)
            .await
    }

    /// Send a password reset code.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let ttl_minutes = OTP_TTL_MINUTES;
        let html = PasswordResetEmailHtml { code, ttl_minutes }.render()?;
        let text = PasswordResetEmailText { code, ttl_minutes }.render()?;

        self.deliver(to, "Live MART Password Reset", code, &text, &html)
            .await
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        code: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        match &self.mailer {
            Some(mailer) => {
                mailer
                    .send_multipart_email(to, subject, text_body, html_body)
                    .await
            }
            None => {
                tracing::info!(to = %to, subject = %subject, code = %code, "email delivery disabled");
                Ok(())
            }
        }
    }
}

impl Mailer {
    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.transport.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_templates_include_code() {
        let html = VerificationCodeEmailHtml {
            code: "482913",
            ttl_minutes: 10,
        }
        .render()
        .unwrap();
        let text = VerificationCodeEmailText {
            code: "482913",
            ttl_minutes: 10,
        }
        .render()
        .unwrap();

        assert!(html.contains("482913"));
        assert!(text.contains("482913"));
        assert!(text.contains("10 minutes"));
    }

    #[test]
    fn test_password_reset_templates_include_code() {
        let text = PasswordResetEmailText {
            code: "000111",
            ttl_minutes: 10,
        }
        .render()
        .unwrap();
        assert!(text.contains("000111"));
    }

    #[tokio::test]
    async fn test_log_only_delivery_succeeds() {
        let service = EmailService::new(None).unwrap();
        assert!(
            service
                .send_verification_code("someone@example.com", "123456")
                .await
                .is_ok()
        );
    }
}
