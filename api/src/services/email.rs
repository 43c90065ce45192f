//! Outgoing email over SMTP. Sends are fire-and-forget: failures are logged
//! and never reach the request that triggered them.

use anyhow::{Context, Result};
use askama::Template;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shared::{PasswordResetEmail, SmtpConfig, WelcomeEmail};
use tracing::{error, info};

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("Invalid SMTP relay")?
            .port(config.port)
            .credentials(creds)
            .build();
        let from = config.from.parse().context("Invalid EMAIL_FROM address")?;

        Ok(Self { transport, from })
    }

    pub async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(email).await?;
        Ok(())
    }

    /// Sends in the background.
    pub fn spawn_send(&self, to: String, subject: &'static str, html: String) {
        let mailer = self.clone();
        tokio::spawn(async move {
            match mailer.send_html(&to, subject, html).await {
                Ok(()) => info!("Email '{}' sent", subject),
                Err(e) => error!("Could not send email '{}': {:?}", subject, e),
            }
        });
    }
}

pub fn render_welcome(name: &str, app_base_url: &str) -> Result<String> {
    let dashboard_url = format!("{}/dashboard", app_base_url.trim_end_matches('/'));
    Ok(WelcomeEmail {
        name,
        dashboard_url: &dashboard_url,
    }
    .render()?)
}

pub fn render_password_reset(name: &str, app_base_url: &str, token: &str, valid_minutes: i64) -> Result<String> {
    let reset_url = format!(
        "{}/reset-password?token={}",
        app_base_url.trim_end_matches('/'),
        token
    );
    Ok(PasswordResetEmail {
        name,
        reset_url: &reset_url,
        valid_minutes,
    }
    .render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_links_to_dashboard() {
        let html = render_welcome("Sam", "https://tradelog.app/").unwrap();
        assert!(html.contains("Hi Sam"));
        assert!(html.contains("dashboard"));
    }
}
