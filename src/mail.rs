//! Outbound delivery of ADF documents over SMTP.
use crate::config::{MailSettings, SmtpSettings};
use crate::google::secrets::MailCredentials;
use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Instant;

/// Sends one rendered document to the configured recipient.
pub trait MailDispatcher {
    fn send(&self, xml: &str) -> Result<()>;
}

/// STARTTLS relay authenticated with the secret's mail login.
pub struct SmtpDispatcher {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
    subject: String,
    host: String,
}

impl SmtpDispatcher {
    pub fn new(smtp: &SmtpSettings, mail: &MailSettings, creds: &MailCredentials) -> Result<Self> {
        let from: Mailbox = creds
            .email
            .parse()
            .with_context(|| format!("parse sender address {:?}", creds.email))?;
        let to: Mailbox = mail
            .recipient
            .parse()
            .with_context(|| format!("parse recipient address {:?}", mail.recipient))?;
        let transport = SmtpTransport::starttls_relay(&smtp.host)
            .with_context(|| format!("configure SMTP relay {}", smtp.host))?
            .port(smtp.port)
            .credentials(Credentials::new(
                creds.email.clone(),
                creds.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from,
            to,
            subject: mail.subject.clone(),
            host: smtp.host.clone(),
        })
    }
}

impl MailDispatcher for SmtpDispatcher {
    fn send(&self, xml: &str) -> Result<()> {
        let start = Instant::now();
        let message = build_message(&self.from, &self.to, &self.subject, xml)?;
        self.transport
            .send(&message)
            .with_context(|| format!("send lead email via {}", self.host))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            recipient = %self.to,
            body_bytes = xml.len(),
            "lead email sent"
        );
        Ok(())
    }
}

/// Single-part `text/plain` message carrying the XML verbatim.
pub fn build_message(from: &Mailbox, to: &Mailbox, subject: &str, xml: &str) -> Result<Message> {
    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(xml.to_string())
        .context("build lead email")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailbox(addr: &str) -> Mailbox {
        addr.parse().unwrap()
    }

    #[test]
    fn message_is_plain_text_to_single_recipient() {
        let message = build_message(
            &mailbox("leads@acme.test"),
            &mailbox("receiver@example.com"),
            "New Lead Submission",
            "<adf/>",
        )
        .unwrap();

        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "receiver@example.com");
        assert_eq!(
            envelope.from().map(|addr| addr.to_string()).as_deref(),
            Some("leads@acme.test")
        );

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New Lead Submission"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(!raw.contains("multipart"));
    }

    #[test]
    fn invalid_sender_is_rejected_up_front() {
        let creds = MailCredentials {
            email: "not an address".to_string(),
            password: "x".to_string(),
        };
        let result = SmtpDispatcher::new(&SmtpSettings::default(), &MailSettings::default(), &creds);
        let err = result.err().expect("sender should not parse");
        assert!(err.to_string().contains("sender"));
    }
}
