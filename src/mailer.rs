use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use std::sync::{Arc, Mutex};

// 1. MailService Contract
/// MailService
///
/// Defines the abstract contract for relaying contact-form submissions by
/// email. This trait allows us to swap the concrete implementation—from the
/// real SMTP client (SmtpMailer) in production to the in-memory Mock
/// (MockMailer) during testing—without affecting the calling handlers.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Assembles and relays one contact-form submission to the configured
    /// receiver address. The call blocks the contact request for the duration
    /// of the outbound connection; there is no retry or delivery confirmation.
    async fn send_contact_message(
        &self,
        name: &str,
        reply_email: &str,
        phone: &str,
        message: &str,
    ) -> Result<(), String>;
}

/// format_contact_body
///
/// Builds the plaintext mail body from the four contact-form fields. The
/// line layout is part of the observable behavior the receiver inbox sees.
pub fn format_contact_body(name: &str, reply_email: &str, phone: &str, message: &str) -> String {
    format!("Name: {name}\nEmail: {reply_email}\nMobile: {phone}\nMessage: {message}")
}

/// Subject line applied to every relayed contact message.
pub const CONTACT_SUBJECT: &str = "You are being contacted!!!";

// 2. The Real Implementation (SMTP)
/// SmtpMailer
///
/// The concrete implementation using lettre's async SMTP transport over
/// STARTTLS. The transport is built once at startup from AppConfig and
/// reused for every submission; the actual connection is established lazily
/// on the first send.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
    receiver: String,
}

impl SmtpMailer {
    /// new
    ///
    /// Constructs the SMTP client using the relay host and credentials from
    /// AppConfig. Fails only on an unusable relay host name.
    pub fn new(
        host: &str,
        sender: &str,
        password: &str,
        receiver: &str,
    ) -> Result<Self, String> {
        let credentials = Credentials::new(sender.to_string(), password.to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| e.to_string())?
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
        })
    }
}

#[async_trait]
impl MailService for SmtpMailer {
    /// send_contact_message
    ///
    /// Builds the MIME message and hands it to the relay. Any failure
    /// (address parsing, connection, rejection) is reported upward as-is;
    /// the handler maps it to a generic server error.
    async fn send_contact_message(
        &self,
        name: &str,
        reply_email: &str,
        phone: &str,
        message: &str,
    ) -> Result<(), String> {
        let body = format_contact_body(name, reply_email, phone, message);

        let email = Message::builder()
            .from(
                self.sender
                    .parse::<Mailbox>()
                    .map_err(|e| e.to_string())?,
            )
            .to(self
                .receiver
                .parse::<Mailbox>()
                .map_err(|e| e.to_string())?)
            .subject(CONTACT_SUBJECT)
            .body(body)
            .map_err(|e| e.to_string())?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockMailer
///
/// A mock implementation of `MailService` used exclusively for unit and
/// integration testing. It records every assembled body so tests can assert
/// on what would have been relayed, without a network connection.
#[derive(Default)]
pub struct MockMailer {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    /// Bodies of every message "sent" through this mock, in order.
    pub sent: Mutex<Vec<String>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MailService for MockMailer {
    async fn send_contact_message(
        &self,
        name: &str,
        reply_email: &str,
        phone: &str,
        message: &str,
    ) -> Result<(), String> {
        if self.should_fail {
            return Err("Mock Mail Error: simulation requested".to_string());
        }

        self.sent
            .lock()
            .expect("mock mailer lock poisoned")
            .push(format_contact_body(name, reply_email, phone, message));
        Ok(())
    }
}

/// MailerState
///
/// The concrete type used to share the mail service access across the
/// application state.
pub type MailerState = Arc<dyn MailService>;
