use inkpot::mailer::{CONTACT_SUBJECT, MailService, MockMailer, SmtpMailer, format_contact_body};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_assembled_body() {
        let mock = MockMailer::new();
        let result = mock
            .send_contact_message("Jane Doe", "jane@example.com", "0871234567", "Hello there")
            .await;
        assert!(result.is_ok());

        let sent = mock.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Name: Jane Doe"));
        assert!(sent[0].contains("Email: jane@example.com"));
        assert!(sent[0].contains("Mobile: 0871234567"));
        assert!(sent[0].contains("Message: Hello there"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockMailer::new_failing();
        let result = mock
            .send_contact_message("Jane", "jane@example.com", "0", "Hi")
            .await;
        assert!(result.is_err());

        // A failed send records nothing.
        assert!(mock.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_body_layout_is_line_per_field() {
        let body = format_contact_body("Jane", "jane@example.com", "0871234567", "Hi");
        assert_eq!(
            body,
            "Name: Jane\nEmail: jane@example.com\nMobile: 0871234567\nMessage: Hi"
        );
    }

    #[test]
    fn test_contact_subject_text() {
        assert_eq!(CONTACT_SUBJECT, "You are being contacted!!!");
    }
}

#[cfg(test)]
mod smtp_tests {
    use super::*;

    #[tokio::test]
    async fn test_smtp_mailer_construction() {
        // Just testing that building the transport from config-shaped inputs
        // succeeds; no connection is made until the first send.
        let mailer = SmtpMailer::new(
            "localhost",
            "sender@example.com",
            "app-password",
            "inbox@example.com",
        );
        assert!(mailer.is_ok());
    }
}
