mod common;

use std::sync::Arc;

use perfume_storefront::{
    dto::contact::{ContactRequest, NewsletterSubscribeRequest},
    entity::contacts::ContactSubject,
    error::AppError,
    notify::{Notifier, NotifyError},
    services::contact_service,
};

use common::setup_state;

struct DownMailer;

impl Notifier for DownMailer {
    fn notify(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Delivery("smtp unreachable".to_string()))
    }
}

fn contact_form() -> ContactRequest {
    ContactRequest {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        subject: ContactSubject::Order,
        message: "Where is my parcel?".to_string(),
    }
}

#[tokio::test]
async fn contact_message_is_kept_when_notification_fails() -> anyhow::Result<()> {
    let state = setup_state().await?.with_notifier(Arc::new(DownMailer));

    let reply = contact_service::submit_contact(&state, contact_form()).await?;
    assert!(reply.success);
    assert!(!reply.notified);
    Ok(())
}

#[tokio::test]
async fn contact_message_notifies_staff() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let reply = contact_service::submit_contact(&state, contact_form()).await?;
    assert!(reply.notified);
    assert_eq!(
        reply.message,
        "Thank you for your message! We will get back to you soon."
    );

    let mut invalid = contact_form();
    invalid.email = "nope".to_string();
    let rejected = contact_service::submit_contact(&state, invalid).await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn newsletter_subscription_is_idempotent() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let request = || NewsletterSubscribeRequest {
        email: "Fan@Example.com".to_string(),
    };

    let first = contact_service::subscribe_newsletter(&state, request()).await?;
    assert_eq!(first.message, "Thank you for subscribing!");

    let second = contact_service::subscribe_newsletter(&state, request()).await?;
    assert_eq!(second.message, "You are already subscribed.");
    Ok(())
}
