use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::contact::{
        ContactRequest, ContactResponse, NewsletterSubscribeRequest, NewsletterSubscribeResponse,
    },
    entity::{
        contacts::{self, ActiveModel as ContactActive},
        newsletter_subscribers::{
            ActiveModel as SubscriberActive, Column as SubscriberCol, Entity as Subscribers,
        },
    },
    error::AppResult,
    services::{auth_service::normalize_email, cart_service::is_unique_violation},
    state::AppState,
};

fn notification_body(contact: &contacts::Model) -> String {
    format!(
        "Name: {}\nEmail: {}\nSubject: {}\n\nMessage:\n{}",
        contact.name,
        contact.email,
        contact.subject.label(),
        contact.message
    )
}

/// Store a contact-form message and notify staff.
///
/// Delivery failure is logged and reported in the reply; the message stays saved.
pub async fn submit_contact(state: &AppState, payload: ContactRequest) -> AppResult<ContactResponse> {
    payload.validate()?;

    let contact = ContactActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_string()),
        subject: Set(payload.subject),
        message: Set(payload.message),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    let subject = format!("Contact Form: {}", contact.subject.label());
    let notified = match state.notifier.notify(
        &state.config.contact_email,
        &subject,
        &notification_body(&contact),
    ) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, contact_id = %contact.id, "contact notification failed");
            false
        }
    };

    let message = if notified {
        "Thank you for your message! We will get back to you soon."
    } else {
        "Thank you for your message! It has been saved, but staff could not be notified right away."
    };

    Ok(ContactResponse {
        success: true,
        message: message.to_string(),
        id: contact.id,
        notified,
    })
}

/// Subscribe an address; repeating the call for the same address is a no-op.
pub async fn subscribe_newsletter(
    state: &AppState,
    payload: NewsletterSubscribeRequest,
) -> AppResult<NewsletterSubscribeResponse> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    let existing = Subscribers::find()
        .filter(SubscriberCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;

    let message = match existing {
        Some(subscriber) if subscriber.is_active => "You are already subscribed.",
        Some(subscriber) => {
            let mut active: SubscriberActive = subscriber.into();
            active.is_active = Set(true);
            active.update(&state.orm).await?;
            "Welcome back! Your subscription has been renewed."
        }
        None => {
            let inserted = SubscriberActive {
                id: Set(Uuid::new_v4()),
                email: Set(email),
                is_active: Set(true),
                token: Set(Uuid::new_v4().to_string()),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await;
            match inserted {
                Ok(_) => "Thank you for subscribing!",
                Err(err) if is_unique_violation(&err) => "You are already subscribed.",
                Err(err) => return Err(err.into()),
            }
        }
    };

    Ok(NewsletterSubscribeResponse {
        success: true,
        message: message.to_string(),
    })
}
