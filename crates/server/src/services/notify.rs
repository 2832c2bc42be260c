//! Post-commit order notifications.
//!
//! Dispatch is fire-and-forget: the order is already committed when this
//! runs, so every channel is best-effort and no failure here may propagate
//! back to the caller. Results are logged for observability only.

use std::sync::Arc;

use serde::Serialize;

use crate::models::OrderDetails;

use super::email::Mailer;

/// A notification channel attempted for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationChannel {
    CustomerEmail,
    AdminEmail,
    Sms,
}

/// Dispatches best-effort order notifications.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    admin_recipients: Vec<String>,
}

impl NotificationDispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, admin_recipients: Vec<String>) -> Self {
        Self {
            mailer,
            admin_recipients,
        }
    }

    /// Kick off notifications for a committed order and return the list of
    /// attempted channels.
    ///
    /// The sends run on a detached task; the HTTP response never waits on
    /// delivery, and failures are logged and dropped.
    pub fn dispatch(&self, details: &OrderDetails) -> Vec<NotificationChannel> {
        let channels = self.plan(details);

        let dispatcher = self.clone();
        let details = details.clone();
        let planned = channels.clone();
        tokio::spawn(async move {
            dispatcher.send_all(&details, &planned).await;
        });

        channels
    }

    /// Decide which channels apply to this order.
    fn plan(&self, details: &OrderDetails) -> Vec<NotificationChannel> {
        let mut channels = Vec::new();
        let preference = details.order.metadata.notification_preference;

        if preference.wants_email() && recipient_email(details).is_some() {
            channels.push(NotificationChannel::CustomerEmail);
        }

        // Admin notification is unconditional.
        channels.push(NotificationChannel::AdminEmail);

        if preference.wants_sms() && details.customer.is_some() {
            channels.push(NotificationChannel::Sms);
        }

        channels
    }

    /// Perform the planned sends. Each channel is independent; a failure in
    /// one never prevents the others.
    async fn send_all(&self, details: &OrderDetails, channels: &[NotificationChannel]) {
        let order_id = details.order.id;

        for channel in channels {
            match channel {
                NotificationChannel::CustomerEmail => {
                    let Some(to) = recipient_email(details) else {
                        continue;
                    };
                    let subject = format!("Confirmation de commande #{order_id} - Café Lagune");
                    match self
                        .mailer
                        .send(&to, &subject, &confirmation_body(details))
                        .await
                    {
                        Ok(()) => {
                            tracing::info!(%order_id, to = %to, "Customer confirmation sent");
                        }
                        Err(e) => {
                            tracing::warn!(%order_id, to = %to, error = %e, "Customer confirmation failed");
                        }
                    }
                }
                NotificationChannel::AdminEmail => {
                    let subject = format!("Nouvelle commande #{order_id}");
                    let body = admin_body(details);
                    for admin in &self.admin_recipients {
                        if let Err(e) = self.mailer.send(admin, &subject, &body).await {
                            tracing::warn!(%order_id, to = %admin, error = %e, "Admin notification failed");
                        }
                    }
                }
                NotificationChannel::Sms => {
                    // SMS delivery has no provider yet; the channel is
                    // planned so the metadata reflects the request.
                    tracing::info!(%order_id, "SMS notification requested but no provider is configured");
                }
            }
        }
    }
}

/// The email address a customer confirmation should go to, if any.
fn recipient_email(details: &OrderDetails) -> Option<String> {
    details
        .customer
        .as_ref()
        .and_then(|c| c.email.clone())
        .or_else(|| details.user.as_ref().map(|u| u.email.clone()))
}

/// The customer-facing name on the order.
fn recipient_name(details: &OrderDetails) -> String {
    details.customer.as_ref().map_or_else(
        || {
            details
                .user
                .as_ref()
                .map_or_else(|| "client".to_owned(), |u| u.name.clone())
        },
        |c| c.name.clone(),
    )
}

fn item_lines(details: &OrderDetails) -> String {
    details
        .items
        .iter()
        .map(|item| {
            format!(
                "  - {} x{} ({})",
                item.product_name,
                item.quantity,
                item.line_total()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn confirmation_body(details: &OrderDetails) -> String {
    format!(
        "Bonjour {},\n\nNous avons bien reçu votre commande #{}.\n\n{}\n\nTotal : {}\n\n\
         Vous pouvez suivre votre commande avec votre numéro de téléphone.\n\nCafé Lagune",
        recipient_name(details),
        details.order.id,
        item_lines(details),
        details.order.total_price,
    )
}

fn admin_body(details: &OrderDetails) -> String {
    format!(
        "Commande #{} ({})\n\nClient : {}\n\n{}\n\nTotal : {}\n\nNotes : {}",
        details.order.id,
        details.order.status,
        recipient_name(details),
        item_lines(details),
        details.order.total_price,
        details.notes(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use cafe_lagune_core::{
        CustomerId, NotificationPreference, OrderId, OrderItemId, OrderStatus, Price, ProductId,
    };

    use crate::models::order::{Order, OrderIdentityKind, OrderItem, OrderMetadata};
    use crate::models::{Customer, OrderDetails};
    use crate::services::email::EmailError;

    use super::*;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), EmailError> {
            self.sent
                .lock()
                .expect("lock")
                .push((to.to_owned(), subject.to_owned()));
            if self.fail {
                Err(EmailError::InvalidAddress(to.to_owned()))
            } else {
                Ok(())
            }
        }
    }

    fn guest_details(
        email: Option<&str>,
        preference: NotificationPreference,
    ) -> OrderDetails {
        let now = Utc::now();
        OrderDetails {
            order: Order {
                id: OrderId::new(1),
                user_id: None,
                customer_id: Some(CustomerId::new(1)),
                status: OrderStatus::Pending,
                total_price: Price::new(4000),
                metadata: OrderMetadata {
                    source: "web".to_owned(),
                    identity_kind: OrderIdentityKind::Guest,
                    delivery_address: None,
                    notification_preference: preference,
                    customer_notes: None,
                },
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(1),
                product_id: ProductId::new(5),
                product_name: "Moka d'Abidjan".to_owned(),
                product_image_url: None,
                quantity: 2,
                unit_price: Price::new(2000),
            }],
            customer: Some(Customer {
                id: CustomerId::new(1),
                name: "Jean".to_owned(),
                email: email.map(str::to_owned),
                phone: "0712345678".to_owned(),
                created_at: now,
            }),
            user: None,
        }
    }

    fn dispatcher(mailer: &Arc<RecordingMailer>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            Arc::clone(mailer) as Arc<dyn Mailer>,
            vec!["admin@cafelagune.ci".to_owned()],
        )
    }

    #[test]
    fn test_plan_includes_customer_email_when_known() {
        let mailer = Arc::new(RecordingMailer::default());
        let channels = dispatcher(&mailer)
            .plan(&guest_details(Some("jean@example.ci"), NotificationPreference::Email));
        assert_eq!(
            channels,
            vec![
                NotificationChannel::CustomerEmail,
                NotificationChannel::AdminEmail
            ]
        );
    }

    #[test]
    fn test_plan_skips_customer_email_without_address() {
        let mailer = Arc::new(RecordingMailer::default());
        let channels =
            dispatcher(&mailer).plan(&guest_details(None, NotificationPreference::Email));
        assert_eq!(channels, vec![NotificationChannel::AdminEmail]);
    }

    #[test]
    fn test_plan_adds_sms_when_requested() {
        let mailer = Arc::new(RecordingMailer::default());
        let channels = dispatcher(&mailer)
            .plan(&guest_details(Some("jean@example.ci"), NotificationPreference::Both));
        assert_eq!(
            channels,
            vec![
                NotificationChannel::CustomerEmail,
                NotificationChannel::AdminEmail,
                NotificationChannel::Sms
            ]
        );
    }

    #[tokio::test]
    async fn test_send_all_delivers_customer_and_admin_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = dispatcher(&mailer);
        let details = guest_details(Some("jean@example.ci"), NotificationPreference::Email);
        let channels = dispatcher.plan(&details);

        dispatcher.send_all(&details, &channels).await;

        let sent = mailer.sent.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "jean@example.ci");
        assert_eq!(sent[1].0, "admin@cafelagune.ci");
    }

    #[tokio::test]
    async fn test_send_all_swallows_failures() {
        let mailer = Arc::new(RecordingMailer {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let dispatcher = dispatcher(&mailer);
        let details = guest_details(Some("jean@example.ci"), NotificationPreference::Email);
        let channels = dispatcher.plan(&details);

        // Must not panic or propagate: failures are logged and dropped.
        dispatcher.send_all(&details, &channels).await;

        assert_eq!(mailer.sent.lock().expect("lock").len(), 2);
    }
}
