//! Identity resolution for incoming orders.
//!
//! Decides, before any write happens, whether the order belongs to a
//! registered account, a guest contact, or both. The actual guest-contact
//! upsert runs later inside the order transaction.

use cafe_lagune_core::{Email, Phone, UserId};

use crate::models::CurrentUser;

use super::OrderError;

/// A guest contact to create or update, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestContactDraft {
    pub name: String,
    pub phone: Phone,
    pub email: Option<Email>,
}

/// The resolved identity of an order.
///
/// By construction an order always has at least one attached identity; an
/// order with neither is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderIdentity {
    /// Authenticated account, optionally with delivery contact details for
    /// phone-based tracking.
    Account {
        user_id: UserId,
        email: String,
        contact: Option<GuestContactDraft>,
    },
    /// Unauthenticated guest; name and phone are mandatory.
    Guest { contact: GuestContactDraft },
}

impl OrderIdentity {
    /// The account id, if the order belongs to a registered account.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Account { user_id, .. } => Some(*user_id),
            Self::Guest { .. } => None,
        }
    }

    /// The guest contact to upsert, if any.
    #[must_use]
    pub const fn contact(&self) -> Option<&GuestContactDraft> {
        match self {
            Self::Account { contact, .. } => contact.as_ref(),
            Self::Guest { contact } => Some(contact),
        }
    }
}

/// Resolve the order identity from the session and the guest tuple.
///
/// # Errors
///
/// Returns `OrderError::Validation` when no session is present and name or
/// phone is missing, or when a supplied phone/email is malformed.
pub fn resolve(
    session_user: Option<&CurrentUser>,
    name: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
) -> Result<OrderIdentity, OrderError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let phone = phone.map(str::trim).filter(|p| !p.is_empty());
    let email = email.map(str::trim).filter(|e| !e.is_empty());

    // A malformed phone or email is always a 400, authenticated or not.
    let phone = phone
        .map(Phone::parse)
        .transpose()
        .map_err(|e| OrderError::Validation(format!("Numéro de téléphone invalide : {e}")))?;
    let email = email
        .map(Email::parse)
        .transpose()
        .map_err(|e| OrderError::Validation(format!("Adresse email invalide : {e}")))?;

    if let Some(user) = session_user {
        // A linked guest contact is created only when the full name+phone
        // tuple was supplied alongside the session.
        let contact = match (name, phone) {
            (Some(name), Some(phone)) => Some(GuestContactDraft {
                name: name.to_owned(),
                phone,
                email,
            }),
            _ => None,
        };

        return Ok(OrderIdentity::Account {
            user_id: user.id,
            email: user.email.clone(),
            contact,
        });
    }

    match (name, phone) {
        (Some(name), Some(phone)) => Ok(OrderIdentity::Guest {
            contact: GuestContactDraft {
                name: name.to_owned(),
                phone,
                email,
            },
        }),
        _ => Err(OrderError::Validation(
            "Nom et numéro de téléphone requis pour commander sans compte".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use cafe_lagune_core::UserRole;

    use super::*;

    fn session_user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(3),
            name: "Aya".to_owned(),
            email: "aya@example.ci".to_owned(),
            role: UserRole::User,
        }
    }

    #[test]
    fn test_guest_requires_name_and_phone() {
        let err = resolve(None, Some("Jean"), None, None).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let err = resolve(None, None, Some("0712345678"), None).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));

        let err = resolve(None, None, None, None).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_guest_phone_is_normalized() {
        let identity =
            resolve(None, Some("Jean"), Some("+225 07 12 34 56 78"), None).expect("resolved");
        let contact = identity.contact().expect("contact");
        assert_eq!(contact.phone.as_str(), "0712345678");
        assert_eq!(identity.user_id(), None);
    }

    #[test]
    fn test_guest_rejects_malformed_phone() {
        let err = resolve(None, Some("Jean"), Some("not-a-phone"), None).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_account_without_guest_tuple_has_no_contact() {
        let user = session_user();
        let identity = resolve(Some(&user), None, None, None).expect("resolved");
        assert_eq!(identity.user_id(), Some(UserId::new(3)));
        assert!(identity.contact().is_none());
    }

    #[test]
    fn test_account_with_guest_tuple_gets_linked_contact() {
        let user = session_user();
        let identity =
            resolve(Some(&user), Some("Aya K."), Some("0102030405 06"), None).expect("resolved");
        assert_eq!(identity.user_id(), Some(UserId::new(3)));
        let contact = identity.contact().expect("contact");
        assert_eq!(contact.name, "Aya K.");
        assert_eq!(contact.phone.as_str(), "010203040506");
    }

    #[test]
    fn test_account_with_partial_tuple_skips_contact() {
        let user = session_user();
        let identity = resolve(Some(&user), Some("Aya K."), None, None).expect("resolved");
        assert!(identity.contact().is_none());
    }

    #[test]
    fn test_malformed_email_is_rejected_even_when_authenticated() {
        let user = session_user();
        let err = resolve(Some(&user), Some("Aya"), Some("0712345678"), Some("nope"))
            .unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }
}
