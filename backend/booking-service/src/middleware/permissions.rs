/// Role and ownership checks shared by the handlers.
use uuid::Uuid;

use super::AuthUser;
use crate::error::{AppError, Result};
use crate::models::{Booking, Hotel, Reply, Review, Role};

fn forbidden(message: &str) -> AppError {
    AppError::Authorization(message.to_string())
}

pub fn require_admin(user: &AuthUser) -> Result<()> {
    if user.role.can_manage_users() {
        Ok(())
    } else {
        Err(forbidden("You are not authorized to perform this action"))
    }
}

/// Only accounts with the `hotel` role manage listings.
pub fn require_hotel_manager(user: &AuthUser) -> Result<()> {
    if user.role.can_manage_hotels() {
        Ok(())
    } else {
        Err(forbidden("Only hotel accounts can manage hotels"))
    }
}

pub fn require_guest(user: &AuthUser) -> Result<()> {
    if user.role.can_book() {
        Ok(())
    } else {
        Err(forbidden("Only user accounts can book rooms"))
    }
}

pub fn require_replier(user: &AuthUser) -> Result<()> {
    if user.role.can_reply() {
        Ok(())
    } else {
        Err(forbidden("Only hotel or admin accounts can reply to reviews"))
    }
}

/// Caller must be the `hotel` account that created the hotel.
pub fn check_hotel_owner(user: &AuthUser, hotel: &Hotel) -> Result<()> {
    require_hotel_manager(user)?;
    check_owner_id(user, hotel.created_by)
}

pub fn check_owner_id(user: &AuthUser, created_by: Uuid) -> Result<()> {
    if created_by == user.id {
        Ok(())
    } else {
        Err(forbidden("You don't have permission to modify this hotel"))
    }
}

pub fn check_booking_owner(user: &AuthUser, booking: &Booking) -> Result<()> {
    if booking.user_id == user.id {
        Ok(())
    } else {
        Err(forbidden("You don't have permission to access this booking"))
    }
}

pub fn check_review_author(user: &AuthUser, review: &Review) -> Result<()> {
    if review.user_id == user.id {
        Ok(())
    } else {
        Err(forbidden("You don't have permission to modify this review"))
    }
}

/// Admins may moderate any reply; hotel accounts only their own.
pub fn check_reply_author(user: &AuthUser, reply: &Reply) -> Result<()> {
    require_replier(user)?;
    if user.role == Role::Admin || reply.user_id == user.id {
        Ok(())
    } else {
        Err(forbidden("You don't have permission to modify this reply"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "caller@example.com".into(),
            role,
        }
    }

    fn reply_by(user_id: Uuid) -> Reply {
        let now = Utc::now();
        Reply {
            id: Uuid::new_v4(),
            review_id: Uuid::new_v4(),
            user_id,
            content: "Thanks for staying".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_role_gates() {
        assert!(require_guest(&caller(Role::User)).is_ok());
        assert!(require_guest(&caller(Role::Hotel)).is_err());
        assert!(require_hotel_manager(&caller(Role::Hotel)).is_ok());
        assert!(require_hotel_manager(&caller(Role::Admin)).is_err());
        assert!(require_admin(&caller(Role::Admin)).is_ok());
        assert!(require_admin(&caller(Role::User)).is_err());
    }

    #[test]
    fn test_owner_id() {
        let user = caller(Role::Hotel);
        assert!(check_owner_id(&user, user.id).is_ok());
        assert!(matches!(
            check_owner_id(&user, Uuid::new_v4()),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_reply_moderation() {
        let hotel = caller(Role::Hotel);
        let admin = caller(Role::Admin);
        let guest = caller(Role::User);

        let own = reply_by(hotel.id);
        let other = reply_by(Uuid::new_v4());

        assert!(check_reply_author(&hotel, &own).is_ok());
        assert!(check_reply_author(&hotel, &other).is_err());
        assert!(check_reply_author(&admin, &other).is_ok());
        assert!(check_reply_author(&guest, &reply_by(guest.id)).is_err());
    }
}
