//! Form buffers: local input that is not persisted until submitted.

use crate::contract::model::{PasswordChange, Registration, Session};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl AuthForm {
    /// Keep name and email, drop anything secret.
    pub fn clear_passwords(&mut self) {
        self.password.clear();
        self.password_confirmation.clear();
    }

    pub fn registration(&self) -> Registration {
        Registration {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
}

impl ProfileForm {
    pub fn seeded(session: &Session) -> Self {
        Self {
            name: session.name.clone(),
            email: session.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordForm {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

impl PasswordForm {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirmation
    }

    pub fn change(&self) -> PasswordChange {
        PasswordChange {
            current_password: self.current_password.clone(),
            password: self.password.clone(),
            password_confirmation: self.password_confirmation.clone(),
        }
    }
}
