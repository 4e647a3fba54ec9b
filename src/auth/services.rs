use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginForm, NewUser, RegisterForm},
        password::{hash_password, verify_against_dummy, verify_password},
        repo::UserStore,
        repo_types::User,
    },
    error::AppError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RegisterForm> for NewUser {
    type Error = AppError;

    fn try_from(form: RegisterForm) -> Result<Self, Self::Error> {
        let (Some(email), Some(password), Some(name)) = (
            non_blank(form.email),
            non_blank(form.password),
            non_blank(form.name),
        ) else {
            return Err(AppError::Validation("All fields are required".into()));
        };

        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }

        Ok(NewUser {
            email,
            password,
            name: name.trim().to_string(),
        })
    }
}

pub async fn register(store: &dyn UserStore, input: NewUser) -> Result<User, AppError> {
    let NewUser {
        email,
        password,
        name,
    } = input;

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task")??;

    let user = store.create(&email, &hash, &name).await.map_err(|e| {
        warn!(error = %e, "create user failed");
        AppError::from(e)
    })?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks credentials. Unknown email and wrong password fail identically.
pub async fn authenticate(store: &dyn UserStore, form: LoginForm) -> Result<User, AppError> {
    let (Some(email), Some(password)) = (non_blank(form.email), non_blank(form.password)) else {
        return Err(AppError::Validation("Email and password are required".into()));
    };
    let email = normalize_email(&email);

    let user = store.find_by_email(&email).await?;

    let (user, ok) = tokio::task::spawn_blocking(
        move || -> anyhow::Result<(Option<User>, bool)> {
            match user {
                Some(user) => {
                    let ok = verify_password(&password, &user.password_hash)?;
                    Ok((Some(user), ok))
                }
                None => Ok((None, verify_against_dummy(&password))),
            }
        },
    )
    .await
    .context("password verification task")??;

    match user {
        Some(user) if ok => {
            info!(user_id = %user.id, "user logged in");
            Ok(user)
        }
        Some(user) => {
            warn!(user_id = %user.id, "login invalid password");
            Err(AppError::InvalidCredentials)
        }
        None => {
            warn!("login unknown email");
            Err(AppError::InvalidCredentials)
        }
    }
}
