use serde::Deserialize;

/// Form body of `POST /register`.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Form body of `POST /login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validated registration input.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}
