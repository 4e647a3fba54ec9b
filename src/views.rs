use anyhow::Context as _;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};

use crate::error::AppError;

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
];

/// Page templates, compiled into the binary.
pub struct Views {
    tera: Tera,
}

impl Views {
    pub fn new() -> anyhow::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())
            .context("compile templates")?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, ctx: &Context) -> Result<String, AppError> {
        self.tera
            .render(template, ctx)
            .with_context(|| format!("render {template}"))
            .map_err(AppError::Internal)
    }

    /// Renders a form page, optionally with an inline error, under `status`.
    pub fn form_page(
        &self,
        template: &str,
        error: Option<&str>,
        status: StatusCode,
    ) -> Result<Response, AppError> {
        let mut ctx = Context::new();
        if let Some(error) = error {
            ctx.insert("error", error);
        }
        Ok((status, Html(self.render(template, &ctx)?)).into_response())
    }
}
