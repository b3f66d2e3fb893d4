//! HTML rendering with tera.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tracing::{debug, error};

/// Template for `/`.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Template for `/collection/{name}`.
pub const COLLECTION_TEMPLATE: &str = "collection.html";

const REQUIRED_TEMPLATES: [&str; 2] = [INDEX_TEMPLATE, COLLECTION_TEMPLATE];

/// Body sent when a template fails to render.
pub const TEMPLATE_FAILURE_BODY: &str = "internal template error";

/// Template loading and rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("parsing templates in {dir}: {source}")]
    Parse {
        dir: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("template '{0}' is missing")]
    Missing(&'static str),

    #[error("rendering '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

/// Compiled page templates, shared by all requests.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Parse every `*.html` file in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let dir = dir.as_ref();
        let pattern = dir.join("*.html");
        let tera = Tera::new(&pattern.to_string_lossy()).map_err(|source| TemplateError::Parse {
            dir: dir.to_path_buf(),
            source,
        })?;
        Self::from_tera(tera)
    }

    /// Wrap already-parsed templates, checking the required pages exist.
    pub fn from_tera(tera: Tera) -> Result<Self, TemplateError> {
        for name in REQUIRED_TEMPLATES {
            if !tera.get_template_names().any(|t| t == name) {
                return Err(TemplateError::Missing(name));
            }
        }
        debug!(
            templates = tera.get_template_names().count(),
            "Templates loaded"
        );
        Ok(Self { tera })
    }

    /// Render `name` with the fields of `data` as its context.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, TemplateError> {
        let render_err = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let context = Context::from_serialize(data).map_err(render_err)?;
        self.tera.render(name, &context).map_err(render_err)
    }

    /// Render `name` into an HTML response, or a bare 500 on failure.
    pub fn page<T: Serialize>(&self, name: &str, data: &T) -> Response {
        match self.render(name, data) {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!(error = %e, "Template execution failed");
                (StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_FAILURE_BODY).into_response()
            }
        }
    }
}

/// Serialize `value` as JSON that is safe inside a `<script>` element.
///
/// `<`, `>` and `&` are escaped so the payload cannot close the element or
/// open a comment; U+2028 and U+2029 are escaped for older JavaScript parsers.
pub fn script_safe_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let json = serde_json::to_string(value)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_templates(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), "<p>{{ title }}</p>").unwrap();
        }
    }

    #[test]
    fn loads_directory() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path(), &REQUIRED_TEMPLATES);

        let renderer = Renderer::load(dir.path()).unwrap();
        let html = renderer
            .render(INDEX_TEMPLATE, &json!({"title": "<b>"}))
            .unwrap();
        assert_eq!(html, "<p>&lt;b&gt;</p>");
    }

    #[test]
    fn missing_template_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path(), &[INDEX_TEMPLATE]);

        let err = Renderer::load(dir.path()).unwrap_err();
        assert!(matches!(err, TemplateError::Missing(COLLECTION_TEMPLATE)));
    }

    #[test]
    fn syntax_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_templates(dir.path(), &REQUIRED_TEMPLATES);
        std::fs::write(dir.path().join(INDEX_TEMPLATE), "{% if %}").unwrap();

        let err = Renderer::load(dir.path()).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
    }

    #[tokio::test]
    async fn render_failure_is_500() {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (INDEX_TEMPLATE, "{{ missing.field }}"),
            (COLLECTION_TEMPLATE, "ok"),
        ])
        .unwrap();
        let renderer = Renderer::from_tera(tera).unwrap();

        let response = renderer.page(INDEX_TEMPLATE, &json!({}));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], TEMPLATE_FAILURE_BODY.as_bytes());
    }

    #[test]
    fn script_safe_escapes() {
        let json = script_safe_json(&json!([{
            "json": "</script><!-- & \u{2028}\u{2029}"
        }]))
        .unwrap();

        assert!(!json.contains('<'));
        assert!(!json.contains('>'));
        assert!(!json.contains('&'));
        assert!(!json.contains('\u{2028}'));
        assert!(json.contains("\\u003c/script\\u003e"));

        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0]["json"], "</script><!-- & \u{2028}\u{2029}");
    }
}
