//! Presentation of validation results for the terminal and the editor page.
//!
//! Location extraction here is display-only: it never changes what the
//! service returns, and diagnostics without a locator render as plain text.

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tera::{Context, Tera};

use crate::response::StructuredResponse;

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"line (\d+), column (\d+):").expect("location pattern is valid"));

const EDITOR_TEMPLATE_NAME: &str = "editor.html";
const EDITOR_TEMPLATE: &str = include_str!("editor.html");

/// Source position embedded in a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub line: u64,
    pub column: u64,
}

/// Find the first `line N, column M:` locator in `error`.
pub fn extract_location(error: &str) -> Option<ErrorLocation> {
    let captures = LOCATION_RE.captures(error)?;
    Some(ErrorLocation {
        line: captures[1].parse().ok()?,
        column: captures[2].parse().ok()?,
    })
}

/// What the user is shown for one response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultView {
    Valid {
        spec_version: String,
        title: String,
        version: String,
    },
    Invalid {
        location: Option<ErrorLocation>,
        detail: String,
    },
}

impl ResultView {
    /// An `error` wins over an `api`; a response with neither shows its message.
    pub fn from_response(response: &StructuredResponse) -> Self {
        if let Some(error) = response.error() {
            return ResultView::Invalid {
                location: extract_location(error),
                detail: error.to_string(),
            };
        }
        match response.api() {
            Some(api) => ResultView::Valid {
                spec_version: api.spec_version().to_string(),
                title: api.info.title.clone(),
                version: api.info.version.clone(),
            },
            None => ResultView::Invalid {
                location: None,
                detail: response.message().to_string(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ResultView::Valid { .. })
    }
}

/// Plain-text rendering for the terminal
pub fn render_text(view: &ResultView) -> String {
    let mut out = String::new();
    match view {
        ResultView::Valid {
            spec_version,
            title,
            version,
        } => {
            let _ = writeln!(out, "API is valid");
            let _ = writeln!(out, "  Spec version: {}", spec_version);
            let _ = writeln!(out, "  Title:        {}", title);
            let _ = writeln!(out, "  API version:  {}", version);
        }
        ResultView::Invalid { location, detail } => {
            let _ = writeln!(out, "API validation failed");
            if let Some(location) = location {
                let _ = writeln!(
                    out,
                    "  Location: line {}, column {}",
                    location.line, location.column
                );
            }
            for line in detail.lines() {
                let _ = writeln!(out, "  {}", line);
            }
        }
    }
    out
}

/// Server-rendered editor page
pub struct EditorPage {
    tera: Tera,
}

impl EditorPage {
    pub fn new() -> crate::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(EDITOR_TEMPLATE_NAME, EDITOR_TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Render the page with `content` in the editor and an optional result below it.
    pub fn render(&self, content: &str, result: Option<&ResultView>) -> crate::Result<String> {
        let mut context = Context::new();
        context.insert("content", content);
        if let Some(result) = result {
            context.insert("result", result);
        }
        Ok(self.tera.render(EDITOR_TEMPLATE_NAME, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{ApiInfo, ApiSummary};

    #[test]
    fn test_extract_location() {
        let location = extract_location("bad indentation at line 5, column 12: unexpected token");
        assert_eq!(location, Some(ErrorLocation { line: 5, column: 12 }));
    }

    #[test]
    fn test_extract_location_absent() {
        assert_eq!(extract_location("missing field `info`"), None);
        // The colon is part of the locator
        assert_eq!(extract_location("line 5, column 12 unexpected"), None);
    }

    #[test]
    fn test_invalid_view_and_text() {
        let response = StructuredResponse::invalid("line 3, column 1: did not find expected key");
        let view = ResultView::from_response(&response);
        assert!(!view.is_valid());
        let text = render_text(&view);
        assert!(text.starts_with("API validation failed\n  Location: line 3, column 1\n"));
        assert!(text.contains("did not find expected key"));
    }

    #[test]
    fn test_invalid_text_without_location() {
        let view = ResultView::from_response(&StructuredResponse::invalid("boom"));
        assert_eq!(render_text(&view), "API validation failed\n  boom\n");
    }

    #[test]
    fn test_valid_view_omits_paths() {
        let mut paths = serde_json::Map::new();
        paths.insert("/pets".to_string(), serde_json::json!({"get": {}}));
        let response = StructuredResponse::valid(ApiSummary {
            openapi: Some("3.0.0".to_string()),
            swagger: None,
            info: ApiInfo {
                title: "Test".to_string(),
                version: "1.0.0".to_string(),
            },
            paths,
        });
        let text = render_text(&ResultView::from_response(&response));
        assert!(text.contains("Title:        Test"));
        assert!(!text.contains("/pets"));
    }

    #[test]
    fn test_editor_page_escapes_content() -> crate::Result<()> {
        let page = EditorPage::new()?;
        let view = ResultView::Invalid {
            location: Some(ErrorLocation { line: 2, column: 4 }),
            detail: "line 2, column 4: <bad>".to_string(),
        };
        let html = page.render("title: <script>", Some(&view))?;
        assert!(html.contains("title: &lt;script&gt;"));
        assert!(html.contains("line 2, column 4: &lt;bad&gt;"));
        assert!(html.contains("Line 2, column 4"));
        Ok(())
    }

    #[test]
    fn test_editor_page_without_result() -> crate::Result<()> {
        let html = EditorPage::new()?.render("", None)?;
        assert!(html.contains("<textarea"));
        assert!(!html.contains("class=\"result"));
        Ok(())
    }
}
