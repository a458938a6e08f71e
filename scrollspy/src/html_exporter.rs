//! HTML exporter for article pages
//!
//! This module exports a page configuration to a single static HTML file with:
//! - A hero header with the optional call-to-action button
//! - A sticky sidebar and a mobile popover rendered by the navigation presenter
//! - One content card per section, whose element id is the section id
//! - A footer

use crate::page_config::PageConfig;
use crate::presenter::NavigationPresenter;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during HTML export
#[derive(Error, Debug)]
pub enum HtmlExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Export a page to HTML format
///
/// # Parameters
/// * `page` - The page configuration to export
/// * `presenter` - Navigation presenter supplying the sidebar and popover
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to HTML
/// * `Err(HtmlExportError)` - Error during export
pub fn to_html(
    page: &PageConfig,
    presenter: &NavigationPresenter,
    output_path: &Path,
) -> Result<(), HtmlExportError> {
    let output = render_page(page, presenter);

    // Write to file - create parent directories if they don't exist
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(output_path)?;
    file.write_all(output.as_bytes())?;

    Ok(())
}

/// Render the complete page document
pub fn render_page(page: &PageConfig, presenter: &NavigationPresenter) -> String {
    let mut output = String::new();

    write_html_header(&mut output, &page.title);

    output.push_str(&format!(
        "<body data-page=\"{}\">\n",
        escape_html(&page.page_id)
    ));
    write_hero(&mut output, page, presenter);

    output.push_str("<div class=\"layout\">\n");
    output.push_str("<aside class=\"sidebar\">\n");
    output.push_str(&presenter.render_sidebar());
    output.push_str("</aside>\n");

    output.push_str("<main class=\"content\">\n");
    for entry in presenter.entries() {
        output.push_str(&format!(
            "<section id=\"{}\" class=\"content-card\">\n",
            escape_html(entry.id.as_str())
        ));
        output.push_str(&format!(
            "<h2><span class=\"card-icon\" data-icon=\"{}\" aria-hidden=\"true\"></span>{}</h2>\n",
            escape_html(&entry.icon),
            escape_html(&entry.label)
        ));
        if let Some(summary) = page.summary(entry.id.as_str()) {
            output.push_str(&format!("<p>{}</p>\n", escape_html(summary)));
        }
        output.push_str("</section>\n");
    }
    output.push_str("</main>\n");
    output.push_str("</div>\n");

    output.push_str("<div class=\"popover\">\n");
    output.push_str(&presenter.render_popover());
    output.push_str("</div>\n");

    if let Some(ref footer) = page.footer {
        output.push_str(&format!(
            "<footer class=\"footer\"><p>{}</p></footer>\n",
            escape_html(footer)
        ));
    }

    output.push_str("</body>\n");
    output.push_str("</html>\n");
    output
}

/// Write HTML header with CSS styling
fn write_html_header(output: &mut String, title: &str) {
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
}

/// Write the hero header
fn write_hero(output: &mut String, page: &PageConfig, presenter: &NavigationPresenter) {
    output.push_str("<header class=\"hero\">\n");
    output.push_str(&format!(
        "<h1 class=\"page-title\">{}</h1>\n",
        escape_html(&page.title)
    ));

    if let Some(ref subtitle) = page.subtitle {
        output.push_str(&format!(
            "<p class=\"subtitle\">{}</p>\n",
            escape_html(subtitle)
        ));
    }

    if let Some(cta) = presenter.call_to_action() {
        output.push_str(&format!(
            "<a href=\"#{id}\" class=\"cta\" data-section-link=\"{id}\">{}</a>\n",
            escape_html(&cta.label),
            id = escape_html(cta.target.as_str())
        ));
    }

    output.push_str("</header>\n");
}

/// Escape HTML special characters
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Layout styles for the navigation shell
const CSS_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Oxygen',
                 'Ubuntu', 'Cantarell', 'Fira Sans', 'Droid Sans', 'Helvetica Neue',
                 sans-serif;
    line-height: 1.6;
    color: #333;
    background-color: #f5f5f5;
}

.hero {
    padding: 80px 20px 60px;
    text-align: center;
    background: linear-gradient(135deg, #0066cc, #004c99);
    color: white;
}

.page-title {
    font-size: 2.5em;
    font-weight: 700;
    margin-bottom: 12px;
}

.subtitle {
    font-size: 1.2em;
    opacity: 0.9;
    margin-bottom: 24px;
}

.cta {
    display: inline-block;
    padding: 10px 24px;
    border-radius: 999px;
    background: white;
    color: #0066cc;
    font-weight: 600;
    text-decoration: none;
}

.layout {
    display: grid;
    grid-template-columns: 260px 1fr;
    gap: 32px;
    max-width: 1200px;
    margin: 0 auto;
    padding: 40px 20px;
}

.sidebar-nav {
    position: sticky;
    top: 24px;
}

.sidebar-nav ul,
.popover-nav ul {
    list-style: none;
}

.nav-link {
    display: flex;
    align-items: center;
    gap: 8px;
    padding: 8px 12px;
    border-radius: 6px;
    color: #555;
    text-decoration: none;
}

.nav-link.active {
    background-color: #e6f0fa;
    color: #0066cc;
    font-weight: 600;
}

.content-card {
    background: white;
    padding: 40px;
    margin-bottom: 24px;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
}

.content-card h2 {
    display: flex;
    align-items: center;
    gap: 10px;
    margin-bottom: 16px;
    color: #1a1a1a;
}

.popover {
    display: none;
}

.popover-nav {
    display: none;
}

.popover-nav.open {
    display: block;
    position: fixed;
    right: 20px;
    bottom: 80px;
    padding: 12px;
    background: white;
    border-radius: 8px;
    box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
}

.popover-toggle {
    position: fixed;
    right: 20px;
    bottom: 20px;
    padding: 10px 18px;
    border: none;
    border-radius: 999px;
    background: #0066cc;
    color: white;
}

.footer {
    padding: 40px 20px;
    text-align: center;
    color: #888;
}

@media screen and (max-width: 768px) {
    .layout {
        grid-template-columns: 1fr;
    }

    .sidebar {
        display: none;
    }

    .popover {
        display: block;
    }
}
"#;
