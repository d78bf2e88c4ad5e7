//! HTML page template.
//!
//! Renders a [`PageContext`] into a complete Bootstrap 4 page. Page imports,
//! page content, banner and footer markup are trusted admin-authored HTML and
//! are inserted as-is; titles, names and links are escaped.

use std::fmt::Write;

use cms_store::{NavigationNode, PageContext};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Stylesheets and scripts every page gets before its own imports.
const BASE_ASSETS: &str = "\
<link rel=\"stylesheet\" href=\"https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/css/bootstrap.min.css\">
<script src=\"https://code.jquery.com/jquery-3.5.1.min.js\"></script>
<script src=\"https://cdn.jsdelivr.net/npm/popper.js@1.16.1/dist/umd/popper.min.js\"></script>
<script src=\"https://stackpath.bootstrapcdn.com/bootstrap/4.5.2/js/bootstrap.min.js\"></script>
";

/// Render a complete HTML page.
pub(crate) fn render_page(context: &PageContext) -> String {
    let mut html = String::with_capacity(8192);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1, shrink-to-fit=no\">\n",
    );
    let _ = writeln!(html, "<title>{}</title>", encode_text(&context.page.title));
    html.push_str(BASE_ASSETS);
    render_analytics(&mut html, &context.analytics_code);
    if let Some(imports) = &context.page.imports {
        html.push_str(imports);
        html.push('\n');
    }
    html.push_str("</head>\n<body>\n");

    render_navbar(&mut html, &context.navigation);

    if let Some(banner) = &context.banner {
        html.push_str("<section class=\"cms-banner\">\n");
        html.push_str(&banner.content);
        html.push_str("\n</section>\n");
    }

    html.push_str("<main class=\"container\">\n");
    html.push_str(&context.page.content);
    html.push_str("\n</main>\n");

    if let Some(footer) = &context.footer {
        html.push_str("<footer class=\"cms-footer\">\n");
        html.push_str(&footer.content);
        html.push_str("\n</footer>\n");
    }

    html.push_str("</body>\n</html>");
    html
}

/// Render the page shown for an unknown or inactive permalink.
pub(crate) fn render_not_found(permalink: &str) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Page not found</title>\n");
    html.push_str("</head>\n<body>\n");
    html.push_str("<h1>Page not found</h1>\n");
    let _ = writeln!(
        html,
        "<p>No page is published at <code>/{}</code>.</p>",
        encode_text(permalink)
    );
    html.push_str("<p><a href=\"/\">Home</a></p>\n");
    html.push_str("</body>\n</html>");
    html
}

/// Render the navigation bar; entries with children become dropdowns.
fn render_navbar(html: &mut String, items: &[NavigationNode]) {
    if items.is_empty() {
        return;
    }

    html.push_str("<nav class=\"navbar navbar-expand-lg navbar-light bg-light\">\n");
    html.push_str("<ul class=\"navbar-nav\">\n");
    for (index, node) in items.iter().enumerate() {
        let name = encode_text(&node.entry.name);
        let link = encode_double_quoted_attribute(&node.entry.link);

        if node.children.is_empty() {
            let _ = writeln!(
                html,
                "<li class=\"nav-item\"><a class=\"nav-link\" href=\"{link}\">{name}</a></li>"
            );
            continue;
        }

        html.push_str("<li class=\"nav-item dropdown\">\n");
        let _ = writeln!(
            html,
            "<a class=\"nav-link dropdown-toggle\" href=\"{link}\" id=\"nav-{index}\" \
             role=\"button\" data-toggle=\"dropdown\" aria-haspopup=\"true\" \
             aria-expanded=\"false\">{name}</a>"
        );
        let _ = writeln!(
            html,
            "<div class=\"dropdown-menu\" aria-labelledby=\"nav-{index}\">"
        );
        for child in &node.children {
            let _ = writeln!(
                html,
                "<a class=\"dropdown-item\" href=\"{}\">{}</a>",
                encode_double_quoted_attribute(&child.link),
                encode_text(&child.name)
            );
        }
        html.push_str("</div>\n</li>\n");
    }
    html.push_str("</ul>\n</nav>\n");
}

/// Render the gtag.js snippet for a non-empty, well-formed tracking code.
fn render_analytics(html: &mut String, code: &str) {
    if code.is_empty() {
        return;
    }
    if !is_tracking_code(code) {
        tracing::warn!(code = %code, "Ignoring malformed analytics code");
        return;
    }

    let _ = writeln!(
        html,
        "<script async src=\"https://www.googletagmanager.com/gtag/js?id={code}\"></script>"
    );
    html.push_str("<script>\n");
    html.push_str("window.dataLayer = window.dataLayer || [];\n");
    html.push_str("function gtag(){dataLayer.push(arguments);}\n");
    html.push_str("gtag('js', new Date());\n");
    let _ = writeln!(html, "gtag('config', '{code}');");
    html.push_str("</script>\n");
}

/// Tracking codes look like `UA-12345-1` or `G-ABCDEF`.
fn is_tracking_code(code: &str) -> bool {
    code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
