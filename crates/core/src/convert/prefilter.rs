//! Markup filtering ahead of rendering.
//!
//! Attribute-level work (link rewriting, image skipping, hidden nodes) runs as
//! a streaming `lol_html` pass over the markup. Selector filters from the
//! profile then run on the parsed tree.

use url::Url;

use crate::parse::{Document, is_hidden_style};
use crate::profile::{ContentFilters, ConversionProfile, ImageStrategy, LinkHandlingStyle};
use crate::urls::{resolve_url, strip_tracking_params};

/// Rewrites links and images and drops hidden elements according to
/// `profile`.
///
/// A failing rewrite returns the original markup unchanged.
pub fn rewrite_markup(html: &str, profile: &ConversionProfile, base_url: Option<&Url>) -> String {
    let remove_links = profile.link_handling.style == LinkHandlingStyle::Remove;
    let strip_tracking = profile.link_handling.remove_tracking_params;
    let skip_images = profile.image_handling.strategy == ImageStrategy::Skip;
    let remove_hidden = !profile.content_filters.include_hidden;

    let rewrite_href = |href: &str| -> String {
        let href = if strip_tracking { strip_tracking_params(href) } else { href.to_string() };
        match base_url {
            Some(base) => resolve_url(&href, base),
            None => href,
        }
    };

    let mut handlers = Vec::new();

    if remove_hidden {
        handlers.push(lol_html::element!("[hidden]", |el| {
            el.remove();
            Ok(())
        }));
        handlers.push(lol_html::element!("[style]", |el| {
            if let Some(style) = el.get_attribute("style")
                && is_hidden_style(&style)
            {
                el.remove();
            }
            Ok(())
        }));
    }

    if remove_links {
        handlers.push(lol_html::element!("a", |el| {
            el.remove_and_keep_content();
            Ok(())
        }));
    } else if strip_tracking || base_url.is_some() {
        handlers.push(lol_html::element!("a[href]", |el| {
            if let Some(href) = el.get_attribute("href")
                && let Some(rewritten) = rewrite_attribute(&href, &rewrite_href)
            {
                el.set_attribute("href", &rewritten).ok();
            }
            Ok(())
        }));
    }

    if skip_images {
        handlers.push(lol_html::element!("img", |el| {
            el.remove();
            Ok(())
        }));
        handlers.push(lol_html::element!("picture", |el| {
            el.remove();
            Ok(())
        }));
    } else if let Some(base) = base_url {
        handlers.push(lol_html::element!("img[src]", |el| {
            if let Some(src) = el.get_attribute("src")
                && let Some(rewritten) = rewrite_attribute(&src, |src| resolve_url(src, base))
            {
                el.set_attribute("src", &rewritten).ok();
            }
            Ok(())
        }));
    }

    if handlers.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if let Err(e) = rewriter.write(html.as_bytes()) {
        tracing::warn!("Markup rewrite failed, using original markup: {}", e);
        return html.to_string();
    }

    if let Err(e) = rewriter.end() {
        tracing::warn!("Markup rewrite failed, using original markup: {}", e);
        return html.to_string();
    }

    output
}

/// Runs `rewrite` over an attribute value and returns the new markup-ready
/// value, or `None` when nothing changed.
///
/// lol_html hands back attribute values as written, entities included.
fn rewrite_attribute(raw: &str, rewrite: impl Fn(&str) -> String) -> Option<String> {
    let value = html_escape::decode_html_entities(raw);
    let rewritten = rewrite(value.as_ref());
    (rewritten != value).then(|| html_escape::encode_double_quoted_attribute(&rewritten).into_owned())
}

/// Applies `excludeCss` and then `includeCss` to `doc`.
///
/// Invalid selectors are skipped. When include selectors are given but none
/// of them matches, the document is left whole.
pub fn apply_css_filters(doc: &mut Document, filters: &ContentFilters) {
    let excluded = collect_matches(doc, &filters.exclude_css);
    let removed = doc.detach_all(excluded);
    if removed > 0 {
        tracing::debug!("Excluded {} node(s) by selector", removed);
    }

    if filters.include_css.is_empty() {
        return;
    }

    let included = collect_matches(doc, &filters.include_css);
    if included.is_empty() {
        tracing::debug!("No include selector matched; keeping the whole document");
        return;
    }
    doc.retain_only(&included);
}

fn collect_matches(doc: &Document, selectors: &[String]) -> Vec<ego_tree::NodeId> {
    let mut ids = Vec::new();
    for selector in selectors {
        match doc.select(selector) {
            Ok(elements) => ids.extend(elements.iter().map(|el| el.node_id())),
            Err(e) => tracing::warn!("Skipping content filter: {}", e),
        }
    }
    ids
}
