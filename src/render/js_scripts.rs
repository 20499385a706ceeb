//! JavaScript evaluation scripts
//!
//! This module contains the JavaScript code the engine evaluates in
//! rendered pages: link extraction for discovery, structure and
//! computed-style snapshots for the manipulation detector, and the
//! load-state probe the chromium context polls.

/// Extract raw anchor hrefs exactly as written in the document.
///
/// Resolution against the page URL happens engine-side so that
/// protocol-relative and relative links follow the same path as absolute
/// ones.
pub const LINKS_SCRIPT: &str = r"
    (() => Array.from(document.querySelectorAll('a[href]'))
        .map(a => a.getAttribute('href'))
        .filter(href => href !== null))()
";

/// Probe used while waiting for a page to settle.
///
/// `page.wait_for_navigation()` only waits for the HTTP response; JS
/// execution, CSS application and image loading finish later. Polling
/// this probe catches the real settle point.
pub const READY_STATE_SCRIPT: &str = r"
    (() => ({
        readyState: document.readyState,
        imagesLoaded: Array.from(document.images).every(img => img.complete),
        bodyExists: document.body !== null
    }))()
";

/// Template for the structure snapshot script.
///
/// `__IMPORTANT_SELECTORS__` is replaced with a JSON array of the
/// configured important-element selectors before evaluation.
const STRUCTURE_SCRIPT_TEMPLATE: &str = r#"
    (() => {
        const headings = [];
        const counters = {};
        document.querySelectorAll('h1, h2, h3, h4, h5, h6').forEach(el => {
            const tag = el.tagName.toLowerCase();
            counters[tag] = (counters[tag] || 0) + 1;
            headings.push({
                level: parseInt(tag[1], 10),
                text: (el.textContent || '').trim(),
                selector: `${tag}:nth-of-type(${counters[tag]})`
            });
        });

        const meta_tags = Array.from(document.querySelectorAll('meta'))
            .map(m => ({
                key: m.getAttribute('name') || m.getAttribute('property'),
                content: m.getAttribute('content') || ''
            }))
            .filter(m => m.key);

        const important_elements = __IMPORTANT_SELECTORS__.map(sel => {
            let count = 0;
            try { count = document.querySelectorAll(sel).length; } catch (e) {}
            return { selector: sel, count };
        });

        return {
            title: document.title || '',
            headings,
            meta_tags,
            important_elements
        };
    })()
"#;

/// Build the structure snapshot script for a configured selector set.
#[must_use]
pub fn structure_script(important_selectors: &[String]) -> String {
    let selectors_json =
        serde_json::to_string(important_selectors).unwrap_or_else(|_| "[]".to_string());
    STRUCTURE_SCRIPT_TEMPLATE.replace("__IMPORTANT_SELECTORS__", &selectors_json)
}

/// Computed-style snapshot for headings and structural containers.
///
/// Headings are keyed by the same positional `tag:nth-of-type(n)`
/// selectors the structure snapshot uses, so style changes can be
/// correlated with hierarchy changes on the same element.
pub const STYLE_SCRIPT: &str = r#"
    (() => {
        const props = ['font-size', 'font-weight', 'font-family',
                       'color', 'margin', 'padding', 'display'];
        const targets = [];
        const counters = {};
        document.querySelectorAll('h1, h2, h3, h4, h5, h6').forEach(el => {
            const tag = el.tagName.toLowerCase();
            counters[tag] = (counters[tag] || 0) + 1;
            targets.push([`${tag}:nth-of-type(${counters[tag]})`, el]);
        });
        for (const tag of ['header', 'nav', 'main', 'footer']) {
            const el = document.querySelector(tag);
            if (el) targets.push([tag, el]);
        }

        const out = {};
        for (const [selector, el] of targets) {
            const cs = window.getComputedStyle(el);
            const entry = {};
            for (const p of props) entry[p] = cs.getPropertyValue(p);
            out[selector] = entry;
        }
        return out;
    })()
"#;
