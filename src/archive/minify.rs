//! HTML minification for archive pages, including inline CSS and JS.
//!
//! Entry bodies come straight from feeds and are often unbalanced, so the
//! minifier must take tag soup as it is. What it cannot take is text that is
//! not UTF-8, on either side of the pass.

use super::ArchiveError;

fn config() -> minify_html::Cfg {
    minify_html::Cfg {
        minify_css: true,
        minify_js: true,
        ..minify_html::Cfg::default()
    }
}

/// Minify a full HTML document.
pub fn minify_html(input: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    std::str::from_utf8(input).map_err(|e| ArchiveError::Minify(format!("input is not UTF-8: {e}")))?;

    let output = minify_html::minify(input, &config());

    std::str::from_utf8(&output)
        .map_err(|e| ArchiveError::Minify(format!("output is not UTF-8: {e}")))?;
    if output.is_empty() && !input.iter().all(u8::is_ascii_whitespace) {
        return Err(ArchiveError::Minify("minifier produced no output".into()));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_between_tags() {
        let input = b"<!DOCTYPE html><html><body>\n    <p>  Hello   world  </p>\n</body></html>";
        let output = minify_html(input).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.len() < input.len());
        assert!(text.contains("Hello"));
        assert!(!text.contains("\n    "));
    }

    #[test]
    fn feed_tag_soup_is_minified_not_rejected() {
        for input in [
            "<div><span>text</div>",
            "<p>text <b>bold</p> after",
            "line one</br>line two",
            "<img src=x>tail</img>",
            "<ul><li>one<li>two</ul></ol>",
        ] {
            let output = minify_html(input.as_bytes()).unwrap();
            let text = String::from_utf8(output).unwrap();
            assert!(!text.is_empty(), "{input}");
        }
    }

    #[test]
    fn text_survives_unbalanced_markup() {
        let output = minify_html(b"<div><p>keep <em>this</div> and this").unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("keep"));
        assert!(text.contains("this"));
        assert!(text.contains("and this"));
    }

    #[test]
    fn non_utf8_input_is_an_error() {
        let err = minify_html(b"<p>\xff\xfe</p>").unwrap_err();
        assert!(matches!(err, ArchiveError::Minify(_)));
    }

    #[test]
    fn blank_input_minifies_to_nothing() {
        assert!(minify_html(b"   \n").unwrap().is_empty());
    }
}
