//! HTML sanitizer configuration for rendered output.

use std::collections::HashSet;

use ammonia::Builder as AmmoniaBuilder;

pub(super) fn build_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "code",
        "del",
        "div",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "img",
        "input",
        "li",
        "ol",
        "p",
        "pre",
        "section",
        "span",
        "strong",
        "sub",
        "sup",
        "table",
        "tbody",
        "td",
        "th",
        "thead",
        "tr",
        "ul",
    ]);
    builder.tags(tags);

    let generic: HashSet<&'static str> = HashSet::from([
        "class",
        "id",
        "title",
        "lang",
        "dir",
        "data-footnote-ref",
        "data-footnotes",
        "data-footnote-backref",
    ]);
    builder.generic_attributes(generic);

    // Ammonia panics if `rel` is an allowed attribute on `a` while its
    // default `link_rel` injection is active; allowing `rel` requires
    // disabling the injection.
    builder.link_rel(None);
    builder.add_tag_attributes("a", &["href", "target", "rel"]);
    builder.add_tag_attributes("img", &["src", "alt", "title", "width", "height"]);
    builder.add_tag_attributes("pre", &["class", "lang"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("th", &["align", "colspan", "rowspan", "scope"]);
    builder.add_tag_attributes("td", &["align", "colspan", "rowspan"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);

    builder.add_url_schemes(["http", "https", "mailto", "tel"].iter().copied());

    builder
}

#[cfg(test)]
mod tests {
    use super::build_sanitizer;

    #[test]
    fn sanitizer_strips_script_but_keeps_structure() {
        let sanitizer = build_sanitizer();
        let html = sanitizer
            .clean("<h1>Hi</h1><script>alert(1)</script><p>ok</p>")
            .to_string();
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(!html.contains("script"));
    }

    #[test]
    fn sanitizer_keeps_safe_links() {
        let sanitizer = build_sanitizer();
        let html = sanitizer
            .clean("<a href=\"https://example.com\">x</a>")
            .to_string();
        assert!(html.contains("href=\"https://example.com\""));
    }
}
