use std::sync::LazyLock;

use scraper::{Html, Selector};

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("`p` is a valid selector"));

/// Concatenate the text of every `<p>` element in document order, with no
/// separator. Navigation, headings and scripts are left out. Markup that
/// does not parse cleanly yields whatever paragraphs survive, possibly none.
pub fn extract_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut article = String::new();

    for paragraph in document.select(&PARAGRAPH) {
        for text in paragraph.text() {
            article.push_str(text);
        }
    }

    article
}
