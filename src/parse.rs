use std::{collections::HashSet, fmt, sync::LazyLock};

use regex::Regex;
use scraper::{Html, Selector};
use tokio::task::spawn_blocking;

use crate::{Error, Result};

/// Free text the listing page uses for its pager, e.g. `Pagina 1 di 12 (occorrenze 240)`.
/// The page count is sometimes rendered with a fractional part.
static PAGINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Pagina (\d+) di (\d+\.?\d*) \(occorrenze (\d+)\)")
        .expect("pagination pattern is valid")
});
const RECORD_ANCHOR: &str = "a.opac_linkNero";

/// Opaque token addressing a record's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_owned())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page and item counts of a fonds, read once from its first listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    pub pages: u32,
    pub items: u64,
}

/// Form fields of a record's detail page needed to request its XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub filename: String,
    pub author: String,
}

/// Runs one of the parsers below on the blocking pool.
pub(crate) async fn parse_in_background<T, F>(html: String, parser: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&str) -> Result<T> + Send + 'static,
{
    spawn_blocking(move || parser(&html)).await?
}

/// Reads the page and occurrence counts out of a listing page.
///
/// A fractional page count is truncated, so `12.5` pages become 12.
pub(crate) fn parse_pagination(body: &str) -> Result<PageDescriptor> {
    let caps = PAGINATION_RE
        .captures(body)
        .ok_or_else(|| Error::Parse("no `Pagina X di Y (occorrenze N)` text on page".into()))?;

    let page_token = &caps[2];
    let whole_pages = page_token.split('.').next().unwrap_or_default();
    let pages = whole_pages
        .parse::<u32>()
        .map_err(|_| Error::Parse(format!("page count {page_token:?}")))?;
    let items = caps[3]
        .parse::<u64>()
        .map_err(|_| Error::Parse(format!("occurrence count {:?}", &caps[3])))?;

    Ok(PageDescriptor { pages, items })
}

/// Collects the unique identifiers linked by the record anchors of a listing page.
///
/// The identifier is the `=`-delimited segment that follows the first `=` of the
/// anchor's `href`. Anchors yielding nothing are skipped.
pub(crate) fn parse_identifiers(html: &str) -> Result<HashSet<RecordId>> {
    let doc = Html::parse_document(html);
    let anchor_selector = create_selector(RECORD_ANCHOR)?;

    let ids = doc
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| href.split('=').nth(1))
        .filter(|id| !id.is_empty())
        .map(RecordId::from)
        .collect();
    Ok(ids)
}

/// Extracts the `filename` and `autore` form fields of a record's detail page.
pub(crate) fn parse_record_metadata(id: &RecordId, html: &str) -> Result<RecordMetadata> {
    let doc = Html::parse_document(html);

    let filename = input_value(&doc, "filename")?
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::MissingField {
            id: id.to_string(),
            field: "filename",
        })?;
    let author = input_value(&doc, "autore")?.unwrap_or_default();

    Ok(RecordMetadata { filename, author })
}

/// Value of the first `<input>` named `name`.
fn input_value(doc: &Html, name: &str) -> Result<Option<String>> {
    let selector = create_selector(&format!(r#"input[name="{name}"]"#))?;
    Ok(doc
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_owned))
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::Selector(sel_str.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_truncates_fractional_page_count() {
        let body = "<div>Pagina 3 di 12.5 (occorrenze 240)</div>";
        let desc = parse_pagination(body).unwrap();
        assert_eq!(desc, PageDescriptor { pages: 12, items: 240 });
    }

    #[test]
    fn pagination_with_whole_page_count() {
        let body = "<p>Risultati: Pagina 1 di 4 (occorrenze 37)</p>";
        let desc = parse_pagination(body).unwrap();
        assert_eq!(desc, PageDescriptor { pages: 4, items: 37 });
    }

    #[test]
    fn pagination_pattern_is_reused_across_pages() {
        for (body, pages) in [
            ("Pagina 1 di 7 (occorrenze 70)", 7),
            ("Pagina 2 di 7.9 (occorrenze 70)", 7),
        ] {
            assert_eq!(parse_pagination(body).unwrap().pages, pages);
        }
    }

    #[test]
    fn pagination_missing_is_a_parse_error() {
        let err = parse_pagination("<html><body>Nessun risultato</body></html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)), "unexpected error: {err}");
    }

    #[test]
    fn identifiers_are_unique_and_never_empty() {
        let html = r#"
            <table>
              <tr><td><a class="opac_linkNero" href="opac_SchedaScheda.php?ID=101">a</a></td></tr>
              <tr><td><a class="opac_linkNero" href="opac_SchedaScheda.php?ID=101">a again</a></td></tr>
              <tr><td><a class="opac_linkNero" href="opac_SchedaScheda.php?ID=202">b</a></td></tr>
              <tr><td><a class="opac_linkNero" href="opac_SchedaScheda.php?ID=">empty</a></td></tr>
              <tr><td><a class="opac_linkNero" href="opac_SchedaScheda.php">no query</a></td></tr>
              <tr><td><a class="opac_linkNero">no href</a></td></tr>
              <tr><td><a class="altro" href="opac_SchedaScheda.php?ID=303">other anchor</a></td></tr>
            </table>
        "#;

        let ids = parse_identifiers(html).unwrap();

        let expected: HashSet<RecordId> = ["101", "202"].into_iter().map(RecordId::from).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn identifier_stops_at_next_equals_sign() {
        let html = r#"<a class="opac_linkNero" href="scheda.php?ID=55&amp;lang=it">x</a>"#;
        let ids = parse_identifiers(html).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![RecordId::from("55&lang")]);
    }

    #[test]
    fn record_metadata_reads_first_form_fields() {
        let html = r#"
            <form>
              <input type="hidden" name="filename" value="CNMD0000012345.xml">
              <input type="hidden" name="autore" value="Petrarca, Francesco">
              <input type="hidden" name="filename" value="ignored.xml">
            </form>
        "#;
        let meta = parse_record_metadata(&RecordId::from("12345"), html).unwrap();
        assert_eq!(meta.filename, "CNMD0000012345.xml");
        assert_eq!(meta.author, "Petrarca, Francesco");
    }

    #[test]
    fn record_metadata_without_author_keeps_empty_author() {
        let html = r#"<input name="filename" value="CNMD1.xml">"#;
        let meta = parse_record_metadata(&RecordId::from("1"), html).unwrap();
        assert_eq!(meta.author, "");
    }

    #[test]
    fn record_metadata_with_empty_filename_is_missing_field() {
        let html = r#"<input name="filename" value=""><input name="autore" value="Anonimo">"#;
        let err = parse_record_metadata(&RecordId::from("7"), html).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "filename", .. }));
    }

    #[tokio::test]
    async fn parses_on_blocking_pool() {
        let html = r#"<a class="opac_linkNero" href="s.php?ID=9">x</a>"#.to_string();
        let ids = parse_in_background(html, parse_identifiers).await.unwrap();
        assert!(ids.contains(&RecordId::from("9")));
    }
}
