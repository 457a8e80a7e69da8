//! What to mirror: the pages listed on the table-of-contents page plus a fixed
//! set of stylesheets, icons and badges those pages reference.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use cdkdocset_render::{check_version, page_version};
use cdkdocset_shared::{DocsetError, Result, SiteConfig};

use crate::client::Fetcher;

static NAV_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.navItem").expect("valid selector"));

/// Stand-in origin for resolving site-absolute hrefs; only the path is kept.
static SITE_ORIGIN: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://site.invalid/").expect("valid url"));

/// Assets referenced by every page but not linked from the table of contents.
pub const STATIC_ASSETS: [&str; 17] = [
    "/cdk/api/v2/css/default.min.css",
    "/cdk/api/v2/css/main.css",
    "/cdk/api/v2/img/dotnet32.png",
    "/cdk/api/v2/img/go32.png",
    "/cdk/api/v2/img/java32.png",
    "/cdk/api/v2/img/python32.png",
    "/cdk/api/v2/img/typescript32.png",
    "/cdk/api/v2/img/favicon-32x32.png",
    "/cdk/api/v2/img/cfn--resources-stable-success.svg",
    "/cdk/api/v2/img/cdk--constructs-experimental-important.svg",
    "/cdk/api/v2/img/experimental-important.svg",
    "/cdk/api/v2/img/cdk--constructs-developer--preview-informational.svg",
    "/cdk/api/v2/img/cdk--constructs-stable-success.svg",
    "/cdk/api/v2/img/jsconstructs.svg",
    "/cdk/api/v2/img/pyconstructs.svg",
    "/cdk/api/v2/img/nuconstructs.svg",
    "/cdk/api/v2/img/maven-badge.svg",
];

/// Site paths of every page linked from the table of contents, sorted and deduplicated.
///
/// Only site-absolute paths are kept; anything else cannot be mirrored.
/// Fragments and query strings are dropped, so a page linked at several
/// anchors is listed once.
pub fn toc_links(doc: &Html) -> Vec<String> {
    let mut links = BTreeSet::new();
    for a in doc.select(&NAV_ITEM) {
        match a.value().attr("href") {
            Some(href) if href.starts_with('/') && !href.starts_with("//") => {
                match page_path(href) {
                    Some(path) => {
                        links.insert(path);
                    }
                    None => debug!(href, "skipping unparsable toc link"),
                }
            }
            Some(href) => debug!(href, "skipping non-site toc link"),
            None => {}
        }
    }
    links.into_iter().collect()
}

/// Path of a site-absolute href without its fragment or query.
fn page_path(href: &str) -> Option<String> {
    let mut url = SITE_ORIGIN.join(href).ok()?;
    url.set_fragment(None);
    url.set_query(None);
    Some(url.path().to_string())
}

/// Table-of-contents pages plus [`STATIC_ASSETS`], sorted and deduplicated.
pub fn work_list(doc: &Html) -> Vec<String> {
    let mut items: BTreeSet<String> = toc_links(doc).into_iter().collect();
    items.extend(STATIC_ASSETS.iter().map(|s| s.to_string()));
    items.into_iter().collect()
}

/// Version currently published online, read from the table-of-contents page.
#[instrument(skip_all)]
pub async fn online_version(fetcher: &Fetcher, site: &SiteConfig) -> Result<String> {
    let body = fetcher.get_text(&site.toc_path).await?;
    let doc = Html::parse_document(&body);
    page_version(&doc, &site.versions_path).ok_or_else(|| {
        DocsetError::parse(format!("{} has no version marker", site.toc_path))
    })
}

/// Fetch the table-of-contents page, check it shows `expected`, and return
/// the full download work list.
#[instrument(skip_all, fields(expected = %expected))]
pub async fn list_toc(fetcher: &Fetcher, site: &SiteConfig, expected: &str) -> Result<Vec<String>> {
    let body = fetcher.get_text(&site.toc_path).await?;
    let doc = Html::parse_document(&body);
    check_version(&doc, &site.versions_path, expected)?;

    let items = work_list(&doc);
    info!(items = items.len(), "table of contents listed");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{fixture, mock_fetcher};
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn toc_links_are_sorted_and_unique() {
        let doc = Html::parse_document(&fixture("aws-construct-library.html"));
        assert_eq!(
            toc_links(&doc),
            vec![
                "/cdk/api/v2/docs/aws-cdk-lib.aws_s3-readme.html",
                "/cdk/api/v2/docs/aws-cdk-lib.aws_s3.Bucket.html",
                "/cdk/api/v2/docs/aws-cdk-lib.aws_s3.BucketProps.html",
                "/cdk/api/v2/docs/aws-cdk-lib.aws_s3.IBucket.html",
                "/cdk/api/v2/docs/aws-construct-library.html",
            ]
        );
    }

    #[test]
    fn non_site_links_are_skipped() {
        let doc = Html::parse_document(
            r#"<nav><a class="navItem" href="https://example.com/x">x</a>
               <a class="navItem" href="/cdk/api/v2/docs/a.html">a</a>
               <a class="navItem">no href</a></nav>"#,
        );
        assert_eq!(toc_links(&doc), vec!["/cdk/api/v2/docs/a.html"]);
    }

    #[test]
    fn anchors_and_queries_collapse_to_one_page() {
        let doc = Html::parse_document(
            r#"<nav><a class="navItem" href="/cdk/api/v2/docs/a.html#methods">m</a>
               <a class="navItem" href="/cdk/api/v2/docs/a.html?lang=python">p</a>
               <a class="navItem" href="/cdk/api/v2/docs/a.html">a</a>
               <a class="navItem" href="//cdn.example.com/x.html">cdn</a></nav>"#,
        );
        assert_eq!(toc_links(&doc), vec!["/cdk/api/v2/docs/a.html"]);
    }

    #[test]
    fn work_list_includes_static_assets() {
        let doc = Html::parse_document(&fixture("aws-construct-library.html"));
        let items = work_list(&doc);
        assert_eq!(items.len(), 5 + STATIC_ASSETS.len());
        assert!(items.contains(&"/cdk/api/v2/img/maven-badge.svg".to_string()));
        assert!(items.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn reads_online_version() {
        let server = MockServer::start().await;
        let site = SiteConfig::default();
        Mock::given(path(site.toc_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture("aws-construct-library.html")))
            .mount(&server)
            .await;

        let version = online_version(&mock_fetcher(&server), &site).await.unwrap();
        assert_eq!(version, "2.160.0");
    }

    #[tokio::test]
    async fn list_toc_rejects_other_versions() {
        let server = MockServer::start().await;
        let site = SiteConfig::default();
        Mock::given(path(site.toc_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture("aws-construct-library.html")))
            .mount(&server)
            .await;
        let fetcher = mock_fetcher(&server);

        let items = list_toc(&fetcher, &site, "2.160.0").await.unwrap();
        assert!(items.contains(&"/cdk/api/v2/docs/aws-cdk-lib.aws_s3.Bucket.html".to_string()));

        let err = list_toc(&fetcher, &site, "2.161.0").await.unwrap_err();
        assert!(matches!(err, DocsetError::VersionMismatch { .. }));
    }
}
