//! Canonical index names.
//!
//! Guides keep their heading, modules are named from their heading, and every
//! symbol page (class, interface, enum, ...) is named from its file path,
//! which carries the fully qualified symbol: `@aws-cdk_aws-s3objectlambda-alpha.AccessPointProps.html`
//! becomes `s3objectlambda-alpha AccessPointProps`.

use cdkdocset_shared::EntryType;

/// Heading suffix on module pages.
const MODULE_SUFFIX: &str = " module";

/// Package prefixes on module headings (scoped alpha packages, then the flat library).
const MODULE_PREFIXES: [&str; 2] = ["@aws-cdk/", "aws-cdk-lib."];

/// Service-namespace prefixes on symbol page file names.
const SYMBOL_PREFIXES: [&str; 2] = ["@aws-cdk_aws-", "aws-cdk-lib.aws_"];

/// Derive the index name of a page.
///
/// `relative_path` may carry a leading slash; only its final segment is used.
pub fn canonical_name(raw_title: &str, entry_type: EntryType, relative_path: &str) -> String {
    let title = raw_title.trim();

    match entry_type {
        EntryType::Guide => title.to_string(),
        EntryType::Module => module_name(title),
        _ => symbol_name(relative_path),
    }
}

/// Final path segment without its `.html` extension, e.g. `aws-cdk-lib.aws_s3.Bucket`.
pub fn page_stem(relative_path: &str) -> &str {
    let file = relative_path.rsplit('/').next().unwrap_or(relative_path);
    file.strip_suffix(".html").unwrap_or(file)
}

fn module_name(title: &str) -> String {
    // Headings of experimental modules may end with a decorative glyph.
    let title = title.trim_end_matches(|c: char| !c.is_ascii() || c.is_whitespace());
    let title = title.strip_suffix(MODULE_SUFFIX).unwrap_or(title);
    strip_first_prefix(title, &MODULE_PREFIXES).to_string()
}

fn symbol_name(relative_path: &str) -> String {
    let stem = strip_first_prefix(page_stem(relative_path), &SYMBOL_PREFIXES);
    stem.replacen('.', " ", 1)
}

/// Strip whichever of `prefixes` is present (at most one).
fn strip_first_prefix<'a>(s: &'a str, prefixes: &[&str]) -> &'a str {
    prefixes
        .iter()
        .find_map(|prefix| s.strip_prefix(*prefix))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_package_symbol_from_path() {
        assert_eq!(
            canonical_name(
                "interface AccessPointProps",
                EntryType::Property,
                "/cdk/api/v2/docs/@aws-cdk_aws-s3objectlambda-alpha.AccessPointProps.html",
            ),
            "s3objectlambda-alpha AccessPointProps"
        );
    }

    #[test]
    fn flat_library_symbol_from_path() {
        assert_eq!(
            canonical_name(
                "class Bucket (construct)",
                EntryType::Constructor,
                "cdk/api/v2/docs/aws-cdk-lib.aws_s3.Bucket.html",
            ),
            "s3 Bucket"
        );
        assert_eq!(
            canonical_name(
                "interface IRequestValidator",
                EntryType::Interface,
                "cdk/api/v2/docs/aws-cdk-lib.aws_apigateway.IRequestValidator.html",
            ),
            "apigateway IRequestValidator"
        );
    }

    #[test]
    fn symbol_without_known_prefix_keeps_namespace() {
        // Core library symbols have no service namespace to strip.
        assert_eq!(
            canonical_name("class Duration", EntryType::Class, "cdk/api/v2/docs/aws-cdk-lib.Duration.html"),
            "aws-cdk-lib Duration"
        );
        assert_eq!(
            canonical_name("class Construct", EntryType::Class, "docs/constructs.Construct.html"),
            "constructs Construct"
        );
    }

    #[test]
    fn only_first_dot_becomes_space() {
        assert_eq!(
            canonical_name(
                "interface BucketProps",
                EntryType::Property,
                "aws-cdk-lib.aws_s3.Bucket.Props.html"
            ),
            "s3 Bucket.Props"
        );
    }

    #[test]
    fn module_prefixes_are_both_recognized() {
        assert_eq!(
            canonical_name("aws-cdk-lib.aws_appintegrations module", EntryType::Module, "x.html"),
            "aws_appintegrations"
        );
        assert_eq!(
            canonical_name("@aws-cdk/aws-batch-alpha module", EntryType::Module, "x.html"),
            "aws-batch-alpha"
        );
        assert_eq!(
            canonical_name("constructs module", EntryType::Module, "x.html"),
            "constructs"
        );
    }

    #[test]
    fn module_with_decoration_and_whitespace() {
        assert_eq!(
            canonical_name("  @aws-cdk/aws-batch-alpha module 🔹 ", EntryType::Module, "x.html"),
            "aws-batch-alpha"
        );
    }

    #[test]
    fn guide_keeps_trimmed_title() {
        assert_eq!(
            canonical_name("  AWS Construct Library  ", EntryType::Guide, "cdk/api/v2/docs/aws-construct-library.html"),
            "AWS Construct Library"
        );
    }

    #[test]
    fn page_stem_strips_directories_and_extension() {
        assert_eq!(
            page_stem("/cdk/api/v2/docs/aws-cdk-lib.aws_s3.Bucket.html"),
            "aws-cdk-lib.aws_s3.Bucket"
        );
        assert_eq!(page_stem("index"), "index");
    }
}
