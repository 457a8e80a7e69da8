//! Pipelines and docset assembly for the CDK docset builder.
//!
//! This crate ties retrieval, page transformation and the index store into
//! end-to-end workflows:
//! - [`download`]: site → source mirror
//! - [`build`]: source mirror → `<name>.docset` bundle and `meta.json`
//! - [`sync`]: both, in order
//! - [`validate_docset`]: structural check of a built bundle
//! - [`package`]: built bundle plus icon → `<name>.tgz`

pub mod archive;
pub mod build;
pub mod layout;
pub mod pipeline;

pub use cdkdocset_crawler::Fetcher;
pub use layout::{DocsetLayout, validate_docset};
pub use pipeline::{
    BuildConfig, BuildResult, DEFAULT_ICON, DownloadConfig, DownloadResult, PackageConfig,
    PackageResult, ProgressReporter, SilentProgress, SyncResult, build, current_version, download,
    mirror_version, package, sync,
};

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use url::Url;
    use uuid::Uuid;
    use wiremock::MockServer;

    use cdkdocset_render::RenderOptions;
    use cdkdocset_shared::SiteConfig;

    use crate::Fetcher;

    pub(crate) const TOC: &str = "cdk/api/v2/docs/aws-construct-library.html";
    pub(crate) const BUCKET: &str = "cdk/api/v2/docs/aws-cdk-lib.aws_s3.Bucket.html";
    pub(crate) const MODULE: &str = "cdk/api/v2/docs/aws-cdk-lib.aws_s3-readme.html";

    pub(crate) fn fixture(name: &str) -> String {
        let path = format!("{}/../../../fixtures/html/{name}", env!("CARGO_MANIFEST_DIR"));
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    pub(crate) fn options() -> RenderOptions {
        RenderOptions::from_site(&SiteConfig::default()).unwrap()
    }

    pub(crate) fn mock_fetcher(server: &MockServer) -> Fetcher {
        Fetcher::with_base_url(Url::parse(&server.uri()).unwrap(), Duration::from_secs(5)).unwrap()
    }

    pub(crate) fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cdkdocset-core-{label}-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// A source mirror holding fixture pages at the given site paths.
    pub(crate) fn mirror_of(pages: &[(&str, &str)]) -> PathBuf {
        let root = temp_dir("mirror");
        for (relative, name) in pages {
            let path = root.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, fixture(name)).unwrap();
        }
        root
    }
}
