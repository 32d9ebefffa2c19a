//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[build]` section in gen.toml - pipeline switches.
///
/// # Example
/// ```toml
/// [build]
/// template_ext = "j2"     # index.html.j2 → index.html
/// minify = true           # run configured minifiers
/// validate = false        # run the HTML validator on every page
/// parallel = false        # process css/js/opaque files on a thread pool
/// exclude = ["node_modules", "drafts"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Template suffix, without the leading dot.
    #[serde(default = "defaults::build::template_ext")]
    #[educe(Default = defaults::build::template_ext())]
    pub template_ext: String,

    /// Minify HTML, stylesheets and scripts.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub minify: bool,

    /// Structurally validate every rendered page. Independent of `minify`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub validate: bool,

    /// Run stylesheet/script/opaque steps concurrently after the walk.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub parallel: bool,

    /// Extra file or directory names pruned anywhere in the tree.
    #[serde(default = "defaults::build::exclude")]
    #[educe(Default = defaults::build::exclude())]
    pub exclude: Vec<String>,
}

impl BuildConfig {
    /// `.j2`
    pub fn template_suffix(&self) -> String {
        format!(".{}", self.template_ext)
    }
}
