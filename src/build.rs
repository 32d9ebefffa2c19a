//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── Renderer::new()          helpers compiled, still no writes
//!     ├── create_output_root()     site/build.<timestamp>
//!     │
//!     ├── first_pass()
//!     │       │
//!     │       ├── templates → render (initial) → write → Vec<BuildTarget>
//!     │       └── css/js/other → minify or copy (deferred when parallel)
//!     │
//!     ├── run_assets()             rayon, only with build.parallel
//!     │
//!     ├── final_pass()
//!     │       │
//!     │       └── every BuildTarget in discovery order → render (final)
//!     │           → pages: minify → validate
//!     │
//!     └── publish()                site/build → build.<timestamp>
//! ```
//!
//! The first pass guarantees every page exists on disk before any final
//! render, which is what lets final-phase helpers link across pages and
//! inline processed assets.

use crate::{
    classify::{self, Exclusions, FileKind},
    config::{SiteConfig, Tool},
    error::BuildError,
    log,
    logger::ProgressBar,
    phase::{BuildPhase, RenderContext},
    publish::{self, OutputRoot},
    render::{Renderer, template_name},
    utils::{
        minify::minify_html,
        tool::{self, TempFile},
    },
};
use anyhow::Result;
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// A template discovered by the walk, re-rendered in the final pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Directory relative to the site root (`""` at the top).
    pub rel_dir: PathBuf,
    pub source_name: String,
    pub output_name: String,
    pub kind: FileKind,
}

impl BuildTarget {
    fn new(rel_dir: &Path, source_name: &str, kind: FileKind, template_ext: &str) -> Self {
        Self {
            rel_dir: rel_dir.to_path_buf(),
            source_name: source_name.to_owned(),
            output_name: classify::output_name(source_name, template_ext).to_owned(),
            kind,
        }
    }

    /// Loader name of the source template.
    pub fn template(&self) -> String {
        template_name(&self.rel_dir.join(&self.source_name))
    }

    pub fn output_rel(&self) -> PathBuf {
        self.rel_dir.join(&self.output_name)
    }

    fn context(&self, phase: BuildPhase, root: &OutputRoot, template_ext: &str) -> RenderContext {
        let name = classify::page_name(&self.source_name, self.kind, template_ext);
        RenderContext::new(
            phase,
            name,
            classify::page_path(&self.rel_dir, name),
            root.path(),
            root.build_id(),
        )
    }
}

/// What a successful build produced.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub output_root: PathBuf,
    pub pages: usize,
    pub templates: usize,
    pub minified: usize,
    pub copied: usize,
}

/// One stylesheet, script or opaque file to bring into the output.
#[derive(Debug, Clone)]
enum AssetStep {
    Minify { tool: Tool, source: PathBuf, dest: PathBuf },
    Copy { source: PathBuf, dest: PathBuf },
}

/// Build the site described by `config` and publish it.
///
/// On failure the half-written `build.<timestamp>` directory is left for
/// inspection and `site/build` keeps pointing at the previous build.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let renderer = Renderer::new(config)?;
    let helper_templates = config.helpers.values().filter_map(|h| h.template.as_ref());
    let exclusions = Exclusions::new(&config.build.exclude, helper_templates);

    let root = publish::create_output_root(&config.root)?;
    log!("build"; "{}", root.dir_name());

    let mut pipeline = Pipeline {
        config,
        renderer,
        report: BuildReport {
            output_root: root.path().to_path_buf(),
            ..BuildReport::default()
        },
        root,
    };

    let (targets, deferred) = pipeline.first_pass(&exclusions)?;
    pipeline.run_assets(deferred)?;
    pipeline.final_pass(&targets)?;

    publish::publish(&config.root, &pipeline.root)?;
    Ok(pipeline.report)
}

struct Pipeline<'a> {
    config: &'a SiteConfig,
    renderer: Renderer,
    root: OutputRoot,
    report: BuildReport,
}

impl Pipeline<'_> {
    fn template_ext(&self) -> &str {
        &self.config.build.template_ext
    }

    /// Walk the site once: mirror directories, render templates with the
    /// initial phase and handle assets.
    ///
    /// Returns the templates for the final pass and, in parallel mode, the
    /// asset steps still to run.
    fn first_pass(&mut self, exclusions: &Exclusions) -> Result<(Vec<BuildTarget>, Vec<AssetStep>), BuildError> {
        let site = self.config.root.clone();
        let mut targets = Vec::new();
        let mut deferred = Vec::new();

        let walker = WalkDir::new(&site)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry
                    .path()
                    .strip_prefix(&site)
                    .is_ok_and(|rel| !exclusions.is_excluded(rel))
            });

        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(site.as_path()).to_path_buf();
                BuildError::fs(path, err.into())
            })?;
            let Ok(rel) = entry.path().strip_prefix(&site) else {
                continue;
            };
            let dest = self.root.path().join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|err| BuildError::fs(&dest, err))?;
                continue;
            }
            // links to directories are neither walked nor copied
            if entry.path_is_symlink() && entry.path().is_dir() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            let rel_dir = rel.parent().unwrap_or(Path::new(""));
            let kind = classify::classify(&file_name, self.template_ext());

            if kind.is_template() {
                let target = BuildTarget::new(rel_dir, &file_name, kind, self.template_ext());
                self.render_initial(&target)?;
                targets.push(target);
                continue;
            }

            let step = self.asset_step(kind, &file_name, entry.path(), dest);
            if self.config.build.parallel {
                deferred.push(step);
            } else {
                self.count(&step);
                run_step(&step, rel, true)?;
            }
        }

        Ok((targets, deferred))
    }

    fn render_initial(&mut self, target: &BuildTarget) -> Result<(), BuildError> {
        let ctx = target.context(BuildPhase::Initial, &self.root, self.template_ext());
        let text = self.renderer.render(&target.template(), &ctx)?;
        let dest = self.root.path().join(target.output_rel());
        fs::write(&dest, text).map_err(|err| BuildError::fs(&dest, err))?;

        match target.kind {
            FileKind::Page => {
                self.report.pages += 1;
                log!("page"; "{}", target.output_rel().display());
            }
            _ => {
                self.report.templates += 1;
                log!("template"; "{}", target.output_rel().display());
            }
        }
        Ok(())
    }

    fn asset_step(&self, kind: FileKind, file_name: &str, source: &Path, dest: PathBuf) -> AssetStep {
        let tool = match kind {
            FileKind::Stylesheet => self.config.tools.css_minifier(),
            FileKind::Script => self.config.tools.js_minifier(),
            _ => None,
        };
        let source = source.to_path_buf();
        match tool {
            Some(tool) if self.config.build.minify && !classify::is_preminified(file_name) => {
                AssetStep::Minify { tool, source, dest }
            }
            _ => AssetStep::Copy { source, dest },
        }
    }

    fn count(&mut self, step: &AssetStep) {
        match step {
            AssetStep::Minify { .. } => self.report.minified += 1,
            AssetStep::Copy { .. } => self.report.copied += 1,
        }
    }

    /// Run deferred asset steps on the rayon pool.
    ///
    /// Assets never read the build phase, so they may run in any order; they
    /// only have to be finished before the final pass starts.
    fn run_assets(&mut self, steps: Vec<AssetStep>) -> Result<(), BuildError> {
        if steps.is_empty() {
            return Ok(());
        }
        for step in &steps {
            self.count(step);
        }

        let site = &self.config.root;
        let progress = ProgressBar::start("assets", steps.len());
        let result = steps.par_iter().try_for_each(|step| {
            let rel = step.source().strip_prefix(site).unwrap_or(step.source());
            run_step(step, rel, progress.is_none())?;
            if let Some(progress) = &progress {
                progress.inc();
            }
            Ok::<(), BuildError>(())
        });
        if let Some(progress) = &progress {
            progress.finish();
        }
        result
    }

    /// Re-render every target with the final phase, in discovery order.
    fn final_pass(&mut self, targets: &[BuildTarget]) -> Result<(), BuildError> {
        for target in targets {
            let ctx = target.context(BuildPhase::Final, &self.root, self.template_ext());
            let text = self.renderer.render(&target.template(), &ctx)?;
            let dest = self.root.path().join(target.output_rel());

            if target.kind == FileKind::Page {
                self.finish_page(&dest, text)?;
            } else {
                fs::write(&dest, text).map_err(|err| BuildError::fs(&dest, err))?;
            }
            log!("final"; "{}", target.output_rel().display());
        }
        Ok(())
    }

    /// HTML chain for a page: minify (optional), then validate (optional).
    fn finish_page(&self, dest: &Path, html: String) -> Result<(), BuildError> {
        let build = &self.config.build;

        match (build.minify, self.config.tools.html_minifier()) {
            (true, Some(minifier)) => {
                let staged = TempFile::beside(dest, "render");
                fs::write(staged.path(), html).map_err(|err| BuildError::fs(staged.path(), err))?;
                tool::invoke(&minifier, staged.path(), dest)?;
            }
            (true, None) => {
                fs::write(dest, minify_html(html.as_bytes())).map_err(|err| BuildError::fs(dest, err))?;
            }
            (false, _) => fs::write(dest, html).map_err(|err| BuildError::fs(dest, err))?,
        }

        if build.validate
            && let Some(validator) = self.config.tools.html_validator()
        {
            tool::validate(&validator, dest)?;
        }
        Ok(())
    }
}

impl AssetStep {
    fn source(&self) -> &Path {
        match self {
            Self::Minify { source, .. } | Self::Copy { source, .. } => source,
        }
    }
}

fn run_step(step: &AssetStep, rel: &Path, log_file: bool) -> Result<(), BuildError> {
    match step {
        AssetStep::Minify { tool, source, dest } => {
            if log_file {
                log!("minify"; "{}", rel.display());
            }
            tool::invoke(tool, source, dest)
        }
        AssetStep::Copy { source, dest } => {
            if log_file {
                log!("copy"; "{}", rel.display());
            }
            fs::copy(source, dest)
                .map(|_| ())
                .map_err(|err| BuildError::fs(source, err))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{
        cli::BuildArgs,
        config::{ConfigError, MANIFEST_NAME},
        error::describe_render_error,
    };
    use chrono::Datelike;
    use std::collections::BTreeMap;
    use tempfile::{TempDir, tempdir};

    /// Strips spaces and newlines.
    const SQUEEZE: &str = r#"["sh", "-c", "tr -d ' \n' < \"$0\" > \"$1\"", "{input}", "{output}"]"#;
    /// Leaves html untouched, so tests can assert exact markup.
    const PASSTHROUGH: &str = r#"["sh", "-c", "cat \"$0\"", "{input}"]"#;
    /// Rejects any page containing `<bad>`.
    const STRICT_VALIDATOR: &str = r#"["sh", "-c", "! grep -q '<bad>' \"$0\"", "{input}"]"#;

    fn site(manifest: &str, files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_NAME), manifest).unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn config(dir: &TempDir) -> SiteConfig {
        SiteConfig::load(&dir.path().join(MANIFEST_NAME), &BuildArgs::default()).unwrap()
    }

    fn build(dir: &TempDir) -> Result<BuildReport> {
        build_site(&config(dir))
    }

    fn published(dir: &TempDir) -> Option<PathBuf> {
        publish::current(&dir.path().canonicalize().unwrap())
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    /// Relative path → contents for every file under `root`.
    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    const NO_MINIFY: &str = "[build]\nminify = false\n";

    #[test]
    fn test_index_contains_current_year() {
        let dir = site(NO_MINIFY, &[("index.html.j2", "<div>{{ current_year() }}</div>\n")]);
        let report = build(&dir).unwrap();

        let year = chrono::Local::now().year();
        assert_eq!(read(&report.output_root, "index.html"), format!("<div>{year}</div>\n"));
        assert_eq!(report.pages, 1);
        assert_eq!(published(&dir), Some(report.output_root));
    }

    #[test]
    fn test_tree_layout_and_naming() {
        let manifest = "[build]\nminify = false\nexclude = [\"node_modules\"]\n\n\
                        [helpers.footer]\ntemplate = \"_partials/footer.html\"\n";
        let dir = site(
            manifest,
            &[
                ("index.html.j2", "{{ footer() }}"),
                ("_partials/footer.html", "<footer>{{ page_name }}</footer>"),
                ("blog/post.html.j2", "{{ page_name }}"),
                ("robots.j2", "User-agent: *"),
                ("app.js.j2", "var page = '{{ page_name }}';"),
                ("img/logo.png", "PNG"),
                ("node_modules/x/index.js", "x"),
                (".DS_Store", ""),
            ],
        );
        let report = build(&dir).unwrap();
        let out = &report.output_root;

        assert_eq!(read(out, "index.html"), "<footer>index</footer>");
        assert_eq!(read(out, "blog/post.html"), "post");
        assert_eq!(read(out, "robots"), "User-agent: *");
        assert_eq!(read(out, "app.js"), "var page = 'app.js';");
        assert_eq!(read(out, "img/logo.png"), "PNG");

        for missing in [
            MANIFEST_NAME,
            "index.html.j2",
            "_partials/footer.html",
            "node_modules",
            ".DS_Store",
        ] {
            assert!(!out.join(missing).exists(), "{missing} should not be published");
        }
        // helper template directory is still mirrored, just empty
        assert!(out.join("_partials").is_dir());

        assert_eq!(report.pages, 2);
        assert_eq!(report.templates, 2);
        assert_eq!(report.copied, 1);
    }

    #[test]
    fn test_preminified_copied_verbatim() {
        let manifest = format!("[tools]\ncss_minifier = {SQUEEZE}\n");
        let vendor = "a { color: red; }\n";
        let dir = site(
            &manifest,
            &[("res/vendor.min.css", vendor), ("res/main.css", "body {\n  margin: 0;\n}\n")],
        );
        let report = build(&dir).unwrap();

        assert_eq!(read(&report.output_root, "res/vendor.min.css"), vendor);
        assert_eq!(read(&report.output_root, "res/main.css"), "body{margin:0;}");
        assert_eq!(report.minified, 1);
        assert_eq!(report.copied, 1);
    }

    #[test]
    fn test_minify_off_copies_assets() {
        let manifest = format!("[build]\nminify = false\n\n[tools]\ncss_minifier = {SQUEEZE}\n");
        let css = "body {\n  margin: 0;\n}\n";
        let dir = site(&manifest, &[("main.css", css), ("index.html.j2", "<p>\n  hi\n</p>\n")]);
        let report = build(&dir).unwrap();

        assert_eq!(read(&report.output_root, "main.css"), css);
        assert_eq!(read(&report.output_root, "index.html"), "<p>\n  hi\n</p>\n");
    }

    #[test]
    fn test_builtin_html_minifier() {
        let page = "<html>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>\n";
        let dir = site("", &[("index.html.j2", page)]);
        let report = build(&dir).unwrap();

        let html = read(&report.output_root, "index.html");
        assert!(html.contains("<p>Hello</p>"));
        assert!(!html.contains("\n  "));
    }

    #[test]
    fn test_external_html_minifier() {
        let manifest = format!("[tools]\nhtml_minifier = {SQUEEZE}\n");
        let dir = site(&manifest, &[("index.html.j2", "<p>\n  a b\n</p>\n"), ("feed.xml.j2", "<a> b </a>")]);
        let report = build(&dir).unwrap();

        assert_eq!(read(&report.output_root, "index.html"), "<p>ab</p>");
        // only pages go through the html chain
        assert_eq!(read(&report.output_root, "feed.xml"), "<a> b </a>");
    }

    #[test]
    fn test_validator_failure_keeps_previous_build() {
        let manifest = format!("[build]\nminify = false\nvalidate = true\n\n[tools]\nhtml_validator = {STRICT_VALIDATOR}\n");
        let dir = site(&manifest, &[("index.html.j2", "<p>fine</p>")]);
        let good = build(&dir).unwrap();
        assert_eq!(published(&dir), Some(good.output_root.clone()));

        fs::write(dir.path().join("about.html.j2"), "<bad>").unwrap();
        let err = build(&dir).unwrap_err();
        let build_err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(build_err, BuildError::Tool { tool, .. } if tool == "html_validator"));
        assert!(err.to_string().contains("about.html"));

        assert_eq!(published(&dir), Some(good.output_root.clone()));
        let failed: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter_map(|e| publish::parse_build_dir_name(&e.file_name().to_string_lossy()))
            .collect();
        assert_eq!(failed.len(), 2, "failed output root stays on disk");
    }

    #[test]
    fn test_render_failure_is_not_published() {
        let dir = site(NO_MINIFY, &[("index.html.j2", "{{ missing_variable }}")]);
        let err = build(&dir).unwrap_err();

        let Some(BuildError::Render { template, source }) = err.downcast_ref::<BuildError>() else {
            panic!("expected render error, got {err:#}");
        };
        assert_eq!(template, "index.html.j2");
        assert!(!describe_render_error(source).is_empty());
        assert!(published(&dir).is_none());
    }

    #[test]
    fn test_final_pass_sees_every_page() {
        // `zzz/last` sorts after `index`, so it only exists once the
        // initial pass is complete.
        let dir = site(
            NO_MINIFY,
            &[
                ("index.html.j2", "<a href=\"{{ page_link('zzz/last') }}\">last</a>"),
                ("zzz/last.html.j2", "<a href=\"{{ page_link('') }}\">home</a>"),
            ],
        );
        let report = build(&dir).unwrap();
        assert_eq!(read(&report.output_root, "index.html"), "<a href=\"/zzz/last\">last</a>");
        assert_eq!(read(&report.output_root, "zzz/last.html"), "<a href=\"/\">home</a>");
    }

    #[test]
    fn test_link_to_missing_page_fails() {
        let dir = site(NO_MINIFY, &[("index.html.j2", "{{ page_link('nowhere') }}")]);
        let err = build(&dir).unwrap_err();
        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::Render { .. })));
        assert!(published(&dir).is_none());
    }

    #[test]
    fn test_entry_page_inlines_processed_css() {
        let manifest = format!("[tools]\ncss_minifier = {SQUEEZE}\nhtml_minifier = {PASSTHROUGH}\n");
        let page = "{{ inline_css('res/main.css') }}";
        let dir = site(
            &manifest,
            &[
                ("index.html.j2", page),
                ("about.html.j2", page),
                ("res/main.css", "body {\n  color: red;\n}\n"),
            ],
        );
        let report = build(&dir).unwrap();
        let id = report.output_root.file_name().unwrap().to_string_lossy().replace("build.", "");

        assert_eq!(read(&report.output_root, "index.html"), "<style>body{color:red;}</style>");
        assert_eq!(
            read(&report.output_root, "about.html"),
            format!(r#"<link rel="stylesheet" href="/res/main.css?v={id}">"#)
        );
    }

    #[test]
    fn test_emit_helper_writes_into_output() {
        let manifest = "[build]\nminify = false\n\n\
                        [helpers.theme_css]\nsnippet = \"body { color: {{ color }} }\"\n\
                        params = [\"color\"]\nemit = \"res/theme.css\"\n";
        let dir = site(manifest, &[("index.html.j2", "<link href=\"{{ theme_css('red') }}\">")]);
        let report = build(&dir).unwrap();

        assert_eq!(read(&report.output_root, "index.html"), "<link href=\"/res/theme.css\">");
        assert_eq!(read(&report.output_root, "res/theme.css"), "body { color: red }");
    }

    #[test]
    fn test_builds_differ_only_in_token() {
        let manifest = format!("[tools]\ncss_minifier = {SQUEEZE}\n");
        let files = [
            ("index.html.j2", "<p>{{ asset_url('main.css') }} {{ current_year() }}</p>"),
            ("blog/index.html.j2", "{{ inline_css('main.css') }}"),
            ("main.css", "p { margin: 0 }"),
            ("logo.png", "PNG"),
        ];
        let dir = site(&manifest, &files);

        let first = build(&dir).unwrap();
        let second = build(&dir).unwrap();
        assert_ne!(first.output_root, second.output_root);

        let token = |report: &BuildReport| {
            report
                .output_root
                .file_name()
                .unwrap()
                .to_string_lossy()
                .replace("build.", "")
        };
        let normalize = |report: &BuildReport| -> BTreeMap<PathBuf, String> {
            let id = format!("?v={}", token(report));
            snapshot(&report.output_root)
                .into_iter()
                .map(|(path, bytes)| (path, String::from_utf8_lossy(&bytes).replace(&id, "?v=TOKEN")))
                .collect()
        };
        assert_eq!(normalize(&first), normalize(&second));
    }

    #[test]
    fn test_parallel_assets_match_sequential() {
        let manifest = format!(
            "[tools]\ncss_minifier = {SQUEEZE}\njs_minifier = {SQUEEZE}\nhtml_minifier = {PASSTHROUGH}\n"
        );
        let files = [
            ("index.html.j2", "{{ inline_js('js/app.js') }}"),
            ("a.css", "a { b: c }"),
            ("b.css", "d { e: f }"),
            ("js/app.js", "let x = 1;\n"),
            ("js/lib.min.js", "let y = 2;\n"),
            ("font.woff2", "FONT"),
        ];
        let sequential = site(&manifest, &files);
        let parallel = site(&format!("[build]\nparallel = true\n\n{manifest}"), &files);

        let seq = build(&sequential).unwrap();
        let par = build(&parallel).unwrap();

        assert_eq!(read(&par.output_root, "index.html"), "<script>letx=1;</script>");
        assert_eq!(snapshot(&seq.output_root), snapshot(&par.output_root));
        assert_eq!((par.minified, par.copied), (3, 2));
    }

    #[test]
    fn test_no_temp_files_left() {
        let manifest = format!("[tools]\ncss_minifier = {SQUEEZE}\nhtml_minifier = {SQUEEZE}\n");
        let dir = site(&manifest, &[("index.html.j2", "<p> x </p>"), ("main.css", "a { }")]);
        let report = build(&dir).unwrap();

        let leftovers: Vec<_> = snapshot(&report.output_root)
            .into_keys()
            .filter(|p| p.to_string_lossy().ends_with(classify::TEMP_SUFFIX))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_previous_builds_are_not_walked() {
        let dir = site(NO_MINIFY, &[("index.html.j2", "x")]);
        build(&dir).unwrap();
        let second = build(&dir).unwrap();

        let names: Vec<_> = fs::read_dir(&second.output_root)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["index.html"]);
    }

    #[test]
    fn test_bad_helper_writes_nothing() {
        let manifest = "[helpers.broken]\nsnippet = \"{% if %}\"\n";
        let dir = site(manifest, &[("index.html.j2", "{{ broken() }}")]);
        let err = build(&dir).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some(), "{err:#}");

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![MANIFEST_NAME, "index.html.j2"]);
        assert!(published(&dir).is_none());
    }

    #[test]
    fn test_dot_directory_templates() {
        let dir = site(
            NO_MINIFY,
            &[
                ("index.html.j2", "home"),
                (".well-known/security.txt.j2", "Contact: mailto:{{ page_name }}@example.org\n"),
                (".well-known/keys.asc", "KEY"),
            ],
        );
        let report = build(&dir).unwrap();
        assert_eq!(
            read(&report.output_root, ".well-known/security.txt"),
            "Contact: mailto:security.txt@example.org\n"
        );
        assert_eq!(read(&report.output_root, ".well-known/keys.asc"), "KEY");
    }

    #[test]
    fn test_directory_links_are_skipped() {
        let dir = site(NO_MINIFY, &[("index.html.j2", "home"), ("shared/a.txt", "A")]);
        std::os::unix::fs::symlink("shared", dir.path().join("linked")).unwrap();
        std::os::unix::fs::symlink("shared/a.txt", dir.path().join("alias.txt")).unwrap();

        let report = build(&dir).unwrap();
        let out = &report.output_root;
        assert_eq!(read(out, "shared/a.txt"), "A");
        assert!(out.join("linked").symlink_metadata().is_err());
        // file links are copied as their target
        assert_eq!(read(out, "alias.txt"), "A");
    }

    #[test]
    fn test_target_naming() {
        let target = BuildTarget::new(Path::new("blog"), "index.html.j2", FileKind::Page, "j2");
        assert_eq!(target.template(), "blog/index.html.j2");
        assert_eq!(target.output_rel(), PathBuf::from("blog/index.html"));

        let root_dir = tempdir().unwrap();
        let root = publish::create_output_root(root_dir.path()).unwrap();
        let ctx = target.context(BuildPhase::Final, &root, "j2");
        assert_eq!(ctx.page_name, "index");
        assert_eq!(ctx.page_path, "blog");
        assert_eq!(ctx.build_id, root.build_id());
    }
}
