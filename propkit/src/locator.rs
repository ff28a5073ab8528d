//! Resolution of resource descriptors to absolute file paths.
//!
//! The resource root is chosen once from the [`DeploymentMode`]: packaged
//! builds keep `resources/` next to their extraction directory, source
//! checkouts keep it at the workspace root.

use std::{
    env,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, error, warn};

use crate::{
    error::Error,
    traits::{FileResolver, TemplateSource},
    types::{LANGUAGE_PLACEHOLDER, Language, ResourceDescriptor, Scheme, TypedValue},
};

/// Set by the bundler to the directory the application was extracted to.
pub const BUNDLE_DIR_ENV: &str = "PROPKIT_BUNDLE_DIR";
/// Explicit resource root, overriding the deployment probe.
pub const RESOURCE_ROOT_ENV: &str = "PROPKIT_RESOURCE_ROOT";
/// Directory name of the resource root.
pub const RESOURCES_DIR: &str = "resources";

/// Where the application is running from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Packaged bundle; resources live in `<extraction_dir>/../resources`.
    Bundled { extraction_dir: PathBuf },
    /// Source checkout; resources live in `<project_root>/resources`.
    Source { project_root: PathBuf },
}

impl DeploymentMode {
    /// Probes the environment. Reads only, never writes.
    pub fn detect() -> Self {
        match env::var_os(BUNDLE_DIR_ENV) {
            Some(dir) if !dir.is_empty() => DeploymentMode::Bundled {
                extraction_dir: PathBuf::from(dir),
            },
            _ => DeploymentMode::Source {
                project_root: normalize_path(&Path::new(env!("CARGO_MANIFEST_DIR")).join("..")),
            },
        }
    }

    pub fn resource_root(&self) -> PathBuf {
        match self {
            DeploymentMode::Bundled { extraction_dir } => {
                normalize_path(&extraction_dir.join("..").join(RESOURCES_DIR))
            }
            DeploymentMode::Source { project_root } => {
                normalize_path(&project_root.join(RESOURCES_DIR))
            }
        }
    }
}

/// Lexically normalises a path: drops `.` and folds `..` into its parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Turns descriptors into validated absolute paths under one resource root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocator {
    root: PathBuf,
}

impl ResourceLocator {
    /// A relative root is anchored at the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root: normalize_path(&root),
        }
    }

    /// Uses `PROPKIT_RESOURCE_ROOT` when set, otherwise the probed deployment mode.
    pub fn from_env() -> Self {
        match env::var_os(RESOURCE_ROOT_ENV) {
            Some(root) if !root.is_empty() => Self::new(PathBuf::from(root)),
            _ => Self::from_mode(&DeploymentMode::detect()),
        }
    }

    pub fn from_mode(mode: &DeploymentMode) -> Self {
        Self::new(mode.resource_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a path relative to the resource root; the file must exist.
    pub fn resolve_classpath(&self, relative_path: &str) -> Result<PathBuf, Error> {
        let full_path = normalize_path(&self.root.join(relative_path.trim()));
        if !full_path.exists() {
            error!(path = %full_path.display(), "resource file not found");
            return Err(Error::not_found(full_path));
        }
        debug!(path = %full_path.display(), "resource file found");
        Ok(full_path)
    }

    /// Resolves any descriptor. `i18n` descriptors look their key up through
    /// `templates` and substitute `language` into the resulting path template.
    pub fn resolve(
        &self,
        descriptor: &ResourceDescriptor,
        templates: &dyn TemplateSource,
        language: Language,
    ) -> Result<PathBuf, Error> {
        match descriptor.scheme {
            Scheme::Classpath => self.resolve_classpath(&descriptor.path_or_key),
            Scheme::I18n => {
                let key = &descriptor.path_or_key;
                let template = match templates.template_value(key)? {
                    Some(TypedValue::Str(template)) => template,
                    _ => return Err(Error::MissingTemplate(key.clone())),
                };
                let relative_path = substitute_language(&template, language);
                debug!(%key, %language, %relative_path, "resolved i18n template");
                self.resolve_classpath(&relative_path)
            }
        }
    }
}

impl FileResolver for ResourceLocator {
    fn resolve_file(&self, relative_path: &str) -> Result<PathBuf, Error> {
        self.resolve_classpath(relative_path)
    }
}

/// Replaces every `{language}` placeholder with the language code.
pub fn substitute_language(template: &str, language: Language) -> String {
    if !template.contains(LANGUAGE_PLACEHOLDER) {
        warn!(%template, "i18n path template has no {{language}} placeholder");
    }
    template.replace(LANGUAGE_PLACEHOLDER, language.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Templates(Option<TypedValue>);

    impl TemplateSource for Templates {
        fn template_value(&self, _key: &str) -> Result<Option<TypedValue>, Error> {
            Ok(self.0.clone())
        }
    }

    fn resource_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("i18n")).unwrap();
        fs::write(temp_dir.path().join("i18n/main_en_US.properties"), "a=b").unwrap();
        fs::write(temp_dir.path().join("i18n/main_zh_CN.properties"), "a=c").unwrap();
        temp_dir
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize_path(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(normalize_path(Path::new("../x/..")), PathBuf::from(".."));
    }

    #[test]
    fn test_deployment_mode_resource_roots() {
        let bundled = DeploymentMode::Bundled {
            extraction_dir: PathBuf::from("/opt/app/_internal"),
        };
        assert_eq!(bundled.resource_root(), PathBuf::from("/opt/app/resources"));

        let source = DeploymentMode::Source {
            project_root: PathBuf::from("/src/project"),
        };
        assert_eq!(source.resource_root(), PathBuf::from("/src/project/resources"));
    }

    #[test]
    fn test_source_mode_points_at_workspace_resources() {
        let mode = DeploymentMode::Source {
            project_root: normalize_path(&Path::new(env!("CARGO_MANIFEST_DIR")).join("..")),
        };
        assert!(mode.resource_root().join("config/ui.properties").exists());
    }

    #[test]
    fn test_resolve_classpath_existing_and_missing() {
        let tree = resource_tree();
        let locator = ResourceLocator::new(tree.path());

        let found = locator.resolve_classpath("i18n/main_en_US.properties").unwrap();
        assert!(found.is_absolute());
        assert!(found.ends_with("i18n/main_en_US.properties"));

        let err = locator.resolve_classpath("i18n/nope.properties").unwrap_err();
        assert!(matches!(
            err,
            Error::ResourceNotFound { ref path } if path.ends_with("nope.properties")
        ));
    }

    #[test]
    fn test_resolve_i18n_substitutes_language() {
        let tree = resource_tree();
        let locator = ResourceLocator::new(tree.path());
        let templates = Templates(Some(TypedValue::Str(
            "i18n/main_{language}.properties".to_string(),
        )));
        let descriptor = ResourceDescriptor::i18n("common.i18n.main");

        let en = locator.resolve(&descriptor, &templates, Language::EnUs).unwrap();
        assert!(en.ends_with("main_en_US.properties"));
        let zh = locator.resolve(&descriptor, &templates, Language::ZhCn).unwrap();
        assert!(zh.ends_with("main_zh_CN.properties"));
    }

    #[test]
    fn test_resolve_i18n_without_template_fails() {
        let tree = resource_tree();
        let locator = ResourceLocator::new(tree.path());
        let descriptor = ResourceDescriptor::i18n("common.i18n.main");

        let err = locator
            .resolve(&descriptor, &Templates(None), Language::EnUs)
            .unwrap_err();
        assert!(matches!(err, Error::MissingTemplate(ref key) if key == "common.i18n.main"));

        let err = locator
            .resolve(&descriptor, &Templates(Some(TypedValue::Int(3))), Language::EnUs)
            .unwrap_err();
        assert!(matches!(err, Error::MissingTemplate(_)));
    }

    #[test]
    fn test_substitute_language() {
        assert_eq!(
            substitute_language("i18n/{language}/game.properties", Language::ZhCn),
            "i18n/zh_CN/game.properties"
        );
    }
}
