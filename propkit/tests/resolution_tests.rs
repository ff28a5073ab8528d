use propkit::types::Color;
use propkit::{Context, Error, Language, ResourceType, TypedValue};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn resource_tree() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "config/ui.properties",
        r"# UI configuration
window.width.int = 1024
window.height.int = 768
window.resizable.bool = yes
window.fullscreen.bool =
window.scale.float = 1.25
view.splash.background.color = #336699
view.splash.texture.color = 300, -5
view.splash.logo.file = images/logo.txt
common.i18n.main = i18n/main_{language}.properties
common.i18n.game = i18n/game_{language}.properties
",
    );
    write(
        root,
        "i18n/main_zh_CN.properties",
        "window.title.default.str=\\u5854\\u9632\n",
    );
    write(
        root,
        "i18n/main_en_US.properties",
        "window.title.default.str=Tower Defense\n",
    );
    write(root, "i18n/game_zh_CN.properties", "menu.start=\\u5f00\\u59cb\n");
    write(root, "i18n/game_en_US.properties", "menu.start=Start\n");
    write(root, "images/logo.txt", "logo");
    temp_dir
}

fn context_for(tree: &TempDir) -> Context {
    Context::builder().resource_root(tree.path()).build()
}

#[test]
fn test_ui_config_values_are_coerced_by_suffix() {
    let tree = resource_tree();
    let context = context_for(&tree);

    assert_eq!(context.config("window.width").unwrap(), Some(TypedValue::Int(1024)));
    assert_eq!(context.config("window.scale").unwrap(), Some(TypedValue::Float(1.25)));
    assert_eq!(context.config("window.resizable").unwrap(), Some(TypedValue::Bool(true)));
    assert_eq!(context.config("window.fullscreen").unwrap(), Some(TypedValue::Bool(false)));
    assert_eq!(
        context.config("view.splash.background").unwrap(),
        Some(TypedValue::Color(Color::rgb(51, 102, 153)))
    );
    assert_eq!(
        context.config("view.splash.texture").unwrap(),
        Some(TypedValue::Color(Color::rgba(255, 0, 0, 255)))
    );

    let logo = context.config("view.splash.logo").unwrap().unwrap();
    let logo: PathBuf = logo.as_path().unwrap().to_path_buf();
    assert!(logo.is_absolute());
    assert_eq!(fs::read_to_string(logo).unwrap(), "logo");
}

#[test]
fn test_suffixed_key_is_not_visible_under_its_raw_name() {
    let tree = resource_tree();
    let context = context_for(&tree);
    assert_eq!(context.config("window.width.int").unwrap(), None);
}

#[test]
fn test_repeated_reads_load_file_once() {
    let tree = resource_tree();
    let context = context_for(&tree);

    let first = context.config("window.width").unwrap();
    let second = context.config("window.width").unwrap();
    assert_eq!(first, second);
    assert_eq!(context.cache().load_count(), 1);

    // Changing the file afterwards is not observed: no hot reload.
    write(tree.path(), "config/ui.properties", "window.width.int=1\n");
    assert_eq!(context.config("window.width").unwrap(), first);
    assert_eq!(context.cache().load_count(), 1);
}

#[test]
fn test_language_switch_reloads_only_localized_bundles() {
    let tree = resource_tree();
    let context = context_for(&tree);

    assert_eq!(
        context.i18n_main("window.title.default").unwrap().as_deref(),
        Some("塔防")
    );
    assert_eq!(context.i18n_game("menu.start").unwrap().as_deref(), Some("开始"));
    let width_before = context.config("window.width").unwrap();
    let loads_before = context.cache().load_count();

    context.switch_language(Some(Language::EnUs));

    assert_eq!(
        context.i18n_main("window.title.default").unwrap().as_deref(),
        Some("Tower Defense")
    );
    assert_eq!(context.i18n_game("menu.start").unwrap().as_deref(), Some("Start"));
    assert_eq!(context.config("window.width").unwrap(), width_before);
    // Two bundles reloaded; the UI table stayed cached.
    assert_eq!(context.cache().load_count(), loads_before + 2);
}

#[test]
fn test_switch_to_same_language_notifies_every_hook() {
    let tree = resource_tree();
    let context = context_for(&tree);
    let count = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&count);
    context.on_language_changed(move |_| *counter.lock().unwrap() += 1);

    context.switch_language(Some(Language::ZhCn));
    context.switch_language(Some(Language::ZhCn));
    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn test_caption_hook_sees_new_language_on_first_switch() {
    let tree = resource_tree();
    let context = context_for(&tree);
    let captions = Arc::new(Mutex::new(Vec::new()));

    assert!(context.i18n_main("window.title.default").unwrap().is_some());

    let hook_context = context.clone();
    let hook_captions = Arc::clone(&captions);
    context.on_language_changed(move |_| {
        let caption = hook_context.i18n_main("window.title.default").unwrap();
        hook_captions.lock().unwrap().push(caption.unwrap_or_default());
    });

    context.switch_language(Some(Language::EnUs));
    assert_eq!(*captions.lock().unwrap(), vec!["Tower Defense".to_string()]);
}

#[test]
fn test_blank_key_and_missing_type_skip_io() {
    let tree = resource_tree();
    let context = context_for(&tree);
    assert_eq!(context.config("  ").unwrap(), None);
    assert_eq!(context.cache().get("window.width", None).unwrap(), None);
    assert_eq!(context.cache().load_count(), 0);
}

#[test]
fn test_missing_bundle_is_fatal_and_retried_next_read() {
    let tree = resource_tree();
    fs::remove_file(tree.path().join("i18n/main_en_US.properties")).unwrap();
    let context = Context::builder()
        .resource_root(tree.path())
        .language(Language::EnUs)
        .build();

    let err = context.i18n_main("window.title.default").unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound { .. }));
    assert!(!context.cache().is_loaded(ResourceType::I18nMain));

    write(
        tree.path(),
        "i18n/main_en_US.properties",
        "window.title.default=Back\n",
    );
    assert_eq!(
        context.i18n_main("window.title.default").unwrap().as_deref(),
        Some("Back")
    );
}

#[test]
fn test_malformed_int_fails_the_whole_load() {
    let tree = resource_tree();
    write(tree.path(), "config/ui.properties", "window.width.int=wide\n");
    let context = context_for(&tree);
    let err = context.config("anything").unwrap_err();
    assert!(matches!(err, Error::InvalidInt { ref key, .. } if key == "window.width"));
}

#[test]
fn test_missing_file_reference_is_fatal() {
    let tree = resource_tree();
    fs::remove_file(tree.path().join("images/logo.txt")).unwrap();
    let context = context_for(&tree);
    assert!(matches!(
        context.config("window.width"),
        Err(Error::ResourceNotFound { .. })
    ));
}

#[test]
fn test_shipped_resources_load_in_every_language() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../resources");
    let context = Context::builder().resource_root(root).build();

    assert!(matches!(context.config("window.width").unwrap(), Some(TypedValue::Int(_))));
    for language in Language::ALL {
        context.switch_language(Some(language));
        let title = context.i18n_main("window.title.default").unwrap();
        assert!(title.is_some_and(|t| !t.is_empty()), "no title for {language}");
        assert!(context.i18n_game("game.menu.start").unwrap().is_some());
    }
}
