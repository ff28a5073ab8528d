//! Terminal rendition of the application shell.
//!
//! A [`Window`] hosts one view at a time and renders it as a text frame with
//! the localized caption on top. The window follows language switches and
//! view changes through hooks, so every switch produces a fresh frame.

use std::{
    fs,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use propkit::{
    Color, Context, Error, Language, ResourceType, SubscriptionId, View, ViewRegistry, ViewType,
    color::format_color,
};
use tracing::{debug, warn};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Key of the window's "view changed" callback.
pub const WINDOW_VIEW_HOOK: &str = "window_change_view";
/// I18n key of the window caption.
pub const CAPTION_KEY: &str = "window.title.default";

const DEFAULT_WIDTH: i64 = 1280;
const DEFAULT_HEIGHT: i64 = 720;
const PIXELS_PER_COLUMN: i64 = 16;
const PIXELS_PER_ROW: i64 = 48;

/// A view the window can draw.
pub trait ShellView: View {
    /// Body lines of the view, without the window chrome.
    fn draw(&self) -> Result<Vec<String>, Error>;
}

pub type Views = ViewRegistry<dyn ShellView>;

/// Startup view: logo, loading text and the configured colours.
pub struct SplashView {
    context: Context,
    background: Color,
    texture: Color,
    logo: String,
}

impl SplashView {
    pub fn new(context: &Context) -> Result<Self, Error> {
        let cache = context.cache();
        let background = cache
            .get_color("view.splash.background", ResourceType::UiConfig)?
            .unwrap_or_default();
        let texture = cache
            .get_color("view.splash.texture", ResourceType::UiConfig)?
            .unwrap_or_default();
        let logo = match cache.get_path("view.splash.logo", ResourceType::UiConfig)? {
            Some(path) => fs::read_to_string(&path)?,
            None => String::new(),
        };

        Ok(Self {
            context: context.clone(),
            background,
            texture,
            logo,
        })
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn texture(&self) -> Color {
        self.texture
    }

    pub fn logo(&self) -> &str {
        &self.logo
    }
}

impl View for SplashView {
    fn name(&self) -> &str {
        "splash"
    }
}

impl ShellView for SplashView {
    fn draw(&self) -> Result<Vec<String>, Error> {
        let mut lines: Vec<String> = self.logo.lines().map(str::to_string).collect();
        lines.push(String::new());
        if let Some(loading) = self.context.i18n_main("view.splash.loading")? {
            lines.push(loading);
        }
        lines.push(format!(
            "background {}  texture {}",
            format_color(self.background),
            format_color(self.texture)
        ));
        Ok(lines)
    }
}

/// A list of localized labels read from one bundle at draw time.
pub struct MenuView {
    context: Context,
    name: &'static str,
    resource_type: ResourceType,
    keys: &'static [&'static str],
}

impl MenuView {
    pub fn main(context: &Context) -> Self {
        Self {
            context: context.clone(),
            name: "main",
            resource_type: ResourceType::I18nMain,
            keys: &["window.title.default", "language.name"],
        }
    }

    pub fn game(context: &Context) -> Self {
        Self {
            context: context.clone(),
            name: "game",
            resource_type: ResourceType::I18nGame,
            keys: &["game.menu.start", "game.menu.exit"],
        }
    }
}

impl View for MenuView {
    fn name(&self) -> &str {
        self.name
    }
}

impl ShellView for MenuView {
    fn draw(&self) -> Result<Vec<String>, Error> {
        let cache = self.context.cache();
        self.keys
            .iter()
            .map(|key| {
                let label = cache.get_str(key, self.resource_type)?;
                Ok(format!("> {}", label.unwrap_or_else(|| key.to_string())))
            })
            .collect()
    }
}

/// Declares a factory for every [`ViewType`].
pub fn declare_views(views: &Views, context: &Context) {
    let splash_context = context.clone();
    views.declare(ViewType::Splash, move || {
        Ok(Arc::new(SplashView::new(&splash_context)?) as Arc<dyn ShellView>)
    });
    let main_context = context.clone();
    views.declare(ViewType::Main, move || {
        Ok(Arc::new(MenuView::main(&main_context)) as Arc<dyn ShellView>)
    });
    let game_context = context.clone();
    views.declare(ViewType::Game, move || {
        Ok(Arc::new(MenuView::game(&game_context)) as Arc<dyn ShellView>)
    });
}

struct WindowState {
    context: Context,
    views: Arc<Views>,
    width: i64,
    height: i64,
    caption: Mutex<String>,
    frames: Mutex<Vec<String>>,
}

impl WindowState {
    fn refresh_caption(&self, language: Language) {
        match self.context.i18n_main(CAPTION_KEY) {
            Ok(Some(caption)) => {
                debug!(%language, %caption, "refreshing window caption");
                *self.caption.lock() = caption;
            }
            Ok(None) => warn!(%language, key = CAPTION_KEY, "caption missing from bundle"),
            Err(e) => warn!(%language, error = %e, "failed to refresh caption"),
        }
    }

    fn redraw(&self) {
        if let Err(e) = self.render() {
            warn!(error = %e, "failed to redraw window");
        }
    }

    fn render(&self) -> Result<String, Error> {
        let view = self.views.get_current()?;
        let body = view.draw()?;
        let caption = self.caption.lock().clone();
        let columns = (self.width / PIXELS_PER_COLUMN).clamp(24, 120) as usize;
        let rows = (self.height / PIXELS_PER_ROW).clamp(3, 40) as usize;

        let frame = render_frame(&caption, view.name(), &body, columns, rows);
        self.frames.lock().push(frame.clone());
        Ok(frame)
    }
}

/// The application window.
///
/// Dropping the window removes its language and view hooks.
pub struct Window {
    state: Arc<WindowState>,
    language_hook: SubscriptionId,
    owns_view_hook: bool,
}

impl Window {
    /// Reads size and caption and registers the window's hooks. The context
    /// must already be built, so the cache invalidation hook runs first.
    pub fn new(context: &Context, views: Arc<Views>) -> Result<Self, Error> {
        let cache = context.cache();
        let width = cache
            .get_int("window.width", ResourceType::UiConfig)?
            .unwrap_or(DEFAULT_WIDTH);
        let height = cache
            .get_int("window.height", ResourceType::UiConfig)?
            .unwrap_or(DEFAULT_HEIGHT);
        let caption = context.i18n_main(CAPTION_KEY)?.unwrap_or_default();

        let state = Arc::new(WindowState {
            context: context.clone(),
            views,
            width,
            height,
            caption: Mutex::new(caption),
            frames: Mutex::new(Vec::new()),
        });

        let weak: Weak<WindowState> = Arc::downgrade(&state);
        let language_hook = context.on_language_changed(move |language| {
            if let Some(state) = weak.upgrade() {
                state.refresh_caption(language);
                state.redraw();
            }
        });

        let weak: Weak<WindowState> = Arc::downgrade(&state);
        let owns_view_hook = state.views.on_change(WINDOW_VIEW_HOOK, move || {
            if let Some(state) = weak.upgrade() {
                state.redraw();
            }
        });
        if !owns_view_hook {
            warn!(key = WINDOW_VIEW_HOOK, "view hook already registered by another window");
        }

        Ok(Self {
            state,
            language_hook,
            owns_view_hook,
        })
    }

    pub fn caption(&self) -> String {
        self.state.caption.lock().clone()
    }

    pub fn size(&self) -> (i64, i64) {
        (self.state.width, self.state.height)
    }

    /// Renders the current view and records the frame.
    pub fn show(&self) -> Result<String, Error> {
        self.state.render()
    }

    /// Every frame rendered so far, oldest first.
    pub fn frames(&self) -> Vec<String> {
        self.state.frames.lock().clone()
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.state.context.languages().unsubscribe(self.language_hook);
        if self.owns_view_hook {
            self.state.views.off_change(WINDOW_VIEW_HOOK);
        }
    }
}

fn render_frame(
    caption: &str,
    view_name: &str,
    body: &[String],
    columns: usize,
    rows: usize,
) -> String {
    let border = format!("+{}+", "-".repeat(columns + 2));
    let tag = format!("[{view_name}]");
    let caption_width = columns.saturating_sub(tag.width() + 1);
    let title = format!("{} {}", fit(caption, caption_width), tag);

    let mut lines = vec![
        border.clone(),
        format!("| {} |", fit(&title, columns)),
        border.clone(),
    ];
    for row in 0..rows {
        let text = body.get(row).map(String::as_str).unwrap_or("");
        lines.push(format!("| {} |", fit(text, columns)));
    }
    lines.push(border);
    lines.join("\n")
}

/// Pads or truncates to exactly `columns` display cells.
fn fit(text: &str, columns: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > columns {
            break;
        }
        out.push(ch);
        used += width;
    }
    out.push_str(&" ".repeat(columns - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn resource_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let files: [(&str, &str); 5] = [
            (
                "config/ui.properties",
                "window.width.int=640\n\
                 window.height.int=240\n\
                 common.i18n.main=i18n/main_{language}.properties\n\
                 common.i18n.game=i18n/game_{language}.properties\n\
                 view.splash.background.color=#102030\n\
                 view.splash.texture.color=1, 2, 3, 4\n\
                 view.splash.logo.file=logo.txt\n",
            ),
            (
                "i18n/main_zh_CN.properties",
                "window.title.default.str=\\u5854\\u9632\nview.splash.loading.str=\\u52a0\\u8f7d\n",
            ),
            (
                "i18n/main_en_US.properties",
                "window.title.default.str=Towers\nview.splash.loading.str=Loading\n",
            ),
            ("i18n/game_en_US.properties", "game.menu.start.str=Start\n"),
            ("logo.txt", "<LOGO>\n"),
        ];
        for (relative, content) in files {
            let path = root.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    fn setup(root: &Path) -> (Context, Arc<Views>, Window) {
        let context = Context::builder().resource_root(root).build();
        let views = Arc::new(Views::default());
        declare_views(&views, &context);
        let window = Window::new(&context, Arc::clone(&views)).unwrap();
        (context, views, window)
    }

    #[test]
    fn test_window_reads_size_and_caption() {
        let tree = resource_tree();
        let (_, _, window) = setup(tree.path());
        assert_eq!(window.size(), (640, 240));
        assert_eq!(window.caption(), "塔防");
    }

    #[test]
    fn test_splash_view_reads_colors_and_logo() {
        let tree = resource_tree();
        let context = Context::builder().resource_root(tree.path()).build();
        let splash = SplashView::new(&context).unwrap();
        assert_eq!(splash.background(), Color::rgb(16, 32, 48));
        assert_eq!(splash.texture(), Color::rgba(1, 2, 3, 4));
        assert_eq!(splash.logo(), "<LOGO>\n");

        let lines = splash.draw().unwrap();
        assert_eq!(lines[0], "<LOGO>");
        assert!(lines.contains(&"加载".to_string()));
    }

    #[test]
    fn test_language_switch_refreshes_caption_and_redraws() {
        let tree = resource_tree();
        let (context, _, window) = setup(tree.path());
        window.show().unwrap();

        context.switch_language(Some(Language::EnUs));

        assert_eq!(window.caption(), "Towers");
        let frames = window.frames();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].contains("塔防"));
        assert!(frames[1].contains("Towers"));
        assert!(frames[1].contains("Loading"));
    }

    #[test]
    fn test_view_change_redraws_through_hook() {
        let tree = resource_tree();
        let (context, views, window) = setup(tree.path());
        context.switch_language(Some(Language::EnUs));

        assert!(!views.change(ViewType::Game));
        views.prewarm(&[ViewType::Game]).unwrap();
        assert!(views.change(ViewType::Game));

        let last = window.frames().pop().unwrap();
        assert!(last.contains("[game]"));
        assert!(last.contains("> Start"));
        assert!(last.contains("> game.menu.exit"));
    }

    #[test]
    fn test_drop_removes_hooks() {
        let tree = resource_tree();
        let (context, views, window) = setup(tree.path());
        let subscribers = context.languages().subscriber_count();
        drop(window);
        assert_eq!(context.languages().subscriber_count(), subscribers - 1);
        assert!(views.on_change(WINDOW_VIEW_HOOK, || {}));
    }

    #[test]
    fn test_dropping_second_window_keeps_first_windows_view_hook() {
        let tree = resource_tree();
        let (context, views, first) = setup(tree.path());
        let second = Window::new(&context, Arc::clone(&views)).unwrap();
        drop(second);

        views.prewarm(&[ViewType::Main]).unwrap();
        assert!(views.change(ViewType::Main));

        let frames = first.frames();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("[main]"));
    }

    #[test]
    fn test_frame_pads_wide_characters() {
        let frame = render_frame("塔防", "splash", &["ab".to_string()], 24, 3);
        let widths: Vec<usize> = frame.lines().map(UnicodeWidthStr::width).collect();
        assert!(widths.iter().all(|&w| w == widths[0]));
        assert_eq!(frame.lines().count(), 7);
    }

    #[test]
    fn test_fit_truncates_on_cell_boundary() {
        assert_eq!(fit("塔防游戏", 5), "塔防 ");
        assert_eq!(fit("abc", 5), "abc  ");
    }
}
