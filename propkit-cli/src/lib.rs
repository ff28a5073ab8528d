//! Application shell for propkit, exposed as a library for testing purposes.

pub mod shell;

pub use shell::{
    CAPTION_KEY, MenuView, ShellView, SplashView, Views, WINDOW_VIEW_HOOK, Window, declare_views,
};
