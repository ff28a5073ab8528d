#![forbid(unsafe_code)]
//! Typed property-file configuration and localization for application shells.
//!
//! Property files are read lazily per resource type, every value is coerced
//! by its key suffix (`.str`, `.int`, `.float`, `.bool`, `.color`, `.file`),
//! and localized bundles are re-resolved whenever the active language
//! changes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use propkit::{Context, Language};
//!
//! let context = Context::builder().resource_root("resources").build();
//! let width = context.config("window.width")?;
//! let title = context.i18n_main("window.title.default")?;
//!
//! context.on_language_changed(|language| println!("now using {language}"));
//! context.switch_language(Some(Language::EnUs));
//! # Ok::<(), propkit::Error>(())
//! ```
//!
//! # Resource descriptors
//!
//! - **`classpath:<path>`**: a file under the resource root
//! - **`i18n:<key>`**: a UI config key whose value is a path template containing `{language}`

pub mod cache;
pub mod coerce;
pub mod color;
pub mod context;
pub mod error;
pub mod escape;
pub mod language;
pub mod locator;
pub mod properties;
pub mod traits;
pub mod types;
pub mod view;

// Re-export most used types for easy consumption
pub use crate::{
    cache::{ConfigCache, ConfigTable},
    coerce::coerce,
    color::parse_color,
    context::{Context, ContextBuilder},
    error::Error,
    language::{LanguageRegistry, SubscriptionId},
    locator::{DeploymentMode, ResourceLocator},
    types::{
        Color, ConfigEntry, Language, ResourceDescriptor, ResourceType, Scheme, TypeTag,
        TypedValue,
    },
    view::{View, ViewRegistry, ViewType},
};
