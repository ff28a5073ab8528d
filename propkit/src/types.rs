//! Core types shared by the resolution engine.
//! The locator and cache speak in descriptors and resource types; the
//! coercion engine produces typed values.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Error;

/// Placeholder substituted with [`Language::code`] in i18n path templates.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Languages the application ships resource bundles for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "en_US")]
    EnUs,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::ZhCn, Language::EnUs];

    /// Canonical code, as used in resource file names.
    pub fn code(&self) -> &'static str {
        match self {
            Language::ZhCn => "zh_CN",
            Language::EnUs => "en_US",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Accepts canonical codes as well as BCP-47 spellings such as `en-US`,
/// `zh-cn` or a bare `en`.
impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        let lang_id: LanguageIdentifier = normalized
            .parse()
            .map_err(|_| Error::UnknownLanguage(s.to_string()))?;
        let region = lang_id.region.map(|r| r.as_str().to_ascii_uppercase());

        match (lang_id.language.as_str(), region.as_deref()) {
            ("zh", None | Some("CN")) => Ok(Language::ZhCn),
            ("en", None | Some("US")) => Ok(Language::EnUs),
            _ => Err(Error::UnknownLanguage(s.to_string())),
        }
    }
}

/// Resolution strategy of a [`ResourceDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Path relative to the resource root.
    Classpath,
    /// Key in the UI config whose value is a language-templated path.
    I18n,
}

impl Scheme {
    pub fn prefix(&self) -> &'static str {
        match self {
            Scheme::Classpath => "classpath",
            Scheme::I18n => "i18n",
        }
    }
}

/// A logical resource location such as `classpath:config/ui.properties`
/// or `i18n:common.i18n.main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    pub scheme: Scheme,
    pub path_or_key: String,
}

impl ResourceDescriptor {
    pub fn classpath(path: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Classpath,
            path_or_key: path.into(),
        }
    }

    pub fn i18n(key: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::I18n,
            path_or_key: key.into(),
        }
    }
}

impl FromStr for ResourceDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, body) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::InvalidDescriptor(s.to_string()))?;
        let body = body.trim();
        if body.is_empty() {
            return Err(Error::InvalidDescriptor(s.to_string()));
        }
        match scheme {
            "classpath" => Ok(Self::classpath(body)),
            "i18n" => Ok(Self::i18n(body)),
            _ => Err(Error::InvalidDescriptor(s.to_string())),
        }
    }
}

impl Display for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme.prefix(), self.path_or_key)
    }
}

/// The closed set of property files the application reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ResourceType {
    /// `classpath:config/ui.properties`
    #[default]
    #[serde(rename = "ui")]
    UiConfig,
    /// `i18n:common.i18n.main`
    #[serde(rename = "main")]
    I18nMain,
    /// `i18n:common.i18n.game`
    #[serde(rename = "game")]
    I18nGame,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::UiConfig,
        ResourceType::I18nMain,
        ResourceType::I18nGame,
    ];

    pub fn descriptor(&self) -> ResourceDescriptor {
        match self {
            ResourceType::UiConfig => ResourceDescriptor::classpath("config/ui.properties"),
            ResourceType::I18nMain => ResourceDescriptor::i18n("common.i18n.main"),
            ResourceType::I18nGame => ResourceDescriptor::i18n("common.i18n.game"),
        }
    }

    /// Whether the content of this resource depends on the active language.
    pub fn is_localized(&self) -> bool {
        self.descriptor().scheme == Scheme::I18n
    }
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::UiConfig => write!(f, "ui"),
            ResourceType::I18nMain => write!(f, "main"),
            ResourceType::I18nGame => write!(f, "game"),
        }
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ui" | "ui-config" | "config" => Ok(ResourceType::UiConfig),
            "main" | "i18n-main" => Ok(ResourceType::I18nMain),
            "game" | "i18n-game" => Ok(ResourceType::I18nGame),
            other => Err(Error::UnknownResourceType(other.to_string())),
        }
    }
}

/// Coercion selected by a key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Str,
    Int,
    Float,
    Bool,
    Color,
    File,
    /// No recognised suffix; coerced like `Str`.
    Plain,
}

impl TypeTag {
    /// Splits a raw property key into its stripped key and type tag.
    ///
    /// Only the entire last `.segment` is considered, so `a.string` stays
    /// `Plain` while `a.str` becomes `("a", Str)`.
    pub fn split_key(key: &str) -> (&str, TypeTag) {
        let Some((stem, suffix)) = key.rsplit_once('.') else {
            return (key, TypeTag::Plain);
        };
        let tag = match suffix {
            "str" => TypeTag::Str,
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "bool" => TypeTag::Bool,
            "color" => TypeTag::Color,
            "file" => TypeTag::File,
            _ => return (key, TypeTag::Plain),
        };
        (stem, tag)
    }

    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            TypeTag::Str => Some("str"),
            TypeTag::Int => Some("int"),
            TypeTag::Float => Some("float"),
            TypeTag::Bool => Some("bool"),
            TypeTag::Color => Some("color"),
            TypeTag::File => Some("file"),
            TypeTag::Plain => None,
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix().unwrap_or("plain"))
    }
}

/// RGBA colour with 0-255 channels, the shape draw calls accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn as_tuple(&self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgba(0, 0, 0, 255)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::rgba(r, g, b, a)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// A coerced property value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    /// Absolute path of a resource file referenced by a `.file` key.
    File(PathBuf),
}

impl TypedValue {
    /// The tag a value of this shape would carry; `Plain` entries report `Str`.
    pub fn tag(&self) -> TypeTag {
        match self {
            TypedValue::Str(_) => TypeTag::Str,
            TypedValue::Int(_) => TypeTag::Int,
            TypedValue::Float(_) => TypeTag::Float,
            TypedValue::Bool(_) => TypeTag::Bool,
            TypedValue::Color(_) => TypeTag::Color,
            TypedValue::File(_) => TypeTag::File,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TypedValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            TypedValue::Color(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            TypedValue::File(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Str(value) => write!(f, "{}", value),
            TypedValue::Int(value) => write!(f, "{}", value),
            TypedValue::Float(value) => write!(f, "{}", value),
            TypedValue::Bool(value) => write!(f, "{}", value),
            TypedValue::Color(value) => write!(f, "{}", value),
            TypedValue::File(value) => write!(f, "{}", value.display()),
        }
    }
}

/// One parsed and coerced property.
///
/// `tag` comes from the raw key suffix at parse time and is never recomputed
/// from the value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigEntry {
    /// Key with its type suffix stripped.
    pub key: String,
    pub raw_value: Option<String>,
    pub value: Option<TypedValue>,
    pub tag: TypeTag,
}
