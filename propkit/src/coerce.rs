//! Suffix-driven coercion of raw property values.

use crate::{
    color::parse_color,
    error::Error,
    escape::unescape,
    traits::FileResolver,
    types::{ConfigEntry, TypeTag, TypedValue},
};

/// Coerces a raw value according to the suffix of its key.
///
/// Returns the key with its suffix stripped alongside the typed value. An
/// absent raw value is not an error: the key comes back unchanged with no
/// value. Malformed `.int` and `.float` values fail; colours never do.
pub fn coerce(
    key: &str,
    raw: Option<&str>,
    files: &dyn FileResolver,
) -> Result<(String, Option<TypedValue>), Error> {
    let Some(raw) = raw else {
        return Ok((key.to_string(), None));
    };
    let (stripped, tag) = TypeTag::split_key(key);
    let value = coerce_value(stripped, tag, raw, files)?;
    Ok((stripped.to_string(), Some(value)))
}

/// Like [`coerce`], but keeps the raw text and tag as a [`ConfigEntry`].
pub fn coerce_entry(
    key: &str,
    raw: Option<&str>,
    files: &dyn FileResolver,
) -> Result<ConfigEntry, Error> {
    let (_, tag) = TypeTag::split_key(key);
    let (stripped, value) = coerce(key, raw, files)?;
    Ok(ConfigEntry {
        key: stripped,
        raw_value: raw.map(str::to_string),
        value,
        tag,
    })
}

fn coerce_value(
    key: &str,
    tag: TypeTag,
    raw: &str,
    files: &dyn FileResolver,
) -> Result<TypedValue, Error> {
    let value = match tag {
        TypeTag::Str | TypeTag::Plain => TypedValue::Str(unescape(raw)),
        TypeTag::Int => {
            let parsed = raw.trim().parse::<i64>().map_err(|source| Error::InvalidInt {
                key: key.to_string(),
                value: raw.to_string(),
                source,
            })?;
            TypedValue::Int(parsed)
        }
        TypeTag::Float => {
            let parsed = raw.trim().parse::<f64>().map_err(|source| Error::InvalidFloat {
                key: key.to_string(),
                value: raw.to_string(),
                source,
            })?;
            TypedValue::Float(parsed)
        }
        // Any non-empty text is true, including "false" and "0".
        TypeTag::Bool => TypedValue::Bool(!raw.is_empty()),
        TypeTag::Color => TypedValue::Color(parse_color(raw)),
        TypeTag::File => TypedValue::File(files.resolve_file(&unescape(raw))?),
    };
    Ok(value)
}
