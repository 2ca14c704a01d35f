use super::{EncodingKind, OptionsError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Encoding options as a name → value map, the form they take in `make` and `with_options`.
pub type Options = Map<String, Value>;

/// Typed options of a configurable encoding kind, convertible to and from [`Options`].
pub(crate) trait EncodingOptions: Serialize + DeserializeOwned {
    const KIND: EncodingKind;
    const NAMES: &'static [&'static str];
    /// Options listed even when skipping defaults.
    const REQUIRED: &'static [&'static str] = &[];

    /// The options this value would have if only the mandatory ones had been given.
    fn defaults(&self) -> Self;

    fn check_names(options: &Options) -> Result<(), OptionsError> {
        match options.keys().find(|name| !Self::NAMES.contains(&name.as_str())) {
            Some(name) => Err(OptionsError::UnknownOption {
                name: name.clone(),
                kind: Self::KIND.name(),
            }),
            None => Ok(()),
        }
    }

    fn from_map(options: Options) -> Result<Self, OptionsError> {
        Self::check_names(&options)?;
        Ok(serde_json::from_value(Value::Object(options))?)
    }

    fn to_map(&self, skip_defaults: bool) -> Options {
        let mut options = as_map(self);
        if skip_defaults {
            let defaults = as_map(&self.defaults());
            options.retain(|name, value| Self::REQUIRED.contains(&name.as_str()) || defaults.get(name) != Some(value));
        }
        options
    }

    /// A copy with the given options replaced.
    fn merge(&self, overrides: Options) -> Result<Self, OptionsError> {
        Self::check_names(&overrides)?;
        let mut options = self.to_map(false);
        options.extend(overrides);
        Ok(serde_json::from_value(Value::Object(options))?)
    }
}

fn as_map(options: &impl Serialize) -> Options {
    match serde_json::to_value(options) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

pub(crate) fn reject_options(kind: EncodingKind, options: &Options) -> Result<(), OptionsError> {
    match options.keys().next() {
        Some(name) => Err(OptionsError::UnknownOption {
            name: name.clone(),
            kind: kind.name(),
        }),
        None => Ok(()),
    }
}

/// Formats options as `, name=value` pairs for `Display` implementations.
pub(crate) fn display(options: &Options) -> String {
    options.iter().map(|(name, value)| format!(", {}={}", name, value)).collect()
}
