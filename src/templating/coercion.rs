//! Parameter coercion.
//!
//! Build parameters arrive as strings. A template declares the parameters it
//! expects, and their types, with `parameter` directives:
//!
//! ```text
//! <#@ parameter name="Count" type="int" #>
//! ```
//!
//! [`coerce_parameters`] converts each incoming string to the declared type
//! through a [`ConverterRegistry`] and stores the result in the session.
//! Declared type names may use .NET spellings (`int`, `System.Int32`,
//! `Boolean`) or Rust spellings (`i32`, `bool`); both map to the same
//! converter.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use strsim::levenshtein;

use super::diagnostics::Diagnostic;
use super::directives::ParsedTemplate;
use super::session::{ParameterValue, Session};

/// Canonical name of the string type.
pub const STRING_TYPE: &str = "string";

/// Flat name → value map of build parameters. Later entries for the same
/// name replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    values: BTreeMap<String, String>,
}

impl ParameterMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any earlier one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Why a string could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError(pub String);

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConversionError {}

/// A string → typed value conversion.
pub type Converter = Box<dyn Fn(&str) -> Result<ParameterValue, ConversionError>>;

/// Normalize a declared type name.
///
/// A missing or empty type is the string type. `System.` prefixes are
/// dropped and the well-known aliases collapse to one canonical spelling;
/// any other name is returned unchanged so custom converters can be
/// registered under it.
pub fn canonical_type_name(declared: Option<&str>) -> String {
    let Some(declared) = declared.map(str::trim).filter(|t| !t.is_empty()) else {
        return STRING_TYPE.to_string();
    };
    let unqualified = declared.strip_prefix("System.").unwrap_or(declared);

    let canonical = match unqualified.to_ascii_lowercase().as_str() {
        "string" | "str" | "&str" => STRING_TYPE,
        "bool" | "boolean" => "bool",
        "char" => "char",
        "sbyte" | "i8" => "i8",
        "byte" | "u8" => "u8",
        "short" | "int16" | "i16" => "i16",
        "ushort" | "uint16" | "u16" => "u16",
        "int" | "int32" | "i32" => "i32",
        "uint" | "uint32" | "u32" => "u32",
        "long" | "int64" | "i64" => "i64",
        "ulong" | "uint64" | "u64" => "u64",
        "float" | "single" | "f32" => "f32",
        "double" | "decimal" | "f64" => "f64",
        _ => return unqualified.to_string(),
    };
    canonical.to_string()
}

/// Registry of converters keyed by canonical type name.
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.converters.keys().collect();
        names.sort();
        f.debug_struct("ConverterRegistry").field("types", &names).finish()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! signed {
    ($ty:ty) => {
        Box::new(|s: &str| {
            s.trim()
                .parse::<$ty>()
                .map(|v| ParameterValue::Int(i64::from(v)))
                .map_err(|e| ConversionError(e.to_string()))
        }) as Converter
    };
}

macro_rules! unsigned {
    ($ty:ty) => {
        Box::new(|s: &str| {
            s.trim()
                .parse::<$ty>()
                .map(|v| ParameterValue::UInt(u64::from(v)))
                .map_err(|e| ConversionError(e.to_string()))
        }) as Converter
    };
}

impl ConverterRegistry {
    /// A registry with the built-in conversions.
    pub fn new() -> Self {
        let mut converters: HashMap<String, Converter> = HashMap::new();

        converters.insert(STRING_TYPE.into(), Box::new(|s: &str| Ok(ParameterValue::from(s))));
        converters.insert(
            "bool".into(),
            Box::new(|s: &str| match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(ParameterValue::Bool(true)),
                "false" => Ok(ParameterValue::Bool(false)),
                _ => Err(ConversionError(format!("'{s}' is not a valid boolean"))),
            }),
        );
        converters.insert(
            "char".into(),
            Box::new(|s: &str| {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(ParameterValue::Char(c)),
                    _ => Err(ConversionError("expected exactly one character".into())),
                }
            }),
        );
        converters.insert("i8".into(), signed!(i8));
        converters.insert("i16".into(), signed!(i16));
        converters.insert("i32".into(), signed!(i32));
        converters.insert("i64".into(), signed!(i64));
        converters.insert("u8".into(), unsigned!(u8));
        converters.insert("u16".into(), unsigned!(u16));
        converters.insert("u32".into(), unsigned!(u32));
        converters.insert("u64".into(), unsigned!(u64));
        converters.insert(
            "f32".into(),
            Box::new(|s: &str| {
                s.trim()
                    .parse::<f32>()
                    .map(|v| ParameterValue::Float(f64::from(v)))
                    .map_err(|e| ConversionError(e.to_string()))
            }),
        );
        converters.insert(
            "f64".into(),
            Box::new(|s: &str| {
                s.trim()
                    .parse::<f64>()
                    .map(ParameterValue::Float)
                    .map_err(|e| ConversionError(e.to_string()))
            }),
        );

        Self {
            converters,
        }
    }

    /// Register (or replace) the converter for a declared type name.
    pub fn register<F>(&mut self, type_name: &str, converter: F)
    where
        F: Fn(&str) -> Result<ParameterValue, ConversionError> + 'static,
    {
        self.converters.insert(canonical_type_name(Some(type_name)), Box::new(converter));
    }

    /// Register an enumeration: input matches a variant case-insensitively
    /// and the canonical variant spelling is stored.
    pub fn register_enum(&mut self, type_name: &str, variants: &[&str]) {
        let variants: Vec<String> = variants.iter().map(|v| (*v).to_string()).collect();
        self.register(type_name, move |s| {
            let wanted = s.trim();
            variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(wanted))
                .map(|v| ParameterValue::String(v.clone()))
                .ok_or_else(|| ConversionError(format!("expected one of {}", variants.join(", "))))
        });
    }

    /// Whether a converter exists for the declared type.
    pub fn supports(&self, declared: Option<&str>) -> bool {
        self.converters.contains_key(&canonical_type_name(declared))
    }

    /// Convert `value` to the declared type.
    ///
    /// # Errors
    ///
    /// Fails when no converter is registered for the type or the converter
    /// rejects the value.
    pub fn convert(&self, declared: Option<&str>, value: &str) -> Result<ParameterValue, ConversionError> {
        let canonical = canonical_type_name(declared);
        let converter = self
            .converters
            .get(&canonical)
            .ok_or_else(|| ConversionError(format!("no converter for type '{canonical}'")))?;
        converter(value)
    }
}

/// Diagnostic message for a failed conversion.
pub fn conversion_failure_message(name: &str, value: &str, declared: &str) -> String {
    format!("Could not convert property '{name}'='{value}' to parameter type '{declared}'")
}

/// Store each build parameter in `session`, typed according to the
/// template's `parameter` directives.
///
/// - No directive declares the name: the string is stored unchanged.
/// - The declared type is the string type: the string is stored unchanged.
/// - Otherwise the value is converted; on failure an error is added to the
///   template's diagnostics and the session entry is left unset.
///
/// When several directives declare the same name, the first one is used.
pub fn coerce_parameters(
    template: &mut ParsedTemplate,
    parameters: &ParameterMap,
    session: &mut Session,
    converters: &ConverterRegistry,
) {
    for (name, value) in parameters.iter() {
        let Some(directive) = template.find_parameter(name) else {
            if let Some(similar) = similar_parameter(template, name) {
                tracing::debug!(
                    "Parameter '{name}' is not declared by the template; did you mean '{similar}'?"
                );
            }
            session.insert(name, ParameterValue::from(value));
            continue;
        };

        let declared = directive.attribute("type");
        if canonical_type_name(declared) == STRING_TYPE {
            session.insert(name, ParameterValue::from(value));
            continue;
        }

        match converters.convert(declared, value) {
            Ok(converted) => {
                tracing::trace!(parameter = name, value = %converted, "Coerced parameter");
                session.insert(name, converted);
            }
            Err(e) => {
                let message = conversion_failure_message(name, value, declared.unwrap_or_default());
                tracing::debug!("{message}: {e}");
                let diagnostic = directive.diagnostic(Diagnostic::error(message));
                template.errors.push(diagnostic);
                session.remove(name);
            }
        }
    }
}

fn similar_parameter<'a>(template: &'a ParsedTemplate, name: &str) -> Option<&'a str> {
    template
        .directives_named("parameter")
        .filter_map(|d| d.attribute("name"))
        .filter(|declared| levenshtein(declared, name) <= 2)
        .min_by_key(|declared| levenshtein(declared, name))
}
