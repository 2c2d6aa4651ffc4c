//! Storage/apparent type descriptions for schema fields.
//!
//! A [`TypeSpec`] records how a field is *stored* and how it *appears* to
//! consumers. The two differ when the storage type implements a conversion
//! capability: a producer method yields the apparent value out of storage,
//! and an acceptor method coerces arbitrary wire or builder-supplied
//! values into storage. Types with neither capability are stored and
//! returned verbatim.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use stencil_runtime::ByteSlice;

/// Sentinel recorded as the element type of non-sequence storage, so an
/// accidental use of the element shows up in generated output instead of
/// silently rendering as an empty string.
pub const UNKNOWN_ELEMENT: &str = "stencil::UnknownType";

/// Default identifier of the producer capability method.
pub const DEFAULT_PRODUCE_METHOD: &str = "produce_value";

/// Default identifier of the acceptor capability method.
pub const DEFAULT_ACCEPT_METHOD: &str = "accept_value";

/// How a generated builder setter receives values for a field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum InitStyle {
    /// The setter takes one value of the apparent type.
    #[default]
    Scalar,
    /// The setter takes an iterator of element values.
    Sequence,
}

/// Describes one field's storage representation and its apparent
/// (user-visible) representation.
///
/// Constructed fluently at schema-authoring time and immutable afterwards:
/// every setter consumes and returns the spec.
///
/// ## Examples
///
/// ```
/// use stencil_define::types::TypeSpec;
///
/// let spec = TypeSpec::named("Vec<String>");
/// assert_eq!(spec.get_element(), "String");
/// assert!(spec.get_supports_len());
/// assert_eq!(spec.get_apparent(), "Vec<String>");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSpec {
    name: String,
    apparent: Option<String>,
    element: String,
    accept_method: Option<String>,
    produce_method: Option<String>,
    supports_len: bool,
    zero_value: String,
    init_style: InitStyle,
}

impl TypeSpec {
    /// Creates a TypeSpec from a Rust type name.
    ///
    /// Sequence storage (`Vec<...>`) gets its element type, sequence-style
    /// builder initialization and length support; map storage (`HashMap<`,
    /// `BTreeMap<`) gets length support. Everything is overridable through
    /// the fluent setters.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut element = UNKNOWN_ELEMENT.to_string();
        let mut init_style = InitStyle::Scalar;
        let mut supports_len = false;

        if let Some(inner) = sequence_element(&name) {
            element = inner.to_string();
            init_style = InitStyle::Sequence;
            supports_len = true;
        } else if is_map_type(&name) {
            supports_len = true;
        }

        Self {
            name,
            apparent: None,
            element,
            accept_method: None,
            produce_method: None,
            supports_len,
            zero_value: "Default::default()".to_string(),
            init_style,
        }
    }

    /// Creates a TypeSpec from a type that describes itself.
    ///
    /// This is the declaration-time capability check: a storage type's
    /// [`Describe`] impl is the single place where its apparent type and
    /// conversion capabilities are asserted.
    pub fn of<T: Describe>() -> Self {
        T::type_spec()
    }

    /// Sets the apparent type consumers see through accessors and setters.
    pub fn apparent(mut self, apparent: impl Into<String>) -> Self {
        self.apparent = Some(apparent.into());
        self
    }

    /// Sets the element type of sequence-like storage.
    pub fn element(mut self, element: impl Into<String>) -> Self {
        self.element = element.into();
        self
    }

    /// Sets the literal used by typed accessors when the field is absent.
    pub fn zero_value(mut self, zero: impl Into<String>) -> Self {
        self.zero_value = zero.into();
        self
    }

    /// Marks whether the storage supports a length query.
    pub fn supports_len(mut self, supports: bool) -> Self {
        self.supports_len = supports;
        self
    }

    /// Sets the builder initialization style.
    pub fn init_style(mut self, style: InitStyle) -> Self {
        self.init_style = style;
        self
    }

    /// Declares (or revokes) the acceptor capability under its default
    /// method name.
    pub fn accept_value(self, accepts: bool) -> Self {
        if accepts {
            self.accept_method(DEFAULT_ACCEPT_METHOD)
        } else {
            Self {
                accept_method: None,
                ..self
            }
        }
    }

    /// Declares the acceptor capability under an explicit method name.
    pub fn accept_method(mut self, method: impl Into<String>) -> Self {
        self.accept_method = Some(method.into());
        self
    }

    /// Declares (or revokes) the producer capability under its default
    /// method name.
    pub fn produce_value(self, produces: bool) -> Self {
        if produces {
            self.produce_method(DEFAULT_PRODUCE_METHOD)
        } else {
            Self {
                produce_method: None,
                ..self
            }
        }
    }

    /// Declares the producer capability under an explicit method name.
    pub fn produce_method(mut self, method: impl Into<String>) -> Self {
        self.produce_method = Some(method.into());
        self
    }

    /// The storage type identifier.
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// The apparent type; equals the storage type unless overridden.
    pub fn get_apparent(&self) -> &str {
        self.apparent.as_deref().unwrap_or(&self.name)
    }

    /// The storage type as declared in the generated struct field:
    /// absence is uniformly modeled as `Option<storage>`.
    pub fn storage_type(&self) -> String {
        format!("Option<{}>", self.name)
    }

    /// The element type of sequence-like storage, or the
    /// [`UNKNOWN_ELEMENT`] sentinel.
    pub fn get_element(&self) -> &str {
        &self.element
    }

    /// The zero-value literal for typed accessors.
    pub fn get_zero_value(&self) -> &str {
        &self.zero_value
    }

    /// Whether the storage supports a length query.
    pub fn get_supports_len(&self) -> bool {
        self.supports_len
    }

    /// The acceptor capability method name, when declared.
    pub fn get_accept_method(&self) -> Option<&str> {
        self.accept_method.as_deref()
    }

    /// The producer capability method name, when declared.
    pub fn get_produce_method(&self) -> Option<&str> {
        self.produce_method.as_deref()
    }

    /// The builder initialization style.
    pub fn get_init_style(&self) -> InitStyle {
        self.init_style
    }

    /// True when builder setters should take an iterator of elements.
    pub fn sequence_style(&self) -> bool {
        self.init_style == InitStyle::Sequence
    }
}

/// Extracts the element type of `Vec<...>` storage.
fn sequence_element(name: &str) -> Option<&str> {
    name.strip_prefix("Vec<")
        .and_then(|rest| rest.strip_suffix('>'))
}

/// True for the map types the model recognizes.
fn is_map_type(name: &str) -> bool {
    let unqualified = name.rsplit("::").next().unwrap_or(name);
    unqualified.starts_with("HashMap<") || unqualified.starts_with("BTreeMap<")
}

/// A storage type that can describe itself as a [`TypeSpec`].
///
/// Implementations assert their apparent type and conversion capabilities
/// once; every field declared with [`TypeSpec::of`] picks the description
/// up from here. A capability must only be asserted when the runtime type
/// actually implements the corresponding trait
/// (`stencil_runtime::AcceptValue` / `stencil_runtime::ProduceValue`).
pub trait Describe {
    /// Returns the type's self-description.
    fn type_spec() -> TypeSpec;
}

impl Describe for String {
    fn type_spec() -> TypeSpec {
        TypeSpec::named("String").zero_value("String::new()")
    }
}

impl Describe for i64 {
    fn type_spec() -> TypeSpec {
        TypeSpec::named("i64").zero_value("0")
    }
}

impl Describe for f64 {
    fn type_spec() -> TypeSpec {
        TypeSpec::named("f64").zero_value("0.0")
    }
}

impl Describe for bool {
    fn type_spec() -> TypeSpec {
        TypeSpec::named("bool").zero_value("false")
    }
}

impl Describe for Vec<String> {
    fn type_spec() -> TypeSpec {
        TypeSpec::named("Vec<String>").zero_value("Vec::new()")
    }
}

impl Describe for ByteSlice {
    fn type_spec() -> TypeSpec {
        byte_slice_type()
    }
}

/// The built-in byte-sequence type: stored as
/// `stencil_runtime::ByteSlice`, apparent as `Vec<u8>`, with both
/// conversion capabilities so base64 wire text is handled transparently.
pub fn byte_slice_type() -> TypeSpec {
    TypeSpec::named("stencil_runtime::ByteSlice")
        .apparent("Vec<u8>")
        .accept_value(true)
        .produce_value(true)
        .zero_value("Vec::new()")
}

/// String storage.
pub fn string() -> TypeSpec {
    TypeSpec::of::<String>()
}

/// 64-bit integer storage.
pub fn int() -> TypeSpec {
    TypeSpec::of::<i64>()
}

/// 64-bit float storage.
pub fn float() -> TypeSpec {
    TypeSpec::of::<f64>()
}

/// Boolean storage.
pub fn boolean() -> TypeSpec {
    TypeSpec::of::<bool>()
}

/// String list storage.
pub fn string_list() -> TypeSpec {
    TypeSpec::of::<Vec<String>>()
}
