use std::any::type_name;
use std::error::Error;
use std::fmt;

/// Placeholder used in a culprit when the origin's declaring type cannot
/// be resolved (closures and other anonymous scopes).
pub const DYNAMIC_TYPE: &str = "<dynamic type>";

/// Code location that raised an exception: a function and the type (or
/// module) declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    function: String,
    declaring_type: Option<String>,
}

impl Origin {
    pub fn new(function: impl Into<String>, declaring_type: impl Into<String>) -> Self {
        Origin {
            function: function.into(),
            declaring_type: Some(declaring_type.into()),
        }
    }

    /// Origin whose declaring type is unknown.
    pub fn dynamic(function: impl Into<String>) -> Self {
        Origin {
            function: function.into(),
            declaring_type: None,
        }
    }

    /// Split a fully qualified function path such as
    /// `app::billing::Invoice::finalize` into function name and declaring
    /// type.
    ///
    /// Paths that pass through a closure keep the enclosing function name
    /// but lose their declaring type. Returns `None` for an empty path.
    pub fn from_path(path: &str) -> Option<Self> {
        let mut segments = split_path(path);
        let mut in_closure = false;
        while segments.last() == Some(&"{{closure}}") {
            segments.pop();
            in_closure = true;
        }

        let function = segments.pop()?;
        let dynamic = in_closure || segments.is_empty() || segments.contains(&"{{closure}}");

        Some(Origin {
            function: function.to_string(),
            declaring_type: (!dynamic).then(|| segments.join("::")),
        })
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn declaring_type(&self) -> Option<&str> {
        self.declaring_type.as_deref()
    }

    /// Human readable `"<function> in <declaring type>"`.
    pub fn culprit(&self) -> String {
        format!(
            "{} in {}",
            self.function,
            self.declaring_type.as_deref().unwrap_or(DYNAMIC_TYPE)
        )
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.culprit())
    }
}

/// Captures the path of the enclosing function as an `Option<Origin>`.
///
/// ```
/// fn charge() -> Option<raven_packet::exception::Origin> {
///     raven_packet::origin!()
/// }
///
/// let origin = charge().unwrap();
/// assert_eq!(origin.function(), "charge");
/// ```
#[macro_export]
macro_rules! origin {
    () => {{
        fn __origin_marker() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = __type_name_of(__origin_marker);
        $crate::exception::Origin::from_path(
            path.strip_suffix("::__origin_marker").unwrap_or(path),
        )
    }};
}

/// An exception as seen by the packet builder.
///
/// Implementors expose a single link of a cause chain; [`chain`] walks the
/// whole chain outermost first.
pub trait Exception {
    /// Concrete kind name, e.g. `ParseIntError`.
    fn kind(&self) -> &str;

    fn message(&self) -> String;

    /// Source the exception originates from (crate or module path).
    fn source_module(&self) -> Option<&str> {
        None
    }

    fn origin(&self) -> Option<&Origin> {
        None
    }

    /// The immediate cause, if any.
    fn cause(&self) -> Option<&dyn Exception> {
        None
    }
}

/// Iterator over an exception and its causes, outermost first.
pub struct Chain<'a> {
    next: Option<&'a dyn Exception>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a dyn Exception;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}

pub fn chain(exception: &dyn Exception) -> Chain<'_> {
    Chain {
        next: Some(exception),
    }
}

/// Owned snapshot of an exception and its cause chain.
///
/// Built by hand or captured from any [`std::error::Error`] with
/// [`CapturedException::from_error`].
pub struct CapturedException {
    kind: String,
    message: String,
    module: Option<String>,
    origin: Option<Origin>,
    cause: Option<Box<CapturedException>>,
}

impl CapturedException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CapturedException {
            kind: kind.into(),
            message: message.into(),
            module: None,
            origin: None,
            cause: None,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Accepts `Origin` or the `Option<Origin>` produced by [`origin!`].
    pub fn with_origin(mut self, origin: impl Into<Option<Origin>>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn caused_by(mut self, cause: CapturedException) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Snapshot `err` and every error reachable through
    /// [`Error::source`].
    ///
    /// The outermost kind and module come from the static type of `err`.
    /// Causes are type-erased, so their kind is exact for common std and
    /// serde errors and a best-effort guess from `Debug` output otherwise.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let full = type_name::<E>();
        CapturedException {
            kind: short_type_name(full),
            message: err.to_string(),
            module: type_module(full),
            origin: None,
            cause: capture_sources(err.source()),
        }
    }

    /// Like [`from_error`](Self::from_error) for an already type-erased
    /// error.
    pub fn from_dyn_error(err: &(dyn Error + 'static)) -> Self {
        let (kind, module) = erased_kind(err);
        CapturedException {
            kind,
            message: err.to_string(),
            module,
            origin: None,
            cause: capture_sources(err.source()),
        }
    }
}

impl Exception for CapturedException {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn source_module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    fn cause(&self) -> Option<&dyn Exception> {
        self.cause.as_deref().map(|c| c as &dyn Exception)
    }
}

impl CapturedException {
    /// This link and every cause below it.
    fn links(&self) -> impl Iterator<Item = &CapturedException> {
        std::iter::successors(Some(self), |link| link.cause.as_deref())
    }

    /// Copy of this link without its cause.
    fn detached(&self) -> Self {
        CapturedException {
            kind: self.kind.clone(),
            message: self.message.clone(),
            module: self.module.clone(),
            origin: self.origin.clone(),
            cause: None,
        }
    }

    fn same_link(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.module == other.module
            && self.origin == other.origin
    }
}

// Clone, PartialEq and Debug walk the chain with a loop; derived impls
// would recurse once per cause.
impl Clone for CapturedException {
    fn clone(&self) -> Self {
        let mut root = self.detached();
        root.cause = link_all(self.links().skip(1).map(CapturedException::detached).collect());
        root
    }
}

impl PartialEq for CapturedException {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.links();
        let mut theirs = other.links();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.same_link(b) => continue,
                _ => return false,
            }
        }
    }
}

impl Eq for CapturedException {}

#[derive(Debug)]
#[allow(dead_code)]
struct LinkDebug<'a> {
    kind: &'a str,
    message: &'a str,
    module: Option<&'a str>,
    origin: Option<&'a Origin>,
}

impl fmt::Debug for CapturedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedException")
            .field(
                "chain",
                &self
                    .links()
                    .map(|link| LinkDebug {
                        kind: &link.kind,
                        message: &link.message,
                        module: link.module.as_deref(),
                        origin: link.origin.as_ref(),
                    })
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Drop for CapturedException {
    fn drop(&mut self) {
        // unlink iteratively so long chains don't recurse on drop
        let mut next = self.cause.take();
        while let Some(mut link) = next {
            next = link.cause.take();
        }
    }
}

fn capture_sources(mut next: Option<&(dyn Error + 'static)>) -> Option<Box<CapturedException>> {
    let mut links = Vec::new();
    while let Some(err) = next {
        let (kind, module) = erased_kind(err);
        links.push(CapturedException {
            kind,
            message: err.to_string(),
            module,
            origin: None,
            cause: None,
        });
        next = err.source();
    }
    link_all(links)
}

/// Chain `links` so each one is caused by the next.
fn link_all(links: Vec<CapturedException>) -> Option<Box<CapturedException>> {
    links.into_iter().rev().fold(None, |cause, mut link| {
        link.cause = cause;
        Some(Box::new(link))
    })
}

macro_rules! known_kinds {
    ($err:expr, $($ty:ty),+ $(,)?) => {
        $(
            if $err.is::<$ty>() {
                let full = type_name::<$ty>();
                return (short_type_name(full), type_module(full));
            }
        )+
    };
}

fn erased_kind(err: &(dyn Error + 'static)) -> (String, Option<String>) {
    known_kinds!(
        err,
        std::io::Error,
        std::num::ParseIntError,
        std::num::ParseFloatError,
        std::str::ParseBoolError,
        std::str::Utf8Error,
        std::string::FromUtf8Error,
        std::fmt::Error,
        serde_json::Error,
        chrono::ParseError,
    );

    (debug_kind(err), None)
}

/// Leading identifier of the `Debug` form, which is the type name for
/// derived struct impls and the variant name for derived enum impls.
fn debug_kind(err: &dyn Error) -> String {
    let repr = format!("{:?}", err);
    let ident: String = repr
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    match ident.chars().next() {
        Some(c) if c.is_uppercase() => ident,
        _ => "Error".to_string(),
    }
}

/// Split a Rust path on `::`, ignoring separators nested in generics.
fn split_path(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let bytes = path.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&path[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&path[start..]);
    segments.retain(|s| !s.is_empty());
    segments
}

fn short_type_name(full: &str) -> String {
    let full = full.trim_start_matches('&');
    let last = split_path(full).pop().unwrap_or(full);
    last.split('<').next().unwrap_or(last).to_string()
}

fn type_module(full: &str) -> Option<String> {
    let mut segments = split_path(full.trim_start_matches('&'));
    segments.pop();
    (!segments.is_empty()).then(|| segments.join("::"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, thiserror::Error)]
    #[error("could not load invoice")]
    struct LoadInvoice {
        #[source]
        source: std::num::ParseIntError,
    }

    #[derive(Debug, thiserror::Error)]
    enum Unnamed {
        #[error("opaque failure")]
        Opaque,
    }

    struct Invoice;

    impl Invoice {
        fn finalize() -> Option<Origin> {
            crate::origin!()
        }
    }

    #[test]
    fn origin_from_method_path() {
        let origin = Origin::from_path("app::billing::Invoice::finalize").unwrap();
        assert_eq!(origin.function(), "finalize");
        assert_eq!(origin.declaring_type(), Some("app::billing::Invoice"));
        assert_eq!(origin.culprit(), "finalize in app::billing::Invoice");
    }

    #[test]
    fn origin_inside_closure_is_dynamic() {
        let origin = Origin::from_path("app::run::{{closure}}").unwrap();
        assert_eq!(origin.function(), "run");
        assert_eq!(origin.culprit(), format!("run in {}", DYNAMIC_TYPE));

        let nested = Origin::from_path("app::run::{{closure}}::helper").unwrap();
        assert_eq!(nested.declaring_type(), None);
    }

    #[test]
    fn origin_keeps_generic_segments_whole() {
        let origin = Origin::from_path("app::Repo<alloc::string::String>::load").unwrap();
        assert_eq!(origin.declaring_type(), Some("app::Repo<alloc::string::String>"));
    }

    #[test]
    fn empty_path_has_no_origin() {
        assert_eq!(Origin::from_path(""), None);
    }

    #[test]
    fn origin_macro_names_enclosing_function() {
        let origin = Invoice::finalize().unwrap();
        assert_eq!(origin.function(), "finalize");
        assert!(origin.declaring_type().unwrap().ends_with("Invoice"));
    }

    #[test]
    fn captures_error_chain() {
        let source = "x1".parse::<u32>().unwrap_err();
        let err = LoadInvoice { source };
        let captured = CapturedException::from_error(&err);

        let links: Vec<_> = chain(&captured).collect();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind(), "LoadInvoice");
        assert_eq!(links[0].message(), "could not load invoice");
        assert!(links[0].source_module().unwrap().ends_with("exception::tests"));
        assert_eq!(links[1].kind(), "ParseIntError");
        assert_eq!(links[1].message(), "invalid digit found in string");
        assert!(links[1].source_module().unwrap().starts_with("core::num"));
    }

    #[test]
    fn erased_kind_falls_back_to_debug_form() {
        let captured = CapturedException::from_dyn_error(&Unnamed::Opaque);
        assert_eq!(captured.kind(), "Opaque");
        assert_eq!(captured.source_module(), None);
    }

    #[test]
    fn hand_built_chain() {
        let captured = CapturedException::new("Timeout", "upstream timed out")
            .with_module("gateway")
            .with_origin(Origin::dynamic("poll"))
            .caused_by(CapturedException::new("Io", "connection reset"));

        assert_eq!(chain(&captured).count(), 2);
        assert_eq!(captured.origin().unwrap().culprit(), "poll in <dynamic type>");
    }

    #[test]
    fn deep_chain_walks_and_drops() {
        let mut captured = CapturedException::new("Leaf", "bottom");
        for i in 0..50_000 {
            captured = CapturedException::new("Wrap", format!("level {}", i)).caused_by(captured);
        }
        assert_eq!(chain(&captured).count(), 50_001);

        let copy = captured.clone();
        assert!(copy == captured);
        assert_eq!(chain(&copy).count(), 50_001);

        let debug = format!("{:?}", copy);
        assert!(debug.contains("level 49999"));
    }

    #[test]
    fn chains_differing_in_a_cause_are_unequal() {
        let a = CapturedException::new("Outer", "m").caused_by(CapturedException::new("Inner", "x"));
        let b = CapturedException::new("Outer", "m").caused_by(CapturedException::new("Inner", "y"));
        let shorter = CapturedException::new("Outer", "m");

        assert!(a != b);
        assert!(a != shorter);
        assert!(a == a.clone());
    }
}
