//! Discovery of connect-go client interfaces and their RPC methods.
//!
//! A qualifying interface is a top-level, exported interface whose name ends
//! in `Client`. Every method on it must have the enveloped unary call shape;
//! anything else aborts extraction for the whole unit.

mod shape;

pub use shape::CallShape;

use serde::Serialize;

use crate::analysis::{ConstValue, Declaration, Import, InterfaceElement, SourceFacts};
use crate::error::{GenerateError, ShapeError};

/// Suffix that marks a generated client interface.
pub const CLIENT_SUFFIX: &str = "Client";

/// Suffix of the constant holding a service's fully-qualified name.
pub const SERVICE_NAME_CONST_SUFFIX: &str = "Name";

/// An RPC method to wrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTarget {
    pub name: String,
    /// Request payload type as Go source (e.g. `v1.PingRequest`).
    pub request_type: String,
    /// Response payload type as Go source.
    pub response_type: String,
}

/// A client interface to generate a decorator for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceTarget {
    /// Interface name without the `Client` suffix.
    pub service_name: String,
    pub client_interface_name: String,
    /// Methods in declaration order.
    pub methods: Vec<MethodTarget>,
    /// Dotted service name, e.g. `connect.ping.v1.PingService`.
    pub full_service_name: String,
    /// Alias of the message package import; empty when unaliased or unresolved.
    pub import_alias: String,
    /// Path of the message package import; empty when unresolved.
    pub import_path: String,
}

impl ServiceTarget {
    /// Whether an import for the message package was found.
    pub fn has_import(&self) -> bool {
        !self.import_path.is_empty()
    }
}

/// Extract every service target from a source unit, in declaration order.
pub fn extract_targets(facts: &SourceFacts) -> Result<Vec<ServiceTarget>, GenerateError> {
    let mut targets = Vec::new();

    for decl in facts.interfaces() {
        let Declaration::Interface {
            name, elements, ..
        } = decl
        else {
            continue;
        };

        let Some(service_name) = service_name_for(name) else {
            continue;
        };

        let methods = extract_methods(facts, name, elements)?;
        let full_service_name = resolve_full_service_name(facts, name, service_name)?;

        let (import_alias, import_path) = match resolve_import(&full_service_name, &facts.imports)
        {
            Some(import) => (
                import.alias.clone().unwrap_or_default(),
                import.path.clone(),
            ),
            None => {
                tracing::warn!(
                    path = %facts.path,
                    service = %full_service_name,
                    "no import matches the service package, generated code will miss it"
                );
                (String::new(), String::new())
            }
        };

        tracing::debug!(
            interface = %name,
            service = %full_service_name,
            methods = methods.len(),
            "found client interface"
        );

        targets.push(ServiceTarget {
            service_name: service_name.to_string(),
            client_interface_name: name.clone(),
            methods,
            full_service_name,
            import_alias,
            import_path,
        });
    }

    if targets.is_empty() {
        return Err(GenerateError::NoTargets {
            path: facts.path.clone(),
        });
    }

    Ok(targets)
}

/// `FooClient` -> `Foo`, for exported names only.
fn service_name_for(interface_name: &str) -> Option<&str> {
    let exported = interface_name
        .chars()
        .next()
        .is_some_and(char::is_uppercase);
    if !exported {
        return None;
    }
    interface_name
        .strip_suffix(CLIENT_SUFFIX)
        .filter(|s| !s.is_empty())
}

fn extract_methods(
    facts: &SourceFacts,
    interface: &str,
    elements: &[InterfaceElement],
) -> Result<Vec<MethodTarget>, GenerateError> {
    elements
        .iter()
        .map(|element| match element {
            InterfaceElement::Method(method) => CallShape::classify(method)
                .map(|shape| MethodTarget {
                    name: method.name.clone(),
                    request_type: shape.request().to_string(),
                    response_type: shape.response().to_string(),
                })
                .map_err(|reason| GenerateError::Shape {
                    path: facts.path.clone(),
                    span: method.span,
                    interface: interface.to_string(),
                    method: method.name.clone(),
                    reason,
                }),
            InterfaceElement::Embedded { text, span } => Err(GenerateError::Shape {
                path: facts.path.clone(),
                span: *span,
                interface: interface.to_string(),
                method: text.clone(),
                reason: ShapeError::EmbeddedElement(text.clone()),
            }),
        })
        .collect()
}

/// Read the `<Service>Name` string constant.
fn resolve_full_service_name(
    facts: &SourceFacts,
    interface: &str,
    service_name: &str,
) -> Result<String, GenerateError> {
    let const_name = format!("{}{}", service_name, SERVICE_NAME_CONST_SUFFIX);
    let error = |reason: String| GenerateError::ServiceName {
        path: facts.path.clone(),
        interface: interface.to_string(),
        reason,
    };

    match facts.find_const(&const_name) {
        Some(Declaration::Const {
            value: Some(ConstValue::String(value)),
            ..
        }) => Ok(value.clone()),
        Some(Declaration::Const { value, .. }) => Err(error(format!(
            "constant {} is not a string literal ({:?})",
            const_name, value
        ))),
        _ => Err(error(format!("constant {} not found", const_name))),
    }
}

/// Find the first import whose path contains the service's package path.
///
/// `a.b.v1.Service` yields the package path `a/b/v1`.
pub fn resolve_import<'a>(full_service_name: &str, imports: &'a [Import]) -> Option<&'a Import> {
    let (package, _) = full_service_name.rsplit_once('.')?;
    let prefix = package.replace('.', "/");
    if prefix.is_empty() {
        return None;
    }
    imports.iter().find(|import| import.path.contains(&prefix))
}
