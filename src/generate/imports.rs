//! The consolidated import block of a generated unit.

use super::SynthesisOptions;
use crate::extract::ServiceTarget;

/// One import spec line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GoImport {
    alias: Option<&'static str>,
    path: &'static str,
}

const fn plain(path: &'static str) -> GoImport {
    GoImport { alias: None, path }
}

const fn aliased(alias: &'static str, path: &'static str) -> GoImport {
    GoImport {
        alias: Some(alias),
        path,
    }
}

/// Standard library imports the selected variant uses.
fn std_imports(options: &SynthesisOptions, has_methods: bool) -> Vec<GoImport> {
    let lifecycle = options.include_provider_lifecycle;

    let mut imports = Vec::new();
    if has_methods || lifecycle {
        imports.push(plain("context"));
    }
    if lifecycle {
        imports.push(plain("errors"));
    }
    if options.runtime_toggle {
        imports.push(plain("sync/atomic"));
    }
    imports
}

/// Infrastructure imports the selected variant uses, in path order.
///
/// Without any method to wrap, only the tracer and lifecycle scaffolding
/// remain, so the call and payload packages are left out.
fn infra_imports(options: &SynthesisOptions, has_methods: bool) -> Vec<GoImport> {
    let lifecycle = options.include_provider_lifecycle;
    let injectable = options.tracer_as_injectable_capability;

    let mut imports = Vec::new();
    if has_methods {
        imports.push(aliased("connect", "connectrpc.com/connect"));
    }
    if !injectable {
        imports.push(plain("go.opentelemetry.io/otel"));
    }
    if has_methods || lifecycle {
        imports.push(plain("go.opentelemetry.io/otel/attribute"));
    }
    if has_methods {
        imports.push(plain("go.opentelemetry.io/otel/codes"));
    }
    if lifecycle {
        imports.push(plain("go.opentelemetry.io/otel/sdk/resource"));
        imports.push(plain("go.opentelemetry.io/otel/sdk/trace"));
        imports.push(aliased("semconv", "go.opentelemetry.io/otel/semconv/v1.17.0"));
    }
    if lifecycle || injectable {
        imports.push(aliased("oteltrace", "go.opentelemetry.io/otel/trace"));
    }
    if has_methods {
        imports.push(plain("google.golang.org/protobuf/encoding/protojson"));
    }
    imports
}

/// Message packages referenced by wrapped methods, sorted by path the way
/// gofmt orders a group.
fn target_imports(targets: &[ServiceTarget]) -> Vec<(&str, &str)> {
    let mut imports: Vec<(&str, &str)> = targets
        .iter()
        .filter(|t| t.has_import() && !t.methods.is_empty())
        .map(|t| (t.import_path.as_str(), t.import_alias.as_str()))
        .collect();
    imports.sort_unstable();
    imports.dedup();
    imports
}

fn write_spec(out: &mut String, alias: Option<&str>, path: &str) {
    match alias {
        Some(alias) if !alias.is_empty() => out.push_str(&format!("\t{} \"{}\"\n", alias, path)),
        _ => out.push_str(&format!("\t\"{}\"\n", path)),
    }
}

/// Render the `import (...)` block.
///
/// Groups: standard library, infrastructure, then the target message
/// packages. Empty groups are omitted. Unresolved targets contribute
/// nothing and repeated alias/path pairs are written once.
pub(super) fn render(options: &SynthesisOptions, targets: &[ServiceTarget]) -> String {
    let has_methods = targets.iter().any(|t| !t.methods.is_empty());

    let mut groups: Vec<String> = Vec::new();
    for group in [
        std_imports(options, has_methods),
        infra_imports(options, has_methods),
    ] {
        let mut out = String::new();
        for import in group {
            write_spec(&mut out, import.alias, import.path);
        }
        groups.push(out);
    }

    let mut messages = String::new();
    for (path, alias) in target_imports(targets) {
        write_spec(&mut messages, Some(alias), path);
    }
    groups.push(messages);

    groups.retain(|g| !g.is_empty());
    format!("import (\n{})", groups.join("\n"))
}
