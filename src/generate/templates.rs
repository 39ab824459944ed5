//! Go source fragments.
//!
//! Each function returns one top-level block without a trailing newline;
//! the synthesizer joins blocks with a blank line.

use super::TargetNames;

/// Marker recognized by Go tooling as generated code.
pub(super) const GENERATED_HEADER: &str = "// Code generated by connect-instrument. DO NOT EDIT.";

/// Attribute value set when a payload cannot be serialized.
pub(super) const SERIALIZE_FAILED: &str = "ERROR: FAILED TO SERIALIZE";

/// gofmt aligns the second column of grouped specs and struct fields.
fn column_width(lens: impl Iterator<Item = usize>) -> usize {
    lens.max().unwrap_or(0)
}

pub(super) fn header(package: &str) -> String {
    format!("{GENERATED_HEADER}\n\npackage {package}")
}

/// Package-level tracer handles, one per target.
pub(super) fn global_tracers(targets: &[TargetNames]) -> String {
    let width = column_width(targets.iter().map(|t| t.tracer.len()));
    let mut out = String::from("var (\n");
    for t in targets {
        out.push_str(&format!(
            "\t{:<width$} = otel.Tracer(\"{}\")\n",
            t.tracer, t.target.full_service_name
        ));
    }
    out.push(')');
    out
}

/// Tracer name constants plus one tracer constructor per target.
pub(super) fn injectable_tracers(targets: &[TargetNames]) -> Vec<String> {
    let width = column_width(targets.iter().map(|t| t.tracer.len() + "Name".len()));
    let mut consts = String::from("const (\n");
    for t in targets {
        consts.push_str(&format!(
            "\t{:<width$} = \"{}\"\n",
            format!("{}Name", t.tracer),
            t.target.full_service_name
        ));
    }
    consts.push(')');

    let mut blocks = vec![consts];
    for t in targets {
        blocks.push(format!(
            r#"// New{service}Tracer returns the tracer {decorator} expects for
// "{full}".
func New{service}Tracer(provider oteltrace.TracerProvider) oteltrace.Tracer {{
	return provider.Tracer({tracer}Name)
}}"#,
            service = t.target.service_name,
            decorator = t.decorator,
            full = t.target.full_service_name,
            tracer = t.tracer,
        ));
    }
    blocks
}

/// Package-level switch shared by every decorator.
pub(super) fn global_toggle() -> String {
    r#"var instrumentationDisabled atomic.Bool

// SetInstrumentationEnabled turns span creation on or off for every
// instrumented client in this package. Instrumentation starts enabled.
func SetInstrumentationEnabled(enabled bool) {
	instrumentationDisabled.Store(!enabled)
}"#
    .to_string()
}

const RESOURCE_MERGE: &str = r#"	r, err := resource.Merge(
		resource.Default(),
		resource.NewWithAttributes(
			semconv.SchemaURL,
			append([]attribute.KeyValue{semconv.ServiceName(serviceName)}, attrs...)...,
		),
	)"#;

/// Provider variables, the shared flag, and init/shutdown functions.
pub(super) fn global_lifecycle(targets: &[TargetNames]) -> Vec<String> {
    let width = column_width(targets.iter().map(|t| t.tracer.len() + "Provider".len()));
    let mut providers = String::from("var (\n");
    for t in targets {
        providers.push_str(&format!(
            "\t{:<width$} *trace.TracerProvider\n",
            format!("{}Provider", t.tracer)
        ));
    }
    providers.push(')');

    let factory = format!(
        r#"func newTracerAndProvider(serviceName string, exporter trace.SpanExporter, attrs []attribute.KeyValue) (*trace.TracerProvider, oteltrace.Tracer, error) {{
{RESOURCE_MERGE}
	if err != nil {{
		return nil, nil, err
	}}
	traceProvider := trace.NewTracerProvider(
		trace.WithBatcher(exporter),
		trace.WithResource(r),
	)
	return traceProvider, traceProvider.Tracer(serviceName), nil
}}"#
    );

    let mut init = String::from(
        "// Initializes separate tracer providers for each service.\n\
         // Call ShutdownTraceProviders to call shutdown on all of them.\n\
         func InitTraceProviders(exporter trace.SpanExporter, attrs ...attribute.KeyValue) error {\n\
         \tvar err error\n",
    );
    for t in targets {
        init.push_str(&format!(
            "\t{tracer}Provider, {tracer}, err = newTracerAndProvider(\"{full}\", exporter, attrs)\n\
             \tif err != nil {{\n\
             \t\treturn err\n\
             \t}}\n",
            tracer = t.tracer,
            full = t.target.full_service_name,
        ));
    }
    init.push_str("\tprovidersInitialized = true\n\treturn nil\n}");

    let mut shutdown = String::from(
        "// Shuts down all tracer providers initialized, it is\n\
         // a no-op if they have not been initialized.\n\
         func ShutdownTraceProviders(ctx context.Context) error {\n\
         \tif !providersInitialized {\n\
         \t\treturn nil\n\
         \t}\n\
         \terr := errors.Join(\n",
    );
    for t in targets {
        shutdown.push_str(&format!("\t\t{}Provider.Shutdown(ctx),\n", t.tracer));
    }
    shutdown.push_str("\t)\n\tprovidersInitialized = false\n\treturn err\n}");

    vec![
        providers,
        "var providersInitialized = false".to_string(),
        factory,
        init,
        shutdown,
    ]
}

/// A caller-owned value holding every provider.
pub(super) fn owned_lifecycle(targets: &[TargetNames]) -> Vec<String> {
    let width = column_width(targets.iter().map(|t| t.provider_field().len()));

    let mut holder = String::from(
        "// TraceProviders owns one tracer provider per instrumented service.\n\
         // Create it with NewTraceProviders and release it with Shutdown.\n\
         type TraceProviders struct {\n",
    );
    for t in targets {
        holder.push_str(&format!(
            "\t{:<width$} *trace.TracerProvider\n",
            t.provider_field(),
        ));
    }
    holder.push('}');

    let factory = format!(
        r#"func newTracerProvider(serviceName string, exporter trace.SpanExporter, attrs []attribute.KeyValue) (*trace.TracerProvider, error) {{
{RESOURCE_MERGE}
	if err != nil {{
		return nil, err
	}}
	return trace.NewTracerProvider(
		trace.WithBatcher(exporter),
		trace.WithResource(r),
	), nil
}}"#
    );

    let mut init = String::from(
        "// NewTraceProviders initializes separate tracer providers for each service.\n\
         // Call Shutdown on the result to flush and release all of them.\n\
         func NewTraceProviders(exporter trace.SpanExporter, attrs ...attribute.KeyValue) (*TraceProviders, error) {\n\
         \tp := &TraceProviders{}\n\
         \tvar err error\n",
    );
    for t in targets {
        init.push_str(&format!(
            "\tif p.{field}, err = newTracerProvider(\"{full}\", exporter, attrs); err != nil {{\n\
             \t\treturn nil, err\n\
             \t}}\n",
            field = t.provider_field(),
            full = t.target.full_service_name,
        ));
    }
    init.push_str("\treturn p, nil\n}");

    let mut blocks = vec![holder, factory, init];

    for t in targets {
        blocks.push(format!(
            r#"// {service}Tracer returns the tracer for "{full}".
func (p *TraceProviders) {service}Tracer() oteltrace.Tracer {{
	return p.{field}.Tracer({tracer}Name)
}}"#,
            service = t.target.service_name,
            full = t.target.full_service_name,
            field = t.provider_field(),
            tracer = t.tracer,
        ));
    }

    let mut shutdown = String::from(
        "// Shutdown shuts down every provider. It is a no-op on a nil value.\n\
         func (p *TraceProviders) Shutdown(ctx context.Context) error {\n\
         \tif p == nil {\n\
         \t\treturn nil\n\
         \t}\n\
         \treturn errors.Join(\n",
    );
    for t in targets {
        shutdown.push_str(&format!("\t\tp.{}.Shutdown(ctx),\n", t.provider_field()));
    }
    shutdown.push_str("\t)\n}");
    blocks.push(shutdown);

    blocks
}

/// How a decorator reaches its tracer and its toggle.
#[derive(Debug, Clone, Copy)]
pub(super) struct DecoratorStyle {
    pub injectable: bool,
    pub toggle: bool,
}

/// Struct, constructor, and optional toggle method for one target.
pub(super) fn decorator(t: &TargetNames, style: DecoratorStyle) -> Vec<String> {
    let client = &t.target.client_interface_name;
    let decorator = &t.decorator;

    let mut fields = vec![("inner", client.to_string())];
    if style.injectable {
        fields.push(("tracer", "oteltrace.Tracer".to_string()));
        if style.toggle {
            fields.push(("disabled", "*atomic.Bool".to_string()));
        }
    }
    let width = column_width(fields.iter().map(|(name, _)| name.len()));

    let mut def = format!(
        "// A wrapper around a value that implements \"{client}\"\n\
         // that adds telemetry.\n\
         type {decorator} struct {{\n"
    );
    for (name, ty) in &fields {
        def.push_str(&format!("\t{:<width$} {}\n", name, ty));
    }
    def.push('}');

    let ctor = if style.injectable {
        let disabled = if style.toggle {
            ", disabled: new(atomic.Bool)"
        } else {
            ""
        };
        format!(
            r#"// Creates a wrapper instance for telemetry around a value that implements
// "{client}". The tracer must not be nil, see New{service}Tracer.
func New{decorator}(inner {client}, tracer oteltrace.Tracer) {decorator} {{
	return {decorator}{{inner: inner, tracer: tracer{disabled}}}
}}"#,
            service = t.target.service_name,
        )
    } else {
        format!(
            r#"// Creates a wrapper instance for telemetry around a value that implements
// "{client}"
func New{decorator}(inner {client}) {decorator} {{
	return {decorator}{{inner: inner}}
}}"#
        )
    };

    let mut blocks = vec![def, ctor];

    if style.injectable && style.toggle {
        blocks.push(format!(
            r#"// SetInstrumentationEnabled turns span creation on or off for this client
// and every copy of it. Instrumentation starts enabled.
func (c {decorator}) SetInstrumentationEnabled(enabled bool) {{
	c.disabled.Store(!enabled)
}}"#
        ));
    }

    blocks
}

/// Serialize `{payload}.Msg` into the `{key}` span attribute when recording.
fn capture_payload(key: &str, var: &str, payload: &str) -> String {
    format!(
        r#"	if span.IsRecording() {{
		{var}, err := protojson.Marshal({payload}.Msg)
		if err == nil {{
			span.SetAttributes(attribute.String("{key}", string({var})))
		}} else {{
			span.SetAttributes(attribute.String("{key}", "{SERIALIZE_FAILED}"))
			span.RecordError(err)
		}}
	}}"#
    )
}

/// One wrapping method.
pub(super) fn method(
    t: &TargetNames,
    style: DecoratorStyle,
    name: &str,
    request_type: &str,
    response_type: &str,
) -> String {
    let decorator = &t.decorator;
    let tracer = if style.injectable {
        "c.tracer".to_string()
    } else {
        t.tracer.clone()
    };

    let mut out = format!(
        "func (c {decorator}) {name}(ctx context.Context, req *connect.Request[{request_type}]) \
         (*connect.Response[{response_type}], error) {{\n"
    );

    if style.toggle {
        let flag = if style.injectable {
            "c.disabled"
        } else {
            "instrumentationDisabled"
        };
        out.push_str(&format!(
            "\tif {flag}.Load() {{\n\t\treturn c.inner.{name}(ctx, req)\n\t}}\n\n"
        ));
    }

    out.push_str(&format!(
        "\tctx, span := {tracer}.Start(ctx, \"{name}\")\n\tdefer span.End()\n\n"
    ));
    out.push_str(&capture_payload("input", "input", "req"));
    out.push_str(&format!(
        r#"

	res, err := c.inner.{name}(ctx, req)
	if err != nil {{
		span.RecordError(err)
		span.SetStatus(codes.Error, err.Error())
		return nil, err
	}}

"#
    ));
    out.push_str(&capture_payload("output", "output", "res"));
    out.push_str("\n\n\treturn res, nil\n}");
    out
}
