//! Integration tests for the generation pipeline.
//!
//! These tests run the full index → extract → synthesize pipeline against
//! the connect-go fixtures in testdata/.

use std::fs;
use std::path::Path;

use connect_instrument::{Config, GenerateError, Runner, ShapeError, SynthesisOptions};

fn fixture(path: &str) -> Vec<u8> {
    fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(path)).unwrap()
}

fn runner(options: SynthesisOptions) -> Runner {
    let mut config = Config::default();
    config.enable(options);
    Runner::new(config)
}

// =============================================================================
// Extraction
// =============================================================================

#[test]
fn test_describe_ping_fixture() {
    let unit = runner(SynthesisOptions::default())
        .describe("api.connect.go", &fixture("pingv1connect/api.connect.go"))
        .unwrap();

    assert_eq!(unit.package, "pingv1connect");

    let services: Vec<_> = unit
        .targets
        .iter()
        .map(|t| (t.client_interface_name.as_str(), t.full_service_name.as_str()))
        .collect();
    assert_eq!(
        services,
        [
            ("PingServiceClient", "ping.v1.PingService"),
            ("HealthServiceClient", "ping.v1.HealthService"),
        ]
    );

    let ping = &unit.targets[0];
    assert_eq!(ping.service_name, "PingService");
    assert_eq!(ping.import_alias, "v1");
    assert_eq!(ping.import_path, "example.com/pingsvc/gen/ping/v1");
    let methods: Vec<_> = ping
        .methods
        .iter()
        .map(|m| (m.name.as_str(), m.request_type.as_str(), m.response_type.as_str()))
        .collect();
    assert_eq!(
        methods,
        [
            ("Ping", "v1.PingRequest", "v1.PingResponse"),
            ("Echo", "v1.EchoRequest", "v1.EchoResponse"),
        ]
    );
}

#[test]
fn test_descriptor_json() {
    let unit = runner(SynthesisOptions::default())
        .describe("api.connect.go", &fixture("pingv1connect/api.connect.go"))
        .unwrap();
    let json = serde_json::to_value(&unit).unwrap();

    assert_eq!(json["package"], "pingv1connect");
    assert_eq!(json["targets"][1]["service_name"], "HealthService");
    assert_eq!(json["targets"][1]["methods"][0]["name"], "Check");
}

#[test]
fn test_rejects_non_connect_client() {
    let err = runner(SynthesisOptions::default())
        .generate("api.connect.go", &fixture("notconnect/api.connect.go"))
        .unwrap_err();

    match err.downcast_ref::<GenerateError>() {
        Some(GenerateError::Shape {
            interface,
            method,
            reason,
            ..
        }) => {
            assert_eq!(interface, "FooClient");
            assert_eq!(method, "Bar");
            assert_eq!(*reason, ShapeError::ParameterCount(1));
        }
        other => panic!("expected shape error, got {:?}", other),
    }
}

#[test]
fn test_rejects_syntax_error() {
    let source = b"package p\n\ntype PingClient interface {\n\tPing(\n}\n";
    let err = runner(SynthesisOptions::default())
        .generate("broken.go", source)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GenerateError>(),
        Some(GenerateError::Parse { .. })
    ));
}

// =============================================================================
// Synthesis
// =============================================================================

#[test]
fn test_generate_ping_fixture() {
    let out = runner(SynthesisOptions::default())
        .generate("api.connect.go", &fixture("pingv1connect/api.connect.go"))
        .unwrap();

    assert!(out.starts_with(
        "// Code generated by connect-instrument. DO NOT EDIT.\n\npackage pingv1connect\n"
    ));
    // message package imported once for both services
    assert_eq!(
        out.matches("\tv1 \"example.com/pingsvc/gen/ping/v1\"\n").count(),
        1
    );
    assert!(out.contains(
        "var (\n\
         \tpingServiceTracer   = otel.Tracer(\"ping.v1.PingService\")\n\
         \thealthServiceTracer = otel.Tracer(\"ping.v1.HealthService\")\n\
         )"
    ));
    assert!(out.contains("type InstrumentedPingServiceClient struct {\n\tinner PingServiceClient\n}"));
    assert!(out.contains("type InstrumentedHealthServiceClient struct {"));
    assert!(out.contains("\tres, err := c.inner.Echo(ctx, req)\n"));
    assert!(out.contains("\tctx, span := healthServiceTracer.Start(ctx, \"Check\")\n"));
    assert_eq!(out.matches("\treturn res, nil\n}").count(), 3);
    assert!(out.ends_with("}\n"));
}

#[test]
fn test_generation_is_idempotent() {
    let source = fixture("pingv1connect/api.connect.go");
    for options in [
        SynthesisOptions::default(),
        SynthesisOptions {
            include_provider_lifecycle: true,
            runtime_toggle: true,
            tracer_as_injectable_capability: true,
        },
    ] {
        let first = runner(options).generate("a", &source).unwrap();
        let second = runner(options).generate("a", &source).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_methods_follow_declaration_order() {
    let out = runner(SynthesisOptions::default())
        .generate("api.connect.go", &fixture("pingv1connect/api.connect.go"))
        .unwrap();

    let pos = |needle: &str| out.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
    assert!(pos(") Ping(ctx") < pos(") Echo(ctx"));
    assert!(pos(") Echo(ctx") < pos("type InstrumentedHealthServiceClient"));
    assert!(pos("type InstrumentedHealthServiceClient") < pos(") Check(ctx"));
}

#[test]
fn test_variant_imports_match_usage() {
    let source = fixture("pingv1connect/api.connect.go");

    let plain = runner(SynthesisOptions::default()).generate("a", &source).unwrap();
    assert!(plain.contains("\t\"go.opentelemetry.io/otel\"\n"));
    assert!(!plain.contains("\"errors\""));
    assert!(!plain.contains("sync/atomic"));
    assert!(!plain.contains("oteltrace"));

    let injectable = runner(SynthesisOptions {
        tracer_as_injectable_capability: true,
        ..Default::default()
    })
    .generate("a", &source)
    .unwrap();
    assert!(!injectable.contains("\t\"go.opentelemetry.io/otel\"\n"));
    assert!(injectable.contains("\toteltrace \"go.opentelemetry.io/otel/trace\"\n"));
    assert!(!injectable.contains("semconv"));

    let lifecycle = runner(SynthesisOptions {
        include_provider_lifecycle: true,
        ..Default::default()
    })
    .generate("a", &source)
    .unwrap();
    assert!(lifecycle.contains("\t\"errors\"\n"));
    assert!(lifecycle.contains("\tsemconv \"go.opentelemetry.io/otel/semconv/v1.17.0\"\n"));
    assert!(lifecycle.contains("func InitTraceProviders("));
    assert!(lifecycle.contains("func ShutdownTraceProviders(ctx context.Context) error {"));
}

#[test]
fn test_owned_lifecycle_for_fixture() {
    let out = runner(SynthesisOptions {
        include_provider_lifecycle: true,
        tracer_as_injectable_capability: true,
        ..Default::default()
    })
    .generate("a", &fixture("pingv1connect/api.connect.go"))
    .unwrap();

    assert!(out.contains(
        "type TraceProviders struct {\n\
         \tpingServiceProvider   *trace.TracerProvider\n\
         \thealthServiceProvider *trace.TracerProvider\n\
         }"
    ));
    assert!(out.contains("func (p *TraceProviders) PingServiceTracer() oteltrace.Tracer {"));
    assert!(out.contains("func (p *TraceProviders) HealthServiceTracer() oteltrace.Tracer {"));
    assert!(!out.contains("InitTraceProviders"));
}
