//! Deterministic synthesis of the instrumentation source unit.
//!
//! Output is a pure function of the package name, the ordered targets and
//! the [`SynthesisOptions`]: no timestamps, no map iteration, targets and
//! methods emitted exactly in discovery order.

mod imports;
mod templates;

use serde::{Deserialize, Serialize};

use crate::extract::ServiceTarget;
use templates::DecoratorStyle;

/// Variant switches for the emitted code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Emit provider init/shutdown scaffolding.
    pub include_provider_lifecycle: bool,
    /// Emit a switch that bypasses span creation at runtime.
    pub runtime_toggle: bool,
    /// Pass the tracer into each decorator instead of using package globals.
    pub tracer_as_injectable_capability: bool,
}

/// Derived identifiers for one target.
pub(crate) struct TargetNames<'a> {
    target: &'a ServiceTarget,
    /// `orderTracer` for service `Order`.
    tracer: String,
    /// `InstrumentedOrderClient`.
    decorator: String,
}

impl<'a> TargetNames<'a> {
    fn new(target: &'a ServiceTarget) -> Self {
        Self {
            target,
            tracer: format!("{}Tracer", lower_first(&target.service_name)),
            decorator: format!("Instrumented{}", target.client_interface_name),
        }
    }

    fn provider_field(&self) -> String {
        format!("{}Provider", lower_first(&self.target.service_name))
    }
}

/// Lowercase the first character only: `AuthService` -> `authService`.
fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders generated units for one set of options.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    options: SynthesisOptions,
}

impl Synthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Render the complete generated unit.
    pub fn render(&self, package: &str, targets: &[ServiceTarget]) -> String {
        let options = &self.options;
        let names: Vec<TargetNames> = targets.iter().map(TargetNames::new).collect();
        let style = DecoratorStyle {
            injectable: options.tracer_as_injectable_capability,
            toggle: options.runtime_toggle,
        };

        let mut blocks = vec![
            templates::header(package),
            imports::render(options, targets),
        ];

        if style.injectable {
            blocks.extend(templates::injectable_tracers(&names));
        } else {
            blocks.push(templates::global_tracers(&names));
        }

        if options.include_provider_lifecycle {
            if style.injectable {
                blocks.extend(templates::owned_lifecycle(&names));
            } else {
                blocks.extend(templates::global_lifecycle(&names));
            }
        }

        if style.toggle && !style.injectable {
            blocks.push(templates::global_toggle());
        }

        for t in &names {
            blocks.extend(templates::decorator(t, style));
            for m in &t.target.methods {
                blocks.push(templates::method(
                    t,
                    style,
                    &m.name,
                    &m.request_type,
                    &m.response_type,
                ));
            }
        }

        tracing::debug!(
            package,
            targets = targets.len(),
            blocks = blocks.len(),
            "rendered instrumentation unit"
        );

        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MethodTarget;

    fn order_target() -> ServiceTarget {
        ServiceTarget {
            service_name: "Order".to_string(),
            client_interface_name: "OrderClient".to_string(),
            methods: vec![MethodTarget {
                name: "Create".to_string(),
                request_type: "v1.CreateOrderRequest".to_string(),
                response_type: "v1.CreateOrderResponse".to_string(),
            }],
            full_service_name: "shop.v1.OrderService".to_string(),
            import_alias: "v1".to_string(),
            import_path: "example.com/shop/gen/shop/v1".to_string(),
        }
    }

    fn target(service: &str, methods: &[&str]) -> ServiceTarget {
        ServiceTarget {
            service_name: service.to_string(),
            client_interface_name: format!("{}Client", service),
            methods: methods
                .iter()
                .map(|m| MethodTarget {
                    name: m.to_string(),
                    request_type: format!("v1.{}Request", m),
                    response_type: format!("v1.{}Response", m),
                })
                .collect(),
            full_service_name: format!("app.v1.{}", service),
            import_alias: "v1".to_string(),
            import_path: "example.com/app/v1".to_string(),
        }
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("AuthService"), "authService");
        assert_eq!(lower_first("X"), "x");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_order_example() {
        let out = Synthesizer::default().render("orderv1connect", &[order_target()]);

        assert!(out.starts_with(
            "// Code generated by connect-instrument. DO NOT EDIT.\n\npackage orderv1connect\n\nimport (\n"
        ));
        assert!(out.contains("\torderTracer = otel.Tracer(\"shop.v1.OrderService\")\n"));
        assert!(out.contains("type InstrumentedOrderClient struct {\n\tinner OrderClient\n}"));
        assert!(out.contains(
            "func NewInstrumentedOrderClient(inner OrderClient) InstrumentedOrderClient {\n\
             \treturn InstrumentedOrderClient{inner: inner}\n}"
        ));
        assert!(out.contains(
            "func (c InstrumentedOrderClient) Create(ctx context.Context, \
             req *connect.Request[v1.CreateOrderRequest]) \
             (*connect.Response[v1.CreateOrderResponse], error) {\n"
        ));
        assert!(out.contains("\tctx, span := orderTracer.Start(ctx, \"Create\")\n\tdefer span.End()\n"));
        assert!(out.contains("input, err := protojson.Marshal(req.Msg)"));
        assert!(out.contains("output, err := protojson.Marshal(res.Msg)"));
        assert!(out.contains("\"ERROR: FAILED TO SERIALIZE\""));
        assert!(out.contains(
            "\tif err != nil {\n\
             \t\tspan.RecordError(err)\n\
             \t\tspan.SetStatus(codes.Error, err.Error())\n\
             \t\treturn nil, err\n\
             \t}\n"
        ));
        assert!(out.ends_with("\treturn res, nil\n}\n"));

        // default variant carries no lifecycle or toggle
        assert!(!out.contains("InitTraceProviders"));
        assert!(!out.contains("atomic"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let targets = vec![target("Zeta", &["B", "A"]), target("Alpha", &["C"])];
        let options = SynthesisOptions {
            include_provider_lifecycle: true,
            runtime_toggle: true,
            tracer_as_injectable_capability: false,
        };
        let synth = Synthesizer::new(options);
        assert_eq!(synth.render("p", &targets), synth.render("p", &targets));
    }

    #[test]
    fn test_order_is_preserved() {
        let targets = vec![target("Zeta", &["Second", "First"]), target("Alpha", &["Only"])];
        let out = Synthesizer::default().render("p", &targets);

        let pos = |needle: &str| out.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
        assert!(pos("type InstrumentedZetaClient struct") < pos("type InstrumentedAlphaClient struct"));
        assert!(
            pos("InstrumentedZetaClient) Second(") < pos("InstrumentedZetaClient) First(")
        );
        assert!(pos("InstrumentedZetaClient) First(") < pos("type InstrumentedAlphaClient struct"));
        assert!(pos("\tzetaTracer  = ") < pos("\talphaTracer = "));
    }

    #[test]
    fn test_global_lifecycle() {
        let options = SynthesisOptions {
            include_provider_lifecycle: true,
            ..Default::default()
        };
        let out = Synthesizer::new(options).render("p", &[target("Echo", &["Say"])]);

        assert!(out.contains("\techoTracerProvider *trace.TracerProvider\n"));
        assert!(out.contains("var providersInitialized = false"));
        assert!(out.contains(
            "\techoTracerProvider, echoTracer, err = newTracerAndProvider(\"app.v1.Echo\", exporter, attrs)\n"
        ));
        assert!(out.contains("\tprovidersInitialized = true\n\treturn nil\n}"));
        assert!(out.contains(
            "\tif !providersInitialized {\n\t\treturn nil\n\t}\n"
        ));
        assert!(out.contains("\t\techoTracerProvider.Shutdown(ctx),\n"));
    }

    #[test]
    fn test_injectable_tracer() {
        let options = SynthesisOptions {
            tracer_as_injectable_capability: true,
            ..Default::default()
        };
        let out = Synthesizer::new(options).render("p", &[target("Echo", &["Say"])]);

        assert!(!out.contains("otel.Tracer("));
        assert!(out.contains("\techoTracerName = \"app.v1.Echo\"\n"));
        assert!(out.contains(
            "func NewEchoTracer(provider oteltrace.TracerProvider) oteltrace.Tracer {\n\
             \treturn provider.Tracer(echoTracerName)\n}"
        ));
        assert!(out.contains("\tinner  EchoClient\n\ttracer oteltrace.Tracer\n}"));
        assert!(out.contains(
            "func NewInstrumentedEchoClient(inner EchoClient, tracer oteltrace.Tracer) InstrumentedEchoClient {"
        ));
        assert!(out.contains("\tctx, span := c.tracer.Start(ctx, \"Say\")\n"));
    }

    #[test]
    fn test_owned_lifecycle() {
        let options = SynthesisOptions {
            include_provider_lifecycle: true,
            tracer_as_injectable_capability: true,
            ..Default::default()
        };
        let out = Synthesizer::new(options).render(
            "p",
            &[target("Echo", &["Say"]), target("Ping", &["Ping"])],
        );

        assert!(!out.contains("providersInitialized"));
        assert!(out.contains("type TraceProviders struct {\n\techoProvider *trace.TracerProvider\n\tpingProvider *trace.TracerProvider\n}"));
        assert!(out.contains(
            "\tif p.echoProvider, err = newTracerProvider(\"app.v1.Echo\", exporter, attrs); err != nil {\n"
        ));
        assert!(out.contains("func (p *TraceProviders) PingTracer() oteltrace.Tracer {"));
        assert!(out.contains("\tif p == nil {\n\t\treturn nil\n\t}\n\treturn errors.Join(\n"));
    }

    #[test]
    fn test_global_toggle() {
        let options = SynthesisOptions {
            runtime_toggle: true,
            ..Default::default()
        };
        let out = Synthesizer::new(options).render("p", &[target("Echo", &["Say"])]);

        assert!(out.contains("var instrumentationDisabled atomic.Bool"));
        assert!(out.contains("func SetInstrumentationEnabled(enabled bool) {"));
        assert!(out.contains(
            "\tif instrumentationDisabled.Load() {\n\t\treturn c.inner.Say(ctx, req)\n\t}\n\n\tctx, span :="
        ));
    }

    #[test]
    fn test_injectable_toggle() {
        let options = SynthesisOptions {
            runtime_toggle: true,
            tracer_as_injectable_capability: true,
            ..Default::default()
        };
        let out = Synthesizer::new(options).render("p", &[target("Echo", &["Say"])]);

        assert!(!out.contains("var instrumentationDisabled"));
        assert!(out.contains("\tinner    EchoClient\n\ttracer   oteltrace.Tracer\n\tdisabled *atomic.Bool\n}"));
        assert!(out.contains("{inner: inner, tracer: tracer, disabled: new(atomic.Bool)}"));
        assert!(out.contains("func (c InstrumentedEchoClient) SetInstrumentationEnabled(enabled bool) {"));
        assert!(out.contains("\tif c.disabled.Load() {\n"));
    }

    #[test]
    fn test_synthesis_options_from_yaml() {
        let options: SynthesisOptions =
            serde_yaml::from_str("runtime_toggle: true\n").unwrap();
        assert_eq!(
            options,
            SynthesisOptions {
                runtime_toggle: true,
                ..Default::default()
            }
        );
    }
}
