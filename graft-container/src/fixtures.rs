//! Shared test fixtures.
//!
//! A small catalog of types the resolution tests register over and over:
//! a plain type, a hinted dependency pair, an interface with one
//! implementation, a parent/child pair with methods, and a handful of
//! deliberately awkward shapes (non-public constructor, untyped params,
//! recursive hints).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::injector::Injector;
use crate::schema::{FunctionSchema, MethodSchema, ParamSpec, TypeSchema};
use crate::value::Value;

#[derive(Debug)]
pub(crate) struct Plain;

#[derive(Debug)]
pub(crate) struct Dep {
    pub(crate) label: String,
}

#[derive(Debug)]
pub(crate) struct NeedsDep {
    pub(crate) dep: Arc<Dep>,
}

#[derive(Debug)]
pub(crate) struct ConsoleGreeter {
    pub(crate) greeting: String,
}

#[derive(Debug)]
pub(crate) struct OptionalGreeter {
    pub(crate) greeter: Option<Arc<ConsoleGreeter>>,
}

/// Keeps an interior log so preparers can be observed mutating it.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub(crate) entries: Mutex<Vec<String>>,
}

impl Journal {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

#[derive(Debug)]
pub(crate) struct Hidden;

#[derive(Debug)]
pub(crate) struct RequiresLabel {
    pub(crate) label: String,
}

#[derive(Debug)]
pub(crate) struct Report {
    pub(crate) limit: i64,
}

#[derive(Debug)]
pub(crate) struct LoopA;

#[derive(Debug)]
pub(crate) struct LoopB;

#[derive(Debug)]
pub(crate) struct Mailer {
    pub(crate) tag: String,
}

#[derive(Debug)]
pub(crate) struct Transport;

#[derive(Debug)]
pub(crate) struct Smtp;

#[derive(Debug)]
pub(crate) struct Doubler;

/// An injector preloaded with the whole fixture catalog.
///
/// Tests that need a pristine schema space (for example to re-register a
/// Rust type under a second key) should build their own injector instead.
pub(crate) fn catalog() -> Injector {
    let injector = Injector::new();

    injector
        .register_type(
            TypeSchema::concrete::<Plain>("tests::plain").factory(|_| Ok(Value::of(Plain))),
        )
        .unwrap();

    injector
        .register_type(TypeSchema::concrete::<Dep>("tests::dep").factory(|_| {
            Ok(Value::of(Dep {
                label: "standard".to_string(),
            }))
        }))
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<NeedsDep>("tests::needs_dep")
                .param(ParamSpec::hinted("dep", "tests::dep"))
                .factory(|args| {
                    Ok(Value::of(NeedsDep {
                        dep: args.instance::<Dep>(0)?,
                    }))
                }),
        )
        .unwrap();

    injector
        .register_type(TypeSchema::interface("tests::greeter"))
        .unwrap();
    injector
        .register_type(
            TypeSchema::concrete::<ConsoleGreeter>("tests::console_greeter")
                .implements("tests::greeter")
                .factory(|_| {
                    Ok(Value::of(ConsoleGreeter {
                        greeting: "hello".to_string(),
                    }))
                }),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<OptionalGreeter>("tests::optional_greeter")
                .param(ParamSpec::hinted("greeter", "tests::greeter").with_default(Value::null()))
                .factory(|args| {
                    Ok(Value::of(OptionalGreeter {
                        greeter: args.opt_instance::<ConsoleGreeter>(0)?,
                    }))
                }),
        )
        .unwrap();

    injector
        .register_type(TypeSchema::interface("tests::audited"))
        .unwrap();
    injector
        .register_type(
            TypeSchema::concrete::<Journal>("tests::journal")
                .implements("tests::audited")
                .factory(|_| Ok(Value::of(Journal::default()))),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<Hidden>("tests::hidden")
                .non_public()
                .factory(|_| Ok(Value::of(Hidden))),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<RequiresLabel>("tests::requires_label")
                .param(ParamSpec::untyped("label"))
                .factory(|args| {
                    Ok(Value::of(RequiresLabel {
                        label: args.get(0)?,
                    }))
                }),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<Report>("tests::report")
                .param(ParamSpec::untyped("limit").with_default(Value::of(10i64)))
                .factory(|args| Ok(Value::of(Report { limit: args.get(0)? }))),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<LoopA>("tests::loop_a")
                .param(ParamSpec::hinted("b", "tests::loop_b"))
                .factory(|_| Ok(Value::of(LoopA))),
        )
        .unwrap();
    injector
        .register_type(
            TypeSchema::concrete::<LoopB>("tests::loop_b")
                .param(ParamSpec::hinted("a", "tests::loop_a"))
                .factory(|_| Ok(Value::of(LoopB))),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<Mailer>("tests::mailer")
                .factory(|_| {
                    Ok(Value::of(Mailer {
                        tag: "default".to_string(),
                    }))
                })
                .method(MethodSchema::new(
                    "send",
                    vec![ParamSpec::untyped("message")],
                    |receiver, args, _| {
                        let mailer = receiver.unwrap().downcast_ref::<Mailer>().unwrap();
                        let message: String = args.get(0)?;
                        Ok(Value::of(format!("{}:{}", mailer.tag, message)))
                    },
                ))
                .method(MethodSchema::new_static("status", vec![], |_, _| {
                    Ok(Value::from("ready"))
                })),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<Transport>("tests::transport")
                .factory(|_| Ok(Value::of(Transport)))
                .method(MethodSchema::new("greet", vec![], |_, _, _| {
                    Ok(Value::from("hello from transport"))
                })),
        )
        .unwrap();
    injector
        .register_type(
            TypeSchema::concrete::<Smtp>("tests::smtp")
                .parent("tests::transport")
                .factory(|_| Ok(Value::of(Smtp))),
        )
        .unwrap();

    injector
        .register_type(
            TypeSchema::concrete::<Doubler>("tests::doubler")
                .factory(|_| Ok(Value::of(Doubler)))
                .method(MethodSchema::new(
                    "invoke",
                    vec![ParamSpec::untyped("amount")],
                    |_, args, _| {
                        let amount: i64 = args.get(0)?;
                        Ok(Value::of(amount * 2))
                    },
                )),
        )
        .unwrap();

    injector
        .register_function(FunctionSchema::new("tests::build_dep", vec![], |_, _| {
            Ok(Value::of(Dep {
                label: "fn-made".to_string(),
            }))
        }))
        .unwrap();

    injector
}
