//! A small application graph wired through configuration.
//!
//! Run with `RUST_LOG=debug cargo run -p graft --example app_graph` to
//! watch the registrations land.

use std::sync::Arc;

use graft::prelude::*;

struct AppConfig {
    dsn: String,
}

struct ConsoleLogger {
    level: String,
}

impl ConsoleLogger {
    fn log(&self, line: &str) {
        println!("[{}] {line}", self.level);
    }
}

struct Postgres {
    config: Arc<AppConfig>,
    logger: Arc<ConsoleLogger>,
}

struct UserService {
    storage: Arc<Postgres>,
    logger: Arc<ConsoleLogger>,
}

impl UserService {
    fn greet(&self, name: &str) -> String {
        self.logger.log(&format!("greeting {name}"));
        format!("hello {name}, stored in {}", self.storage.config.dsn)
    }
}

fn register_schemas(injector: &Injector) -> Result<()> {
    injector.register_type(
        TypeSchema::concrete::<AppConfig>("app::config")
            .param(ParamSpec::untyped("dsn"))
            .factory(|args| Ok(Value::of(AppConfig { dsn: args.get(0)? }))),
    )?;

    injector.register_type(TypeSchema::interface("app::logger"))?;
    injector.register_type(
        TypeSchema::concrete::<ConsoleLogger>("app::console_logger")
            .implements("app::logger")
            .param(ParamSpec::untyped("level"))
            .factory(|args| Ok(Value::of(ConsoleLogger { level: args.get(0)? }))),
    )?;

    injector.register_type(TypeSchema::interface("app::storage"))?;
    injector.register_type(
        TypeSchema::concrete::<Postgres>("app::postgres")
            .implements("app::storage")
            .param(ParamSpec::hinted("config", "app::config"))
            .param(ParamSpec::hinted("logger", "app::logger"))
            .factory(|args| {
                Ok(Value::of(Postgres {
                    config: args.instance(0)?,
                    logger: args.instance(1)?,
                }))
            }),
    )?;

    injector.register_type(
        TypeSchema::concrete::<UserService>("app::user_service")
            .param(ParamSpec::hinted("storage", "app::storage"))
            .param(ParamSpec::hinted("logger", "app::logger"))
            .factory(|args| {
                Ok(Value::of(UserService {
                    storage: args.instance(0)?,
                    logger: args.instance(1)?,
                }))
            }),
    )?;

    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let injector = Injector::new();
    register_schemas(&injector)?;

    let config = InjectorConfig::new()
        .alias("app::logger", "app::console_logger")
        .shared_alias("app::storage", "app::postgres")
        .define(
            "app::config",
            Args::new().raw("dsn", Value::from("postgres://localhost/app")),
        )
        .define(
            "app::console_logger",
            Args::new().raw("level", Value::from("info")),
        )
        .prepare(
            "app::storage",
            Callable::closure(vec![], |args, _| {
                let storage = args.instance::<Postgres>(0)?;
                storage
                    .logger
                    .log(&format!("connected to {}", storage.config.dsn));
                Ok(Value::null())
            }),
        );
    injector.register_mappings(&config)?;
    injector.share("app::config");

    let locator = ServiceLocator::new(injector);
    let service = locator.get("app::user_service")?;
    let service = service
        .downcast_ref::<UserService>()
        .ok_or("app::user_service resolved to an unexpected type")?;
    println!("{}", service.greet("ada"));

    // Callables get the same provisioning as constructors.
    let report = locator.injector().execute(Callable::closure(
        vec![ParamSpec::hinted("storage", "app::storage")],
        |args, _| {
            let storage = args.instance::<Postgres>(0)?;
            Ok(Value::of(format!("storage points at {}", storage.config.dsn)))
        },
    ))?;
    if let Some(line) = report.get::<String>() {
        println!("{line}");
    }

    Ok(())
}
