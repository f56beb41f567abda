//! # rezolve-rs
//!
//! A dependency-resolution engine. Targets describe how to produce an
//! instance of a service type; a [`TargetRegistry`] stores them and picks the
//! best one for a requested type, including closed and open generics and
//! variance-compatible substitutes. A [`Container`] compiles the chosen target
//! into a cached factory and invokes it, with lifetimes tracked by a
//! [`ContainerScope`].
//!
//! ## Environment
//!
//! - `REZOLVE_LOG`: `tracing` filter directives for the `rezolve` binary.
//! - `REZOLVE_ALLOW_MULTIPLE`, `REZOLVE_CONTRAVARIANCE`, `REZOLVE_COVARIANCE`,
//!   `REZOLVE_MATCH_ALL_GENERICS`, `REZOLVE_ENUMERABLES`: registry switches,
//!   see [`options::RegistryOptions`].
//! - `REZOLVE_MAX_COMPILE_DEPTH`: see [`options::ContainerOptions`].
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub mod compiler;
pub mod container;
pub mod demo;
pub mod error;
pub mod metrics;
pub mod options;
pub mod registry;
pub mod resolve;
pub mod scope;
pub mod targets;
pub mod value;

pub use container::Container;
pub use error::{CompileError, RegistrationError, ResolveError, RezolveError};
pub use registry::TargetRegistry;
pub use scope::ContainerScope;
pub use targets::Target;
pub use value::Value;

use options::{ContainerOptions, RegistryOptions};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resolves services from a sample dependency registry"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
    /// Print cache statistics after the command.
    #[arg(long, global = true)]
    pub stats: bool,
    /// Print statistics as JSON.
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long, global = true)]
    pub no_contravariance: bool,
    #[arg(long, global = true)]
    pub no_covariance: bool,
    #[arg(long, global = true)]
    pub match_all_generics: bool,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the types the registry looks up for a requested type.
    Candidates {
        #[arg(value_name = "TYPE")]
        ty: String,
    },
    /// Resolve an instance of a type inside a fresh scope.
    Resolve {
        #[arg(value_name = "TYPE")]
        ty: String,
    },
    /// List every known type definition.
    Types,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env("REZOLVE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn registry_options(args: &Args) -> RegistryOptions {
    let mut options = RegistryOptions::from_env();
    if args.no_contravariance {
        options.enable_contravariance = false;
    }
    if args.no_covariance {
        options.enable_covariance = false;
    }
    if args.match_all_generics {
        options.fetch_all_match_all_generic_targets = true;
    }
    options
}

fn run(args: &Args) -> Result<(), RezolveError> {
    let demo::Demo { loader, registry } = demo::demo(registry_options(args))?;
    let container = Container::with_options(registry, ContainerOptions::from_env());

    match &args.command {
        Command::Candidates { ty } => {
            let ty = loader.parse(ty)?;
            for candidate in container.registry().candidates(&ty) {
                if candidate.variant {
                    println!("{} (variant)", candidate.ty);
                } else {
                    println!("{}", candidate.ty);
                }
            }
        }
        Command::Resolve { ty } => {
            let ty = loader.parse(ty)?;
            let scope = container.create_scope();
            let value = container.resolve_in(&ty, &scope)?;
            println!("{:?}", value);
            scope.dispose();
        }
        Command::Types => {
            for definition in loader.definitions() {
                println!("{}", rezolve_types::ConcreteType::from(&definition));
            }
        }
    }

    if args.stats {
        let stats = container.cache_stats();
        if args.json {
            match serde_json::to_string_pretty(&stats) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error serializing statistics: {}", e),
            }
        } else {
            println!("{}", stats);
        }
    }
    Ok(())
}

pub fn run_cli() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}
