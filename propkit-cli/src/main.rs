use std::{path::PathBuf, process, sync::Arc};

use clap::{ArgAction, Parser, Subcommand};
use propkit::{
    Context, ContextBuilder, Error, Language, ResourceDescriptor, ResourceType, ViewType,
};
use propkit_cli::shell::{Views, Window, declare_views};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Resource root directory (overrides PROPKIT_RESOURCE_ROOT)
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    /// Language to activate at startup, e.g. zh_CN or en_US
    #[arg(short, long, global = true)]
    lang: Option<Language>,

    /// Log more (-v for info, -vv for debug); RUST_LOG is used otherwise
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Read one typed value.
    Get {
        /// Key without its type suffix, e.g. window.width
        #[arg(short, long)]
        key: String,

        /// Resource type to read from: ui, main or game
        #[arg(short = 't', long = "type", default_value = "ui")]
        resource_type: ResourceType,

        /// Print the value as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every entry of a resource type.
    Dump {
        /// Resource type to dump: ui, main or game
        #[arg(short = 't', long = "type", default_value = "ui")]
        resource_type: ResourceType,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a descriptor such as classpath:config/ui.properties to a file.
    Resolve {
        /// The descriptor to resolve
        descriptor: ResourceDescriptor,
    },

    /// Render the window, optionally switching view and language.
    Show {
        /// View to change to after the first frame: splash, main or game
        #[arg(long)]
        view: Option<ViewType>,

        /// Language to switch to after the view change
        #[arg(long)]
        switch_lang: Option<Language>,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => None,
        1 => Some("propkit=info,propkit_cli=info"),
        _ => Some("propkit=debug,propkit_cli=debug"),
    };
    let filter = match directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("propkit=warn,propkit_cli=warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_context(resources: Option<PathBuf>, lang: Option<Language>) -> Result<Context, Error> {
    let mut builder = ContextBuilder::from_env()?;
    if let Some(root) = resources {
        builder = builder.resource_root(root);
    }
    if let Some(language) = lang {
        builder = builder.language(language);
    }
    let context = builder.build();
    debug!(
        root = %context.resource_root().display(),
        language = %context.current_language(),
        "context ready"
    );
    Ok(context)
}

fn run(args: Args) -> Result<(), Error> {
    let context = build_context(args.resources, args.lang)?;

    match args.commands {
        Commands::Get {
            key,
            resource_type,
            json,
        } => {
            let Some(value) = context.config_in(&key, resource_type)? else {
                eprintln!("No value for `{}` in {}", key, resource_type);
                process::exit(1);
            };
            if json {
                let output = json!({
                    "key": key,
                    "resource": resource_type,
                    "language": context.current_language(),
                    "value": value,
                });
                println!("{:#}", output);
            } else {
                println!("{}", value);
            }
        }
        Commands::Dump {
            resource_type,
            json,
        } => {
            let table = context.cache().table(resource_type)?;
            if json {
                let output = json!({
                    "resource": resource_type,
                    "path": table.path.display().to_string(),
                    "language": table.language,
                    "entries": table.entries(),
                });
                println!("{:#}", output);
            } else {
                println!("# {} ({})", resource_type, table.path.display());
                for entry in table.entries() {
                    let key = match entry.tag.suffix() {
                        Some(suffix) => format!("{}.{}", entry.key, suffix),
                        None => entry.key.clone(),
                    };
                    let value = entry
                        .value
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    println!("{} = {}", key, value);
                }
            }
        }
        Commands::Resolve { descriptor } => {
            println!("{}", context.resolve(&descriptor)?.display());
        }
        Commands::Show { view, switch_lang } => {
            let views = Arc::new(Views::default());
            declare_views(&views, &context);
            let window = Window::new(&context, Arc::clone(&views))?;
            window.show()?;

            if let Some(view) = view {
                views.prewarm(&[view])?;
                views.change(view);
            }
            if let Some(language) = switch_lang {
                context.switch_language(Some(language));
            }

            for frame in window.frames() {
                println!("{}\n", frame);
            }
        }
    }

    Ok(())
}
