//! Command-line arguments and the commands they run.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{debug, info};

use plugkit_core::component::interface::{Interface, Plugin};
use plugkit_core::pointer::QueryPtr;
use plugkit_core::{ComponentContext, InterfaceId, LoaderConfig, Result};

/// Plugkit: load components from shared libraries
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Loader configuration file (JSON, YAML or TOML)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registry entries
    Registry,
    /// Create a component by registry key or library path
    Create {
        /// Registry key, or path of an existing library
        name: String,
        /// Interface id to request
        #[arg(long, default_value_t = InterfaceId::UNKNOWN.value())]
        iid: u64,
    },
    /// Try a library file name in each directory until one yields a component
    Search {
        /// Library file name to look for
        filename: String,
        /// Directory to try, in order. Defaults to the configured search paths
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
        /// Interface id to request
        #[arg(long, default_value_t = InterfaceId::UNKNOWN.value())]
        iid: u64,
    },
    /// Load one component from every plugin library found in directories
    Scan {
        /// Plugin directory. Defaults to the configured plugin directories
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
        /// Plugin file extension. Defaults to the configured extensions
        #[arg(long = "ext")]
        extensions: Vec<String>,
        /// Interface id to request
        #[arg(long, default_value_t = <dyn Plugin>::IID.value())]
        iid: u64,
    },
}

/// Execute the parsed command.
pub fn run(args: CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    let context = ComponentContext::from_config(&config);
    debug!("Using context {:?}", context);

    match args.command {
        Commands::Registry => list_registry(&context),
        Commands::Create { name, iid } => create(&context, &name, InterfaceId(iid)),
        Commands::Search { filename, dirs, iid } => {
            let dirs = if dirs.is_empty() { config.search_paths.clone() } else { dirs };
            search(&context, &filename, &dirs, InterfaceId(iid))
        }
        Commands::Scan { dirs, extensions, iid } => {
            let dirs = if dirs.is_empty() { config.plugin_directories.clone() } else { dirs };
            let extensions = if extensions.is_empty() {
                config.plugin_extensions.clone()
            } else {
                extensions
            };
            scan(&context, &dirs, &extensions, InterfaceId(iid))
        }
    }
}

fn list_registry(context: &ComponentContext) -> Result<()> {
    let registry = context.registry().lock();
    if registry.is_empty() {
        println!("No registry entries.");
        return Ok(());
    }
    println!("{} registry entr{}:", registry.len(), if registry.len() == 1 { "y" } else { "ies" });
    for (key, path) in registry.iter() {
        println!("  {} -> {}", key, path);
    }
    Ok(())
}

fn create(context: &ComponentContext, name: &str, iid: InterfaceId) -> Result<()> {
    let instance = context.loader().create(iid, name)?;
    if instance.is_null() {
        println!("Component '{}' does not support interface {}", name, iid);
        return Ok(());
    }
    info!("Created component from '{}'", name);
    println!("Created component from '{}'", name);
    if let Some(plugin) = QueryPtr::<dyn Plugin>::from_pointer(&instance).get() {
        println!("Plugin: {}", plugin.plugin_name());
    }
    Ok(())
}

fn search(
    context: &ComponentContext,
    filename: &str,
    dirs: &[PathBuf],
    iid: InterfaceId,
) -> Result<()> {
    if dirs.is_empty() {
        return Err("no search directories given; pass --dir or set search_paths".into());
    }
    let instance = context.loader().create_in(iid, dirs, filename)?;
    println!("Created component from '{}'", filename);
    if let Some(plugin) = QueryPtr::<dyn Plugin>::from_pointer(&instance).get() {
        println!("Plugin: {}", plugin.plugin_name());
    }
    Ok(())
}

fn scan(
    context: &ComponentContext,
    dirs: &[PathBuf],
    extensions: &[String],
    iid: InterfaceId,
) -> Result<()> {
    let mut manager = context.manager();
    for dir in dirs {
        manager.add_directory(dir);
    }
    if !extensions.is_empty() {
        manager.clear_plugin_extensions();
        for extension in extensions {
            manager.add_plugin_extension(extension);
        }
    }
    let added = manager.load_all(iid, true)?;
    debug!("Scan added {} component(s)", added);
    println!("{}", manager.summary());
    Ok(())
}
