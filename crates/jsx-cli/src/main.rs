use clap::{ArgAction, Args, Parser, Subcommand};
use jsx_codegen::{
    CompileOptions, Compiler, DEFAULT_FRAGMENT_IDENTIFIER, DEFAULT_MAX_RECURSION_CALLS,
};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsxc")]
#[command(about = "Compile element markup in script source into factory calls")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    options: OptionArgs,

    /// Log compiler stages to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct OptionArgs {
    /// Element factory used when the source has no @jsx directive
    #[arg(long, global = true, default_value = "React.createElement")]
    factory: String,

    /// Fragment component used when the source has no @jsxFrag directive
    #[arg(long, global = true, default_value = DEFAULT_FRAGMENT_IDENTIFIER)]
    fragment: String,

    /// Ceiling on recursive calls in the lexer and parser
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_RECURSION_CALLS)]
    max_recursion_calls: usize,

    /// Prepend "use strict"; to the output
    #[arg(long, global = true)]
    use_strict: bool,

    /// Compile even when the input looks already compiled
    #[arg(long, global = true)]
    no_skip_compiled: bool,
}

impl OptionArgs {
    fn to_options(&self) -> CompileOptions {
        CompileOptions {
            factory_identifier: self.factory.clone(),
            fragment_identifier: self.fragment.clone(),
            max_recursion_calls: self.max_recursion_calls,
            prepend_strict_mode: self.use_strict,
            skip_if_already_compiled: !self.no_skip_compiled,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Compile a file and write the result
    Build {
        /// Input file
        path: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a file for errors without writing output
    Check {
        /// Input file
        path: PathBuf,
    },

    /// Print the token sequence as JSON
    Tokens {
        /// Input file
        path: PathBuf,
    },

    /// Print the syntax tree as JSON
    Ast {
        /// Input file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = cli.options.to_options();
    debug!(?options, "compiler options");
    let compiler = Compiler::new(options);

    match cli.command {
        Command::Build { path, output } => cmd_build(&compiler, &path, output.as_deref()),
        Command::Check { path } => cmd_check(&compiler, &path),
        Command::Tokens { path } => cmd_tokens(&compiler, &path),
        Command::Ast { path } => cmd_ast(&compiler, &path),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> String {
    if !path.exists() {
        eprintln!("Error: file not found: {}", path.display());
        std::process::exit(1);
    }
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn cmd_build(compiler: &Compiler, path: &Path, output: Option<&Path>) {
    let source = read_source(path);

    let js = match compiler.compile_to_string(&source) {
        Ok(js) => js,
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    };

    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, &js) {
                eprintln!("Error writing {}: {e}", out.display());
                std::process::exit(1);
            }
            eprintln!("Built: {}", out.display());
        }
        None => print!("{js}"),
    }
}

fn cmd_check(compiler: &Compiler, path: &Path) {
    let source = read_source(path);

    if let Err(e) = compiler.compile_to_string(&source) {
        eprintln!("{}: {e}", path.display());
        std::process::exit(1);
    }

    eprintln!("OK: {}", path.display());
}

fn cmd_tokens(compiler: &Compiler, path: &Path) {
    let source = read_source(path);

    match compiler.tokenize(&source) {
        Ok(tokens) => print_json(&tokens),
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn cmd_ast(compiler: &Compiler, path: &Path) {
    let source = read_source(path);

    match compiler.parse(&source) {
        Ok(program) => print_json(&program),
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options(args: &[&str]) -> CompileOptions {
        let cli = Cli::try_parse_from(args).unwrap();
        cli.options.to_options()
    }

    #[test]
    fn test_default_options() {
        assert_eq!(options(&["jsxc", "check", "a.jsx"]), CompileOptions::default());
    }

    #[test]
    fn test_flags_after_subcommand() {
        let opts = options(&[
            "jsxc",
            "build",
            "a.jsx",
            "--factory",
            "h",
            "--use-strict",
            "--no-skip-compiled",
            "--max-recursion-calls",
            "50",
        ]);
        assert_eq!(opts.factory_identifier, "h");
        assert!(opts.prepend_strict_mode);
        assert!(!opts.skip_if_already_compiled);
        assert_eq!(opts.max_recursion_calls, 50);
    }

    #[test]
    fn test_build_output_and_verbosity() {
        let cli = Cli::try_parse_from(["jsxc", "-vv", "build", "a.jsx", "-o", "a.js"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build { path, output } => {
                assert_eq!(path, PathBuf::from("a.jsx"));
                assert_eq!(output, Some(PathBuf::from("a.js")));
            }
            _ => panic!("Expected build command"),
        }
    }
}
