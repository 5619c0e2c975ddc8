use clap::Parser as ClapParser;

use lox::lox::Lox;

/// A tree-walking interpreter for Lox.
#[derive(ClapParser)]
#[command(version, about)]
struct Args {
    /// Script to run. Omit to start an interactive prompt.
    script: Option<String>,
}

fn main() {
    // Checked by hand, ahead of clap::Parser::parse(), so "too many
    // arguments" reports our own usage message and exit code rather than
    // clap's.
    if std::env::args().skip(1).count() > 1 {
        println!("Usage: lox [script]");
        std::process::exit(64);
    }

    let args = Args::parse();

    match args.script {
        Some(path) => std::process::exit(Lox::new().run_file(&path)),
        None => {
            if let Err(e) = Lox::new().run_prompt() {
                eprintln!("{e}");
                std::process::exit(74);
            }
        }
    }
}
