mod cli;

use std::io::Write;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("YMLT_LOG"))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let text = match &cli.file {
        Some(file_path) => {
            tracing::info!(file = %file_path.display(), "Reading input");
            std::fs::read_to_string(file_path)?
        }
        None => std::io::read_to_string(std::io::stdin())?,
    };

    let defaults = cli
        .defaults
        .as_deref()
        .map(ymlt::loader::load_file)
        .transpose()?;

    let config = ymlt::Config {
        defaults,
        functions: ymlt::template::standard(),
    };

    let rendered = ymlt::render_str(&text, &config, cli.output.format.into())?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
