use arb_engine::{cli::Cli, run};
use clap::Parser;

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn main_inner() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = arb_utils::init_tracing(&cli.log_file_name);

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run(cli))
}
