use anyhow::Result;
use fractal_echo::{repl, Config};

fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::from_env()?;
    log::debug!("starting with {:?}", config);
    repl::start(&config)
}
