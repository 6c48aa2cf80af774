//! appdir_deploy - bundle Linux applications into self-contained AppDirs.

use std::process;

use appdir_deploy::cli;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            log::error!("Fatal error: {e}");
            process::exit(1);
        }
    }
}
