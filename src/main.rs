mod cli;
mod config;
mod domain;
mod format;
mod http;
mod links;
mod matcher;
mod pipeline;
mod playlist;
mod preview;
mod release;
mod resolve;
mod services;
mod storage;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = cli::run() {
        eprintln!("error: {e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}
