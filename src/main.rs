use clap::Parser;
use env_logger::Env;
use log::*;

use smsc::smsc::{run, AllowAllLogic, SmscConfig};

fn main() {
    let config = SmscConfig::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let res = run(config, AllowAllLogic {});

    match res {
        Ok(_) => info!("Done"),
        Err(e) => error!("Error launching: {}", e),
    };
}
