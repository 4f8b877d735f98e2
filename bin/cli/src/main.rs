use clap::Parser;
use tracing::error;

use crate::cmds::{assign_owners, generate, Command, Opt};

mod cmds;

fn init_tracing(debug: bool) {
    let tracing_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt::fmt()
        .with_max_level(tracing_level)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opt = Opt::parse();

    let result = match opt.cmd {
        Command::Generate(cmd) => match cmd.load_settings() {
            Ok(settings) => {
                init_tracing(opt.debug || settings.debug);
                generate::invoke(cmd.project_dir, settings)
                    .await
                    .map(|summary| !summary.has_failures())
            }
            Err(e) => {
                init_tracing(opt.debug);
                Err(e)
            }
        },
        Command::AssignOwners(cmd) => {
            init_tracing(opt.debug);
            assign_owners::invoke(cmd)
                .await
                .map(|summary| summary.failed == 0)
        }
    };

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    };
}
