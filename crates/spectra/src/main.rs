mod cli;
mod paths;
mod presets;
mod run;
mod watch;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
