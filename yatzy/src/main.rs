use yatzy::cli::{Args, BaseCommand, Command};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::new(pico_args::Arguments::from_env());

    let cmd = match BaseCommand::try_from_cli_args(args) {
        Ok(cmd) => cmd,
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("Try 'yatzy --help' for more information.");
            std::process::exit(1);
        }
    };

    match cmd.run() {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    }
}
