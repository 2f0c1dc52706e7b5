mod cli;
mod commands;
mod env_loader;
mod error;
mod signal;

fn main() {
    env_loader::load_dotenv();

    match cli::run() {
        Ok(status) => std::process::exit(i32::from(status.code())),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
