#![allow(non_snake_case)]
use RustedNumMethods::Examples::numerical_examples::numerical_examples;
use RustedNumMethods::Utils::logger::init_logger;
use RustedNumMethods::Utils::solver_settings::SolverSettings;
use std::env;
use std::path::Path;

fn main() {
    // usage: RustedNumMethods [example number] [settings file]
    let args: Vec<String> = env::args().collect();
    let example: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);

    let settings = match args.get(2) {
        Some(path) => match SolverSettings::from_file(Path::new(path)) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        },
        None => SolverSettings::default(),
    };
    let log_dir = settings.logging.log_dir.as_deref().map(Path::new);
    if let Err(e) = init_logger(Some(&settings.logging.loglevel), log_dir) {
        eprintln!("{}", e);
        return;
    }
    numerical_examples(example, &settings);
}
