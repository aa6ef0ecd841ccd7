use clap::Parser;

fn main() {
    use garagekey::util::cli::*;

    dotenv::dotenv().ok();

    let opts = Options::parse();
    run_cli_action(opts);
    println!("OK!");
}
