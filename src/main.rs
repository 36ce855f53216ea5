// SockShell - Single-client TCP shell server
use clap::Parser;
use sockshell::cli::{execute_command, Args};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    match execute_command(args).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
