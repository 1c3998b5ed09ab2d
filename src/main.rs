use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    focusmate::run().await
}
