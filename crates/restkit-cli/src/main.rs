#![forbid(unsafe_code)]
#![deny(
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Thin entrypoint for the restkit operator CLI.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = restkit_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
