use std::env;

fn main() {
    // napi-derive reads this at compile time; plain `cargo build` runs
    // outside the napi CLI and would not set it.
    if env::var_os("NAPI_RS_CLI_VERSION").is_none() {
        println!("cargo:rustc-env=NAPI_RS_CLI_VERSION=cargo");
    }

    napi_build::setup();
}
