use std::env;

fn main() {
    let target = env::var("TARGET").unwrap();

    // Host builds are only used for the core library tests.
    if target.starts_with("thumb") {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
