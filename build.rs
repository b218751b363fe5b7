//! Adds `ZPDF_LIB_DIR` to the native link search path when the `native`
//! feature is enabled.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=ZPDF_LIB_DIR");

    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("ZPDF_LIB_DIR") {
        println!(
            "cargo:rustc-link-search=native={}",
            std::path::Path::new(&dir).display()
        );
    }
}
