//! Build script for storefront crate.
//!
//! Fingerprints the stylesheet so templates can link it with a cache-busting
//! query string.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let hash = fs::read(&css_path).map_or_else(
        |e| {
            println!("cargo:warning=Could not read main.css: {e}");
            String::new()
        },
        |content| {
            let digest = Sha256::digest(&content);
            digest.iter().take(4).fold(String::new(), |mut out, b| {
                let _ = write!(out, "{b:02x}");
                out
            })
        },
    );

    println!("cargo:rustc-env=CSS_HASH={hash}");
}
