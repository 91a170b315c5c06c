//! Build script for mmcore-sys.
//!
//! The ABI declarations are written by hand in `src/ffi.rs` (the C header
//! wraps every prototype in a Windows-only `__declspec`, which bindgen cannot
//! parse on other targets). This script only resolves linking:
//!
//! 1. With `mmcore-sdk` feature: link against `MMCoreC`
//! 2. Without feature: nothing to link, the simulated core is compiled in

fn main() {
    println!("cargo:rerun-if-env-changed=MMCOREC_LIB_DIR");

    #[cfg(feature = "mmcore-sdk")]
    link_library();
}

#[cfg(feature = "mmcore-sdk")]
fn link_library() {
    if let Ok(dir) = std::env::var("MMCOREC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
        println!("cargo:rustc-link-lib=MMCoreC");
        return;
    }

    // Try pkg-config next
    if pkg_config::probe_library("MMCoreC").is_ok() {
        return;
    }

    // Fallback to standard locations
    println!("cargo:rustc-link-lib=MMCoreC");

    let lib_paths = ["/usr/local/lib", "/usr/lib", "/usr/lib/x86_64-linux-gnu"];

    for path in lib_paths {
        let dir = std::path::Path::new(path);
        if dir.join("libMMCoreC.so").exists() || dir.join("libMMCoreC.a").exists() {
            println!("cargo:rustc-link-search=native={}", path);
            break;
        }
    }
}
