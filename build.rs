// build.rs

//! build.rs — link the Nek5000 coupling library when the `nek5000` feature is on.
//!
//! Discovery is environment driven:
//!  • `NEK5000_LIB_DIR`   directory holding `libnek5000.{a,so}` (required)
//!  • `NEK5000_LIB_NAME`  library name without prefix/suffix (default `nek5000`)
//!  • `NEK5000_NO_GFORTRAN=1` skip linking the gfortran runtime

#[cfg(feature = "nek5000")]
fn main() {
    use std::env;

    let lib_dir = env::var("NEK5000_LIB_DIR")
        .expect("NEK5000_LIB_DIR must point at the directory containing libnek5000");
    let lib_name = env::var("NEK5000_LIB_NAME").unwrap_or_else(|_| "nek5000".to_string());

    println!("cargo:rustc-link-search=native={}", lib_dir);
    println!("cargo:rustc-link-lib={}", lib_name);

    // Nek5000 is Fortran underneath its C entry points.
    if env::var_os("NEK5000_NO_GFORTRAN").is_none() {
        println!("cargo:rustc-link-lib=dylib=gfortran");
    }

    println!("cargo:rerun-if-env-changed=NEK5000_LIB_DIR");
    println!("cargo:rerun-if-env-changed=NEK5000_LIB_NAME");
    println!("cargo:rerun-if-env-changed=NEK5000_NO_GFORTRAN");
}

#[cfg(not(feature = "nek5000"))]
fn main() {
    // No-op when the “nek5000” feature is disabled
}
