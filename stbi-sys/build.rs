use std::env;
use std::path::{Path, PathBuf};

fn locate_src_dir(manifest_dir: &Path) -> PathBuf {
    if let Ok(env) = env::var("STB_SRC_DIR") {
        return PathBuf::from(env);
    }

    let workspace_root = manifest_dir.parent().expect("stbi-sys has no parent dir");

    let submodule_path = workspace_root.join("stb");
    if submodule_path.join("stb_image.h").is_file() {
        return submodule_path;
    }

    // Fallback: sibling checkout next to the workspace.
    workspace_root
        .parent()
        .expect("workspace has no parent dir")
        .join("stb")
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let src_dir = locate_src_dir(&manifest_dir);
    let header = src_dir.join("stb_image.h");
    println!("cargo::rustc-check-cfg=cfg(stbi_unavailable)");
    println!("cargo:rerun-if-env-changed=STB_SRC_DIR");
    if !header.is_file() {
        // Leave the crate empty so workspace-wide builds without the stb feature still work.
        println!(
            "cargo:warning=stb_image.h not found at {}; set STB_SRC_DIR to build the stb bindings",
            src_dir.display()
        );
        println!("cargo:rerun-if-changed={}", src_dir.display());
        println!("cargo:rustc-cfg=stbi_unavailable");
        return;
    }

    println!("cargo:rerun-if-changed={}", header.display());
    println!("cargo:rerun-if-changed=csrc/CMakeLists.txt");
    println!("cargo:rerun-if-changed=csrc/stbi_impl.c");

    let target = env::var("TARGET").expect("TARGET");
    let target_env = env::var("CARGO_CFG_TARGET_ENV").unwrap_or_default();
    let build_shared = cfg!(feature = "shared");

    let mut cfg = cmake::Config::new(manifest_dir.join("csrc"));
    cfg.profile("Release");
    cfg.define(
        "STB_SRC_DIR",
        src_dir
            .to_str()
            .expect("STB_SRC_DIR contains non-UTF8 characters"),
    );
    cfg.define("BUILD_SHARED_LIBS", if build_shared { "ON" } else { "OFF" });
    cfg.define(
        "STBI_THREAD_LOCAL_REASON",
        if cfg!(feature = "thread-local-reason") {
            "ON"
        } else {
            "OFF"
        },
    );
    let dst = cfg.build();

    println!("cargo:rustc-link-search=native={}/lib", dst.display());
    println!("cargo:rustc-link-search=native={}/lib64", dst.display());
    if target_env == "msvc" {
        println!("cargo:rustc-link-search=native={}/bin", dst.display());
    }
    let link_kind = if build_shared { "dylib" } else { "static" };
    println!("cargo:rustc-link-lib={}=stbi", link_kind);
    if target_env != "msvc" && !target.contains("apple") && !target.contains("wasm") {
        // stb_image pulls pow/ldexp from libm for its float paths.
        println!("cargo:rustc-link-lib=m");
    }

    let bindings = bindgen::Builder::default()
        .header(header.to_string_lossy())
        .clang_arg(format!("-I{}", src_dir.display()))
        .clang_arg("-DSTBI_NO_STDIO")
        .clang_arg("-DSTBI_ONLY_JPEG")
        .clang_arg("-DSTBI_ONLY_PNG")
        .clang_arg(format!("--target={}", target))
        .allowlist_function("stbi_load_from_memory")
        .allowlist_function("stbi_info_from_memory")
        .allowlist_function("stbi_image_free")
        .allowlist_function("stbi_failure_reason")
        .allowlist_type("stbi_uc")
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .layout_tests(false)
        .generate()
        .expect("bindgen failed");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR"));
    bindings
        .write_to_file(out_dir.join("bindings.rs"))
        .expect("failed to write bindings");
}
