fn main() {
    // The binary is started by the kernel as an ELF interpreter, so it has to
    // be a self-contained static PIE without C start files or an interpreter
    // of its own. Only binary targets get these; tests link normally.
    println!("cargo:rustc-link-arg-bins=-nostartfiles");
    println!("cargo:rustc-link-arg-bins=-nodefaultlibs");
    println!("cargo:rustc-link-arg-bins=-static-pie");
    println!("cargo:rustc-link-arg-bins=-Wl,--no-dynamic-linker");
    println!("cargo:rustc-link-arg-bins=-Wl,-z,noexecstack");
    println!("cargo:rerun-if-changed=build.rs");
}
