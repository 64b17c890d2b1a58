fn main() {
    #[cfg(feature = "app")]
    tauri_build::build();

    println!("cargo:rerun-if-changed=src/db/schemas");
}
