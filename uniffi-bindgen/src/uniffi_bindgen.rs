//! Generates Swift and Kotlin bindings for `fcl-bridge`.

fn main() {
    uniffi::uniffi_bindgen_main();
}
