//! Build-script helper that runs sluice codegen from a `sluice.toml`.
//!
//! The config path is relative to the crate manifest; the generated module
//! lands in `OUT_DIR` under the configured output name.
#[macro_export]
macro_rules! build {
    () => {
        $crate::build!("sluice.toml")
    };
    ($config:expr) => {{
        use std::{env::var, path::PathBuf};

        //
        // CARGO
        //

        println!("cargo:rerun-if-changed=build.rs");

        let manifest_dir = var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
        let out_dir = var("OUT_DIR").expect("OUT_DIR not set");
        let config = PathBuf::from(manifest_dir).join($config);
        println!("cargo:rerun-if-changed={}", config.display());

        //
        // GENERATED CODE
        //

        let generated = $crate::generate_from_config(&config)
            .unwrap_or_else(|err| panic!("sluice code generation failed:\n{err}"));
        println!("cargo:rerun-if-changed={}", generated.descriptor.display());

        $crate::write_generated(&PathBuf::from(out_dir), &generated)
            .unwrap_or_else(|err| panic!("{err}"));
    }};
}
