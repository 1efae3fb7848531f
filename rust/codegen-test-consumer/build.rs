//! Build script that uses idlc-codegen to generate Rust code
//! from the fixture schema.

use std::env;
use std::fs;
use std::path::Path;

use idlc_codegen::{Generator, GeneratorConfig};

fn main() {
    let fixture = codegen_test_proto::fixture();

    println!("cargo::rerun-if-changed=build.rs");
    println!(
        "cargo::rerun-if-changed={}",
        Path::new("../codegen-test-proto/src/lib.rs").display()
    );

    let out_dir = env::var("OUT_DIR").unwrap();

    // Everything the schema declares, rooted at the crate.
    let full = Generator::new(&fixture.schema, GeneratorConfig::default())
        .generate_source()
        .unwrap();
    fs::write(Path::new(&out_dir).join("generated.rs"), full).unwrap();

    // Only what Search's allow-listed operations need, mounted at `crate::pruned`.
    let config = GeneratorConfig::default()
        .with_root_path("crate::pruned")
        .with_allow_list_annotation(codegen_test_proto::ALLOW_LIST);
    let pruned = Generator::new(&fixture.schema, config)
        .generate_pruned(fixture.search)
        .unwrap();
    fs::write(Path::new(&out_dir).join("pruned.rs"), pruned).unwrap();
}
