//! Build script for compiling protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fall back to the vendored protoc when none is installed
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["../../proto/wallet.proto"], &["../../proto"])?;

    println!("cargo:rerun-if-changed=../../proto/");

    Ok(())
}
